//! curlyfmt CLI: a thin front end over the `curlyfmt` library delegating
//! all real work to [`curlyfmt::executor`]/[`curlyfmt::pipeline`] (spec
//! §6, §14). Parses flags, renders diagnostics, maps the worst outcome to
//! an exit code; no formatting or linting logic lives here.

use clap::{Arg, ArgAction, Command};
use curlyfmt::config::{self, FormattingConfiguration};
use curlyfmt::diagnostics::{error_report_json, Diagnostic, Severity};
use curlyfmt::executor::{self, ExecutorConfig};
use curlyfmt::pipeline::{diagnostics_for, FilePipeline, RealSourceReader, SimpleCBraceParser};
use curlyfmt::progress::LoggingObserver;
use curlyfmt::recovery::StageResult;
use curlyfmt::rules::RuleRegistry;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use walkdir::WalkDir;

const EXIT_SUCCESS: u8 = 0;
const EXIT_VIOLATIONS: u8 = 1;
const EXIT_USAGE: u8 = 2;
const EXIT_CONFIG: u8 = 3;
const EXIT_IO: u8 = 4;
const EXIT_INTERNAL: u8 = 5;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    ExitCode::from(run())
}

fn cli() -> Command {
    let path_arg = Arg::new("paths")
        .help("Files or directories to process")
        .required(true)
        .num_args(1..);
    let config_arg = Arg::new("config")
        .long("config")
        .value_name("FILE")
        .help("Path to a single .styler.toml configuration file");
    let profile_arg = Arg::new("profile")
        .long("profile")
        .value_name("NAME")
        .help("Named configuration profile (reserved for the external config loader)");
    let machine_arg = Arg::new("machine")
        .long("machine")
        .help("Emit diagnostics as application/json instead of human-readable text")
        .action(ArgAction::SetTrue);

    Command::new("curlyfmt")
        .version(env!("CARGO_PKG_VERSION"))
        .about("A high-throughput formatter for C-family curly-brace languages")
        .subcommand_required(true)
        .subcommand(
            Command::new("format")
                .about("Reformats files in place")
                .arg(path_arg.clone())
                .arg(config_arg.clone())
                .arg(profile_arg.clone())
                .arg(machine_arg.clone()),
        )
        .subcommand(
            Command::new("check")
                .about("Reports formatting violations without writing any file")
                .arg(path_arg)
                .arg(config_arg)
                .arg(profile_arg)
                .arg(machine_arg),
        )
}

fn run() -> u8 {
    let matches = cli().get_matches();

    let (subcommand, sub_matches) = match matches.subcommand() {
        Some(pair) => pair,
        None => return EXIT_USAGE,
    };
    let is_check = subcommand == "check";

    let raw_paths: Vec<&String> = sub_matches.get_many::<String>("paths").unwrap().collect();
    let machine_output = sub_matches.get_flag("machine");

    let configs = match sub_matches.get_one::<String>("config") {
        Some(path) => match config::load_single_file(Path::new(path)) {
            Ok(configs) => configs,
            Err(err) => {
                report_single_error(&err.to_string(), machine_output);
                return EXIT_CONFIG;
            }
        },
        None => config::default_configurations(),
    };

    let files = match discover_files(&raw_paths) {
        Ok(files) => files,
        Err(err) => {
            report_single_error(&err, machine_output);
            return EXIT_IO;
        }
    };
    if files.is_empty() {
        return EXIT_SUCCESS;
    }

    let outcome = run_pipeline(&files, &configs, is_check);
    render(&outcome, machine_output);

    if outcome.internal_error_count > 0 {
        EXIT_INTERNAL
    } else if outcome.io_or_security_error_count > 0 {
        EXIT_IO
    } else if outcome.violation_count > 0 {
        EXIT_VIOLATIONS
    } else {
        EXIT_SUCCESS
    }
}

/// Expands directories into their contained source files; a bare file
/// path is used as-is. Only `.java`-suffixed files are considered, the
/// one concrete grammar [`curlyfmt::pipeline::SimpleCBraceParser`]
/// understands.
fn discover_files(raw_paths: &[&String]) -> Result<Vec<PathBuf>, String> {
    let mut files = Vec::new();
    for raw in raw_paths {
        let path = Path::new(raw);
        let metadata = std::fs::metadata(path).map_err(|e| format!("cannot access {raw}: {e}"))?;
        if metadata.is_dir() {
            for entry in WalkDir::new(path).into_iter().filter_map(Result::ok) {
                if entry.file_type().is_file() && entry.path().extension().is_some_and(|ext| ext == "java") {
                    files.push(entry.into_path());
                }
            }
        } else {
            files.push(path.to_path_buf());
        }
    }
    Ok(files)
}

struct RunOutcome {
    diagnostics: Vec<Diagnostic>,
    violation_count: usize,
    io_or_security_error_count: usize,
    internal_error_count: usize,
}

fn run_pipeline(files: &[PathBuf], configs: &[FormattingConfiguration], is_check: bool) -> RunOutcome {
    let reader = RealSourceReader;
    let parser = SimpleCBraceParser;
    let registry = RuleRegistry::with_builtins();
    let pipeline = FilePipeline::new(&reader, &parser, &registry, configs).analyze_only(is_check);

    let executor_config = ExecutorConfig::default();
    let report = executor::run_batch(&pipeline, files, &LoggingObserver, &executor_config);

    let mut diagnostics = Vec::new();
    let mut io_or_security_error_count = 0;
    let mut internal_error_count = 0;

    for result in &report.results {
        match result {
            StageResult::Success(outcome) => diagnostics.extend(diagnostics_for(outcome)),
            StageResult::Failure(err) => {
                match &err.error {
                    curlyfmt::error::PipelineError::Io { .. } | curlyfmt::error::PipelineError::Security { .. } => {
                        io_or_security_error_count += 1;
                    }
                    curlyfmt::error::PipelineError::Internal { .. } => internal_error_count += 1,
                    _ => {}
                }
                diagnostics.push(Diagnostic::from(&err.error));
            }
        }
    }

    if !is_check {
        for result in &report.results {
            if let StageResult::Success(outcome) = result {
                if outcome.formatted_source.as_bytes()
                    != std::fs::read(&outcome.file_path).unwrap_or_default().as_slice()
                {
                    let _ = std::fs::write(&outcome.file_path, &outcome.formatted_source);
                }
            }
        }
    }

    let violation_count = diagnostics.iter().filter(|d| d.severity != Severity::Info).count();
    RunOutcome {
        diagnostics,
        violation_count,
        io_or_security_error_count,
        internal_error_count,
    }
}

fn render(outcome: &RunOutcome, machine_output: bool) {
    if machine_output {
        println!("{}", error_report_json(&outcome.diagnostics));
        return;
    }
    for diagnostic in &outcome.diagnostics {
        let location = diagnostic
            .range
            .map(|r| format!("{}:{}", r.start().line(), r.start().column()))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{}:{} [{:?}] {}",
            diagnostic.file.display(),
            location,
            diagnostic.severity,
            diagnostic.message
        );
    }
}

fn report_single_error(message: &str, machine_output: bool) {
    if machine_output {
        println!(
            "{}",
            error_report_json(&[Diagnostic {
                category: curlyfmt::diagnostics::DiagnosticCategory::Config,
                severity: Severity::Error,
                file: PathBuf::new(),
                range: None,
                message: message.to_string(),
                rule_id: None,
                suggested_fix: None,
            }])
        );
    } else {
        eprintln!("curlyfmt: {message}");
    }
}
