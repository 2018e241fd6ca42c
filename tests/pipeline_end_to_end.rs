//! End-to-end pipeline tests driving the real filesystem reader and
//! reference parser through the full stage sequence, rather than the
//! in-memory fakes used by the unit tests in `src/pipeline.rs`.

use curlyfmt::config::default_configurations;
use curlyfmt::deadline::Deadline;
use curlyfmt::diagnostics::Severity;
use curlyfmt::pipeline::{diagnostics_for, FilePipeline, RealSourceReader, SimpleCBraceParser};
use curlyfmt::progress::NullObserver;
use curlyfmt::recovery::StageResult;
use curlyfmt::rules::RuleRegistry;
use std::io::Write;
use tempfile::NamedTempFile;

fn write_source(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::with_suffix(".java").expect("create temp file");
    file.write_all(contents.as_bytes()).expect("write temp file");
    file
}

#[test]
fn already_formatted_file_produces_no_edits() {
    let file = write_source("package com.example;\n\nclass Greeter {\n    void hello() {\n        System.out.println(\"hi\");\n    }\n}\n");
    let reader = RealSourceReader;
    let parser = SimpleCBraceParser;
    let registry = RuleRegistry::with_builtins();
    let configs = default_configurations();
    let pipeline = FilePipeline::new(&reader, &parser, &registry, &configs);

    let (result, _halt) = pipeline.run(file.path(), &NullObserver, Deadline::none());
    let StageResult::Success(outcome) = result else {
        panic!("expected success");
    };
    assert_eq!(outcome.line_mapping.line_delta(), 0);
    assert!(!outcome.used_fallback);
}

#[test]
fn misplaced_brace_is_flagged_and_joined() {
    let file = write_source("package com.example;\n\nclass Greeter\n{\n    void hello()\n    {\n    }\n}\n");
    let reader = RealSourceReader;
    let parser = SimpleCBraceParser;
    let registry = RuleRegistry::with_builtins();
    let configs = default_configurations();
    let pipeline = FilePipeline::new(&reader, &parser, &registry, &configs);

    let (result, _halt) = pipeline.run(file.path(), &NullObserver, Deadline::none());
    let StageResult::Success(outcome) = result else {
        panic!("expected success");
    };
    assert!(!outcome.violations.is_empty());
    assert!(!outcome.formatted_source.contains("\n{"), "opening braces should be joined onto the previous line");
}

#[test]
fn check_mode_reports_violations_without_rewriting_source() {
    let original = "class Greeter\n{\n}\n";
    let file = write_source(original);
    let reader = RealSourceReader;
    let parser = SimpleCBraceParser;
    let registry = RuleRegistry::with_builtins();
    let configs = default_configurations();
    let pipeline = FilePipeline::new(&reader, &parser, &registry, &configs).analyze_only(true);

    let (result, _halt) = pipeline.run(file.path(), &NullObserver, Deadline::none());
    let StageResult::Success(outcome) = result else {
        panic!("expected success");
    };
    assert_eq!(outcome.formatted_source, original);
    let diagnostics = diagnostics_for(&outcome);
    assert!(diagnostics.iter().any(|d| d.severity != Severity::Info));
}

#[test]
fn reformatting_a_formatted_file_is_idempotent() {
    let file = write_source("class Greeter\n{\n  void hello( ) {\nSystem.out.println(\"hi\");\n}\n}\n");
    let reader = RealSourceReader;
    let parser = SimpleCBraceParser;
    let registry = RuleRegistry::with_builtins();
    let configs = default_configurations();
    let pipeline = FilePipeline::new(&reader, &parser, &registry, &configs);

    let (first, _halt) = pipeline.run(file.path(), &NullObserver, Deadline::none());
    let StageResult::Success(first_outcome) = first else {
        panic!("expected success");
    };

    std::fs::write(file.path(), &first_outcome.formatted_source).expect("rewrite temp file");
    let (second, _halt) = pipeline.run(file.path(), &NullObserver, Deadline::none());
    let StageResult::Success(second_outcome) = second else {
        panic!("expected success");
    };

    assert_eq!(first_outcome.formatted_source, second_outcome.formatted_source);
}

#[test]
fn oversized_file_is_rejected_before_being_read_into_memory() {
    let mut file = NamedTempFile::with_suffix(".java").expect("create temp file");
    let oversized = "x".repeat(curlyfmt::pipeline::MAX_FILE_SIZE_BYTES as usize + 1);
    file.write_all(oversized.as_bytes()).expect("write temp file");

    let reader = RealSourceReader;
    let parser = SimpleCBraceParser;
    let registry = RuleRegistry::with_builtins();
    let configs = default_configurations();
    let pipeline = FilePipeline::new(&reader, &parser, &registry, &configs);

    let (result, _halt) = pipeline.run(file.path(), &NullObserver, Deadline::none());
    assert!(!result.is_success());
}
