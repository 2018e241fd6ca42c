//! Integration tests for the batch executor against real files on disk,
//! exercising the worker pool and halt semantics end to end rather than
//! the in-memory fakes in `src/executor.rs`'s unit tests.

use curlyfmt::config::default_configurations;
use curlyfmt::executor::{run_batch, ExecutorConfig};
use curlyfmt::pipeline::{FilePipeline, RealSourceReader, SimpleCBraceParser};
use curlyfmt::progress::NullObserver;
use curlyfmt::rules::RuleRegistry;
use std::fs;
use tempfile::tempdir;

#[test]
fn batch_formats_a_directory_of_files_concurrently() {
    let dir = tempdir().expect("create temp dir");
    let mut paths = Vec::new();
    for i in 0..12 {
        let path = dir.path().join(format!("File{i}.java"));
        fs::write(&path, format!("class File{i}\n{{\n}}\n")).expect("write source file");
        paths.push(path);
    }

    let reader = RealSourceReader;
    let parser = SimpleCBraceParser;
    let registry = RuleRegistry::with_builtins();
    let configs = default_configurations();
    let pipeline = FilePipeline::new(&reader, &parser, &registry, &configs);

    let config = ExecutorConfig {
        worker_count: 4,
        ..ExecutorConfig::default()
    };
    let report = run_batch(&pipeline, &paths, &NullObserver, &config);

    assert_eq!(report.results.len(), paths.len());
    assert_eq!(report.success_count(), paths.len());
    assert!(!report.halted_early);
}

#[test]
fn batch_reports_per_file_failures_without_aborting_the_whole_run() {
    let dir = tempdir().expect("create temp dir");
    let mut paths = Vec::new();
    for i in 0..5 {
        paths.push(dir.path().join(format!("Missing{i}.java")));
    }

    let reader = RealSourceReader;
    let parser = SimpleCBraceParser;
    let registry = RuleRegistry::with_builtins();
    let configs = default_configurations();
    let pipeline = FilePipeline::new(&reader, &parser, &registry, &configs);

    let config = ExecutorConfig {
        worker_count: 2,
        max_errors: 100,
        ..ExecutorConfig::default()
    };
    let report = run_batch(&pipeline, &paths, &NullObserver, &config);

    assert_eq!(report.results.len(), paths.len());
    assert_eq!(report.failure_count(), paths.len());
}
