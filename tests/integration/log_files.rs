//! End-to-end analysis of ping log files

use ping_monitoring::{
    AnalysisError, Interval,
    parser::{ParseOptions, read_log_file},
    query::{Query, Report, analyze_records},
    report::{OutputFormat, render},
};
use assert_matches::assert_matches;
use pretty_assertions::assert_eq;

use crate::helpers::*;

fn run(query: Query, lines: &[&str]) -> Result<Report, AnalysisError> {
    let file = create_log_file(lines);
    let options = ParseOptions::default().require_mask(query.requires_mask());
    let records = read_log_file(file.path(), options)?;
    analyze_records(&query, records)
}

#[test]
fn test_raw_failures_from_log() {
    let report = run(Query::Failures, &sample_log_lines()).unwrap();

    assert_eq!(report.failures.len(), 4);
    assert_eq!(
        report.failures["10.20.30.1/16"],
        vec![Interval::closed(20201019133224, 20201019133524)]
    );
    assert_eq!(
        report.failures["10.20.30.2/16"],
        vec![Interval::closed(20201019133525, 20201019133625)]
    );
}

#[test]
fn test_debounced_failures_from_log() {
    let report = run(
        Query::DebouncedFailures { threshold: 3 },
        &sample_log_lines(),
    )
    .unwrap();

    assert_eq!(
        report.failures.keys().cloned().collect::<Vec<_>>(),
        vec![
            "10.20.30.1/16".to_string(),
            "192.168.1.1/24".to_string(),
            "192.168.1.2/24".to_string(),
        ]
    );
    assert_eq!(
        report.failures["192.168.1.2/24"],
        vec![Interval::closed(20201019133235, 20201019133535)]
    );
}

#[test]
fn test_overloads_from_log() {
    let query = Query::Overloads {
        threshold: 3,
        window: 5,
        latency_threshold: 20.0,
    };
    let report = run(query, &sample_log_lines()).unwrap();

    assert_eq!(report.failures.len(), 3);
    assert!(report.overloads.unwrap().is_empty());
}

#[test]
fn test_subnet_failures_from_log() {
    let report = run(Query::SubnetFailures { threshold: 3 }, &sample_log_lines()).unwrap();

    assert_eq!(report.failed_subnets, Some(vec!["192.168.1".to_string()]));
}

#[test]
fn test_malformed_line_aborts_with_line_number() {
    let lines = ["1,10.0.0.1/24,2", "2,10.0.0.1/24", "3,10.0.0.1/24,-"];

    let result = run(Query::Failures, &lines);
    assert_matches!(result, Err(AnalysisError::MalformedRecord { line: 2, .. }));
}

#[test]
fn test_subnet_query_requires_masks_in_log() {
    let lines = ["1,10.0.0.1/24,2", "2,10.0.0.2,-"];

    assert!(run(Query::Failures, &lines).is_ok());
    assert_matches!(
        run(Query::SubnetFailures { threshold: 1 }, &lines),
        Err(AnalysisError::MalformedRecord { line: 2, .. })
    );
}

#[test]
fn test_missing_log_file() {
    let result = read_log_file("/nonexistent/ping.log", ParseOptions::default());
    assert_matches!(result, Err(AnalysisError::IoError(_)));
}

#[test]
fn test_rendered_text_report() {
    let query = Query::DebouncedFailures { threshold: 3 };
    let report = run(query, &sample_log_lines()).unwrap();

    let text = render(&query, &report, OutputFormat::Text).unwrap();
    assert!(text.starts_with("Failures after 3 consecutive timeouts:\n"));
    assert!(text.contains(
        "Server 10.20.30.1/16 failed 1 times:\n\
         Failure 1 at timestamp 20201019133224 with duration 300 seconds.\n"
    ));
}
