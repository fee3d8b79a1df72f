//! Overload detection combined with failure tracking

use ping_monitoring::{
    Interval, OverloadSegment,
    query::{Query, analyze},
};
use pretty_assertions::assert_eq;

use crate::helpers::*;

fn overload_query(window: usize, latency_threshold: f64) -> Query {
    Query::Overloads {
        threshold: 3,
        window,
        latency_threshold,
    }
}

#[test]
fn test_consecutive_windows_are_not_merged() {
    let observations = observations("A", &[Some(25.0); 6]);

    let report = analyze(&overload_query(5, 20.0), observations).unwrap();
    assert_eq!(
        report.overloads.unwrap()["A"],
        vec![OverloadSegment::new(1, 5), OverloadSegment::new(2, 6)]
    );
}

#[test]
fn test_single_slow_response_can_lift_the_mean() {
    let observations = observations(
        "A",
        &[Some(1.0), Some(1.0), Some(1.0), Some(1.0), Some(96.0), Some(1.0)],
    );

    // (1 + 1 + 1 + 1 + 96) / 5 = 20
    let report = analyze(&overload_query(5, 20.0), observations).unwrap();
    assert_eq!(
        report.overloads.unwrap()["A"],
        vec![OverloadSegment::new(1, 5), OverloadSegment::new(2, 6)]
    );
}

#[test]
fn test_timeouts_restart_detection_and_feed_failures() {
    let observations = observations(
        "A",
        &[
            Some(50.0),
            Some(50.0),
            None,
            None,
            None,
            Some(50.0),
            Some(50.0),
            Some(50.0),
        ],
    );

    let report = analyze(&overload_query(3, 20.0), observations).unwrap();
    assert_eq!(report.failures["A"], vec![Interval::closed(3, 6)]);
    assert_eq!(
        report.overloads.unwrap()["A"],
        vec![OverloadSegment::new(6, 8)]
    );
}

#[test]
fn test_no_overloads_reported_as_empty() {
    let observations = observations("A", &[Some(1.0); 10]);

    let report = analyze(&overload_query(5, 20.0), observations).unwrap();
    assert!(report.overloads.unwrap().is_empty());
}
