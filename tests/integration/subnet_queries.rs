//! Subnet aggregation on top of debounced failures

use ping_monitoring::{
    AnalysisError, Observation,
    query::{Query, analyze},
};
use assert_matches::assert_matches;
use pretty_assertions::assert_eq;

fn failed_subnets(threshold: usize, observations: Vec<Observation>) -> Vec<String> {
    analyze(&Query::SubnetFailures { threshold }, observations)
        .unwrap()
        .failed_subnets
        .unwrap()
}

#[test]
fn test_subnet_fails_once_every_host_failed() {
    let mut observations = vec![
        Observation::timeout(1, "10.0.0.1/24"),
        Observation::responded(1, "10.0.0.2/24", 1.0),
        Observation::responded(2, "10.0.0.1/24", 1.0),
    ];
    assert!(failed_subnets(1, observations.clone()).is_empty());

    observations.extend([
        Observation::timeout(3, "10.0.0.2/24"),
        Observation::responded(4, "10.0.0.2/24", 1.0),
    ]);
    assert_eq!(failed_subnets(1, observations), vec!["10.0.0".to_string()]);
}

#[test]
fn test_short_runs_do_not_count_towards_subnet_failure() {
    let observations = vec![
        Observation::timeout(1, "10.0.0.1/24"),
        Observation::timeout(2, "10.0.0.1/24"),
        Observation::responded(3, "10.0.0.1/24", 1.0),
    ];

    assert!(failed_subnets(3, observations.clone()).is_empty());
    assert_eq!(failed_subnets(2, observations), vec!["10.0.0".to_string()]);
}

#[test]
fn test_masks_select_the_subnet() {
    let observations = vec![
        Observation::timeout(1, "10.1.0.1/16"),
        Observation::timeout(1, "10.1.7.1/16"),
        Observation::responded(2, "10.1.0.1/16", 1.0),
        Observation::responded(2, "10.1.7.1/16", 1.0),
    ];

    assert_eq!(failed_subnets(1, observations), vec!["10.1".to_string()]);
}

#[test]
fn test_unmasked_address_aborts_subnet_query() {
    let observations = vec![Observation::timeout(1, "host-a")];

    assert_matches!(
        analyze(&Query::SubnetFailures { threshold: 1 }, observations),
        Err(AnalysisError::InvalidAddress { .. })
    );
}
