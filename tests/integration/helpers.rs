//! Helper functions for integration tests

use std::io::Write;

use ping_monitoring::Observation;
use tempfile::NamedTempFile;

/// Builds observations for one address at timestamps 1, 2, 3, ...
/// `None` is a timeout, `Some(latency)` a response.
pub fn observations(address: &str, pattern: &[Option<f64>]) -> Vec<Observation> {
    pattern
        .iter()
        .enumerate()
        .map(|(i, outcome)| {
            let timestamp = i as i64 + 1;
            match outcome {
                Some(latency) => Observation::responded(timestamp, address, *latency),
                None => Observation::timeout(timestamp, address),
            }
        })
        .collect()
}

/// Writes `lines` into a temporary ping log.
pub fn create_log_file(lines: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    for line in lines {
        writeln!(file, "{line}").unwrap();
    }
    file.flush().unwrap();
    file
}

/// A small log with two /16 and two /24 hosts
pub fn sample_log_lines() -> Vec<&'static str> {
    vec![
        "20201019133124,10.20.30.1/16,2",
        "20201019133125,10.20.30.2/16,1",
        "20201019133134,192.168.1.1/24,10",
        "20201019133135,192.168.1.2/24,5",
        "20201019133224,10.20.30.1/16,-",
        "20201019133225,10.20.30.2/16,1",
        "20201019133234,192.168.1.1/24,-",
        "20201019133235,192.168.1.2/24,-",
        "20201019133324,10.20.30.1/16,-",
        "20201019133325,10.20.30.2/16,2",
        "20201019133334,192.168.1.1/24,-",
        "20201019133335,192.168.1.2/24,-",
        "20201019133424,10.20.30.1/16,-",
        "20201019133425,10.20.30.2/16,1",
        "20201019133434,192.168.1.1/24,-",
        "20201019133435,192.168.1.2/24,-",
        "20201019133524,10.20.30.1/16,1",
        "20201019133525,10.20.30.2/16,-",
        "20201019133534,192.168.1.1/24,3",
        "20201019133535,192.168.1.2/24,2",
        "20201019133624,10.20.30.1/16,2",
        "20201019133625,10.20.30.2/16,1",
    ]
}
