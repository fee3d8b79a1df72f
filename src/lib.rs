pub mod config;
pub mod error;
pub mod monitors;
pub mod parser;
pub mod query;
pub mod report;
pub mod util;

use serde::{Deserialize, Serialize};

pub use error::{AnalysisError, AnalysisResult};

/// A single recorded ping result for one address
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub timestamp: i64,
    /// Address as it appeared in the log, optionally with a `/mask` suffix
    pub address: String,
    pub outcome: Outcome,
}

impl Observation {
    pub fn new(timestamp: i64, address: impl Into<String>, outcome: Outcome) -> Self {
        Self {
            timestamp,
            address: address.into(),
            outcome,
        }
    }

    pub fn timeout(timestamp: i64, address: impl Into<String>) -> Self {
        Self::new(timestamp, address, Outcome::Timeout)
    }

    pub fn responded(timestamp: i64, address: impl Into<String>, latency: f64) -> Self {
        Self::new(timestamp, address, Outcome::Responded(latency))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Timeout,
    Responded(f64),
}

impl Outcome {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Outcome::Timeout)
    }

    pub fn latency(&self) -> Option<f64> {
        match self {
            Outcome::Timeout => None,
            Outcome::Responded(latency) => Some(*latency),
        }
    }
}

/// A failure interval. The end is exclusive: it is the timestamp of the first
/// response after the outage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    pub start: i64,
    pub end: IntervalEnd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntervalEnd {
    Closed(i64),
    /// Still in progress when the data ended
    Open,
}

impl Interval {
    pub fn closed(start: i64, end: i64) -> Self {
        Self {
            start,
            end: IntervalEnd::Closed(end),
        }
    }

    pub fn open(start: i64) -> Self {
        Self {
            start,
            end: IntervalEnd::Open,
        }
    }

    pub fn is_open(&self) -> bool {
        self.end == IntervalEnd::Open
    }

    /// Length of a closed interval. Defined over the whole `i64` range.
    pub fn duration(&self) -> Option<u64> {
        match self.end {
            IntervalEnd::Closed(end) => Some(end.abs_diff(self.start)),
            IntervalEnd::Open => None,
        }
    }
}

/// A window of `M` consecutive responses whose mean latency met the threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverloadSegment {
    pub start: i64,
    pub end: i64,
}

impl OverloadSegment {
    pub fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    pub fn duration(&self) -> u64 {
        self.end.abs_diff(self.start)
    }
}
