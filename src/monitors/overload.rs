//! Sliding-window overload detection
//!
//! Every address keeps the latencies of its most recent responses. Whenever
//! the window holds `window` entries, their mean is compared to the latency
//! threshold and the window slides forward by one entry. A timeout empties
//! the window, so detection restarts from scratch after every missed ping.
//!
//! Consecutive qualifying windows each produce their own segment. Use
//! [`merge_segments`] to coalesce them into continuous periods.

use std::collections::{BTreeMap, HashMap, VecDeque};

use tracing::{debug, instrument, trace};

use crate::{AnalysisError, AnalysisResult, Observation, OverloadSegment};

/// Overload segments per address in emission order. Addresses that were
/// never overloaded are absent.
pub type OverloadReport = BTreeMap<String, Vec<OverloadSegment>>;

#[derive(Debug, Clone, Copy, PartialEq)]
struct LatencySample {
    latency: f64,
    timestamp: i64,
}

#[derive(Debug, Clone)]
pub struct OverloadTracker {
    window: usize,
    threshold: f64,
    windows: HashMap<String, VecDeque<LatencySample>>,
    overloads: OverloadReport,
}

impl OverloadTracker {
    pub fn new(window: usize, threshold: f64) -> AnalysisResult<Self> {
        if window == 0 {
            return Err(AnalysisError::InvalidConfig(
                "overload window must hold at least 1 response".to_string(),
            ));
        }
        if !threshold.is_finite() {
            return Err(AnalysisError::InvalidConfig(format!(
                "overload latency threshold must be finite, got {threshold}"
            )));
        }

        Ok(Self {
            window,
            threshold,
            windows: HashMap::new(),
            overloads: BTreeMap::new(),
        })
    }

    /// Number of responses currently buffered for `address`.
    pub fn buffered(&self, address: &str) -> usize {
        self.windows.get(address).map_or(0, VecDeque::len)
    }

    #[instrument(skip_all, fields(address = %observation.address))]
    pub fn observe(&mut self, observation: &Observation) -> Option<OverloadSegment> {
        let capacity = self.window;
        let window = self
            .windows
            .entry(observation.address.clone())
            .or_insert_with(|| VecDeque::with_capacity(capacity));

        let Some(latency) = observation.outcome.latency() else {
            if !window.is_empty() {
                trace!(
                    "{}: timeout at {}, discarding {} buffered responses",
                    observation.address,
                    observation.timestamp,
                    window.len()
                );
            }
            window.clear();
            return None;
        };

        window.push_back(LatencySample {
            latency,
            timestamp: observation.timestamp,
        });

        if window.len() < capacity {
            return None;
        }

        let mean = window.iter().map(|sample| sample.latency).sum::<f64>() / window.len() as f64;
        let segment = match (window.front(), window.back()) {
            (Some(first), Some(last)) if mean >= self.threshold => {
                Some(OverloadSegment::new(first.timestamp, last.timestamp))
            }
            _ => None,
        };

        trace!(
            "{}: mean latency {mean:.2} over {} responses (threshold: {})",
            observation.address,
            window.len(),
            self.threshold
        );

        window.pop_front();

        if let Some(segment) = segment {
            debug!(
                "{}: overloaded from {} to {} (mean {mean:.2})",
                observation.address, segment.start, segment.end
            );
            self.overloads
                .entry(observation.address.clone())
                .or_default()
                .push(segment);
        }

        segment
    }

    pub fn finish(self) -> OverloadReport {
        self.overloads
    }
}

/// Coalesces overlapping or touching segments into continuous periods.
///
/// This changes the number of reported segments and is therefore never
/// applied implicitly.
pub fn merge_segments(segments: &[OverloadSegment]) -> Vec<OverloadSegment> {
    let mut sorted = segments.to_vec();
    sorted.sort_by_key(|segment| (segment.start, segment.end));

    let mut merged: Vec<OverloadSegment> = Vec::with_capacity(sorted.len());
    for segment in sorted {
        match merged.last_mut() {
            Some(last) if segment.start <= last.end => {
                last.end = last.end.max(segment.end);
            }
            _ => merged.push(segment),
        }
    }

    merged
}
