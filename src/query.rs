//! Query assembly
//!
//! A [`Query`] selects which trackers run over the observation stream. All
//! trackers see every observation exactly once, in stream order.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::{
    AnalysisError, AnalysisResult, Observation,
    config::Config,
    monitors::{
        FailureReport, FailureTracker, OverloadReport, OverloadTracker, SubnetAddress,
        SubnetAggregator, merge_segments,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "query", rename_all = "snake_case")]
pub enum Query {
    /// Every timeout run is a failure
    Failures,
    /// Timeout runs of at least `threshold` observations
    DebouncedFailures { threshold: usize },
    /// Debounced failures plus sliding-window overload detection
    Overloads {
        threshold: usize,
        window: usize,
        latency_threshold: f64,
    },
    /// Debounced failures plus subnets whose hosts have all failed
    SubnetFailures { threshold: usize },
}

impl Query {
    pub fn debounced(config: &Config) -> Self {
        Query::DebouncedFailures {
            threshold: config.debounce,
        }
    }

    pub fn overloads(config: &Config) -> Self {
        Query::Overloads {
            threshold: config.debounce,
            window: config.overload.window,
            latency_threshold: config.overload.threshold,
        }
    }

    pub fn subnets(config: &Config) -> Self {
        Query::SubnetFailures {
            threshold: config.debounce,
        }
    }

    /// Consecutive timeouts needed for a failure
    pub fn threshold(&self) -> usize {
        match self {
            Query::Failures => 1,
            Query::DebouncedFailures { threshold }
            | Query::Overloads { threshold, .. }
            | Query::SubnetFailures { threshold } => *threshold,
        }
    }

    /// Whether every address must carry an `ipv4/mask` suffix
    pub fn requires_mask(&self) -> bool {
        matches!(self, Query::SubnetFailures { .. })
    }

    pub fn title(&self) -> String {
        match self {
            Query::Failures => "Failures".to_string(),
            Query::DebouncedFailures { threshold } => {
                format!("Failures after {threshold} consecutive timeouts")
            }
            Query::Overloads {
                threshold,
                window,
                latency_threshold,
            } => format!(
                "Failures after {threshold} consecutive timeouts and overloads \
                 (mean of {window} responses >= {latency_threshold})"
            ),
            Query::SubnetFailures { threshold } => {
                format!("Failures after {threshold} consecutive timeouts and failed subnets")
            }
        }
    }
}

/// Outcome of a query
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Report {
    pub failures: FailureReport,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overloads: Option<OverloadReport>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_subnets: Option<Vec<String>>,
}

impl Report {
    /// Coalesces overlapping overload segments of every address.
    pub fn merge_overloads(&mut self) {
        if let Some(overloads) = &mut self.overloads {
            for segments in overloads.values_mut() {
                *segments = merge_segments(segments);
            }
        }
    }
}

/// Single-pass analysis of an observation stream
#[derive(Debug)]
pub struct Analysis {
    failures: FailureTracker,
    overloads: Option<OverloadTracker>,
    subnets: Option<SubnetAggregator>,
    last_seen: HashMap<String, i64>,
    observed: usize,
    timeouts: usize,
}

impl Analysis {
    pub fn new(query: &Query) -> AnalysisResult<Self> {
        let overloads = match *query {
            Query::Overloads {
                window,
                latency_threshold,
                ..
            } => Some(OverloadTracker::new(window, latency_threshold)?),
            _ => None,
        };

        Ok(Self {
            failures: FailureTracker::new(query.threshold())?,
            overloads,
            subnets: query.requires_mask().then(SubnetAggregator::new),
            last_seen: HashMap::new(),
            observed: 0,
            timeouts: 0,
        })
    }

    pub fn observe(&mut self, observation: &Observation) -> AnalysisResult<()> {
        // validate everything before touching any tracker state
        let subnet_address = match self.subnets {
            Some(_) => Some(SubnetAddress::parse(&observation.address)?),
            None => None,
        };

        if let Some(previous) = self.last_seen.get(&observation.address)
            && *previous > observation.timestamp
        {
            return Err(AnalysisError::OutOfOrder {
                address: observation.address.clone(),
                previous: *previous,
                timestamp: observation.timestamp,
            });
        }
        self.last_seen
            .insert(observation.address.clone(), observation.timestamp);
        self.observed += 1;
        if observation.outcome.is_timeout() {
            self.timeouts += 1;
        }

        let closed = self.failures.observe(observation);

        if let Some(overloads) = &mut self.overloads {
            overloads.observe(observation);
        }

        if let (Some(subnets), Some(address)) = (&mut self.subnets, subnet_address) {
            subnets.observe(&address, closed.is_some());
        }

        Ok(())
    }

    pub fn finish(self) -> Report {
        debug!(
            "analysed {} observations ({} timeouts) of {} addresses",
            self.observed,
            self.timeouts,
            self.last_seen.len()
        );

        let failures = self.failures.finish();
        let ongoing = failures
            .values()
            .flatten()
            .filter(|interval| interval.is_open())
            .count();
        if ongoing > 0 {
            debug!("{ongoing} failures still ongoing at end of data");
        }

        let failed_subnets = self.subnets.map(|subnets| {
            let failed = subnets.failed_subnets();
            debug!(
                "{} of {} subnets failed",
                failed.len(),
                subnets.subnets().count()
            );
            failed
        });

        Report {
            failures,
            overloads: self.overloads.map(OverloadTracker::finish),
            failed_subnets,
        }
    }
}

/// Runs `query` over already parsed observations.
pub fn analyze<I>(query: &Query, observations: I) -> AnalysisResult<Report>
where
    I: IntoIterator<Item = Observation>,
{
    analyze_records(query, observations.into_iter().map(Ok))
}

/// Runs `query` over a fallible record stream, aborting on the first error.
#[instrument(skip(observations))]
pub fn analyze_records<I>(query: &Query, observations: I) -> AnalysisResult<Report>
where
    I: IntoIterator<Item = AnalysisResult<Observation>>,
{
    let mut analysis = Analysis::new(query)?;
    for observation in observations {
        analysis.observe(&observation?)?;
    }

    let report = analysis.finish();
    info!(
        "{}: {} failing addresses",
        query.title(),
        report.failures.len()
    );
    Ok(report)
}
