use std::collections::{BTreeMap, HashMap};

use tracing::{debug, instrument, trace};

use crate::{AnalysisError, AnalysisResult, Interval, Observation, Outcome};

/// Failure intervals per address, ordered by start. Addresses that never
/// failed are absent.
pub type FailureReport = BTreeMap<String, Vec<Interval>>;

/// Outage state of a single address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailureState {
    #[default]
    Up,
    /// A run of timeouts that has not reached the threshold yet
    DebouncingDown {
        start: i64,
        consecutive_timeouts: usize,
    },
    /// The run reached the threshold; `start` is the first timeout of the run
    ConfirmedDown { start: i64 },
}

impl FailureState {
    /// Applies one observation. Returns the follow-up state and, if this
    /// observation ended a confirmed outage, the closed interval.
    pub fn next(
        self,
        timestamp: i64,
        outcome: Outcome,
        threshold: usize,
    ) -> (FailureState, Option<Interval>) {
        match (self, outcome) {
            (FailureState::Up, Outcome::Timeout) => {
                (Self::count_timeout(timestamp, 1, threshold), None)
            }
            (
                FailureState::DebouncingDown {
                    start,
                    consecutive_timeouts,
                },
                Outcome::Timeout,
            ) => (
                Self::count_timeout(start, consecutive_timeouts + 1, threshold),
                None,
            ),
            (FailureState::ConfirmedDown { start }, Outcome::Timeout) => {
                (FailureState::ConfirmedDown { start }, None)
            }
            (FailureState::ConfirmedDown { start }, Outcome::Responded(_)) => {
                (FailureState::Up, Some(Interval::closed(start, timestamp)))
            }
            // runs shorter than the threshold are noise and get dropped
            (FailureState::DebouncingDown { .. } | FailureState::Up, Outcome::Responded(_)) => {
                (FailureState::Up, None)
            }
        }
    }

    fn count_timeout(start: i64, consecutive_timeouts: usize, threshold: usize) -> FailureState {
        if consecutive_timeouts >= threshold {
            FailureState::ConfirmedDown { start }
        } else {
            FailureState::DebouncingDown {
                start,
                consecutive_timeouts,
            }
        }
    }
}

/// Turns timeout runs of at least `threshold` observations into failure
/// intervals, per address.
#[derive(Debug, Clone)]
pub struct FailureTracker {
    threshold: usize,
    states: HashMap<String, FailureState>,
    failures: FailureReport,
}

impl FailureTracker {
    pub fn new(threshold: usize) -> AnalysisResult<Self> {
        if threshold == 0 {
            return Err(AnalysisError::InvalidConfig(
                "consecutive timeout threshold must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            threshold,
            states: HashMap::new(),
            failures: BTreeMap::new(),
        })
    }

    pub fn state(&self, address: &str) -> Option<FailureState> {
        self.states.get(address).copied()
    }

    /// Feeds one observation; returns the interval it closed, if any.
    #[instrument(skip_all, fields(address = %observation.address))]
    pub fn observe(&mut self, observation: &Observation) -> Option<Interval> {
        let state = self
            .states
            .entry(observation.address.clone())
            .or_default();

        let previous = *state;
        let (next, closed) =
            previous.next(observation.timestamp, observation.outcome, self.threshold);
        *state = next;

        trace!(
            "{}: {previous:?} -> {next:?} at {}",
            observation.address, observation.timestamp
        );

        if let FailureState::ConfirmedDown { start } = next
            && !matches!(previous, FailureState::ConfirmedDown { .. })
        {
            debug!("{}: failure confirmed (since {start})", observation.address);
        }

        if let Some(interval) = closed {
            debug!(
                "{}: failure from {} ended at {}",
                observation.address, interval.start, observation.timestamp
            );
            self.failures
                .entry(observation.address.clone())
                .or_default()
                .push(interval);
        }

        closed
    }

    /// Finalizes the run. Confirmed outages still active are reported as
    /// open intervals; unconfirmed timeout runs are dropped.
    pub fn finish(self) -> FailureReport {
        let Self {
            states,
            mut failures,
            ..
        } = self;

        for (address, state) in states {
            match state {
                FailureState::ConfirmedDown { start } => {
                    debug!("{address}: failure from {start} still ongoing at end of data");
                    failures.entry(address).or_default().push(Interval::open(start));
                }
                FailureState::DebouncingDown {
                    start,
                    consecutive_timeouts,
                } => {
                    trace!(
                        "{address}: dropping unconfirmed run of {consecutive_timeouts} from {start}"
                    );
                }
                FailureState::Up => {}
            }
        }

        failures
    }
}
