//! Per-address trackers fed one observation at a time
//!
//! - [`failure`]: debounced outage detection
//! - [`overload`]: sliding-window latency aggregation
//! - [`subnet`]: subnet-wide failure aggregation on top of [`failure`]

pub mod failure;
pub mod overload;
pub mod subnet;

pub use failure::{FailureReport, FailureState, FailureTracker};
pub use overload::{OverloadReport, OverloadTracker, merge_segments};
pub use subnet::{SubnetAddress, SubnetAggregator};
