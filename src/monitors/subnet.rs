//! Subnet failure aggregation
//!
//! Subnets are derived textually from `ipv4/mask` addresses: the subnet is
//! made of the first `mask / 8` dotted groups and the host of the rest. Masks
//! that are not a multiple of 8 are truncated to the preceding dot, so
//! `10.1.2.3/20` lands in `10.1` just like `/16` would.
//!
//! Masks below 8 and `/32` have no dot to split at. They are not resolved by
//! searching for a dot (which would leave an empty subnet and a host missing
//! its first character): `/0`..`/7` give an empty subnet with the whole
//! address as host, and `/32` gives the whole address as subnet with an
//! empty host.

use std::collections::BTreeMap;
use std::net::Ipv4Addr;
use std::str::FromStr;

use tracing::{debug, trace};

use crate::{AnalysisError, AnalysisResult};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubnetAddress {
    pub subnet: String,
    pub host: String,
    pub mask: u8,
}

impl SubnetAddress {
    pub fn parse(address: &str) -> AnalysisResult<Self> {
        let invalid = |reason: &str| AnalysisError::InvalidAddress {
            address: address.to_string(),
            reason: reason.to_string(),
        };

        let (ip, mask) = address
            .split_once('/')
            .ok_or_else(|| invalid("missing /mask suffix"))?;

        Ipv4Addr::from_str(ip).map_err(|_| invalid("not an IPv4 address"))?;

        let mask = mask
            .parse::<u8>()
            .ok()
            .filter(|mask| *mask <= 32)
            .ok_or_else(|| invalid("mask must be an integer between 0 and 32"))?;

        let groups = usize::from(mask / 8);
        let (subnet, host) = match groups {
            0 => ("", ip),
            // a full address has only three dots
            4 => (ip, ""),
            _ => ip
                .match_indices('.')
                .nth(groups - 1)
                .map(|(idx, _)| (&ip[..idx], &ip[idx + 1..]))
                .ok_or_else(|| invalid("not an IPv4 address"))?,
        };

        Ok(Self {
            subnet: subnet.to_string(),
            host: host.to_string(),
            mask,
        })
    }
}

/// Tracks, per subnet, whether each observed host has ever failed.
#[derive(Debug, Clone, Default)]
pub struct SubnetAggregator {
    subnets: BTreeMap<String, BTreeMap<String, bool>>,
}

impl SubnetAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one observation. `failure_closed` is true only for the
    /// observation that ended a confirmed failure of this host.
    pub fn observe(&mut self, address: &SubnetAddress, failure_closed: bool) {
        let hosts = self.subnets.entry(address.subnet.clone()).or_default();
        let failed = hosts.entry(address.host.clone()).or_insert(failure_closed);

        if failure_closed && !*failed {
            debug!("subnet {}: host {} failed", address.subnet, address.host);
            *failed = true;
        }

        trace!(
            "subnet {}: host {} (ever failed: {})",
            address.subnet, address.host, *failed
        );
    }

    /// Parses `address` and records the observation.
    pub fn observe_address(&mut self, address: &str, failure_closed: bool) -> AnalysisResult<()> {
        let address = SubnetAddress::parse(address)?;
        self.observe(&address, failure_closed);
        Ok(())
    }

    /// A subnet has failed once every host seen in it has failed.
    pub fn is_failed(&self, subnet: &str) -> bool {
        self.subnets
            .get(subnet)
            .is_some_and(|hosts| hosts.values().all(|failed| *failed))
    }

    pub fn failed_subnets(&self) -> Vec<String> {
        self.subnets
            .keys()
            .filter(|subnet| self.is_failed(subnet))
            .cloned()
            .collect()
    }

    pub fn subnets(&self) -> impl Iterator<Item = &str> {
        self.subnets.keys().map(String::as_str)
    }
}
