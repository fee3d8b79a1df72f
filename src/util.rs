use std::{env::VarError, fmt::Display, str::FromStr};

use tracing::warn;

const DEBOUNCE: &str = "PING_DEBOUNCE";

pub const DEFAULT_DEBOUNCE: usize = 3;

pub fn get_debounce(fallback: usize) -> usize {
    let from_env = std::env::var(DEBOUNCE);
    parse_override(DEBOUNCE, from_env, fallback)
}

const OVERLOAD_WINDOW: &str = "PING_OVERLOAD_WINDOW";

pub const DEFAULT_OVERLOAD_WINDOW: usize = 5;

pub fn get_overload_window(fallback: usize) -> usize {
    let from_env = std::env::var(OVERLOAD_WINDOW);
    parse_override(OVERLOAD_WINDOW, from_env, fallback)
}

const OVERLOAD_THRESHOLD: &str = "PING_OVERLOAD_THRESHOLD";

pub const DEFAULT_OVERLOAD_THRESHOLD: f64 = 20.0;

pub fn get_overload_threshold(fallback: f64) -> f64 {
    let from_env = std::env::var(OVERLOAD_THRESHOLD);
    parse_override(OVERLOAD_THRESHOLD, from_env, fallback)
}

pub const DEFAULT_TIMEOUT_MARKER: &str = "-";

/// Parses an environment override, keeping `fallback` when the variable is
/// unset or unparsable.
fn parse_override<T>(name: &str, from_env: Result<String, VarError>, fallback: T) -> T
where
    T: FromStr + Display,
{
    match from_env {
        Ok(res) => res.parse().unwrap_or_else(|_| {
            warn!("ignoring {name}={res:?}: not a valid value, using {fallback}");
            fallback
        }),
        Err(VarError::NotPresent) => fallback,
        Err(VarError::NotUnicode(_)) => {
            warn!("ignoring {name}: not valid unicode, using {fallback}");
            fallback
        }
    }
}
