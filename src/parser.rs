//! Ping log record parsing
//!
//! Each line holds `timestamp,address,latency` where the latency field is
//! either a non-negative number or the timeout marker (`-` by default).
//! Records are read lazily; the first malformed line aborts the stream.

use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;

use tracing::{debug, trace};

use crate::{
    AnalysisError, AnalysisResult, Observation, Outcome, monitors::SubnetAddress,
    util::DEFAULT_TIMEOUT_MARKER,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    pub timeout_marker: String,
    /// Reject addresses without a valid `ipv4/mask` suffix
    pub require_mask: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            timeout_marker: DEFAULT_TIMEOUT_MARKER.to_string(),
            require_mask: false,
        }
    }
}

impl ParseOptions {
    pub fn require_mask(mut self, require_mask: bool) -> Self {
        self.require_mask = require_mask;
        self
    }

    pub fn timeout_marker(mut self, marker: impl Into<String>) -> Self {
        self.timeout_marker = marker.into();
        self
    }
}

/// Parses a single record. `line_no` is 1-based and only used for errors.
pub fn parse_line(
    line_no: usize,
    line: &str,
    options: &ParseOptions,
) -> AnalysisResult<Observation> {
    let fields = line.trim().split(',').map(str::trim).collect::<Vec<_>>();
    let &[timestamp, address, latency] = fields.as_slice() else {
        return Err(AnalysisError::malformed(
            line_no,
            format!("expected 3 comma-separated fields, found {}", fields.len()),
        ));
    };

    let timestamp = timestamp.parse::<i64>().map_err(|_| {
        AnalysisError::malformed(line_no, format!("invalid timestamp '{timestamp}'"))
    })?;

    if address.is_empty() {
        return Err(AnalysisError::malformed(line_no, "empty address"));
    }

    if options.require_mask {
        SubnetAddress::parse(address)
            .map_err(|err| AnalysisError::malformed(line_no, err.to_string()))?;
    }

    let outcome = if latency == options.timeout_marker {
        Outcome::Timeout
    } else {
        match latency.parse::<f64>() {
            Ok(value) if value.is_finite() && value >= 0.0 => Outcome::Responded(value),
            _ => {
                return Err(AnalysisError::malformed(
                    line_no,
                    format!(
                        "invalid response time '{latency}' (expected a non-negative number or '{}')",
                        options.timeout_marker
                    ),
                ));
            }
        }
    };

    Ok(Observation::new(timestamp, address, outcome))
}

/// Lazily parsed observations of a line-oriented source
#[derive(Debug)]
pub struct Observations<R> {
    lines: Lines<R>,
    line_no: usize,
    options: ParseOptions,
    failed: bool,
}

impl<R: BufRead> Iterator for Observations<R> {
    type Item = AnalysisResult<Observation>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(err) => {
                    self.failed = true;
                    return Some(Err(err.into()));
                }
            };
            self.line_no += 1;

            if line.trim().is_empty() {
                trace!("skipping blank line {}", self.line_no);
                continue;
            }

            let result = parse_line(self.line_no, &line, &self.options);
            if let Err(err) = &result {
                debug!("{err}");
                self.failed = true;
            }
            return Some(result);
        }
    }
}

pub fn read_observations<R: BufRead>(reader: R, options: ParseOptions) -> Observations<R> {
    Observations {
        lines: reader.lines(),
        line_no: 0,
        options,
        failed: false,
    }
}

pub fn read_log_file(
    path: impl AsRef<Path>,
    options: ParseOptions,
) -> AnalysisResult<Observations<BufReader<File>>> {
    let file = File::open(path.as_ref())?;
    debug!("reading ping log {}", path.as_ref().display());
    Ok(read_observations(BufReader::new(file), options))
}
