//! Rendering of analysis reports

use std::fmt;

use serde_json::json;

use crate::{
    Interval,
    query::{Query, Report},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human readable summary
    #[default]
    Text,
    /// Machine readable JSON document
    Json,
}

pub fn render(query: &Query, report: &Report, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Text => Ok(TextReport { query, report }.to_string()),
        OutputFormat::Json => {
            let document = json!({
                "query": query,
                "report": report,
            });
            Ok(serde_json::to_string_pretty(&document)?)
        }
    }
}

/// Plain text view of a report
pub struct TextReport<'a> {
    pub query: &'a Query,
    pub report: &'a Report,
}

impl fmt::Display for TextReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Report {
            failures,
            overloads,
            failed_subnets,
        } = self.report;

        writeln!(f, "{}:", self.query.title())?;

        if failures.is_empty() {
            writeln!(f, "No server failed.")?;
        }
        for (address, intervals) in failures {
            writeln!(f, "Server {address} failed {} times:", intervals.len())?;
            for (i, interval) in intervals.iter().enumerate() {
                write_failure(f, i + 1, interval)?;
            }
        }

        if let Some(overloads) = overloads {
            if overloads.is_empty() {
                writeln!(f, "No server overloaded.")?;
            }
            for (address, segments) in overloads {
                writeln!(f, "Server {address} overloaded {} times:", segments.len())?;
                for (i, segment) in segments.iter().enumerate() {
                    writeln!(
                        f,
                        "Overload {} at timestamp {} with duration {} seconds.",
                        i + 1,
                        segment.start,
                        segment.duration()
                    )?;
                }
            }
        }

        if let Some(subnets) = failed_subnets {
            if subnets.is_empty() {
                writeln!(f, "No subnet failed.")?;
            }
            for subnet in subnets {
                writeln!(f, "Subnet {subnet} has failed.")?;
            }
        }

        Ok(())
    }
}

fn write_failure(f: &mut fmt::Formatter<'_>, index: usize, interval: &Interval) -> fmt::Result {
    match interval.duration() {
        Some(duration) => writeln!(
            f,
            "Failure {index} at timestamp {} with duration {duration} seconds.",
            interval.start
        ),
        None => writeln!(
            f,
            "Failure {index} at timestamp {}, still ongoing at end of data.",
            interval.start
        ),
    }
}
