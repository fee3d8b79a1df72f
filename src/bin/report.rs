use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{CommandFactory, Parser, Subcommand, error::ErrorKind};
use ping_monitoring::{
    config::{Config, read_config_file},
    parser::{ParseOptions, read_log_file},
    query::{Query, Report, analyze_records},
    report::{OutputFormat, render},
};
use tracing::{debug, level_filters::LevelFilter, trace};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Parser)]
#[command(version, about = "Derive failure and overload periods from a ping log")]
struct Args {
    /// Ping log (`timestamp,address,latency` per line)
    #[arg(short, long, global = true)]
    file: Option<PathBuf>,

    /// Config file (JSON, or TOML with a .toml extension)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Consecutive timeouts before a run counts as a failure
    #[arg(short = 'n', long, global = true)]
    debounce: Option<usize>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    format: OutputFormat,

    /// Increase log verbosity (-v: debug, -vv: trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    /// The ping log. Global arguments cannot be marked required, so a missing
    /// `--file` is reported here with the usual clap error.
    fn log_file(&self) -> Result<&Path, clap::Error> {
        self.file.as_deref().ok_or_else(|| {
            Args::command().error(
                ErrorKind::MissingRequiredArgument,
                "the following required arguments were not provided:\n  --file <FILE>",
            )
        })
    }
}

#[derive(Debug, Clone, Copy, clap::Args)]
struct OverloadArgs {
    /// Number of responses averaged per evaluation
    #[arg(short = 'm', long)]
    window: Option<usize>,

    /// Mean latency at or above which a window is overloaded
    #[arg(short = 't', long)]
    threshold: Option<f64>,

    /// Coalesce overlapping overload segments
    #[arg(long)]
    merge_overloads: bool,
}

#[derive(Debug, Clone, Copy, Subcommand)]
enum Command {
    /// Every timeout run is a failure
    Failures,
    /// Only runs of at least `debounce` timeouts are failures
    Debounced,
    /// Debounced failures and latency overloads
    Overloads(OverloadArgs),
    /// Debounced failures and subnets whose hosts all failed
    Subnets,
    /// Run all of the above in order
    All(OverloadArgs),
}

fn init(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    let filter = filter::Targets::new().with_targets(vec![
        ("ping_monitoring", level),
        ("ping_report", level),
    ]);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_ansi(false),
        )
        .with(filter)
        .init();
}

fn load_config(args: &Args) -> anyhow::Result<Config> {
    let config = match &args.config {
        Some(path) => read_config_file(path)?,
        None => Config::default(),
    };
    let mut config = config.with_env();

    if let Some(debounce) = args.debounce {
        config.debounce = debounce;
    }
    if let Command::Overloads(overload) | Command::All(overload) = args.command {
        if let Some(window) = overload.window {
            config.overload.window = window;
        }
        if let Some(threshold) = overload.threshold {
            config.overload.threshold = threshold;
        }
        config.overload.merge |= overload.merge_overloads;
    }

    config.validate()?;
    Ok(config)
}

fn queries(command: Command, config: &Config) -> Vec<Query> {
    match command {
        Command::Failures => vec![Query::Failures],
        Command::Debounced => vec![Query::debounced(config)],
        Command::Overloads(_) => vec![Query::overloads(config)],
        Command::Subnets => vec![Query::subnets(config)],
        Command::All(_) => vec![
            Query::Failures,
            Query::debounced(config),
            Query::overloads(config),
            Query::subnets(config),
        ],
    }
}

fn run_query(file: &Path, config: &Config, query: &Query) -> anyhow::Result<Report> {
    let options = ParseOptions::default()
        .timeout_marker(config.timeout_marker.clone())
        .require_mask(query.requires_mask());

    let records = read_log_file(file, options)
        .with_context(|| format!("Failed to open ping log: {}", file.display()))?;

    let mut report = analyze_records(query, records)
        .with_context(|| format!("Failed to analyse {}", file.display()))?;

    if config.overload.merge {
        report.merge_overloads();
    }
    Ok(report)
}

fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();
    let file = args.log_file().unwrap_or_else(|err| err.exit());
    init(args.verbose);
    trace!("started with args: {args:?}");

    let config = load_config(&args)?;
    debug!("using config: {config:?}");

    let mut outputs = vec![];
    for query in queries(args.command, &config) {
        let report = run_query(file, &config, &query)?;
        outputs.push(render(&query, &report, args.format)?);
    }

    match args.format {
        OutputFormat::Text => println!("{}", outputs.join("\n")),
        OutputFormat::Json if outputs.len() == 1 => println!("{}", outputs.join("")),
        OutputFormat::Json => println!("[{}]", outputs.join(",\n")),
    }

    Ok(())
}
