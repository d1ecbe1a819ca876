//! rowcat
//!
//! Reads newline-delimited JSON records, parses them into rows and prints them
//! as tagged row JSON or as a summary.

use eventrow::config::ParseSpec;
use eventrow::parser::RowParser;
use eventrow::row::{AnyRow, InputRow, MapBasedRow, Row};
use eventrow::schema::ColumnName;

use chrono::DateTime;
use clap::{Parser, ValueEnum};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// One tagged row per line
    Json,
    /// Row count, time range and column names
    Summary,
}

/// Parse newline-delimited JSON into rows
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input file (default: stdin)
    #[arg(long, short)]
    input: Option<PathBuf>,

    /// Parse spec JSON file (default: EVENTROW_* environment variables)
    #[arg(long, env = "EVENTROW_SPEC")]
    spec: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(true)
        .with_writer(io::stderr);
    if args.json_logs {
        builder.json().init();
    } else {
        builder.init();
    }

    let spec = match &args.spec {
        Some(path) => ParseSpec::from_file(path)?,
        None => ParseSpec::from_env()?,
    };
    let parser = RowParser::new(spec)?;

    let reader: Box<dyn BufRead> = match &args.input {
        Some(path) => Box::new(BufReader::new(File::open(path)?)),
        None => Box::new(BufReader::new(io::stdin().lock())),
    };

    let outcome = parser.parse_lines(reader)?;
    info!(
        rows = outcome.rows.len(),
        skipped = outcome.skipped,
        "Parsed input"
    );

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match args.format {
        OutputFormat::Json => {
            for row in outcome.rows {
                writeln!(out, "{}", AnyRow::from(row).to_json()?)?;
            }
        }
        OutputFormat::Summary => {
            let summary = Summary::collect(&outcome.rows, outcome.skipped);
            summary.write_to(&mut out)?;
        }
    }
    Ok(())
}

#[derive(Debug, Default, PartialEq)]
struct Summary {
    rows: usize,
    skipped: usize,
    min_timestamp: Option<i64>,
    max_timestamp: Option<i64>,
    dimensions: BTreeSet<ColumnName>,
    metrics: BTreeSet<ColumnName>,
}

impl Summary {
    fn collect(rows: &[MapBasedRow], skipped: usize) -> Self {
        let mut summary = Summary {
            rows: rows.len(),
            skipped,
            ..Default::default()
        };
        for row in rows {
            let ts = row.timestamp_from_epoch();
            summary.min_timestamp = Some(summary.min_timestamp.map_or(ts, |m| m.min(ts)));
            summary.max_timestamp = Some(summary.max_timestamp.map_or(ts, |m| m.max(ts)));
            summary.dimensions.extend(row.dimension_names());
            summary.metrics.extend(row.metric_names());
        }
        summary
    }

    fn write_to(&self, out: &mut impl Write) -> io::Result<()> {
        writeln!(out, "rows: {}", self.rows)?;
        writeln!(out, "skipped: {}", self.skipped)?;
        if let (Some(min), Some(max)) = (self.min_timestamp, self.max_timestamp) {
            writeln!(out, "from: {}", format_millis(min))?;
            writeln!(out, "to: {}", format_millis(max))?;
        }
        writeln!(out, "dimensions: {}", join(&self.dimensions))?;
        writeln!(out, "metrics: {}", join(&self.metrics))?;
        Ok(())
    }
}

fn format_millis(ms: i64) -> String {
    DateTime::from_timestamp_millis(ms)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| ms.to_string())
}

fn join(names: &BTreeSet<ColumnName>) -> String {
    names
        .iter()
        .map(ColumnName::as_str)
        .collect::<Vec<_>>()
        .join(",")
}
