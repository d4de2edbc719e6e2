//! vmchart - Command line entry point
//!
//! Reads a history response of the monitoring backend (from a file or
//! stdin) and prints the chart image URL, the encoded series, or the
//! timeline table.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::io::Read;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use vmchart_rs::{
    api::{ApiResponse, HistoryPayload, RunningSample},
    build_chart_url,
    plot::encode_selection,
    ChartConfig, Encoding, MissingFieldPolicy, PlotSelection, RenderArea, TimelineTable,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Output {
    /// Chart image URL
    Url,
    /// Encoded series as JSON
    Series,
    /// Timeline table as JSON (column-table responses only)
    Timeline,
    /// Running-instance timeline table as JSON
    Running,
}

#[derive(Debug, Parser)]
#[command(name = "vmchart", version, about = "Encode VM instance history into chart payloads")]
struct Args {
    /// History response JSON; reads stdin when omitted
    input: Option<PathBuf>,

    /// Fields to plot, e.g. "Load|Transfer Bytes"
    #[arg(short, long, default_value = "Load|Jobs")]
    plot: String,

    /// Instance identifier shown in the chart title
    #[arg(short, long)]
    instance: Option<String>,

    /// Render area width in pixels
    #[arg(long, default_value_t = 600)]
    width: u32,

    /// Render area height in pixels
    #[arg(long, default_value_t = 400)]
    height: u32,

    /// Symbol encoding (overrides the config file)
    #[arg(short, long)]
    encoding: Option<Encoding>,

    /// Treat missing field values as zero instead of failing
    #[arg(long)]
    missing_as_zero: bool,

    /// Config file (defaults to the user config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// What to print
    #[arg(short, long, value_enum, default_value_t = Output::Url)]
    output: Output,
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,vmchart_rs=debug")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => ChartConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => ChartConfig::load_or_default(),
    };
    if let Some(encoding) = args.encoding {
        config.encoding = encoding;
    }
    if args.missing_as_zero {
        config.missing_field = MissingFieldPolicy::Zero;
    }

    let json = match &args.input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            buf
        }
    };

    match args.output {
        Output::Running => {
            let response: ApiResponse<Vec<RunningSample>> = serde_json::from_str(&json)
                .context("Failed to parse running history response")?;
            let samples = response.into_result()?;
            tracing::info!("Read {} running-instance buckets", samples.len());
            let timeline = TimelineTable::from_running(&samples)?;
            println!("{}", serde_json::to_string_pretty(&timeline)?);
        }
        Output::Timeline => {
            let HistoryPayload::Table(table) = read_history(&json)? else {
                anyhow::bail!("timeline output needs a fields/data history table");
            };
            let timeline = TimelineTable::from_history(&table)?;
            println!("{}", serde_json::to_string_pretty(&timeline)?);
        }
        Output::Series => {
            let records = read_history(&json)?.into_records()?;
            let selection: PlotSelection = args.plot.parse()?;
            let series = encode_selection(&records, &selection, &config.encode_options())?;
            println!("{}", serde_json::to_string_pretty(&series)?);
        }
        Output::Url => {
            let records = read_history(&json)?.into_records()?;
            let selection: PlotSelection = args.plot.parse()?;
            let url = build_chart_url(
                &records,
                &selection,
                args.instance.as_deref(),
                RenderArea::new(args.width, args.height),
                &config,
            )?;
            println!("{}", url);
        }
    }

    Ok(())
}

fn read_history(json: &str) -> Result<HistoryPayload> {
    let response: ApiResponse<HistoryPayload> =
        serde_json::from_str(json).context("Failed to parse history response")?;
    let payload = response.into_result()?;
    tracing::info!("Read {} history rows", payload.len());
    Ok(payload)
}
