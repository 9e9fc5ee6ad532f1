//! gridexport - multi-timeframe OHLC + indicator export
//!
//! # Usage
//! ```sh
//! gridexport export --symbol TSLA --from "2025-10-30 20:00:00 -0400" --config plan.toml --output out.json
//! gridexport status --at "2025-10-30 09:30:00 -0400"
//! gridexport grid --end "2025-10-30 10:07:23 -0400" --timeframe 5m --count 10
//! ```
//!
//! Logs go to stderr; JSON goes to `--output` or stdout.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use gridexport::application::export::{ExportRequest, ExportService, MarketSnapshot, TimeGrid};
use gridexport::config::{Config, ExportPlan};
use gridexport::domain::market::clock::{Instant, ReferenceZone};
use gridexport::domain::market::timeframe::Timeframe;
use gridexport::domain::ports::CandleSource;
use gridexport::infrastructure::{MockCandleSource, PolygonMarketDataService};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{Level, info};
use tracing_subscriber::prelude::*;

#[derive(Parser)]
#[command(author, version, about = "Multi-timeframe OHLC + indicator exporter", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export every timeframe of a plan for one symbol
    Export {
        /// Ticker symbol
        #[arg(short, long)]
        symbol: String,

        /// Reference instant, e.g. "2025-10-30 20:00:00 -0400"
        #[arg(long = "from")]
        from: String,

        /// Export plan (.toml or .json)
        #[arg(short, long)]
        config: PathBuf,

        /// Output JSON path (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Polygon API key (or set POLYGON_API_KEY)
        #[arg(long)]
        api_key: Option<String>,

        /// Read candles from a JSON fixture file instead of Polygon
        #[arg(long)]
        offline: Option<PathBuf>,
    },
    /// Print the market session at an instant
    Status {
        /// Instant to classify (now when omitted)
        #[arg(long)]
        at: Option<String>,
    },
    /// Print the snapped anchor and time grid for a timeframe
    Grid {
        /// Grid end, snapped down to the timeframe boundary
        #[arg(long)]
        end: String,

        /// Timeframe code such as 1m, 5m, 1h, 1d
        #[arg(short, long)]
        timeframe: String,

        /// Number of grid points
        #[arg(long, default_value = "50")]
        count: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // stderr so stdout stays clean JSON
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(stderr_layer)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    match cli.command {
        Commands::Export {
            symbol,
            from,
            config: plan_path,
            output,
            api_key,
            offline,
        } => {
            let zone = config.zone;
            let as_of = zone
                .parse_instant(&from)
                .with_context(|| format!("Invalid --from value '{}'", from))?;
            let plan = ExportPlan::load(&plan_path, &config.export_defaults())?;
            info!(
                "gridexport {}: {} timeframe(s) from {}",
                env!("CARGO_PKG_VERSION"),
                plan.frames.len(),
                plan_path.display()
            );

            let source: Arc<dyn CandleSource> = match offline {
                Some(fixtures) => Arc::new(MockCandleSource::from_json_file(&fixtures, &zone)?),
                None => Arc::new(PolygonMarketDataService::new(
                    config.resolve_api_key(api_key.as_deref())?,
                    config.polygon_base_url.clone(),
                    config.source_label.clone(),
                    zone,
                )),
            };

            let service = ExportService::new(source, zone);
            let document = service
                .export(&ExportRequest {
                    symbol,
                    as_of,
                    plan,
                })
                .await;

            write_json(&document, output.as_ref())?;
        }
        Commands::Status { at } => {
            let zone = config.zone;
            let instant = resolve_instant(&zone, at.as_deref())?;
            write_json(&MarketSnapshot::at(&instant, &zone), None)?;
        }
        Commands::Grid {
            end,
            timeframe,
            count,
        } => {
            let zone = config.zone;
            let end = zone.parse_instant(&end)?;
            let timeframe: Timeframe = timeframe.parse()?;
            write_json(&TimeGrid::build(&end, &timeframe, count, &zone)?, None)?;
        }
    }

    Ok(())
}

fn resolve_instant(zone: &ReferenceZone, at: Option<&str>) -> Result<Instant> {
    match at {
        Some(text) => Ok(zone.parse_instant(text)?),
        None => Ok(zone.to_local(&Utc::now())),
    }
}

fn write_json<T: Serialize>(value: &T, output: Option<&PathBuf>) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    match output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Wrote {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}
