use std::io;
use std::path::PathBuf;
use std::process::exit;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use shuttle_core::Ping;
use shuttle_service::export::{export_report_csv, write_report_json};
use shuttle_service::logging::init_logging;
use shuttle_service::{
    compute_report, resolve_config, run_refresh_loop, EngineConfig, RefreshPolicy,
    RefreshTrigger, ServiceError, TuningArgs,
};
use shuttle_store::{default_store_path, JsonFileStore, SnapshotSource};

// ── CLI definition ─────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "shuttle",
    about = "Shuttle position and trip health from rider location pings",
    long_about = "Records trips and rider pings in a JSON store and derives, per trip,\n\
                  the dominant rider cluster (the shuttle's likely position) and a\n\
                  liveness tier from the most recent ping."
)]
struct Cli {
    /// Store file [default: ./shuttle_store.json]
    #[arg(long, env = "SHUTTLE_STORE", global = true)]
    store: Option<PathBuf>,

    /// JSON file with engine tunables
    #[arg(long, env = "SHUTTLE_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(flatten)]
    tuning: TuningArgs,

    /// Debug-level logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a trip; a code is generated when none is given
    RegisterTrip {
        #[arg(long)]
        code: Option<String>,
    },
    /// Record a rider's location ping
    Ping {
        #[arg(long)]
        trip: String,
        #[arg(long)]
        rider: String,
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lng: f64,
        /// Reported horizontal accuracy in meters
        #[arg(long)]
        accuracy: Option<f64>,
        /// Ping time (RFC 3339) [default: now]
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },
    /// Print the dominant cluster of every trip as JSON
    Clusters,
    /// Print the health of every registered trip as JSON
    Health,
    /// Print clusters and health from one snapshot as JSON
    Report {
        /// Also write a per-trip CSV to this path
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Recompute periodically and print each report as one JSON line
    Watch {
        #[arg(long, default_value_t = 10)]
        interval_secs: u64,
        /// Only print when the store contents changed
        #[arg(long)]
        on_change: bool,
        /// Stop after this many ticks
        #[arg(long)]
        max_ticks: Option<u64>,
    },
}

// ── Entry point ────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(error) = run(cli).await {
        tracing::error!(%error, "command failed");
        exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), ServiceError> {
    let config = resolve_config(cli.config.as_deref(), &cli.tuning)?;
    let store_path = match cli.store {
        Some(path) => path,
        None => default_store_path()?,
    };
    let store = JsonFileStore::new(store_path);

    match cli.command {
        Commands::RegisterTrip { code } => {
            let trip = store.register_trip(code.as_deref(), Utc::now())?;
            println!("{}", trip.code);
        }
        Commands::Ping {
            trip,
            rider,
            lat,
            lng,
            accuracy,
            at,
        } => {
            let mut ping = Ping::new(trip, rider, at.unwrap_or_else(Utc::now), lat, lng);
            ping.accuracy_m = accuracy;
            let outcome = store.record_ping(ping)?;
            tracing::info!(?outcome, path = %store.path().display(), "ping recorded");
        }
        Commands::Clusters => {
            let report = compute_report(&store, &config, Utc::now())?;
            print_json(&report.clusters)?;
        }
        Commands::Health => {
            let report = compute_report(&store, &config, Utc::now())?;
            print_json(&report.health)?;
        }
        Commands::Report { csv } => {
            let report = compute_report(&store, &config, Utc::now())?;
            write_report_json(io::stdout().lock(), &report)?;
            if let Some(path) = csv {
                export_report_csv(&path, &report)?;
            }
        }
        Commands::Watch {
            interval_secs,
            on_change,
            max_ticks,
        } => watch(store, config, interval_secs, on_change, max_ticks).await?,
    }
    Ok(())
}

async fn watch(
    store: JsonFileStore,
    config: EngineConfig,
    interval_secs: u64,
    on_change: bool,
    max_ticks: Option<u64>,
) -> Result<(), ServiceError> {
    if interval_secs == 0 {
        return Err(ServiceError::Runtime(
            "--interval-secs must be at least 1".to_string(),
        ));
    }
    let trigger = if on_change {
        RefreshTrigger::OnStoreChange
    } else {
        RefreshTrigger::Always
    };
    let policy = RefreshPolicy {
        interval: Duration::from_secs(interval_secs),
        trigger,
        max_ticks,
    };
    tracing::info!(path = %store.path().display(), interval_secs, ?trigger, "watching store");

    let source: Arc<dyn SnapshotSource> = Arc::new(store);
    let summary = run_refresh_loop(
        source,
        config,
        policy,
        Utc::now,
        |report| match serde_json::to_string(&report) {
            Ok(line) => println!("{line}"),
            Err(error) => tracing::warn!(%error, "failed to encode report"),
        },
        async {
            if let Err(error) = tokio::signal::ctrl_c().await {
                tracing::warn!(%error, "ctrl-c handler unavailable");
                std::future::pending::<()>().await;
            }
        },
    )
    .await;

    tracing::info!(
        ticks = summary.ticks,
        reports = summary.reports,
        unchanged = summary.unchanged,
        failures = summary.failures,
        "watch finished"
    );
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), ServiceError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn negative_coordinates_parse() {
        let cli = Cli::try_parse_from([
            "shuttle", "ping", "--trip", "T1", "--rider", "R1", "--lat", "-33.9", "--lng",
            "-70.6", "--at", "2024-05-01T08:29:00Z",
        ])
        .expect("parse");
        match cli.command {
            Commands::Ping { lat, lng, at, .. } => {
                assert_eq!(lat, -33.9);
                assert_eq!(lng, -70.6);
                assert!(at.is_some());
            }
            _ => panic!("expected ping subcommand"),
        }
    }
}
