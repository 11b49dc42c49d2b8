//! fedgridd: drive the federated scheduler from the command line.
//!
//! Loads a fleet file (providers, regions, nodes), builds one in-memory
//! adapter per provider, and runs a single command against them.
//!
//! # Usage
//!
//! ```text
//! fedgridd --fleet fleet.toml batch --workloads workloads.json
//! fedgridd --fleet fleet.toml nodes --provider edge
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use fedgrid_core::{FleetConfig, ProviderTag, Workload};
use fedgrid_scheduler::{NodeQuery, Scheduler};

#[derive(Parser)]
#[command(name = "fedgridd", about = "Federated multi-cloud scheduler", version)]
struct Cli {
    /// Fleet file describing providers, regions, and nodes.
    #[arg(long, global = true, default_value = "fleet.toml")]
    fleet: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Place each workload on its own, in file order.
    Schedule {
        /// JSON array of workloads.
        #[arg(long)]
        workloads: PathBuf,
    },
    /// Place workloads as a geo-sharded batch.
    Batch {
        /// JSON array of workloads.
        #[arg(long)]
        workloads: PathBuf,
    },
    /// List nodes across providers.
    Nodes {
        #[arg(long)]
        provider: Option<ProviderTag>,
        #[arg(long)]
        region: Option<String>,
    },
    /// List regions offered by every provider.
    Regions,
    /// Summed capacity and usage per provider.
    Utilization,
    /// Advisory health of every provider.
    Health,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries JSON output.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,fedgrid=debug,fedgridd=debug")),
        )
        .init();

    let cli = Cli::parse();

    let fleet = FleetConfig::from_file(&cli.fleet)?;
    let scheduler = Scheduler::from_fleet(&fleet).await;
    info!(
        fleet = ?cli.fleet,
        providers = ?scheduler.providers().await,
        "fleet loaded"
    );

    match cli.command {
        Command::Schedule { workloads } => {
            let workloads = read_workloads(&workloads)?;
            let mut results = Vec::new();
            for workload in &workloads {
                if let Some(result) = scheduler.schedule_placement(workload).await? {
                    results.push(result);
                }
            }
            print_json(&results)
        }
        Command::Batch { workloads } => {
            let workloads = read_workloads(&workloads)?;
            print_json(&scheduler.schedule_batch(&workloads).await?)
        }
        Command::Nodes { provider, region } => {
            let query = NodeQuery { provider, region };
            print_json(&scheduler.list_all_nodes(&query).await?)
        }
        Command::Regions => print_json(&scheduler.list_regions().await?),
        Command::Utilization => print_json(&scheduler.utilization_by_provider().await?),
        Command::Health => print_json(&scheduler.health_by_provider().await),
    }
}

fn read_workloads(path: &Path) -> anyhow::Result<Vec<Workload>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading workloads from {}", path.display()))?;
    let workloads: Vec<Workload> = serde_json::from_str(&content)
        .with_context(|| format!("parsing workloads in {}", path.display()))?;
    Ok(workloads)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
