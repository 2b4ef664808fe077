use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(name = "drawsync")]
#[command(about = "Draw ledger synchronization and statistics", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sync the ledger against the configured mirrors, then rewrite statistics
    Sync {
        /// Layered config paths in merge order (base -> local ...)
        #[arg(long = "config", required = true)]
        config_paths: Vec<String>,

        /// Override storage.ledger_path
        #[arg(long)]
        ledger: Option<PathBuf>,

        /// Override storage.stats_path
        #[arg(long)]
        stats: Option<PathBuf>,
    },

    /// Recompute statistics from the local ledger only (no network)
    Stats {
        #[arg(long = "config", required = true)]
        config_paths: Vec<String>,

        #[arg(long)]
        ledger: Option<PathBuf>,

        #[arg(long)]
        stats: Option<PathBuf>,
    },

    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order
        #[arg(required = true)]
        paths: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::Sync {
            config_paths,
            ledger,
            stats,
        } => {
            let ctx = commands::RunContext::load(&config_paths, ledger, stats)?;
            commands::sync::run_sync(&ctx).await?;
        }

        Commands::Stats {
            config_paths,
            ledger,
            stats,
        } => {
            let ctx = commands::RunContext::load(&config_paths, ledger, stats)?;
            commands::stats::run_stats(&ctx)?;
        }

        Commands::ConfigHash { paths } => {
            let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
            let loaded = drawsync_config::load_layered_yaml(&path_refs)?;
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
        }
    }

    Ok(())
}

/// Logs go to stderr; stdout carries the `key=value` result lines.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}
