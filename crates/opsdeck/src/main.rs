//! Opsdeck - server administration console backend.
//!
//! This is the main entry point for the opsdeck CLI.

use anyhow::Context;
use clap::{Parser, Subcommand};
use opsdeck_server::{create_router, AppState};
use opsdeck_storage::JsonStorage;
use opsdeck_util::log::{self, LogConfig, LogLevel};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "opsdeck")]
#[command(author, version, about = "Server administration console backend", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Address to bind to
        #[arg(short, long, default_value = "127.0.0.1:4080")]
        address: SocketAddr,

        /// Root directory the file editor is jailed to
        #[arg(long, env = "OPSDECK_ROOT")]
        root: PathBuf,

        /// Directory backing snapshot persistence
        /// (defaults to the opsdeck data directory)
        #[arg(long)]
        storage_dir: Option<PathBuf>,
    },
    /// Print version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    log::init(LogConfig {
        level: if cli.verbose {
            LogLevel::Debug
        } else {
            LogLevel::Info
        },
        include_location: cli.verbose,
    });

    match cli.command {
        Commands::Serve {
            address,
            root,
            storage_dir,
        } => serve(address, root, storage_dir).await,
        Commands::Version => {
            println!("opsdeck {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

async fn serve(
    address: SocketAddr,
    root: PathBuf,
    storage_dir: Option<PathBuf>,
) -> anyhow::Result<()> {
    // Resolve the jail root up front; the resolver compares lexically.
    let root = root
        .canonicalize()
        .with_context(|| format!("root directory {} is not accessible", root.display()))?;
    anyhow::ensure!(root.is_dir(), "root {} is not a directory", root.display());

    let storage_dir = match storage_dir {
        Some(dir) => dir,
        None => opsdeck_util::path::data_dir()
            .context("could not determine the data directory; pass --storage-dir")?
            .join("snapshots"),
    };

    let storage = Arc::new(JsonStorage::new(&storage_dir));
    let state = AppState::new(root.clone(), storage);
    let app = create_router(state);

    info!(
        address = %address,
        root = %root.display(),
        storage = %storage_dir.display(),
        "Starting opsdeck server"
    );

    let listener = tokio::net::TcpListener::bind(address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
