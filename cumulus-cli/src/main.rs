//! Command-line driver for cumulus.
//!
//! Wires the configuration, S3 store, and DynamoDB index into the sync
//! engine and dispatches the `sync` and `restore` subcommands.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cumulus_cloud=info,cumulus_cli=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    if let Err(e) = match cli.command {
        Commands::Sync {
            root,
            initialise,
            encrypt,
            config,
        } => cli::sync(root, initialise, encrypt, config).await,
        Commands::Restore {
            dest,
            encrypt,
            config,
        } => cli::restore(dest, encrypt, config).await,
    } {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
