//! Argument parsing and command implementations.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use cumulus_cloud::dynamo_index::DynamoIndex;
use cumulus_cloud::s3_store::S3Store;
use cumulus_cloud::{CreateOutcome, EnvelopeKey, ResolvedKey, SyncConfig, SyncEngine};

const DEFAULT_CONFIG: &str = "cumulus.toml";

#[derive(Parser)]
#[command(name = "cumulus")]
#[command(about = "Sync a local directory with an S3 bucket, transferring only changed content")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Upload new and changed files from a local directory
    Sync {
        /// Directory to upload
        #[arg(default_value = ".")]
        root: PathBuf,

        /// Create the S3 bucket before syncing
        #[arg(short, long)]
        initialise: bool,

        /// Encrypt uploads with the named key from the config
        #[arg(short, long, value_name = "ALIAS")]
        encrypt: Option<String>,

        /// Path to a TOML config file
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,
    },

    /// Download missing and changed files from the bucket
    Restore {
        /// Directory to restore into
        #[arg(default_value = ".")]
        dest: PathBuf,

        /// Decrypt downloads with the named key from the config
        #[arg(short, long, value_name = "ALIAS")]
        encrypt: Option<String>,

        /// Path to a TOML config file
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,
    },
}

pub async fn sync(
    root: PathBuf,
    initialise: bool,
    encrypt: Option<String>,
    config: Option<PathBuf>,
) -> Result<()> {
    let config = load_config(config)?;
    let (envelope_key, kms_key_id) = resolve_encryption(&config, encrypt.as_deref())?;

    let store = S3Store::connect(&config, kms_key_id).await;
    let index = DynamoIndex::connect(&config).await;
    let engine = SyncEngine::new(store, index, config.owner.clone(), envelope_key);

    if initialise {
        match engine.initialise().await? {
            CreateOutcome::Created => {}
            CreateOutcome::AlreadyExists => {
                println!("Bucket {} already exists", config.bucket);
                return Ok(());
            }
            CreateOutcome::AlreadyOwned => {
                println!("Bucket {} has already been created by you", config.bucket);
                return Ok(());
            }
        }
    }

    let report = engine.push(&root).await?;
    println!(
        "{} uploaded, {} unchanged, {} failed",
        report.uploaded, report.unchanged, report.failed
    );
    println!("done");
    Ok(())
}

pub async fn restore(
    dest: PathBuf,
    encrypt: Option<String>,
    config: Option<PathBuf>,
) -> Result<()> {
    let config = load_config(config)?;
    let (envelope_key, kms_key_id) = resolve_encryption(&config, encrypt.as_deref())?;

    let store = S3Store::connect(&config, kms_key_id).await;
    let index = DynamoIndex::connect(&config).await;
    let engine = SyncEngine::new(store, index, config.owner.clone(), envelope_key);

    let report = engine.pull(&dest).await?;
    println!(
        "{} restored, {} unchanged, {} failed",
        report.downloaded, report.unchanged, report.failed
    );
    println!("done");
    Ok(())
}

fn load_config(path: Option<PathBuf>) -> Result<SyncConfig> {
    match path {
        Some(path) => {
            SyncConfig::load(&path).with_context(|| format!("loading {}", path.display()))
        }
        None => {
            let default_path = PathBuf::from(DEFAULT_CONFIG);
            if default_path.is_file() {
                SyncConfig::load(&default_path).context("loading cumulus.toml")
            } else {
                Ok(SyncConfig::default())
            }
        }
    }
}

/// Splits a resolved key alias into the envelope key (client-side) and the
/// KMS key id (server-side) the store wiring needs.
fn resolve_encryption(
    config: &SyncConfig,
    alias: Option<&str>,
) -> Result<(Option<EnvelopeKey>, Option<String>)> {
    match alias {
        None => Ok((None, None)),
        Some(alias) => match config.resolve_key(alias)? {
            ResolvedKey::Envelope(key) => Ok((Some(key), None)),
            ResolvedKey::ServerSide(kms_key_id) => Ok((None, Some(kms_key_id))),
        },
    }
}
