///
/// This module implements the CLI interface for sftp-bucket: command parsing,
/// wiring production clients into the core batch, and user-visible output.
///
/// All grouping and pipeline logic lives in the [`sftp-bucket-core`] crate.
/// This module is strictly glue.
///
/// ## Commands
/// - `run`: process every file group on the server and print the batch
///   report as JSON. Exits non-zero if any group failed.
/// - `list`: print the remote listing with the group each file falls into.
///
/// [`sftp-bucket-core`]: ../../sftp-bucket-core/
use crate::load_config::load_config;
use crate::secrets::SecretsManagerStore;
use crate::sftp::SftpConnector;
use crate::storage::S3ObjectStore;
use anyhow::{Context, Result};
use aws_config::BehaviorVersion;
use clap::{Parser, Subcommand};
use sftp_bucket_core::synchronise::{list_remote, synchronise};
use std::path::PathBuf;

/// CLI for sftp-bucket: relay SFTP drops into an S3 bucket.
#[derive(Parser)]
#[clap(
    name = "sftp-bucket",
    version,
    about = "Fetch files from an SFTP drop, reassemble multi-part uploads, gzip and publish them to S3"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Process every file group currently on the server
    Run {
        /// Optional YAML file with non-secret settings
        #[clap(long)]
        config: Option<PathBuf>,
    },
    /// List remote files and the group each one belongs to
    List {
        /// Optional YAML file with non-secret settings
        #[clap(long)]
        config: Option<PathBuf>,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Run { config } => {
            let config = load_config(config.as_deref())?;
            config.trace_loaded();
            tracing::info!(command = "run", "Starting batch");

            let aws = aws_config::defaults(BehaviorVersion::latest()).load().await;
            let secrets = SecretsManagerStore::new(&aws);
            let store = S3ObjectStore::new(&aws);
            let connector = SftpConnector::new(config.sftp.clone());

            let report = synchronise(&config, &secrets, &connector, &store)
                .await
                .map_err(|e| {
                    tracing::error!(command = "run", error = %e, "Batch aborted");
                    e
                })
                .context("Batch aborted")?;

            println!("{}", serde_json::to_string_pretty(&report)?);
            if report.is_degraded() {
                tracing::error!(command = "run", failed = report.errors.len(), "Batch finished with failed groups");
                anyhow::bail!("{}", report.message);
            }
            tracing::info!(command = "run", published = report.processed_files.len(), "Batch complete");
            Ok(())
        }
        Commands::List { config } => {
            let config = load_config(config.as_deref())?;
            let aws = aws_config::defaults(BehaviorVersion::latest()).load().await;
            let secrets = SecretsManagerStore::new(&aws);
            let connector = SftpConnector::new(config.sftp.clone());

            let entries = list_remote(&config, &secrets, &connector)
                .await
                .context("Listing aborted")?;
            for entry in entries {
                match entry.group {
                    Some(group) => println!("{}\t{}", entry.name, group),
                    None => println!("{}\tunrecognised", entry.name),
                }
            }
            Ok(())
        }
    }
}
