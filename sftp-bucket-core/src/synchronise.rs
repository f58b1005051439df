//! High-level batch: orchestrates secret → connect → list → group pipelines.
//!
//! This module provides the top-level orchestration for one invocation. It
//!   - fetches the SFTP key from the [`SecretStore`]
//!   - opens one remote session through the [`RemoteConnector`] and holds it
//!     for the whole batch
//!   - lists the remote directory, groups the names, and runs a
//!     [`GroupPipeline`] for each group in turn
//!   - closes the session on every exit path
//!
//! # Error Handling
//! Secret, connection and listing failures are fatal and return a
//! [`SyncError`]. A failing group is recorded in the [`BatchReport`] and the
//! batch moves on to the next group.
//!
//! # Navigation
//! - Main entrypoint: [`synchronise`]
//! - Group loop over an existing listing: [`run_batch`]
//! - Read-only listing: [`list_remote`]

use serde::Serialize;
use tracing::{error, info, warn};

use crate::config::{PipelineConfig, RelayConfig};
use crate::contract::{ObjectStore, RemoteConnector, RemoteSession, SecretStore};
use crate::error::{GroupError, SyncError};
use crate::grouping::{build_groups, GroupKey};
use crate::pipeline::GroupPipeline;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    Success,
    Degraded,
}

/// Outcome of one group.
#[derive(Debug)]
pub enum GroupOutcome {
    Published { key: GroupKey, objects: Vec<String> },
    Failed(GroupError),
}

/// Result of a whole batch.
#[derive(Debug, Serialize)]
pub struct BatchReport {
    pub status: BatchStatus,
    pub message: String,
    /// Every object written to the bucket, including uploads from groups
    /// that later failed.
    pub processed_files: Vec<String>,
    pub errors: Vec<String>,
    #[serde(skip)]
    pub outcomes: Vec<GroupOutcome>,
}

impl BatchReport {
    fn from_outcomes(outcomes: Vec<GroupOutcome>) -> Self {
        let mut processed_files = Vec::new();
        let mut errors = Vec::new();
        for outcome in &outcomes {
            match outcome {
                GroupOutcome::Published { objects, .. } => {
                    processed_files.extend(objects.iter().cloned())
                }
                GroupOutcome::Failed(e) => {
                    processed_files.extend(e.published.iter().cloned());
                    errors.push(e.to_string());
                }
            }
        }

        let (status, message) = if errors.is_empty() {
            (
                BatchStatus::Success,
                "Processing completed successfully".to_string(),
            )
        } else {
            (
                BatchStatus::Degraded,
                format!("Processing completed with {} failed group(s)", errors.len()),
            )
        };

        BatchReport {
            status,
            message,
            processed_files,
            errors,
            outcomes,
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.status == BatchStatus::Degraded
    }
}

/// A remote file and the group it falls into, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    pub name: String,
    pub group: Option<GroupKey>,
}

/// Group `listing` and run every group through the pipeline, one after the
/// other. A failing group never stops the loop.
pub async fn run_batch<S, O>(
    session: &S,
    store: &O,
    config: &PipelineConfig,
    listing: &[String],
) -> BatchReport
where
    S: RemoteSession + ?Sized,
    O: ObjectStore + ?Sized,
{
    let groups = build_groups(listing);
    info!(
        files = listing.len(),
        groups = groups.len(),
        "[SYNC] Grouped remote listing"
    );

    let pipeline = GroupPipeline::new(session, store, config);
    let mut outcomes = Vec::with_capacity(groups.len());
    for (key, members) in &groups {
        let outcome = match pipeline.process(key, members).await {
            Ok(objects) => GroupOutcome::Published {
                key: key.clone(),
                objects,
            },
            Err(e) => {
                error!(group = %key, error = %e, size_violation = e.is_size_violation(), "[SYNC][ERROR] Group processing failed");
                GroupOutcome::Failed(e)
            }
        };
        outcomes.push(outcome);
    }

    let report = BatchReport::from_outcomes(outcomes);
    info!(
        status = ?report.status,
        published = report.processed_files.len(),
        failed = report.errors.len(),
        "[SYNC] Batch finished"
    );
    report
}

/// Run one full batch against the remote server described by `config`.
pub async fn synchronise<K, C, O>(
    config: &RelayConfig,
    secrets: &K,
    connector: &C,
    store: &O,
) -> Result<BatchReport, SyncError>
where
    K: SecretStore + ?Sized,
    C: RemoteConnector + ?Sized,
    O: ObjectStore + ?Sized,
{
    info!("[SYNC] Starting batch");
    let session = open_session(config, secrets, connector).await?;

    let result = match session.list_files().await {
        Ok(listing) => {
            info!(files = listing.len(), "[SYNC] Listed remote directory");
            Ok(run_batch(&*session, store, &config.pipeline, &listing).await)
        }
        Err(e) => {
            error!(error = ?e, "[SYNC][ERROR] Failed to list remote directory");
            Err(SyncError::Listing(e))
        }
    };

    close_session(&*session).await;
    result
}

/// List the remote directory and classify each name without downloading.
pub async fn list_remote<K, C>(
    config: &RelayConfig,
    secrets: &K,
    connector: &C,
) -> Result<Vec<ListingEntry>, SyncError>
where
    K: SecretStore + ?Sized,
    C: RemoteConnector + ?Sized,
{
    let session = open_session(config, secrets, connector).await?;

    let result = session
        .list_files()
        .await
        .map(|names| {
            names
                .into_iter()
                .map(|name| {
                    let group = crate::classify::classify(&name).map(|d| d.group_key());
                    ListingEntry { name, group }
                })
                .collect()
        })
        .map_err(SyncError::Listing);

    close_session(&*session).await;
    result
}

async fn open_session<K, C>(
    config: &RelayConfig,
    secrets: &K,
    connector: &C,
) -> Result<Box<dyn RemoteSession>, SyncError>
where
    K: SecretStore + ?Sized,
    C: RemoteConnector + ?Sized,
{
    let secret = secrets
        .get_secret(&config.secret_id)
        .await
        .map_err(|source| {
            error!(secret_id = %config.secret_id, error = ?source, "[SYNC][ERROR] Failed to retrieve secret");
            SyncError::Secret {
                secret_id: config.secret_id.clone(),
                source,
            }
        })?;

    let session = connector.connect(&secret).await.map_err(|e| {
        error!(host = %config.sftp.host, error = ?e, "[SYNC][ERROR] Failed to connect");
        SyncError::Connection(e)
    })?;
    info!(host = %config.sftp.host, username = %config.sftp.username, "[SYNC] Connected to remote server");
    Ok(session)
}

async fn close_session(session: &dyn RemoteSession) {
    match session.close().await {
        Ok(()) => info!("[SYNC] Closed remote session"),
        Err(e) => warn!(error = ?e, "[SYNC] Failed to close remote session cleanly"),
    }
}
