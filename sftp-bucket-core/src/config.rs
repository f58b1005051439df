// sftp-bucket-core/src/config.rs

use std::path::PathBuf;
use tracing::{debug, info};

/// Hard ceiling on a single compressed artifact: 250 MiB.
pub const DEFAULT_MAX_COMPRESSED_BYTES: u64 = 250 * 1024 * 1024;

pub const DEFAULT_SFTP_PORT: u16 = 22;

/// Everything one batch run needs.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub sftp: SftpSettings,
    /// Identifier of the secret that holds the SFTP private key.
    pub secret_id: String,
    pub pipeline: PipelineConfig,
}

impl RelayConfig {
    pub fn trace_loaded(&self) {
        info!(
            host = %self.sftp.host,
            port = self.sftp.port,
            username = %self.sftp.username,
            remote_dir = %self.sftp.remote_dir,
            bucket = %self.pipeline.bucket,
            work_dir = %self.pipeline.work_dir.display(),
            "Loaded RelayConfig"
        );
        debug!(?self, "RelayConfig loaded (full debug)");
    }
}

#[derive(Debug, Clone)]
pub struct SftpSettings {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub remote_dir: String,
}

/// Settings for the per-group pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Destination bucket for compressed artifacts.
    pub bucket: String,
    /// Parent of the per-group scratch directories.
    pub work_dir: PathBuf,
    pub max_compressed_bytes: u64,
}

impl PipelineConfig {
    pub fn new(bucket: impl Into<String>, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            bucket: bucket.into(),
            work_dir: work_dir.into(),
            max_compressed_bytes: DEFAULT_MAX_COMPRESSED_BYTES,
        }
    }
}
