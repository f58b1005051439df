/// `load_config` module: builds the runtime [`RelayConfig`] from the process
/// environment, optionally layered over a static YAML file.
///
/// # Responsibilities
/// - Validate that every required environment variable is present before any
///   network I/O happens, reporting all missing names at once
/// - Parse the optional YAML file of non-secret tuning values
/// - Apply defaults for everything optional
///
/// Precedence for optional settings: built-in default, then YAML file, then
/// environment variable.
///
/// # Errors
/// Environment problems are reported as [`ConfigError`]; file problems are
/// wrapped in `anyhow::Error` with the path for context.
use anyhow::{Context, Result};
use serde::Deserialize;
use sftp_bucket_core::config::{
    PipelineConfig, RelayConfig, SftpSettings, DEFAULT_MAX_COMPRESSED_BYTES, DEFAULT_SFTP_PORT,
};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{error, info};

pub const SFTP_HOST: &str = "SFTP_HOST";
pub const SFTP_USERNAME: &str = "SFTP_USERNAME";
pub const SECRET_ARN: &str = "SECRET_ARN";
pub const S3_BUCKET: &str = "S3_BUCKET";
pub const SFTP_PORT: &str = "SFTP_PORT";
pub const SFTP_REMOTE_DIR: &str = "SFTP_REMOTE_DIR";
pub const WORK_DIR: &str = "WORK_DIR";

pub const REQUIRED_ENV_VARS: [&str; 4] = [SFTP_HOST, SFTP_USERNAME, SECRET_ARN, S3_BUCKET];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variables: {}", .0.join(", "))]
    MissingVars(Vec<String>),
    #[error("SFTP_PORT must be a valid port number, got {value:?}")]
    InvalidPort {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },
}

/// Optional, non-secret settings read from a YAML file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileSettings {
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub remote_dir: Option<String>,
    #[serde(default)]
    pub work_dir: Option<PathBuf>,
    #[serde(default)]
    pub max_compressed_bytes: Option<u64>,
}

/// Loads the optional YAML file and merges it with the process environment.
pub fn load_config(path: Option<&Path>) -> Result<RelayConfig> {
    let file_settings = match path {
        Some(path) => read_file_settings(path)?,
        None => FileSettings::default(),
    };
    let config = config_from_lookup(|key| std::env::var(key).ok(), file_settings)?;
    info!(
        bucket = %config.pipeline.bucket,
        host = %config.sftp.host,
        "Config loaded and merged successfully"
    );
    Ok(config)
}

fn read_file_settings(path: &Path) -> Result<FileSettings> {
    info!(config_path = ?path, "Loading configuration from file");
    let content = fs::read_to_string(path).map_err(|e| {
        error!(error = ?e, config_path = ?path, "Failed to read config file");
        e
    })
    .with_context(|| format!("Failed to read config file {}", path.display()))?;

    let settings: FileSettings = serde_yaml::from_str(&content).map_err(|e| {
        error!(error = ?e, config_path = ?path, "Failed to parse config YAML");
        e
    })
    .with_context(|| format!("Failed to parse config YAML {}", path.display()))?;
    info!(config_path = ?path, "Parsed config YAML successfully");
    Ok(settings)
}

/// Build a [`RelayConfig`] from a variable lookup and file settings.
///
/// Empty values count as missing.
pub fn config_from_lookup<F>(lookup: F, file: FileSettings) -> Result<RelayConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    let missing: Vec<String> = REQUIRED_ENV_VARS
        .into_iter()
        .filter(|&key| get(key).is_none())
        .map(str::to_string)
        .collect();
    if !missing.is_empty() {
        error!(missing = ?missing, "Required environment variables not set");
        return Err(ConfigError::MissingVars(missing));
    }
    let required = |key: &str| get(key).unwrap_or_default();

    let port = match get(SFTP_PORT) {
        Some(value) => value
            .trim()
            .parse::<u16>()
            .map_err(|source| ConfigError::InvalidPort { value, source })?,
        None => file.port.unwrap_or(DEFAULT_SFTP_PORT),
    };
    let remote_dir = get(SFTP_REMOTE_DIR)
        .or(file.remote_dir)
        .unwrap_or_else(|| ".".to_string());
    let work_dir = get(WORK_DIR)
        .map(PathBuf::from)
        .or(file.work_dir)
        .unwrap_or_else(std::env::temp_dir);

    let mut pipeline = PipelineConfig::new(required(S3_BUCKET), work_dir);
    pipeline.max_compressed_bytes = file
        .max_compressed_bytes
        .unwrap_or(DEFAULT_MAX_COMPRESSED_BYTES);

    Ok(RelayConfig {
        sftp: SftpSettings {
            host: required(SFTP_HOST),
            port,
            username: required(SFTP_USERNAME),
            remote_dir,
        },
        secret_id: required(SECRET_ARN),
        pipeline,
    })
}
