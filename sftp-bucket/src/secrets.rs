//! AWS Secrets Manager implementation of [`SecretStore`].
//!
//! The secret's string value is a JSON document with a `private_key` field
//! and an optional `passphrase`.

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_secretsmanager::Client;
use sftp_bucket_core::contract::{BoxError, SecretRecord, SecretStore};
use tracing::{error, info};

pub struct SecretsManagerStore {
    client: Client,
}

impl SecretsManagerStore {
    pub fn new(aws: &SdkConfig) -> Self {
        Self {
            client: Client::new(aws),
        }
    }
}

#[async_trait]
impl SecretStore for SecretsManagerStore {
    async fn get_secret(&self, secret_id: &str) -> Result<SecretRecord, BoxError> {
        info!(secret_id, "Fetching secret");
        let response = self
            .client
            .get_secret_value()
            .secret_id(secret_id)
            .send()
            .await
            .map_err(|e| {
                error!(secret_id, error = ?e, "GetSecretValue failed");
                format!("GetSecretValue failed for {secret_id}: {e}")
            })?;

        let raw = response
            .secret_string()
            .ok_or_else(|| format!("secret {secret_id} has no string value"))?;
        parse_secret(raw)
    }
}

/// Decode the JSON secret document.
pub fn parse_secret(raw: &str) -> Result<SecretRecord, BoxError> {
    let record: SecretRecord = serde_json::from_str(raw)?;
    Ok(record)
}
