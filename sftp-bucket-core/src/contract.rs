//! # contract: collaborator interfaces for the batch pipeline
//!
//! The pipeline talks to three outside systems: the remote file-transfer
//! server, a secret store holding the login key, and the destination object
//! store. Each one is an async trait here so production clients and
//! `mockall` mocks are interchangeable.
//!
//! ## Mocking & Testing
//! - Traits are annotated with `automock` under `test` or the
//!   `test-export-mocks` feature, so downstream crates get
//!   `MockRemoteConnector`, `MockRemoteSession`, `MockSecretStore` and
//!   `MockObjectStore`.
//! - All errors are boxed trait objects; implementors convert SDK errors.

use async_trait::async_trait;

#[allow(unused_imports)]
use mockall::{automock, predicate::*};
use serde::Deserialize;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Key material for authenticating against the remote server.
#[derive(Clone, Deserialize)]
pub struct SecretRecord {
    /// PEM encoded private key.
    pub private_key: String,
    /// Passphrase for an encrypted key.
    #[serde(default)]
    pub passphrase: Option<String>,
}

impl std::fmt::Debug for SecretRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretRecord")
            .field("private_key", &"<redacted>")
            .field("passphrase", &self.passphrase.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Fetches named secrets.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait SecretStore: Send + Sync {
    async fn get_secret(&self, secret_id: &str) -> Result<SecretRecord, BoxError>;
}

/// Opens an authenticated session on the remote server.
///
/// The returned session is the only handle to the connection; the caller
/// owns it and is responsible for calling [`RemoteSession::close`].
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait RemoteConnector: Send + Sync {
    async fn connect(&self, secret: &SecretRecord) -> Result<Box<dyn RemoteSession>, BoxError>;
}

/// An open session on the remote server.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait RemoteSession: Send + Sync {
    /// Names of the files in the remote working directory.
    async fn list_files(&self) -> Result<Vec<String>, BoxError>;

    /// Full contents of one remote file.
    async fn fetch(&self, remote_name: &str) -> Result<Vec<u8>, BoxError>;

    /// Release the connection. Called exactly once per session.
    async fn close(&self) -> Result<(), BoxError>;
}

/// Destination object storage.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put_object(
        &self,
        bucket: &str,
        object_name: &str,
        body: Vec<u8>,
    ) -> Result<(), BoxError>;
}
