//! SFTP implementation of the remote collaborator, on top of `ssh2`.
//!
//! One [`SftpSession`] owns one TCP connection and one SFTP channel for the
//! whole batch. `ssh2` is blocking, so every call runs on tokio's blocking
//! pool.

use std::io::Read;
use std::net::TcpStream;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use sftp_bucket_core::config::SftpSettings;
use sftp_bucket_core::contract::{BoxError, RemoteConnector, RemoteSession, SecretRecord};
use ssh2::{Session, Sftp};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum SftpError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("SSH error: {0}")]
    Ssh(#[from] ssh2::Error),
    #[error("authentication as {username} was not accepted")]
    NotAuthenticated { username: String },
    #[error("SFTP handle lock poisoned")]
    Poisoned,
    #[error("blocking SFTP task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Run a blocking `ssh2` call off the async workers.
async fn blocking<T, F>(call: F) -> Result<T, SftpError>
where
    F: FnOnce() -> Result<T, SftpError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(call).await?
}

/// Opens [`SftpSession`]s against one configured server.
pub struct SftpConnector {
    settings: SftpSettings,
}

impl SftpConnector {
    pub fn new(settings: SftpSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl RemoteConnector for SftpConnector {
    async fn connect(&self, secret: &SecretRecord) -> Result<Box<dyn RemoteSession>, BoxError> {
        let settings = self.settings.clone();
        let secret = secret.clone();
        let session = blocking(move || SftpSession::open(&settings, &secret)).await?;
        Ok(Box::new(session))
    }
}

/// Cheap to clone; clones share one connection.
#[derive(Clone)]
pub struct SftpSession {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    session: Session,
    sftp: Mutex<Sftp>,
    remote_dir: PathBuf,
}

impl SftpSession {
    /// Connect, handshake and authenticate with the in-memory private key.
    pub fn open(settings: &SftpSettings, secret: &SecretRecord) -> Result<Self, SftpError> {
        info!(host = %settings.host, port = settings.port, "Connecting to SFTP server");
        let tcp = TcpStream::connect((settings.host.as_str(), settings.port))?;

        let mut session = Session::new()?;
        session.set_tcp_stream(tcp);
        session.handshake()?;
        session.userauth_pubkey_memory(
            &settings.username,
            None,
            &secret.private_key,
            secret.passphrase.as_deref(),
        )?;
        if !session.authenticated() {
            return Err(SftpError::NotAuthenticated {
                username: settings.username.clone(),
            });
        }

        let sftp = session.sftp()?;
        info!(host = %settings.host, username = %settings.username, "SFTP session established");
        Ok(Self {
            inner: Arc::new(SessionInner {
                session,
                sftp: Mutex::new(sftp),
                remote_dir: PathBuf::from(&settings.remote_dir),
            }),
        })
    }

    fn read_dir(&self) -> Result<Vec<String>, SftpError> {
        let sftp = self.inner.sftp.lock().map_err(|_| SftpError::Poisoned)?;
        let entries = sftp.readdir(&self.inner.remote_dir)?;
        let names = entries
            .into_iter()
            .filter(|(_, stat)| stat.is_file())
            .filter_map(|(path, _)| {
                path.file_name()
                    .map(|name| name.to_string_lossy().into_owned())
            })
            .collect();
        Ok(names)
    }

    fn read_file(&self, remote_name: &str) -> Result<Vec<u8>, SftpError> {
        let sftp = self.inner.sftp.lock().map_err(|_| SftpError::Poisoned)?;
        let mut file = sftp.open(&self.inner.remote_dir.join(remote_name))?;
        let mut buf = Vec::new();
        file.read_to_end(&mut buf)?;
        debug!(file = %remote_name, size = buf.len(), "Read remote file");
        Ok(buf)
    }
}

#[async_trait]
impl RemoteSession for SftpSession {
    async fn list_files(&self) -> Result<Vec<String>, BoxError> {
        let this = self.clone();
        Ok(blocking(move || this.read_dir()).await?)
    }

    async fn fetch(&self, remote_name: &str) -> Result<Vec<u8>, BoxError> {
        let this = self.clone();
        let remote_name = remote_name.to_string();
        Ok(blocking(move || this.read_file(&remote_name)).await?)
    }

    async fn close(&self) -> Result<(), BoxError> {
        let this = self.clone();
        blocking(move || {
            this.inner
                .session
                .disconnect(None, "batch complete", None)
                .map_err(SftpError::from)
        })
        .await?;
        Ok(())
    }
}
