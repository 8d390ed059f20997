//! Device identity providers
//!
//! A device identifier is resolved once per session and then passed
//! explicitly into every submission. It is used only for rate limiting.

use crate::error::IdentityError;
use crate::types::DeviceId;
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// File holding the random per-installation id
pub const INSTALLATION_ID_FILE: &str = "installation-id";

/// Source of a stable per-device identifier
#[async_trait]
pub trait DeviceIdentity: Send + Sync {
    /// Resolve the identifier
    async fn load(&self) -> Result<DeviceId, IdentityError>;
}

/// Fixed identifier supplied by the caller
#[derive(Debug, Clone)]
pub struct StaticIdentity {
    id: DeviceId,
}

impl StaticIdentity {
    /// Create new static identity
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: DeviceId::new(id),
        }
    }
}

#[async_trait]
impl DeviceIdentity for StaticIdentity {
    async fn load(&self) -> Result<DeviceId, IdentityError> {
        if self.id.as_str().trim().is_empty() {
            return Err(IdentityError::Invalid("identifier is blank".to_string()));
        }
        Ok(self.id.clone())
    }
}

/// Identifier derived from local installation state
///
/// Hashes a random installation id (created on first use under `state_dir`)
/// together with the host name. The same installation on the same host
/// always yields the same identifier.
#[derive(Debug, Clone)]
pub struct LocalDeviceIdentity {
    state_dir: PathBuf,
    host: Option<String>,
}

impl LocalDeviceIdentity {
    /// Create identity rooted at `state_dir`, host name taken from the environment
    #[must_use]
    pub fn new(state_dir: impl Into<PathBuf>) -> Self {
        let host = ["HOSTNAME", "COMPUTERNAME"]
            .iter()
            .find_map(|var| std::env::var(var).ok())
            .filter(|h| !h.is_empty());
        Self {
            state_dir: state_dir.into(),
            host,
        }
    }

    /// With explicit host name
    #[inline]
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Path of the installation id file
    #[inline]
    #[must_use]
    pub fn installation_id_path(&self) -> PathBuf {
        self.state_dir.join(INSTALLATION_ID_FILE)
    }

    async fn installation_id(&self) -> Result<String, IdentityError> {
        let path = self.installation_id_path();
        match tokio::fs::read_to_string(&path).await {
            Ok(existing) if !existing.trim().is_empty() => return Ok(existing.trim().to_string()),
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(io_error(&path, e)),
        }

        tokio::fs::create_dir_all(&self.state_dir)
            .await
            .map_err(|e| io_error(&self.state_dir, e))?;
        let fresh = uuid::Uuid::new_v4().to_string();
        tokio::fs::write(&path, &fresh)
            .await
            .map_err(|e| io_error(&path, e))?;
        tracing::info!(path = %path.display(), "created installation id");
        Ok(fresh)
    }
}

#[async_trait]
impl DeviceIdentity for LocalDeviceIdentity {
    async fn load(&self) -> Result<DeviceId, IdentityError> {
        let installation = self.installation_id().await?;
        let mut hasher = Sha256::new();
        hasher.update(installation.as_bytes());
        hasher.update(b":");
        hasher.update(self.host.as_deref().unwrap_or_default().as_bytes());
        Ok(DeviceId::new(hex::encode(hasher.finalize())))
    }
}

fn io_error(path: &Path, source: std::io::Error) -> IdentityError {
    IdentityError::Io {
        path: path.to_path_buf(),
        source,
    }
}
