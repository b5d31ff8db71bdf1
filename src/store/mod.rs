//! Credential store: the durable record of the OAuth token, the cached IAM
//! token and the selected folder.
//!
//! Backends:
//! - [`FileCredentialStore`] - YAML document on disk (0600 on Unix)
//! - [`MemoryCredentialStore`] - in-process, for tests and read-only runs

mod file;
mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use file::FileCredentialStore;
pub use memory::MemoryCredentialStore;

/// Persisted document. Key names match the on-disk format written by earlier
/// releases, so existing `config.yaml` files keep loading.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredConfig {
    #[serde(rename = "folderid", default)]
    pub folder_id: String,
    #[serde(rename = "oauthtoken", default)]
    pub oauth_token: String,
    #[serde(rename = "iamtoken", default)]
    pub iam_token: String,
    #[serde(rename = "iamtokenexpire", default)]
    pub iam_token_expire: Option<DateTime<Utc>>,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("config file {path}: {message}")]
    Io { path: String, message: String },

    #[error("read config file: {0}")]
    Parse(String),

    #[error("write config file: {0}")]
    Serialize(String),
}

impl StoreError {
    pub(crate) fn io(path: &std::path::Path, err: impl std::fmt::Display) -> Self {
        StoreError::Io {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Load the stored document. A missing document yields defaults.
    async fn load(&self) -> Result<StoredConfig, StoreError>;

    /// Replace the stored document.
    async fn save(&self, config: &StoredConfig) -> Result<(), StoreError>;

    /// Name of this backend, for log lines.
    fn name(&self) -> &str {
        "unknown"
    }
}

#[async_trait]
impl<T: CredentialStore + ?Sized> CredentialStore for std::sync::Arc<T> {
    async fn load(&self) -> Result<StoredConfig, StoreError> {
        (**self).load().await
    }
    async fn save(&self, config: &StoredConfig) -> Result<(), StoreError> {
        (**self).save(config).await
    }
    fn name(&self) -> &str {
        (**self).name()
    }
}
