use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{CredentialStore, StoreError, StoredConfig};

/// In-memory credential store.
#[derive(Default)]
pub struct MemoryCredentialStore {
    config: RwLock<StoredConfig>,
    saves: AtomicUsize,
}

impl MemoryCredentialStore {
    pub fn new(config: StoredConfig) -> Self {
        Self {
            config: RwLock::new(config),
            saves: AtomicUsize::new(0),
        }
    }

    /// Number of successful `save` calls so far.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub async fn snapshot(&self) -> StoredConfig {
        self.config.read().await.clone()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn load(&self) -> Result<StoredConfig, StoreError> {
        Ok(self.config.read().await.clone())
    }

    async fn save(&self, config: &StoredConfig) -> Result<(), StoreError> {
        *self.config.write().await = config.clone();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
