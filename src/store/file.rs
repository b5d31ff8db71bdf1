use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use super::{CredentialStore, StoreError, StoredConfig};

/// YAML credential store.
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "config.yaml".to_string());
        self.path
            .with_file_name(format!(".{}.{}.tmp", name, uuid::Uuid::new_v4().simple()))
    }
}

async fn write_private(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    options.mode(0o600);

    let mut file = options.open(path).await?;
    file.write_all(content).await?;
    file.sync_all().await
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn load(&self) -> Result<StoredConfig, StoreError> {
        debug!(path = %self.path.display(), "read config file");
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "config file not found");
                return Ok(StoredConfig::default());
            }
            Err(e) => return Err(StoreError::io(&self.path, e)),
        };
        if content.trim().is_empty() {
            return Ok(StoredConfig::default());
        }
        serde_yaml::from_str(&content).map_err(|e| StoreError::Parse(e.to_string()))
    }

    async fn save(&self, config: &StoredConfig) -> Result<(), StoreError> {
        debug!(path = %self.path.display(), "write config file");
        let content =
            serde_yaml::to_string(config).map_err(|e| StoreError::Serialize(e.to_string()))?;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::io(parent, e))?;
        }

        // Holds the OAuth token: written to a 0600 sibling, then renamed over the target.
        let tmp = self.temp_path();
        if let Err(e) = write_private(&tmp, content.as_bytes()).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(StoreError::io(&tmp, e));
        }
        if let Err(e) = tokio::fs::rename(&tmp, &self.path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(StoreError::io(&self.path, e));
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[tokio::test]
    async fn test_missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("absent.yaml"));
        assert_eq!(store.load().await.unwrap(), StoredConfig::default());
    }

    #[tokio::test]
    async fn test_save_creates_parent_dirs_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("nested/translate-proxy/config.yaml"));
        let config = StoredConfig {
            folder_id: "b1gfolder".into(),
            oauth_token: "y0_oauth".into(),
            iam_token: "t1.iam".into(),
            iam_token_expire: Some(Utc.with_ymd_and_hms(2030, 1, 2, 3, 4, 5).unwrap()),
        };

        store.save(&config).await.unwrap();
        assert_eq!(store.load().await.unwrap(), config);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[tokio::test]
    async fn test_reads_legacy_key_names() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(
            &path,
            "folderid: b1g123\noauthtoken: y0_abc\niamtoken: t1.xyz\niamtokenexpire: 2031-05-06T07:08:09.123Z\n",
        )
        .unwrap();

        let loaded = FileCredentialStore::new(&path).load().await.unwrap();
        assert_eq!(loaded.folder_id, "b1g123");
        assert_eq!(loaded.oauth_token, "y0_abc");
        assert_eq!(loaded.iam_token, "t1.xyz");
        assert!(loaded.iam_token_expire.is_some());
    }

    #[tokio::test]
    async fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "folderid: [unterminated").unwrap();

        let err = FileCredentialStore::new(&path).load().await.unwrap_err();
        assert!(matches!(err, StoreError::Parse(_)));
    }

    #[tokio::test]
    async fn test_unreadable_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the file should be.
        let err = FileCredentialStore::new(dir.path()).load().await.unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
    }

    #[tokio::test]
    async fn test_save_replaces_existing_file_without_leftovers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "folderid: b1gold\n").unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();
        }

        let store = FileCredentialStore::new(&path);
        let config = StoredConfig {
            folder_id: "b1gnew".into(),
            oauth_token: "y0_secret".into(),
            ..Default::default()
        };
        store.save(&config).await.unwrap();

        assert_eq!(store.load().await.unwrap(), config);
        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, [std::ffi::OsString::from("config.yaml")]);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[tokio::test]
    async fn test_failed_save_keeps_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        // The target is a non-empty directory, so the final rename fails.
        let path = dir.path().join("config.yaml");
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("keep"), "x").unwrap();

        let err = FileCredentialStore::new(&path)
            .save(&StoredConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
        assert!(path.join("keep").exists());
        let leftovers = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 1);
    }
}
