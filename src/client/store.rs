//! Device-side key-value storage.
//!
//! Values are JSON documents. Reads go through [`load`], which decodes into a
//! typed value and treats a malformed blob as missing.

use std::{
    collections::HashMap,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use tokio::sync::Mutex;

use super::error::ClientError;

/// Logged-in user, including cached history and token.
pub const USER_KEY: &str = "ent_user";
/// Locally accumulated test results.
pub const RESULTS_KEY: &str = "ent_test_results";
/// Persisted API mode flags.
pub const API_MODE_KEY: &str = "ent_api_mode";

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, ClientError>;
    async fn set(&self, key: &str, value: String) -> Result<(), ClientError>;
    async fn remove(&self, key: &str) -> Result<(), ClientError>;
}

/// Reads and decodes `key`. Missing keys and undecodable blobs both yield `None`.
pub async fn load<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, ClientError> {
    let Some(raw) = store.get(key).await? else {
        return Ok(None);
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            tracing::warn!(key, "Discarding malformed stored value: {}", e);
            Ok(None)
        }
    }
}

pub async fn save<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), ClientError> {
    let raw = serde_json::to_string(value).map_err(|e| ClientError::Storage(e.to_string()))?;
    store.set(key, raw).await
}

/// One JSON file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    fn path(&self, key: &str) -> Result<PathBuf, ClientError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(ClientError::Storage(format!("invalid key '{}'", key)));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, ClientError> {
        match tokio::fs::read_to_string(self.path(key)?).await {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ClientError::Storage(e.to_string())),
        }
    }

    async fn set(&self, key: &str, value: String) -> Result<(), ClientError> {
        let path = self.path(key)?;
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| ClientError::Storage(e.to_string()))?;
        // Readers only ever see complete documents.
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, value)
            .await
            .map_err(|e| ClientError::Storage(e.to_string()))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| ClientError::Storage(e.to_string()))
    }

    async fn remove(&self, key: &str) -> Result<(), ClientError> {
        match tokio::fs::remove_file(self.path(key)?).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ClientError::Storage(e.to_string())),
        }
    }
}

/// In-process store, for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, ClientError> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<(), ClientError> {
        self.entries.lock().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), ClientError> {
        self.entries.lock().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Blob {
        name: String,
        count: u32,
    }

    #[tokio::test]
    async fn file_store_round_trips_and_removes() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        let blob = Blob { name: "a".into(), count: 2 };

        save(&store, USER_KEY, &blob).await.unwrap();
        assert_eq!(load::<Blob>(&store, USER_KEY).await.unwrap(), Some(blob));

        store.remove(USER_KEY).await.unwrap();
        store.remove(USER_KEY).await.unwrap();
        assert_eq!(load::<Blob>(&store, USER_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn malformed_blob_reads_as_missing() {
        let store = MemoryStore::new();
        store
            .set(RESULTS_KEY, r#"{"name": 5}"#.to_string())
            .await
            .unwrap();
        assert_eq!(load::<Blob>(&store, RESULTS_KEY).await.unwrap(), None);

        store.set(RESULTS_KEY, "not json".to_string()).await.unwrap();
        assert_eq!(load::<Vec<Blob>>(&store, RESULTS_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn file_store_rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        assert!(matches!(
            store.get("../etc/passwd").await,
            Err(ClientError::Storage(_))
        ));
    }
}
