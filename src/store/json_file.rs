use std::{collections::BTreeMap, fs, path::PathBuf, sync::RwLock};

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use log::warn;

use super::KeyValueStore;

/// All keys in one pretty-printed JSON object on disk.
pub struct JsonFileStore {
    path: PathBuf,
    data: RwLock<BTreeMap<String, String>>,
}

impl JsonFileStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create store directory {}", parent.display()))?;
        }

        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read store from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                warn!("Ignoring unreadable store file {}: {err}", path.display());
                BTreeMap::new()
            })
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    fn persist(&self, data: &BTreeMap<String, String>) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write store to {}", self.path.display()))
    }
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let guard = self
            .data
            .read()
            .map_err(|_| anyhow!("store lock poisoned"))?;
        Ok(guard.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut guard = self
            .data
            .write()
            .map_err(|_| anyhow!("store lock poisoned"))?;
        let previous = guard.insert(key.to_string(), value.to_string());
        if let Err(err) = self.persist(&guard) {
            // Keep memory and disk in agreement.
            match previous {
                Some(old) => guard.insert(key.to_string(), old),
                None => guard.remove(key),
            };
            return Err(err);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        let store = JsonFileStore::new(path.clone()).unwrap();
        store.set("a", "1").await.unwrap();
        store.set("b", "{\"x\":2}").await.unwrap();
        drop(store);

        let reopened = JsonFileStore::new(path).unwrap();
        assert_eq!(reopened.get("a").await.unwrap().as_deref(), Some("1"));
        assert_eq!(reopened.get("b").await.unwrap().as_deref(), Some("{\"x\":2}"));
        assert_eq!(reopened.get("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, "not json").unwrap();

        let store = JsonFileStore::new(path).unwrap();

        assert_eq!(store.get("a").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_failed_write_rolls_back_memory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        let store = JsonFileStore::new(path.clone()).unwrap();
        store.set("a", "1").await.unwrap();

        // A directory where the file should be makes the write fail.
        fs::remove_file(&path).unwrap();
        fs::create_dir(&path).unwrap();

        assert!(store.set("a", "2").await.is_err());
        assert_eq!(store.get("a").await.unwrap().as_deref(), Some("1"));
    }
}
