use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use snafu::Snafu;
use tokio::sync::RwLock;

/// A single value in the storage backend.
#[derive(derive_more::Debug, Clone, PartialEq, Eq)]
pub struct StorageEntry {
    pub key: String,
    #[debug("{} bytes", value.len())]
    pub value: Vec<u8>,
    /// Asks the backend to wrap the value with its seal before persisting it.
    pub seal_wrap: bool,
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum StorageError {
    #[snafu(display("storage backend failure: {message}"))]
    Backend { message: String },
}

/// The key/value store the engine persists its entries in.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<StorageEntry>, StorageError>;

    async fn put(&self, entry: StorageEntry) -> Result<(), StorageError>;

    /// Removing a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// Lists the keys below `prefix`, relative to it. Nested keys are
    /// reported up to and including their next `/`.
    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError>;
}

/// Storage prefixes with special handling by the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecialPaths {
    /// Prefixes whose values must be seal wrapped.
    pub seal_wrap_storage: Vec<String>,
}

/// In process storage, used by tests and embedders without a backend.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RwLock<BTreeMap<String, StorageEntry>>,
    failing: AtomicBool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every following call fail with a backend error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Raw access to a stored entry, bypassing failure injection.
    pub async fn entry(&self, key: &str) -> Option<StorageEntry> {
        self.entries.read().await.get(key).cloned()
    }

    fn check(&self) -> Result<(), StorageError> {
        if self.failing.load(Ordering::SeqCst) {
            return BackendSnafu {
                message: "memory storage is failing",
            }
            .fail();
        }
        Ok(())
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<StorageEntry>, StorageError> {
        self.check()?;
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn put(&self, entry: StorageEntry) -> Result<(), StorageError> {
        self.check()?;
        self.entries.write().await.insert(entry.key.clone(), entry);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.check()?;
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        self.check()?;
        let entries = self.entries.read().await;
        let mut keys: Vec<String> = entries
            .range(prefix.to_string()..)
            .map(|(key, _)| key)
            .take_while(|key| key.starts_with(prefix))
            .map(|key| {
                let rest = &key[prefix.len()..];
                match rest.find('/') {
                    Some(idx) => rest[..=idx].to_string(),
                    None => rest.to_string(),
                }
            })
            .collect();
        keys.dedup();

        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn entry(key: &str) -> StorageEntry {
        StorageEntry {
            key: key.into(),
            value: key.as_bytes().to_vec(),
            seal_wrap: false,
        }
    }

    #[tokio::test]
    async fn test_memory_storage() {
        let storage = MemoryStorage::new();
        storage.put(entry("key/b")).await.unwrap();
        storage.put(entry("key/a")).await.unwrap();
        storage.put(entry("key/c/nested")).await.unwrap();
        storage.put(entry("keys")).await.unwrap();
        storage.put(entry("other/x")).await.unwrap();

        assert_eq!(storage.get("key/a").await.unwrap(), Some(entry("key/a")));
        assert_eq!(storage.get("key/z").await.unwrap(), None);
        assert_eq!(
            storage.list("key/").await.unwrap(),
            vec!["a".to_string(), "b".into(), "c/".into()]
        );

        storage.delete("key/a").await.unwrap();
        storage.delete("key/a").await.unwrap();
        assert_eq!(storage.get("key/a").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_failing_storage() {
        let storage = MemoryStorage::new();
        storage.put(entry("key/a")).await.unwrap();
        storage.set_failing(true);

        assert!(storage.get("key/a").await.is_err());
        assert!(storage.list("key/").await.is_err());
        assert!(storage.entry("key/a").await.is_some());

        storage.set_failing(false);
        assert!(storage.get("key/a").await.unwrap().is_some());
    }
}
