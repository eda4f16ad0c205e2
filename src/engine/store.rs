use std::future::Future;

use log::error;
use serde::{Deserialize, Serialize};
use snafu::ResultExt;
use tokio_util::sync::CancellationToken;

use crate::composed::SignedSecretKey;
use crate::engine::error::{EngineError, StorageSnafu};
use crate::engine::format::{decode_base64, encode_base64};
use crate::engine::storage::{SpecialPaths, Storage, StorageEntry, StorageError};

/// Prefix of all key entries in storage.
pub const KEY_PREFIX: &str = "key/";

/// The persisted record of a named key.
#[derive(derive_more::Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEntry {
    pub name: String,
    /// The binary key ring, private key packets included.
    #[serde(with = "base64_bytes")]
    #[debug("{} bytes", serialized_key.len())]
    pub serialized_key: Vec<u8>,
    /// Lowercase hex of the primary key fingerprint.
    pub fingerprint: String,
    pub exportable: bool,
    pub key_bits: u32,
}

impl KeyEntry {
    /// Parses the stored key ring.
    pub fn signed_key(&self) -> Result<SignedSecretKey, EngineError> {
        SignedSecretKey::from_bytes(self.serialized_key.clone()).map_err(|err| {
            error!("stored key {:?} does not parse: {}", self.name, err);
            EngineError::EntryCorrupt {
                name: self.name.clone(),
                reason: err.to_string(),
            }
        })
    }
}

mod base64_bytes {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::encode_base64(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        super::decode_base64(&encoded).map_err(de::Error::custom)
    }
}

/// Storage prefixes the engine asks the backend to seal wrap.
pub fn special_paths() -> SpecialPaths {
    SpecialPaths {
        seal_wrap_storage: vec![KEY_PREFIX.to_string()],
    }
}

/// Checks a key name: ASCII letters, digits, `_` and `-`, not starting or
/// ending with `-`.
pub fn validate_name(name: &str) -> Result<(), EngineError> {
    let valid = !name.is_empty()
        && !name.starts_with('-')
        && !name.ends_with('-')
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-');

    if valid {
        Ok(())
    } else {
        Err(EngineError::NameInvalid {
            name: name.to_string(),
        })
    }
}

/// Runs a storage call, giving up when `cancel` fires first.
async fn cancellable<T>(
    cancel: &CancellationToken,
    fut: impl Future<Output = Result<T, StorageError>>,
) -> Result<T, EngineError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(EngineError::Cancelled),
        res = fut => res.context(StorageSnafu),
    }
}

pub async fn get_entry(
    storage: &dyn Storage,
    name: &str,
    cancel: &CancellationToken,
) -> Result<Option<KeyEntry>, EngineError> {
    validate_name(name)?;
    let key = format!("{KEY_PREFIX}{name}");
    let Some(raw) = cancellable(cancel, storage.get(&key)).await? else {
        return Ok(None);
    };

    let entry: KeyEntry = serde_json::from_slice(&raw.value).map_err(|err| {
        error!("failed to decode entry {:?}: {}", key, err);
        EngineError::EntryCorrupt {
            name: name.to_string(),
            reason: err.to_string(),
        }
    })?;

    Ok(Some(entry))
}

/// Loads an entry, failing with `key-not-found` when it is missing.
pub async fn load_entry(
    storage: &dyn Storage,
    name: &str,
    cancel: &CancellationToken,
) -> Result<KeyEntry, EngineError> {
    get_entry(storage, name, cancel)
        .await?
        .ok_or_else(|| EngineError::KeyNotFound {
            name: name.to_string(),
        })
}

/// Writes an entry, replacing any previous one of the same name.
pub async fn put_entry(
    storage: &dyn Storage,
    entry: &KeyEntry,
    cancel: &CancellationToken,
) -> Result<(), EngineError> {
    validate_name(&entry.name)?;
    let value = serde_json::to_vec(entry).map_err(|err| EngineError::EntryCorrupt {
        name: entry.name.clone(),
        reason: err.to_string(),
    })?;

    let entry = StorageEntry {
        key: format!("{KEY_PREFIX}{}", entry.name),
        value,
        seal_wrap: true,
    };
    cancellable(cancel, storage.put(entry)).await
}

pub async fn delete_entry(
    storage: &dyn Storage,
    name: &str,
    cancel: &CancellationToken,
) -> Result<(), EngineError> {
    validate_name(name)?;
    cancellable(cancel, storage.delete(&format!("{KEY_PREFIX}{name}"))).await
}

/// Names of all entries, ascending.
pub async fn list_entries(
    storage: &dyn Storage,
    cancel: &CancellationToken,
) -> Result<Vec<String>, EngineError> {
    let mut names = cancellable(cancel, storage.list(KEY_PREFIX)).await?;
    names.retain(|name| !name.ends_with('/'));
    names.sort();

    Ok(names)
}
