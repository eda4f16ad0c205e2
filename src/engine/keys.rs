use log::{debug, info};
use serde_json::json;
use snafu::ResultExt;
use tokio_util::sync::CancellationToken;

use crate::armor::ArmorOptions;
use crate::composed::{from_armor_many, KeyParamsBuilder, KeyType, SignedSecretKey, MIN_RSA_BITS};
use crate::engine::error::{CryptoSnafu, EngineError, KeyNotArmoredSnafu};
use crate::engine::request::{KeyOptions, Request, Response};
use crate::engine::storage::Storage;
use crate::engine::store::{self, KeyEntry};
use crate::ser::Serialize;

/// Creates or replaces `keys/<name>`, generating or importing the key.
pub async fn write(
    storage: &dyn Storage,
    name: &str,
    req: &Request,
    create: bool,
    cancel: &CancellationToken,
) -> Result<Response, EngineError> {
    let opts: KeyOptions = req.options()?;

    if create && store::get_entry(storage, name, cancel).await?.is_some() {
        return Err(EngineError::KeyAlreadyExists {
            name: name.to_string(),
        });
    }

    let key = if opts.generate {
        if opts.key_bits < MIN_RSA_BITS {
            return Err(EngineError::KeyBitsTooSmall {
                bits: opts.key_bits,
                min: MIN_RSA_BITS,
            });
        }
        let user_id = identity(&opts)?;
        generate(user_id, opts.key_bits, cancel).await?
    } else {
        import(opts.key.as_deref().unwrap_or_default())?
    };

    let entry = to_entry(name, &key, opts.exportable)?;
    store::put_entry(storage, &entry, cancel).await?;
    info!("stored key {:?} with fingerprint {}", name, entry.fingerprint);

    Ok(Response::default())
}

pub async fn read(
    storage: &dyn Storage,
    name: &str,
    cancel: &CancellationToken,
) -> Result<Response, EngineError> {
    let entry = store::load_entry(storage, name, cancel).await?;
    let public_key = entry
        .signed_key()?
        .public_key()
        .to_armored_string(ArmorOptions::default())
        .context(CryptoSnafu)?;

    Ok(Response::from([
        ("fingerprint", json!(entry.fingerprint)),
        ("public_key", json!(public_key)),
        ("exportable", json!(entry.exportable)),
        ("key_bits", json!(entry.key_bits)),
    ]))
}

pub async fn delete(
    storage: &dyn Storage,
    name: &str,
    cancel: &CancellationToken,
) -> Result<Response, EngineError> {
    store::delete_entry(storage, name, cancel).await?;
    Ok(Response::default())
}

pub async fn list(
    storage: &dyn Storage,
    cancel: &CancellationToken,
) -> Result<Response, EngineError> {
    let names = store::list_entries(storage, cancel).await?;
    Ok(Response::from([("keys", json!(names))]))
}

const IDENTITY_FORBIDDEN: [char; 5] = ['<', '>', '(', ')', '\0'];

/// Builds `Real Name (Comment) <email>` from the parts present.
fn identity(opts: &KeyOptions) -> Result<String, EngineError> {
    let fields = [
        ("real_name", &opts.real_name),
        ("comment", &opts.comment),
        ("email", &opts.email),
    ];
    for (field, value) in fields {
        if value.as_deref().unwrap_or_default().contains(IDENTITY_FORBIDDEN) {
            return Err(EngineError::IdentityInvalid {
                reason: format!("{field} must not contain '<', '>', '(', ')' or NUL"),
            });
        }
    }

    fn present(value: &Option<String>) -> Option<&str> {
        value.as_deref().filter(|v| !v.is_empty())
    }

    let mut parts = Vec::new();
    if let Some(real_name) = present(&opts.real_name) {
        parts.push(real_name.to_string());
    }
    if let Some(comment) = present(&opts.comment) {
        parts.push(format!("({comment})"));
    }
    if let Some(email) = present(&opts.email) {
        parts.push(format!("<{email}>"));
    }

    if parts.is_empty() {
        return Err(EngineError::IdentityInvalid {
            reason: "one of real_name, comment or email is required".into(),
        });
    }

    Ok(parts.join(" "))
}

/// Generates a key on the blocking pool. A key finished after `cancel` fired
/// is dropped.
async fn generate(
    user_id: String,
    bits: u32,
    cancel: &CancellationToken,
) -> Result<SignedSecretKey, EngineError> {
    let params = KeyParamsBuilder::default()
        .key_type(KeyType::Rsa(bits))
        .primary_user_id(user_id)
        .build()
        .context(CryptoSnafu)?;

    let task = tokio::task::spawn_blocking(move || params.generate(rand::thread_rng()));
    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            debug!("key generation cancelled");
            Err(EngineError::Cancelled)
        }
        res = task => match res {
            Ok(key) => key.context(CryptoSnafu),
            Err(err) => Err(EngineError::Crypto {
                source: err.to_string().into(),
            }),
        },
    }
}

/// Parses an armored private key ring holding exactly one usable entity.
fn import(armored: &str) -> Result<SignedSecretKey, EngineError> {
    let (entities, _headers) = from_armor_many(armored).context(KeyNotArmoredSnafu)?;
    if entities.len() != 1 {
        return Err(EngineError::KeyMultipleEntities {
            count: entities.len(),
        });
    }

    let key = entities
        .into_iter()
        .next()
        .and_then(|entity| entity.into_secret())
        .ok_or(EngineError::KeyNoPrivateMaterial)?;

    let algorithm = key.primary_key.public_key().algorithm();
    if !algorithm.is_rsa() {
        return Err(EngineError::KeyAlgorithmUnsupported { algorithm });
    }
    if key.secret_keys().any(|k| k.is_encrypted()) {
        return Err(EngineError::KeyEncrypted);
    }
    if key.details.users.is_empty() {
        return Err(EngineError::KeyNoIdentity);
    }

    Ok(key)
}

fn to_entry(name: &str, key: &SignedSecretKey, exportable: bool) -> Result<KeyEntry, EngineError> {
    let serialized_key = key.to_bytes().context(CryptoSnafu)?;
    let key_bits = key
        .bits()
        .and_then(|bits| u32::try_from(bits).ok())
        .unwrap_or_default();

    Ok(KeyEntry {
        name: name.to_string(),
        serialized_key,
        fingerprint: format!("{:x}", key.fingerprint()),
        exportable,
        key_bits,
    })
}
