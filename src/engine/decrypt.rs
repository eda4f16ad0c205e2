use log::{debug, warn};
use serde_json::json;
use snafu::ResultExt;
use tokio_util::sync::CancellationToken;

use crate::composed::{from_armor_many, DecryptedMessage, KeyRing, Message};
use crate::engine::error::{CiphertextInvalidSnafu, EngineError, SignerKeyInvalidSnafu};
use crate::engine::format::{decode_base64, encode_base64, Format};
use crate::engine::request::{DecryptOptions, Request, Response};
use crate::engine::storage::Storage;
use crate::engine::store;
use crate::errors::{format_err, Error};

/// Decrypts a message for the named key, returning the literal data as
/// base64 `plaintext`.
///
/// With `signer_key` the message must also carry a valid signature made by
/// that key.
pub async fn decrypt(
    storage: &dyn Storage,
    name: &str,
    req: &Request,
    cancel: &CancellationToken,
) -> Result<Response, EngineError> {
    let opts: DecryptOptions = req.options()?;
    let format = Format::parse(opts.format.as_deref())?;

    let mut ring = load_ring(storage, name, cancel).await?;
    let signer = match opts.signer_key.as_deref() {
        Some(armored) => Some(push_signer(&mut ring, armored)?),
        None => None,
    };

    let message = decode_message(&opts.ciphertext, format)?;
    let decrypted = message.decrypt(&ring).context(CiphertextInvalidSnafu)?;

    if let Some(signer) = signer {
        check_signer(&decrypted, &ring, signer)?;
    }

    let plaintext = encode_base64(decrypted.data());
    Ok(Response::from([("plaintext", json!(plaintext))]))
}

/// The stored key as a single entity ring.
pub(crate) async fn load_ring(
    storage: &dyn Storage,
    name: &str,
    cancel: &CancellationToken,
) -> Result<KeyRing, EngineError> {
    let key = store::load_entry(storage, name, cancel).await?.signed_key()?;
    let mut ring = KeyRing::new();
    ring.push_secret(key);

    Ok(ring)
}

/// Decodes the message envelope.
pub(crate) fn decode_message(ciphertext: &str, format: Format) -> Result<Message, EngineError> {
    let message = match format {
        Format::Base64 => decode_base64(ciphertext)
            .map(Message::from_bytes)
            .map_err(Error::from),
        Format::AsciiArmor => Message::from_armor(ciphertext).map(|(message, _)| message),
    };

    message.context(CiphertextInvalidSnafu)
}

/// Appends the first entity of an armored key ring, returning its index.
pub(crate) fn push_signer(ring: &mut KeyRing, armored: &str) -> Result<usize, EngineError> {
    let (entities, _) = from_armor_many(armored).context(SignerKeyInvalidSnafu)?;
    let mut entities = entities.into_iter();
    let signer = entities
        .next()
        .ok_or_else(|| format_err!("signer key ring is empty"))
        .context(SignerKeyInvalidSnafu)?;
    if entities.next().is_some() {
        warn!("signer key ring holds more than one entity, using the first");
    }

    Ok(ring.push(signer))
}

fn check_signer(
    decrypted: &DecryptedMessage,
    ring: &KeyRing,
    signer: usize,
) -> Result<(), EngineError> {
    if !decrypted.is_signed() {
        return Err(EngineError::SignatureInvalid {
            reason: "message is not signed".into(),
        });
    }

    let signer = &ring.entities()[signer];
    let verified = decrypted.signatures.iter().any(|signature| {
        let Some(key) = signature
            .issuer()
            .iter()
            .find_map(|id| signer.find_public_key(id))
        else {
            debug!("signature issuer {:?} is not the signer", signature.issuer());
            return false;
        };

        match decrypted.verify(signature, key) {
            Ok(()) => true,
            Err(err) => {
                debug!("signature by {:?} does not verify: {}", key.key_id(), err);
                false
            }
        }
    });

    if verified {
        Ok(())
    } else {
        Err(EngineError::SignatureInvalid {
            reason: format!("no valid signature by signer key {:x}", signer.fingerprint()),
        })
    }
}
