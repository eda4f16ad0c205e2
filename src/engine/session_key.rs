use serde_json::json;
use snafu::ResultExt;
use tokio_util::sync::CancellationToken;

use crate::engine::decrypt::{decode_message, load_ring, push_signer};
use crate::engine::error::{CiphertextInvalidSnafu, EngineError};
use crate::engine::format::Format;
use crate::engine::request::{DecryptOptions, Request, Response};
use crate::engine::storage::Storage;

/// Reveals the session key of a message addressed to the named key as
/// `<cipher id>:<HEX>`. A `signer_key` must parse and joins the ring, but no
/// signature is checked.
pub async fn show_session_key(
    storage: &dyn Storage,
    name: &str,
    req: &Request,
    cancel: &CancellationToken,
) -> Result<Response, EngineError> {
    let opts: DecryptOptions = req.options()?;
    let format = Format::parse(opts.format.as_deref())?;

    let mut ring = load_ring(storage, name, cancel).await?;
    if let Some(armored) = opts.signer_key.as_deref() {
        push_signer(&mut ring, armored)?;
    }
    let message = decode_message(&opts.ciphertext, format)?;
    let session_key = message
        .decrypt_session_key(&ring)
        .context(CiphertextInvalidSnafu)?
        .ok_or(EngineError::SessionKeyNotDecryptable)?;

    let session_key = session_key.to_hex_string();
    Ok(Response::from([("session_key", json!(session_key.as_str()))]))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::composed::SignedSecretKey;
    use crate::engine::request::Operation;
    use crate::engine::storage::MemoryStorage;
    use crate::engine::store::{self, KeyEntry};
    use crate::ser::Serialize;

    const TEST_KEY: &str = include_str!("../../tests/fixtures/test-key.asc");
    const THIRD_PARTY_KEY: &str = include_str!("../../tests/fixtures/third-party-key.asc");
    const SIGNER_KEY_PUB: &str = include_str!("../../tests/fixtures/signer-key.pub.asc");
    const MESSAGE_SIGNED: &str = include_str!("../../tests/fixtures/message-signed.asc");
    const MESSAGE_MULTI: &str = include_str!("../../tests/fixtures/message-multi.asc");

    async fn storage() -> MemoryStorage {
        let storage = MemoryStorage::new();
        for (name, armored) in [("test", TEST_KEY), ("third", THIRD_PARTY_KEY)] {
            let (key, _) = SignedSecretKey::from_armor_single(armored).unwrap();
            let entry = KeyEntry {
                name: name.into(),
                serialized_key: key.to_bytes().unwrap(),
                fingerprint: format!("{:x}", key.fingerprint()),
                exportable: false,
                key_bits: 2048,
            };
            store::put_entry(&storage, &entry, &CancellationToken::new())
                .await
                .unwrap();
        }
        storage
    }

    fn request(name: &str, ciphertext: &str) -> Request {
        Request::new(Operation::Update, format!("show-session-key/{name}"))
            .with_field("ciphertext", ciphertext)
            .with_field("format", "ascii-armor")
    }

    async fn run(name: &str, ciphertext: &str) -> Result<Response, EngineError> {
        let req = request(name, ciphertext);
        show_session_key(&storage().await, name, &req, &CancellationToken::new()).await
    }

    #[tokio::test]
    async fn test_show_session_key() {
        let res = run("test", MESSAGE_SIGNED).await.unwrap();
        assert_eq!(
            res.get_str("session_key"),
            Some("9:614AD58137B9175EFB36D4492F3B9E61338F54F770EF0952B5BFF2E0F4710221")
        );

        let multi = "9:F24127109B096625480C9C54E460BC082B1998952AAF865EDA1CEBBB8DFCBFC9";
        assert_eq!(run("test", MESSAGE_MULTI).await.unwrap().get_str("session_key"), Some(multi));
        assert_eq!(run("third", MESSAGE_MULTI).await.unwrap().get_str("session_key"), Some(multi));
    }

    #[tokio::test]
    async fn test_not_decryptable() {
        let err = run("third", MESSAGE_SIGNED).await.unwrap_err();
        assert_eq!(err.kind(), "session-key-not-decryptable");
        assert!(err.is_client_error());

        assert_eq!(run("test", "garbage").await.unwrap_err().kind(), "ciphertext-invalid");
    }

    #[tokio::test]
    async fn test_signer_key() {
        let storage = storage().await;
        let cancel = CancellationToken::new();

        let req = request("test", MESSAGE_SIGNED).with_field("signer_key", SIGNER_KEY_PUB);
        let res = show_session_key(&storage, "test", &req, &cancel).await.unwrap();
        assert_eq!(
            res.get_str("session_key"),
            Some("9:614AD58137B9175EFB36D4492F3B9E61338F54F770EF0952B5BFF2E0F4710221")
        );

        let req = request("test", MESSAGE_SIGNED).with_field("signer_key", "garbage");
        let err = show_session_key(&storage, "test", &req, &cancel)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "signer-key-invalid");
    }
}
