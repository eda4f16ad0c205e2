use chrono::Utc;
use log::debug;
use serde_json::json;
use snafu::ResultExt;
use tokio_util::sync::CancellationToken;

use crate::armor::ArmorOptions;
use crate::composed::{DetachedSignature, SignedSecretKey};
use crate::engine::error::{CryptoSnafu, EngineError, InputInvalidSnafu};
use crate::engine::format::{decode_base64, encode_base64, parse_hash_algorithm, Format};
use crate::engine::request::{Request, Response, SignOptions, VerifyOptions};
use crate::engine::storage::Storage;
use crate::engine::store;
use crate::errors::{format_err, Result};
use crate::ser::Serialize;

/// Creates a detached signature over the base64 `input` with the primary key.
///
/// The hash algorithm is taken from the path segment of
/// `sign/<name>/<algorithm>`, then `urlalgorithm`, then `algorithm`.
pub async fn sign(
    storage: &dyn Storage,
    name: &str,
    algorithm: Option<&str>,
    req: &Request,
    cancel: &CancellationToken,
) -> Result<Response, EngineError> {
    let opts: SignOptions = req.options()?;
    let hash_algorithm = parse_hash_algorithm(
        [algorithm, opts.urlalgorithm.as_deref(), opts.algorithm.as_deref()]
            .into_iter()
            .flatten()
            .find(|alg| !alg.is_empty()),
    )?;
    let format = Format::parse(opts.format.as_deref())?;
    let input = decode_base64(&opts.input).context(InputInvalidSnafu { field: "input" })?;

    let key = store::load_entry(storage, name, cancel).await?.signed_key()?;
    let signature = DetachedSignature::sign_binary_data(
        &key.primary_key,
        hash_algorithm,
        &input,
        Utc::now(),
    )
    .context(CryptoSnafu)?;

    let signature = match format {
        Format::Base64 => encode_base64(&signature.to_bytes().context(CryptoSnafu)?),
        Format::AsciiArmor => signature
            .to_armored_string(ArmorOptions::default())
            .context(CryptoSnafu)?,
    };

    Ok(Response::from([("signature", json!(signature))]))
}

/// Checks a detached signature. Any problem with the signature itself
/// reports `valid: false`.
pub async fn verify(
    storage: &dyn Storage,
    name: &str,
    req: &Request,
    cancel: &CancellationToken,
) -> Result<Response, EngineError> {
    let opts: VerifyOptions = req.options()?;
    let format = Format::parse(opts.format.as_deref())?;
    let input = decode_base64(&opts.input).context(InputInvalidSnafu { field: "input" })?;

    let key = store::load_entry(storage, name, cancel).await?.signed_key()?;
    let valid = match check_signature(&key, &opts.signature, format, &input) {
        Ok(()) => true,
        Err(err) => {
            debug!("signature rejected for key {:?}: {}", name, err);
            false
        }
    };

    Ok(Response::from([("valid", json!(valid))]))
}

fn check_signature(key: &SignedSecretKey, signature: &str, format: Format, data: &[u8]) -> Result<()> {
    let signature = match format {
        Format::Base64 => DetachedSignature::from_bytes(decode_base64(signature)?)?,
        Format::AsciiArmor => DetachedSignature::from_armor_single(signature)?.0,
    };

    let issuers = signature.issuer();
    let public_key = issuers
        .iter()
        .find_map(|id| key.find_public_key(id))
        .ok_or_else(|| format_err!("signature issuer {:?} is not part of the key", issuers))?;

    signature.verify(public_key, data)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::engine::request::Operation;
    use crate::engine::storage::MemoryStorage;
    use crate::engine::store::KeyEntry;

    const TEST_KEY: &str = include_str!("../../tests/fixtures/test-key.asc");
    const THIRD_PARTY_KEY: &str = include_str!("../../tests/fixtures/third-party-key.asc");

    async fn storage_with(name: &str, armored: &str) -> MemoryStorage {
        let storage = MemoryStorage::new();
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
        storage
    }

    fn sign_request(format: &str) -> Request {
        Request::new(Operation::Update, "sign/test")
            .with_field("input", "QWxwYWNhcwo=")
            .with_field("format", format)
    }

    #[tokio::test]
    async fn test_sign_verify() {
        let storage = storage_with("test", TEST_KEY).await;
        let cancel = CancellationToken::new();

        for algorithm in ["sha2-224", "sha2-256", "sha2-384", "sha2-512"] {
            for format in ["base64", "ascii-armor"] {
                let req = sign_request(format).with_field("algorithm", algorithm);
                let res = sign(&storage, "test", None, &req, &cancel).await.unwrap();
                let signature = res.get_str("signature").unwrap().to_string();

                let req = Request::new(Operation::Update, "verify/test")
                    .with_field("input", "QWxwYWNhcwo=")
                    .with_field("signature", signature.clone())
                    .with_field("format", format);
                let res = verify(&storage, "test", &req, &cancel).await.unwrap();
                assert_eq!(res.get("valid"), Some(&json!(true)), "{algorithm} {format}");

                let req = Request::new(Operation::Update, "verify/test")
                    .with_field("input", "QWxwYWNhcw==")
                    .with_field("signature", signature)
                    .with_field("format", format);
                let res = verify(&storage, "test", &req, &cancel).await.unwrap();
                assert_eq!(res.get("valid"), Some(&json!(false)), "{algorithm} {format}");
            }
        }
    }

    #[tokio::test]
    async fn test_sign_uses_path_algorithm() {
        let storage = storage_with("test", TEST_KEY).await;
        let cancel = CancellationToken::new();
        let req = sign_request("base64").with_field("algorithm", "sha2-224");

        let res = sign(&storage, "test", Some("sha2-512"), &req, &cancel)
            .await
            .unwrap();
        let raw = decode_base64(res.get_str("signature").unwrap()).unwrap();
        let signature = DetachedSignature::from_bytes(raw).unwrap();
        assert_eq!(
            signature.signature.hash_alg(),
            crate::crypto::hash::HashAlgorithm::Sha512
        );
        assert_eq!(signature.issuer()[0], key_id(TEST_KEY));

        let res = sign(&storage, "test", None, &req, &cancel).await.unwrap();
        let raw = decode_base64(res.get_str("signature").unwrap()).unwrap();
        let signature = DetachedSignature::from_bytes(raw).unwrap();
        assert_eq!(
            signature.signature.hash_alg(),
            crate::crypto::hash::HashAlgorithm::Sha224
        );
    }

    #[tokio::test]
    async fn test_sign_url_algorithm_precedence() {
        let storage = storage_with("test", TEST_KEY).await;
        let cancel = CancellationToken::new();
        let hash_of = |res: Response| {
            let raw = decode_base64(res.get_str("signature").unwrap()).unwrap();
            DetachedSignature::from_bytes(raw).unwrap().signature.hash_alg()
        };

        let req = sign_request("base64")
            .with_field("algorithm", "sha2-224")
            .with_field("urlalgorithm", "sha2-384");
        let res = sign(&storage, "test", None, &req, &cancel).await.unwrap();
        assert_eq!(hash_of(res), crate::crypto::hash::HashAlgorithm::Sha384);

        let res = sign(&storage, "test", Some("sha2-512"), &req, &cancel)
            .await
            .unwrap();
        assert_eq!(hash_of(res), crate::crypto::hash::HashAlgorithm::Sha512);

        let req = sign_request("base64").with_field("urlalgorithm", "sha2-999");
        let err = sign(&storage, "test", None, &req, &cancel).await.unwrap_err();
        assert_eq!(err.kind(), "algorithm-unsupported");
    }

    fn key_id(armored: &str) -> crate::types::KeyId {
        SignedSecretKey::from_armor_single(armored).unwrap().0.key_id()
    }

    #[tokio::test]
    async fn test_sign_errors() {
        let storage = storage_with("test", TEST_KEY).await;
        let cancel = CancellationToken::new();

        let err = sign(&storage, "test", Some("sha1"), &sign_request("base64"), &cancel)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "algorithm-unsupported");

        let err = sign(&storage, "test", None, &sign_request("pem"), &cancel)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "format-unsupported");

        let req = Request::new(Operation::Update, "sign/test").with_field("input", "%%%");
        let err = sign(&storage, "test", None, &req, &cancel).await.unwrap_err();
        assert_eq!(err.kind(), "input-invalid");

        let err = sign(&storage, "missing", None, &sign_request("base64"), &cancel)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "key-not-found");
    }

    #[tokio::test]
    async fn test_verify_foreign_and_garbage() {
        let storage = storage_with("test", TEST_KEY).await;
        let other = storage_with("third", THIRD_PARTY_KEY).await;
        let cancel = CancellationToken::new();

        let res = sign(&other, "third", None, &sign_request("base64"), &cancel)
            .await
            .unwrap();
        let foreign = res.get_str("signature").unwrap().to_string();

        for signature in [foreign.as_str(), "", "AAAA", "not base64!"] {
            let req = Request::new(Operation::Update, "verify/test")
                .with_field("input", "QWxwYWNhcwo=")
                .with_field("signature", signature);
            let res = verify(&storage, "test", &req, &cancel).await.unwrap();
            assert_eq!(res.get("valid"), Some(&json!(false)), "{signature:?}");
        }

        let req = Request::new(Operation::Update, "verify/test").with_field("input", "%%%");
        let err = verify(&storage, "test", &req, &cancel).await.unwrap_err();
        assert_eq!(err.kind(), "input-invalid");
    }
}
