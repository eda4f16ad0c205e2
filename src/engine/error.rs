use snafu::Snafu;

use crate::crypto::public_key::PublicKeyAlgorithm;
use crate::engine::request::Operation;
use crate::engine::storage::StorageError;

/// Errors returned by [`handle_request`](crate::engine::handle_request).
///
/// Each variant maps onto a stable kind string, see [`EngineError::kind`].
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum EngineError {
    #[snafu(display("invalid key name {name:?}"))]
    NameInvalid { name: String },
    #[snafu(display("key {name:?} not found"))]
    KeyNotFound { name: String },
    #[snafu(display("key {name:?} already exists"))]
    KeyAlreadyExists { name: String },
    #[snafu(display("invalid identity: {reason}"))]
    IdentityInvalid { reason: String },
    #[snafu(display("key is not an armored key ring"))]
    KeyNotArmored { source: crate::errors::Error },
    #[snafu(display("key ring has no private key material"))]
    KeyNoPrivateMaterial,
    #[snafu(display("key ring has no identity"))]
    KeyNoIdentity,
    #[snafu(display("key_bits {bits} is below the minimum of {min}"))]
    KeyBitsTooSmall { bits: u32, min: u32 },
    #[snafu(display("private key is protected by a passphrase"))]
    KeyEncrypted,
    #[snafu(display("key ring holds {count} entities, expected exactly one"))]
    KeyMultipleEntities { count: usize },
    #[snafu(display("unsupported key algorithm {algorithm:?}"))]
    KeyAlgorithmUnsupported { algorithm: PublicKeyAlgorithm },
    #[snafu(display("key {name:?} is not exportable"))]
    NotExportable { name: String },
    #[snafu(display("unsupported format {format:?}"))]
    FormatUnsupported { format: String },
    #[snafu(display("unsupported hash algorithm {algorithm:?}"))]
    AlgorithmUnsupported { algorithm: String },
    #[snafu(display("{field} is not valid base64"))]
    InputInvalid {
        field: &'static str,
        source: base64::DecodeError,
    },
    #[snafu(display("invalid ciphertext"))]
    CiphertextInvalid { source: crate::errors::Error },
    #[snafu(display("invalid signer key"))]
    SignerKeyInvalid { source: crate::errors::Error },
    #[snafu(display("signature invalid: {reason}"))]
    SignatureInvalid { reason: String },
    #[snafu(display("no key can decrypt the session key"))]
    SessionKeyNotDecryptable,
    #[snafu(display("invalid request: {message}"))]
    RequestInvalid { message: String },
    #[snafu(display("unsupported path {path:?}"))]
    UnsupportedPath { path: String },
    #[snafu(display("unsupported operation {operation} on {path:?}"))]
    UnsupportedOperation { operation: Operation, path: String },
    #[snafu(display("storage error"))]
    Storage { source: StorageError },
    #[snafu(display("stored entry {name:?} is corrupt: {reason}"))]
    EntryCorrupt { name: String, reason: String },
    #[snafu(display("crypto operation failed"))]
    Crypto { source: crate::errors::Error },
    #[snafu(display("request cancelled"))]
    Cancelled,
}

impl EngineError {
    /// The stable, machine readable kind of the error.
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::NameInvalid { .. } => "name-invalid",
            EngineError::KeyNotFound { .. } => "key-not-found",
            EngineError::KeyAlreadyExists { .. } => "key-already-exists",
            EngineError::IdentityInvalid { .. } => "identity-invalid",
            EngineError::KeyNotArmored { .. } => "key-not-armored",
            EngineError::KeyNoPrivateMaterial => "key-no-private-material",
            EngineError::KeyNoIdentity => "key-no-identity",
            EngineError::KeyBitsTooSmall { .. } => "key-bits-too-small",
            EngineError::KeyEncrypted => "key-encrypted",
            EngineError::KeyMultipleEntities { .. } => "key-multiple-entities",
            EngineError::KeyAlgorithmUnsupported { .. } => "key-algorithm-unsupported",
            EngineError::NotExportable { .. } => "not-exportable",
            EngineError::FormatUnsupported { .. } => "format-unsupported",
            EngineError::AlgorithmUnsupported { .. } => "algorithm-unsupported",
            EngineError::InputInvalid { .. } => "input-invalid",
            EngineError::CiphertextInvalid { .. } => "ciphertext-invalid",
            EngineError::SignerKeyInvalid { .. } => "signer-key-invalid",
            EngineError::SignatureInvalid { .. } => "signature-invalid",
            EngineError::SessionKeyNotDecryptable => "session-key-not-decryptable",
            EngineError::RequestInvalid { .. } => "request-invalid",
            EngineError::UnsupportedPath { .. } => "unsupported-path",
            EngineError::UnsupportedOperation { .. } => "unsupported-operation",
            EngineError::Storage { .. } => "storage-error",
            EngineError::EntryCorrupt { .. } => "entry-corrupt",
            EngineError::Crypto { .. } => "crypto-error",
            EngineError::Cancelled => "cancelled",
        }
    }

    /// Whether the caller is at fault. Everything else is a server side failure.
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            EngineError::Storage { .. }
                | EngineError::EntryCorrupt { .. }
                | EngineError::Crypto { .. }
                | EngineError::Cancelled
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        let err = EngineError::KeyNotFound { name: "k".into() };
        assert_eq!(err.kind(), "key-not-found");
        assert!(err.is_client_error());
        assert_eq!(err.to_string(), "key \"k\" not found");

        let err = EngineError::Storage {
            source: StorageError::Backend {
                message: "down".into(),
            },
        };
        assert_eq!(err.kind(), "storage-error");
        assert!(!err.is_client_error());

        assert!(!EngineError::Cancelled.is_client_error());
        assert_eq!(
            EngineError::SessionKeyNotDecryptable.kind(),
            "session-key-not-decryptable"
        );
    }
}
