//! # Engine module
//!
//! The secrets engine: named RSA keys persisted in a [`Storage`] backend, and
//! the sign, verify, decrypt and session key operations on them.
//!
//! The engine holds no state between requests. Every call to
//! [`handle_request`] resolves its path, loads what it needs from storage and
//! returns a [`Response`].
//!
//! ```no_run
//! # async fn run() -> Result<(), pgp_secrets::engine::EngineError> {
//! use pgp_secrets::engine::{handle_request, MemoryStorage, Operation, Request};
//! use tokio_util::sync::CancellationToken;
//!
//! let storage = MemoryStorage::new();
//! let cancel = CancellationToken::new();
//!
//! let req = Request::new(Operation::Create, "keys/alice")
//!     .with_field("real_name", "Alice")
//!     .with_field("email", "alice@example.com");
//! handle_request(&storage, &req, &cancel).await?;
//!
//! let req = Request::new(Operation::Update, "sign/alice/sha2-512")
//!     .with_field("input", "QWxwYWNhcwo=");
//! let res = handle_request(&storage, &req, &cancel).await?;
//! println!("{}", res.get_str("signature").unwrap_or_default());
//! # Ok(())
//! # }
//! ```

mod decrypt;
mod error;
mod export;
mod format;
mod keys;
mod request;
mod router;
mod session_key;
mod sign;
mod storage;
mod store;

use log::{debug, warn};
use tokio_util::sync::CancellationToken;

use self::router::{route, Endpoint};

pub use self::error::EngineError;
pub use self::format::Format;
pub use self::request::{
    DecryptOptions, KeyOptions, Operation, Request, Response, SignOptions, VerifyOptions,
};
pub use self::storage::{MemoryStorage, SpecialPaths, Storage, StorageEntry, StorageError};
pub use self::store::{special_paths, KeyEntry, KEY_PREFIX};

/// Routes a request to its handler.
pub async fn handle_request(
    storage: &dyn Storage,
    req: &Request,
    cancel: &CancellationToken,
) -> Result<Response, EngineError> {
    let matched = route(&req.path, req.operation)?;
    debug!("{} {} -> {:?}", req.operation, req.path, matched.endpoint);

    let name = matched.name;
    let res = match matched.endpoint {
        Endpoint::KeyList => keys::list(storage, cancel).await,
        Endpoint::Keys => match req.operation {
            Operation::Read => keys::read(storage, name, cancel).await,
            Operation::Delete => keys::delete(storage, name, cancel).await,
            Operation::Create => keys::write(storage, name, req, true, cancel).await,
            Operation::Update | Operation::List => {
                keys::write(storage, name, req, false, cancel).await
            }
        },
        Endpoint::Export => export::export(storage, name, cancel).await,
        Endpoint::Sign => sign::sign(storage, name, matched.trailing, req, cancel).await,
        Endpoint::Verify => sign::verify(storage, name, req, cancel).await,
        Endpoint::Decrypt => decrypt::decrypt(storage, name, req, cancel).await,
        Endpoint::ShowSessionKey => {
            session_key::show_session_key(storage, name, req, cancel).await
        }
    };

    if let Err(err) = &res {
        if err.is_client_error() {
            debug!("{} {} rejected: {}", req.operation, req.path, err);
        } else {
            warn!("{} {} failed: {}", req.operation, req.path, err);
        }
    }

    res
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    const TEST_KEY: &str = include_str!("../../tests/fixtures/test-key.asc");

    async fn call(storage: &MemoryStorage, req: Request) -> Result<Response, EngineError> {
        handle_request(storage, &req, &CancellationToken::new()).await
    }

    fn import(op: Operation, name: &str) -> Request {
        Request::new(op, format!("keys/{name}"))
            .with_field("generate", false)
            .with_field("key", TEST_KEY)
    }

    #[tokio::test]
    async fn test_key_lifecycle() {
        let _ = pretty_env_logger::try_init();
        let storage = MemoryStorage::new();

        call(&storage, import(Operation::Create, "b")).await.unwrap();
        call(&storage, import(Operation::Update, "a")).await.unwrap();

        let err = call(&storage, import(Operation::Create, "b")).await.unwrap_err();
        assert_eq!(err.kind(), "key-already-exists");
        // update replaces
        call(&storage, import(Operation::Update, "b")).await.unwrap();

        let res = call(&storage, Request::new(Operation::List, "keys/")).await.unwrap();
        assert_eq!(res.get("keys"), Some(&json!(["a", "b"])));

        let res = call(&storage, Request::new(Operation::Read, "keys/a")).await.unwrap();
        assert_eq!(
            res.get_str("fingerprint"),
            Some("ccbd28b00464a99462aeeb56966a4d775663e063")
        );
        assert_eq!(res.get("exportable"), Some(&json!(false)));
        assert_eq!(res.get("key_bits"), Some(&json!(2048)));
        assert!(res
            .get_str("public_key")
            .unwrap()
            .starts_with("-----BEGIN PGP PUBLIC KEY BLOCK-----"));

        let res = call(&storage, Request::new(Operation::Delete, "keys/a")).await.unwrap();
        assert_eq!(res, Response::default());
        let err = call(&storage, Request::new(Operation::Read, "keys/a")).await.unwrap_err();
        assert_eq!(err.kind(), "key-not-found");
    }

    #[tokio::test]
    async fn test_dispatch_errors() {
        let storage = MemoryStorage::new();

        let err = call(&storage, Request::new(Operation::Read, "nope/a")).await.unwrap_err();
        assert_eq!(err.kind(), "unsupported-path");

        let err = call(&storage, Request::new(Operation::Read, "sign/a")).await.unwrap_err();
        assert_eq!(err.kind(), "unsupported-operation");

        let err = call(&storage, Request::new(Operation::Read, "keys/a b")).await.unwrap_err();
        assert_eq!(err.kind(), "name-invalid");

        let req = Request::new(Operation::Create, "keys/a").with_field("generate", "yes");
        let err = call(&storage, req).await.unwrap_err();
        assert_eq!(err.kind(), "request-invalid");

        storage.set_failing(true);
        let err = call(&storage, Request::new(Operation::List, "keys")).await.unwrap_err();
        assert_eq!(err.kind(), "storage-error");
        assert!(!err.is_client_error());
    }

    #[tokio::test]
    async fn test_cancelled() {
        let storage = MemoryStorage::new();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = handle_request(&storage, &import(Operation::Create, "a"), &cancel)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "cancelled");
        assert!(storage.entry("key/a").await.is_none());
    }
}
