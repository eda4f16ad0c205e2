//! # pgp-secrets
//!
//! An OpenPGP secrets engine. Keys are generated or imported under a name,
//! persisted through a pluggable [`Storage`](engine::Storage) backend and
//! used for detached signatures, message decryption and session key reveal
//! without ever leaving the engine, unless marked exportable.
//!
//! The OpenPGP layer covers what the engine needs from
//! [RFC 4880](https://www.rfc-editor.org/rfc/rfc4880.html): version 4 RSA
//! keys and signatures, version 3 public key encrypted session keys,
//! integrity protected data, compression and ASCII armor.
//!
//! Requests enter through [`engine::handle_request`].

#![forbid(unsafe_code)]
#![deny(
    clippy::all,
    clippy::style,
    clippy::perf,
    clippy::complexity,
    clippy::correctness,
    rust_2018_idioms
)]
#![allow(clippy::missing_const_for_fn, clippy::use_self)]

pub mod errors;

pub mod armor;
pub mod composed;
pub mod crypto;
pub mod engine;
pub mod packet;
pub mod ser;
pub mod types;

mod parsing;

pub use self::composed::*;
pub use self::errors::{Error, Result};
pub use self::packet::Signature;
