//! Transferable keys, messages and detached signatures, composed from packets.

mod key;
mod message;
mod ring;
mod signature;
mod signed_key;

pub use self::key::*;
pub use self::message::{DecryptedMessage, Message};
pub use self::ring::KeyRing;
pub use self::signature::DetachedSignature;
pub use self::signed_key::*;
