//! # Packet module
//!
//! Parsing and serialization of the individual OpenPGP packets, see
//! [RFC 4880](https://www.rfc-editor.org/rfc/rfc4880.html#section-5).
//!
//! Only version 4 keys and signatures and version 3 session key packets are
//! interpreted. Packets we do not understand are kept as [`Packet::Other`].

mod compressed_data;
mod header;
mod key;
mod literal_data;
mod many;
mod one_pass_signature;
mod packet_sum;
mod public_key_encrypted_session_key;
mod signature;
mod sym_encrypted_protected_data;
mod user_id;

pub use self::compressed_data::CompressedData;
pub use self::header::{packet_len, write_packet, PacketHeader, PacketHeaderVersion};
pub use self::key::{PublicKey, SecretKey};
pub use self::literal_data::{DataMode, LiteralData};
pub use self::many::PacketParser;
pub use self::one_pass_signature::OnePassSignature;
pub use self::packet_sum::Packet;
pub use self::public_key_encrypted_session_key::{PlainSessionKey, PublicKeyEncryptedSessionKey};
pub use self::signature::{
    KeyFlags, Signature, SignatureConfig, SignatureConfigBuilder, SignatureType, Subpacket,
    SubpacketData, SubpacketType,
};
pub use self::sym_encrypted_protected_data::SymEncryptedProtectedData;
pub use self::user_id::UserId;
