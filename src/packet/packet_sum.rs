use std::io;

use bytes::Bytes;
use log::debug;

use crate::errors::Result;
use crate::packet::{
    write_packet, CompressedData, LiteralData, OnePassSignature, PublicKey,
    PublicKeyEncryptedSessionKey, SecretKey, Signature, SymEncryptedProtectedData, UserId,
};
use crate::ser::Serialize;
use crate::types::Tag;

/// Represents a Packet. A packet is the record structure used to encode a chunk of data in OpenPGP.
/// Ref: <https://www.rfc-editor.org/rfc/rfc4880.html#section-4>
#[derive(derive_more::Debug, PartialEq, Eq, Clone)]
#[allow(clippy::large_enum_variant)]
pub enum Packet {
    CompressedData(CompressedData),
    PublicKey(PublicKey),
    PublicSubkey(PublicKey),
    SecretKey(SecretKey),
    SecretSubkey(SecretKey),
    LiteralData(LiteralData),
    OnePassSignature(OnePassSignature),
    PublicKeyEncryptedSessionKey(PublicKeyEncryptedSessionKey),
    Signature(Signature),
    SymEncryptedProtectedData(SymEncryptedProtectedData),
    UserId(UserId),
    /// Any packet we carry along without interpreting it.
    Other {
        tag: Tag,
        #[debug("{} bytes", body.len())]
        body: Bytes,
    },
}

impl Packet {
    /// Interprets the body of a packet with the given tag.
    pub fn from_parts(tag: Tag, body: Bytes) -> Result<Self> {
        debug!("parsing packet {:?} ({} bytes)", tag, body.len());

        let packet = match tag {
            Tag::CompressedData => Packet::CompressedData(CompressedData::from_buf(body)?),
            Tag::PublicKey => Packet::PublicKey(PublicKey::from_buf(&mut body.clone())?),
            Tag::PublicSubkey => Packet::PublicSubkey(PublicKey::from_buf(&mut body.clone())?),
            Tag::SecretKey => Packet::SecretKey(SecretKey::from_buf(&mut body.clone())?),
            Tag::SecretSubkey => Packet::SecretSubkey(SecretKey::from_buf(&mut body.clone())?),
            Tag::LiteralData => Packet::LiteralData(LiteralData::from_buf(body)?),
            Tag::OnePassSignature => Packet::OnePassSignature(OnePassSignature::from_buf(body)?),
            Tag::PublicKeyEncryptedSessionKey => {
                Packet::PublicKeyEncryptedSessionKey(PublicKeyEncryptedSessionKey::from_buf(body)?)
            }
            Tag::Signature => Packet::Signature(Signature::from_buf(body)?),
            Tag::SymEncryptedProtectedData => {
                Packet::SymEncryptedProtectedData(SymEncryptedProtectedData::from_buf(body)?)
            }
            Tag::UserId => Packet::UserId(UserId::from_bytes(body)),
            tag => Packet::Other { tag, body },
        };

        Ok(packet)
    }

    pub fn tag(&self) -> Tag {
        match self {
            Self::CompressedData(_) => Tag::CompressedData,
            Self::PublicKey(_) => Tag::PublicKey,
            Self::PublicSubkey(_) => Tag::PublicSubkey,
            Self::SecretKey(_) => Tag::SecretKey,
            Self::SecretSubkey(_) => Tag::SecretSubkey,
            Self::LiteralData(_) => Tag::LiteralData,
            Self::OnePassSignature(_) => Tag::OnePassSignature,
            Self::PublicKeyEncryptedSessionKey(_) => Tag::PublicKeyEncryptedSessionKey,
            Self::Signature(_) => Tag::Signature,
            Self::SymEncryptedProtectedData(_) => Tag::SymEncryptedProtectedData,
            Self::UserId(_) => Tag::UserId,
            Self::Other { tag, .. } => *tag,
        }
    }
}

impl Serialize for Packet {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        let tag = self.tag();
        match self {
            Self::CompressedData(p) => write_packet(writer, tag, p),
            Self::PublicKey(p) | Self::PublicSubkey(p) => write_packet(writer, tag, p),
            Self::SecretKey(p) | Self::SecretSubkey(p) => write_packet(writer, tag, p),
            Self::LiteralData(p) => write_packet(writer, tag, p),
            Self::OnePassSignature(p) => write_packet(writer, tag, p),
            Self::PublicKeyEncryptedSessionKey(p) => write_packet(writer, tag, p),
            Self::Signature(p) => write_packet(writer, tag, p),
            Self::SymEncryptedProtectedData(p) => write_packet(writer, tag, p),
            Self::UserId(p) => write_packet(writer, tag, p),
            Self::Other { body, .. } => write_packet(writer, tag, &RawBody(body)),
        }
    }

    fn write_len(&self) -> usize {
        let body_len = match self {
            Self::CompressedData(p) => p.write_len(),
            Self::PublicKey(p) | Self::PublicSubkey(p) => p.write_len(),
            Self::SecretKey(p) | Self::SecretSubkey(p) => p.write_len(),
            Self::LiteralData(p) => p.write_len(),
            Self::OnePassSignature(p) => p.write_len(),
            Self::PublicKeyEncryptedSessionKey(p) => p.write_len(),
            Self::Signature(p) => p.write_len(),
            Self::SymEncryptedProtectedData(p) => p.write_len(),
            Self::UserId(p) => p.write_len(),
            Self::Other { body, .. } => body.len(),
        };
        crate::packet::packet_len(body_len)
    }
}

struct RawBody<'a>(&'a Bytes);

impl Serialize for RawBody<'_> {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(self.0)?;
        Ok(())
    }

    fn write_len(&self) -> usize {
        self.0.len()
    }
}
