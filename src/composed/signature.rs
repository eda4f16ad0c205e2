use std::io;

use bytes::Bytes;
use chrono::{DateTime, Utc};

use crate::armor::{self, ArmorOptions, BlockType};
use crate::crypto::hash::HashAlgorithm;
use crate::errors::{bail, format_err, Result};
use crate::packet::{
    packet_len, write_packet, Packet, PacketParser, PublicKey, SecretKey, Signature,
    SignatureConfig, SignatureType,
};
use crate::ser::Serialize;
use crate::types::{KeyId, Tag};

/// An OpenPGP data signature that occurs outside an OpenPGP Message.
///
/// All [DetachedSignature]s are either of type [SignatureType::Binary] or [SignatureType::Text].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetachedSignature {
    pub signature: Signature,
}

impl DetachedSignature {
    pub fn new(signature: Signature) -> Self {
        DetachedSignature { signature }
    }

    /// Create a detached data signature over `data`, with [SignatureType::Binary].
    pub fn sign_binary_data(
        key: &SecretKey,
        hash_algorithm: HashAlgorithm,
        data: &[u8],
        created: DateTime<Utc>,
    ) -> Result<Self> {
        let config = SignatureConfig::new_v4(
            SignatureType::Binary,
            key.public_key().algorithm(),
            hash_algorithm,
        )
        .with_issuer(key.public_key(), created);

        Ok(DetachedSignature::new(config.sign(key, data)?))
    }

    /// Parses a binary signature packet. Exactly one signature is accepted.
    pub fn from_bytes(input: impl Into<Bytes>) -> Result<Self> {
        let mut signature = None;
        for packet in PacketParser::new(input) {
            match packet? {
                Packet::Signature(sig) if signature.is_none() => signature = Some(sig),
                Packet::Other { tag, .. } if tag.is_ignorable() => {}
                packet => bail!("unexpected packet {:?} in detached signature", packet.tag()),
            }
        }

        let signature = signature.ok_or_else(|| format_err!("no signature found"))?;
        match signature.typ() {
            SignatureType::Binary | SignatureType::Text => Ok(DetachedSignature::new(signature)),
            typ => bail!("{:?} is not a data signature", typ),
        }
    }

    /// Parses an armored `PGP SIGNATURE` block.
    pub fn from_armor_single(input: &str) -> Result<(Self, armor::Headers)> {
        let (typ, headers, body) = armor::parse(input)?;
        if typ != BlockType::Signature {
            bail!("unexpected armor block {} when parsing a signature", typ);
        }

        Ok((Self::from_bytes(body)?, headers))
    }

    pub fn to_armored_string(&self, opts: ArmorOptions<'_>) -> Result<String> {
        armor::to_armored_string(self, BlockType::Signature, opts)
    }

    /// Key ids the signature names as its issuer.
    pub fn issuer(&self) -> Vec<KeyId> {
        self.signature.issuer()
    }

    pub fn verify(&self, key: &PublicKey, data: &[u8]) -> Result<()> {
        self.signature.verify(key, data)
    }
}

impl Serialize for DetachedSignature {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        write_packet(writer, Tag::Signature, &self.signature)
    }

    fn write_len(&self) -> usize {
        packet_len(self.signature.write_len())
    }
}
