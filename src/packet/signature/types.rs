use std::io;

use byteorder::{BigEndian, WriteBytesExt};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use digest::DynDigest;
use log::debug;
use num_enum::{FromPrimitive, IntoPrimitive};

use crate::crypto::hash::HashAlgorithm;
use crate::crypto::public_key::PublicKeyAlgorithm;
use crate::errors::{ensure, unsupported_err, Result};
use crate::packet::{KeyFlags, PublicKey, Subpacket, SubpacketData, UserId};
use crate::parsing::BufParsing;
use crate::ser::Serialize;
use crate::types::{KeyId, Mpi};

use super::config::{hash_certification, hash_key_binding, SignatureConfig};

/// Signature Packet, version 4.
/// <https://www.rfc-editor.org/rfc/rfc4880.html#section-5.2>
#[derive(Clone, PartialEq, Eq, derive_more::Debug)]
pub struct Signature {
    pub config: SignatureConfig,
    #[debug("{}", hex::encode(signed_hash_value))]
    pub signed_hash_value: [u8; 2],
    /// The algorithm specific signature values, as encoded on the wire.
    #[debug("{}", hex::encode(signature))]
    pub signature: Bytes,
}

impl Signature {
    pub fn from_config(config: SignatureConfig, signed_hash_value: [u8; 2], signature: Bytes) -> Self {
        Signature {
            config,
            signed_hash_value,
            signature,
        }
    }

    /// Parses a `Signature` packet body.
    pub fn from_buf(mut i: Bytes) -> Result<Self> {
        let version = i.read_u8()?;
        if version != 4 {
            unsupported_err!("signature version {}", version);
        }
        let typ = SignatureType::from(i.read_u8()?);
        let pub_alg = PublicKeyAlgorithm::from(i.read_u8()?);
        let hash_alg = HashAlgorithm::from(i.read_u8()?);

        let hashed_len = i.read_be_u16()?;
        let hashed_subpackets = Subpacket::parse_area(i.read_take(hashed_len.into())?)?;
        let unhashed_len = i.read_be_u16()?;
        let unhashed_subpackets = Subpacket::parse_area(i.read_take(unhashed_len.into())?)?;

        let signed_hash_value = i.read_array::<2>()?;
        let signature = i.rest();

        Ok(Signature {
            config: SignatureConfig {
                typ,
                pub_alg,
                hash_alg,
                hashed_subpackets,
                unhashed_subpackets,
            },
            signed_hash_value,
            signature,
        })
    }

    pub fn typ(&self) -> SignatureType {
        self.config.typ
    }

    pub fn hash_alg(&self) -> HashAlgorithm {
        self.config.hash_alg
    }

    pub fn pub_alg(&self) -> PublicKeyAlgorithm {
        self.config.pub_alg
    }

    /// All issuer key ids this signature names.
    pub fn issuer(&self) -> Vec<KeyId> {
        self.config.issuer()
    }

    pub fn created(&self) -> Option<&DateTime<Utc>> {
        self.config.created()
    }

    /// Key flags, if the hashed area carries them.
    pub fn key_flags(&self) -> Option<KeyFlags> {
        self.config
            .hashed_subpackets
            .iter()
            .find_map(|sp| match &sp.data {
                SubpacketData::KeyFlags(flags) => Some(KeyFlags::from(&flags[..])),
                _ => None,
            })
    }

    /// Verify this signature over the given data.
    pub fn verify(&self, key: &PublicKey, data: &[u8]) -> Result<()> {
        ensure!(
            matches!(self.typ(), SignatureType::Binary | SignatureType::Text),
            "not a document signature: {:?}",
            self.typ()
        );

        let mut hasher = self.config.hash_alg.new_hasher()?;
        self.config.hash_data(&mut hasher, data);
        self.verify_hashed(key, hasher)
    }

    /// Verifies a certification signature over `primary` and `id`.
    pub fn verify_certification(&self, key: &PublicKey, primary: &PublicKey, id: &UserId) -> Result<()> {
        ensure!(
            self.typ().is_certification(),
            "not a certification: {:?}",
            self.typ()
        );

        let mut hasher = self.config.hash_alg.new_hasher()?;
        hash_certification(&mut hasher, primary, id)?;
        self.verify_hashed(key, hasher)
    }

    /// Verifies a subkey binding signature made by `primary`.
    pub fn verify_key_binding(&self, primary: &PublicKey, subkey: &PublicKey) -> Result<()> {
        ensure!(
            matches!(self.typ(), SignatureType::SubkeyBinding | SignatureType::KeyBinding),
            "not a key binding: {:?}",
            self.typ()
        );

        let mut hasher = self.config.hash_alg.new_hasher()?;
        hash_key_binding(&mut hasher, primary, subkey)?;
        self.verify_hashed(primary, hasher)
    }

    fn verify_hashed(&self, key: &PublicKey, mut hasher: Box<dyn DynDigest>) -> Result<()> {
        debug!("verifying {:?} signature with {:?}", self.typ(), key.key_id());
        ensure!(
            self.config.pub_alg == key.algorithm(),
            "signature algorithm {:?} does not match key algorithm {:?}",
            self.config.pub_alg,
            key.algorithm()
        );

        let len = self.config.hash_signature_data(&mut hasher)?;
        hasher.update(&self.config.trailer(len));
        let hash = hasher.finalize();

        ensure!(
            hash[..2] == self.signed_hash_value,
            "signature: invalid signed hash value"
        );

        let mut sig = self.signature.clone();
        let value = Mpi::from_buf(&mut sig)?;
        crate::crypto::rsa::verify(&key.rsa_public_key()?, self.config.hash_alg, &hash, &value)
    }
}

impl Serialize for Signature {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&[
            4,
            self.config.typ.into(),
            self.config.pub_alg.into(),
            self.config.hash_alg.into(),
        ])?;

        writer.write_u16::<BigEndian>(self.config.hashed_subpackets.write_len().try_into()?)?;
        self.config.hashed_subpackets.to_writer(writer)?;
        writer.write_u16::<BigEndian>(self.config.unhashed_subpackets.write_len().try_into()?)?;
        self.config.unhashed_subpackets.to_writer(writer)?;

        writer.write_all(&self.signed_hash_value)?;
        writer.write_all(&self.signature)?;

        Ok(())
    }

    fn write_len(&self) -> usize {
        4 + 2
            + self.config.hashed_subpackets.write_len()
            + 2
            + self.config.unhashed_subpackets.write_len()
            + 2
            + self.signature.len()
    }
}

/// Signature types
/// <https://www.rfc-editor.org/rfc/rfc4880.html#section-5.2.1>
#[derive(Debug, PartialEq, Eq, Copy, Clone, FromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum SignatureType {
    /// Signature of a binary document.
    Binary = 0x00,
    /// Signature of a canonical text document, line endings are hashed as `<CR><LF>`.
    Text = 0x01,
    Standalone = 0x02,
    CertGeneric = 0x10,
    CertPersona = 0x11,
    CertCasual = 0x12,
    CertPositive = 0x13,
    SubkeyBinding = 0x18,
    KeyBinding = 0x19,
    Key = 0x1F,
    KeyRevocation = 0x20,
    SubkeyRevocation = 0x28,
    CertRevocation = 0x30,
    Timestamp = 0x40,
    ThirdParty = 0x50,

    #[num_enum(catch_all)]
    Other(u8),
}

impl SignatureType {
    pub fn is_certification(self) -> bool {
        matches!(
            self,
            SignatureType::CertGeneric
                | SignatureType::CertPersona
                | SignatureType::CertCasual
                | SignatureType::CertPositive
        )
    }
}
