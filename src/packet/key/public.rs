use std::io;

use byteorder::{BigEndian, WriteBytesExt};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use rsa::RsaPublicKey;
use sha1::{Digest, Sha1};

use crate::crypto::public_key::PublicKeyAlgorithm;
use crate::errors::{unsupported_err, Result};
use crate::parsing::BufParsing;
use crate::ser::Serialize;
use crate::types::{Fingerprint, KeyId, PublicParams};

/// Version 4 public key material, used by both the public key and the
/// public subkey packets.
///
/// Ref: <https://www.rfc-editor.org/rfc/rfc4880.html#section-5.5.2>
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct PublicKey {
    created_at: DateTime<Utc>,
    algorithm: PublicKeyAlgorithm,
    params: PublicParams,
}

impl PublicKey {
    pub fn new(
        algorithm: PublicKeyAlgorithm,
        created_at: DateTime<Utc>,
        params: PublicParams,
    ) -> Self {
        PublicKey {
            created_at,
            algorithm,
            params,
        }
    }

    /// Parses the packet body, leaving whatever follows the public
    /// parameters in `i`.
    pub fn from_buf(i: &mut Bytes) -> Result<Self> {
        let version = i.read_u8()?;
        if version != 4 {
            unsupported_err!("key version {}", version);
        }
        let created = i.read_be_u32()?;
        let created_at = DateTime::from_timestamp(created.into(), 0)
            .ok_or_else(|| crate::errors::format_err!("invalid creation time {}", created))?;
        let algorithm = PublicKeyAlgorithm::from(i.read_u8()?);
        let params = PublicParams::from_buf(algorithm, i)?;

        Ok(PublicKey {
            created_at,
            algorithm,
            params,
        })
    }

    pub fn created_at(&self) -> &DateTime<Utc> {
        &self.created_at
    }

    pub fn algorithm(&self) -> PublicKeyAlgorithm {
        self.algorithm
    }

    pub fn public_params(&self) -> &PublicParams {
        &self.params
    }

    /// Fingerprint: SHA-1 over `0x99 || len || body`.
    pub fn fingerprint(&self) -> Fingerprint {
        let mut hasher = Sha1::new();
        // serializing into a hasher does not fail for valid keys
        let _ = self.write_fingerprint_prefix(&mut hasher);
        let digest: [u8; 20] = hasher.finalize().into();
        Fingerprint::from(digest)
    }

    pub fn key_id(&self) -> KeyId {
        self.fingerprint().key_id()
    }

    /// Writes the key as hashed by fingerprints and key signatures.
    pub(crate) fn write_fingerprint_prefix<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u8(0x99)?;
        writer.write_u16::<BigEndian>(self.write_len().try_into()?)?;
        self.to_writer(writer)
    }

    /// Bit length of the key, for RSA keys.
    pub fn bits(&self) -> Option<usize> {
        self.params.bits()
    }

    pub fn rsa_public_key(&self) -> Result<RsaPublicKey> {
        match self.params.as_rsa() {
            Some(params) => crate::crypto::rsa::public_key(params),
            None => unsupported_err!("public key algorithm {:?}", self.algorithm),
        }
    }
}

impl Serialize for PublicKey {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u8(4)?;
        writer.write_u32::<BigEndian>(self.created_at.timestamp().try_into()?)?;
        writer.write_u8(self.algorithm.into())?;
        self.params.to_writer(writer)?;

        Ok(())
    }

    fn write_len(&self) -> usize {
        1 + 4 + 1 + self.params.write_len()
    }
}
