use std::io::Write;

use byteorder::{BigEndian, WriteBytesExt};
use chrono::{DateTime, SubsecRound, Utc};
use derive_builder::Builder;
use digest::DynDigest;
use log::debug;

use crate::crypto::hash::{HashAlgorithm, WriteHasher};
use crate::crypto::public_key::PublicKeyAlgorithm;
use crate::errors::{ensure, Error, Result};
use crate::packet::{PublicKey, SecretKey, Signature, SignatureType, Subpacket, SubpacketData, UserId};
use crate::ser::Serialize;
use crate::types::KeyId;

/// Everything a version 4 signature commits to, apart from the signed data.
#[derive(Debug, Clone, PartialEq, Eq, Builder)]
#[builder(build_fn(error = "Error"))]
pub struct SignatureConfig {
    pub typ: SignatureType,
    pub pub_alg: PublicKeyAlgorithm,
    #[builder(default)]
    pub hash_alg: HashAlgorithm,

    #[builder(default)]
    pub hashed_subpackets: Vec<Subpacket>,
    #[builder(default)]
    pub unhashed_subpackets: Vec<Subpacket>,
}

impl SignatureConfig {
    pub fn new_v4(typ: SignatureType, pub_alg: PublicKeyAlgorithm, hash_alg: HashAlgorithm) -> Self {
        SignatureConfig {
            typ,
            pub_alg,
            hash_alg,
            hashed_subpackets: Vec::new(),
            unhashed_subpackets: Vec::new(),
        }
    }

    /// Adds the subpackets every signature made here carries: creation time
    /// and issuer fingerprint hashed, issuer key id unhashed.
    pub fn with_issuer(mut self, key: &PublicKey, created: DateTime<Utc>) -> Self {
        let fingerprint = key.fingerprint();
        self.hashed_subpackets.insert(
            0,
            Subpacket::regular(SubpacketData::SignatureCreationTime(created.trunc_subsecs(0))),
        );
        self.hashed_subpackets
            .push(Subpacket::regular(SubpacketData::IssuerFingerprint(fingerprint)));
        self.unhashed_subpackets
            .push(Subpacket::regular(SubpacketData::Issuer(fingerprint.key_id())));
        self
    }

    /// Sign the given data.
    pub fn sign(self, key: &SecretKey, data: &[u8]) -> Result<Signature> {
        ensure!(
            matches!(self.typ, SignatureType::Binary | SignatureType::Text),
            "can not sign {:?} as data",
            self.typ
        );

        let mut hasher = self.hash_alg.new_hasher()?;
        self.hash_data(&mut hasher, data);
        self.finalize(key, hasher)
    }

    /// Create a certification signature over a user id.
    pub fn sign_certification(
        self,
        key: &SecretKey,
        primary: &PublicKey,
        id: &UserId,
    ) -> Result<Signature> {
        ensure!(
            self.typ.is_certification(),
            "can not sign non certificate as certificate"
        );
        debug!("signing certification {:?}", self.typ);

        let mut hasher = self.hash_alg.new_hasher()?;
        hash_certification(&mut hasher, primary, id)?;
        self.finalize(key, hasher)
    }

    /// Create a key binding signature.
    pub fn sign_key_binding(
        self,
        key: &SecretKey,
        primary: &PublicKey,
        subkey: &PublicKey,
    ) -> Result<Signature> {
        ensure!(
            matches!(self.typ, SignatureType::SubkeyBinding | SignatureType::KeyBinding),
            "can not sign {:?} as key binding",
            self.typ
        );
        debug!("signing key binding {:?}", self.typ);

        let mut hasher = self.hash_alg.new_hasher()?;
        hash_key_binding(&mut hasher, primary, subkey)?;
        self.finalize(key, hasher)
    }

    fn finalize(self, key: &SecretKey, mut hasher: Box<dyn DynDigest>) -> Result<Signature> {
        let len = self.hash_signature_data(&mut hasher)?;
        hasher.update(&self.trailer(len));
        let hash = hasher.finalize();

        let signed_hash_value = [hash[0], hash[1]];
        let priv_key = key.rsa_private_key()?;
        let signature = crate::crypto::rsa::sign(&priv_key, self.hash_alg, &hash)?;

        Ok(Signature::from_config(self, signed_hash_value, signature.to_bytes()?.into()))
    }

    /// Hashes the signed document, text documents with normalized line endings.
    pub(crate) fn hash_data(&self, hasher: &mut Box<dyn DynDigest>, data: &[u8]) {
        match self.typ {
            SignatureType::Text => hasher.update(&normalize_lines(data)),
            _ => hasher.update(data),
        }
    }

    /// Hashes the signature fields and the hashed subpackets, returning the
    /// number of bytes hashed.
    pub(crate) fn hash_signature_data(&self, hasher: &mut Box<dyn DynDigest>) -> Result<usize> {
        let mut res: Vec<u8> = vec![
            4,
            self.typ.into(),
            self.pub_alg.into(),
            self.hash_alg.into(),
        ];
        let hashed = self.hashed_subpackets.to_bytes()?;
        res.write_u16::<BigEndian>(hashed.len().try_into()?)?;
        res.extend(hashed);

        hasher.update(&res);

        Ok(res.len())
    }

    pub(crate) fn trailer(&self, len: usize) -> Vec<u8> {
        let mut trailer = vec![0x04, 0xFF, 0, 0, 0, 0];
        trailer[2..].copy_from_slice(&(len as u32).to_be_bytes());
        trailer
    }

    /// Returns the issuer key ids, from the issuer and issuer fingerprint subpackets.
    pub fn issuer(&self) -> Vec<KeyId> {
        self.hashed_subpackets
            .iter()
            .chain(self.unhashed_subpackets.iter())
            .filter_map(|sp| match &sp.data {
                SubpacketData::Issuer(id) => Some(*id),
                SubpacketData::IssuerFingerprint(fp) => Some(fp.key_id()),
                _ => None,
            })
            .collect()
    }

    /// Returns the creation time, if present in the hashed area.
    pub fn created(&self) -> Option<&DateTime<Utc>> {
        self.hashed_subpackets.iter().find_map(|sp| match &sp.data {
            SubpacketData::SignatureCreationTime(t) => Some(t),
            _ => None,
        })
    }
}

pub(crate) fn hash_certification(
    hasher: &mut Box<dyn DynDigest>,
    primary: &PublicKey,
    id: &UserId,
) -> Result<()> {
    primary.write_fingerprint_prefix(&mut WriteHasher(&mut *hasher))?;

    let mut prefix = vec![0xB4];
    prefix.write_u32::<BigEndian>(id.write_len().try_into()?)?;
    hasher.update(&prefix);
    hasher.update(id.as_bytes());
    Ok(())
}

pub(crate) fn hash_key_binding(
    hasher: &mut Box<dyn DynDigest>,
    primary: &PublicKey,
    subkey: &PublicKey,
) -> Result<()> {
    let mut w = WriteHasher(&mut *hasher);
    primary.write_fingerprint_prefix(&mut w)?;
    subkey.write_fingerprint_prefix(&mut w)?;
    w.flush()?;
    Ok(())
}

/// Converts all line endings to `<CR><LF>`.
pub(crate) fn normalize_lines(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    let mut iter = data.iter().peekable();
    while let Some(&b) = iter.next() {
        match b {
            b'\r' => {
                if iter.peek() == Some(&&b'\n') {
                    iter.next();
                }
                out.extend_from_slice(b"\r\n");
            }
            b'\n' => out.extend_from_slice(b"\r\n"),
            b => out.push(b),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_lines() {
        assert_eq!(normalize_lines(b"a\nb\r\nc\rd"), b"a\r\nb\r\nc\r\nd".to_vec());
        assert_eq!(normalize_lines(b""), Vec::<u8>::new());
    }

    #[test]
    fn test_trailer() {
        let config = SignatureConfig::new_v4(
            SignatureType::Binary,
            PublicKeyAlgorithm::RSA,
            HashAlgorithm::Sha256,
        );
        assert_eq!(config.trailer(0x0106), vec![4, 0xff, 0, 0, 1, 6]);
    }

    #[test]
    fn test_builder() {
        let config = SignatureConfigBuilder::default()
            .typ(SignatureType::Text)
            .pub_alg(PublicKeyAlgorithm::RSA)
            .build()
            .unwrap();
        assert_eq!(config.hash_alg, HashAlgorithm::Sha256);
        assert!(config.issuer().is_empty());

        assert!(SignatureConfigBuilder::default().build().is_err());
    }
}
