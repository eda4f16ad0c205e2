use std::io;

use crate::armor::{self, ArmorOptions, BlockType};
use crate::composed::signed_key::shared::{signatures_len, write_signatures, SignedKeyDetails};
use crate::composed::signed_key::{SignedPublicKey, SignedPublicSubKey};
use crate::errors::{format_err, Result};
use crate::packet::{packet_len, write_packet, KeyFlags, PublicKey, SecretKey, Signature, SignatureType};
use crate::ser::Serialize;
use crate::types::{Fingerprint, KeyId, Tag};

/// Represents a secret signed PGP key.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct SignedSecretKey {
    pub primary_key: SecretKey,
    pub details: SignedKeyDetails,
    pub public_subkeys: Vec<SignedPublicSubKey>,
    pub secret_subkeys: Vec<SignedSecretSubKey>,
}

impl SignedSecretKey {
    pub fn new(
        primary_key: SecretKey,
        details: SignedKeyDetails,
        public_subkeys: Vec<SignedPublicSubKey>,
        secret_subkeys: Vec<SignedSecretSubKey>,
    ) -> Self {
        SignedSecretKey {
            primary_key,
            details,
            public_subkeys,
            secret_subkeys,
        }
    }

    /// Parses a single armored secret key.
    pub fn from_armor_single(input: &str) -> Result<(Self, armor::Headers)> {
        let (keys, headers) = crate::composed::signed_key::from_armor_many(input)?;
        let key = keys
            .into_iter()
            .next()
            .ok_or_else(|| format_err!("no key found"))?
            .into_secret()
            .ok_or_else(|| format_err!("expected a secret key"))?;

        Ok((key, headers))
    }

    /// Parses a single binary secret key.
    pub fn from_bytes(input: impl Into<bytes::Bytes>) -> Result<Self> {
        crate::composed::signed_key::from_bytes_many(input)?
            .into_iter()
            .next()
            .ok_or_else(|| format_err!("no key found"))?
            .into_secret()
            .ok_or_else(|| format_err!("expected a secret key"))
    }

    pub fn fingerprint(&self) -> Fingerprint {
        self.primary_key.public_key().fingerprint()
    }

    pub fn key_id(&self) -> KeyId {
        self.primary_key.public_key().key_id()
    }

    /// Bit length of the primary key, for RSA keys.
    pub fn bits(&self) -> Option<usize> {
        self.primary_key.public_key().bits()
    }

    /// The primary key followed by all subkeys, public parts only.
    pub fn public_keys(&self) -> impl Iterator<Item = &PublicKey> {
        std::iter::once(self.primary_key.public_key())
            .chain(self.secret_subkeys.iter().map(|k| k.key.public_key()))
            .chain(self.public_subkeys.iter().map(|k| &k.key))
    }

    /// The primary key followed by the secret subkeys.
    pub fn secret_keys(&self) -> impl Iterator<Item = &SecretKey> {
        std::iter::once(&self.primary_key).chain(self.secret_subkeys.iter().map(|k| &k.key))
    }

    /// Finds the primary key or subkey with the given key id.
    pub fn find_public_key(&self, id: &KeyId) -> Option<&PublicKey> {
        self.public_keys().find(|k| &k.key_id() == id)
    }

    /// Verifies the self signatures.
    pub fn verify(&self) -> Result<()> {
        let primary = self.primary_key.public_key();
        self.details.verify(primary)?;
        for subkey in &self.secret_subkeys {
            subkey.verify(primary)?;
        }
        for subkey in &self.public_subkeys {
            subkey.verify(primary)?;
        }

        Ok(())
    }

    /// Strips all secret material.
    pub fn public_key(&self) -> SignedPublicKey {
        let mut public_subkeys: Vec<SignedPublicSubKey> = self
            .secret_subkeys
            .iter()
            .map(SignedSecretSubKey::public_key)
            .collect();
        public_subkeys.extend(self.public_subkeys.iter().cloned());

        SignedPublicKey::new(
            self.primary_key.public_key().clone(),
            self.details.clone(),
            public_subkeys,
        )
    }

    pub fn to_armored_string(&self, opts: ArmorOptions<'_>) -> Result<String> {
        armor::to_armored_string(self, BlockType::PrivateKey, opts)
    }
}

impl Serialize for SignedSecretKey {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        write_packet(writer, Tag::SecretKey, &self.primary_key)?;
        self.details.to_writer(writer)?;
        for ps in &self.secret_subkeys {
            ps.to_writer(writer)?;
        }
        for ps in &self.public_subkeys {
            ps.to_writer(writer)?;
        }

        Ok(())
    }

    fn write_len(&self) -> usize {
        packet_len(self.primary_key.write_len())
            + self.details.write_len()
            + self.secret_subkeys.write_len()
            + self.public_subkeys.write_len()
    }
}

/// Represents a composed secret PGP SubKey.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct SignedSecretSubKey {
    pub key: SecretKey,
    pub signatures: Vec<Signature>,
}

impl SignedSecretSubKey {
    pub fn new(key: SecretKey, signatures: Vec<Signature>) -> Self {
        SignedSecretSubKey { key, signatures }
    }

    /// Key flags from the binding signature.
    pub fn key_flags(&self) -> KeyFlags {
        self.signatures
            .iter()
            .find_map(|sig| sig.key_flags())
            .unwrap_or_default()
    }

    pub fn verify(&self, primary: &PublicKey) -> Result<()> {
        for sig in self
            .signatures
            .iter()
            .filter(|sig| sig.typ() == SignatureType::SubkeyBinding)
        {
            sig.verify_key_binding(primary, self.key.public_key())?;
        }

        Ok(())
    }

    pub fn public_key(&self) -> SignedPublicSubKey {
        SignedPublicSubKey::new(self.key.public_key().clone(), self.signatures.clone())
    }
}

impl Serialize for SignedSecretSubKey {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        write_packet(writer, Tag::SecretSubkey, &self.key)?;
        write_signatures(writer, &self.signatures)
    }

    fn write_len(&self) -> usize {
        packet_len(self.key.write_len()) + signatures_len(&self.signatures)
    }
}
