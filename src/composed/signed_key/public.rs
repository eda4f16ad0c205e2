use std::io;

use crate::armor::{self, ArmorOptions, BlockType};
use crate::composed::signed_key::shared::{signatures_len, write_signatures, SignedKeyDetails};
use crate::errors::{format_err, Result};
use crate::packet::{packet_len, write_packet, KeyFlags, PublicKey, Signature, SignatureType};
use crate::ser::Serialize;
use crate::types::{Fingerprint, KeyId, Tag};

/// Represents a Public PGP key, which is signed and either received or ready to be transferred.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct SignedPublicKey {
    pub primary_key: PublicKey,
    pub details: SignedKeyDetails,
    pub public_subkeys: Vec<SignedPublicSubKey>,
}

impl SignedPublicKey {
    pub fn new(
        primary_key: PublicKey,
        details: SignedKeyDetails,
        public_subkeys: Vec<SignedPublicSubKey>,
    ) -> Self {
        SignedPublicKey {
            primary_key,
            details,
            public_subkeys,
        }
    }

    /// Parses a single armored public key.
    pub fn from_armor_single(input: &str) -> Result<(Self, armor::Headers)> {
        let (keys, headers) = crate::composed::signed_key::from_armor_many(input)?;
        let key = keys
            .into_iter()
            .next()
            .ok_or_else(|| format_err!("no key found"))?;

        Ok((key.into_public(), headers))
    }

    pub fn fingerprint(&self) -> Fingerprint {
        self.primary_key.fingerprint()
    }

    pub fn key_id(&self) -> KeyId {
        self.primary_key.key_id()
    }

    /// The primary key followed by all subkeys.
    pub fn keys(&self) -> impl Iterator<Item = &PublicKey> {
        std::iter::once(&self.primary_key).chain(self.public_subkeys.iter().map(|k| &k.key))
    }

    /// Finds the primary key or subkey with the given key id.
    pub fn find_key(&self, id: &KeyId) -> Option<&PublicKey> {
        self.keys().find(|k| &k.key_id() == id)
    }

    /// Verifies the self signatures.
    pub fn verify(&self) -> Result<()> {
        self.details.verify(&self.primary_key)?;
        for subkey in &self.public_subkeys {
            subkey.verify(&self.primary_key)?;
        }

        Ok(())
    }

    pub fn to_armored_string(&self, opts: ArmorOptions<'_>) -> Result<String> {
        armor::to_armored_string(self, BlockType::PublicKey, opts)
    }
}

impl Serialize for SignedPublicKey {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        write_packet(writer, Tag::PublicKey, &self.primary_key)?;
        self.details.to_writer(writer)?;
        for ps in &self.public_subkeys {
            ps.to_writer(writer)?;
        }

        Ok(())
    }

    fn write_len(&self) -> usize {
        packet_len(self.primary_key.write_len())
            + self.details.write_len()
            + self.public_subkeys.write_len()
    }
}

/// Represents a Public PGP SubKey.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct SignedPublicSubKey {
    pub key: PublicKey,
    pub signatures: Vec<Signature>,
}

impl SignedPublicSubKey {
    pub fn new(key: PublicKey, signatures: Vec<Signature>) -> Self {
        SignedPublicSubKey { key, signatures }
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
            sig.verify_key_binding(primary, &self.key)?;
        }

        Ok(())
    }
}

impl Serialize for SignedPublicSubKey {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        write_packet(writer, Tag::PublicSubkey, &self.key)?;
        write_signatures(writer, &self.signatures)
    }

    fn write_len(&self) -> usize {
        packet_len(self.key.write_len()) + signatures_len(&self.signatures)
    }
}
