use std::io;

use log::warn;

use crate::errors::Result;
use crate::packet::{packet_len, write_packet, PublicKey, Signature, SubpacketData, UserId};
use crate::ser::Serialize;
use crate::types::Tag;

/// A user id together with its certifications.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct SignedUser {
    pub id: UserId,
    pub signatures: Vec<Signature>,
}

impl SignedUser {
    pub fn new(id: UserId, signatures: Vec<Signature>) -> Self {
        SignedUser { id, signatures }
    }

    /// Whether one of the certifications marks this as the primary user id.
    pub fn is_primary(&self) -> bool {
        self.signatures.iter().any(|sig| {
            sig.config
                .hashed_subpackets
                .iter()
                .any(|sp| sp.data == SubpacketData::IsPrimary(true))
        })
    }

    /// Verifies all certifications made by `key` itself.
    pub fn verify(&self, key: &PublicKey) -> Result<()> {
        let own = key.key_id();
        for sig in self
            .signatures
            .iter()
            .filter(|sig| sig.issuer().contains(&own))
        {
            sig.verify_certification(key, key, &self.id)?;
        }
        Ok(())
    }
}

impl Serialize for SignedUser {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        write_packet(writer, Tag::UserId, &self.id)?;
        write_signatures(writer, &self.signatures)
    }

    fn write_len(&self) -> usize {
        packet_len(self.id.write_len()) + signatures_len(&self.signatures)
    }
}

/// Shared details between secret and public keys.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct SignedKeyDetails {
    pub revocation_signatures: Vec<Signature>,
    pub direct_signatures: Vec<Signature>,
    pub users: Vec<SignedUser>,
}

impl SignedKeyDetails {
    pub fn new(
        revocation_signatures: Vec<Signature>,
        direct_signatures: Vec<Signature>,
        mut users: Vec<SignedUser>,
    ) -> Self {
        users.retain(|user| {
            if user.signatures.is_empty() {
                warn!("ignoring unsigned user id {:?}", user.id.id());
                false
            } else {
                true
            }
        });

        SignedKeyDetails {
            revocation_signatures,
            direct_signatures,
            users,
        }
    }

    /// The primary user id, falling back to the first one.
    pub fn primary_user(&self) -> Option<&SignedUser> {
        self.users
            .iter()
            .find(|u| u.is_primary())
            .or_else(|| self.users.first())
    }

    pub fn verify(&self, key: &PublicKey) -> Result<()> {
        for user in &self.users {
            user.verify(key)?;
        }

        Ok(())
    }
}

impl Serialize for SignedKeyDetails {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        write_signatures(writer, &self.revocation_signatures)?;
        write_signatures(writer, &self.direct_signatures)?;
        for user in &self.users {
            user.to_writer(writer)?;
        }

        Ok(())
    }

    fn write_len(&self) -> usize {
        signatures_len(&self.revocation_signatures)
            + signatures_len(&self.direct_signatures)
            + self.users.write_len()
    }
}

pub(crate) fn write_signatures<W: io::Write>(writer: &mut W, sigs: &[Signature]) -> Result<()> {
    for sig in sigs {
        write_packet(writer, Tag::Signature, sig)?;
    }
    Ok(())
}

pub(crate) fn signatures_len(sigs: &[Signature]) -> usize {
    sigs.iter().map(|sig| packet_len(sig.write_len())).sum()
}
