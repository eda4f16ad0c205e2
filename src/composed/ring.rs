use crate::composed::{PublicOrSecret, SignedPublicKey, SignedSecretKey};
use crate::packet::{PublicKey, SecretKey};
use crate::types::KeyId;

/// An ordered collection of entities used to decrypt and verify messages.
///
/// Entities keep their insertion order, so callers can tell which entity
/// resolved a key id by its index.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct KeyRing {
    entities: Vec<PublicOrSecret>,
}

impl KeyRing {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entity, returning its index.
    pub fn push(&mut self, entity: PublicOrSecret) -> usize {
        self.entities.push(entity);
        self.entities.len() - 1
    }

    pub fn push_secret(&mut self, key: SignedSecretKey) -> usize {
        self.push(PublicOrSecret::Secret(key))
    }

    pub fn push_public(&mut self, key: SignedPublicKey) -> usize {
        self.push(PublicOrSecret::Public(key))
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn entities(&self) -> &[PublicOrSecret] {
        &self.entities
    }

    /// All secret keys, primary keys before their subkeys, in entity order.
    pub fn secret_keys(&self) -> impl Iterator<Item = &SecretKey> {
        self.entities
            .iter()
            .filter_map(|entity| match entity {
                PublicOrSecret::Secret(key) => Some(key),
                PublicOrSecret::Public(_) => None,
            })
            .flat_map(|key| key.secret_keys())
    }

    /// Finds a public key by key id, together with the index of the entity
    /// holding it. The first matching entity wins.
    pub fn find_public_key(&self, id: &KeyId) -> Option<(usize, &PublicKey)> {
        self.entities
            .iter()
            .enumerate()
            .find_map(|(idx, entity)| entity.find_public_key(id).map(|key| (idx, key)))
    }
}

impl From<Vec<PublicOrSecret>> for KeyRing {
    fn from(entities: Vec<PublicOrSecret>) -> Self {
        KeyRing { entities }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const TEST_KEY: &str = include_str!("../../tests/fixtures/test-key.asc");
    const SIGNER_KEY: &str = include_str!("../../tests/fixtures/signer-key.pub.asc");

    fn key_id(hex_id: &str) -> KeyId {
        KeyId::from_slice(&hex::decode(hex_id).unwrap()).unwrap()
    }

    #[test]
    fn test_ring_lookup() {
        let (secret, _) = SignedSecretKey::from_armor_single(TEST_KEY).unwrap();
        let (signer, _) = SignedPublicKey::from_armor_single(SIGNER_KEY).unwrap();

        let mut ring = KeyRing::new();
        assert!(ring.is_empty());
        assert_eq!(ring.push_secret(secret), 0);
        assert_eq!(ring.push_public(signer), 1);
        assert_eq!(ring.len(), 2);

        let ids: Vec<KeyId> = ring.secret_keys().map(|k| k.public_key().key_id()).collect();
        assert_eq!(ids, vec![key_id("966a4d775663e063"), key_id("5e4841dcc133b969")]);

        let (idx, _) = ring.find_public_key(&key_id("5e4841dcc133b969")).unwrap();
        assert_eq!(idx, 0);
        let (idx, key) = ring.find_public_key(&key_id("40863282e8c40187")).unwrap();
        assert_eq!(idx, 1);
        assert_eq!(
            format!("{:x}", key.fingerprint()),
            "745233d44745151bc193c60240863282e8c40187"
        );
        assert!(ring.find_public_key(&key_id("0b4146be06e0c927")).is_none());
    }
}
