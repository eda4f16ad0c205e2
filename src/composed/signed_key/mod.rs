mod parse;
mod public;
mod secret;
mod shared;

pub use self::parse::{from_armor_many, from_bytes_many};
pub use self::public::{SignedPublicKey, SignedPublicSubKey};
pub use self::secret::{SignedSecretKey, SignedSecretSubKey};
pub use self::shared::{SignedKeyDetails, SignedUser};

use crate::packet::PublicKey;
use crate::types::{Fingerprint, KeyId};

/// A transferable key, either with or without its secret material.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum PublicOrSecret {
    Public(SignedPublicKey),
    Secret(SignedSecretKey),
}

impl PublicOrSecret {
    pub fn fingerprint(&self) -> Fingerprint {
        match self {
            PublicOrSecret::Public(k) => k.fingerprint(),
            PublicOrSecret::Secret(k) => k.fingerprint(),
        }
    }

    pub fn is_secret(&self) -> bool {
        matches!(self, PublicOrSecret::Secret(_))
    }

    /// Finds the primary key or a subkey by key id.
    pub fn find_public_key(&self, id: &KeyId) -> Option<&PublicKey> {
        match self {
            PublicOrSecret::Public(k) => k.find_key(id),
            PublicOrSecret::Secret(k) => k.find_public_key(id),
        }
    }

    /// Drops the secret material, if any.
    pub fn into_public(self) -> SignedPublicKey {
        match self {
            PublicOrSecret::Public(k) => k,
            PublicOrSecret::Secret(k) => k.public_key(),
        }
    }

    pub fn into_secret(self) -> Option<SignedSecretKey> {
        match self {
            PublicOrSecret::Public(_) => None,
            PublicOrSecret::Secret(k) => Some(k),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::armor::ArmorOptions;
    use crate::ser::Serialize;

    const TEST_KEY: &str = include_str!("../../../tests/fixtures/test-key.asc");
    const TEST_KEY_PUB: &str = include_str!("../../../tests/fixtures/test-key.pub.asc");

    #[test]
    fn test_parse_secret_key() {
        let (key, _headers) = SignedSecretKey::from_armor_single(TEST_KEY).unwrap();

        assert_eq!(
            format!("{:x}", key.fingerprint()),
            "ccbd28b00464a99462aeeb56966a4d775663e063"
        );
        assert_eq!(format!("{:X}", key.key_id()), "966A4D775663E063");
        assert_eq!(key.bits(), Some(2048));
        assert_eq!(key.details.users.len(), 1);
        assert_eq!(
            key.details.primary_user().unwrap().id.id(),
            "Test Key <test@example.com>"
        );
        assert_eq!(key.secret_subkeys.len(), 1);
        assert!(key.secret_subkeys[0].key_flags().encrypt());
        assert_eq!(
            format!("{:X}", key.secret_subkeys[0].key.public_key().key_id()),
            "5E4841DCC133B969"
        );
        assert!(!key.primary_key.is_encrypted());
        key.verify().unwrap();
    }

    #[test]
    fn test_secret_roundtrip() {
        let (key, _) = SignedSecretKey::from_armor_single(TEST_KEY).unwrap();
        let bytes = key.to_bytes().unwrap();
        assert_eq!(bytes.len(), key.write_len());

        let parsed = SignedSecretKey::from_bytes(bytes.clone()).unwrap();
        assert_eq!(parsed, key);
        assert_eq!(parsed.to_bytes().unwrap(), bytes);

        let armored = key.to_armored_string(ArmorOptions::default()).unwrap();
        let (reparsed, _) = SignedSecretKey::from_armor_single(&armored).unwrap();
        assert_eq!(reparsed, key);
    }

    #[test]
    fn test_public_key_matches_export() {
        let (key, _) = SignedSecretKey::from_armor_single(TEST_KEY).unwrap();
        let (public, _) = SignedPublicKey::from_armor_single(TEST_KEY_PUB).unwrap();

        assert_eq!(key.public_key().fingerprint(), public.fingerprint());
        assert_eq!(
            key.public_key().keys().map(|k| k.key_id()).collect::<Vec<_>>(),
            public.keys().map(|k| k.key_id()).collect::<Vec<_>>()
        );
        public.verify().unwrap();

        let id = KeyId::from_slice(&hex::decode("5e4841dcc133b969").unwrap()).unwrap();
        assert!(public.find_key(&id).is_some());
        assert!(key.find_public_key(&id).is_some());
    }

    #[test]
    fn test_public_ring_is_not_secret() {
        let keys = from_armor_many(TEST_KEY_PUB).unwrap().0;
        assert_eq!(keys.len(), 1);
        assert!(!keys[0].is_secret());
        assert!(keys[0].find_public_key(&keys[0].fingerprint().key_id()).is_some());
        assert!(keys.into_iter().next().unwrap().into_secret().is_none());
    }

    #[test]
    fn test_parse_garbage() {
        assert!(from_armor_many("hello").is_err());
        assert!(from_bytes_many(vec![0xcd, 0x01, b'a']).is_err());
        assert!(from_bytes_many(Vec::new()).unwrap().is_empty());
    }
}
