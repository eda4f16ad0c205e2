use bytes::Bytes;
use chrono::SubsecRound;
use derive_builder::Builder;
use log::debug;
use rand::{CryptoRng, Rng};

use crate::composed::{SignedKeyDetails, SignedSecretKey, SignedSecretSubKey, SignedUser};
use crate::crypto::hash::HashAlgorithm;
use crate::crypto::public_key::PublicKeyAlgorithm;
use crate::crypto::rsa;
use crate::crypto::sym::SymmetricKeyAlgorithm;
use crate::errors::{Error, Result};
use crate::packet::{
    KeyFlags, PublicKey, SecretKey, SignatureConfig, SignatureType, Subpacket, SubpacketData,
    UserId,
};
use crate::types::{CompressionAlgorithm, PlainSecretParams, PublicParams};

/// Smallest RSA modulus accepted for new keys.
pub const MIN_RSA_BITS: u32 = 2048;

/// Parameters for a new key: a certify and sign primary key with a single
/// user id, plus an encryption subkey of the same type.
#[derive(Debug, PartialEq, Eq, Builder)]
#[builder(build_fn(error = "Error", validate = "Self::validate"))]
pub struct KeyParams {
    key_type: KeyType,

    #[builder(setter(into))]
    primary_user_id: String,

    #[builder(default = "vec![SymmetricKeyAlgorithm::AES256, SymmetricKeyAlgorithm::AES192, SymmetricKeyAlgorithm::AES128]")]
    preferred_symmetric_algorithms: Vec<SymmetricKeyAlgorithm>,
    #[builder(default = "vec![HashAlgorithm::Sha256, HashAlgorithm::Sha384, HashAlgorithm::Sha512, HashAlgorithm::Sha224]")]
    preferred_hash_algorithms: Vec<HashAlgorithm>,
    #[builder(default = "vec![CompressionAlgorithm::ZLIB, CompressionAlgorithm::ZIP, CompressionAlgorithm::Uncompressed]")]
    preferred_compression_algorithms: Vec<CompressionAlgorithm>,

    #[builder(default = "chrono::Utc::now().trunc_subsecs(0)")]
    created_at: chrono::DateTime<chrono::Utc>,
}

impl KeyParamsBuilder {
    fn validate(&self) -> std::result::Result<(), String> {
        if let Some(KeyType::Rsa(size)) = &self.key_type {
            if *size < MIN_RSA_BITS {
                return Err("Keys with less than 2048bits are considered insecure".into());
            }
        }
        if let Some(id) = &self.primary_user_id {
            if id.is_empty() {
                return Err("missing user id".into());
            }
        }

        Ok(())
    }
}

impl KeyParams {
    pub fn generate<R: Rng + CryptoRng>(self, mut rng: R) -> Result<SignedSecretKey> {
        debug!("generating {:?} key for {:?}", self.key_type, self.primary_user_id);
        let algorithm = self.key_type.to_alg();

        let (public_params, secret_params) = self.key_type.generate(&mut rng)?;
        let primary_key = SecretKey::new(
            PublicKey::new(algorithm, self.created_at, public_params),
            secret_params,
        );
        let (public_params, secret_params) = self.key_type.generate(&mut rng)?;
        let subkey = SecretKey::new(
            PublicKey::new(algorithm, self.created_at, public_params),
            secret_params,
        );

        let user_id = UserId::from_str(&self.primary_user_id);
        let mut config = SignatureConfig::new_v4(
            SignatureType::CertPositive,
            algorithm,
            HashAlgorithm::Sha256,
        );
        config.hashed_subpackets = vec![
            key_flags(KeyFlags::CERTIFY | KeyFlags::SIGN),
            Subpacket::regular(SubpacketData::PreferredSymmetricAlgorithms(
                self.preferred_symmetric_algorithms,
            )),
            Subpacket::regular(SubpacketData::PreferredHashAlgorithms(
                self.preferred_hash_algorithms,
            )),
            Subpacket::regular(SubpacketData::PreferredCompressionAlgorithms(
                self.preferred_compression_algorithms,
            )),
            // modification detection
            Subpacket::regular(SubpacketData::Features(Bytes::from_static(&[0x01]))),
            Subpacket::regular(SubpacketData::IsPrimary(true)),
        ];
        let certification = config
            .with_issuer(primary_key.public_key(), self.created_at)
            .sign_certification(&primary_key, primary_key.public_key(), &user_id)?;

        let mut config = SignatureConfig::new_v4(
            SignatureType::SubkeyBinding,
            algorithm,
            HashAlgorithm::Sha256,
        );
        config.hashed_subpackets = vec![key_flags(
            KeyFlags::ENCRYPT_COMMS | KeyFlags::ENCRYPT_STORAGE,
        )];
        let binding = config
            .with_issuer(primary_key.public_key(), self.created_at)
            .sign_key_binding(&primary_key, primary_key.public_key(), subkey.public_key())?;

        Ok(SignedSecretKey::new(
            primary_key,
            SignedKeyDetails::new(
                Vec::new(),
                Vec::new(),
                vec![SignedUser::new(user_id, vec![certification])],
            ),
            Vec::new(),
            vec![SignedSecretSubKey::new(subkey, vec![binding])],
        ))
    }
}

fn key_flags(bits: u8) -> Subpacket {
    Subpacket::regular(SubpacketData::KeyFlags(Bytes::copy_from_slice(&[bits])))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyType {
    /// RSA with the given modulus size in bits.
    Rsa(u32),
}

impl KeyType {
    pub fn to_alg(self) -> PublicKeyAlgorithm {
        match self {
            KeyType::Rsa(_) => PublicKeyAlgorithm::RSA,
        }
    }

    pub fn generate<R: Rng + CryptoRng>(
        self,
        rng: &mut R,
    ) -> Result<(PublicParams, PlainSecretParams)> {
        match self {
            KeyType::Rsa(bit_size) => rsa::generate_key(rng, bit_size as usize),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};
    use pretty_assertions::assert_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::ser::Serialize;

    fn params(bits: u32) -> Result<KeyParams> {
        KeyParamsBuilder::default()
            .key_type(KeyType::Rsa(bits))
            .primary_user_id("Test User (testing) <test@example.com>")
            .created_at(DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap())
            .build()
    }

    #[test]
    #[ignore] // slow in debug mode
    fn test_key_gen_rsa_2048() {
        let _ = pretty_env_logger::try_init();
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        let key = params(2048).unwrap().generate(&mut rng).unwrap();
        assert_eq!(key.bits(), Some(2048));
        assert_eq!(key.secret_subkeys.len(), 1);
        assert_eq!(key.secret_subkeys[0].key.public_key().bits(), Some(2048));
        key.verify().unwrap();

        let user = key.details.primary_user().unwrap();
        assert_eq!(user.id.id(), "Test User (testing) <test@example.com>");
        assert!(user.is_primary());

        let cert = &user.signatures[0];
        assert_eq!(cert.typ(), SignatureType::CertPositive);
        assert_eq!(
            cert.key_flags(),
            Some(KeyFlags::from_bits(KeyFlags::CERTIFY | KeyFlags::SIGN))
        );
        assert_eq!(cert.issuer(), vec![key.key_id(), key.key_id()]);
        assert!(cert.config.hashed_subpackets.iter().any(|sp| sp.data
            == SubpacketData::PreferredHashAlgorithms(vec![
                HashAlgorithm::Sha256,
                HashAlgorithm::Sha384,
                HashAlgorithm::Sha512,
                HashAlgorithm::Sha224,
            ])));

        let binding = &key.secret_subkeys[0].signatures[0];
        assert_eq!(binding.typ(), SignatureType::SubkeyBinding);
        assert!(key.secret_subkeys[0].key_flags().encrypt());

        let bytes = key.to_bytes().unwrap();
        assert_eq!(SignedSecretKey::from_bytes(bytes).unwrap(), key);
    }

    #[test]
    fn test_key_gen_deterministic() {
        // constructed directly, the builder does not accept 1024 bits
        let params = || KeyParams {
            key_type: KeyType::Rsa(1024),
            primary_user_id: "Small <small@example.com>".into(),
            preferred_symmetric_algorithms: vec![SymmetricKeyAlgorithm::AES256],
            preferred_hash_algorithms: vec![HashAlgorithm::Sha256],
            preferred_compression_algorithms: vec![CompressionAlgorithm::Uncompressed],
            created_at: DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap(),
        };

        let a = params()
            .generate(ChaCha8Rng::seed_from_u64(7))
            .unwrap();
        let b = params()
            .generate(ChaCha8Rng::seed_from_u64(7))
            .unwrap();
        assert_eq!(a.to_bytes().unwrap(), b.to_bytes().unwrap());
        a.verify().unwrap();
        assert_ne!(a.key_id(), a.secret_subkeys[0].key.public_key().key_id());
    }

    #[test]
    fn test_builder_rejects_small_keys() {
        assert!(params(2047).is_err());
        assert!(params(2048).is_ok());
        assert!(KeyParamsBuilder::default()
            .key_type(KeyType::Rsa(2048))
            .build()
            .is_err());
        assert!(KeyParamsBuilder::default()
            .key_type(KeyType::Rsa(2048))
            .primary_user_id("")
            .build()
            .is_err());
    }
}
