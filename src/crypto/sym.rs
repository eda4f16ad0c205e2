use aes::{Aes128, Aes192, Aes256};
use blowfish::Blowfish;
use cast5::Cast5;
use cfb_mode::{
    cipher::{AsyncStreamCipher, KeyIvInit},
    Decryptor,
};
use des::TdesEde3;
use log::debug;
use num_enum::{FromPrimitive, IntoPrimitive};
use twofish::Twofish;
use zeroize::Zeroizing;

use crate::crypto::checksum;
use crate::errors::{bail, ensure, unimplemented_err, Error, Result};

/// Length of the modification detection code trailer: tag, length and SHA-1.
const MDC_LEN: usize = 22;

/// Available symmetric key algorithms.
/// Ref: <https://www.rfc-editor.org/rfc/rfc4880.html#section-9.2>
#[derive(Debug, PartialEq, Eq, Copy, Clone, FromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum SymmetricKeyAlgorithm {
    /// Plaintext or unencrypted data
    Plaintext = 0,
    /// IDEA
    IDEA = 1,
    /// Triple-DES
    TripleDES = 2,
    /// CAST5
    CAST5 = 3,
    /// Blowfish
    Blowfish = 4,
    /// AES with 128-bit key
    AES128 = 7,
    /// AES with 192-bit key
    AES192 = 8,
    /// AES with 256-bit key
    AES256 = 9,
    /// Twofish with 256-bit key
    Twofish = 10,

    #[num_enum(catch_all)]
    Other(u8),
}

impl zeroize::DefaultIsZeroes for SymmetricKeyAlgorithm {}

#[allow(clippy::derivable_impls)]
impl Default for SymmetricKeyAlgorithm {
    fn default() -> Self {
        Self::AES128
    }
}

impl SymmetricKeyAlgorithm {
    /// The size of a single block in bytes.
    pub fn block_size(self) -> usize {
        match self {
            SymmetricKeyAlgorithm::IDEA
            | SymmetricKeyAlgorithm::TripleDES
            | SymmetricKeyAlgorithm::CAST5
            | SymmetricKeyAlgorithm::Blowfish => 8,
            SymmetricKeyAlgorithm::AES128
            | SymmetricKeyAlgorithm::AES192
            | SymmetricKeyAlgorithm::AES256
            | SymmetricKeyAlgorithm::Twofish => 16,
            SymmetricKeyAlgorithm::Plaintext | SymmetricKeyAlgorithm::Other(_) => 0,
        }
    }

    /// The size of the key in bytes.
    pub const fn key_size(self) -> usize {
        match self {
            SymmetricKeyAlgorithm::IDEA => 16,
            SymmetricKeyAlgorithm::TripleDES => 24,
            SymmetricKeyAlgorithm::CAST5 => 16,
            SymmetricKeyAlgorithm::Blowfish => 16,
            SymmetricKeyAlgorithm::AES128 => 16,
            SymmetricKeyAlgorithm::AES192 => 24,
            SymmetricKeyAlgorithm::AES256 => 32,
            SymmetricKeyAlgorithm::Twofish => 32,
            SymmetricKeyAlgorithm::Plaintext | SymmetricKeyAlgorithm::Other(_) => 0,
        }
    }

    /// Decrypt the data using CFB mode, without padding. Overwrites the input.
    /// This is regular CFB, not OpenPGP CFB.
    pub fn decrypt_with_iv_regular(
        self,
        key: &[u8],
        iv_vec: &[u8],
        ciphertext: &mut [u8],
    ) -> Result<()> {
        match self {
            SymmetricKeyAlgorithm::Plaintext => {
                bail!("'Plaintext' is not a legal cipher for encrypted data")
            }
            SymmetricKeyAlgorithm::TripleDES => {
                Decryptor::<TdesEde3>::new_from_slices(key, iv_vec)?.decrypt(ciphertext);
            }
            SymmetricKeyAlgorithm::CAST5 => {
                Decryptor::<Cast5>::new_from_slices(key, iv_vec)?.decrypt(ciphertext);
            }
            SymmetricKeyAlgorithm::Blowfish => {
                Decryptor::<Blowfish>::new_from_slices(key, iv_vec)?.decrypt(ciphertext);
            }
            SymmetricKeyAlgorithm::AES128 => {
                Decryptor::<Aes128>::new_from_slices(key, iv_vec)?.decrypt(ciphertext);
            }
            SymmetricKeyAlgorithm::AES192 => {
                Decryptor::<Aes192>::new_from_slices(key, iv_vec)?.decrypt(ciphertext);
            }
            SymmetricKeyAlgorithm::AES256 => {
                Decryptor::<Aes256>::new_from_slices(key, iv_vec)?.decrypt(ciphertext);
            }
            SymmetricKeyAlgorithm::Twofish => {
                Decryptor::<Twofish>::new_from_slices(key, iv_vec)?.decrypt(ciphertext);
            }
            SymmetricKeyAlgorithm::IDEA | SymmetricKeyAlgorithm::Other(_) => {
                unimplemented_err!("SymmetricKeyAlgorithm {} is unsupported", u8::from(self))
            }
        }

        Ok(())
    }

    /// Decrypts the body of a version 1 integrity protected data packet.
    ///
    /// Checks the quick check bytes of the random prefix and the trailing
    /// modification detection code, and returns the plaintext between them.
    pub fn decrypt_protected(self, key: &[u8], ciphertext: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        debug!("protected decrypt with {:?}", self);

        let bs = self.block_size();
        ensure!(bs > 0, "invalid block size for {:?}", self);
        ensure!(
            ciphertext.len() >= bs + 2 + MDC_LEN,
            "encrypted data too short: {}",
            ciphertext.len()
        );

        // IV is all zeroes
        let iv_vec = vec![0u8; bs];
        let mut data = Zeroizing::new(ciphertext.to_vec());
        self.decrypt_with_iv_regular(key, &iv_vec, &mut data)?;

        ensure!(
            data[bs - 2..bs] == data[bs..bs + 2],
            "cfb decryption: invalid quick check"
        );

        let mdc_start = data.len() - MDC_LEN;
        if data[mdc_start] != 0xD3 || data[mdc_start + 1] != 0x14 {
            return Err(Error::MdcError);
        }
        checksum::sha1(&data[mdc_start + 2..], &data[..mdc_start + 2])
            .map_err(|_| Error::MdcError)?;

        Ok(Zeroizing::new(data[bs + 2..mdc_start].to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use cfb_mode::Encryptor;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;
    use sha1::{Digest, Sha1};

    use super::*;

    fn encrypt_protected(
        alg: SymmetricKeyAlgorithm,
        key: &[u8],
        rng: &mut ChaCha8Rng,
        plaintext: &[u8],
    ) -> Vec<u8> {
        let bs = alg.block_size();
        let mut data = vec![0u8; bs];
        rng.fill(&mut data[..]);
        data.push(data[bs - 2]);
        data.push(data[bs - 1]);
        data.extend_from_slice(plaintext);
        data.extend_from_slice(&[0xD3, 0x14]);
        let mdc = Sha1::digest(&data);
        data.extend_from_slice(&mdc);

        let iv = vec![0u8; bs];
        match alg {
            SymmetricKeyAlgorithm::AES128 => Encryptor::<Aes128>::new_from_slices(key, &iv)
                .unwrap()
                .encrypt(&mut data),
            SymmetricKeyAlgorithm::AES256 => Encryptor::<Aes256>::new_from_slices(key, &iv)
                .unwrap()
                .encrypt(&mut data),
            SymmetricKeyAlgorithm::CAST5 => Encryptor::<Cast5>::new_from_slices(key, &iv)
                .unwrap()
                .encrypt(&mut data),
            _ => unreachable!(),
        }
        data
    }

    #[test]
    fn test_decrypt_protected() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        for alg in [
            SymmetricKeyAlgorithm::AES128,
            SymmetricKeyAlgorithm::AES256,
            SymmetricKeyAlgorithm::CAST5,
        ] {
            let mut key = vec![0u8; alg.key_size()];
            rng.fill(&mut key[..]);
            let ciphertext = encrypt_protected(alg, &key, &mut rng, b"hello world");

            let plaintext = alg.decrypt_protected(&key, &ciphertext).unwrap();
            assert_eq!(&plaintext[..], b"hello world", "{alg:?}");
        }
    }

    #[test]
    fn test_decrypt_protected_tampered() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let alg = SymmetricKeyAlgorithm::AES128;
        let key = [7u8; 16];
        let mut ciphertext = encrypt_protected(alg, &key, &mut rng, b"hello world");
        let last = ciphertext.len() - 30;
        ciphertext[last] ^= 0x01;

        assert!(alg.decrypt_protected(&key, &ciphertext).is_err());
    }

    #[test]
    fn test_decrypt_protected_wrong_key() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let alg = SymmetricKeyAlgorithm::AES256;
        let ciphertext = encrypt_protected(alg, &[1u8; 32], &mut rng, b"hello world");

        assert!(alg.decrypt_protected(&[2u8; 32], &ciphertext).is_err());
        assert!(alg.decrypt_protected(&[1u8; 16], &ciphertext).is_err());
    }

    #[test]
    fn test_too_short() {
        assert!(SymmetricKeyAlgorithm::AES128
            .decrypt_protected(&[0u8; 16], &[0u8; 20])
            .is_err());
    }
}
