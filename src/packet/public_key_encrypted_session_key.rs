use std::io;

use byteorder::WriteBytesExt;
use bytes::Bytes;
use log::debug;
use zeroize::Zeroizing;

use crate::crypto::checksum;
use crate::crypto::public_key::PublicKeyAlgorithm;
use crate::crypto::sym::SymmetricKeyAlgorithm;
use crate::errors::{ensure, ensure_eq, unsupported_err, Result};
use crate::packet::SecretKey;
use crate::parsing::BufParsing;
use crate::ser::Serialize;
use crate::types::{KeyId, Mpi};

/// A decrypted session key.
#[derive(derive_more::Debug, Clone, PartialEq, Eq)]
pub struct PlainSessionKey {
    pub sym_alg: SymmetricKeyAlgorithm,
    #[debug("..")]
    pub key: Zeroizing<Vec<u8>>,
}

impl PlainSessionKey {
    /// Formats the key as `<algorithm id>:<uppercase hex>`.
    pub fn to_hex_string(&self) -> Zeroizing<String> {
        Zeroizing::new(format!(
            "{}:{}",
            u8::from(self.sym_alg),
            hex::encode_upper(&self.key[..])
        ))
    }
}

/// Public Key Encrypted Session Key Packet, version 3.
/// <https://www.rfc-editor.org/rfc/rfc4880.html#section-5.1>
#[derive(derive_more::Debug, Clone, PartialEq, Eq)]
pub struct PublicKeyEncryptedSessionKey {
    id: KeyId,
    pk_algo: PublicKeyAlgorithm,
    /// Algorithm specific encrypted values.
    #[debug("{}", hex::encode(values))]
    values: Bytes,
}

impl PublicKeyEncryptedSessionKey {
    pub fn from_buf(mut i: Bytes) -> Result<Self> {
        let version = i.read_u8()?;
        if version != 3 {
            unsupported_err!("PKESK version {}", version);
        }
        let id = KeyId::from(i.read_array::<8>()?);
        let pk_algo = PublicKeyAlgorithm::from(i.read_u8()?);
        let values = i.rest();

        Ok(PublicKeyEncryptedSessionKey {
            id,
            pk_algo,
            values,
        })
    }

    /// The recipient key id, all zeros for anonymous recipients.
    pub fn id(&self) -> &KeyId {
        &self.id
    }

    pub fn algorithm(&self) -> PublicKeyAlgorithm {
        self.pk_algo
    }

    /// Whether `key` may be able to decrypt this packet.
    pub fn matches(&self, key: &SecretKey) -> bool {
        self.id.is_wildcard() || self.id == key.public_key().key_id()
    }

    /// Decrypts the session key with the given secret key.
    pub fn decrypt(&self, key: &SecretKey) -> Result<PlainSessionKey> {
        if !self.pk_algo.is_rsa() {
            unsupported_err!("PKESK algorithm {:?}", self.pk_algo);
        }
        let mut values = self.values.clone();
        let mpi = Mpi::from_buf(&mut values)?;
        let priv_key = key.rsa_private_key()?;
        let m = crate::crypto::rsa::decrypt(&priv_key, &mpi)?;

        // algorithm, key, two octet checksum
        ensure!(m.len() > 3, "invalid session key length {}", m.len());
        let sym_alg = SymmetricKeyAlgorithm::from(m[0]);
        let key_end = m.len() - 2;
        let session_key = &m[1..key_end];
        checksum::simple([m[key_end], m[key_end + 1]], session_key)?;
        ensure_eq!(
            session_key.len(),
            sym_alg.key_size(),
            "session key size for {:?}",
            sym_alg
        );
        debug!("decrypted session key for {:?}", sym_alg);

        Ok(PlainSessionKey {
            sym_alg,
            key: Zeroizing::new(session_key.to_vec()),
        })
    }
}

impl Serialize for PublicKeyEncryptedSessionKey {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u8(3)?;
        writer.write_all(self.id.as_ref())?;
        writer.write_u8(self.pk_algo.into())?;
        writer.write_all(&self.values)?;
        Ok(())
    }

    fn write_len(&self) -> usize {
        1 + 8 + 1 + self.values.len()
    }
}
