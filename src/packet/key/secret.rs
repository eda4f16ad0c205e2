use std::io;

use bytes::Bytes;
use rsa::RsaPrivateKey;

use crate::errors::{unsupported_err, Result};
use crate::packet::PublicKey;
use crate::ser::Serialize;
use crate::types::{PlainSecretParams, SecretParams};

/// Secret key material: the public key followed by the secret parameters.
/// Used by both the secret key and the secret subkey packets.
///
/// Ref: <https://www.rfc-editor.org/rfc/rfc4880.html#section-5.5.3>
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct SecretKey {
    details: PublicKey,
    secret: SecretParams,
}

impl SecretKey {
    pub fn new(details: PublicKey, secret: PlainSecretParams) -> Self {
        SecretKey {
            details,
            secret: SecretParams::Plain(secret),
        }
    }

    pub fn from_buf(i: &mut Bytes) -> Result<Self> {
        let details = PublicKey::from_buf(i)?;
        let secret = SecretParams::from_buf(details.algorithm(), i)?;

        Ok(SecretKey { details, secret })
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.details
    }

    pub fn secret_params(&self) -> &SecretParams {
        &self.secret
    }

    pub fn is_encrypted(&self) -> bool {
        matches!(self.secret, SecretParams::Encrypted(_))
    }

    /// Unlocks the RSA private key, fails for protected or non RSA material.
    pub fn rsa_private_key(&self) -> Result<RsaPrivateKey> {
        match &self.secret {
            SecretParams::Plain(params) => params.to_rsa(self.details.public_params()),
            SecretParams::Encrypted(_) => unsupported_err!("passphrase protected secret key"),
            SecretParams::Unsupported(_) => {
                unsupported_err!("secret key algorithm {:?}", self.details.algorithm())
            }
        }
    }
}

impl Serialize for SecretKey {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        self.details.to_writer(writer)?;
        self.secret.to_writer(writer)
    }

    fn write_len(&self) -> usize {
        self.details.write_len() + self.secret.write_len()
    }
}
