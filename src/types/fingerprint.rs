use std::fmt;

use crate::errors::{Error, Result};
use crate::types::KeyId;

/// A version 4 key fingerprint: SHA-1 over the canonical public key encoding.
#[derive(Clone, Copy, Eq, PartialEq, Hash, derive_more::Debug)]
#[debug("Fingerprint({})", hex::encode(_0))]
pub struct Fingerprint([u8; 20]);

impl Fingerprint {
    pub fn from_slice(fp: &[u8]) -> Result<Self> {
        let fp = fp.try_into().map_err(|_| Error::InvalidInput)?;
        Ok(Fingerprint(fp))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0[..]
    }

    /// The key id is the low 64 bits of the fingerprint.
    pub fn key_id(&self) -> KeyId {
        let mut id = [0u8; 8];
        id.copy_from_slice(&self.0[12..]);
        id.into()
    }
}

impl From<[u8; 20]> for Fingerprint {
    fn from(value: [u8; 20]) -> Self {
        Fingerprint(value)
    }
}

impl fmt::LowerHex for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_id_from_fingerprint() {
        let raw = hex::decode("ccbd28b00464a99462aeeb56966a4d775663e063").unwrap();
        let fp = Fingerprint::from_slice(&raw).unwrap();
        assert_eq!(format!("{:x}", fp), "ccbd28b00464a99462aeeb56966a4d775663e063");
        assert_eq!(format!("{:X}", fp.key_id()), "966A4D775663E063");
        assert!(Fingerprint::from_slice(&raw[1..]).is_err());
    }
}
