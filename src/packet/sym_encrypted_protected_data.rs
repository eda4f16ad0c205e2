use std::io;

use byteorder::WriteBytesExt;
use bytes::Bytes;
use zeroize::Zeroizing;

use crate::errors::{unsupported_err, Result};
use crate::packet::PlainSessionKey;
use crate::parsing::BufParsing;
use crate::ser::Serialize;

/// Symmetrically Encrypted Integrity Protected Data Packet, version 1.
/// <https://www.rfc-editor.org/rfc/rfc4880.html#section-5.13>
#[derive(derive_more::Debug, Clone, PartialEq, Eq)]
pub struct SymEncryptedProtectedData {
    #[debug("{} bytes", data.len())]
    data: Bytes,
}

impl SymEncryptedProtectedData {
    /// Parses a `SymEncryptedProtectedData` packet from the given buffer.
    pub fn from_buf(mut i: Bytes) -> Result<Self> {
        let version = i.read_u8()?;
        if version != 1 {
            unsupported_err!("SEIPD version {}", version);
        }

        Ok(SymEncryptedProtectedData { data: i.rest() })
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Decrypts the contained packet stream.
    pub fn decrypt(&self, session_key: &PlainSessionKey) -> Result<Zeroizing<Vec<u8>>> {
        session_key
            .sym_alg
            .decrypt_protected(&session_key.key, &self.data)
    }
}

impl Serialize for SymEncryptedProtectedData {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u8(1)?;
        writer.write_all(&self.data)?;
        Ok(())
    }

    fn write_len(&self) -> usize {
        1 + self.data.len()
    }
}
