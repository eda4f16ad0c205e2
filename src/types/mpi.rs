use std::io;

use byteorder::{BigEndian, WriteBytesExt};
use bytes::Buf;
use num_bigint::BigUint;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::errors::{Error, Result};
use crate::parsing::BufParsing;
use crate::ser::Serialize;

/// Number of bits we accept when reading or writing MPIs.
/// The value is the same as gnupgs.
const MAX_EXTERN_MPI_BITS: u16 = 16384;

/// Represents an owned MPI value, without leading zeros.
///
/// The bytes are wiped on drop, as MPIs carry the RSA secret parameters.
///
/// Ref: <https://www.rfc-editor.org/rfc/rfc4880.html#section-3.2>
#[derive(Default, Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop, derive_more::Debug)]
pub struct Mpi(#[debug("{}", hex::encode(_0))] Vec<u8>);

impl Mpi {
    /// Parses a length-prefixed MPI.
    pub fn from_buf<B: Buf>(mut i: B) -> Result<Self> {
        let len_bits = i.read_be_u16()?;

        if len_bits > MAX_EXTERN_MPI_BITS {
            return Err(Error::InvalidInput);
        }

        let len_bytes = (len_bits + 7) >> 3;
        let n = i.read_take(usize::from(len_bytes))?;

        Ok(Mpi::from_slice(&n))
    }

    /// Represent the data in `raw` as an Mpi.
    /// `raw` is not length-prefixed, leading zeros are stripped.
    pub fn from_slice(raw: &[u8]) -> Self {
        Mpi(strip_leading_zeros(raw).to_vec())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of significant bits.
    pub fn bits(&self) -> usize {
        bit_size(&self.0)
    }

    pub fn to_biguint(&self) -> BigUint {
        BigUint::from_bytes_be(&self.0)
    }
}

/// Returns the bit length of a given slice.
#[inline]
fn bit_size(val: &[u8]) -> usize {
    if val.is_empty() {
        0
    } else {
        (val.len() * 8) - val[0].leading_zeros() as usize
    }
}

#[inline]
pub(crate) fn strip_leading_zeros(bytes: &[u8]) -> &[u8] {
    bytes
        .iter()
        .position(|b| b != &0)
        .map_or(&[], |offset| &bytes[offset..])
}

impl AsRef<[u8]> for Mpi {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Serialize for Mpi {
    fn to_writer<W: io::Write>(&self, w: &mut W) -> Result<()> {
        w.write_u16::<BigEndian>(bit_size(&self.0).try_into()?)?;
        w.write_all(&self.0)?;

        Ok(())
    }

    fn write_len(&self) -> usize {
        2 + self.0.len()
    }
}

impl From<&BigUint> for Mpi {
    fn from(other: &BigUint) -> Self {
        Mpi(other.to_bytes_be())
    }
}

impl From<BigUint> for Mpi {
    fn from(other: BigUint) -> Self {
        (&other).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mpi() {
        // Decode the number `511` (`0x1FF` in hex).
        assert_eq!(
            Mpi::from_buf(&mut &[0x00, 0x09, 0x01, 0xFF][..]).unwrap(),
            Mpi::from_slice(&[0x01, 0xFF][..])
        );

        let m = Mpi::from_slice(&[0x00, 0x00, 0x01, 0xFF]);
        assert_eq!(m.as_ref(), &[0x01, 0xFF]);
        assert_eq!(m.bits(), 9);
        assert_eq!(m.to_bytes().unwrap(), vec![0x00, 0x09, 0x01, 0xFF]);
    }

    #[test]
    fn test_mpi_too_large() {
        let mut buf = vec![0x40, 0x01];
        buf.extend_from_slice(&[0xFF; 2049]);
        assert!(Mpi::from_buf(&buf[..]).is_err());
    }

    #[test]
    fn test_mpi_truncated() {
        assert!(Mpi::from_buf(&[0x00, 0x10, 0x01][..]).is_err());
    }

    #[test]
    fn test_strip_leading_zeros_with_all_zeros() {
        let buf = [0u8, 0u8, 0u8];
        assert!(strip_leading_zeros(&buf[..]).is_empty());
        assert_eq!(Mpi::from_slice(&buf).bits(), 0);
    }

    #[test]
    fn test_biguint_roundtrip() {
        let n = BigUint::from(0x1234_5678u32);
        let m: Mpi = (&n).into();
        assert_eq!(m.to_biguint(), n);
    }
}
