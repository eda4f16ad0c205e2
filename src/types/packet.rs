use byteorder::{BigEndian, WriteBytesExt};
use bytes::Buf;
use num_enum::{FromPrimitive, IntoPrimitive};

use crate::errors::Result;
use crate::parsing::BufParsing;

/// Represents the packet length.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum PacketLength {
    Fixed(usize),
    Indeterminate,
    Partial(usize),
}

impl PacketLength {
    /// Reads a new format length, as used by new style packet headers and
    /// the continuation of partial bodies.
    pub fn from_buf<B: Buf>(mut i: B) -> Result<Self> {
        let olen = i.read_u8()?;
        let len = match olen {
            // One-Octet Lengths
            0..=191 => PacketLength::Fixed(olen.into()),
            // Two-Octet Lengths
            192..=223 => {
                let a = i.read_u8()?;
                let l = ((olen as usize - 192) << 8) + 192 + a as usize;
                PacketLength::Fixed(l)
            }
            // Partial Body Lengths
            224..=254 => PacketLength::Partial(1 << (olen as usize & 0x1F)),
            // Five-Octet Lengths
            255 => {
                let len = i.read_be_u32()?;
                PacketLength::Fixed(len.try_into()?)
            }
        };
        Ok(len)
    }

    /// Returns how many bytes encoding the given length as fixed encoding would need.
    pub fn fixed_encoding_len(len: usize) -> usize {
        if len < 192 {
            1
        } else if len < 8384 {
            2
        } else {
            1 + 4
        }
    }

    /// Writes a fixed length in the new format encoding.
    pub fn write_fixed<W: std::io::Write>(writer: &mut W, len: usize) -> Result<()> {
        if len < 192 {
            writer.write_u8(len as u8)?;
        } else if len < 8384 {
            writer.write_u8((((len - 192) >> 8) + 192) as u8)?;
            writer.write_u8(((len - 192) & 0xFF) as u8)?;
        } else {
            writer.write_u8(255)?;
            writer.write_u32::<BigEndian>(len.try_into()?)?;
        }
        Ok(())
    }
}

/// Packet Tag, see <https://www.rfc-editor.org/rfc/rfc4880.html#section-4.3>
#[derive(Debug, PartialEq, Eq, Clone, Copy, FromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum Tag {
    /// Public-Key Encrypted Session Key Packet
    PublicKeyEncryptedSessionKey = 1,
    /// Signature Packet
    Signature = 2,
    /// Symmetric-Key Encrypted Session Key Packet
    SymKeyEncryptedSessionKey = 3,
    /// One-Pass Signature Packet
    OnePassSignature = 4,
    /// Secret-Key Packet
    SecretKey = 5,
    /// Public-Key Packet
    PublicKey = 6,
    /// Secret-Subkey Packet
    SecretSubkey = 7,
    /// Compressed Data Packet
    CompressedData = 8,
    /// Symmetrically Encrypted Data Packet
    SymEncryptedData = 9,
    /// Marker Packet
    Marker = 10,
    /// Literal Data Packet
    LiteralData = 11,
    /// Trust Packet
    Trust = 12,
    /// User ID Packet
    UserId = 13,
    /// Public-Subkey Packet
    PublicSubkey = 14,
    /// User Attribute Packet
    UserAttribute = 17,
    /// Sym. Encrypted and Integrity Protected Data Packet
    SymEncryptedProtectedData = 18,
    /// Modification Detection Code Packet
    ModDetectionCode = 19,
    /// AEAD Encrypted Data Packet
    GnupgAead = 20,
    /// Padding Packet
    Padding = 21,

    #[num_enum(catch_all)]
    Other(u8),
}

impl Tag {
    /// Packets that carry no information for us and can always be skipped.
    pub fn is_ignorable(self) -> bool {
        matches!(self, Tag::Marker | Tag::Trust | Tag::Padding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packet_length_roundtrip() {
        for len in [0usize, 191, 192, 1000, 8383, 8384, 100_000] {
            let mut buf = Vec::new();
            PacketLength::write_fixed(&mut buf, len).unwrap();
            assert_eq!(buf.len(), PacketLength::fixed_encoding_len(len));
            assert_eq!(
                PacketLength::from_buf(&buf[..]).unwrap(),
                PacketLength::Fixed(len)
            );
        }
    }

    #[test]
    fn test_partial_length() {
        assert_eq!(
            PacketLength::from_buf(&[0xE1u8][..]).unwrap(),
            PacketLength::Partial(2)
        );
        assert_eq!(
            PacketLength::from_buf(&[0xEFu8][..]).unwrap(),
            PacketLength::Partial(1 << 15)
        );
    }

    #[test]
    fn test_tag_from_u8() {
        assert_eq!(Tag::from(1u8), Tag::PublicKeyEncryptedSessionKey);
        assert_eq!(Tag::from(18u8), Tag::SymEncryptedProtectedData);
        assert_eq!(Tag::from(60u8), Tag::Other(60));
        assert_eq!(u8::from(Tag::UserId), 13);
    }
}
