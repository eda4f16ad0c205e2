use byteorder::WriteBytesExt;
use bytes::Buf;

use crate::errors::{bail, unsupported_err, Result};
use crate::parsing::BufParsing;
use crate::ser::Serialize;
use crate::types::{PacketLength, Tag};

/// Packet header format.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PacketHeaderVersion {
    /// Old format ("Legacy format"), the length type is encoded in the tag octet.
    Old,
    /// New format ("OpenPGP format").
    New,
}

/// Represents a packet header.
///
/// Ref: <https://www.rfc-editor.org/rfc/rfc4880.html#section-4.2>
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PacketHeader {
    version: PacketHeaderVersion,
    tag: Tag,
    length: PacketLength,
}

impl PacketHeader {
    /// Parse a single packet header from the given buffer.
    pub fn from_buf<B: Buf>(mut i: B) -> Result<Self> {
        let header = i.read_u8()?;

        match header & 0b1100_0000 {
            0b1100_0000 => {
                // new starts with 0b11
                let tag = Tag::from(header & 0b0011_1111);
                let length = PacketLength::from_buf(&mut i)?;
                Ok(PacketHeader {
                    version: PacketHeaderVersion::New,
                    tag,
                    length,
                })
            }
            0b1000_0000 => {
                // old starts with 0b10
                let tag = Tag::from((header >> 2) & 0b0000_1111);
                let length = match header & 0b0000_0011 {
                    // One-Octet Lengths
                    0 => PacketLength::Fixed(i.read_u8()?.into()),
                    // Two-Octet Lengths
                    1 => PacketLength::Fixed(i.read_be_u16()?.into()),
                    // Four-Octet Lengths
                    2 => PacketLength::Fixed(i.read_be_u32()?.try_into()?),
                    _ => PacketLength::Indeterminate,
                };
                Ok(PacketHeader {
                    version: PacketHeaderVersion::Old,
                    tag,
                    length,
                })
            }
            _ => {
                bail!("unknown packet header version {:b}", header);
            }
        }
    }

    /// Creates a `New` style packet header.
    pub fn new_fixed(tag: Tag, length: usize) -> Self {
        PacketHeader {
            version: PacketHeaderVersion::New,
            tag,
            length: PacketLength::Fixed(length),
        }
    }

    pub fn version(&self) -> PacketHeaderVersion {
        self.version
    }

    pub fn tag(&self) -> Tag {
        self.tag
    }

    pub fn packet_length(&self) -> PacketLength {
        self.length
    }
}

impl Serialize for PacketHeader {
    fn to_writer<W: std::io::Write>(&self, writer: &mut W) -> Result<()> {
        let PacketLength::Fixed(len) = self.length else {
            unsupported_err!("writing packet length {:?}", self.length);
        };
        let tag = u8::from(self.tag);
        if tag > 0b0011_1111 {
            bail!("invalid packet tag {}", tag);
        }

        writer.write_u8(0b1100_0000 | tag)?;
        PacketLength::write_fixed(writer, len)?;

        Ok(())
    }

    fn write_len(&self) -> usize {
        match self.length {
            PacketLength::Fixed(len) => 1 + PacketLength::fixed_encoding_len(len),
            _ => 1 + 1,
        }
    }
}

/// Writes `body` as a single packet with a new style header.
pub fn write_packet<W, P>(writer: &mut W, tag: Tag, body: &P) -> Result<()>
where
    W: std::io::Write,
    P: Serialize + ?Sized,
{
    PacketHeader::new_fixed(tag, body.write_len()).to_writer(writer)?;
    body.to_writer(writer)
}

/// Length of a packet with a new style header around a body of `len` bytes.
pub fn packet_len(len: usize) -> usize {
    PacketHeader::new_fixed(Tag::Marker, len).write_len() + len
}
