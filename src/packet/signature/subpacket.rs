use std::io;

use byteorder::{BigEndian, WriteBytesExt};
use bytes::{Buf, Bytes};
use chrono::{DateTime, Utc};
use num_enum::{FromPrimitive, IntoPrimitive};

use crate::crypto::hash::HashAlgorithm;
use crate::crypto::sym::SymmetricKeyAlgorithm;
use crate::errors::{format_err, Result};
use crate::parsing::BufParsing;
use crate::ser::Serialize;
use crate::types::{CompressionAlgorithm, Fingerprint, KeyId, PacketLength};

/// Available signature subpacket types
/// Ref: <https://www.rfc-editor.org/rfc/rfc4880.html#section-5.2.3.1>
#[derive(Debug, PartialEq, Eq, Copy, Clone, FromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum SubpacketType {
    SignatureCreationTime = 2,
    SignatureExpirationTime = 3,
    KeyExpirationTime = 9,
    PreferredSymmetricAlgorithms = 11,
    Issuer = 16,
    PreferredHashAlgorithms = 21,
    PreferredCompressionAlgorithms = 22,
    KeyServerPreferences = 23,
    PrimaryUserId = 25,
    KeyFlags = 27,
    Features = 30,
    IssuerFingerprint = 33,

    #[num_enum(catch_all)]
    Other(u8),
}

/// Key flags, the first octet of the key flags subpacket.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct KeyFlags(u8);

impl KeyFlags {
    pub const CERTIFY: u8 = 0x01;
    pub const SIGN: u8 = 0x02;
    pub const ENCRYPT_COMMS: u8 = 0x04;
    pub const ENCRYPT_STORAGE: u8 = 0x08;

    pub const fn from_bits(bits: u8) -> Self {
        KeyFlags(bits)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub fn encrypt(self) -> bool {
        self.0 & (Self::ENCRYPT_COMMS | Self::ENCRYPT_STORAGE) != 0
    }
}

impl From<&[u8]> for KeyFlags {
    fn from(other: &[u8]) -> Self {
        KeyFlags(other.first().copied().unwrap_or_default())
    }
}

/// A single signature subpacket.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Subpacket {
    pub is_critical: bool,
    pub data: SubpacketData,
}

impl Subpacket {
    /// Construct a new regular subpacket.
    pub const fn regular(data: SubpacketData) -> Self {
        Subpacket {
            is_critical: false,
            data,
        }
    }

    /// Construct a new critical subpacket.
    pub const fn critical(data: SubpacketData) -> Self {
        Subpacket {
            is_critical: true,
            data,
        }
    }

    /// Parses a single subpacket.
    pub fn from_buf(i: &mut Bytes) -> Result<Self> {
        let len = read_subpacket_len(&mut *i)?;
        let mut body = i.read_take(len)?;
        let raw_typ = body.read_u8()?;
        let is_critical = raw_typ & 0b1000_0000 != 0;
        let typ = SubpacketType::from(raw_typ & 0b0111_1111);
        let data = SubpacketData::from_buf(typ, body)?;

        Ok(Subpacket { is_critical, data })
    }

    /// Parses a complete subpacket area.
    pub fn parse_area(mut area: Bytes) -> Result<Vec<Self>> {
        let mut packets = Vec::new();
        while area.has_remaining() {
            packets.push(Subpacket::from_buf(&mut area)?);
        }
        Ok(packets)
    }

    fn body_len(&self) -> usize {
        self.data.body_len()
    }
}

/// Subpacket lengths differ from packet lengths in that there are no
/// partial lengths, 192..=254 always introduce a two octet length.
fn read_subpacket_len(i: &mut Bytes) -> Result<usize> {
    let olen = i.read_u8()?;
    let len = match olen {
        0..=191 => olen.into(),
        192..=254 => {
            let a = i.read_u8()?;
            ((olen as usize - 192) << 8) + 192 + a as usize
        }
        255 => i.read_be_u32()?.try_into()?,
    };
    Ok(len)
}

#[derive(derive_more::Debug, PartialEq, Eq, Clone)]
pub enum SubpacketData {
    /// The time the signature was made.
    SignatureCreationTime(DateTime<Utc>),
    /// Seconds after key creation at which the key expires.
    KeyExpirationTime(u32),
    /// The OpenPGP Key ID of the key issuing the signature.
    Issuer(KeyId),
    /// Fingerprint of the key issuing the signature.
    IssuerFingerprint(Fingerprint),
    PreferredSymmetricAlgorithms(Vec<SymmetricKeyAlgorithm>),
    PreferredHashAlgorithms(Vec<HashAlgorithm>),
    PreferredCompressionAlgorithms(Vec<CompressionAlgorithm>),
    KeyServerPreferences(#[debug("{}", hex::encode(_0))] Bytes),
    IsPrimary(bool),
    KeyFlags(#[debug("{}", hex::encode(_0))] Bytes),
    Features(#[debug("{}", hex::encode(_0))] Bytes),
    Other(u8, #[debug("{}", hex::encode(_1))] Bytes),
}

impl SubpacketData {
    fn from_buf(typ: SubpacketType, mut body: Bytes) -> Result<Self> {
        let data = match typ {
            SubpacketType::SignatureCreationTime => {
                let ts = body.read_be_u32()?;
                let created = DateTime::from_timestamp(ts.into(), 0)
                    .ok_or_else(|| format_err!("invalid signature creation time {}", ts))?;
                SubpacketData::SignatureCreationTime(created)
            }
            SubpacketType::KeyExpirationTime => {
                SubpacketData::KeyExpirationTime(body.read_be_u32()?)
            }
            SubpacketType::Issuer => SubpacketData::Issuer(KeyId::from(body.read_array::<8>()?)),
            SubpacketType::IssuerFingerprint if body.len() == 21 && body[0] == 4 => {
                body.advance(1);
                SubpacketData::IssuerFingerprint(Fingerprint::from(body.read_array::<20>()?))
            }
            SubpacketType::PreferredSymmetricAlgorithms => SubpacketData::PreferredSymmetricAlgorithms(
                body.iter().map(|v| SymmetricKeyAlgorithm::from(*v)).collect(),
            ),
            SubpacketType::PreferredHashAlgorithms => SubpacketData::PreferredHashAlgorithms(
                body.iter().map(|v| HashAlgorithm::from(*v)).collect(),
            ),
            SubpacketType::PreferredCompressionAlgorithms => {
                SubpacketData::PreferredCompressionAlgorithms(
                    body.iter().map(|v| CompressionAlgorithm::from(*v)).collect(),
                )
            }
            SubpacketType::KeyServerPreferences => SubpacketData::KeyServerPreferences(body),
            SubpacketType::PrimaryUserId => SubpacketData::IsPrimary(body.read_u8()? != 0),
            SubpacketType::KeyFlags => SubpacketData::KeyFlags(body),
            SubpacketType::Features => SubpacketData::Features(body),
            typ => SubpacketData::Other(typ.into(), body),
        };

        Ok(data)
    }

    fn typ(&self) -> SubpacketType {
        match self {
            SubpacketData::SignatureCreationTime(_) => SubpacketType::SignatureCreationTime,
            SubpacketData::KeyExpirationTime(_) => SubpacketType::KeyExpirationTime,
            SubpacketData::Issuer(_) => SubpacketType::Issuer,
            SubpacketData::IssuerFingerprint(_) => SubpacketType::IssuerFingerprint,
            SubpacketData::PreferredSymmetricAlgorithms(_) => {
                SubpacketType::PreferredSymmetricAlgorithms
            }
            SubpacketData::PreferredHashAlgorithms(_) => SubpacketType::PreferredHashAlgorithms,
            SubpacketData::PreferredCompressionAlgorithms(_) => {
                SubpacketType::PreferredCompressionAlgorithms
            }
            SubpacketData::KeyServerPreferences(_) => SubpacketType::KeyServerPreferences,
            SubpacketData::IsPrimary(_) => SubpacketType::PrimaryUserId,
            SubpacketData::KeyFlags(_) => SubpacketType::KeyFlags,
            SubpacketData::Features(_) => SubpacketType::Features,
            SubpacketData::Other(typ, _) => SubpacketType::from(*typ),
        }
    }

    fn body_len(&self) -> usize {
        match self {
            SubpacketData::SignatureCreationTime(_) | SubpacketData::KeyExpirationTime(_) => 4,
            SubpacketData::Issuer(_) => 8,
            SubpacketData::IssuerFingerprint(_) => 21,
            SubpacketData::PreferredSymmetricAlgorithms(v) => v.len(),
            SubpacketData::PreferredHashAlgorithms(v) => v.len(),
            SubpacketData::PreferredCompressionAlgorithms(v) => v.len(),
            SubpacketData::IsPrimary(_) => 1,
            SubpacketData::KeyServerPreferences(b)
            | SubpacketData::KeyFlags(b)
            | SubpacketData::Features(b)
            | SubpacketData::Other(_, b) => b.len(),
        }
    }

    fn write_body<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        match self {
            SubpacketData::SignatureCreationTime(t) => {
                writer.write_u32::<BigEndian>(t.timestamp().try_into()?)?;
            }
            SubpacketData::KeyExpirationTime(secs) => writer.write_u32::<BigEndian>(*secs)?,
            SubpacketData::Issuer(id) => writer.write_all(id.as_ref())?,
            SubpacketData::IssuerFingerprint(fp) => {
                writer.write_u8(4)?;
                writer.write_all(fp.as_bytes())?;
            }
            SubpacketData::PreferredSymmetricAlgorithms(algs) => {
                writer.write_all(&algs.iter().map(|&a| u8::from(a)).collect::<Vec<_>>())?;
            }
            SubpacketData::PreferredHashAlgorithms(algs) => {
                writer.write_all(&algs.iter().map(|&a| u8::from(a)).collect::<Vec<_>>())?;
            }
            SubpacketData::PreferredCompressionAlgorithms(algs) => {
                writer.write_all(&algs.iter().map(|&a| u8::from(a)).collect::<Vec<_>>())?;
            }
            SubpacketData::IsPrimary(primary) => writer.write_u8((*primary).into())?,
            SubpacketData::KeyServerPreferences(b)
            | SubpacketData::KeyFlags(b)
            | SubpacketData::Features(b)
            | SubpacketData::Other(_, b) => writer.write_all(b)?,
        }
        Ok(())
    }
}

impl Serialize for Subpacket {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        PacketLength::write_fixed(writer, 1 + self.body_len())?;
        let mut typ = u8::from(self.data.typ());
        if self.is_critical {
            typ |= 0b1000_0000;
        }
        writer.write_u8(typ)?;
        self.data.write_body(writer)
    }

    fn write_len(&self) -> usize {
        let len = 1 + self.body_len();
        PacketLength::fixed_encoding_len(len) + len
    }
}
