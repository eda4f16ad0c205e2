use bytes::{Buf, Bytes, BytesMut};
use log::debug;

use crate::errors::{bail, Error, Result};
use crate::packet::{Packet, PacketHeader};
use crate::parsing::BufParsing;
use crate::types::PacketLength;

/// Parses packets one by one from an in memory buffer.
///
/// The first error ends the iteration, nothing after a malformed packet is
/// trusted to be framed correctly.
pub struct PacketParser {
    input: Bytes,
    failed: bool,
}

impl PacketParser {
    pub fn new(input: impl Into<Bytes>) -> Self {
        PacketParser {
            input: input.into(),
            failed: false,
        }
    }

    fn next_packet(&mut self) -> Result<Packet> {
        let header = PacketHeader::from_buf(&mut self.input)?;
        let body = match header.packet_length() {
            PacketLength::Fixed(len) => self.take(len)?,
            PacketLength::Indeterminate => self.input.rest(),
            PacketLength::Partial(len) => self.take_partial(len)?,
        };

        Packet::from_parts(header.tag(), body)
    }

    fn take(&mut self, len: usize) -> Result<Bytes> {
        self.input
            .read_take(len)
            .map_err(|source| Error::PacketIncomplete { source })
    }

    /// Collects a body split into partial chunks, up to and including the
    /// final fixed length chunk.
    fn take_partial(&mut self, first: usize) -> Result<Bytes> {
        let mut body = BytesMut::new();
        body.extend_from_slice(&self.take(first)?);
        loop {
            match PacketLength::from_buf(&mut self.input)? {
                PacketLength::Partial(len) => body.extend_from_slice(&self.take(len)?),
                PacketLength::Fixed(len) => {
                    body.extend_from_slice(&self.take(len)?);
                    break;
                }
                PacketLength::Indeterminate => bail!("invalid partial body length"),
            }
        }
        debug!("collected partial body of {} bytes", body.len());

        Ok(body.freeze())
    }
}

impl Iterator for PacketParser {
    type Item = Result<Packet>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || !self.input.has_remaining() {
            return None;
        }

        let res = self.next_packet();
        if res.is_err() {
            self.failed = true;
        }
        Some(res)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::UserId;
    use crate::ser::Serialize;
    use crate::types::Tag;

    #[test]
    fn test_parse_sequence() {
        let mut raw = Packet::UserId(UserId::from_str("a")).to_bytes().unwrap();
        raw.extend(
            Packet::Other {
                tag: Tag::Marker,
                body: Bytes::from_static(b"PGP"),
            }
            .to_bytes()
            .unwrap(),
        );

        let packets = PacketParser::new(raw).collect::<Result<Vec<_>>>().unwrap();
        assert_eq!(packets.len(), 2);
        assert_eq!(packets[0], Packet::UserId(UserId::from_str("a")));
        assert_eq!(packets[1].tag(), Tag::Marker);
    }

    #[test]
    fn test_partial_body() {
        // literal data split into a 2 byte partial chunk and a fixed rest
        let raw: Vec<u8> = vec![0xcb, 0xe1, b'b', 0x00, 0x06, 0, 0, 0, 0, b'h', b'i'];
        let mut parser = PacketParser::new(raw);
        match parser.next().unwrap().unwrap() {
            Packet::LiteralData(lit) => assert_eq!(lit.data(), b"hi"),
            p => panic!("unexpected packet {:?}", p),
        }
        assert!(parser.next().is_none());
    }

    #[test]
    fn test_truncated_stops() {
        let mut raw = Packet::UserId(UserId::from_str("hello")).to_bytes().unwrap();
        raw.truncate(4);

        let mut parser = PacketParser::new(raw);
        let err = parser.next().unwrap().unwrap_err();
        assert!(matches!(err, Error::PacketIncomplete { .. }));
        assert!(parser.next().is_none());
    }

    #[test]
    fn test_indeterminate_length() {
        let mut parser = PacketParser::new(vec![0xb7u8, b'a', b'b']);
        let p = parser.next().unwrap().unwrap();
        assert_eq!(p, Packet::UserId(UserId::from_str("ab")));
        assert!(parser.next().is_none());
    }
}
