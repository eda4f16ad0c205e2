use std::io::{self, Read};

use byteorder::WriteBytesExt;
use bytes::Bytes;
use flate2::read::{DeflateDecoder, ZlibDecoder};
use log::debug;
use zeroize::Zeroizing;

use crate::errors::{unsupported_err, Result};
use crate::parsing::BufParsing;
use crate::ser::Serialize;
use crate::types::CompressionAlgorithm;

/// Compressed Data Packet
/// <https://www.rfc-editor.org/rfc/rfc4880.html#section-5.6>
#[derive(derive_more::Debug, Clone, PartialEq, Eq)]
pub struct CompressedData {
    compression_algorithm: CompressionAlgorithm,
    #[debug("{} bytes", compressed_data.len())]
    compressed_data: Bytes,
}

impl CompressedData {
    /// Parses a `CompressedData` packet from the given buffer.
    pub fn from_buf(mut i: Bytes) -> Result<Self> {
        let compression_algorithm = CompressionAlgorithm::from(i.read_u8()?);

        Ok(CompressedData {
            compression_algorithm,
            compressed_data: i.rest(),
        })
    }

    pub fn compression_algorithm(&self) -> CompressionAlgorithm {
        self.compression_algorithm
    }

    /// Decompresses the contained packet stream.
    pub fn decompress(&self) -> Result<Zeroizing<Vec<u8>>> {
        debug!("decompressing {:?}", self.compression_algorithm);

        let mut out = Zeroizing::new(Vec::new());
        match self.compression_algorithm {
            CompressionAlgorithm::Uncompressed => out.extend_from_slice(&self.compressed_data),
            CompressionAlgorithm::ZIP => {
                DeflateDecoder::new(&self.compressed_data[..]).read_to_end(&mut out)?;
            }
            CompressionAlgorithm::ZLIB => {
                ZlibDecoder::new(&self.compressed_data[..]).read_to_end(&mut out)?;
            }
            CompressionAlgorithm::BZip2 | CompressionAlgorithm::Other(_) => {
                unsupported_err!("compression algorithm {:?}", self.compression_algorithm)
            }
        }

        Ok(out)
    }
}

impl Serialize for CompressedData {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u8(self.compression_algorithm.into())?;
        writer.write_all(&self.compressed_data)?;
        Ok(())
    }

    fn write_len(&self) -> usize {
        1 + self.compressed_data.len()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use flate2::write::{DeflateEncoder, ZlibEncoder};
    use flate2::Compression;

    use super::*;

    #[test]
    fn test_decompress() {
        let mut zip = DeflateEncoder::new(vec![1u8], Compression::default());
        zip.write_all(b"hello hello hello").unwrap();
        let zip = CompressedData::from_buf(zip.finish().unwrap().into()).unwrap();
        assert_eq!(zip.compression_algorithm(), CompressionAlgorithm::ZIP);
        assert_eq!(&zip.decompress().unwrap()[..], b"hello hello hello");

        let mut zlib = ZlibEncoder::new(vec![2u8], Compression::default());
        zlib.write_all(b"hello").unwrap();
        let zlib = CompressedData::from_buf(zlib.finish().unwrap().into()).unwrap();
        assert_eq!(&zlib.decompress().unwrap()[..], b"hello");

        let plain = CompressedData::from_buf(Bytes::from_static(b"\x00hello")).unwrap();
        assert_eq!(&plain.decompress().unwrap()[..], b"hello");
    }

    #[test]
    fn test_bzip2_unsupported() {
        let bz = CompressedData::from_buf(Bytes::from_static(b"\x03BZh")).unwrap();
        assert!(bz.decompress().is_err());
    }
}
