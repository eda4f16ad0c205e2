use std::hash::Hasher;
use std::io::Write;

use base64::engine::{general_purpose, Engine as _};
use crc24::Crc24Hasher;

use crate::armor::{BlockType, Headers};
use crate::errors::Result;
use crate::ser::Serialize;

/// Width of the base64 body lines.
const LINE_LENGTH: usize = 64;

/// Options for armoring.
#[derive(Debug, Clone)]
pub struct ArmorOptions<'a> {
    /// Armor headers
    pub headers: Option<&'a Headers>,
    /// Should a checksum be included? Default to `true`.
    pub include_checksum: bool,
}

impl Default for ArmorOptions<'_> {
    fn default() -> Self {
        Self {
            headers: None,
            include_checksum: true,
        }
    }
}

impl<'a> From<Option<&'a Headers>> for ArmorOptions<'a> {
    fn from(headers: Option<&'a Headers>) -> Self {
        Self {
            headers,
            include_checksum: true,
        }
    }
}

pub fn write(
    source: &impl Serialize,
    typ: BlockType,
    writer: &mut impl Write,
    opts: ArmorOptions<'_>,
) -> Result<()> {
    // write armor header
    writer.write_all(&b"-----BEGIN "[..])?;
    typ.to_writer(writer)?;
    writer.write_all(&b"-----\n"[..])?;

    // write armor headers
    if let Some(headers) = opts.headers {
        for (key, values) in headers.iter() {
            for value in values {
                writer.write_all(key.as_bytes())?;
                writer.write_all(&b": "[..])?;
                writer.write_all(value.as_bytes())?;
                writer.write_all(&b"\n"[..])?;
            }
        }
    }

    writer.write_all(&b"\n"[..])?;

    // write body
    let body = zeroize::Zeroizing::new(source.to_bytes()?);
    let encoded = zeroize::Zeroizing::new(general_purpose::STANDARD.encode(&body[..]));
    for line in encoded.as_bytes().chunks(LINE_LENGTH) {
        writer.write_all(line)?;
        writer.write_all(&b"\n"[..])?;
    }

    // write crc
    if opts.include_checksum {
        let mut crc_hasher = Crc24Hasher::new();
        crc_hasher.write(&body);
        let crc = crc_hasher.finish() as u32;
        let crc_buf = [(crc >> 16) as u8, (crc >> 8) as u8, crc as u8];

        writer.write_all(b"=")?;
        writer.write_all(general_purpose::STANDARD.encode(crc_buf).as_bytes())?;
        writer.write_all(&b"\n"[..])?;
    }

    // write footer
    writer.write_all(&b"-----END "[..])?;
    typ.to_writer(writer)?;
    writer.write_all(&b"-----\n"[..])?;

    Ok(())
}

/// Armors `source` into a string.
pub fn to_armored_string(
    source: &impl Serialize,
    typ: BlockType,
    opts: ArmorOptions<'_>,
) -> Result<String> {
    let mut out = Vec::new();
    write(source, typ, &mut out, opts)?;
    let armored = String::from_utf8(out).map_err(|e| e.utf8_error())?;

    Ok(armored)
}
