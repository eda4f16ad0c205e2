use std::collections::BTreeMap;
use std::fmt;
use std::hash::Hasher;
use std::io;

use base64::engine::{general_purpose::STANDARD, Engine as _};
use crc24::Crc24Hasher;
use log::debug;

use crate::errors::{Error, Result};
use crate::ser::Serialize;

/// Armor block types.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum BlockType {
    /// PGP public key
    PublicKey,
    /// PGP private key
    PrivateKey,
    Message,
    MultiPartMessage(usize, usize),
    Signature,
    // gnupgp extension
    File,
}

impl BlockType {
    fn from_label(label: &str) -> Option<Self> {
        let typ = match label {
            "PGP PUBLIC KEY BLOCK" => BlockType::PublicKey,
            "PGP PRIVATE KEY BLOCK" => BlockType::PrivateKey,
            "PGP MESSAGE" => BlockType::Message,
            "PGP SIGNATURE" => BlockType::Signature,
            "PGP ARMORED FILE" => BlockType::File,
            _ => {
                let part = label.strip_prefix("PGP MESSAGE, PART ")?;
                let (x, y) = match part.split_once('/') {
                    Some((x, y)) => (x.parse().ok()?, y.parse().ok()?),
                    None => (part.parse().ok()?, 0),
                };
                BlockType::MultiPartMessage(x, y)
            }
        };
        Some(typ)
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockType::PublicKey => f.write_str("PGP PUBLIC KEY BLOCK"),
            BlockType::PrivateKey => f.write_str("PGP PRIVATE KEY BLOCK"),
            BlockType::MultiPartMessage(x, y) => write!(f, "PGP MESSAGE, PART {x}/{y}"),
            BlockType::Message => f.write_str("PGP MESSAGE"),
            BlockType::Signature => f.write_str("PGP SIGNATURE"),
            BlockType::File => f.write_str("PGP ARMORED FILE"),
        }
    }
}

impl Serialize for BlockType {
    fn to_writer<W: io::Write>(&self, w: &mut W) -> Result<()> {
        write!(w, "{self}")?;

        Ok(())
    }

    fn write_len(&self) -> usize {
        // allocates, but this is tiny, should be fine
        let x = self.to_string();
        x.len()
    }
}

/// Armor Headers.
pub type Headers = BTreeMap<String, Vec<String>>;

/// Parses a single armored block, returning its type, headers and decoded body.
///
/// Text before the armor header line is ignored, as are trailing spaces and
/// `\r` at the end of lines. A checksum line, if present, must match.
pub fn parse(input: &str) -> Result<(BlockType, Headers, Vec<u8>)> {
    let mut lines = input.lines().map(|l| l.trim_end());

    let typ = lines
        .by_ref()
        .find_map(|line| {
            line.strip_prefix("-----BEGIN ")
                .and_then(|l| l.strip_suffix("-----"))
        })
        .and_then(BlockType::from_label)
        .ok_or(Error::InvalidArmorWrappers)?;
    debug!("dearmoring {}", typ);

    let mut headers = Headers::new();
    let mut body = String::new();
    let mut checksum = None;
    let mut in_headers = true;
    let mut footer = None;

    for line in lines.by_ref() {
        if let Some(label) = line
            .strip_prefix("-----END ")
            .and_then(|l| l.strip_suffix("-----"))
        {
            footer = Some(label);
            break;
        }
        if in_headers {
            if line.is_empty() {
                in_headers = false;
                continue;
            }
            if let Some((key, value)) = line.split_once(": ") {
                headers
                    .entry(key.to_string())
                    .or_default()
                    .push(value.to_string());
                continue;
            }
            // no blank line after the header line, the body starts right away
            in_headers = false;
        }
        if let Some(crc) = line.strip_prefix('=') {
            checksum = Some(read_checksum(crc)?);
            continue;
        }
        body.extend(line.chars().filter(|c| !c.is_whitespace()));
    }

    match footer.and_then(BlockType::from_label) {
        Some(end) if end == typ => {}
        _ => return Err(Error::InvalidArmorWrappers),
    }

    let decoded = STANDARD.decode(body.as_bytes())?;
    if let Some(expected) = checksum {
        let mut hasher = Crc24Hasher::new();
        hasher.write(&decoded);
        if hasher.finish() as u32 != expected {
            return Err(Error::InvalidChecksum);
        }
    }

    Ok((typ, headers, decoded))
}

fn read_checksum(encoded: &str) -> Result<u32> {
    let raw = STANDARD.decode(encoded)?;
    if raw.len() != 3 {
        return Err(Error::InvalidChecksum);
    }
    Ok((u32::from(raw[0]) << 16) | (u32::from(raw[1]) << 8) | u32::from(raw[2]))
}
