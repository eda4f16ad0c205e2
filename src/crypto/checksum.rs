use sha1::{Digest, Sha1};

use crate::errors::{ensure_eq, Result};

/// Two octet checksum: sum of all octets mod 65536.
#[inline]
pub fn calculate_simple(data: &[u8]) -> u16 {
    let sum = data.iter().map(|v| u32::from(*v)).sum::<u32>();
    (sum & 0xffff) as u16
}

/// Checks the two octet checksum `actual` against `data`.
#[inline]
pub fn simple(actual: [u8; 2], data: &[u8]) -> Result<()> {
    ensure_eq!(
        u16::from_be_bytes(actual),
        calculate_simple(data),
        "invalid simple checksum"
    );

    Ok(())
}

/// SHA1 checksum, first 20 octets.
#[inline]
pub fn sha1(hash: &[u8], data: &[u8]) -> Result<()> {
    ensure_eq!(hash, &Sha1::digest(data)[0..20], "invalid SHA1 checksum");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple() {
        // 0xFF * 258 wraps at 16 bits
        assert_eq!(calculate_simple(&[0xFF; 258]), 0x00FE);
        assert!(simple([0x00, 0xFE], &[0xFF; 258]).is_ok());
        assert!(simple([0x01, 0xFE], &[0xFF; 258]).is_err());
        assert_eq!(calculate_simple(&[0x01, 0x02, 0x03]), 6);
    }

    #[test]
    fn test_sha1() {
        let digest = Sha1::digest(b"hello");
        assert!(sha1(&digest, b"hello").is_ok());
        assert!(sha1(&digest, b"hellO").is_err());
    }
}
