use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::crypto::hash::HashAlgorithm;
use crate::engine::error::EngineError;

/// Encoding of signatures and ciphertexts on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    /// Standard base64 of the binary packets, unwrapped.
    #[default]
    Base64,
    /// RFC 4880 armor.
    AsciiArmor,
}

impl Format {
    /// Parses the `format` field, absent or empty means base64.
    pub fn parse(format: Option<&str>) -> Result<Self, EngineError> {
        match format.unwrap_or_default() {
            "" | "base64" => Ok(Format::Base64),
            "ascii-armor" => Ok(Format::AsciiArmor),
            other => Err(EngineError::FormatUnsupported {
                format: other.to_string(),
            }),
        }
    }
}

/// Parses the hash algorithm names accepted for signing, absent or empty
/// means SHA2-256.
pub fn parse_hash_algorithm(algorithm: Option<&str>) -> Result<HashAlgorithm, EngineError> {
    match algorithm.unwrap_or_default() {
        "" | "sha2-256" => Ok(HashAlgorithm::Sha256),
        "sha2-224" => Ok(HashAlgorithm::Sha224),
        "sha2-384" => Ok(HashAlgorithm::Sha384),
        "sha2-512" => Ok(HashAlgorithm::Sha512),
        other => Err(EngineError::AlgorithmUnsupported {
            algorithm: other.to_string(),
        }),
    }
}

/// Decodes standard base64, line breaks are ignored.
pub fn decode_base64(input: &str) -> Result<Vec<u8>, base64::DecodeError> {
    if input.contains(['\r', '\n']) {
        let joined: String = input.chars().filter(|c| !matches!(c, '\r' | '\n')).collect();
        STANDARD.decode(joined)
    } else {
        STANDARD.decode(input)
    }
}

pub fn encode_base64(input: &[u8]) -> String {
    STANDARD.encode(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format() {
        assert_eq!(Format::parse(None).unwrap(), Format::Base64);
        assert_eq!(Format::parse(Some("")).unwrap(), Format::Base64);
        assert_eq!(Format::parse(Some("ascii-armor")).unwrap(), Format::AsciiArmor);
        assert_eq!(
            Format::parse(Some("hex")).unwrap_err().kind(),
            "format-unsupported"
        );
    }

    #[test]
    fn test_hash_algorithm() {
        assert_eq!(parse_hash_algorithm(None).unwrap(), HashAlgorithm::Sha256);
        assert_eq!(
            parse_hash_algorithm(Some("sha2-512")).unwrap(),
            HashAlgorithm::Sha512
        );
        for bad in ["sha1", "md5", "SHA2-256", "sha256"] {
            assert_eq!(
                parse_hash_algorithm(Some(bad)).unwrap_err().kind(),
                "algorithm-unsupported"
            );
        }
    }

    #[test]
    fn test_base64() {
        assert_eq!(decode_base64("QWxw\r\nYWNhcwo=\n").unwrap(), b"Alpacas\n");
        assert_eq!(encode_base64(b"Alpacas\n"), "QWxwYWNhcwo=");
        assert!(decode_base64("not base64!").is_err());
        assert_eq!(decode_base64("").unwrap(), b"");
    }
}
