use bytes::Bytes;
use log::debug;

use crate::armor::{self, BlockType};
use crate::composed::KeyRing;
use crate::errors::{bail, format_err, unsupported_err, Error, Result};
use crate::packet::{
    LiteralData, OnePassSignature, Packet, PacketParser, PlainSessionKey, PublicKey,
    PublicKeyEncryptedSessionKey, Signature,
};
use crate::types::Tag;

/// An encrypted OpenPGP message, kept in its binary form.
///
/// Packets are only parsed on demand, so looking for a session key never
/// touches the encrypted payload.
#[derive(derive_more::Debug, Clone, PartialEq, Eq)]
pub struct Message {
    #[debug("{} bytes", raw.len())]
    raw: Bytes,
}

impl Message {
    pub fn from_bytes(input: impl Into<Bytes>) -> Self {
        Message { raw: input.into() }
    }

    /// Parses an armored `PGP MESSAGE` block.
    pub fn from_armor(input: &str) -> Result<(Self, armor::Headers)> {
        let (typ, headers, body) = armor::parse(input)?;
        match typ {
            BlockType::Message | BlockType::File => Ok((Self::from_bytes(body), headers)),
            typ => bail!("unexpected armor block {} when parsing a message", typ),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.raw
    }

    /// Iterates over the top level packets.
    pub fn packets(&self) -> PacketParser {
        PacketParser::new(self.raw.clone())
    }

    /// Returns the session key of the first encrypted session key packet one
    /// of the secret keys in `ring` can decrypt.
    ///
    /// Stops at the encrypted data, so whatever follows it is never parsed.
    /// `Ok(None)` means no key matched.
    pub fn decrypt_session_key(&self, ring: &KeyRing) -> Result<Option<PlainSessionKey>> {
        for packet in self.packets() {
            match packet? {
                Packet::PublicKeyEncryptedSessionKey(esk) => {
                    if let Some(session_key) = try_session_key(&esk, ring) {
                        return Ok(Some(session_key));
                    }
                }
                Packet::SymEncryptedProtectedData(_) => break,
                Packet::Other { tag, .. } if tag == Tag::SymEncryptedData => break,
                Packet::Other { tag, .. } if skippable(tag) => {
                    debug!("skipping {:?}", tag);
                }
                packet => bail!("unexpected packet {:?} in encrypted message", packet.tag()),
            }
        }

        Ok(None)
    }

    /// Decrypts the message with the secret keys in `ring`.
    ///
    /// One level of compression is unwrapped, nested compressed packets are
    /// rejected.
    pub fn decrypt(&self, ring: &KeyRing) -> Result<DecryptedMessage> {
        let mut esks = Vec::new();
        let mut encrypted = None;

        for packet in self.packets() {
            match packet? {
                Packet::PublicKeyEncryptedSessionKey(esk) => esks.push(esk),
                Packet::SymEncryptedProtectedData(data) => {
                    encrypted = Some(data);
                    break;
                }
                Packet::Other { tag, .. } if tag == Tag::SymEncryptedData => {
                    unsupported_err!("encrypted data without integrity protection");
                }
                Packet::Other { tag, .. } if skippable(tag) => {
                    debug!("skipping {:?}", tag);
                }
                packet => bail!("unexpected packet {:?} in encrypted message", packet.tag()),
            }
        }

        let encrypted = encrypted.ok_or_else(|| format_err!("no encrypted data found"))?;
        let session_key = esks
            .iter()
            .find_map(|esk| try_session_key(esk, ring))
            .ok_or(Error::MissingKey)?;

        let plaintext = encrypted.decrypt(&session_key)?;
        DecryptedMessage::from_bytes(Bytes::copy_from_slice(&plaintext))
    }
}

fn skippable(tag: Tag) -> bool {
    tag.is_ignorable() || tag == Tag::SymKeyEncryptedSessionKey
}

fn try_session_key(esk: &PublicKeyEncryptedSessionKey, ring: &KeyRing) -> Option<PlainSessionKey> {
    ring.secret_keys()
        .filter(|key| esk.matches(key))
        .find_map(|key| match esk.decrypt(key) {
            Ok(session_key) => Some(session_key),
            Err(err) => {
                debug!(
                    "key {:?} failed to decrypt session key: {}",
                    key.public_key().key_id(),
                    err
                );
                None
            }
        })
}

/// The contents of a decrypted message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecryptedMessage {
    pub literal: LiteralData,
    pub one_pass_signatures: Vec<OnePassSignature>,
    pub signatures: Vec<Signature>,
}

impl DecryptedMessage {
    /// Parses the packet stream found inside the encrypted data.
    pub fn from_bytes(input: impl Into<Bytes>) -> Result<Self> {
        let mut contents = Contents::default();
        contents.collect(input.into(), true)?;

        let literal = contents
            .literal
            .ok_or_else(|| format_err!("message without literal data"))?;

        Ok(DecryptedMessage {
            literal,
            one_pass_signatures: contents.one_pass_signatures,
            signatures: contents.signatures,
        })
    }

    pub fn data(&self) -> &[u8] {
        self.literal.data()
    }

    pub fn is_signed(&self) -> bool {
        !self.signatures.is_empty()
    }

    /// Verifies `signature` over the literal data.
    pub fn verify(&self, signature: &Signature, key: &PublicKey) -> Result<()> {
        signature.verify(key, self.literal.data())
    }
}

#[derive(Default)]
struct Contents {
    literal: Option<LiteralData>,
    one_pass_signatures: Vec<OnePassSignature>,
    signatures: Vec<Signature>,
}

impl Contents {
    fn collect(&mut self, input: Bytes, decompress: bool) -> Result<()> {
        for packet in PacketParser::new(input) {
            match packet? {
                Packet::CompressedData(data) => {
                    if !decompress {
                        unsupported_err!("nested compressed data");
                    }
                    let inner = data.decompress()?;
                    self.collect(Bytes::copy_from_slice(&inner), false)?;
                }
                Packet::LiteralData(literal) => {
                    if self.literal.is_some() {
                        bail!("more than one literal data packet");
                    }
                    self.literal = Some(literal);
                }
                Packet::OnePassSignature(ops) => self.one_pass_signatures.push(ops),
                Packet::Signature(sig) => self.signatures.push(sig),
                Packet::Other { tag, .. } if tag.is_ignorable() => {
                    debug!("skipping {:?}", tag);
                }
                packet => bail!("unexpected packet {:?} in decrypted data", packet.tag()),
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::composed::{SignedPublicKey, SignedSecretKey};
    use crate::packet::{CompressedData, DataMode};
    use crate::types::CompressionAlgorithm;

    const TEST_KEY: &str = include_str!("../../tests/fixtures/test-key.asc");
    const SIGNER_KEY: &str = include_str!("../../tests/fixtures/signer-key.pub.asc");
    const THIRD_PARTY_KEY: &str = include_str!("../../tests/fixtures/third-party-key.asc");
    const MESSAGE_SIGNED: &str = include_str!("../../tests/fixtures/message-signed.asc");
    const MESSAGE_UNSIGNED: &str = include_str!("../../tests/fixtures/message-unsigned.asc");
    const MESSAGE_MULTI: &str = include_str!("../../tests/fixtures/message-multi.asc");

    fn test_ring() -> KeyRing {
        let (key, _) = SignedSecretKey::from_armor_single(TEST_KEY).unwrap();
        let mut ring = KeyRing::new();
        ring.push_secret(key);
        ring
    }

    #[test]
    fn test_decrypt_unsigned() {
        let _ = pretty_env_logger::try_init();
        let (msg, _) = Message::from_armor(MESSAGE_UNSIGNED).unwrap();

        let decrypted = msg.decrypt(&test_ring()).unwrap();
        assert_eq!(decrypted.data(), b"Alpacas\n");
        assert!(!decrypted.is_signed());
    }

    #[test]
    fn test_decrypt_signed() {
        let (msg, _) = Message::from_armor(MESSAGE_SIGNED).unwrap();
        let (signer, _) = SignedPublicKey::from_armor_single(SIGNER_KEY).unwrap();

        let decrypted = msg.decrypt(&test_ring()).unwrap();
        assert_eq!(decrypted.data(), b"Alpacas\n");
        assert_eq!(decrypted.one_pass_signatures.len(), 1);
        assert!(decrypted.one_pass_signatures[0].is_last());
        assert_eq!(decrypted.signatures.len(), 1);

        let sig = &decrypted.signatures[0];
        assert_eq!(sig.issuer(), vec![signer.key_id(), signer.key_id()]);
        decrypted.verify(sig, &signer.primary_key).unwrap();

        let (test_key, _) = SignedSecretKey::from_armor_single(TEST_KEY).unwrap();
        assert!(decrypted
            .verify(sig, test_key.primary_key.public_key())
            .is_err());
    }

    #[test]
    fn test_session_key() {
        let (msg, _) = Message::from_armor(MESSAGE_SIGNED).unwrap();
        let session_key = msg.decrypt_session_key(&test_ring()).unwrap().unwrap();
        assert_eq!(
            session_key.to_hex_string().as_str(),
            "9:614AD58137B9175EFB36D4492F3B9E61338F54F770EF0952B5BFF2E0F4710221"
        );
    }

    #[test]
    fn test_session_key_multi_recipient() {
        let (msg, _) = Message::from_armor(MESSAGE_MULTI).unwrap();
        let session_key = msg.decrypt_session_key(&test_ring()).unwrap().unwrap();
        assert_eq!(
            session_key.to_hex_string().as_str(),
            "9:F24127109B096625480C9C54E460BC082B1998952AAF865EDA1CEBBB8DFCBFC9"
        );

        let (other, _) = SignedSecretKey::from_armor_single(THIRD_PARTY_KEY).unwrap();
        let mut ring = KeyRing::new();
        ring.push_secret(other);
        let from_other = msg.decrypt_session_key(&ring).unwrap().unwrap();
        assert_eq!(from_other, session_key);
    }

    #[test]
    fn test_no_matching_key() {
        let (msg, _) = Message::from_armor(MESSAGE_UNSIGNED).unwrap();
        let (other, _) = SignedSecretKey::from_armor_single(THIRD_PARTY_KEY).unwrap();
        let mut ring = KeyRing::new();
        ring.push_secret(other);

        assert!(msg.decrypt_session_key(&ring).unwrap().is_none());
        assert!(msg.decrypt(&ring).is_err());
        assert!(msg.decrypt_session_key(&KeyRing::new()).unwrap().is_none());
    }

    #[test]
    fn test_session_key_ignores_truncated_payload() {
        let (msg, _) = Message::from_armor(MESSAGE_UNSIGNED).unwrap();
        let raw = msg.as_bytes();
        let truncated = Message::from_bytes(raw[..raw.len() - 20].to_vec());

        assert!(truncated.decrypt_session_key(&test_ring()).unwrap().is_some());
        assert!(truncated.decrypt(&test_ring()).is_err());
    }

    #[test]
    fn test_rejects_other_blocks() {
        assert!(Message::from_armor(SIGNER_KEY).is_err());
    }

    fn literal(data: &[u8]) -> Vec<u8> {
        let mut body = vec![b'b', 0, 0, 0, 0, 0];
        body.extend_from_slice(data);
        let mut out = Vec::new();
        crate::packet::write_packet(&mut out, Tag::LiteralData, &LiteralData::from_buf(body.into()).unwrap())
            .unwrap();
        out
    }

    #[test]
    fn test_decompress_one_level() {
        let inner = literal(b"hello");
        let compressed = CompressedData::from_buf(
            [&[u8::from(CompressionAlgorithm::Uncompressed)][..], &inner].concat().into(),
        )
        .unwrap();
        let mut once = Vec::new();
        crate::packet::write_packet(&mut once, Tag::CompressedData, &compressed).unwrap();

        let decrypted = DecryptedMessage::from_bytes(once.clone()).unwrap();
        assert_eq!(decrypted.data(), b"hello");
        assert_eq!(decrypted.literal.mode(), DataMode::Binary);

        let twice = CompressedData::from_buf(
            [&[u8::from(CompressionAlgorithm::Uncompressed)][..], &once].concat().into(),
        )
        .unwrap();
        let mut nested = Vec::new();
        crate::packet::write_packet(&mut nested, Tag::CompressedData, &twice).unwrap();
        assert!(DecryptedMessage::from_bytes(nested).is_err());
    }

    #[test]
    fn test_requires_literal() {
        assert!(DecryptedMessage::from_bytes(Vec::new()).is_err());
        let two = [literal(b"a"), literal(b"b")].concat();
        assert!(DecryptedMessage::from_bytes(two).is_err());
    }
}
