use bytes::Bytes;
use log::{debug, warn};

use crate::armor::{self, BlockType};
use crate::composed::signed_key::{
    PublicOrSecret, SignedKeyDetails, SignedPublicKey, SignedPublicSubKey, SignedSecretKey,
    SignedSecretSubKey, SignedUser,
};
use crate::errors::{bail, Result};
use crate::packet::{Packet, PacketParser, PublicKey, SecretKey, Signature, SignatureType};

/// Parses a list of secret and public keys from ascii armored text.
pub fn from_armor_many(input: &str) -> Result<(Vec<PublicOrSecret>, armor::Headers)> {
    let (typ, headers, body) = armor::parse(input)?;
    match typ {
        BlockType::PublicKey | BlockType::PrivateKey | BlockType::File => {
            Ok((from_bytes_many(body)?, headers))
        }
        BlockType::Message | BlockType::MultiPartMessage(_, _) | BlockType::Signature => {
            bail!("unexpected armor block {} when parsing keys", typ)
        }
    }
}

/// Parses a list of secret and public keys from raw bytes.
pub fn from_bytes_many(input: impl Into<Bytes>) -> Result<Vec<PublicOrSecret>> {
    let mut keys = Vec::new();
    let mut current: Option<EntityBuilder> = None;

    for packet in PacketParser::new(input) {
        let packet = packet?;
        match packet {
            Packet::PublicKey(key) => {
                keys.extend(current.take().map(EntityBuilder::build));
                current = Some(EntityBuilder::new(Primary::Public(key)));
            }
            Packet::SecretKey(key) => {
                keys.extend(current.take().map(EntityBuilder::build));
                current = Some(EntityBuilder::new(Primary::Secret(key)));
            }
            Packet::Other { tag, .. } if tag.is_ignorable() => {
                debug!("skipping {:?}", tag);
            }
            packet => match current.as_mut() {
                Some(entity) => entity.push(packet)?,
                None => bail!("expected a primary key, found {:?}", packet.tag()),
            },
        }
    }
    keys.extend(current.take().map(EntityBuilder::build));

    Ok(keys)
}

enum Primary {
    Public(PublicKey),
    Secret(SecretKey),
}

/// Where signatures following the last packet belong to.
enum Target {
    Primary,
    User,
    PublicSubkey,
    SecretSubkey,
    Ignored,
}

/// Groups the packets of one transferable key, RFC 4880 section 11.1 and 11.2.
struct EntityBuilder {
    primary: Primary,
    revocation_signatures: Vec<Signature>,
    direct_signatures: Vec<Signature>,
    users: Vec<SignedUser>,
    public_subkeys: Vec<SignedPublicSubKey>,
    secret_subkeys: Vec<SignedSecretSubKey>,
    target: Target,
}

impl EntityBuilder {
    fn new(primary: Primary) -> Self {
        EntityBuilder {
            primary,
            revocation_signatures: Vec::new(),
            direct_signatures: Vec::new(),
            users: Vec::new(),
            public_subkeys: Vec::new(),
            secret_subkeys: Vec::new(),
            target: Target::Primary,
        }
    }

    fn push(&mut self, packet: Packet) -> Result<()> {
        match packet {
            Packet::UserId(id) => {
                self.users.push(SignedUser::new(id, Vec::new()));
                self.target = Target::User;
            }
            Packet::PublicSubkey(key) => {
                self.public_subkeys.push(SignedPublicSubKey::new(key, Vec::new()));
                self.target = Target::PublicSubkey;
            }
            Packet::SecretSubkey(key) => {
                if matches!(self.primary, Primary::Public(_)) {
                    bail!("secret subkey on a public primary key");
                }
                self.secret_subkeys.push(SignedSecretSubKey::new(key, Vec::new()));
                self.target = Target::SecretSubkey;
            }
            Packet::Signature(sig) => self.push_signature(sig),
            Packet::Other { tag, .. } => {
                // user attributes and their certifications are dropped
                warn!("ignoring {:?} packet in key", tag);
                self.target = Target::Ignored;
            }
            packet => bail!("unexpected packet {:?} in key", packet.tag()),
        }

        Ok(())
    }

    fn push_signature(&mut self, sig: Signature) {
        match self.target {
            Target::Primary => {
                if sig.typ() == SignatureType::KeyRevocation {
                    self.revocation_signatures.push(sig);
                } else {
                    self.direct_signatures.push(sig);
                }
            }
            Target::User => {
                if let Some(user) = self.users.last_mut() {
                    user.signatures.push(sig);
                }
            }
            Target::PublicSubkey => {
                if let Some(key) = self.public_subkeys.last_mut() {
                    key.signatures.push(sig);
                }
            }
            Target::SecretSubkey => {
                if let Some(key) = self.secret_subkeys.last_mut() {
                    key.signatures.push(sig);
                }
            }
            Target::Ignored => {}
        }
    }

    fn build(self) -> PublicOrSecret {
        let details = SignedKeyDetails::new(
            self.revocation_signatures,
            self.direct_signatures,
            self.users,
        );

        match self.primary {
            Primary::Public(primary) => PublicOrSecret::Public(SignedPublicKey::new(
                primary,
                details,
                self.public_subkeys,
            )),
            Primary::Secret(primary) => PublicOrSecret::Secret(SignedSecretKey::new(
                primary,
                details,
                self.public_subkeys,
                self.secret_subkeys,
            )),
        }
    }
}
