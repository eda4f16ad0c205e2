use std::io;

use byteorder::{BigEndian, WriteBytesExt};
use bytes::{Buf, Bytes};
use rsa::RsaPrivateKey;

use crate::crypto::checksum;
use crate::crypto::public_key::PublicKeyAlgorithm;
use crate::errors::Result;
use crate::parsing::BufParsing;
use crate::ser::Serialize;
use crate::types::Mpi;

/// Public RSA parameters.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct RsaPublicParams {
    pub n: Mpi,
    pub e: Mpi,
}

/// Represent the public parameters for the different algorithms.
///
/// Only RSA is interpreted, the parameters of every other algorithm are
/// kept as their raw encoding so fingerprints and serialization stay exact.
#[derive(Clone, PartialEq, Eq, derive_more::Debug)]
pub enum PublicParams {
    RSA(RsaPublicParams),
    Opaque(#[debug("{}", hex::encode(_0))] Bytes),
}

impl PublicParams {
    /// Parses the public parameters of `alg` off the front of `i`.
    pub fn from_buf(alg: PublicKeyAlgorithm, i: &mut Bytes) -> Result<Self> {
        if alg.is_rsa() {
            let n = Mpi::from_buf(&mut *i)?;
            let e = Mpi::from_buf(&mut *i)?;
            return Ok(PublicParams::RSA(RsaPublicParams { n, e }));
        }

        let start = i.clone();
        match alg {
            PublicKeyAlgorithm::DSA => skip_mpis(i, 4)?,
            PublicKeyAlgorithm::Elgamal | PublicKeyAlgorithm::Unknown(20) => skip_mpis(i, 3)?,
            PublicKeyAlgorithm::ECDSA | PublicKeyAlgorithm::EdDSALegacy => {
                skip_len_prefixed(i)?;
                skip_mpis(i, 1)?;
            }
            PublicKeyAlgorithm::ECDH => {
                skip_len_prefixed(i)?;
                skip_mpis(i, 1)?;
                skip_len_prefixed(i)?;
            }
            PublicKeyAlgorithm::X25519 | PublicKeyAlgorithm::Ed25519 => {
                i.read_take(32)?;
            }
            PublicKeyAlgorithm::X448 => {
                i.read_take(56)?;
            }
            PublicKeyAlgorithm::Ed448 => {
                i.read_take(57)?;
            }
            _ => {
                i.rest();
            }
        }
        let consumed = start.len() - i.remaining();

        Ok(PublicParams::Opaque(start.slice(..consumed)))
    }

    pub fn as_rsa(&self) -> Option<&RsaPublicParams> {
        match self {
            PublicParams::RSA(params) => Some(params),
            PublicParams::Opaque(_) => None,
        }
    }

    /// Bit length of the key, if known.
    pub fn bits(&self) -> Option<usize> {
        self.as_rsa().map(|p| p.n.bits())
    }
}

fn skip_mpis(i: &mut Bytes, count: usize) -> Result<()> {
    for _ in 0..count {
        Mpi::from_buf(&mut *i)?;
    }
    Ok(())
}

fn skip_len_prefixed(i: &mut Bytes) -> Result<()> {
    let len = i.read_u8()?;
    i.read_take(len.into())?;
    Ok(())
}

impl Serialize for PublicParams {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        match self {
            PublicParams::RSA(RsaPublicParams { n, e }) => {
                n.to_writer(writer)?;
                e.to_writer(writer)?;
            }
            PublicParams::Opaque(data) => writer.write_all(data)?,
        }
        Ok(())
    }

    fn write_len(&self) -> usize {
        match self {
            PublicParams::RSA(RsaPublicParams { n, e }) => n.write_len() + e.write_len(),
            PublicParams::Opaque(data) => data.len(),
        }
    }
}

/// Unprotected RSA secret parameters.
#[derive(Clone, PartialEq, Eq, derive_more::Debug)]
pub enum PlainSecretParams {
    RSA {
        #[debug("..")]
        d: Mpi,
        #[debug("..")]
        p: Mpi,
        #[debug("..")]
        q: Mpi,
        #[debug("..")]
        u: Mpi,
    },
}

impl PlainSecretParams {
    pub fn to_rsa(&self, public: &PublicParams) -> Result<RsaPrivateKey> {
        let PlainSecretParams::RSA { d, p, q, .. } = self;
        match public {
            PublicParams::RSA(params) => crate::crypto::rsa::private_key(params, d, p, q),
            PublicParams::Opaque(_) => crate::errors::bail!("inconsistent key state"),
        }
    }

    fn mpis(&self) -> [&Mpi; 4] {
        let PlainSecretParams::RSA { d, p, q, u } = self;
        [d, p, q, u]
    }
}

/// The secret part of a secret key packet.
#[derive(Clone, PartialEq, Eq, derive_more::Debug)]
pub enum SecretParams {
    Plain(PlainSecretParams),
    /// Passphrase protected material, kept verbatim starting with the
    /// string-to-key usage octet.
    Encrypted(#[debug("{} bytes", _0.len())] Bytes),
    /// Unprotected material of an algorithm we do not interpret.
    Unsupported(#[debug("{} bytes", _0.len())] Bytes),
}

impl SecretParams {
    pub fn from_buf(alg: PublicKeyAlgorithm, i: &mut Bytes) -> Result<Self> {
        if !i.has_remaining() {
            return Ok(SecretParams::Unsupported(Bytes::new()));
        }
        let raw = i.clone();
        let s2k_usage = i.read_u8()?;
        if s2k_usage != 0 {
            i.rest();
            return Ok(SecretParams::Encrypted(raw));
        }
        if !alg.is_rsa() {
            i.rest();
            return Ok(SecretParams::Unsupported(raw));
        }

        let mpi_start = i.clone();
        let d = Mpi::from_buf(&mut *i)?;
        let p = Mpi::from_buf(&mut *i)?;
        let q = Mpi::from_buf(&mut *i)?;
        let u = Mpi::from_buf(&mut *i)?;
        let mpi_len = mpi_start.len() - i.remaining();
        let actual = i.read_array::<2>()?;
        checksum::simple(actual, &mpi_start[..mpi_len])?;

        Ok(SecretParams::Plain(PlainSecretParams::RSA { d, p, q, u }))
    }
}

impl Serialize for SecretParams {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        match self {
            SecretParams::Plain(params) => {
                writer.write_u8(0)?;
                let mut buf = zeroize::Zeroizing::new(Vec::new());
                for mpi in params.mpis() {
                    mpi.to_writer(&mut *buf)?;
                }
                writer.write_all(&buf)?;
                writer.write_u16::<BigEndian>(checksum::calculate_simple(&buf))?;
            }
            SecretParams::Encrypted(data) | SecretParams::Unsupported(data) => {
                writer.write_all(data)?
            }
        }
        Ok(())
    }

    fn write_len(&self) -> usize {
        match self {
            SecretParams::Plain(params) => {
                1 + params.mpis().iter().map(|m| m.write_len()).sum::<usize>() + 2
            }
            SecretParams::Encrypted(data) | SecretParams::Unsupported(data) => data.len(),
        }
    }
}
