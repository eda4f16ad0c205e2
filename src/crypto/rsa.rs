use log::debug;
use num_bigint::traits::ModInverse;
use num_bigint::BigUint;
use rand::{CryptoRng, Rng};
use rsa::traits::{PrivateKeyParts, PublicKeyParts};
use rsa::{Pkcs1v15Encrypt, Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};
use sha1::Sha1;
use zeroize::Zeroizing;

use crate::crypto::hash::HashAlgorithm;
use crate::errors::{bail, format_err, unsupported_err, Result};
use crate::types::{Mpi, PlainSecretParams, PublicParams, RsaPublicParams};

/// Largest modulus we accept, matching the MPI limit.
const MAX_KEY_SIZE: usize = 16384;

/// Builds the public key from its MPIs.
pub fn public_key(params: &RsaPublicParams) -> Result<RsaPublicKey> {
    let key = RsaPublicKey::new_with_max_size(params.n.to_biguint(), params.e.to_biguint(), MAX_KEY_SIZE)?;
    Ok(key)
}

/// Builds the private key from the public and secret MPIs.
pub fn private_key(
    params: &RsaPublicParams,
    d: &Mpi,
    p: &Mpi,
    q: &Mpi,
) -> Result<RsaPrivateKey> {
    let key = RsaPrivateKey::from_components(
        params.n.to_biguint(),
        params.e.to_biguint(),
        d.to_biguint(),
        vec![p.to_biguint(), q.to_biguint()],
    )?;
    key.validate()?;

    Ok(key)
}

/// RSA decryption using PKCS1v15 padding.
pub fn decrypt(priv_key: &RsaPrivateKey, mpi: &Mpi) -> Result<Zeroizing<Vec<u8>>> {
    let ciphertext = pad_to(mpi.as_ref(), priv_key.size())?;
    let m = priv_key.decrypt(Pkcs1v15Encrypt, &ciphertext)?;
    debug!("rsa decrypted {} bytes", m.len());

    Ok(Zeroizing::new(m))
}

/// Generate an RSA KeyPair.
pub fn generate_key<R: Rng + CryptoRng>(
    rng: &mut R,
    bit_size: usize,
) -> Result<(PublicParams, PlainSecretParams)> {
    let key = RsaPrivateKey::new(rng, bit_size)?;

    // OpenPGP stores u = p^-1 mod q, with p < q.
    let (p, q) = match key.primes() {
        [a, b] if a < b => (a, b),
        [a, b] => (b, a),
        _ => bail!("unexpected number of primes"),
    };
    let u = p
        .clone()
        .mod_inverse(q)
        .and_then(|u| u.to_biguint())
        .ok_or_else(|| format_err!("invalid prime"))?;

    Ok((
        PublicParams::RSA(RsaPublicParams {
            n: key.n().into(),
            e: key.e().into(),
        }),
        PlainSecretParams::RSA {
            d: key.d().into(),
            p: p.into(),
            q: q.into(),
            u: Mpi::from(&u),
        },
    ))
}

/// Verify a RSA, PKCS1v15 padded signature.
pub fn verify(
    key: &RsaPublicKey,
    hash: HashAlgorithm,
    hashed: &[u8],
    sig: &Mpi,
) -> Result<()> {
    let sig = pad_to(sig.as_ref(), key.size())?;
    key.verify(padding(hash)?, hashed, &sig)?;

    Ok(())
}

/// Sign using RSA, with PKCS1v15 padding.
pub fn sign(key: &RsaPrivateKey, hash: HashAlgorithm, digest: &[u8]) -> Result<Mpi> {
    let sig = key.sign(padding(hash)?, digest)?;

    Ok(Mpi::from_slice(&sig))
}

fn padding(hash: HashAlgorithm) -> Result<Pkcs1v15Sign> {
    let padding = match hash {
        HashAlgorithm::Sha1 => Pkcs1v15Sign::new::<Sha1>(),
        HashAlgorithm::Sha224 => Pkcs1v15Sign::new::<sha2::Sha224>(),
        HashAlgorithm::Sha256 => Pkcs1v15Sign::new::<sha2::Sha256>(),
        HashAlgorithm::Sha384 => Pkcs1v15Sign::new::<sha2::Sha384>(),
        HashAlgorithm::Sha512 => Pkcs1v15Sign::new::<sha2::Sha512>(),
        _ => unsupported_err!("rsa signature with hash {}", hash),
    };
    Ok(padding)
}

/// Left pads `val` with zeros, MPIs drop the leading zeros of fixed size values.
fn pad_to(val: &[u8], size: usize) -> Result<Zeroizing<Vec<u8>>> {
    if val.len() > size {
        bail!("value larger than the modulus: {} > {}", val.len(), size);
    }
    let mut out = Zeroizing::new(vec![0u8; size]);
    out[size - val.len()..].copy_from_slice(val);
    Ok(out)
}
