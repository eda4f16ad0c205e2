mod compression;
mod fingerprint;
mod key_id;
mod mpi;
mod packet;
mod params;

pub use self::compression::CompressionAlgorithm;
pub use self::fingerprint::Fingerprint;
pub use self::key_id::KeyId;
pub use self::mpi::Mpi;
pub use self::packet::{PacketLength, Tag};
pub use self::params::{PlainSecretParams, PublicParams, RsaPublicParams, SecretParams};
