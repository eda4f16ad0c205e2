mod public;
mod secret;

pub use self::public::PublicKey;
pub use self::secret::SecretKey;
