mod config;
mod subpacket;
mod types;

pub use self::config::{SignatureConfig, SignatureConfigBuilder};
pub use self::subpacket::{KeyFlags, Subpacket, SubpacketData, SubpacketType};
pub use self::types::{Signature, SignatureType};
