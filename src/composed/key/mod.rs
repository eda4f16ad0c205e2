mod builder;

pub use self::builder::{KeyParams, KeyParamsBuilder, KeyType, MIN_RSA_BITS};
