use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::engine::error::EngineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    #[display("create")]
    Create,
    #[display("read")]
    Read,
    #[display("update")]
    Update,
    #[display("delete")]
    Delete,
    #[display("list")]
    List,
}

/// A request against the engine, relative to its mount point.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub operation: Operation,
    pub path: String,
    pub data: Map<String, Value>,
}

impl Request {
    pub fn new(operation: Operation, path: impl Into<String>) -> Self {
        Request {
            operation,
            path: path.into(),
            data: Map::new(),
        }
    }

    /// Sets a single request field.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// Deserializes the request fields into typed options. Unknown fields are
    /// ignored, mistyped ones rejected.
    pub(crate) fn options<T: DeserializeOwned>(&self) -> Result<T, EngineError> {
        serde_json::from_value(Value::Object(self.data.clone())).map_err(|err| {
            EngineError::RequestInvalid {
                message: err.to_string(),
            }
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Response {
    pub data: Map<String, Value>,
}

impl Response {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// A string field of the response.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(Value::as_str)
    }
}

impl<K: Into<String>, const N: usize> From<[(K, Value); N]> for Response {
    fn from(fields: [(K, Value); N]) -> Self {
        Response {
            data: fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_key_bits() -> u32 {
    2048
}

/// Fields of `keys/<name>` writes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct KeyOptions {
    #[serde(default = "default_true")]
    pub generate: bool,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub real_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default = "default_key_bits")]
    pub key_bits: u32,
    #[serde(default)]
    pub exportable: bool,
}

/// Fields of `sign/<name>`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SignOptions {
    #[serde(default)]
    pub input: String,
    #[serde(default)]
    pub algorithm: Option<String>,
    /// Hash algorithm as captured from the path, takes precedence over `algorithm`.
    #[serde(default)]
    pub urlalgorithm: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
}

/// Fields of `verify/<name>`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VerifyOptions {
    #[serde(default)]
    pub input: String,
    #[serde(default)]
    pub signature: String,
    #[serde(default)]
    pub format: Option<String>,
}

/// Fields of `decrypt/<name>` and `show-session-key/<name>`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DecryptOptions {
    #[serde(default)]
    pub ciphertext: String,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub signer_key: Option<String>,
}
