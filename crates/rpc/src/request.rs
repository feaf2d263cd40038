use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// The version tag every envelope carries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Version {
    #[default]
    #[serde(rename = "2.0")]
    V2,
}

/// Protocol-assigned identifier of a request.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Id {
    Number(u64),
    String(String),
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(num) => num.fmt(f),
            Self::String(s) => s.fmt(f),
        }
    }
}

impl From<u64> for Id {
    fn from(id: u64) -> Self {
        Self::Number(id)
    }
}

impl From<&str> for Id {
    fn from(id: &str) -> Self {
        Self::String(id.to_string())
    }
}

/// An inbound request forwarded by a paired peer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcRequest {
    pub id: Id,
    #[serde(default)]
    pub jsonrpc: Version,
    pub method: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub params: Value,
}

impl RpcRequest {
    pub fn new(id: impl Into<Id>, method: impl Into<String>, params: Value) -> Self {
        Self { id: id.into(), jsonrpc: Version::V2, method: method.into(), params }
    }

    /// Deterministic encoding of the request body.
    ///
    /// The id is left out so that two identical calls issued at different times share the same
    /// form. Object keys are emitted in sorted order.
    pub fn canonical_form(&self) -> String {
        serde_json::json!({ "method": self.method, "params": self.params }).to_string()
    }
}
