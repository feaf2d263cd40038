use crate::{
    error::RpcError,
    request::{Id, Version},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Response sent back over the session transport.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcResponse {
    pub id: Id,
    pub jsonrpc: Version,
    #[serde(flatten)]
    pub result: ResponseResult,
    /// Set for signature flows so callers can branch their display logic.
    #[serde(rename = "isMessage", default)]
    pub is_message: bool,
}

impl RpcResponse {
    pub fn success(id: Id, result: Value, is_message: bool) -> Self {
        Self { id, jsonrpc: Version::V2, result: ResponseResult::Success(result), is_message }
    }

    pub fn error(id: Id, error: RpcError) -> Self {
        Self { id, jsonrpc: Version::V2, result: ResponseResult::Error(error), is_message: false }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.result, ResponseResult::Error(_))
    }
}

/// Represents the result of a call either success or error
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseResult {
    #[serde(rename = "result")]
    Success(Value),
    #[serde(rename = "error")]
    Error(RpcError),
}

impl ResponseResult {
    pub fn as_success(&self) -> Option<&Value> {
        match self {
            Self::Success(value) => Some(value),
            Self::Error(_) => None,
        }
    }

    pub fn as_error(&self) -> Option<&RpcError> {
        match self {
            Self::Error(err) => Some(err),
            Self::Success(_) => None,
        }
    }
}
