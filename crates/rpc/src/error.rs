//! Error object carried in a failed response.

use serde::{Deserialize, Serialize};
use std::{borrow::Cow, fmt};

/// The `error` member of a response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcError {
    pub code: ErrorCode,
    pub message: Cow<'static, str>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl RpcError {
    /// An error with the code's standard message.
    pub const fn new(code: ErrorCode) -> Self {
        Self { message: Cow::Borrowed(code.message()), code, data: None }
    }

    fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self { code, message: Cow::Owned(message.into()), data: None }
    }

    /// The request named a method the wallet does not serve.
    pub const fn method_not_found() -> Self {
        Self::new(ErrorCode::MethodNotFound)
    }

    /// The user, or the approval policy acting for them, declined the request.
    pub const fn user_rejected() -> Self {
        Self::new(ErrorCode::UserRejected)
    }

    /// Generic answer for a request that could not be fulfilled.
    pub const fn failed_or_rejected() -> Self {
        Self {
            code: ErrorCode::InternalError,
            message: Cow::Borrowed("Failed or Rejected Request"),
            data: None,
        }
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::InvalidParams, message)
    }

    pub fn internal_error_with(message: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::InternalError, message)
    }

    /// A call against the chain node failed; `message` is the node's, verbatim.
    pub fn chain_call(message: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::ChainCallFailed, message)
    }
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.code.code())
    }
}

impl std::error::Error for RpcError {}

/// Codes the wallet answers dApp requests with.
///
/// Serialized as the bare integer. Codes sent by other parties that the wallet never emits
/// itself are kept as [`ErrorCode::Other`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum ErrorCode {
    MethodNotFound,
    InvalidParams,
    InternalError,
    /// The chain node rejected or failed a call.
    ChainCallFailed,
    UserRejected,
    Other(i64),
}

impl ErrorCode {
    pub const fn code(&self) -> i64 {
        match *self {
            Self::MethodNotFound => -32601,
            Self::InvalidParams => -32602,
            Self::InternalError => -32603,
            Self::ChainCallFailed => -32000,
            Self::UserRejected => 5000,
            Self::Other(code) => code,
        }
    }

    pub const fn message(&self) -> &'static str {
        match *self {
            Self::MethodNotFound => "Method not found",
            Self::InvalidParams => "Invalid params",
            Self::InternalError => "Internal error",
            Self::ChainCallFailed => "Chain call failed",
            Self::UserRejected => "User rejected.",
            Self::Other(_) => "Unknown error",
        }
    }
}

impl From<i64> for ErrorCode {
    fn from(code: i64) -> Self {
        match code {
            -32601 => Self::MethodNotFound,
            -32602 => Self::InvalidParams,
            -32603 => Self::InternalError,
            -32000 => Self::ChainCallFailed,
            5000 => Self::UserRejected,
            code => Self::Other(code),
        }
    }
}

impl From<ErrorCode> for i64 {
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}
