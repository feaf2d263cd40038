use neoconnect_rpc::RpcError;
use neoconnect_wallets::WalletError;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Reason attached to a session decline or disconnect.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reason {
    pub code: i64,
    pub message: Cow<'static, str>,
}

impl Reason {
    pub const USER_REJECTED: Self = Self::new(5000, "User rejected.");
    pub const UNSUPPORTED_CHAINS: Self = Self::new(5100, "Unsupported chains.");
    pub const UNSUPPORTED_METHODS: Self = Self::new(5101, "Unsupported methods.");
    pub const USER_DISCONNECTED: Self = Self::new(6000, "User disconnected.");

    const fn new(code: i64, message: &'static str) -> Self {
        Self { code, message: Cow::Borrowed(message) }
    }
}

/// Error reported by the session transport.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct TransportError {
    message: String,
}

impl TransportError {
    pub fn other(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// Error reported by an approval store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("unsupported chain `{0}`")]
    UnsupportedChain(String),
    #[error("unsupported method `{0}`")]
    UnsupportedMethod(String),
    #[error("invalid state: {0}")]
    InvalidState(String),
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Wallet(#[from] WalletError),
    #[error("request rejected: {0}")]
    RequestRejected(RpcError),
    #[error("approval store error: {0}")]
    Store(#[from] StoreError),
}

impl SessionError {
    pub fn invalid_state(reason: impl Into<String>) -> Self {
        Self::InvalidState(reason.into())
    }

    /// The decline reason sent to the peer for a proposal-time error.
    pub fn reason(&self) -> Reason {
        match self {
            Self::UnsupportedChain(_) => Reason::UNSUPPORTED_CHAINS,
            Self::UnsupportedMethod(_) => Reason::UNSUPPORTED_METHODS,
            _ => Reason::USER_REJECTED,
        }
    }
}

impl From<SessionError> for RpcError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::UnsupportedMethod(_) => Self::method_not_found(),
            SessionError::RequestRejected(err) => err,
            SessionError::Wallet(err) => err.into(),
            _ => Self::failed_or_rejected(),
        }
    }
}
