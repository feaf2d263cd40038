use alloy_primitives::hex::FromHexError;
use neoconnect_primitives::PrimitiveError;
use neoconnect_rpc::RpcError;

#[derive(Debug, thiserror::Error)]
pub enum PrivateKeyError {
    #[error("Failed to create account from private key. Private key is invalid hex: {0}")]
    InvalidHex(#[from] FromHexError),
    #[error("Failed to create account from WIF: {0}")]
    InvalidWif(String),
    #[error("Failed to create account: invalid secp256r1 key")]
    InvalidKey,
}

/// Failure reported by a chain node or while talking to it.
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
    #[error("{message}")]
    Rpc { code: i64, message: String },
    #[error("unexpected node response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error(transparent)]
    Primitive(#[from] PrimitiveError),
    /// The VM faulted while simulating a script.
    #[error("{0}")]
    Fault(String),
    #[error("{0}")]
    Other(String),
}

/// Error returned by an external transaction signer.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct SigningError {
    message: String,
}

impl SigningError {
    pub fn other(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WalletError {
    /// Required context, such as an account with key material, is missing.
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// A chain call failed; carries the node's message verbatim.
    #[error("{0}")]
    ChainCall(String),
    #[error("signing failed: {0}")]
    Signing(String),
    #[error("invalid params: {0}")]
    InvalidParams(String),
    #[error(transparent)]
    Primitive(#[from] PrimitiveError),
    #[error(transparent)]
    PrivateKey(#[from] PrivateKeyError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl WalletError {
    pub fn invalid_state(reason: impl Into<String>) -> Self {
        Self::InvalidState(reason.into())
    }

    pub fn invalid_params(reason: impl std::fmt::Display) -> Self {
        Self::InvalidParams(reason.to_string())
    }
}

impl From<ChainError> for WalletError {
    fn from(err: ChainError) -> Self {
        Self::ChainCall(err.to_string())
    }
}

impl From<SigningError> for WalletError {
    fn from(err: SigningError) -> Self {
        Self::Signing(err.to_string())
    }
}

impl From<WalletError> for RpcError {
    fn from(err: WalletError) -> Self {
        match err {
            WalletError::InvalidParams(_) | WalletError::Primitive(_) => {
                Self::invalid_params(err.to_string())
            }
            WalletError::ChainCall(message) => Self::chain_call(message),
            err => Self::internal_error_with(err.to_string()),
        }
    }
}
