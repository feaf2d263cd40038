use alloy_primitives::hex::FromHexError;

/// Errors raised while decoding or encoding chain primitives.
#[derive(Debug, thiserror::Error)]
pub enum PrimitiveError {
    #[error(transparent)]
    InvalidHex(#[from] FromHexError),
    #[error("invalid base64: {0}")]
    InvalidBase64(#[from] base64::DecodeError),
    #[error("invalid address `{0}`")]
    InvalidAddress(String),
    #[error("expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
    #[error("invalid witness scope: {0}")]
    InvalidScope(String),
    #[error("invalid `{kind}` argument: {reason}")]
    InvalidArgument { kind: &'static str, reason: String },
    #[error("invalid fee: {0}")]
    InvalidFee(String),
    #[error("signer has no account")]
    MissingSignerAccount,
}

impl PrimitiveError {
    pub(crate) fn argument(kind: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument { kind, reason: reason.into() }
    }
}
