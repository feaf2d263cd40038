//! Off-chain message signing.
//!
//! A message is wrapped in a fixed envelope before signing so the signature can never be replayed
//! as a transaction witness.

use crate::{
    account::{Account, verify_signature},
    error::WalletError,
};
use alloy_primitives::hex;
use neoconnect_primitives::encoding::var_int;
use serde::{Deserialize, Serialize};

/// Hex prefix of every message envelope.
pub const ENVELOPE_PREFIX: &str = "010001f0";

/// Hex suffix of every message envelope.
pub const ENVELOPE_SUFFIX: &str = "0000";

/// Bytes of random salt mixed into salted messages.
pub const SALT_LEN: usize = 16;

/// Message envelope format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum MessageVersion {
    /// Random salt prepended to the message.
    #[default]
    Salted,
    /// The message alone.
    Unsalted,
}

impl TryFrom<u8> for MessageVersion {
    type Error = String;

    fn try_from(version: u8) -> Result<Self, Self::Error> {
        match version {
            1 => Ok(Self::Salted),
            2 => Ok(Self::Unsalted),
            v => Err(format!("unsupported message version {v}")),
        }
    }
}

impl From<MessageVersion> for u8 {
    fn from(version: MessageVersion) -> Self {
        match version {
            MessageVersion::Salted => 1,
            MessageVersion::Unsalted => 2,
        }
    }
}

/// `signMessage` parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignMessageParams {
    pub message: String,
    #[serde(default)]
    pub version: MessageVersion,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedMessage {
    /// Compressed public key, hex.
    pub public_key: String,
    /// Signature `r ‖ s`, hex.
    pub data: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salt: Option<String>,
    /// The signed envelope, hex.
    pub message_hex: String,
}

/// Wraps `payload` in the signing envelope, returning it hex encoded.
pub fn envelope_hex(payload: &str) -> String {
    let bytes = payload.as_bytes();
    format!(
        "{ENVELOPE_PREFIX}{}{}{ENVELOPE_SUFFIX}",
        hex::encode(var_int(bytes.len() as u64)),
        hex::encode(bytes)
    )
}

/// Signs `message` with `account`.
///
/// The salted form draws a fresh salt per call, so its output is not reproducible.
pub fn sign_message(
    account: &Account,
    message: &str,
    version: MessageVersion,
) -> Result<SignedMessage, WalletError> {
    let salt = match version {
        MessageVersion::Salted => Some(hex::encode(rand::random::<[u8; SALT_LEN]>())),
        MessageVersion::Unsalted => None,
    };
    let payload = format!("{}{message}", salt.as_deref().unwrap_or_default());
    let message_hex = envelope_hex(&payload);
    let envelope = hex::decode(&message_hex).map_err(|err| WalletError::Signing(err.to_string()))?;
    let signature = account.sign(&envelope)?;

    Ok(SignedMessage {
        public_key: account.public_key_hex(),
        data: hex::encode(signature),
        salt,
        message_hex,
    })
}

/// Checks `signed.data` against the envelope and public key it carries.
///
/// Malformed fields yield `false`.
pub fn verify_message(signed: &SignedMessage) -> bool {
    let (Ok(public_key), Ok(envelope), Ok(signature)) =
        (hex::decode(&signed.public_key), hex::decode(&signed.message_hex), hex::decode(&signed.data))
    else {
        return false;
    };
    verify_signature(&public_key, &envelope, &signature)
}
