//! Accounts backed by secp256r1 keys.

use crate::error::{PrivateKeyError, WalletError};
use alloy_primitives::{B256, Bytes, hex};
use neoconnect_primitives::{ScriptHash, signature_verification_script};
use p256::ecdsa::{Signature, SigningKey, VerifyingKey, signature::Signer as _};
use std::fmt;

/// Version byte of WIF-encoded private keys.
const WIF_VERSION: u8 = 0x80;

/// A wallet account.
///
/// Always carries a public key; key material is optional, so a watch-only account can still be
/// paired and used for simulations.
#[derive(Clone)]
pub struct Account {
    public_key: [u8; 33],
    script_hash: ScriptHash,
    signing_key: Option<SigningKey>,
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("address", &self.address())
            .field("public_key", &hex::encode(self.public_key))
            .field("can_sign", &self.can_sign())
            .finish()
    }
}

impl Account {
    /// Creates an account from a raw hex private key.
    pub fn from_private_key(private_key: &str) -> Result<Self, PrivateKeyError> {
        let bytes: B256 = private_key.parse()?;
        Self::from_key_bytes(bytes.as_slice())
    }

    /// Creates an account from a WIF-encoded private key.
    pub fn from_wif(wif: &str) -> Result<Self, PrivateKeyError> {
        let decoded = bs58::decode(wif)
            .with_check(Some(WIF_VERSION))
            .into_vec()
            .map_err(|err| PrivateKeyError::InvalidWif(err.to_string()))?;
        // version, 32 key bytes, compression flag
        match decoded.as_slice() {
            [WIF_VERSION, key @ .., 0x01] if key.len() == 32 => Self::from_key_bytes(key),
            _ => Err(PrivateKeyError::InvalidWif(format!("unexpected payload length {}", decoded.len()))),
        }
    }

    /// Creates a watch-only account from a compressed public key.
    pub fn watch_only(public_key: &str) -> Result<Self, PrivateKeyError> {
        let public_key: [u8; 33] = hex::decode_to_array(public_key)?;
        VerifyingKey::from_sec1_bytes(&public_key).map_err(|_| PrivateKeyError::InvalidKey)?;
        Ok(Self::from_parts(public_key, None))
    }

    fn from_key_bytes(bytes: &[u8]) -> Result<Self, PrivateKeyError> {
        let signing_key = SigningKey::from_slice(bytes).map_err(|_| PrivateKeyError::InvalidKey)?;
        let point = signing_key.verifying_key().to_encoded_point(true);
        let public_key: [u8; 33] =
            point.as_bytes().try_into().map_err(|_| PrivateKeyError::InvalidKey)?;
        Ok(Self::from_parts(public_key, Some(signing_key)))
    }

    fn from_parts(public_key: [u8; 33], signing_key: Option<SigningKey>) -> Self {
        let script_hash = ScriptHash::from_script(&signature_verification_script(&public_key));
        Self { public_key, script_hash, signing_key }
    }

    /// Compressed public key.
    pub fn public_key(&self) -> &[u8; 33] {
        &self.public_key
    }

    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_key)
    }

    pub fn script_hash(&self) -> ScriptHash {
        self.script_hash
    }

    pub fn address(&self) -> String {
        self.script_hash.to_address()
    }

    pub fn verification_script(&self) -> Bytes {
        signature_verification_script(&self.public_key)
    }

    /// Whether the account holds key material.
    pub fn can_sign(&self) -> bool {
        self.signing_key.is_some()
    }

    /// Signs `message` with ECDSA over its SHA-256 digest.
    pub fn sign(&self, message: &[u8]) -> Result<[u8; 64], WalletError> {
        let key = self
            .signing_key
            .as_ref()
            .ok_or_else(|| WalletError::invalid_state("account has no private key"))?;
        let signature: Signature =
            key.try_sign(message).map_err(|err| WalletError::Signing(err.to_string()))?;
        let mut out = [0u8; 64];
        out.copy_from_slice(&signature.to_bytes());
        Ok(out)
    }
}

/// Verifies a 64-byte `r ‖ s` signature over the SHA-256 digest of `message`.
pub fn verify_signature(public_key: &[u8], message: &[u8], signature: &[u8]) -> bool {
    use p256::ecdsa::signature::Verifier;

    let Ok(key) = VerifyingKey::from_sec1_bytes(public_key) else { return false };
    let Ok(signature) = Signature::from_slice(signature) else { return false };
    key.verify(message, &signature).is_ok()
}
