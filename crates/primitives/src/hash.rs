//! Script hashes and addresses.

use crate::error::PrimitiveError;
use alloy_primitives::{B256, FixedBytes, hex};
use ripemd::Ripemd160;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::{fmt, str::FromStr};

/// Version byte prefixed to N3 addresses before base58check encoding.
pub const ADDRESS_VERSION: u8 = 0x35;

/// 160-bit identifier of a contract or account, derived from its verification script.
///
/// Bytes are kept in little-endian order, the way they appear in scripts and transactions. The
/// textual form is the big-endian `0x`-prefixed hex string used by RPC nodes and explorers.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScriptHash(FixedBytes<20>);

impl ScriptHash {
    pub const ZERO: Self = Self(FixedBytes::ZERO);

    /// Wraps little-endian bytes.
    pub const fn from_le_bytes(bytes: [u8; 20]) -> Self {
        Self(FixedBytes(bytes))
    }

    /// Hashes a verification script: `ripemd160(sha256(script))`.
    pub fn from_script(script: &[u8]) -> Self {
        let digest = Ripemd160::digest(Sha256::digest(script));
        Self(FixedBytes::from_slice(&digest))
    }

    /// Little-endian bytes.
    pub fn as_le_bytes(&self) -> &[u8; 20] {
        &self.0.0
    }

    /// Parses the big-endian hex form, with or without `0x`.
    pub fn from_hex(s: &str) -> Result<Self, PrimitiveError> {
        let mut bytes: [u8; 20] = hex::decode_to_array(s)?;
        bytes.reverse();
        Ok(Self::from_le_bytes(bytes))
    }

    /// Decodes an N3 address.
    pub fn from_address(address: &str) -> Result<Self, PrimitiveError> {
        let invalid = || PrimitiveError::InvalidAddress(address.to_string());
        let decoded =
            bs58::decode(address).with_check(Some(ADDRESS_VERSION)).into_vec().map_err(|_| invalid())?;
        let payload: [u8; 20] = decoded.get(1..).and_then(|p| p.try_into().ok()).ok_or_else(invalid)?;
        Ok(Self::from_le_bytes(payload))
    }

    /// Accepts either an address or a script hash in hex form.
    pub fn from_address_or_hex(s: &str) -> Result<Self, PrimitiveError> {
        if is_address(s) { Self::from_address(s) } else { Self::from_hex(s) }
    }

    /// Encodes this hash as an N3 address.
    pub fn to_address(&self) -> String {
        let mut payload = Vec::with_capacity(21);
        payload.push(ADDRESS_VERSION);
        payload.extend_from_slice(self.as_le_bytes());
        bs58::encode(payload).with_check().into_string()
    }
}

/// Addresses are 34 base58 characters starting with `N`; hex forms never are.
fn is_address(s: &str) -> bool {
    s.len() == 34 && s.starts_with('N')
}

impl fmt::Display for ScriptHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut be = self.0.0;
        be.reverse();
        write!(f, "0x{}", hex::encode(be))
    }
}

impl fmt::Debug for ScriptHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl FromStr for ScriptHash {
    type Err = PrimitiveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_address_or_hex(s)
    }
}

impl Serialize for ScriptHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ScriptHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Formats a 256-bit hash (transaction id, block hash) the way nodes print it.
pub fn hash256_to_string(hash: &B256) -> String {
    let mut be = hash.0;
    be.reverse();
    format!("0x{}", hex::encode(be))
}

/// Parses a `0x`-prefixed big-endian 256-bit hash into little-endian bytes.
pub fn hash256_from_str(s: &str) -> Result<B256, PrimitiveError> {
    let mut bytes: [u8; 32] = hex::decode_to_array(s)?;
    bytes.reverse();
    Ok(B256::from(bytes))
}
