//! Transaction signers, witness scopes and witnesses.

use crate::{encoding::BinaryWriter, error::PrimitiveError, hash::ScriptHash};
use alloy_primitives::{Bytes, hex};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use std::fmt;

/// Authorization breadth granted to a transaction signer.
///
/// `None`, `CalledByEntry` and `Global` stand alone; `CustomContracts` and `CustomGroups` may be
/// combined with each other.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct WitnessScope(u8);

impl WitnessScope {
    pub const NONE: Self = Self(0x00);
    pub const CALLED_BY_ENTRY: Self = Self(0x01);
    pub const CUSTOM_CONTRACTS: Self = Self(0x10);
    pub const CUSTOM_GROUPS: Self = Self(0x20);
    pub const GLOBAL: Self = Self(0x80);

    const CUSTOM: u8 = Self::CUSTOM_CONTRACTS.0 | Self::CUSTOM_GROUPS.0;

    const NAMES: [(&'static str, Self); 5] = [
        ("None", Self::NONE),
        ("CalledByEntry", Self::CALLED_BY_ENTRY),
        ("CustomContracts", Self::CUSTOM_CONTRACTS),
        ("CustomGroups", Self::CUSTOM_GROUPS),
        ("Global", Self::GLOBAL),
    ];

    /// Validates a raw scope byte.
    pub fn from_bits(bits: u8) -> Result<Self, PrimitiveError> {
        let valid = matches!(bits, 0x00 | 0x01 | 0x80) || (bits != 0 && bits & !Self::CUSTOM == 0);
        if valid {
            Ok(Self(bits))
        } else {
            Err(PrimitiveError::InvalidScope(format!("{bits:#04x}")))
        }
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }
}

impl fmt::Debug for WitnessScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for WitnessScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::NONE {
            return f.write_str("None");
        }
        let names = Self::NAMES
            .iter()
            .filter(|(_, scope)| self.contains(*scope))
            .map(|(name, _)| *name)
            .collect::<Vec<_>>();
        f.write_str(&names.join(", "))
    }
}

impl std::str::FromStr for WitnessScope {
    type Err = PrimitiveError;

    /// Parses `"CalledByEntry"` or a list such as `"CustomContracts, CustomGroups"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bits = 0u8;
        for part in s.split([',', '|']).map(str::trim) {
            let (_, scope) = Self::NAMES
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(part))
                .ok_or_else(|| PrimitiveError::InvalidScope(part.to_string()))?;
            bits |= scope.0;
        }
        Self::from_bits(bits)
    }
}

impl Serialize for WitnessScope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.0)
    }
}

impl<'de> Deserialize<'de> for WitnessScope {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Bits(u8),
            Names(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Bits(bits) => Self::from_bits(bits),
            Repr::Names(names) => names.parse(),
        }
        .map_err(de::Error::custom)
    }
}

/// A 33-byte compressed public key identifying a contract group.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct GroupKey([u8; 33]);

impl GroupKey {
    pub fn as_bytes(&self) -> &[u8; 33] {
        &self.0
    }
}

impl fmt::Debug for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl std::str::FromStr for GroupKey {
    type Err = PrimitiveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(hex::decode_to_array(s)?))
    }
}

impl Serialize for GroupKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(self.0))
    }
}

impl<'de> Deserialize<'de> for GroupKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer)?.parse().map_err(de::Error::custom)
    }
}

/// A transaction signer.
///
/// `account` may be left out of a request, in which case the invoking account is filled in before
/// the transaction is built.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<ScriptHash>,
    pub scopes: WitnessScope,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_contracts: Vec<ScriptHash>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_groups: Vec<GroupKey>,
}

impl Signer {
    /// The default signer: entry-only authorization for `account`.
    pub fn called_by_entry(account: ScriptHash) -> Self {
        Self {
            account: Some(account),
            scopes: WitnessScope::CALLED_BY_ENTRY,
            allowed_contracts: Vec::new(),
            allowed_groups: Vec::new(),
        }
    }

    /// Fills in `account` if the signer does not name one.
    pub fn with_default_account(mut self, account: ScriptHash) -> Self {
        self.account.get_or_insert(account);
        self
    }

    pub fn account(&self) -> Result<ScriptHash, PrimitiveError> {
        self.account.ok_or(PrimitiveError::MissingSignerAccount)
    }

    pub(crate) fn encode(&self, writer: &mut BinaryWriter) -> Result<(), PrimitiveError> {
        writer.write_bytes(self.account()?.as_le_bytes()).write_u8(self.scopes.bits());
        if self.scopes.contains(WitnessScope::CUSTOM_CONTRACTS) {
            writer.write_var_int(self.allowed_contracts.len() as u64);
            for contract in &self.allowed_contracts {
                writer.write_bytes(contract.as_le_bytes());
            }
        }
        if self.scopes.contains(WitnessScope::CUSTOM_GROUPS) {
            writer.write_var_int(self.allowed_groups.len() as u64);
            for group in &self.allowed_groups {
                writer.write_bytes(group.as_bytes());
            }
        }
        Ok(())
    }

    /// The JSON shape node RPC methods such as `invokescript` expect.
    pub fn to_rpc_json(&self) -> Result<serde_json::Value, PrimitiveError> {
        let mut obj = serde_json::json!({
            "account": self.account()?.to_string(),
            "scopes": self.scopes.to_string(),
        });
        if self.scopes.contains(WitnessScope::CUSTOM_CONTRACTS) {
            obj["allowedcontracts"] = serde_json::json!(self.allowed_contracts);
        }
        if self.scopes.contains(WitnessScope::CUSTOM_GROUPS) {
            obj["allowedgroups"] = serde_json::json!(self.allowed_groups);
        }
        Ok(obj)
    }
}

/// Invocation and verification scripts proving a signer's authorization.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Witness {
    pub invocation: Bytes,
    pub verification: Bytes,
}

impl Witness {
    /// A witness whose invocation script has not been produced yet.
    pub fn placeholder(verification: Bytes) -> Self {
        Self { invocation: Bytes::new(), verification }
    }

    pub fn is_signed(&self) -> bool {
        !self.invocation.is_empty()
    }

    pub(crate) fn encode(&self, writer: &mut BinaryWriter) {
        writer.write_var_bytes(&self.invocation).write_var_bytes(&self.verification);
    }
}
