//! Contract call arguments and their conversion into chain parameters.

use crate::hash::ScriptHash;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Declared type of a contract argument.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArgType {
    Any,
    Boolean,
    Integer,
    ByteArray,
    String,
    Hash160,
    Hash256,
    PublicKey,
    Signature,
    Address,
    ScriptHash,
    Array,
    Map,
}

impl ArgType {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Any => "Any",
            Self::Boolean => "Boolean",
            Self::Integer => "Integer",
            Self::ByteArray => "ByteArray",
            Self::String => "String",
            Self::Hash160 => "Hash160",
            Self::Hash256 => "Hash256",
            Self::PublicKey => "PublicKey",
            Self::Signature => "Signature",
            Self::Address => "Address",
            Self::ScriptHash => "ScriptHash",
            Self::Array => "Array",
            Self::Map => "Map",
        }
    }
}

/// A contract argument as sent by the dApp: `{ "type": ..., "value": ... }`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Arg {
    #[serde(rename = "type")]
    pub kind: ArgType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl Arg {
    pub fn new(kind: ArgType, value: impl Into<Value>) -> Self {
        Self { kind, value: Some(value.into()) }
    }

    /// An argument without a value.
    pub const fn empty(kind: ArgType) -> Self {
        Self { kind, value: None }
    }

    /// The value, treating JSON `null` as absent.
    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref().filter(|v| !v.is_null())
    }
}

/// An argument after conversion into chain-native encoding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ContractParam {
    /// Passed through unchanged; encoded according to its declared type.
    Raw(Arg),
    /// A fixed-width account or contract hash.
    Hash160(ScriptHash),
    /// A converted nested list.
    Array(Vec<ContractParam>),
}

/// Converts every argument, preserving order.
pub fn convert_params(args: &[Arg]) -> Vec<ContractParam> {
    args.iter().map(convert_param).collect()
}

/// Converts one argument.
///
/// Never fails: anything that cannot be converted is passed through as [`ContractParam::Raw`]
/// and only rejected later, when the script is assembled.
pub fn convert_param(arg: &Arg) -> ContractParam {
    let raw = || ContractParam::Raw(arg.clone());
    let Some(value) = arg.value() else { return raw() };
    match arg.kind {
        ArgType::Address | ArgType::ScriptHash => value
            .as_str()
            .and_then(|s| ScriptHash::from_address_or_hex(s).ok())
            .map(ContractParam::Hash160)
            .unwrap_or_else(raw),
        ArgType::Array => value
            .as_array()
            .and_then(|items| {
                items
                    .iter()
                    .map(|item| serde_json::from_value::<Arg>(item.clone()).ok())
                    .collect::<Option<Vec<_>>>()
            })
            .map(|items| ContractParam::Array(convert_params(&items)))
            .unwrap_or_else(raw),
        _ => raw(),
    }
}
