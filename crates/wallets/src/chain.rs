//! The chain node boundary.

use crate::error::ChainError;
use alloy_primitives::Bytes;
use async_trait::async_trait;
use neoconnect_primitives::{Signer, Transaction};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use serde_json::{Map, Value};
use std::fmt;

/// Asynchronous access to a chain node.
#[async_trait]
#[auto_impl::auto_impl(&, Box, Arc)]
pub trait ChainClient: Send + Sync + fmt::Debug {
    /// Network magic of the chain the node serves.
    async fn network_magic(&self) -> Result<u32, ChainError>;

    /// Current block height.
    async fn block_count(&self) -> Result<u32, ChainError>;

    /// Simulates `script` with the given signers. Never changes chain state.
    async fn invoke_script(&self, script: &Bytes, signers: &[Signer])
    -> Result<InvokeResult, ChainError>;

    /// Network fee the node requires for `tx` with its current witnesses.
    async fn calculate_network_fee(&self, tx: &Transaction) -> Result<i64, ChainError>;

    /// Broadcasts `tx`, returning its id.
    async fn send_raw_transaction(&self, tx: &Transaction) -> Result<String, ChainError>;

    /// Execution log of a persisted transaction.
    async fn application_log(&self, txid: &str) -> Result<Value, ChainError>;

    /// Any other query.
    async fn execute(&self, method: &str, params: Value) -> Result<Value, ChainError>;
}

/// Final state of a VM run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VmState {
    None,
    Halt,
    Fault,
    Break,
}

/// Outcome of a simulated script.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InvokeResult {
    /// The script that was run, base64.
    #[serde(default)]
    pub script: String,
    pub state: VmState,
    #[serde(rename = "gasconsumed", with = "lenient_i64")]
    pub gas_consumed: i64,
    #[serde(default)]
    pub exception: Option<String>,
    #[serde(default)]
    pub stack: Vec<Value>,
    /// Notifications, session ids and whatever else the node reports.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl InvokeResult {
    /// Fails with the VM exception unless the run halted.
    pub fn ensure_halted(&self) -> Result<(), ChainError> {
        if self.state == VmState::Halt {
            return Ok(());
        }
        Err(ChainError::Fault(
            self.exception.clone().unwrap_or_else(|| format!("VM ended in state {:?}", self.state)),
        ))
    }
}

/// Nodes report GAS amounts as decimal strings; plain numbers are accepted too.
pub(crate) mod lenient_i64 {
    use super::*;

    pub(crate) fn serialize<S: Serializer>(value: &i64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub(crate) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Number(i64),
            String(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Number(n) => Ok(n),
            Repr::String(s) => s.parse().map_err(de::Error::custom),
        }
    }
}
