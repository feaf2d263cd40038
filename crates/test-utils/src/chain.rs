use crate::TESTNET_MAGIC;
use alloy_primitives::Bytes;
use async_trait::async_trait;
use neoconnect_primitives::{Signer, Transaction};
use neoconnect_wallets::{ChainClient, ChainError, InvokeResult, VmState};
use parking_lot::Mutex;
use serde_json::{Map, Value, json};

/// A call received by [`MockChainClient`].
#[derive(Clone, Debug, PartialEq)]
pub enum ChainCall {
    NetworkMagic,
    BlockCount,
    InvokeScript { script: Bytes, signers: Vec<Signer> },
    CalculateNetworkFee,
    SendRawTransaction(Transaction),
    ApplicationLog(String),
    Execute { method: String, params: Value },
}

/// In-memory chain node that records every call.
#[derive(Debug)]
pub struct MockChainClient {
    magic: u32,
    height: u32,
    network_fee: i64,
    invoke_result: Mutex<InvokeResult>,
    failure: Mutex<Option<String>>,
    calls: Mutex<Vec<ChainCall>>,
}

impl Default for MockChainClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockChainClient {
    pub fn new() -> Self {
        Self {
            magic: TESTNET_MAGIC,
            height: 1_000,
            network_fee: 1_230_610,
            invoke_result: Mutex::new(InvokeResult {
                script: String::new(),
                state: VmState::Halt,
                gas_consumed: 984_060,
                exception: None,
                stack: vec![json!({ "type": "Integer", "value": "1" })],
                extra: Map::new(),
            }),
            failure: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_height(mut self, height: u32) -> Self {
        self.height = height;
        self
    }

    /// Result returned by every `invokescript`.
    pub fn set_invoke_result(&self, result: InvokeResult) {
        *self.invoke_result.lock() = result;
    }

    /// Makes every subsequent call fail with a node error carrying `message`.
    pub fn fail_with(&self, message: impl Into<String>) {
        *self.failure.lock() = Some(message.into());
    }

    pub fn calls(&self) -> Vec<ChainCall> {
        self.calls.lock().clone()
    }

    pub fn count(&self, f: impl Fn(&ChainCall) -> bool) -> usize {
        self.calls.lock().iter().filter(|call| f(call)).count()
    }

    /// Transactions passed to `sendrawtransaction`.
    pub fn broadcasts(&self) -> Vec<Transaction> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                ChainCall::SendRawTransaction(tx) => Some(tx.clone()),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: ChainCall) -> Result<(), ChainError> {
        self.calls.lock().push(call);
        match self.failure.lock().clone() {
            Some(message) => Err(ChainError::Rpc { code: -500, message }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ChainClient for MockChainClient {
    async fn network_magic(&self) -> Result<u32, ChainError> {
        self.record(ChainCall::NetworkMagic)?;
        Ok(self.magic)
    }

    async fn block_count(&self) -> Result<u32, ChainError> {
        self.record(ChainCall::BlockCount)?;
        Ok(self.height)
    }

    async fn invoke_script(
        &self,
        script: &Bytes,
        signers: &[Signer],
    ) -> Result<InvokeResult, ChainError> {
        // a round trip to the node, so concurrent callers interleave here
        tokio::task::yield_now().await;
        self.record(ChainCall::InvokeScript { script: script.clone(), signers: signers.to_vec() })?;
        Ok(self.invoke_result.lock().clone())
    }

    async fn calculate_network_fee(&self, _tx: &Transaction) -> Result<i64, ChainError> {
        self.record(ChainCall::CalculateNetworkFee)?;
        Ok(self.network_fee)
    }

    async fn send_raw_transaction(&self, tx: &Transaction) -> Result<String, ChainError> {
        self.record(ChainCall::SendRawTransaction(tx.clone()))?;
        Ok(tx.txid()?)
    }

    async fn application_log(&self, txid: &str) -> Result<Value, ChainError> {
        self.record(ChainCall::ApplicationLog(txid.to_string()))?;
        Ok(json!({ "txid": txid, "executions": [{ "vmstate": "HALT" }] }))
    }

    async fn execute(&self, method: &str, params: Value) -> Result<Value, ChainError> {
        self.record(ChainCall::Execute { method: method.to_string(), params: params.clone() })?;
        Ok(json!({ "method": method, "params": params }))
    }
}
