//! [`ChainClient`] over a node's JSON-RPC HTTP endpoint.

use crate::{
    chain::{ChainClient, InvokeResult, lenient_i64},
    error::ChainError,
};
use alloy_primitives::Bytes;
use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD};
use neoconnect_primitives::{Signer, Transaction};
use neoconnect_rpc::RpcRequest;
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::{Value, json};
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug)]
pub struct HttpChainClient {
    url: String,
    http: reqwest::Client,
    next_id: AtomicU64,
}

#[derive(Deserialize)]
struct NodeResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<NodeError>,
}

#[derive(Deserialize)]
struct NodeError {
    code: i64,
    message: String,
}

impl HttpChainClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_client(url, reqwest::Client::new())
    }

    pub fn with_client(url: impl Into<String>, http: reqwest::Client) -> Self {
        Self { url: url.into(), http, next_id: AtomicU64::new(1) }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<T, ChainError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        trace!(target: "wallets::chain", %method, id, "sending node request");
        let request = RpcRequest::new(id, method, params);
        let response: NodeResponse = self
            .http
            .post(&self.url)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        into_result(response)
    }
}

fn into_result<T: DeserializeOwned>(response: NodeResponse) -> Result<T, ChainError> {
    if let Some(NodeError { code, message }) = response.error {
        return Err(ChainError::Rpc { code, message });
    }
    Ok(serde_json::from_value(response.result.unwrap_or(Value::Null))?)
}

#[derive(Deserialize)]
struct VersionResponse {
    protocol: ProtocolSettings,
}

#[derive(Deserialize)]
struct ProtocolSettings {
    network: u32,
}

#[derive(Deserialize)]
struct NetworkFeeResponse {
    #[serde(rename = "networkfee", with = "lenient_i64")]
    network_fee: i64,
}

#[derive(Deserialize)]
struct SendResponse {
    hash: String,
}

#[async_trait]
impl ChainClient for HttpChainClient {
    async fn network_magic(&self) -> Result<u32, ChainError> {
        let version: VersionResponse = self.request("getversion", json!([])).await?;
        Ok(version.protocol.network)
    }

    async fn block_count(&self) -> Result<u32, ChainError> {
        self.request("getblockcount", json!([])).await
    }

    async fn invoke_script(
        &self,
        script: &Bytes,
        signers: &[Signer],
    ) -> Result<InvokeResult, ChainError> {
        let signers = signers.iter().map(Signer::to_rpc_json).collect::<Result<Vec<_>, _>>()?;
        self.request("invokescript", json!([STANDARD.encode(script), signers])).await
    }

    async fn calculate_network_fee(&self, tx: &Transaction) -> Result<i64, ChainError> {
        let fee: NetworkFeeResponse =
            self.request("calculatenetworkfee", json!([tx.to_base64()?])).await?;
        Ok(fee.network_fee)
    }

    async fn send_raw_transaction(&self, tx: &Transaction) -> Result<String, ChainError> {
        let sent: SendResponse = self.request("sendrawtransaction", json!([tx.to_base64()?])).await?;
        Ok(sent.hash)
    }

    async fn application_log(&self, txid: &str) -> Result<Value, ChainError> {
        self.request("getapplicationlog", json!([txid])).await
    }

    async fn execute(&self, method: &str, params: Value) -> Result<Value, ChainError> {
        self.request(method, params).await
    }
}
