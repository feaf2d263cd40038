//! The signing facade: turns dApp requests into scripts, transactions and signatures.

use crate::{
    account::Account,
    chain::{ChainClient, InvokeResult},
    error::WalletError,
    message::{SignMessageParams, SignedMessage, sign_message, verify_message},
    method::DapiMethod,
    signer::{SigningContext, TransactionSigner},
};
use alloy_primitives::Bytes;
use neoconnect_config::BridgeConfig;
use neoconnect_primitives::{
    InvocationBatch, InvokeParams, Signer, Transaction, Witness, build_invocation_script,
    signature_invocation_script,
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Facade settings.
#[derive(Clone, Debug)]
pub struct FacadeConfig {
    /// Blocks after the current height a transaction stays valid for.
    pub valid_until_horizon: u32,
    /// Signs transactions instead of the account's own key when set.
    pub hardware_signer: Option<Arc<dyn TransactionSigner>>,
}

impl Default for FacadeConfig {
    fn default() -> Self {
        Self { valid_until_horizon: 100, hardware_signer: None }
    }
}

impl From<&BridgeConfig> for FacadeConfig {
    fn from(config: &BridgeConfig) -> Self {
        Self { valid_until_horizon: config.valid_until_horizon, hardware_signer: None }
    }
}

/// A fulfilled request.
#[derive(Clone, Debug, PartialEq)]
pub struct FacadeResponse {
    pub result: Value,
    /// Set for signature flows.
    pub is_message: bool,
}

/// Result of `testInvoke`, tagged so callers do not mistake it for a state change.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TestInvokeResult {
    #[serde(flatten)]
    pub result: InvokeResult,
    #[serde(rename = "isTest")]
    pub is_test: bool,
}

#[derive(Debug)]
pub struct SigningFacade {
    client: Arc<dyn ChainClient>,
    config: FacadeConfig,
    network_magic: OnceCell<u32>,
}

impl SigningFacade {
    pub fn new(client: Arc<dyn ChainClient>, config: FacadeConfig) -> Self {
        Self { client, config, network_magic: OnceCell::new() }
    }

    pub fn client(&self) -> &Arc<dyn ChainClient> {
        &self.client
    }

    pub fn config(&self) -> &FacadeConfig {
        &self.config
    }

    /// Network magic, fetched from the node once and cached.
    pub async fn network_magic(&self) -> Result<u32, WalletError> {
        let magic = self
            .network_magic
            .get_or_try_init(|| async {
                let magic = self.client.network_magic().await?;
                debug!(target: "wallets::facade", magic, "resolved network magic");
                Ok::<_, WalletError>(magic)
            })
            .await?;
        Ok(*magic)
    }

    /// Dispatches a request by method name.
    pub async fn execute(
        &self,
        account: Option<&Account>,
        method: &str,
        params: Value,
    ) -> Result<FacadeResponse, WalletError> {
        let method = DapiMethod::from(method);
        debug!(target: "wallets::facade", %method, "executing request");
        let result = match &method {
            DapiMethod::Invoke => {
                let params: InvokeParams = parse_params(params)?;
                Value::String(self.invoke(account, params.into()).await?)
            }
            DapiMethod::TestInvoke => {
                let params: InvokeParams = parse_params(params)?;
                serde_json::to_value(self.test_invoke(account, params.into()).await?)?
            }
            DapiMethod::SignMessage => {
                serde_json::to_value(self.sign_message(account, sign_message_params(params)?)?)?
            }
            DapiMethod::VerifyMessage => Value::Bool(self.verify_message(&parse_params(params)?)),
            DapiMethod::ApplicationLog | DapiMethod::Raw(_) => {
                self.raw_call(&method.to_string(), params).await?
            }
        };
        Ok(FacadeResponse { result, is_message: method.is_message() })
    }

    /// Builds, signs and broadcasts a transaction for `batch`, returning its id.
    pub async fn invoke(
        &self,
        account: Option<&Account>,
        batch: InvocationBatch,
    ) -> Result<String, WalletError> {
        let account = account.ok_or_else(|| WalletError::invalid_state("no account to invoke with"))?;
        if self.config.hardware_signer.is_none() && !account.can_sign() {
            return Err(WalletError::invalid_state("account has no private key"));
        }
        let (script, signers) = prepare(Some(account), &batch)?;

        let network_magic = self.network_magic().await?;
        let height = self.client.block_count().await?;
        let mut tx =
            Transaction::new(script, signers, height.saturating_add(self.config.valid_until_horizon));
        tx.witnesses = tx
            .signers
            .iter()
            .map(|signer| {
                let verification = if signer.account == Some(account.script_hash()) {
                    account.verification_script()
                } else {
                    Bytes::new()
                };
                Witness::placeholder(verification)
            })
            .collect();

        let simulation = self.client.invoke_script(&tx.script, &tx.signers).await?;
        simulation.ensure_halted()?;
        tx.system_fee =
            batch.fees.system_fee(simulation.gas_consumed).map_err(WalletError::invalid_params)?;
        let estimated = self.client.calculate_network_fee(&tx).await?;
        tx.network_fee = batch.fees.network_fee(estimated).map_err(WalletError::invalid_params)?;
        trace!(target: "wallets::facade", system_fee = tx.system_fee, network_fee = tx.network_fee, "fees resolved");

        let tx = self.sign(tx, account, network_magic).await?;
        let txid = self.client.send_raw_transaction(&tx).await?;
        debug!(target: "wallets::facade", %txid, "transaction broadcast");
        Ok(txid)
    }

    async fn sign(
        &self,
        mut tx: Transaction,
        account: &Account,
        network_magic: u32,
    ) -> Result<Transaction, WalletError> {
        if let Some(signer) = &self.config.hardware_signer {
            let context = SigningContext {
                network_magic,
                account: account.script_hash(),
                public_key: *account.public_key(),
            };
            return Ok(match signer.sign_transaction(tx.clone(), &context).await {
                Ok(signed) => signed,
                Err(err) => {
                    // broadcast validation rejects the unsigned transaction downstream
                    warn!(target: "wallets::facade", %err, "hardware signing failed");
                    tx
                }
            });
        }

        let invocation = signature_invocation_script(&account.sign(&tx.sign_payload(network_magic)?)?);
        for (signer, witness) in tx.signers.iter().zip(tx.witnesses.iter_mut()) {
            if signer.account == Some(account.script_hash()) {
                witness.invocation = invocation.clone();
            }
        }
        Ok(tx)
    }

    /// Simulates `batch` without broadcasting anything.
    pub async fn test_invoke(
        &self,
        account: Option<&Account>,
        batch: InvocationBatch,
    ) -> Result<TestInvokeResult, WalletError> {
        let (script, signers) = prepare(account, &batch)?;
        let result = self.client.invoke_script(&script, &signers).await?;
        Ok(TestInvokeResult { result, is_test: true })
    }

    pub fn sign_message(
        &self,
        account: Option<&Account>,
        params: SignMessageParams,
    ) -> Result<SignedMessage, WalletError> {
        let account =
            account.ok_or_else(|| WalletError::invalid_state("no account to sign the message"))?;
        sign_message(account, &params.message, params.version)
    }

    pub fn verify_message(&self, signed: &SignedMessage) -> bool {
        verify_message(signed)
    }

    /// Forwards `method` to the node.
    pub async fn raw_call(&self, method: &str, params: Value) -> Result<Value, WalletError> {
        if DapiMethod::from(method) == DapiMethod::ApplicationLog {
            let txid = txid_param(params)?;
            return Ok(self.client.application_log(&txid).await?);
        }
        Ok(self.client.execute(method, params).await?)
    }
}

/// Script and signer list for `batch`.
///
/// Without an account every signer must name its own.
fn prepare(
    account: Option<&Account>,
    batch: &InvocationBatch,
) -> Result<(Bytes, Vec<Signer>), WalletError> {
    if batch.invocations.is_empty() {
        return Err(WalletError::invalid_params("no invocations"));
    }
    let signers = match account {
        Some(account) => batch.resolved_signers(account.script_hash()),
        None if batch.signers.iter().all(|signer| signer.account.is_some()) => batch.signers.clone(),
        None => return Err(WalletError::invalid_state("no account to fill in the signer")),
    };
    Ok((build_invocation_script(&batch.invocations)?, signers))
}

/// Accepts params either bare or wrapped in a one-element array.
fn parse_params<T: DeserializeOwned>(params: Value) -> Result<T, WalletError> {
    let params = match params {
        Value::Array(mut items) if items.len() == 1 => items.remove(0),
        params => params,
    };
    serde_json::from_value(params).map_err(WalletError::invalid_params)
}

/// `signMessage` also accepts the bare message string.
fn sign_message_params(params: Value) -> Result<SignMessageParams, WalletError> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Message(String),
        Params(SignMessageParams),
    }

    Ok(match parse_params(params)? {
        Repr::Message(message) => SignMessageParams { message, version: Default::default() },
        Repr::Params(params) => params,
    })
}

fn txid_param(params: Value) -> Result<String, WalletError> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Txid(String),
        Object { txid: String },
    }

    Ok(match parse_params(params)? {
        Repr::Txid(txid) | Repr::Object { txid } => txid,
    })
}
