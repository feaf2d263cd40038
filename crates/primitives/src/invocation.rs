use crate::{args::Arg, error::PrimitiveError, hash::ScriptHash, witness::Signer};
use serde::{Deserialize, Serialize};

/// A single contract call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractInvocation {
    pub script_hash: ScriptHash,
    pub operation: String,
    #[serde(default)]
    pub args: Vec<Arg>,
    /// Appends an `ASSERT` so the whole script faults if the call returns false.
    #[serde(default)]
    pub abort_on_fail: bool,
}

impl ContractInvocation {
    pub fn new(script_hash: ScriptHash, operation: impl Into<String>, args: Vec<Arg>) -> Self {
        Self { script_hash, operation: operation.into(), args, abort_on_fail: false }
    }
}

/// Fee adjustments, in GAS fractions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_system_fee: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_fee_override: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_network_fee: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_fee_override: Option<i64>,
}

impl FeeOptions {
    /// Resolves the system fee given the simulated GAS consumption.
    pub fn system_fee(&self, simulated: i64) -> Result<i64, PrimitiveError> {
        resolve_fee("system", simulated, self.extra_system_fee, self.system_fee_override)
    }

    /// Resolves the network fee given the node's estimate.
    pub fn network_fee(&self, estimated: i64) -> Result<i64, PrimitiveError> {
        resolve_fee("network", estimated, self.extra_network_fee, self.network_fee_override)
    }
}

/// A fee is never negative and never overflows.
fn resolve_fee(
    kind: &'static str,
    base: i64,
    extra: Option<i64>,
    fee_override: Option<i64>,
) -> Result<i64, PrimitiveError> {
    let fee = match fee_override {
        Some(fee) => fee,
        None => base
            .checked_add(extra.unwrap_or(0))
            .ok_or_else(|| PrimitiveError::InvalidFee(format!("{kind} fee overflows")))?,
    };
    if fee < 0 {
        return Err(PrimitiveError::InvalidFee(format!("negative {kind} fee {fee}")));
    }
    Ok(fee)
}

/// Ordered contract calls plus the signers authorizing them, submitted as one script.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationBatch {
    #[serde(default)]
    pub signers: Vec<Signer>,
    pub invocations: Vec<ContractInvocation>,
    #[serde(flatten)]
    pub fees: FeeOptions,
}

impl InvocationBatch {
    pub fn new(invocations: Vec<ContractInvocation>) -> Self {
        Self { invocations, ..Default::default() }
    }

    /// Signers with the invoking account filled in.
    ///
    /// With no signers supplied, a single entry-only signer for `account` is used.
    pub fn resolved_signers(&self, account: ScriptHash) -> Vec<Signer> {
        if self.signers.is_empty() {
            return vec![Signer::called_by_entry(account)];
        }
        self.signers.iter().cloned().map(|signer| signer.with_default_account(account)).collect()
    }
}

/// A single invocation carrying its own optional signer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SingleInvocation {
    #[serde(flatten)]
    pub invocation: ContractInvocation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signer: Option<Signer>,
}

/// Parameters of `invoke`-family requests, either a batch or a single call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InvokeParams {
    Batch(InvocationBatch),
    Single(SingleInvocation),
}

impl From<InvokeParams> for InvocationBatch {
    fn from(params: InvokeParams) -> Self {
        match params {
            InvokeParams::Batch(batch) => batch,
            InvokeParams::Single(SingleInvocation { invocation, signer }) => Self {
                signers: signer.into_iter().collect(),
                invocations: vec![invocation],
                fees: FeeOptions::default(),
            },
        }
    }
}
