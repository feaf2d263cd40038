use crate::error::SigningError;
use async_trait::async_trait;
use neoconnect_primitives::{ScriptHash, Transaction};
use std::fmt;

/// What an external signer needs besides the transaction itself.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SigningContext {
    pub network_magic: u32,
    /// Account the wallet is signing for.
    pub account: ScriptHash,
    pub public_key: [u8; 33],
}

/// Signs transactions outside the process, e.g. on a hardware device.
///
/// Implementations may wait on user interaction for as long as they need; no timeout is applied
/// by the caller.
#[async_trait]
#[auto_impl::auto_impl(&, Box, Arc)]
pub trait TransactionSigner: Send + Sync + fmt::Debug {
    /// Returns `tx` with the witness for `context.account` filled in.
    async fn sign_transaction(
        &self,
        tx: Transaction,
        context: &SigningContext,
    ) -> Result<Transaction, SigningError>;
}
