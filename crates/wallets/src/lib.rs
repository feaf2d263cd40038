//! # neoconnect-wallets
//!
//! Accounts, message signing, the chain node boundary and the [`SigningFacade`] that fulfills
//! requests coming from a paired dApp.

#![cfg_attr(not(test), warn(unused_crate_dependencies))]

#[macro_use]
extern crate tracing;

pub mod account;
pub mod chain;
pub mod error;
pub mod facade;
pub mod http;
pub mod message;
pub mod method;
pub mod signer;

pub use account::Account;
pub use chain::{ChainClient, InvokeResult, VmState};
pub use error::{ChainError, PrivateKeyError, SigningError, WalletError};
pub use facade::{FacadeConfig, FacadeResponse, SigningFacade, TestInvokeResult};
pub use http::HttpChainClient;
pub use message::{MessageVersion, SignMessageParams, SignedMessage};
pub use method::DapiMethod;
pub use signer::{SigningContext, TransactionSigner};
