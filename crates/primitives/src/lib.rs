//! # neoconnect-primitives
//!
//! N3 chain primitives shared by the wallet and session crates.

#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod args;
pub use args::{Arg, ArgType, ContractParam, convert_param, convert_params};

pub mod encoding;

mod error;
pub use error::PrimitiveError;

mod hash;
pub use hash::{ADDRESS_VERSION, ScriptHash, hash256_from_str, hash256_to_string};

mod invocation;
pub use invocation::{
    ContractInvocation, FeeOptions, InvocationBatch, InvokeParams, SingleInvocation,
};

pub mod script;
pub use script::{
    ScriptBuilder, build_invocation_script, signature_invocation_script,
    signature_verification_script,
};

mod transaction;
pub use transaction::{TRANSACTION_VERSION, Transaction};

mod witness;
pub use witness::{GroupKey, Signer, Witness, WitnessScope};

pub use alloy_primitives::{B256, Bytes, I256};
