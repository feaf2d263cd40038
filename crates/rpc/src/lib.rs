//! # neoconnect-rpc
//!
//! JSON-RPC 2.0 envelopes exchanged with a paired dApp.

#![cfg_attr(not(test), warn(unused_crate_dependencies))]

pub mod error;
pub mod request;
pub mod response;

pub use error::{ErrorCode, RpcError};
pub use request::{Id, RpcRequest, Version};
pub use response::{ResponseResult, RpcResponse};
