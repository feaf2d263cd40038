//! # neoconnect-session
//!
//! Session lifecycle for a wallet paired with dApps: screens proposals, opens sessions, decides
//! whether each inbound request is fulfilled right away or waits for the user, and answers every
//! request exactly once.

#![cfg_attr(not(test), warn(unused_crate_dependencies))]

#[macro_use]
extern crate tracing;

pub mod error;
pub mod event;
pub mod lifecycle;
pub mod policy;
mod state;
pub mod store;
pub mod transport;
pub mod types;

pub use error::{Reason, SessionError, StoreError, TransportError};
pub use event::LifecycleEvent;
pub use lifecycle::{ChainAccount, LifecycleController, ProposalDecision, RequestOutcome};
pub use policy::{AutoAcceptPolicy, MethodAllowList};
pub use store::{ApprovalStore, JsonFileApprovalStore, MemoryApprovalStore};
pub use transport::SessionTransport;
pub use types::{
    Namespaces, PendingRequest, RequestStatus, RequiredNamespace, Session, SessionEvent,
    SessionNamespace, SessionProposal, SessionRequest,
};
