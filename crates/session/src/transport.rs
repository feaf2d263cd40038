use crate::{
    error::{Reason, TransportError},
    types::{Namespaces, SessionProposal},
};
use async_trait::async_trait;
use neoconnect_config::AppMetadata;
use neoconnect_rpc::RpcResponse;
use std::fmt;

/// The pairing transport connecting the wallet to its peers.
///
/// Encryption, topic management and framing are the transport's business.
#[async_trait]
#[auto_impl::auto_impl(&, Box, Arc)]
pub trait SessionTransport: Send + Sync + fmt::Debug {
    /// Settles a session for `proposal`, returning its topic.
    async fn approve_session(
        &self,
        proposal: &SessionProposal,
        namespaces: &Namespaces,
        metadata: &AppMetadata,
    ) -> Result<String, TransportError>;

    async fn reject_session(&self, proposal_id: u64, reason: &Reason)
    -> Result<(), TransportError>;

    /// Sends `response` on `topic`. Fails if the topic was torn down.
    async fn respond(&self, topic: &str, response: RpcResponse) -> Result<(), TransportError>;

    async fn disconnect(&self, topic: &str, reason: &Reason) -> Result<(), TransportError>;
}
