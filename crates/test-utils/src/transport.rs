use async_trait::async_trait;
use neoconnect_config::AppMetadata;
use neoconnect_rpc::RpcResponse;
use neoconnect_session::{Namespaces, Reason, SessionProposal, SessionTransport, TransportError};
use parking_lot::Mutex;
use std::collections::HashSet;

/// Session transport that records what the controller sends.
///
/// Topics are random UUIDs. Responses to a topic marked closed fail, like a torn-down pairing.
/// Approving a session yields once, like the pairing handshake does.
#[derive(Debug, Default)]
pub struct MockTransport {
    approved: Mutex<Vec<(u64, String, Namespaces)>>,
    rejected: Mutex<Vec<(u64, Reason)>>,
    responses: Mutex<Vec<(String, RpcResponse)>>,
    disconnected: Mutex<Vec<(String, Reason)>>,
    closed: Mutex<HashSet<String>>,
    fail_approvals: Mutex<bool>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Approved proposals as `(proposal id, topic, namespaces)`.
    pub fn approved(&self) -> Vec<(u64, String, Namespaces)> {
        self.approved.lock().clone()
    }

    pub fn rejected(&self) -> Vec<(u64, Reason)> {
        self.rejected.lock().clone()
    }

    /// Every response sent, as `(topic, response)`.
    pub fn responses(&self) -> Vec<(String, RpcResponse)> {
        self.responses.lock().clone()
    }

    pub fn disconnected(&self) -> Vec<(String, Reason)> {
        self.disconnected.lock().clone()
    }

    /// Makes every subsequent session approval fail.
    pub fn fail_approvals(&self) {
        *self.fail_approvals.lock() = true;
    }

    /// Makes responses on `topic` fail.
    pub fn close_topic(&self, topic: &str) {
        self.closed.lock().insert(topic.to_string());
    }
}

#[async_trait]
impl SessionTransport for MockTransport {
    async fn approve_session(
        &self,
        proposal: &SessionProposal,
        namespaces: &Namespaces,
        _metadata: &AppMetadata,
    ) -> Result<String, TransportError> {
        tokio::task::yield_now().await;
        if *self.fail_approvals.lock() {
            return Err(TransportError::other("pairing expired"));
        }
        let topic = uuid::Uuid::new_v4().simple().to_string();
        self.approved.lock().push((proposal.id, topic.clone(), namespaces.clone()));
        Ok(topic)
    }

    async fn reject_session(
        &self,
        proposal_id: u64,
        reason: &Reason,
    ) -> Result<(), TransportError> {
        self.rejected.lock().push((proposal_id, reason.clone()));
        Ok(())
    }

    async fn respond(&self, topic: &str, response: RpcResponse) -> Result<(), TransportError> {
        if self.closed.lock().contains(topic) {
            return Err(TransportError::other(format!("topic {topic} is closed")));
        }
        self.responses.lock().push((topic.to_string(), response));
        Ok(())
    }

    async fn disconnect(&self, topic: &str, reason: &Reason) -> Result<(), TransportError> {
        self.disconnected.lock().push((topic.to_string(), reason.clone()));
        self.closed.lock().insert(topic.to_string());
        Ok(())
    }
}
