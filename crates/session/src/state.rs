use std::sync::Arc;

use neoconnect_rpc::Id;
use parking_lot::Mutex;

use crate::types::{PendingRequest, RequestStatus, Session, SessionProposal, SessionRequest};

/// Proposals, sessions and queued requests.
///
/// Only the lifecycle controller mutates this; everyone else reads snapshots.
#[derive(Debug, Clone, Default)]
pub(crate) struct LifecycleState {
    proposals: Arc<Mutex<Vec<SessionProposal>>>,
    sessions: Arc<Mutex<Vec<Session>>>,
    requests: Arc<Mutex<Vec<PendingRequest>>>,
}

impl LifecycleState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn proposals(&self) -> Vec<SessionProposal> {
        self.proposals.lock().clone()
    }

    /// Removes and returns a proposal, so only one caller can settle it.
    pub fn take_proposal(&self, id: u64) -> Option<SessionProposal> {
        let mut proposals = self.proposals.lock();
        let index = proposals.iter().position(|p| p.id == id)?;
        Some(proposals.remove(index))
    }

    /// Adds a proposal, replacing any earlier one with the same id.
    pub fn add_proposal(&self, proposal: SessionProposal) {
        let mut proposals = self.proposals.lock();
        proposals.retain(|p| p.id != proposal.id);
        proposals.push(proposal);
    }

    /// Removes a proposal, returning whether it was present.
    pub fn remove_proposal(&self, id: u64) -> bool {
        let mut proposals = self.proposals.lock();
        let before = proposals.len();
        proposals.retain(|p| p.id != id);
        proposals.len() != before
    }

    pub fn sessions(&self) -> Vec<Session> {
        self.sessions.lock().clone()
    }

    pub fn session(&self, topic: &str) -> Option<Session> {
        self.sessions.lock().iter().find(|s| s.topic == topic).cloned()
    }

    pub fn add_session(&self, session: Session) {
        let mut sessions = self.sessions.lock();
        sessions.retain(|s| s.topic != session.topic);
        sessions.push(session);
    }

    /// Removes a session and every request queued on its topic.
    pub fn remove_session(&self, topic: &str) -> bool {
        let removed = {
            let mut sessions = self.sessions.lock();
            let before = sessions.len();
            sessions.retain(|s| s.topic != topic);
            sessions.len() != before
        };
        self.requests.lock().retain(|r| r.request.topic != topic);
        removed
    }

    pub fn requests(&self) -> Vec<PendingRequest> {
        self.requests.lock().clone()
    }

    /// Queues a request. Returns `false` if one with the same topic and id is already queued.
    pub fn add_request(&self, request: SessionRequest) -> bool {
        let mut requests = self.requests.lock();
        if requests.iter().any(|r| is_same(&r.request, &request.topic, &request.request.id)) {
            return false;
        }
        requests.push(PendingRequest { request, status: RequestStatus::Pending });
        true
    }

    /// Moves a pending request to `Dispatched`, returning it.
    ///
    /// Returns `None` if the request is unknown or was already claimed, so each request is
    /// answered by exactly one caller.
    pub fn claim_request(&self, topic: &str, id: &Id) -> Option<SessionRequest> {
        let mut requests = self.requests.lock();
        let entry = requests
            .iter_mut()
            .find(|r| is_same(&r.request, topic, id) && r.status == RequestStatus::Pending)?;
        entry.status = RequestStatus::Dispatched;
        Some(entry.request.clone())
    }

    /// Removes a request, returning whether it was present.
    pub fn remove_request(&self, topic: &str, id: &Id) -> bool {
        let mut requests = self.requests.lock();
        let before = requests.len();
        requests.retain(|r| !is_same(&r.request, topic, id));
        requests.len() != before
    }

    pub fn clear(&self) {
        self.proposals.lock().clear();
        self.sessions.lock().clear();
        self.requests.lock().clear();
    }
}

fn is_same(request: &SessionRequest, topic: &str, id: &Id) -> bool {
    request.topic == topic && request.request.id == *id
}
