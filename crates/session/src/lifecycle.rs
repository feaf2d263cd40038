//! The session lifecycle controller.

use crate::{
    error::{Reason, SessionError},
    event::LifecycleEvent,
    policy::AutoAcceptPolicy,
    state::LifecycleState,
    store::{ApprovalStore, JsonFileApprovalStore, MemoryApprovalStore},
    transport::SessionTransport,
    types::{
        Namespaces, PendingRequest, Session, SessionEvent, SessionNamespace, SessionProposal,
        SessionRequest,
    },
};
use neoconnect_config::BridgeConfig;
use neoconnect_rpc::{Id, RpcError, RpcResponse};
use neoconnect_wallets::{Account, FacadeConfig, HttpChainClient, SigningFacade};
use std::{collections::HashMap, fmt, sync::Arc};
use tokio::sync::broadcast;

/// Capacity of the lifecycle event channel.
const EVENT_CAPACITY: usize = 64;

/// A wallet account usable on one chain.
#[derive(Clone, Debug)]
pub struct ChainAccount {
    pub chain_id: String,
    pub account: Account,
}

impl ChainAccount {
    pub fn new(chain_id: impl Into<String>, account: Account) -> Self {
        Self { chain_id: chain_id.into(), account }
    }

    /// `chain:address`, the form sessions list accounts in.
    pub fn qualified_address(&self) -> String {
        format!("{}:{}", self.chain_id, self.account.address())
    }
}

/// Outcome of an inbound proposal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProposalDecision {
    /// Queued for the user to approve.
    Accept,
    /// Declined on the spot; the peer was told why.
    Decline(Reason),
}

/// Outcome of an inbound request.
#[derive(Clone, Debug, PartialEq)]
pub enum RequestOutcome {
    /// Fulfilled without asking the user; carries the response that was sent.
    AutoApproved(RpcResponse),
    /// Queued for manual approval.
    Queued,
    /// Answered with an error straight away.
    Rejected(RpcResponse),
}

/// Drives proposals, sessions and requests, and answers every request exactly once.
pub struct LifecycleController {
    config: BridgeConfig,
    accounts: Vec<ChainAccount>,
    facades: HashMap<String, Arc<SigningFacade>>,
    transport: Arc<dyn SessionTransport>,
    store: Arc<dyn ApprovalStore>,
    policy: Option<Arc<dyn AutoAcceptPolicy>>,
    state: LifecycleState,
    events: broadcast::Sender<LifecycleEvent>,
}

impl fmt::Debug for LifecycleController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifecycleController")
            .field("supported_chains", &self.config.supported_chains)
            .field("accounts", &self.accounts.len())
            .field("facades", &self.facades.keys().collect::<Vec<_>>())
            .field("auto_accept", &self.policy.is_some())
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl LifecycleController {
    /// Creates a controller with an in-memory approval store and no facades.
    pub fn new(config: BridgeConfig, transport: Arc<dyn SessionTransport>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            config,
            accounts: Vec::new(),
            facades: HashMap::new(),
            transport,
            store: Arc::new(MemoryApprovalStore::new()),
            policy: None,
            state: LifecycleState::new(),
            events,
        }
    }

    /// Creates a controller from `config`: one HTTP-backed facade per configured endpoint, and a
    /// file-backed approval store if a path is set.
    pub fn from_config(
        config: BridgeConfig,
        transport: Arc<dyn SessionTransport>,
    ) -> Result<Self, SessionError> {
        let facade_config = FacadeConfig::from(&config);
        let facades = config
            .rpc_endpoints
            .iter()
            .map(|(chain, url)| {
                let client = Arc::new(HttpChainClient::new(url.clone()));
                (chain.clone(), Arc::new(SigningFacade::new(client, facade_config.clone())))
            })
            .collect::<Vec<_>>();
        let store = config.approval_store.as_ref().map(JsonFileApprovalStore::open).transpose()?;

        let mut controller = Self::new(config, transport);
        for (chain, facade) in facades {
            controller = controller.with_facade(chain, facade);
        }
        if let Some(store) = store {
            controller = controller.with_store(Arc::new(store));
        }
        Ok(controller)
    }

    pub fn with_account(mut self, account: ChainAccount) -> Self {
        self.accounts.push(account);
        self
    }

    /// Serves requests for `chain_id` through `facade`.
    pub fn with_facade(mut self, chain_id: impl Into<String>, facade: Arc<SigningFacade>) -> Self {
        self.facades.insert(chain_id.into(), facade);
        self
    }

    pub fn with_store(mut self, store: Arc<dyn ApprovalStore>) -> Self {
        self.store = store;
        self
    }

    pub fn with_policy(mut self, policy: Arc<dyn AutoAcceptPolicy>) -> Self {
        self.policy = Some(policy);
        self
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn proposals(&self) -> Vec<SessionProposal> {
        self.state.proposals()
    }

    pub fn sessions(&self) -> Vec<Session> {
        self.state.sessions()
    }

    pub fn pending_requests(&self) -> Vec<PendingRequest> {
        self.state.requests()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.events.subscribe()
    }

    fn notify(&self, event: LifecycleEvent) {
        // no receivers is fine
        let _ = self.events.send(event);
    }

    /// Routes a transport event to its handler.
    pub async fn handle_event(&self, event: SessionEvent) -> Result<(), SessionError> {
        match event {
            SessionEvent::Proposal(proposal) => {
                self.on_proposal(proposal).await;
            }
            SessionEvent::Request(request) => {
                self.on_request(request).await?;
            }
            SessionEvent::Delete { topic } => self.on_session_deleted(&topic),
        }
        Ok(())
    }

    fn check_proposal(&self, proposal: &SessionProposal) -> Result<(), SessionError> {
        if let Some(chain) = proposal.required_chains().into_iter().find(|c| !self.config.supports_chain(c)) {
            return Err(SessionError::UnsupportedChain(chain));
        }
        if let Some(method) =
            proposal.required_methods().into_iter().find(|m| !self.config.supports_method(m))
        {
            return Err(SessionError::UnsupportedMethod(method));
        }
        Ok(())
    }

    /// Screens a proposal against the supported chains and methods.
    ///
    /// Unsupported proposals are declined right away and never queued.
    pub async fn on_proposal(&self, proposal: SessionProposal) -> ProposalDecision {
        if let Err(err) = self.check_proposal(&proposal) {
            let reason = err.reason();
            debug!(target: "session::lifecycle", id = proposal.id, %err, "declining proposal");
            if let Err(err) = self.transport.reject_session(proposal.id, &reason).await {
                warn!(target: "session::lifecycle", id = proposal.id, %err, "failed to send decline");
            }
            return ProposalDecision::Decline(reason);
        }

        self.state.add_proposal(proposal);
        self.notify(LifecycleEvent::ProposalsChanged);
        ProposalDecision::Accept
    }

    /// Namespaces granted for `proposal`: the known accounts on each requested chain.
    fn namespaces_for(&self, proposal: &SessionProposal) -> Namespaces {
        let mut namespaces = Namespaces::new();
        for (key, required) in &proposal.required_namespaces {
            let chains = if required.chains.is_empty() { vec![key.clone()] } else { required.chains.clone() };
            let namespace = key.split(':').next().unwrap_or(key).to_string();
            let entry: &mut SessionNamespace = namespaces.entry(namespace).or_default();
            for account in self.accounts.iter().filter(|a| chains.contains(&a.chain_id)) {
                let qualified = account.qualified_address();
                if !entry.accounts.contains(&qualified) {
                    entry.accounts.push(qualified);
                }
            }
            for method in &required.methods {
                if !entry.methods.contains(method) {
                    entry.methods.push(method.clone());
                }
            }
            for event in &required.events {
                if !entry.events.contains(event) {
                    entry.events.push(event.clone());
                }
            }
        }
        namespaces
    }

    /// Approves a queued proposal, opening a session with the matching accounts.
    pub async fn approve_proposal(&self, id: u64) -> Result<Session, SessionError> {
        let proposal = self
            .state
            .take_proposal(id)
            .ok_or_else(|| SessionError::invalid_state(format!("no pending proposal {id}")))?;
        let namespaces = self.namespaces_for(&proposal);
        let topic =
            match self.transport.approve_session(&proposal, &namespaces, &self.config.metadata).await {
                Ok(topic) => topic,
                Err(err) => {
                    // still pending, the user may retry
                    self.state.add_proposal(proposal);
                    return Err(err.into());
                }
            };

        let session = Session { topic, peer: proposal.proposer, namespaces };
        self.state.add_session(session.clone());
        debug!(target: "session::lifecycle", id, topic = %session.topic, "session approved");
        self.notify(LifecycleEvent::ProposalsChanged);
        self.notify(LifecycleEvent::SessionsChanged);
        Ok(session)
    }

    /// Declines a queued proposal on behalf of the user.
    pub async fn reject_proposal(&self, id: u64) -> Result<(), SessionError> {
        if !self.state.remove_proposal(id) {
            return Err(SessionError::invalid_state(format!("no pending proposal {id}")));
        }
        self.notify(LifecycleEvent::ProposalsChanged);
        self.transport.reject_session(id, &Reason::USER_REJECTED).await?;
        Ok(())
    }

    /// Handles an inbound request: a remembered approval or the auto-accept policy fulfills it
    /// immediately, anything else waits for the user.
    pub async fn on_request(&self, request: SessionRequest) -> Result<RequestOutcome, SessionError> {
        let session = self.state.session(&request.topic).ok_or_else(|| {
            SessionError::invalid_state(format!("no session for topic {}", request.topic))
        })?;

        if !self.config.supports_method(&request.request.method) {
            let err = SessionError::UnsupportedMethod(request.request.method.clone());
            let response = RpcResponse::error(request.request.id.clone(), err.into());
            self.send(&request.topic, response.clone()).await;
            return Ok(RequestOutcome::Rejected(response));
        }

        let approved = self.store.is_approved(&request.approval_key()).unwrap_or_else(|err| {
            warn!(target: "session::lifecycle", %err, "approval store unreadable, treating request as new");
            false
        });
        let accepted = approved
            || self.policy.as_ref().is_some_and(|policy| {
                policy.should_accept(
                    session.address_on(&request.chain_id),
                    &request.chain_id,
                    &request.request,
                )
            });
        if accepted {
            trace!(target: "session::lifecycle", id = %request.request.id, cached = approved, "auto-approving request");
            let response = self.fulfill(&request).await;
            self.send(&request.topic, response.clone()).await;
            return Ok(RequestOutcome::AutoApproved(response));
        }

        if self.state.add_request(request) {
            self.notify(LifecycleEvent::RequestsChanged);
        }
        Ok(RequestOutcome::Queued)
    }

    /// Fulfills a queued request and sends the result.
    ///
    /// The request leaves the queue whatever the outcome; failures are answered with an error
    /// response. Successful approvals are remembered so identical requests skip the queue, unless
    /// the session was torn down while the request was being fulfilled.
    pub async fn approve_request(&self, topic: &str, id: &Id) -> Result<RpcResponse, SessionError> {
        let request = self.claim(topic, id)?;
        let response = self.fulfill(&request).await;
        if !response.is_error()
            && self.state.session(&request.topic).is_some()
            && let Err(err) = self.store.record(&request.approval_key())
        {
            warn!(target: "session::lifecycle", %err, "failed to record approval");
        }
        self.finish(request, response.clone()).await;
        Ok(response)
    }

    /// Declines a queued request on behalf of the user.
    pub async fn reject_request(&self, topic: &str, id: &Id) -> Result<RpcResponse, SessionError> {
        let request = self.claim(topic, id)?;
        let response = RpcResponse::error(request.request.id.clone(), RpcError::user_rejected());
        self.finish(request, response.clone()).await;
        Ok(response)
    }

    fn claim(&self, topic: &str, id: &Id) -> Result<SessionRequest, SessionError> {
        let request = self
            .state
            .claim_request(topic, id)
            .ok_or_else(|| SessionError::invalid_state(format!("request {id} on {topic} is not pending")))?;
        self.notify(LifecycleEvent::RequestsChanged);
        Ok(request)
    }

    async fn finish(&self, request: SessionRequest, response: RpcResponse) {
        self.send(&request.topic, response).await;
        self.state.remove_request(&request.topic, &request.request.id);
        self.notify(LifecycleEvent::RequestsChanged);
    }

    /// Runs the request through the facade serving its chain.
    ///
    /// Never fails: every error becomes an error response.
    async fn fulfill(&self, request: &SessionRequest) -> RpcResponse {
        let id = request.request.id.clone();
        match self.try_fulfill(request).await {
            Ok(response) => response,
            Err(SessionError::Wallet(err)) => RpcResponse::error(id, err.into()),
            Err(err) => {
                warn!(target: "session::lifecycle", %id, %err, "request failed");
                RpcResponse::error(id, RpcError::failed_or_rejected())
            }
        }
    }

    async fn try_fulfill(&self, request: &SessionRequest) -> Result<RpcResponse, SessionError> {
        let chain_id = &request.chain_id;
        if !self.config.supports_chain(chain_id) {
            return Err(SessionError::UnsupportedChain(chain_id.clone()));
        }
        let facade = self
            .facades
            .get(chain_id)
            .ok_or_else(|| SessionError::invalid_state(format!("no chain client for {chain_id}")))?;
        let session = self.state.session(&request.topic);
        let account = session
            .as_ref()
            .and_then(|s| s.address_on(chain_id))
            .and_then(|address| self.account_for(chain_id, address));

        let rpc = &request.request;
        let fulfilled = facade.execute(account, &rpc.method, rpc.params.clone()).await?;
        Ok(RpcResponse::success(rpc.id.clone(), fulfilled.result, fulfilled.is_message))
    }

    fn account_for(&self, chain_id: &str, address: &str) -> Option<&Account> {
        self.accounts
            .iter()
            .find(|a| a.chain_id == chain_id && a.account.address() == address)
            .map(|a| &a.account)
    }

    /// Sends a terminal response. A torn-down topic only gets logged.
    async fn send(&self, topic: &str, response: RpcResponse) {
        let id = response.id.clone();
        let is_error = response.is_error();
        match self.transport.respond(topic, response).await {
            Ok(()) => trace!(target: "session::lifecycle", %id, %topic, is_error, "response sent"),
            Err(err) => warn!(target: "session::lifecycle", %id, %topic, %err, "failed to send response"),
        }
    }

    /// The peer deleted a session: drop it and everything queued on it.
    pub fn on_session_deleted(&self, topic: &str) {
        if self.state.remove_session(topic) {
            debug!(target: "session::lifecycle", %topic, "session deleted by peer");
            self.notify(LifecycleEvent::SessionsChanged);
            self.notify(LifecycleEvent::RequestsChanged);
        }
    }

    /// Disconnects every session and clears all local state and remembered approvals.
    ///
    /// Safe to call repeatedly and with nothing connected.
    pub async fn disconnect_all(&self) -> Result<(), SessionError> {
        let sessions = self.state.sessions();
        for session in &sessions {
            if let Err(err) =
                self.transport.disconnect(&session.topic, &Reason::USER_DISCONNECTED).await
            {
                warn!(target: "session::lifecycle", topic = %session.topic, %err, "failed to disconnect");
            }
        }
        self.state.clear();
        self.store.clear()?;
        debug!(target: "session::lifecycle", sessions = sessions.len(), "all sessions disconnected");
        self.notify(LifecycleEvent::ProposalsChanged);
        self.notify(LifecycleEvent::SessionsChanged);
        self.notify(LifecycleEvent::RequestsChanged);
        Ok(())
    }
}
