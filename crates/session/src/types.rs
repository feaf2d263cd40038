//! Session protocol entities.

use neoconnect_config::AppMetadata;
use neoconnect_rpc::RpcRequest;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What a proposal requires of the wallet within one namespace.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequiredNamespace {
    pub chains: Vec<String>,
    pub methods: Vec<String>,
    pub events: Vec<String>,
}

/// A peer asking to open a session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionProposal {
    pub id: u64,
    pub proposer: AppMetadata,
    /// Keyed by namespace (`neo3`) or by chain id (`neo3:testnet`).
    #[serde(default)]
    pub required_namespaces: BTreeMap<String, RequiredNamespace>,
    #[serde(default)]
    pub optional_namespaces: BTreeMap<String, RequiredNamespace>,
}

impl SessionProposal {
    /// Chain ids the proposal requires.
    pub fn required_chains(&self) -> Vec<String> {
        self.required_namespaces
            .iter()
            .flat_map(|(key, ns)| {
                if ns.chains.is_empty() && key.contains(':') {
                    vec![key.clone()]
                } else {
                    ns.chains.clone()
                }
            })
            .collect()
    }

    /// Methods the proposal requires.
    pub fn required_methods(&self) -> Vec<String> {
        self.required_namespaces.values().flat_map(|ns| ns.methods.iter().cloned()).collect()
    }

    pub fn required_events(&self) -> Vec<String> {
        self.required_namespaces.values().flat_map(|ns| ns.events.iter().cloned()).collect()
    }
}

/// What the wallet grants within one namespace of an approved session.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionNamespace {
    /// Chain-qualified addresses, `neo3:testnet:N...`.
    pub accounts: Vec<String>,
    pub methods: Vec<String>,
    pub events: Vec<String>,
}

pub type Namespaces = BTreeMap<String, SessionNamespace>;

/// An approved session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub topic: String,
    pub peer: AppMetadata,
    pub namespaces: Namespaces,
}

impl Session {
    /// Address granted on `chain_id`, if any.
    pub fn address_on(&self, chain_id: &str) -> Option<&str> {
        self.namespaces
            .values()
            .flat_map(|ns| ns.accounts.iter())
            .find_map(|account| {
                let (chain, address) = account.rsplit_once(':')?;
                (chain == chain_id).then_some(address)
            })
    }
}

/// A request received on a session topic.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRequest {
    pub topic: String,
    pub chain_id: String,
    pub request: RpcRequest,
}

impl SessionRequest {
    /// Key under which an approval of this request is remembered.
    pub fn approval_key(&self) -> String {
        format!("{}:{}", self.topic, self.request.canonical_form())
    }
}

/// Where a queued request stands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestStatus {
    /// Waiting for a user decision.
    Pending,
    /// Claimed by an approval or rejection; its response is being produced.
    Dispatched,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingRequest {
    #[serde(flatten)]
    pub request: SessionRequest,
    pub status: RequestStatus,
}

/// Inbound events from the session transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    Proposal(SessionProposal),
    Request(SessionRequest),
    /// The peer deleted the session.
    Delete { topic: String },
}
