//! # neoconnect-config
//!
//! Bridge configuration.
//!
//! Values are layered, later sources overriding earlier ones:
//! 1. [`BridgeConfig::default`]
//! 2. `neoconnect.toml` in the current directory, or the file named by `NEOCONNECT_CONFIG`
//! 3. `NEOCONNECT_`-prefixed environment variables

#![cfg_attr(not(test), warn(unused_crate_dependencies))]

#[macro_use]
extern crate tracing;

use figment::{
    Figment, Metadata, Profile, Provider,
    providers::{Env, Format, Serialized, Toml},
    value::{Dict, Map},
};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, path::PathBuf};

mod error;
pub use error::{ExtractConfigError, FAILED_TO_EXTRACT_CONFIG_MSG};

/// Chain namespace handled by the bridge.
pub const NEO3_NAMESPACE: &str = "neo3";

/// Descriptive metadata shown to the peer when a session is approved.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppMetadata {
    pub name: String,
    pub description: String,
    pub url: String,
    pub icons: Vec<String>,
}

/// Bridge configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Chain ids the wallet can serve, e.g. `neo3:testnet`.
    pub supported_chains: Vec<String>,
    /// dAPI methods the wallet accepts.
    pub supported_methods: Vec<String>,
    /// Events the wallet may emit.
    pub supported_events: Vec<String>,
    /// RPC node URL per chain id.
    pub rpc_endpoints: BTreeMap<String, String>,
    pub metadata: AppMetadata,
    /// Persists auto-accept decisions to this JSON file when set.
    pub approval_store: Option<PathBuf>,
    /// Blocks after the current height a built transaction stays valid for.
    pub valid_until_horizon: u32,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            supported_chains: vec!["neo3:mainnet".to_string(), "neo3:testnet".to_string()],
            supported_methods: Self::DEFAULT_METHODS.iter().map(|m| m.to_string()).collect(),
            supported_events: Vec::new(),
            rpc_endpoints: BTreeMap::new(),
            metadata: AppMetadata::default(),
            approval_store: None,
            valid_until_horizon: 100,
        }
    }
}

impl BridgeConfig {
    /// Default config file name.
    pub const FILE_NAME: &'static str = "neoconnect.toml";

    /// Env var overriding the config file path.
    pub const CONFIG_PATH_ENV: &'static str = "NEOCONNECT_CONFIG";

    /// Prefix of env vars overriding individual settings.
    pub const ENV_PREFIX: &'static str = "NEOCONNECT_";

    pub const DEFAULT_METHODS: &'static [&'static str] =
        &["invokeFunction", "testInvoke", "signMessage", "verifyMessage", "getapplicationlog"];

    /// Loads the layered configuration.
    pub fn load() -> Result<Self, ExtractConfigError> {
        Self::try_from(Self::figment())
    }

    /// The default figment: defaults, config file, then environment.
    pub fn figment() -> Figment {
        let file = std::env::var(Self::CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(Self::FILE_NAME));
        Figment::from(Self::default())
            .merge(Toml::file(file))
            .merge(Env::prefixed(Self::ENV_PREFIX).ignore(&["CONFIG"]))
    }

    /// Extracts a config from `provider`.
    pub fn try_from<T: Provider>(provider: T) -> Result<Self, ExtractConfigError> {
        trace!("load config with provider: {:?}", provider.metadata());
        Figment::from(provider).extract::<Self>().map_err(ExtractConfigError::new)
    }

    pub fn supports_chain(&self, chain: &str) -> bool {
        self.supported_chains.iter().any(|c| c == chain)
    }

    pub fn supports_method(&self, method: &str) -> bool {
        self.supported_methods.iter().any(|m| m == method)
    }

    /// RPC endpoint configured for `chain`.
    pub fn rpc_endpoint(&self, chain: &str) -> Option<&str> {
        self.rpc_endpoints.get(chain).map(String::as_str)
    }
}

impl Provider for BridgeConfig {
    fn metadata(&self) -> Metadata {
        Metadata::named("neoconnect defaults")
    }

    fn data(&self) -> Result<Map<Profile, Dict>, figment::Error> {
        Serialized::defaults(self).data()
    }
}
