//! Mocks and fixtures for the neoconnect test suites.

#![warn(unused_crate_dependencies, unreachable_pub)]

mod chain;
pub use chain::{ChainCall, MockChainClient};

mod transport;
pub use transport::MockTransport;

use neoconnect_wallets::Account;

/// Private key of the first test account.
pub const ALICE_KEY: &str = "7d128a6d096f0c14c3a25a2b0c41cf79661bfcb4a8cc95aaaea28bde4d732344";

/// Private key of the second test account.
pub const BOB_KEY: &str = "9ab7e154840daca3a2efadaf0df93cd3a5b51768c632f5433f86909d9b994a69";

/// Script hash of the NEO native contract.
pub const NEO_HASH: &str = "0xef4073a0f2b305a38ec4050e4d3d28bc40ea63f5";

/// Network magic of the N3 testnet.
pub const TESTNET_MAGIC: u32 = 894_710_606;

pub fn alice() -> Account {
    Account::from_private_key(ALICE_KEY).expect("valid test key")
}

pub fn bob() -> Account {
    Account::from_private_key(BOB_KEY).expect("valid test key")
}

/// Initializes tracing for tests.
pub fn init_tracing() {
    let _ = tracing_subscriber::FmtSubscriber::builder()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}
