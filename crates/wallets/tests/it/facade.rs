use async_trait::async_trait;
use neoconnect_primitives::{
    Arg, ArgType, ContractInvocation, FeeOptions, InvocationBatch, Transaction,
};
use neoconnect_test_utils::{ChainCall, MockChainClient, NEO_HASH, TESTNET_MAGIC, alice, init_tracing};
use neoconnect_wallets::{
    Account, FacadeConfig, InvokeResult, SigningContext, SigningError, SigningFacade,
    TransactionSigner, VmState, WalletError, account::verify_signature,
};
use serde_json::{Map, json};
use similar_asserts::assert_eq;
use std::sync::Arc;

fn facade(client: &Arc<MockChainClient>) -> SigningFacade {
    SigningFacade::new(client.clone(), FacadeConfig::default())
}

fn symbol_batch() -> InvocationBatch {
    InvocationBatch::new(vec![ContractInvocation::new(NEO_HASH.parse().unwrap(), "symbol", vec![])])
}

fn transfer_batch(from: &Account) -> InvocationBatch {
    InvocationBatch::new(vec![ContractInvocation::new(
        NEO_HASH.parse().unwrap(),
        "transfer",
        vec![
            Arg::new(ArgType::Address, from.address()),
            Arg::new(ArgType::Address, from.address()),
            Arg::new(ArgType::Integer, 1),
            Arg::empty(ArgType::Any),
        ],
    )])
}

#[derive(Debug)]
struct FailingSigner;

#[async_trait]
impl TransactionSigner for FailingSigner {
    async fn sign_transaction(
        &self,
        _tx: Transaction,
        _context: &SigningContext,
    ) -> Result<Transaction, SigningError> {
        Err(SigningError::other("device disconnected"))
    }
}

/// Signs with a local key, like a device holding it would.
#[derive(Debug)]
struct DeviceSigner(Account);

#[async_trait]
impl TransactionSigner for DeviceSigner {
    async fn sign_transaction(
        &self,
        mut tx: Transaction,
        context: &SigningContext,
    ) -> Result<Transaction, SigningError> {
        let payload =
            tx.sign_payload(context.network_magic).map_err(|e| SigningError::other(e.to_string()))?;
        let signature = self.0.sign(&payload).map_err(|e| SigningError::other(e.to_string()))?;
        tx.witnesses[0].invocation = neoconnect_primitives::signature_invocation_script(&signature);
        Ok(tx)
    }
}

#[tokio::test]
async fn test_invoke_is_tagged_and_never_broadcasts() {
    init_tracing();
    let client = Arc::new(MockChainClient::new());
    let facade = facade(&client);
    let account = alice();

    let response = facade
        .execute(
            Some(&account),
            "testInvoke",
            json!({ "scriptHash": NEO_HASH, "operation": "symbol", "args": [] }),
        )
        .await
        .unwrap();

    assert!(!response.is_message);
    assert_eq!(response.result["isTest"], true);
    assert_eq!(response.result["state"], "HALT");
    assert!(client.broadcasts().is_empty());

    let calls = client.calls();
    assert_eq!(calls.len(), 1);
    let ChainCall::InvokeScript { script, signers } = &calls[0] else { panic!("expected invokescript") };
    assert_eq!(
        alloy_primitives::hex::encode(script),
        "c21f0c0673796d626f6c0c14f563ea40bc283d4d0e05c48ea305b3f2a07340ef41627d5b52"
    );
    assert_eq!(signers.len(), 1);
    assert_eq!(signers[0].account, Some(account.script_hash()));
}

#[tokio::test]
async fn invoke_signs_and_broadcasts_once() {
    let client = Arc::new(MockChainClient::new().with_height(5_000));
    let facade = facade(&client);
    let account = alice();

    let txid = facade.invoke(Some(&account), transfer_batch(&account)).await.unwrap();

    let broadcasts = client.broadcasts();
    assert_eq!(broadcasts.len(), 1);
    let tx = &broadcasts[0];
    assert_eq!(tx.txid().unwrap(), txid);
    assert_eq!(tx.valid_until_block, 5_100);
    assert_eq!(tx.system_fee, 984_060);
    assert_eq!(tx.network_fee, 1_230_610);
    assert_eq!(tx.witnesses.len(), 1);
    assert_eq!(tx.witnesses[0].verification, account.verification_script());

    // PUSHDATA1 64 <signature>
    let invocation = &tx.witnesses[0].invocation;
    assert_eq!(invocation.len(), 66);
    let payload = tx.sign_payload(TESTNET_MAGIC).unwrap();
    assert!(verify_signature(account.public_key(), &payload, &invocation[2..]));
}

#[tokio::test]
async fn fee_options_adjust_fees() {
    let client = Arc::new(MockChainClient::new());
    let facade = facade(&client);
    let account = alice();

    let mut batch = symbol_batch();
    batch.fees = FeeOptions {
        extra_system_fee: Some(16),
        network_fee_override: Some(2_000_000),
        ..Default::default()
    };
    facade.invoke(Some(&account), batch).await.unwrap();

    let tx = &client.broadcasts()[0];
    assert_eq!(tx.system_fee, 984_076);
    assert_eq!(tx.network_fee, 2_000_000);
}

#[tokio::test]
async fn network_magic_is_fetched_once() {
    let client = Arc::new(MockChainClient::new());
    let facade = facade(&client);
    let account = alice();

    facade.invoke(Some(&account), symbol_batch()).await.unwrap();
    facade.invoke(Some(&account), symbol_batch()).await.unwrap();

    assert_eq!(client.count(|c| matches!(c, ChainCall::NetworkMagic)), 1);
    assert_eq!(client.broadcasts().len(), 2);
}

#[tokio::test]
async fn hardware_signing_failure_still_submits() {
    init_tracing();
    let client = Arc::new(MockChainClient::new());
    let config = FacadeConfig { hardware_signer: Some(Arc::new(FailingSigner)), ..Default::default() };
    let facade = SigningFacade::new(client.clone(), config);
    let account = Account::watch_only(&alice().public_key_hex()).unwrap();

    facade.invoke(Some(&account), symbol_batch()).await.unwrap();

    let broadcasts = client.broadcasts();
    assert_eq!(broadcasts.len(), 1);
    assert!(!broadcasts[0].witnesses[0].is_signed());
}

#[tokio::test]
async fn hardware_signer_output_is_broadcast() {
    let client = Arc::new(MockChainClient::new());
    let config =
        FacadeConfig { hardware_signer: Some(Arc::new(DeviceSigner(alice()))), ..Default::default() };
    let facade = SigningFacade::new(client.clone(), config);
    let account = Account::watch_only(&alice().public_key_hex()).unwrap();

    facade.invoke(Some(&account), symbol_batch()).await.unwrap();

    let tx = &client.broadcasts()[0];
    assert!(tx.witnesses[0].is_signed());
    let payload = tx.sign_payload(TESTNET_MAGIC).unwrap();
    assert!(verify_signature(account.public_key(), &payload, &tx.witnesses[0].invocation[2..]));
}

#[tokio::test]
async fn missing_account_fails_before_any_network_call() {
    let client = Arc::new(MockChainClient::new());
    let facade = facade(&client);

    let err = facade.invoke(None, symbol_batch()).await.unwrap_err();
    assert!(matches!(err, WalletError::InvalidState(_)));

    let err = facade.execute(None, "signMessage", json!({ "message": "hello" })).await.unwrap_err();
    assert!(matches!(err, WalletError::InvalidState(_)));

    let watch_only = Account::watch_only(&alice().public_key_hex()).unwrap();
    let err = facade.invoke(Some(&watch_only), symbol_batch()).await.unwrap_err();
    assert!(matches!(err, WalletError::InvalidState(_)));

    assert!(client.calls().is_empty());
}

#[tokio::test]
async fn chain_failures_pass_message_through() {
    let client = Arc::new(MockChainClient::new());
    client.fail_with("Invalid params: unknown transaction");
    let facade = facade(&client);

    let err = facade.raw_call("getapplicationlog", json!(["0x01"])).await.unwrap_err();
    assert!(matches!(&err, WalletError::ChainCall(msg) if msg == "Invalid params: unknown transaction"));
}

#[tokio::test]
async fn faulted_simulation_aborts_invoke() {
    let client = Arc::new(MockChainClient::new());
    client.set_invoke_result(InvokeResult {
        script: String::new(),
        state: VmState::Fault,
        gas_consumed: 0,
        exception: Some("ASSERT is executed with false result.".to_string()),
        stack: vec![],
        extra: Map::new(),
    });
    let facade = facade(&client);

    let err = facade.invoke(Some(&alice()), symbol_batch()).await.unwrap_err();
    assert_eq!(err.to_string(), "ASSERT is executed with false result.");
    assert!(client.broadcasts().is_empty());
}

#[tokio::test]
async fn raw_calls_route_by_method() {
    let client = Arc::new(MockChainClient::new());
    let facade = facade(&client);

    let log = facade.execute(None, "getapplicationlog", json!(["0xabc"])).await.unwrap();
    assert_eq!(log.result["txid"], "0xabc");
    assert!(!log.is_message);

    let count = facade.execute(None, "getblockcount", json!([])).await.unwrap();
    assert_eq!(count.result["method"], "getblockcount");

    assert_eq!(
        client.calls(),
        vec![
            ChainCall::ApplicationLog("0xabc".to_string()),
            ChainCall::Execute { method: "getblockcount".to_string(), params: json!([]) },
        ]
    );
}

#[tokio::test]
async fn invalid_params_are_reported() {
    let client = Arc::new(MockChainClient::new());
    let facade = facade(&client);

    let err = facade.execute(Some(&alice()), "invokeFunction", json!({ "nope": 1 })).await.unwrap_err();
    assert!(matches!(err, WalletError::InvalidParams(_)));
    assert!(client.calls().is_empty());
}

#[tokio::test]
async fn overflowing_fee_is_rejected_before_broadcast() {
    let client = Arc::new(MockChainClient::new());
    let facade = facade(&client);

    let err = facade
        .execute(
            Some(&alice()),
            "invokeFunction",
            json!({
                "invocations": [{ "scriptHash": NEO_HASH, "operation": "symbol" }],
                "extraSystemFee": i64::MAX
            }),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, WalletError::InvalidParams(_)));
    assert_eq!(neoconnect_rpc::RpcError::from(err).code, neoconnect_rpc::ErrorCode::InvalidParams);
    assert!(client.broadcasts().is_empty());
}
