use neoconnect_test_utils::{MockChainClient, alice, bob};
use neoconnect_wallets::{FacadeConfig, SignedMessage, SigningFacade, message::ENVELOPE_PREFIX};
use serde_json::json;
use std::sync::Arc;

#[tokio::test]
async fn sign_then_verify_through_the_facade() {
    let client = Arc::new(MockChainClient::new());
    let facade = SigningFacade::new(client.clone(), FacadeConfig::default());
    let account = alice();

    let signed = facade.execute(Some(&account), "signMessage", json!({ "message": "hello" })).await.unwrap();
    assert!(signed.is_message);
    assert_eq!(signed.result["publicKey"], account.public_key_hex());
    assert_eq!(signed.result["salt"].as_str().unwrap().len(), 32);
    assert!(signed.result["messageHex"].as_str().unwrap().starts_with(ENVELOPE_PREFIX));

    let verified = facade.execute(None, "verifyMessage", signed.result.clone()).await.unwrap();
    assert!(verified.is_message);
    assert_eq!(verified.result, json!(true));

    // signatures do not move between accounts
    let mut forged: SignedMessage = serde_json::from_value(signed.result).unwrap();
    forged.public_key = bob().public_key_hex();
    assert!(!facade.verify_message(&forged));

    assert!(client.calls().is_empty());
}

#[tokio::test]
async fn unsalted_version_omits_salt() {
    let facade = SigningFacade::new(Arc::new(MockChainClient::new()), FacadeConfig::default());
    let signed = facade
        .execute(Some(&alice()), "signMessage", json!({ "message": "hello", "version": 2 }))
        .await
        .unwrap();
    assert!(signed.result.get("salt").is_none());
    assert_eq!(signed.result["messageHex"], "010001f00568656c6c6f0000");
}
