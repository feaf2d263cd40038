use crate::utils::{TESTNET, config, harness, harness_with, open_session, request, test_invoke};
use neoconnect_config::BridgeConfig;
use neoconnect_rpc::{ErrorCode, Id, RpcRequest};
use neoconnect_session::{
    ApprovalStore, LifecycleEvent, MemoryApprovalStore, Reason, RequestOutcome, RequestStatus,
    SessionError, SessionEvent, StoreError,
};
use neoconnect_test_utils::{ChainCall, alice};
use serde_json::json;
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

/// A store whose reads fail.
#[derive(Debug, Default)]
struct UnreadableStore {
    recorded: parking_lot::Mutex<Vec<String>>,
}

impl ApprovalStore for UnreadableStore {
    fn is_approved(&self, _key: &str) -> Result<bool, StoreError> {
        Err(std::io::Error::other("disk gone").into())
    }

    fn record(&self, key: &str) -> Result<(), StoreError> {
        self.recorded.lock().push(key.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

fn counting_policy(
    accept: bool,
) -> (Arc<AtomicUsize>, impl Fn(Option<&str>, &str, &RpcRequest) -> bool + Send + Sync) {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let policy = move |_: Option<&str>, _: &str, _: &RpcRequest| {
        counter.fetch_add(1, Ordering::SeqCst);
        accept
    };
    (calls, policy)
}

#[tokio::test]
async fn manual_approval_answers_once_and_dequeues() {
    let h = harness();
    let session = open_session(&h).await;

    let outcome = h.controller.on_request(test_invoke(&session.topic, 1)).await.unwrap();
    assert_eq!(outcome, RequestOutcome::Queued);
    assert_eq!(h.controller.pending_requests().len(), 1);
    assert_eq!(h.controller.pending_requests()[0].status, RequestStatus::Pending);
    assert!(h.transport.responses().is_empty());

    let response = h.controller.approve_request(&session.topic, &Id::from(1)).await.unwrap();
    assert!(!response.is_error());
    assert_eq!(response.result.as_success().unwrap()["isTest"], true);
    assert!(h.controller.pending_requests().is_empty());
    similar_asserts::assert_eq!(h.transport.responses(), vec![(session.topic.clone(), response)]);

    // a second decision on the same request is refused
    let err = h.controller.approve_request(&session.topic, &Id::from(1)).await.unwrap_err();
    assert!(matches!(err, SessionError::InvalidState(_)));
    assert!(h.controller.reject_request(&session.topic, &Id::from(1)).await.is_err());
    assert_eq!(h.transport.responses().len(), 1);
    assert!(h.client.broadcasts().is_empty());
}

#[tokio::test]
async fn rejection_sends_user_rejected() {
    let h = harness();
    let session = open_session(&h).await;
    h.controller.on_request(test_invoke(&session.topic, 9)).await.unwrap();

    let response = h.controller.reject_request(&session.topic, &Id::from(9)).await.unwrap();

    let error = response.result.as_error().unwrap();
    assert_eq!(error.code, ErrorCode::UserRejected);
    assert_eq!(error.code.code(), 5000);
    assert!(h.controller.pending_requests().is_empty());
    assert_eq!(h.transport.responses().len(), 1);
    assert!(h.client.calls().is_empty());
}

#[tokio::test]
async fn approved_request_bypasses_policy_next_time() {
    let (policy_calls, policy) = counting_policy(false);
    let h = harness_with(config(), |c| c.with_policy(Arc::new(policy)));
    let session = open_session(&h).await;

    // the policy declines, so the first request waits for the user
    let outcome = h.controller.on_request(test_invoke(&session.topic, 1)).await.unwrap();
    assert_eq!(outcome, RequestOutcome::Queued);
    assert_eq!(policy_calls.load(Ordering::SeqCst), 1);
    h.controller.approve_request(&session.topic, &Id::from(1)).await.unwrap();

    // the identical request is now served from the approval cache
    let outcome = h.controller.on_request(test_invoke(&session.topic, 2)).await.unwrap();
    let RequestOutcome::AutoApproved(response) = outcome else { panic!("expected auto approval") };
    assert_eq!(response.id, Id::from(2));
    assert_eq!(policy_calls.load(Ordering::SeqCst), 1);
    assert!(h.controller.pending_requests().is_empty());
    assert_eq!(h.client.count(|c| matches!(c, ChainCall::InvokeScript { .. })), 2);

    // a different request is not covered
    let other = request(&session.topic, 3, "signMessage", json!({ "message": "hi" }));
    assert_eq!(h.controller.on_request(other).await.unwrap(), RequestOutcome::Queued);
    assert_eq!(policy_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn policy_acceptance_fulfills_immediately() {
    let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let recorder = seen.clone();
    let policy = move |address: Option<&str>, chain: &str, request: &RpcRequest| {
        recorder.lock().push((address.map(str::to_string), chain.to_string(), request.method.clone()));
        true
    };
    let h = harness_with(config(), |c| c.with_policy(Arc::new(policy)));
    let session = open_session(&h).await;

    let outcome = h
        .controller
        .on_request(request(&session.topic, 4, "signMessage", json!({ "message": "hello" })))
        .await
        .unwrap();

    let RequestOutcome::AutoApproved(response) = outcome else { panic!("expected auto approval") };
    assert!(response.is_message);
    assert_eq!(response.result.as_success().unwrap()["publicKey"], alice().public_key_hex());
    assert_eq!(
        seen.lock().clone(),
        vec![(Some(alice().address()), TESTNET.to_string(), "signMessage".to_string())]
    );
    assert!(h.controller.pending_requests().is_empty());
    assert_eq!(h.transport.responses().len(), 1);
}

#[tokio::test]
async fn failed_fulfillment_still_answers_and_dequeues() {
    let h = harness();
    let session = open_session(&h).await;
    h.controller.on_request(test_invoke(&session.topic, 1)).await.unwrap();
    h.client.fail_with("RPC server unavailable");

    let response = h.controller.approve_request(&session.topic, &Id::from(1)).await.unwrap();

    let error = response.result.as_error().unwrap();
    assert_eq!(error.code, ErrorCode::ChainCallFailed);
    assert_eq!(error.message, "RPC server unavailable");
    assert!(h.controller.pending_requests().is_empty());
    assert_eq!(h.transport.responses().len(), 1);

    // failures are not remembered as approvals
    let outcome = h.controller.on_request(test_invoke(&session.topic, 2)).await.unwrap();
    assert_eq!(outcome, RequestOutcome::Queued);
}

#[tokio::test]
async fn chain_without_facade_gets_generic_error() {
    let config = BridgeConfig {
        supported_chains: vec![TESTNET.into(), "neo3:mainnet".into()],
        ..config()
    };
    let h = harness_with(config, |c| c);
    h.controller.on_proposal(crate::utils::proposal(1, &["neo3:mainnet"], &["testInvoke"])).await;
    let session = h.controller.approve_proposal(1).await.unwrap();

    let mut req = test_invoke(&session.topic, 1);
    req.chain_id = "neo3:mainnet".into();
    h.controller.on_request(req).await.unwrap();
    let response = h.controller.approve_request(&session.topic, &Id::from(1)).await.unwrap();

    assert_eq!(response.result.as_error().unwrap().message, "Failed or Rejected Request");
    assert!(h.controller.pending_requests().is_empty());
}

#[tokio::test]
async fn unsupported_method_is_answered_right_away() {
    let h = harness();
    let session = open_session(&h).await;

    let outcome = h
        .controller
        .on_request(request(&session.topic, 5, "eth_sign", json!([])))
        .await
        .unwrap();

    let RequestOutcome::Rejected(response) = outcome else { panic!("expected rejection") };
    assert_eq!(response.result.as_error().unwrap().code, ErrorCode::MethodNotFound);
    assert!(h.controller.pending_requests().is_empty());
    assert_eq!(h.transport.responses().len(), 1);
}

#[tokio::test]
async fn request_for_unknown_topic_is_an_error() {
    let h = harness();
    let err = h.controller.on_request(test_invoke("missing", 1)).await.unwrap_err();
    assert!(matches!(err, SessionError::InvalidState(_)));
    assert!(h.transport.responses().is_empty());
}

#[tokio::test]
async fn concurrent_approvals_answer_once() {
    let h = harness();
    let session = open_session(&h).await;
    h.controller.on_request(test_invoke(&session.topic, 1)).await.unwrap();

    let id = Id::from(1);
    let (first, second) = tokio::join!(
        h.controller.approve_request(&session.topic, &id),
        h.controller.reject_request(&session.topic, &id),
    );

    assert!(first.is_ok() != second.is_ok());
    assert_eq!(h.transport.responses().len(), 1);
    assert!(h.controller.pending_requests().is_empty());
}

#[tokio::test]
async fn response_to_torn_down_topic_is_tolerated() {
    let h = harness();
    let session = open_session(&h).await;
    h.controller.on_request(test_invoke(&session.topic, 1)).await.unwrap();
    h.transport.close_topic(&session.topic);

    let response = h.controller.approve_request(&session.topic, &Id::from(1)).await.unwrap();

    assert!(!response.is_error());
    assert!(h.transport.responses().is_empty());
    assert!(h.controller.pending_requests().is_empty());
}

#[tokio::test]
async fn peer_deletion_drops_session_and_requests() {
    let h = harness();
    let session = open_session(&h).await;
    h.controller.on_request(test_invoke(&session.topic, 1)).await.unwrap();

    h.controller.handle_event(SessionEvent::Delete { topic: session.topic.clone() }).await.unwrap();

    assert!(h.controller.sessions().is_empty());
    assert!(h.controller.pending_requests().is_empty());
    assert!(h.transport.disconnected().is_empty());
    assert!(matches!(
        h.controller.approve_request(&session.topic, &Id::from(1)).await,
        Err(SessionError::InvalidState(_))
    ));
}

#[tokio::test]
async fn disconnect_all_is_idempotent() {
    let store = Arc::new(MemoryApprovalStore::new());
    let h = harness_with(config(), |c| c.with_store(store.clone()));

    // nothing to tear down
    h.controller.disconnect_all().await.unwrap();

    let session = open_session(&h).await;
    h.controller.on_request(test_invoke(&session.topic, 1)).await.unwrap();
    h.controller.approve_request(&session.topic, &Id::from(1)).await.unwrap();
    h.controller.on_request(test_invoke(&session.topic, 2)).await.unwrap();
    h.controller
        .on_proposal(crate::utils::proposal(2, &[TESTNET], &["signMessage"]))
        .await;
    assert_eq!(store.len(), 1);

    h.controller.disconnect_all().await.unwrap();
    h.controller.disconnect_all().await.unwrap();

    assert!(h.controller.sessions().is_empty());
    assert!(h.controller.proposals().is_empty());
    assert!(h.controller.pending_requests().is_empty());
    assert!(store.is_empty());
    assert_eq!(h.transport.disconnected(), vec![(session.topic, Reason::USER_DISCONNECTED)]);
}

#[tokio::test]
async fn observers_are_notified_of_queue_changes() {
    let h = harness();
    let session = open_session(&h).await;
    let mut events = h.controller.subscribe();

    h.controller.on_request(test_invoke(&session.topic, 1)).await.unwrap();
    assert_eq!(events.recv().await.unwrap(), LifecycleEvent::RequestsChanged);

    h.controller.reject_request(&session.topic, &Id::from(1)).await.unwrap();
    // claimed, then removed
    assert_eq!(events.recv().await.unwrap(), LifecycleEvent::RequestsChanged);
    assert_eq!(events.recv().await.unwrap(), LifecycleEvent::RequestsChanged);
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn requests_via_handle_event_are_queued_in_order() {
    let h = harness();
    let session = open_session(&h).await;

    for id in 1..=3 {
        h.controller
            .handle_event(SessionEvent::Request(test_invoke(&session.topic, id)))
            .await
            .unwrap();
    }

    let ids: Vec<_> = h.controller.pending_requests().into_iter().map(|r| r.request.request.id).collect();
    assert_eq!(ids, vec![Id::from(1), Id::from(2), Id::from(3)]);

    // approving the last does not wait on the others
    h.controller.approve_request(&session.topic, &Id::from(3)).await.unwrap();
    assert_eq!(h.controller.pending_requests().len(), 2);
}

#[tokio::test]
async fn unreadable_store_falls_back_to_the_queue() {
    let store = Arc::new(UnreadableStore::default());
    let h = harness_with(config(), |c| c.with_store(store.clone()));
    let session = open_session(&h).await;

    let outcome = h.controller.on_request(test_invoke(&session.topic, 1)).await.unwrap();
    assert_eq!(outcome, RequestOutcome::Queued);
    assert_eq!(h.controller.pending_requests().len(), 1);

    let response = h.controller.approve_request(&session.topic, &Id::from(1)).await.unwrap();
    assert!(!response.is_error());
    assert_eq!(h.transport.responses().len(), 1);
    assert_eq!(store.recorded.lock().len(), 1);
}

#[tokio::test]
async fn unreadable_store_still_lets_policy_decide() {
    let store = Arc::new(UnreadableStore::default());
    let (policy_calls, policy) = counting_policy(true);
    let h = harness_with(config(), |c| c.with_store(store).with_policy(Arc::new(policy)));
    let session = open_session(&h).await;

    let outcome = h.controller.on_request(test_invoke(&session.topic, 1)).await.unwrap();

    assert!(matches!(outcome, RequestOutcome::AutoApproved(_)));
    assert_eq!(policy_calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.transport.responses().len(), 1);
}

#[tokio::test]
async fn teardown_during_fulfillment_records_no_approval() {
    let store = Arc::new(MemoryApprovalStore::new());
    let h = harness_with(config(), |c| c.with_store(store.clone()));
    let session = open_session(&h).await;
    h.controller.on_request(test_invoke(&session.topic, 1)).await.unwrap();

    let id = Id::from(1);
    let (approved, disconnected) =
        tokio::join!(h.controller.approve_request(&session.topic, &id), h.controller.disconnect_all());

    // the simulation finished after teardown: answered, but not remembered
    assert!(!approved.unwrap().is_error());
    disconnected.unwrap();
    assert!(store.is_empty());
    assert!(h.controller.pending_requests().is_empty());
    assert!(h.transport.responses().is_empty());
}
