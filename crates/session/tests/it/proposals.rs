use crate::utils::{TESTNET, config, harness, harness_with, proposal};
use neoconnect_config::BridgeConfig;
use neoconnect_session::{LifecycleEvent, ProposalDecision, Reason, SessionError};
use neoconnect_test_utils::alice;

#[tokio::test]
async fn supported_proposal_is_accepted() {
    let config = BridgeConfig {
        supported_chains: vec!["neo3:N3".into()],
        supported_methods: vec!["invokeFunction".into(), "testInvoke".into()],
        ..config()
    };
    let h = harness_with(config, |c| c);

    let decision = h.controller.on_proposal(proposal(7, &["neo3:N3"], &["invokeFunction"])).await;

    assert_eq!(decision, ProposalDecision::Accept);
    assert_eq!(h.controller.proposals().len(), 1);
    assert!(h.transport.rejected().is_empty());
}

#[tokio::test]
async fn unsupported_chain_is_declined_without_queueing() {
    let h = harness();

    let decision = h.controller.on_proposal(proposal(3, &["neo3:private"], &["invokeFunction"])).await;

    assert_eq!(decision, ProposalDecision::Decline(Reason::UNSUPPORTED_CHAINS));
    assert!(h.controller.proposals().is_empty());
    similar_asserts::assert_eq!(h.transport.rejected(), vec![(3, Reason::UNSUPPORTED_CHAINS)]);
}

#[tokio::test]
async fn unsupported_method_is_declined() {
    let h = harness();

    let decision = h.controller.on_proposal(proposal(4, &[TESTNET], &["eth_sendTransaction"])).await;

    assert_eq!(decision, ProposalDecision::Decline(Reason::UNSUPPORTED_METHODS));
    assert!(h.controller.proposals().is_empty());
    assert_eq!(h.transport.rejected()[0].1.code, 5101);
}

#[tokio::test]
async fn chain_check_takes_precedence() {
    let h = harness();
    let decision = h.controller.on_proposal(proposal(5, &["neo3:private"], &["nope"])).await;
    assert_eq!(decision, ProposalDecision::Decline(Reason::UNSUPPORTED_CHAINS));
}

#[tokio::test]
async fn approval_opens_session_with_matching_accounts() {
    let h = harness();
    let mut events = h.controller.subscribe();

    h.controller.on_proposal(proposal(1, &[TESTNET], &["testInvoke"])).await;
    let session = h.controller.approve_proposal(1).await.unwrap();

    assert!(h.controller.proposals().is_empty());
    similar_asserts::assert_eq!(h.controller.sessions(), vec![session.clone()]);
    assert_eq!(session.peer.name, "dApp");

    // only the testnet account is granted
    let accounts = &session.namespaces["neo3"].accounts;
    assert_eq!(accounts, &vec![format!("{TESTNET}:{}", alice().address())]);
    assert_eq!(session.namespaces["neo3"].methods, vec!["testInvoke".to_string()]);

    let approved = h.transport.approved();
    assert_eq!(approved.len(), 1);
    assert_eq!(approved[0].1, session.topic);

    assert_eq!(events.recv().await.unwrap(), LifecycleEvent::ProposalsChanged);
    assert_eq!(events.recv().await.unwrap(), LifecycleEvent::ProposalsChanged);
    assert_eq!(events.recv().await.unwrap(), LifecycleEvent::SessionsChanged);
}

#[tokio::test]
async fn user_rejection_declines_proposal() {
    let h = harness();
    h.controller.on_proposal(proposal(2, &[TESTNET], &["signMessage"])).await;

    h.controller.reject_proposal(2).await.unwrap();

    assert!(h.controller.proposals().is_empty());
    assert!(h.controller.sessions().is_empty());
    similar_asserts::assert_eq!(h.transport.rejected(), vec![(2, Reason::USER_REJECTED)]);

    let err = h.controller.reject_proposal(2).await.unwrap_err();
    assert!(matches!(err, SessionError::InvalidState(_)));
    assert_eq!(h.transport.rejected().len(), 1);
}

#[tokio::test]
async fn unknown_proposal_cannot_be_approved() {
    let h = harness();
    assert!(matches!(
        h.controller.approve_proposal(99).await,
        Err(SessionError::InvalidState(_))
    ));
    assert!(h.transport.approved().is_empty());
}

#[tokio::test]
async fn concurrent_approvals_open_one_session() {
    let h = harness();
    h.controller.on_proposal(proposal(1, &[TESTNET], &["testInvoke"])).await;

    let (first, second) =
        tokio::join!(h.controller.approve_proposal(1), h.controller.approve_proposal(1));

    assert!(first.is_ok() != second.is_ok());
    assert_eq!(h.controller.sessions().len(), 1);
    assert_eq!(h.transport.approved().len(), 1);
    assert!(h.controller.proposals().is_empty());
}

#[tokio::test]
async fn failed_pairing_keeps_proposal_pending() {
    let h = harness();
    h.controller.on_proposal(proposal(1, &[TESTNET], &["testInvoke"])).await;
    h.transport.fail_approvals();

    let err = h.controller.approve_proposal(1).await.unwrap_err();

    assert!(matches!(err, SessionError::Transport(_)));
    assert_eq!(h.controller.proposals().len(), 1);
    assert!(h.controller.sessions().is_empty());

    // the user can still decline it
    h.controller.reject_proposal(1).await.unwrap();
    assert!(h.controller.proposals().is_empty());
}
