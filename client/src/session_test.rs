use super::*;

use std::sync::atomic::Ordering as AtomicOrdering;

use tokio::sync::Notify;

use crate::api::test_helpers::MockTransport;
use crate::token_store::MemoryTokenStore;

fn session_with(mock: MockTransport) -> (Arc<Session>, Arc<MemoryTokenStore>, Arc<MockTransport>) {
    let transport = Arc::new(mock);
    let store = Arc::new(MemoryTokenStore::new());
    let session = Arc::new(Session::new(transport.clone(), store.clone()));
    (session, store, transport)
}

// =============================================================================
// initialize
// =============================================================================

#[tokio::test]
async fn initialize_without_persisted_token_is_unauthenticated() {
    let (session, ..) = session_with(MockTransport::default());
    session.initialize().await;
    assert_eq!(session.state(), SessionState::Unauthenticated);
}

#[tokio::test]
async fn initialize_with_valid_token_is_authenticated() {
    let (session, store, _) = session_with(MockTransport {
        valid_token: Some("tok-1".into()),
        ..Default::default()
    });
    store.save("tok-1").unwrap();

    session.initialize().await;

    let state = session.state();
    assert_eq!(state.user().map(|u| u.email.as_str()), Some("a@x.com"));
    assert_eq!(state.token(), Some("tok-1"));
}

#[tokio::test]
async fn initialize_with_rejected_token_clears_slot() {
    let (session, store, _) = session_with(MockTransport {
        valid_token: Some("tok-1".into()),
        ..Default::default()
    });
    store.save("stale-token").unwrap();

    session.initialize().await;

    assert_eq!(session.state(), SessionState::Unauthenticated);
    assert_eq!(store.load().unwrap(), None);
}

#[tokio::test]
async fn initialize_transport_failure_assumes_unauthenticated() {
    let (session, store, _) = session_with(MockTransport {
        valid_token: Some("tok-1".into()),
        fail_transport: true,
        ..Default::default()
    });
    store.save("tok-1").unwrap();

    session.initialize().await;

    assert_eq!(session.state(), SessionState::Unauthenticated);
    assert_eq!(store.load().unwrap(), None);
}

// =============================================================================
// sign_in / sign_up
// =============================================================================

#[tokio::test]
async fn sign_in_authenticates_and_persists_token() {
    let (session, store, _) = session_with(MockTransport::default());
    session.initialize().await;

    let user = session.sign_in("a@x.com", "secret1").await.unwrap();
    assert_eq!(user.email, "a@x.com");
    assert_eq!(session.state().token(), Some("signin-token"));
    assert_eq!(store.load().unwrap().as_deref(), Some("signin-token"));
}

#[tokio::test]
async fn sign_in_rejection_leaves_state_untouched() {
    let (session, store, _) = session_with(MockTransport {
        reject_sign_in: true,
        ..Default::default()
    });
    session.initialize().await;

    let err = session.sign_in("a@x.com", "wrong").await.unwrap_err();
    assert_eq!(err.to_string(), "invalid login credentials");
    assert_eq!(session.state(), SessionState::Unauthenticated);
    assert_eq!(store.load().unwrap(), None);
}

#[tokio::test]
async fn sign_up_authenticates_and_persists_token() {
    let (session, store, _) = session_with(MockTransport::default());
    session.initialize().await;

    session.sign_up("new@x.com", "secret1").await.unwrap();
    assert_eq!(session.state().user().map(|u| u.email.as_str()), Some("new@x.com"));
    assert_eq!(store.load().unwrap().as_deref(), Some("signup-token"));
}

#[tokio::test]
async fn sign_in_overwrites_previous_session() {
    let (session, store, _) = session_with(MockTransport::default());
    session.sign_up("old@x.com", "secret1").await.unwrap();

    session.sign_in("new@x.com", "secret1").await.unwrap();
    assert_eq!(session.state().user().map(|u| u.email.as_str()), Some("new@x.com"));
    assert_eq!(store.load().unwrap().as_deref(), Some("signin-token"));
}

// =============================================================================
// sign_out — must clear the local session no matter what the server says.
// =============================================================================

#[tokio::test]
async fn sign_out_clears_session_and_slot() {
    let (session, store, transport) = session_with(MockTransport::default());
    session.sign_in("a@x.com", "secret1").await.unwrap();

    session.sign_out().await;

    assert_eq!(session.state(), SessionState::Unauthenticated);
    assert_eq!(store.load().unwrap(), None);
    assert_eq!(transport.sign_out_calls.load(AtomicOrdering::SeqCst), 1);
}

#[tokio::test]
async fn sign_out_clears_session_even_when_server_fails() {
    let (session, store, transport) = session_with(MockTransport {
        sign_out_error: true,
        ..Default::default()
    });
    session.sign_in("a@x.com", "secret1").await.unwrap();

    session.sign_out().await;

    assert_eq!(session.state(), SessionState::Unauthenticated);
    assert_eq!(store.load().unwrap(), None);
    assert_eq!(transport.sign_out_calls.load(AtomicOrdering::SeqCst), 1);
}

#[tokio::test]
async fn sign_out_without_session_skips_server_call() {
    let (session, _, transport) = session_with(MockTransport::default());
    session.initialize().await;

    session.sign_out().await;

    assert_eq!(session.state(), SessionState::Unauthenticated);
    assert_eq!(transport.sign_out_calls.load(AtomicOrdering::SeqCst), 0);
}

#[tokio::test]
async fn sign_out_is_visible_to_subscribers_before_returning() {
    let (session, ..) = session_with(MockTransport::default());
    session.sign_in("a@x.com", "secret1").await.unwrap();

    let mut rx = session.subscribe();
    session.sign_out().await;

    // The transition must already be observable; no further await needed.
    assert!(rx.has_changed().unwrap());
    assert_eq!(*rx.borrow_and_update(), SessionState::Unauthenticated);
}

// =============================================================================
// has_role
// =============================================================================

#[tokio::test]
async fn has_role_requires_authentication() {
    let (session, ..) = session_with(MockTransport::default());
    session.initialize().await;

    let err = session.has_role("admin").await.unwrap_err();
    assert!(matches!(err, SessionError::NotSignedIn));
}

#[tokio::test]
async fn has_role_true_for_admin() {
    let (session, ..) = session_with(MockTransport { admin: true, ..Default::default() });
    session.sign_in("a@x.com", "secret1").await.unwrap();

    assert!(session.has_role("admin").await.unwrap());
}

#[tokio::test]
async fn has_role_false_for_non_admin() {
    let (session, ..) = session_with(MockTransport::default());
    session.sign_in("a@x.com", "secret1").await.unwrap();

    assert!(!session.has_role("admin").await.unwrap());
}

#[tokio::test]
async fn has_role_false_for_unrecognized_role() {
    let (session, ..) = session_with(MockTransport { admin: true, ..Default::default() });
    session.sign_in("a@x.com", "secret1").await.unwrap();

    assert!(!session.has_role("superuser").await.unwrap());
}

#[tokio::test]
async fn has_role_transport_failure_is_an_error() {
    let (session, ..) = session_with(MockTransport {
        admin: true,
        role_check_error: true,
        ..Default::default()
    });
    session.sign_in("a@x.com", "secret1").await.unwrap();

    let err = session.has_role("admin").await.unwrap_err();
    assert!(matches!(err, SessionError::Api(_)));
}

#[tokio::test]
async fn has_role_discarded_when_superseded_by_sign_out() {
    let started = Arc::new(Notify::new());
    let gate = Arc::new(Notify::new());
    let (session, ..) = session_with(MockTransport {
        admin: true,
        role_check_started: Some(started.clone()),
        role_check_gate: Some(gate.clone()),
        ..Default::default()
    });
    session.sign_in("a@x.com", "secret1").await.unwrap();

    let checking = session.clone();
    let task = tokio::spawn(async move { checking.has_role("admin").await });

    // Let the check reach the transport, then sign out underneath it.
    started.notified().await;
    session.sign_out().await;
    gate.notify_one();

    let result = task.await.unwrap();
    assert!(matches!(result, Err(SessionError::Superseded)));
}
