//! Session manager behaviour: decoding, expiry, persistence and the identity stream.

mod common;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use tempfile::tempdir;

use trail_client::identity::{dev_token, FileTokenStore, Identity, MemoryTokenStore, Role, SessionManager, TokenStore};

fn with_payload(payload: &str) -> String {
    format!("eyJhbGciOiJIUzI1NiJ9.{}.c2ln", URL_SAFE_NO_PAD.encode(payload))
}

fn identity(name: &str, role: Role) -> Identity {
    Identity { id: name.to_string(), username: name.to_string(), role }
}

#[test]
fn malformed_tokens_degrade_to_anonymous() {
    let cases = vec![
        "garbage".to_string(),
        "only.two".to_string(),
        "a.b.c.d".to_string(),
        "a.***.c".to_string(),
        with_payload("not json"),
        with_payload("{}"),
        with_payload(r#"{"sub":"x","role":"GUEST","exp":9999999999}"#),
        with_payload(r#"{"sub":"x","role":"APPLICANT","exp":"tomorrow"}"#),
    ];
    for t in cases {
        let sm = SessionManager::in_memory();
        sm.set_token(&t);
        assert!(!sm.is_authenticated(), "token {:?} must not authenticate", t);
        assert!(sm.current_user().is_none(), "token {:?} must not yield an identity", t);
        assert!(!sm.is_admin());
        assert!(!sm.is_applicant());
        // stored as received
        assert_eq!(sm.token().as_deref(), Some(t.as_str()));
    }
}

#[test]
fn expired_token_is_stored_but_not_authenticated() {
    let sm = SessionManager::in_memory();
    let t = dev_token("admin", Role::Administrator, common::past_exp());
    sm.set_token(&t);
    assert!(!sm.is_authenticated());
    assert_eq!(sm.token().as_deref(), Some(t.as_str()));
    assert!(sm.current_user().is_none());
    assert!(!sm.is_admin());
}

#[test]
fn expiry_boundary_is_strict() {
    let sm = SessionManager::in_memory();
    sm.set_token(&dev_token("a", Role::Applicant, chrono::Utc::now().timestamp()));
    assert!(!sm.is_authenticated());
}

#[test]
fn set_token_publishes_decoded_identity_idempotently() {
    let sm = SessionManager::in_memory();
    let t = dev_token("ana", Role::Applicant, common::future_exp());
    sm.set_token(&t);
    let first = sm.current_user();
    assert_eq!(first, Some(identity("ana", Role::Applicant)));
    sm.set_token(&t);
    assert_eq!(sm.current_user(), first);
    assert!(sm.is_authenticated());
    assert!(sm.is_applicant());
    assert!(!sm.is_admin());
}

#[test]
fn relogin_replaces_previous_token() {
    let sm = SessionManager::in_memory();
    sm.set_token(&dev_token("ana", Role::Applicant, common::future_exp()));
    let admin = dev_token("admin", Role::Administrator, common::future_exp());
    sm.set_token(&admin);
    assert_eq!(sm.token().as_deref(), Some(admin.as_str()));
    assert!(sm.is_admin());
    assert!(!sm.is_applicant());
}

#[test]
fn logout_clears_slot_and_notifies_subscribers() {
    let sm = SessionManager::in_memory();
    sm.set_token(&dev_token("admin", Role::Administrator, common::future_exp()));
    let mut sub = sm.subscribe();
    assert_eq!(sub.try_next(), Some(Some(identity("admin", Role::Administrator))));

    sm.logout();
    assert_eq!(sm.token(), None);
    assert_eq!(sub.try_next(), Some(None));
    assert!(sm.current_user().is_none());
    assert!(!sm.is_authenticated());
}

#[test]
fn late_subscriber_gets_current_identity_immediately() {
    let sm = SessionManager::in_memory();
    let mut early = sm.subscribe();
    sm.set_token(&dev_token("marko", Role::Applicant, common::future_exp()));

    let mut late = sm.subscribe();
    assert_eq!(late.try_next(), Some(Some(identity("marko", Role::Applicant))));
    assert_eq!(late.try_next(), None);

    // the early one saw the anonymous start and then the login
    assert_eq!(early.drain(), vec![None, Some(identity("marko", Role::Applicant))]);
}

#[test]
fn subscribers_observe_publications_in_call_order() {
    let sm = SessionManager::in_memory();
    let mut a = sm.subscribe();
    let mut b = sm.subscribe();
    let ana = dev_token("ana", Role::Applicant, common::future_exp());
    let admin = dev_token("admin", Role::Administrator, common::future_exp());

    sm.set_token(&ana);
    sm.set_token(&admin);
    sm.logout();
    sm.set_token("broken");
    sm.set_token(&ana);

    let expected = vec![
        None,
        Some(identity("ana", Role::Applicant)),
        Some(identity("admin", Role::Administrator)),
        None,
        None,
        Some(identity("ana", Role::Applicant)),
    ];
    assert_eq!(a.drain(), expected);
    assert_eq!(b.drain(), expected);
}

#[tokio::test]
async fn subscription_can_be_awaited() -> Result<()> {
    let sm = Arc::new(SessionManager::in_memory());
    let mut sub = sm.subscribe();
    assert_eq!(sub.next().await, Some(None));

    let sm2 = sm.clone();
    tokio::spawn(async move {
        sm2.set_token(&dev_token("ivo", Role::Applicant, common::future_exp()));
    });
    let got = tokio::time::timeout(Duration::from_secs(5), sub.next()).await?;
    assert_eq!(got, Some(Some(identity("ivo", Role::Applicant))));
    Ok(())
}

#[test]
fn file_slot_restores_session_across_managers() -> Result<()> {
    let dir = tempdir()?;
    let store = Arc::new(FileTokenStore::new(dir.path()));
    let t = dev_token("admin", Role::Administrator, common::future_exp());
    {
        let sm = SessionManager::new(store.clone());
        sm.set_token(&t);
    }
    let restored = SessionManager::new(Arc::new(FileTokenStore::new(dir.path())));
    assert_eq!(restored.current_user(), Some(identity("admin", Role::Administrator)));
    assert!(restored.is_admin());

    restored.logout();
    assert_eq!(store.load(), None);
    assert!(!dir.path().join("token").exists());
    Ok(())
}

#[test]
fn role_predicates_recheck_expiry() {
    let sm = SessionManager::in_memory();
    sm.set_token(&dev_token("admin", Role::Administrator, chrono::Utc::now().timestamp() + 2));
    assert!(sm.is_admin());
    std::thread::sleep(Duration::from_millis(3100));
    // identity was published, but the claims behind it have run out
    assert!(sm.current_user().is_some());
    assert!(!sm.is_admin());
    assert!(!sm.is_authenticated());
}

#[test]
fn both_slots_hand_back_the_same_token() -> Result<()> {
    let dir = tempdir()?;
    let stores: Vec<Arc<dyn TokenStore>> = vec![
        Arc::new(MemoryTokenStore::new()),
        Arc::new(FileTokenStore::new(dir.path())),
    ];
    for store in stores {
        let sm = SessionManager::new(store.clone());
        sm.set_token(" a.b.c\n");
        assert_eq!(sm.token().as_deref(), Some("a.b.c"));
        assert_eq!(store.load().as_deref(), Some("a.b.c"));

        sm.set_token("   ");
        assert_eq!(sm.token(), None);
        assert!(!sm.has_token());
    }

    // a slot written by something else is read back the same way
    let raw = MemoryTokenStore::with_token("  x.y.z  ");
    assert_eq!(raw.load().as_deref(), Some("x.y.z"));
    Ok(())
}
