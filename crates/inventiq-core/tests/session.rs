//! Session store behaviour against the mock backend.

mod common;

use std::sync::Arc;

use anyhow::bail;
use common::{MockBackend, EMAIL, PASSWORD, SILENT_EMAIL, SLOW_EMAIL, SLOW_TOKEN, TOKEN, VERBOSE_EMAIL};
use inventiq_core::auth::{FileStorage, KeyValueStore, MemoryStorage, TOKEN_KEY, USER_KEY};
use inventiq_core::models::{Role, User};
use inventiq_core::{ApiClient, AuthError, SessionStore};

/// Reads succeed with nothing stored; every write fails.
struct ReadOnlyStorage;

impl KeyValueStore for ReadOnlyStorage {
    fn get(&self, _key: &str) -> anyhow::Result<Option<String>> {
        Ok(None)
    }

    fn set_many(&self, _entries: &[(&str, &str)]) -> anyhow::Result<()> {
        bail!("disk is read-only")
    }

    fn remove_many(&self, _keys: &[&str]) -> anyhow::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn login_success_authenticates_and_persists() {
    let backend = MockBackend::start().await;
    let storage = Arc::new(MemoryStorage::new());
    let session = backend.session(storage.clone());
    assert!(!session.is_authenticated());

    let user = session.login(EMAIL, PASSWORD).await.expect("login succeeds");

    assert_eq!(user.username, "bob");
    assert_eq!(user.role, Role::Staff);
    assert!(session.is_authenticated());
    assert_eq!(session.identity().map(|u| u.username), Some("bob".to_string()));
    assert!(!session.is_pending());
    assert_eq!(session.last_error(), None);

    assert_eq!(storage.get(TOKEN_KEY).unwrap().as_deref(), Some(TOKEN));
    let stored: User = serde_json::from_str(&storage.get(USER_KEY).unwrap().unwrap()).unwrap();
    assert_eq!(stored, user);

    // The email goes out in the username field
    let request = backend.last_request();
    assert_eq!(request.path, "/auth/login");
    assert_eq!(request.body["username"], EMAIL);
    assert_eq!(request.body["password"], PASSWORD);
}

#[tokio::test]
async fn login_rejected_leaves_session_anonymous() {
    let backend = MockBackend::start().await;
    let storage = Arc::new(MemoryStorage::new());
    let session = backend.session(storage.clone());

    let err = session.login(EMAIL, "wrong").await.unwrap_err();

    assert!(matches!(err, AuthError::Login { .. }));
    assert!(err.api_error().is_some_and(|e| e.is_unauthorized()));
    assert!(!session.is_authenticated());
    assert_eq!(session.last_error().as_deref(), Some("Invalid credentials!"));
    assert!(!session.is_pending());
    assert!(storage.is_empty());
}

#[tokio::test]
async fn login_rejected_without_message_uses_generic_error() {
    let backend = MockBackend::start().await;
    let session = backend.session(Arc::new(MemoryStorage::new()));

    let err = session.login(SILENT_EMAIL, PASSWORD).await.unwrap_err();

    assert_eq!(err.user_message(), "Login failed");
    assert_eq!(session.last_error().as_deref(), Some("Login failed"));
}

#[tokio::test]
async fn login_rejected_with_long_body_keeps_backend_message() {
    let backend = MockBackend::start().await;
    let session = backend.session(Arc::new(MemoryStorage::new()));

    let err = session.login(VERBOSE_EMAIL, PASSWORD).await.unwrap_err();

    assert_eq!(err.user_message(), "Invalid credentials!");
    assert_eq!(session.last_error().as_deref(), Some("Invalid credentials!"));
}

#[tokio::test]
async fn login_recovers_from_corrupt_storage_file() {
    let backend = MockBackend::start().await;
    let dir = tempfile::tempdir().unwrap();
    let storage = Arc::new(FileStorage::in_dir(dir.path()));
    std::fs::write(storage.path(), r#"{"token": "ab"#).unwrap();

    let session = backend.session(storage.clone());
    assert!(!session.is_authenticated());

    session.login(EMAIL, PASSWORD).await.expect("login succeeds");

    assert_eq!(backend.request_count(), 1);
    assert_eq!(backend.last_request().authorization, None);
    assert!(session.is_authenticated());
    assert_eq!(storage.get(TOKEN_KEY).unwrap().as_deref(), Some(TOKEN));
}

#[tokio::test]
async fn login_that_cannot_be_saved_stays_signed_out() {
    let backend = MockBackend::start().await;
    let storage: Arc<dyn KeyValueStore> = Arc::new(ReadOnlyStorage);
    let session = backend.session(storage);

    let err = session.login(EMAIL, PASSWORD).await.unwrap_err();

    assert!(matches!(err, AuthError::Storage(_)));
    assert!(!session.is_authenticated());
    assert_eq!(session.identity(), None);
    assert_eq!(session.snapshot().credential(), None);
    assert!(!session.is_pending());
    assert_eq!(session.last_error(), Some(err.user_message()));
    assert_eq!(backend.request_count(), 1);
}

#[tokio::test]
async fn login_failure_keeps_previous_session() {
    let backend = MockBackend::start().await;
    let storage = Arc::new(MemoryStorage::new());
    let session = backend.session(storage.clone());
    session.login(EMAIL, PASSWORD).await.unwrap();

    assert!(session.login(EMAIL, "wrong").await.is_err());

    assert!(session.is_authenticated());
    assert_eq!(session.snapshot().credential(), Some(TOKEN));
    assert_eq!(storage.get(TOKEN_KEY).unwrap().as_deref(), Some(TOKEN));
    assert!(session.last_error().is_some());
}

#[tokio::test]
async fn new_login_attempt_clears_last_error() {
    let backend = MockBackend::start().await;
    let session = backend.session(Arc::new(MemoryStorage::new()));

    session.login(EMAIL, "wrong").await.unwrap_err();
    assert!(session.last_error().is_some());

    session.login(EMAIL, PASSWORD).await.unwrap();
    assert_eq!(session.last_error(), None);
}

#[tokio::test]
async fn login_unreachable_backend_reports_error() {
    // Port 9 (discard) is not listening on the test machine
    let storage = Arc::new(MemoryStorage::new());
    let api = ApiClient::new("http://127.0.0.1:9/api", storage.clone()).unwrap();
    let session = SessionStore::restore(storage.clone(), api);

    let err = session.login(EMAIL, PASSWORD).await.unwrap_err();

    assert!(matches!(err, AuthError::Login { .. }));
    assert!(!session.is_authenticated());
    assert!(!session.last_error().unwrap_or_default().is_empty());
    assert!(storage.is_empty());
}

#[tokio::test]
async fn register_never_changes_session() {
    let backend = MockBackend::start().await;
    let storage = Arc::new(MemoryStorage::new());
    let session = backend.session(storage.clone());

    session.register("alice", "a@x.com", "secret").await.expect("registered");
    assert!(!session.is_authenticated());
    assert!(storage.is_empty());

    let request = backend.last_request();
    assert_eq!(request.path, "/auth/register");
    assert_eq!(request.body["username"], "alice");
    assert_eq!(request.body["email"], "a@x.com");
    assert_eq!(request.body["password"], "secret");

    let err = session.register("taken", "t@x.com", "secret").await.unwrap_err();
    assert!(matches!(err, AuthError::Registration { .. }));
    assert_eq!(err.user_message(), "Username already exists!");
    assert!(!session.is_authenticated());
    assert_eq!(session.last_error(), None);
}

#[tokio::test]
async fn register_while_logged_in_keeps_session() {
    let backend = MockBackend::start().await;
    let storage = Arc::new(MemoryStorage::new());
    let session = backend.session(storage.clone());
    session.login(EMAIL, PASSWORD).await.unwrap();
    let before = session.snapshot();

    session.register("alice", "a@x.com", "secret").await.unwrap();
    let _ = session.register("taken", "t@x.com", "secret").await;

    assert_eq!(session.snapshot(), before);
    assert_eq!(storage.get(TOKEN_KEY).unwrap().as_deref(), Some(TOKEN));
}

#[tokio::test]
async fn logout_after_login_clears_everything() {
    let backend = MockBackend::start().await;
    let storage = Arc::new(MemoryStorage::new());
    let session = backend.session(storage.clone());
    session.login(EMAIL, PASSWORD).await.unwrap();

    session.logout();

    assert!(!session.is_authenticated());
    assert_eq!(session.identity(), None);
    assert_eq!(storage.get(TOKEN_KEY).unwrap(), None);
    assert_eq!(storage.get(USER_KEY).unwrap(), None);
}

#[tokio::test]
async fn restored_session_makes_no_network_call() {
    let backend = MockBackend::start().await;
    let storage = Arc::new(MemoryStorage::new());
    common::seed_session(&storage, TOKEN);

    let session = backend.session(storage);

    assert!(session.is_authenticated());
    assert_eq!(session.identity().unwrap().email, EMAIL);
    assert_eq!(backend.request_count(), 0);
}

#[tokio::test]
async fn subscribers_see_pending_then_result() {
    let backend = MockBackend::start().await;
    let session = backend.session(Arc::new(MemoryStorage::new()));
    let mut rx = session.subscribe();

    let watcher = async {
        rx.changed().await.unwrap();
        let pending = rx.borrow_and_update().is_pending();
        rx.changed().await.unwrap();
        let done = rx.borrow_and_update().clone();
        (pending, done)
    };
    let (login, (pending, done)) = tokio::join!(session.login(EMAIL, PASSWORD), watcher);

    login.unwrap();
    assert!(pending);
    assert!(done.is_authenticated());
    assert!(!done.is_pending());
}

#[tokio::test]
async fn late_login_after_logout_signs_back_in() {
    let backend = MockBackend::start().await;
    let storage = Arc::new(MemoryStorage::new());
    let session = backend.session(storage.clone());

    let logout_midway = async {
        tokio::time::sleep(common::SLOW_DELAY / 4).await;
        assert!(session.is_pending());
        session.logout();
        assert!(!session.is_authenticated());
    };
    let (login, ()) = tokio::join!(session.login(SLOW_EMAIL, PASSWORD), logout_midway);

    // No cancellation: the response that lands last wins
    login.unwrap();
    assert!(session.is_authenticated());
    assert_eq!(storage.get(TOKEN_KEY).unwrap().as_deref(), Some(SLOW_TOKEN));
}
