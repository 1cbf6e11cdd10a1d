use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::api::{ApiClient, ApiError};
use crate::models::{LoginResponse, User};

use super::storage::{KeyValueStore, TOKEN_KEY, USER_KEY};
use super::AuthError;

/// Shown when a failed login carries no message from the backend
const LOGIN_FAILED: &str = "Login failed";

/// Shown when a failed registration carries no message from the backend
const REGISTRATION_FAILED: &str = "Registration failed";

/// Who is logged in, as seen by the rest of the application.
///
/// Authentication status is derived from the credential and identity and is
/// never stored on its own.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    credential: Option<String>,
    identity: Option<User>,
    pending: bool,
    last_error: Option<String>,
}

impl SessionState {
    pub fn credential(&self) -> Option<&str> {
        self.credential.as_deref()
    }

    pub fn identity(&self) -> Option<&User> {
        self.identity.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.credential.is_some() && self.identity.is_some()
    }

    /// True while a login request is in flight
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Message from the most recent failed login
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}

/// Handle to the process-wide session.
///
/// The application root creates one with [`SessionStore::restore`] and hands
/// clones to everything that needs it; clones share the same state. Every
/// mutation is mirrored to the key/value storage before it becomes visible
/// in memory, and subscribers are notified through a watch channel.
#[derive(Clone)]
pub struct SessionStore {
    api: ApiClient,
    storage: Arc<dyn KeyValueStore>,
    state: Arc<watch::Sender<SessionState>>,
}

impl SessionStore {
    /// Rehydrate the session from storage. The stored credential is trusted
    /// as-is; nothing is checked against the backend.
    pub fn restore(storage: Arc<dyn KeyValueStore>, api: ApiClient) -> Self {
        let state = match Self::load(storage.as_ref()) {
            Ok(state) => state,
            Err(e) => {
                warn!(error = %e, "Failed to load stored session, starting signed out");
                SessionState::default()
            }
        };
        debug!(authenticated = state.is_authenticated(), "Session restored");

        let (tx, _rx) = watch::channel(state);
        Self {
            api,
            storage,
            state: Arc::new(tx),
        }
    }

    fn load(storage: &dyn KeyValueStore) -> Result<SessionState> {
        let credential = storage.get(TOKEN_KEY)?.filter(|t| !t.is_empty());
        let identity = match storage.get(USER_KEY)? {
            Some(json) => match serde_json::from_str::<User>(&json) {
                Ok(user) => Some(user),
                Err(e) => {
                    warn!(error = %e, "Stored user is not valid JSON, ignoring it");
                    None
                }
            },
            None => None,
        };

        Ok(SessionState {
            credential,
            identity,
            ..Default::default()
        })
    }

    /// Write token and user in a single storage operation
    fn persist(&self, login: &LoginResponse) -> Result<()> {
        let user_json = serde_json::to_string(&login.user).context("Failed to serialize user")?;
        self.storage
            .set_many(&[(TOKEN_KEY, login.token.as_str()), (USER_KEY, user_json.as_str())])
            .context("Failed to persist session")
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Receiver that observes every session change
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    pub fn identity(&self) -> Option<User> {
        self.state.borrow().identity.clone()
    }

    pub fn is_pending(&self) -> bool {
        self.state.borrow().pending
    }

    pub fn last_error(&self) -> Option<String> {
        self.state.borrow().last_error.clone()
    }

    /// Log in and, on success, store the credential and identity.
    ///
    /// Concurrent logins are not serialized: whichever response arrives last
    /// decides the session. A login that resolves after [`logout`](Self::logout)
    /// still signs the user in.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        self.state.send_modify(|s| {
            s.pending = true;
            s.last_error = None;
        });

        let response = match self.api.login(email, password).await {
            Ok(response) => response,
            Err(e) => {
                let message = login_failure_message(&e);
                error!(error = %e, "Login failed");
                self.state.send_modify(|s| {
                    s.pending = false;
                    s.last_error = Some(message.clone());
                });
                return Err(AuthError::Login { message, source: e });
            }
        };

        if let Err(e) = self.persist(&response) {
            error!(error = %e, "Failed to save session");
            let err = AuthError::Storage(e);
            let message = err.user_message();
            self.state.send_modify(|s| {
                s.pending = false;
                s.last_error = Some(message);
            });
            return Err(err);
        }

        let user = response.user.clone();
        self.state.send_modify(|s| {
            s.credential = Some(response.token);
            s.identity = Some(response.user);
            s.pending = false;
            s.last_error = None;
        });
        info!(user = %user.username, role = %user.role, "Login successful");
        Ok(user)
    }

    /// Create an account. Never signs the new user in and never touches the
    /// session, whatever the outcome; callers that want a signed-in user must
    /// call [`login`](Self::login) afterwards.
    pub async fn register(&self, username: &str, email: &str, password: &str) -> Result<(), AuthError> {
        match self.api.register(username, email, password, None).await {
            Ok(_) => {
                info!(username, "Registration successful");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Registration failed");
                let message = e.message().unwrap_or_else(|| REGISTRATION_FAILED.to_string());
                Err(AuthError::Registration { message, source: e })
            }
        }
    }

    /// Forget the credential and identity, in memory and in storage.
    /// Safe to call when nobody is logged in.
    pub fn logout(&self) {
        if let Err(e) = self.storage.remove_many(&[TOKEN_KEY, USER_KEY]) {
            warn!(error = %e, "Failed to clear stored session");
        }
        self.state.send_modify(|s| {
            s.credential = None;
            s.identity = None;
        });
        info!("Logged out");
    }
}

/// Prefer the backend's own message, then a hint based on the transport failure.
fn login_failure_message(err: &ApiError) -> String {
    if let Some(message) = err.message() {
        return message;
    }
    match err {
        ApiError::NetworkError(e) if e.is_timeout() => {
            "Connection timed out. Please try again.".to_string()
        }
        ApiError::NetworkError(e) if e.is_connect() => {
            "Unable to connect to server. Check your internet connection.".to_string()
        }
        _ => LOGIN_FAILED.to_string(),
    }
}
