//! Authentication module for managing the user session.
//!
//! This module provides:
//! - `SessionStore`: Login/register/logout and the observable session state
//! - `KeyValueStore`: Durable storage for the `token` and `user` keys,
//!   shared with the API client
//! - `CredentialStore`: Remembered passwords via the OS keychain
//!
//! Sessions survive restarts and are trusted on load; the backend decides
//! whether a stored token is still good.

pub mod credentials;
pub mod error;
pub mod session;
pub mod storage;

pub use credentials::CredentialStore;
pub use error::AuthError;
pub use session::{SessionState, SessionStore};
pub use storage::{FileStorage, KeyValueStore, MemoryStorage, TOKEN_KEY, USER_KEY};
