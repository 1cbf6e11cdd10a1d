//! InventIQ client core.
//!
//! The pieces every front end shares: the `ApiClient` gateway to the backend,
//! the `SessionStore` that owns who is logged in, the data models, and the
//! voice-assistant controller.

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod voice;

pub use api::{ApiClient, ApiError};
pub use auth::{AuthError, SessionState, SessionStore};
pub use config::Config;
