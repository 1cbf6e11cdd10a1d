//! REST API client module for the InventIQ backend.
//!
//! This module provides the `ApiClient` through which every call to the
//! backend flows: authentication, inventory CRUD, and prediction queries.
//!
//! The backend expects the raw token issued at login in the
//! `Authorization` header, with no scheme prefix.

pub mod client;
pub mod error;

pub use client::{ApiClient, DEFAULT_API_URL, DEFAULT_FORECAST_DAYS};
pub use error::ApiError;
