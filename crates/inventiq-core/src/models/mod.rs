//! Data models for InventIQ entities.
//!
//! This module contains the data structures exchanged with the backend:
//!
//! - `User`, `Role`: The authenticated identity
//! - `Product`, `ProductDraft`, `ProductUpdate`: Inventory records
//! - `Transaction`: Stock movements
//! - `DemandForecast`, `RestockRecommendation`, insights types: Predictions
//! - `InventorySummary`: Dashboard metrics derived from the product list

pub mod prediction;
pub mod product;
pub mod user;

use serde::{Deserialize, Serialize};

pub use prediction::{DemandForecast, InsightsRequest, InsightsResponse, RestockRecommendation};
pub use product::{
    InventorySummary, Product, ProductDraft, ProductUpdate, StockStatus, Transaction,
    TransactionType,
};
pub use user::{LoginRequest, LoginResponse, RegisterRequest, Role, User};

/// Generic `{ "message": ... }` reply used by register, delete and transaction calls.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acknowledgement {
    #[serde(default)]
    pub message: Option<String>,
}
