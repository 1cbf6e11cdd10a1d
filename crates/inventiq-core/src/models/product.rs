//! Inventory models and the dashboard summary derived from them.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockStatus {
    InStock,
    LowStock,
    OutOfStock,
}

impl std::fmt::Display for StockStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StockStatus::InStock => write!(f, "In Stock"),
            StockStatus::LowStock => write!(f, "Low Stock"),
            StockStatus::OutOfStock => write!(f, "Out of Stock"),
        }
    }
}

// Note: the backend has served ids both as strings and as integers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub supplier: String,
    #[serde(default)]
    pub current_stock: i64,
    #[serde(default)]
    pub reorder_level: i64,
    #[serde(default)]
    pub purchase_price: f64,
    #[serde(default)]
    pub selling_price: f64,
    /// Supplier lead time in days
    #[serde(default)]
    pub lead_time: i64,
    /// Units sold keyed by date (YYYY-MM-DD)
    #[serde(default)]
    pub historical_sales: BTreeMap<String, i64>,
}

impl Product {
    pub fn stock_status(&self) -> StockStatus {
        if self.current_stock == 0 {
            StockStatus::OutOfStock
        } else if self.current_stock <= self.reorder_level {
            StockStatus::LowStock
        } else {
            StockStatus::InStock
        }
    }

    /// True for anything at or below its reorder level, including out of stock.
    pub fn needs_reorder(&self) -> bool {
        self.current_stock <= self.reorder_level
    }

    pub fn margin(&self) -> f64 {
        self.selling_price - self.purchase_price
    }

    pub fn total_units_sold(&self) -> i64 {
        self.historical_sales.values().sum()
    }
}

/// Fields for `POST /inventory/`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProductDraft {
    pub name: String,
    pub category: String,
    pub supplier: String,
    pub current_stock: i64,
    pub reorder_level: i64,
    pub purchase_price: f64,
    pub selling_price: f64,
    pub lead_time: i64,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub historical_sales: BTreeMap<String, i64>,
}

/// Partial update for `PUT /inventory/{id}`; unset fields are left out of the body.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProductUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supplier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_stock: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reorder_level: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purchase_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selling_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lead_time: Option<i64>,
}

impl ProductUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Sale,
    Purchase,
}

/// Body of `POST /inventory/transaction`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub product_id: String,
    pub quantity: i64,
    pub transaction_type: TransactionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Transaction {
    pub fn new(product_id: impl Into<String>, quantity: i64, transaction_type: TransactionType) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
            transaction_type,
            timestamp: Some(Utc::now()),
            notes: None,
        }
    }
}

/// Headline numbers shown on the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InventorySummary {
    pub total_products: usize,
    pub low_stock: Vec<Product>,
    pub out_of_stock: Vec<Product>,
    pub categories: BTreeMap<String, usize>,
}

impl InventorySummary {
    pub fn from_products(products: &[Product]) -> Self {
        let mut categories = BTreeMap::new();
        for product in products {
            *categories.entry(product.category.clone()).or_insert(0) += 1;
        }

        Self {
            total_products: products.len(),
            low_stock: products.iter().filter(|p| p.needs_reorder()).cloned().collect(),
            out_of_stock: products
                .iter()
                .filter(|p| p.current_stock == 0)
                .cloned()
                .collect(),
            categories,
        }
    }
}

// Helper to deserialize a string or integer id as String
fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de;

    struct IdVisitor;

    impl<'de> de::Visitor<'de> for IdVisitor {
        type Value = String;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("a string or integer id")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E> {
            Ok(v.to_string())
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E> {
            Ok(v.to_string())
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E> {
            Ok(v.to_string())
        }
    }

    deserializer.deserialize_any(IdVisitor)
}
