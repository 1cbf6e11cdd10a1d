use serde::{Deserialize, Serialize};

/// Daily unit forecasts from each model plus their rounded average.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DemandForecast {
    #[serde(default)]
    pub lstm: Vec<i64>,
    #[serde(default)]
    pub prophet: Vec<i64>,
    #[serde(default)]
    pub ensemble: Vec<i64>,
}

impl DemandForecast {
    pub fn total_demand(&self) -> i64 {
        self.ensemble.iter().sum()
    }

    pub fn days(&self) -> usize {
        self.ensemble.len()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestockRecommendation {
    pub predicted_demand: i64,
    pub safety_stock: i64,
    pub recommended_restock: i64,
}

impl RestockRecommendation {
    pub fn should_restock(&self) -> bool {
        self.recommended_restock > 0
    }
}

/// Body of `POST /predictions/insights`.
#[derive(Debug, Clone, Serialize)]
pub struct InsightsRequest<'a> {
    pub query: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_id: Option<&'a str>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InsightsResponse {
    pub insights: String,
}
