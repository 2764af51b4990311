use crate::domain::market::PricePoint;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockPrediction {
    pub symbol: String,
    pub current_price: f64,
    pub predicted_price: f64,
    /// Inverse-volatility heuristic in [0, 100], not a probability.
    pub confidence_percent: f64,
    /// Chronological, oldest first.
    pub historical_series: Vec<PricePoint>,
}
