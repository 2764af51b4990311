use crate::domain::market::NewsArticle;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorPerformance {
    pub sector_name: String,
    pub performance_percent: f64,
    /// The text as received, e.g. `"+2.5%"`.
    pub performance_text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub fund_name: String,
    pub description: String,
    pub risk_level: RiskLevel,
    pub expected_return_range: String,
    pub minimum_investment: f64,
    pub sector: String,
}

impl Recommendation {
    pub fn is_affordable(&self, balance: f64) -> bool {
        self.minimum_investment <= balance
    }
}

/// One ranked sector with the suggestions that survived the affordability filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorRecommendations {
    pub sector: SectorPerformance,
    pub recommendations: Vec<Recommendation>,
    pub news: Vec<NewsArticle>,
}

impl SectorRecommendations {
    pub fn is_empty(&self) -> bool {
        self.recommendations.is_empty()
    }
}
