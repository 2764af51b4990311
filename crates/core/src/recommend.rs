//! Sector ranking and affordability-filtered fund suggestions.
//!
//! Sector performance rows are parsed, risk-banded and sorted best first; the
//! top [`MAX_SECTORS`] each get one synthesized fund. When the performance feed
//! is unavailable the fixed [`FALLBACK_SECTORS`] are served instead.

use crate::domain::market::{NewsArticle, SectorPerformanceTable};
use crate::domain::recommendation::{
    Recommendation, RiskLevel, SectorPerformance, SectorRecommendations,
};
use crate::market::{with_deadline, MarketDataClient};
use std::cmp::Ordering;
use std::time::Duration;

pub const MAX_SECTORS: usize = 4;
pub const MAX_NEWS_PER_SECTOR: usize = 2;
pub const BASELINE_MINIMUM_INVESTMENT: f64 = 10_000.0;

const HIGH_RISK_ABOVE_PERCENT: f64 = 5.0;
const LOW_RISK_BELOW_PERCENT: f64 = -2.0;

/// Non-sector keys that can appear beside the performance rows.
const METADATA_KEYS: [&str; 3] = ["Information", "Last Refreshed", "Meta Data"];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FallbackSector {
    pub name: &'static str,
    pub market_performance: &'static str,
    pub fund_name: &'static str,
    pub description: &'static str,
    pub risk_level: RiskLevel,
    pub expected_return_range: &'static str,
    pub minimum_investment: f64,
    pub fund_sector: &'static str,
}

/// Served when live sector performance cannot be used.
pub const FALLBACK_SECTORS: [FallbackSector; 3] = [
    FallbackSector {
        name: "Technology",
        market_performance: "+2.5%",
        fund_name: "Tech Growth Fund",
        description: "Focuses on emerging tech companies",
        risk_level: RiskLevel::High,
        expected_return_range: "15-20%",
        minimum_investment: 10_000.0,
        fund_sector: "Technology",
    },
    FallbackSector {
        name: "Healthcare",
        market_performance: "+1.8%",
        fund_name: "Healthcare Innovation Fund",
        description: "Biotech and medical technology",
        risk_level: RiskLevel::Medium,
        expected_return_range: "10-14%",
        minimum_investment: 8_000.0,
        fund_sector: "Healthcare",
    },
    FallbackSector {
        name: "Renewable Energy",
        market_performance: "+3.2%",
        fund_name: "Green Energy Fund",
        description: "Solar and wind energy companies",
        risk_level: RiskLevel::Medium,
        expected_return_range: "12-16%",
        minimum_investment: 7_000.0,
        fund_sector: "Energy",
    },
];

#[derive(Debug, Clone, PartialEq)]
pub struct RankingOutcome {
    pub sectors: Vec<SectorRecommendations>,
    /// True when [`FALLBACK_SECTORS`] were served.
    pub used_fallback: bool,
}

impl RankingOutcome {
    pub fn has_recommendations(&self) -> bool {
        self.sectors.iter().any(|s| !s.is_empty())
    }
}

pub fn fallback_recommendations() -> Vec<SectorRecommendations> {
    FALLBACK_SECTORS
        .iter()
        .map(|f| SectorRecommendations {
            sector: SectorPerformance {
                sector_name: f.name.to_string(),
                performance_percent: crate::market::wire::parse_decimal(f.market_performance)
                    .unwrap_or(0.0),
                performance_text: f.market_performance.to_string(),
            },
            recommendations: vec![Recommendation {
                fund_name: f.fund_name.to_string(),
                description: f.description.to_string(),
                risk_level: f.risk_level,
                expected_return_range: f.expected_return_range.to_string(),
                minimum_investment: f.minimum_investment,
                sector: f.fund_sector.to_string(),
            }],
            news: Vec::new(),
        })
        .collect()
}

/// Parses one performance cell; `None` for metadata keys and non-percentages.
pub fn parse_sector_row(key: &str, value: &str) -> Option<SectorPerformance> {
    if METADATA_KEYS.contains(&key.trim()) || !value.contains('%') {
        return None;
    }
    let performance_percent = crate::market::wire::parse_decimal(value)?;

    Some(SectorPerformance {
        sector_name: normalize_sector_name(key),
        performance_percent,
        performance_text: value.trim().to_string(),
    })
}

/// `"consumer_discretionary"` -> `"Consumer Discretionary"`.
pub fn normalize_sector_name(key: &str) -> String {
    key.split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .filter(|t| !t.is_empty())
        .map(title_case)
        .collect::<Vec<_>>()
        .join(" ")
}

fn title_case(token: &str) -> String {
    let mut chars = token.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

pub fn risk_band(performance_percent: f64) -> (RiskLevel, &'static str) {
    if performance_percent > HIGH_RISK_ABOVE_PERCENT {
        (RiskLevel::High, "15-20%")
    } else if performance_percent < LOW_RISK_BELOW_PERCENT {
        (RiskLevel::Low, "5-8%")
    } else {
        (RiskLevel::Medium, "8-12%")
    }
}

pub fn synthesize_recommendation(sector: &SectorPerformance) -> Recommendation {
    let (risk_level, expected_return) = risk_band(sector.performance_percent);
    Recommendation {
        fund_name: format!("{} Growth Fund", sector.sector_name),
        description: format!("Focuses on {} companies", sector.sector_name.to_lowercase()),
        risk_level,
        expected_return_range: expected_return.to_string(),
        minimum_investment: BASELINE_MINIMUM_INVESTMENT,
        sector: sector.sector_name.clone(),
    }
}

/// Top sectors by performance, best first; ties keep payload order.
pub fn rank_sectors(table: &SectorPerformanceTable) -> Vec<SectorRecommendations> {
    let mut sectors: Vec<SectorPerformance> = table
        .iter()
        .filter_map(|(k, v)| parse_sector_row(k, v))
        .collect();

    // `sort_by` is stable; -0.0 and 0.0 compare equal here.
    sectors.sort_by(|a, b| {
        b.performance_percent
            .partial_cmp(&a.performance_percent)
            .unwrap_or(Ordering::Equal)
    });
    sectors.truncate(MAX_SECTORS);

    sectors
        .into_iter()
        .map(|sector| SectorRecommendations {
            recommendations: vec![synthesize_recommendation(&sector)],
            sector,
            news: Vec::new(),
        })
        .collect()
}

pub fn filter_affordable(sectors: &mut [SectorRecommendations], balance: f64) {
    for sector in sectors {
        sector.recommendations.retain(|r| r.is_affordable(balance));
    }
}

pub fn attach_news(sectors: &mut [SectorRecommendations], news: &[NewsArticle]) {
    for sector in sectors {
        let needle = sector.sector.sector_name.to_lowercase();
        sector.news = news
            .iter()
            .filter(|a| a.title.to_lowercase().contains(&needle))
            .take(MAX_NEWS_PER_SECTOR)
            .cloned()
            .collect();
    }
}

pub struct SectorRanker<'a> {
    client: &'a dyn MarketDataClient,
    deadline: Duration,
    news_query: String,
}

impl<'a> SectorRanker<'a> {
    pub fn new(client: &'a dyn MarketDataClient, deadline: Duration, news_query: &str) -> Self {
        Self {
            client,
            deadline,
            news_query: news_query.to_string(),
        }
    }

    /// Never fails: feed problems degrade to [`FALLBACK_SECTORS`], news problems to no news.
    pub async fn recommend(&self, balance: f64) -> RankingOutcome {
        let provider = self.client.provider_name();
        let table = with_deadline(provider, self.deadline, self.client.fetch_sector_performance())
            .await;

        let mut sectors = match table {
            Ok(table) => rank_sectors(&table),
            Err(err) => {
                tracing::warn!(error = %err, "sector performance unavailable; serving fallback sectors");
                return fallback_outcome();
            }
        };

        if sectors.is_empty() {
            tracing::warn!("sector performance had no usable rows; serving fallback sectors");
            return fallback_outcome();
        }

        match with_deadline(provider, self.deadline, self.client.fetch_news(&self.news_query)).await
        {
            Ok(news) => attach_news(&mut sectors, &news),
            Err(err) => tracing::warn!(error = %err, "sector news unavailable; continuing without"),
        }

        filter_affordable(&mut sectors, balance);

        tracing::info!(
            sector_count = sectors.len(),
            affordable = sectors.iter().filter(|s| !s.is_empty()).count(),
            balance,
            "ranked sector recommendations"
        );

        RankingOutcome {
            sectors,
            used_fallback: false,
        }
    }
}

fn fallback_outcome() -> RankingOutcome {
    RankingOutcome {
        sectors: fallback_recommendations(),
        used_fallback: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{article, sectors, StubMarketData};

    fn ranker(stub: &StubMarketData) -> SectorRanker<'_> {
        SectorRanker::new(stub, Duration::from_secs(1), "finance")
    }

    #[test]
    fn risk_bands_follow_thresholds() {
        assert_eq!(risk_band(6.0), (RiskLevel::High, "15-20%"));
        assert_eq!(risk_band(-3.0), (RiskLevel::Low, "5-8%"));
        assert_eq!(risk_band(0.0), (RiskLevel::Medium, "8-12%"));
        assert_eq!(risk_band(5.0), (RiskLevel::Medium, "8-12%"));
        assert_eq!(risk_band(-2.0), (RiskLevel::Medium, "8-12%"));
    }

    #[test]
    fn normalizes_sector_keys() {
        assert_eq!(normalize_sector_name("consumer_discretionary"), "Consumer Discretionary");
        assert_eq!(normalize_sector_name("Information Technology"), "Information Technology");
        assert_eq!(normalize_sector_name("REAL_ESTATE"), "Real Estate");
    }

    #[test]
    fn skips_metadata_and_unparsable_rows() {
        assert!(parse_sector_row("Last Refreshed", "2024-01-05 16:00%").is_none());
        assert!(parse_sector_row("Information", "US Sector Performance").is_none());
        assert!(parse_sector_row("Meta Data", "1.0%").is_none());
        assert!(parse_sector_row("Energy", "1.2").is_none());
        assert!(parse_sector_row("Energy", "abc%").is_none());

        let row = parse_sector_row("energy", "-0.75%").unwrap();
        assert_eq!(row.sector_name, "Energy");
        assert_eq!(row.performance_percent, -0.75);
    }

    #[test]
    fn ranks_descending_stable_and_truncates() {
        let table = sectors(&[
            ("Utilities", "1.00%"),
            ("Energy", "6.00%"),
            ("Financials", "1.00%"),
            ("Materials", "-3.00%"),
            ("Industrials", "2.00%"),
            ("Last Refreshed", "2024-01-05"),
        ]);
        let ranked = rank_sectors(&table);
        let names: Vec<&str> = ranked.iter().map(|s| s.sector.sector_name.as_str()).collect();
        assert_eq!(names, vec!["Energy", "Industrials", "Utilities", "Financials"]);

        let energy = &ranked[0].recommendations[0];
        assert_eq!(energy.fund_name, "Energy Growth Fund");
        assert_eq!(energy.description, "Focuses on energy companies");
        assert_eq!(energy.risk_level, RiskLevel::High);
        assert_eq!(energy.minimum_investment, BASELINE_MINIMUM_INVESTMENT);
    }

    #[test]
    fn keeps_sectors_whose_names_start_like_metadata() {
        let ranked = rank_sectors(&sectors(&[
            ("Information", "US Sector Performance (realtime & historical)"),
            ("Information Technology", "7.00%"),
            ("Energy", "1.00%"),
        ]));
        let names: Vec<&str> = ranked.iter().map(|s| s.sector.sector_name.as_str()).collect();
        assert_eq!(names, vec!["Information Technology", "Energy"]);
        assert_eq!(ranked[0].recommendations[0].risk_level, RiskLevel::High);
    }

    #[test]
    fn signed_zero_ties_keep_payload_order() {
        let ranked = rank_sectors(&sectors(&[
            ("Utilities", "-0.00%"),
            ("Energy", "0.00%"),
            ("Financials", "-0.00%"),
        ]));
        let names: Vec<&str> = ranked.iter().map(|s| s.sector.sector_name.as_str()).collect();
        assert_eq!(names, vec!["Utilities", "Energy", "Financials"]);
    }

    #[test]
    fn affordability_boundary_is_inclusive() {
        let table = sectors(&[("Energy", "1.00%")]);

        let mut below = rank_sectors(&table);
        filter_affordable(&mut below, 9_999.0);
        assert_eq!(below.len(), 1);
        assert!(below[0].is_empty());

        let mut exact = rank_sectors(&table);
        filter_affordable(&mut exact, 10_000.0);
        assert_eq!(exact[0].recommendations.len(), 1);
    }

    #[test]
    fn news_matches_sector_name_case_insensitively() {
        let mut ranked = rank_sectors(&sectors(&[("Energy", "1.00%"), ("Utilities", "0.50%")]));
        let news = vec![
            article("ENERGY prices climb", "Reuters"),
            article("Bank earnings beat", "Bloomberg"),
            article("Why energy matters", "FT"),
            article("Energy transition stalls", "WSJ"),
        ];
        attach_news(&mut ranked, &news);
        assert_eq!(ranked[0].news.len(), 2);
        assert_eq!(ranked[0].news[0].source_name, "Reuters");
        assert!(ranked[1].news.is_empty());
    }

    #[test]
    fn fallback_figures_are_fixed() {
        let fallback = fallback_recommendations();
        assert_eq!(fallback.len(), 3);
        for (rec, fixture) in fallback.iter().zip(FALLBACK_SECTORS.iter()) {
            assert_eq!(rec.sector.sector_name, fixture.name);
            assert_eq!(rec.sector.performance_text, fixture.market_performance);
            assert_eq!(rec.recommendations[0].minimum_investment, fixture.minimum_investment);
        }
        assert_eq!(fallback[2].recommendations[0].sector, "Energy");
    }

    #[tokio::test]
    async fn feed_failure_serves_fallback() {
        let stub = StubMarketData::new();
        let outcome = ranker(&stub).recommend(0.0).await;
        assert!(outcome.used_fallback);
        assert_eq!(outcome.sectors, fallback_recommendations());
        assert!(outcome.has_recommendations());
    }

    #[tokio::test]
    async fn feed_without_usable_rows_serves_fallback() {
        let stub = StubMarketData {
            sectors: Some(sectors(&[("Last Refreshed", "2024-01-05")])),
            ..Default::default()
        };
        let outcome = ranker(&stub).recommend(50_000.0).await;
        assert!(outcome.used_fallback);
    }

    #[tokio::test]
    async fn live_ranking_survives_missing_news() {
        let stub = StubMarketData {
            sectors: Some(sectors(&[("Energy", "6.00%"), ("Utilities", "-3.00%")])),
            ..Default::default()
        };
        let outcome = ranker(&stub).recommend(20_000.0).await;
        assert!(!outcome.used_fallback);
        assert_eq!(outcome.sectors.len(), 2);
        assert!(outcome.sectors.iter().all(|s| s.news.is_empty()));
        assert!(outcome.has_recommendations());

        let poor = ranker(&stub).recommend(100.0).await;
        assert!(!poor.has_recommendations());
        assert_eq!(poor.sectors.len(), 2);
    }
}
