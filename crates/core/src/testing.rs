//! Offline stand-in for the market data collaborators.

use crate::domain::market::{NewsArticle, PricePoint, Quote, SectorPerformanceTable, TopMovers};
use crate::error::{FetchError, Result};
use crate::market::MarketDataClient;
use chrono::NaiveDate;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Debug, Default)]
pub struct StubMarketData {
    pub quote: Option<Quote>,
    pub sectors: Option<SectorPerformanceTable>,
    pub news: Option<Vec<NewsArticle>>,
    pub movers: Option<TopMovers>,
    pub series: Option<Vec<PricePoint>>,
    pub delay: Option<Duration>,
    pub calls: AtomicUsize,
}

impl StubMarketData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn answer<T: Clone>(&self, stage: &'static str, value: &Option<T>) -> Result<T> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        value
            .clone()
            .ok_or_else(|| FetchError::new("stub", stage, "unavailable").into())
    }
}

#[async_trait::async_trait]
impl MarketDataClient for StubMarketData {
    fn provider_name(&self) -> &'static str {
        "stub"
    }

    async fn fetch_quote(&self, _symbol: &str) -> Result<Quote> {
        self.answer("quote", &self.quote).await
    }

    async fn fetch_sector_performance(&self) -> Result<SectorPerformanceTable> {
        self.answer("sectors", &self.sectors).await
    }

    async fn fetch_news(&self, _query: &str) -> Result<Vec<NewsArticle>> {
        self.answer("news", &self.news).await
    }

    async fn fetch_top_movers(&self) -> Result<TopMovers> {
        self.answer("movers", &self.movers).await
    }

    async fn fetch_time_series(&self, _symbol: &str) -> Result<Vec<PricePoint>> {
        self.answer("series", &self.series).await
    }
}

pub fn sectors(rows: &[(&str, &str)]) -> SectorPerformanceTable {
    rows.iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

pub fn article(title: &str, source: &str) -> NewsArticle {
    NewsArticle {
        title: title.to_string(),
        source_name: source.to_string(),
        url: format!("https://news.example/{}", title.len()),
    }
}

/// Closes given oldest first, returned most recent first like the provider.
pub fn series_from_chronological(closes: &[f64]) -> Vec<PricePoint> {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let mut out: Vec<PricePoint> = closes
        .iter()
        .enumerate()
        .map(|(i, close)| PricePoint {
            date: start + chrono::Duration::days(i as i64),
            close: *close,
        })
        .collect();
    out.reverse();
    out
}
