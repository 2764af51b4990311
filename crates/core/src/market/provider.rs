use crate::domain::market::{NewsArticle, PricePoint, Quote, SectorPerformanceTable, TopMovers};
use crate::error::{FetchError, Result};
use std::future::Future;
use std::time::Duration;

/// External market and news data the analytics core depends on.
///
/// Every method either returns an already-decoded shape or a
/// [`crate::error::Error::FetchFailure`]; callers decide how to degrade.
#[async_trait::async_trait]
pub trait MarketDataClient: Send + Sync {
    fn provider_name(&self) -> &'static str;

    async fn fetch_quote(&self, symbol: &str) -> Result<Quote>;

    async fn fetch_sector_performance(&self) -> Result<SectorPerformanceTable>;

    async fn fetch_news(&self, query: &str) -> Result<Vec<NewsArticle>>;

    async fn fetch_top_movers(&self) -> Result<TopMovers>;

    /// Daily closes, most recent first.
    async fn fetch_time_series(&self, symbol: &str) -> Result<Vec<PricePoint>>;
}

/// Runs `fut` under `deadline`; expiry becomes a fetch failure.
pub async fn with_deadline<T, F>(provider: &'static str, deadline: Duration, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(deadline, fut).await {
        Ok(res) => res,
        Err(_) => {
            tracing::warn!(provider, ?deadline, "market data fetch timed out");
            Err(FetchError::timeout(provider, deadline).into())
        }
    }
}
