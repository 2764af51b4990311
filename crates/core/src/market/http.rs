use crate::config::Settings;
use crate::domain::market::{NewsArticle, PricePoint, Quote, SectorPerformanceTable, TopMovers};
use crate::error::FetchError;
use crate::market::provider::MarketDataClient;
use crate::market::wire;
use anyhow::{Context, Result};
use serde_json::Value;
use std::time::Duration;

const PROVIDER: &str = "alpha_vantage+newsapi";

/// Alpha Vantage for quotes, sectors, series and movers; NewsAPI for headlines.
#[derive(Debug, Clone)]
pub struct HttpMarketData {
    http: reqwest::Client,
    alpha_vantage_base_url: String,
    alpha_vantage_api_key: String,
    news_api_base_url: String,
    news_api_key: Option<String>,
    retries: u32,
}

impl HttpMarketData {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(settings.fetch_timeout())
            .build()
            .context("failed to build market data http client")?;

        Ok(Self {
            http,
            alpha_vantage_base_url: settings.alpha_vantage_base_url.clone(),
            alpha_vantage_api_key: settings.alpha_vantage_api_key.clone(),
            news_api_base_url: settings.news_api_base_url.clone(),
            news_api_key: settings.news_api_key.clone(),
            retries: settings.market_data_retries.max(1),
        })
    }

    async fn alpha_vantage(&self, params: &[(&str, &str)]) -> Result<Value> {
        let mut query: Vec<(&str, &str)> = params.to_vec();
        query.push(("apikey", self.alpha_vantage_api_key.as_str()));
        self.get_json(&self.alpha_vantage_base_url, &query).await
    }

    async fn get_json(&self, url: &str, query: &[(&str, &str)]) -> Result<Value> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match self.get_json_once(url, query).await {
                Ok(v) => return Ok(v),
                Err(err) => {
                    if attempt >= self.retries {
                        return Err(err);
                    }
                    let backoff = Duration::from_secs(1 << (attempt - 1));
                    tracing::warn!(attempt, ?backoff, error = %err, "market data fetch failed; retrying");
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }

    async fn get_json_once(&self, url: &str, query: &[(&str, &str)]) -> Result<Value> {
        let res = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .context("market data request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read market data response")?;
        let raw = serde_json::from_str::<Value>(&text)
            .with_context(|| format!("market data response is not valid JSON: {text}"))?;

        if !status.is_success() {
            anyhow::bail!("market data HTTP {status}: {raw}");
        }
        Ok(raw)
    }
}

fn request_failed(err: anyhow::Error) -> crate::error::Error {
    FetchError::new(PROVIDER, "request", format!("{err:#}")).into()
}

fn decode_failed(err: anyhow::Error) -> crate::error::Error {
    FetchError::new(PROVIDER, "decode", format!("{err:#}")).into()
}

#[async_trait::async_trait]
impl MarketDataClient for HttpMarketData {
    fn provider_name(&self) -> &'static str {
        PROVIDER
    }

    async fn fetch_quote(&self, symbol: &str) -> crate::error::Result<Quote> {
        let raw = self
            .alpha_vantage(&[("function", "GLOBAL_QUOTE"), ("symbol", symbol)])
            .await
            .map_err(request_failed)?;
        wire::decode_quote(&raw).map_err(decode_failed)
    }

    async fn fetch_sector_performance(&self) -> crate::error::Result<SectorPerformanceTable> {
        let raw = self
            .alpha_vantage(&[("function", "SECTOR")])
            .await
            .map_err(request_failed)?;
        wire::decode_sector_performance(&raw).map_err(decode_failed)
    }

    async fn fetch_news(&self, query: &str) -> crate::error::Result<Vec<NewsArticle>> {
        let Some(api_key) = self.news_api_key.as_deref() else {
            return Err(FetchError::new(PROVIDER, "config", "NEWS_API_KEY is not set").into());
        };
        let raw = self
            .get_json(&self.news_api_base_url, &[("q", query), ("apiKey", api_key)])
            .await
            .map_err(request_failed)?;
        wire::decode_news(&raw).map_err(decode_failed)
    }

    async fn fetch_top_movers(&self) -> crate::error::Result<TopMovers> {
        let raw = self
            .alpha_vantage(&[("function", "TOP_GAINERS_LOSERS")])
            .await
            .map_err(request_failed)?;
        wire::decode_top_movers(&raw).map_err(decode_failed)
    }

    async fn fetch_time_series(&self, symbol: &str) -> crate::error::Result<Vec<PricePoint>> {
        let raw = self
            .alpha_vantage(&[
                ("function", "TIME_SERIES_DAILY"),
                ("symbol", symbol),
                ("outputsize", "compact"),
            ])
            .await
            .map_err(request_failed)?;
        wire::decode_time_series(&raw).map_err(decode_failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[tokio::test]
    async fn news_without_key_fails_before_any_request() {
        let client = HttpMarketData::from_settings(&Settings::default()).unwrap();
        match client.fetch_news("finance").await {
            Err(Error::FetchFailure(err)) => assert_eq!(err.stage, "config"),
            other => panic!("expected config failure, got {other:?}"),
        }
    }
}
