//! Short-horizon price projection from recent daily closes.
//!
//! The projection is a fixed five-step linear extrapolation of the average
//! move over the last five closes. Confidence is `100 - |change%|` clamped to
//! `[0, 100]`. Neither is a statistical model.

use crate::domain::market::{PricePoint, Quote};
use crate::domain::prediction::StockPrediction;
use crate::error::{Error, Result};
use crate::market::{with_deadline, MarketDataClient};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::Notify;

pub const HISTORY_WINDOW: usize = 30;
pub const TREND_WINDOW: usize = 5;
pub const PROJECTION_STEPS: f64 = 5.0;

/// `history` is most recent first, as the provider returns it.
pub fn project(symbol: &str, quote: &Quote, history: &[PricePoint]) -> Result<StockPrediction> {
    let mut series: Vec<PricePoint> = history.iter().take(HISTORY_WINDOW).copied().collect();
    series.reverse();

    if series.len() < TREND_WINDOW {
        return Err(Error::DataInsufficient {
            needed: TREND_WINDOW,
            got: series.len(),
        });
    }

    let recent = &series[series.len() - TREND_WINDOW..];
    let avg_change = (recent[TREND_WINDOW - 1].close - recent[0].close) / TREND_WINDOW as f64;
    let predicted_price = quote.price + avg_change * PROJECTION_STEPS;
    let confidence_percent = (100.0 - quote.change_percent.abs()).clamp(0.0, 100.0);

    Ok(StockPrediction {
        symbol: symbol.to_string(),
        current_price: quote.price,
        predicted_price,
        confidence_percent,
        historical_series: series,
    })
}

pub fn normalize_symbol(raw: &str) -> Result<String> {
    let symbol = raw.trim().to_uppercase();
    if symbol.is_empty() {
        return Err(Error::invalid_input("stock symbol is required"));
    }
    if !symbol
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
    {
        return Err(Error::invalid_input(format!("invalid stock symbol: {raw}")));
    }
    Ok(symbol)
}

/// Fetches and projects; a newer request for a symbol abandons the older one.
pub struct Projector {
    client: Arc<dyn MarketDataClient>,
    deadline: Duration,
    in_flight: Mutex<HashMap<String, Arc<Notify>>>,
}

impl Projector {
    pub fn new(client: Arc<dyn MarketDataClient>, deadline: Duration) -> Self {
        Self {
            client,
            deadline,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    pub async fn predict(&self, raw_symbol: &str) -> Result<StockPrediction> {
        let symbol = normalize_symbol(raw_symbol)?;

        // Listen before registering so a newer request can never slip in unseen.
        let token = Arc::new(Notify::new());
        let superseded = token.notified();
        tokio::pin!(superseded);
        superseded.as_mut().enable();
        let _registration = self.register(&symbol, &token);

        let provider = self.client.provider_name();
        let fetch = async {
            tokio::try_join!(
                with_deadline(provider, self.deadline, self.client.fetch_quote(&symbol)),
                with_deadline(provider, self.deadline, self.client.fetch_time_series(&symbol)),
            )
        };

        let res = tokio::select! {
            res = fetch => res,
            _ = &mut superseded => {
                tracing::debug!(%symbol, "prediction superseded by a newer request");
                return Err(Error::Superseded { symbol: symbol.clone() });
            }
        };

        let (quote, history) = res.inspect_err(|err| {
            tracing::warn!(%symbol, error = %err, "prediction fetch failed");
        })?;
        project(&symbol, &quote, &history)
    }

    /// Installs `token` as the live request for `symbol`, waking the one it replaces.
    fn register(&self, symbol: &str, token: &Arc<Notify>) -> Registration<'_> {
        let mut guard = self.lock_in_flight();
        if let Some(previous) = guard.insert(symbol.to_string(), token.clone()) {
            previous.notify_waiters();
        }
        Registration {
            projector: self,
            symbol: symbol.to_string(),
            token: token.clone(),
        }
    }

    fn lock_in_flight(&self) -> MutexGuard<'_, HashMap<String, Arc<Notify>>> {
        self.in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Removes its map entry when the request ends, including when its future is dropped.
struct Registration<'a> {
    projector: &'a Projector,
    symbol: String,
    token: Arc<Notify>,
}

impl Drop for Registration<'_> {
    fn drop(&mut self) {
        let mut guard = self.projector.lock_in_flight();
        if guard
            .get(&self.symbol)
            .is_some_and(|t| Arc::ptr_eq(t, &self.token))
        {
            guard.remove(&self.symbol);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{series_from_chronological, StubMarketData};

    fn quote(price: f64, change_percent: f64) -> Quote {
        Quote {
            price,
            change_percent,
            volume: 1_000,
        }
    }

    #[test]
    fn extrapolates_five_steps() {
        let history = series_from_chronological(&[100.0, 101.0, 102.0, 103.0, 104.0]);
        let p = project("AAPL", &quote(104.0, 1.5), &history).unwrap();
        assert!((p.predicted_price - 108.0).abs() < 1e-9);
        assert_eq!(p.current_price, 104.0);
        assert_eq!(p.confidence_percent, 98.5);

        let closes: Vec<f64> = p.historical_series.iter().map(|pt| pt.close).collect();
        assert_eq!(closes, vec![100.0, 101.0, 102.0, 103.0, 104.0]);
    }

    #[test]
    fn uses_only_the_latest_thirty_closes() {
        let closes: Vec<f64> = (0..40).map(|i| i as f64).collect();
        let history = series_from_chronological(&closes);
        let p = project("MSFT", &quote(39.0, 0.0), &history).unwrap();
        assert_eq!(p.historical_series.len(), HISTORY_WINDOW);
        assert_eq!(p.historical_series[0].close, 10.0);
        assert_eq!(p.historical_series.last().unwrap().close, 39.0);
        // (39 - 35) / 5 * 5
        assert!((p.predicted_price - 43.0).abs() < 1e-9);
    }

    #[test]
    fn short_history_is_insufficient() {
        let history = series_from_chronological(&[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(
            project("X", &quote(4.0, 0.0), &history),
            Err(Error::DataInsufficient { needed: 5, got: 4 })
        );
        assert_eq!(
            project("X", &quote(4.0, 0.0), &[]),
            Err(Error::DataInsufficient { needed: 5, got: 0 })
        );
    }

    #[test]
    fn confidence_is_clamped() {
        let history = series_from_chronological(&[1.0; 5]);
        let p = project("X", &quote(1.0, -140.0), &history).unwrap();
        assert_eq!(p.confidence_percent, 0.0);
    }

    #[test]
    fn rejects_blank_or_malformed_symbols() {
        assert_eq!(normalize_symbol(" aapl ").unwrap(), "AAPL");
        assert_eq!(normalize_symbol("BRK.B").unwrap(), "BRK.B");
        assert!(matches!(normalize_symbol("  "), Err(Error::InvalidInput(_))));
        assert!(matches!(normalize_symbol("AA PL"), Err(Error::InvalidInput(_))));
    }

    #[tokio::test]
    async fn predicts_from_fetched_data() {
        let stub = Arc::new(StubMarketData {
            quote: Some(quote(104.0, 2.0)),
            series: Some(series_from_chronological(&[100.0, 101.0, 102.0, 103.0, 104.0])),
            ..Default::default()
        });
        let projector = Projector::new(stub, Duration::from_secs(1));
        let p = projector.predict("aapl").await.unwrap();
        assert_eq!(p.symbol, "AAPL");
        assert!((p.predicted_price - 108.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn fetch_failure_is_reported() {
        let stub = Arc::new(StubMarketData {
            series: Some(series_from_chronological(&[1.0; 5])),
            ..Default::default()
        });
        let projector = Projector::new(stub, Duration::from_secs(1));
        let err = projector.predict("AAPL").await.unwrap_err();
        assert!(err.is_fetch_failure());
    }

    #[tokio::test]
    async fn newer_request_supersedes_older() {
        let stub = Arc::new(StubMarketData {
            quote: Some(quote(10.0, 0.0)),
            series: Some(series_from_chronological(&[10.0; 5])),
            delay: Some(Duration::from_millis(50)),
            ..Default::default()
        });
        let projector = Projector::new(stub, Duration::from_secs(1));

        let (older, newer) = tokio::join!(projector.predict("AAPL"), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            projector.predict("AAPL").await
        });

        assert_eq!(
            older,
            Err(Error::Superseded {
                symbol: "AAPL".to_string()
            })
        );
        assert!(newer.is_ok());
        assert!(projector.in_flight.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn dropped_request_releases_its_slot() {
        let stub = Arc::new(StubMarketData {
            quote: Some(quote(10.0, 0.0)),
            series: Some(series_from_chronological(&[10.0; 5])),
            delay: Some(Duration::from_millis(200)),
            ..Default::default()
        });
        let projector = Projector::new(stub, Duration::from_secs(1));

        let abandoned =
            tokio::time::timeout(Duration::from_millis(10), projector.predict("AAPL")).await;
        assert!(abandoned.is_err());
        assert!(projector.in_flight.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn registration_supersedes_a_listener_enabled_beforehand() {
        let stub = Arc::new(StubMarketData::new());
        let projector = Projector::new(stub, Duration::from_secs(1));

        let older = Arc::new(Notify::new());
        let notified = older.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();
        let first = projector.register("AAPL", &older);

        let newer = Arc::new(Notify::new());
        let second = projector.register("AAPL", &newer);
        tokio::time::timeout(Duration::from_millis(50), notified)
            .await
            .expect("older listener should be woken");

        drop(first);
        assert!(projector.in_flight.lock().unwrap().contains_key("AAPL"));
        drop(second);
        assert!(projector.in_flight.lock().unwrap().is_empty());
    }
}
