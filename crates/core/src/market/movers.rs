use crate::domain::market::{Mover, TopMovers};
use crate::market::{with_deadline, MarketDataClient};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Copy)]
pub struct MoverFixture {
    pub ticker: &'static str,
    pub company_name: &'static str,
    pub price: f64,
    pub change_amount: f64,
    pub change_percent: f64,
}

pub const FALLBACK_GAINERS: [MoverFixture; 3] = [
    MoverFixture {
        ticker: "AAPL",
        company_name: "Apple Inc.",
        price: 185.42,
        change_amount: 5.23,
        change_percent: 2.89,
    },
    MoverFixture {
        ticker: "MSFT",
        company_name: "Microsoft Corp.",
        price: 420.72,
        change_amount: 8.15,
        change_percent: 1.98,
    },
    MoverFixture {
        ticker: "GOOGL",
        company_name: "Alphabet Inc.",
        price: 152.34,
        change_amount: 3.45,
        change_percent: 2.32,
    },
];

pub const FALLBACK_LOSERS: [MoverFixture; 3] = [
    MoverFixture {
        ticker: "TSLA",
        company_name: "Tesla Inc.",
        price: 175.22,
        change_amount: -8.45,
        change_percent: -4.60,
    },
    MoverFixture {
        ticker: "NVDA",
        company_name: "NVIDIA Corp.",
        price: 875.32,
        change_amount: -25.67,
        change_percent: -2.85,
    },
    MoverFixture {
        ticker: "AMD",
        company_name: "Advanced Micro Devices",
        price: 178.54,
        change_amount: -4.32,
        change_percent: -2.36,
    },
];

impl From<&MoverFixture> for Mover {
    fn from(f: &MoverFixture) -> Self {
        Mover {
            ticker: f.ticker.to_string(),
            company_name: f.company_name.to_string(),
            price: f.price,
            change_amount: f.change_amount,
            change_percent: f.change_percent,
        }
    }
}

pub fn fallback_movers() -> TopMovers {
    TopMovers {
        gainers: FALLBACK_GAINERS.iter().map(Mover::from).collect(),
        losers: FALLBACK_LOSERS.iter().map(Mover::from).collect(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Updated,
    KeptPrevious,
    UsedFallback,
}

/// Latest trending gainers and losers, refreshed in the background.
pub struct MoversBoard {
    client: Arc<dyn MarketDataClient>,
    deadline: Duration,
    snapshot: RwLock<Option<TopMovers>>,
}

impl MoversBoard {
    pub fn new(client: Arc<dyn MarketDataClient>, deadline: Duration) -> Self {
        Self {
            client,
            deadline,
            snapshot: RwLock::new(None),
        }
    }

    /// The last good snapshot, or the fallback lists before any refresh succeeded.
    pub async fn current(&self) -> TopMovers {
        self.snapshot
            .read()
            .await
            .clone()
            .unwrap_or_else(fallback_movers)
    }

    pub async fn refresh(&self) -> RefreshOutcome {
        let provider = self.client.provider_name();
        let fetched = with_deadline(provider, self.deadline, self.client.fetch_top_movers()).await;

        let mut guard = self.snapshot.write().await;
        match fetched {
            Ok(movers) => {
                tracing::debug!(
                    gainers = movers.gainers.len(),
                    losers = movers.losers.len(),
                    "top movers refreshed"
                );
                *guard = Some(movers);
                RefreshOutcome::Updated
            }
            Err(err) if guard.is_some() => {
                tracing::warn!(error = %err, "top movers refresh failed; keeping previous snapshot");
                RefreshOutcome::KeptPrevious
            }
            Err(err) => {
                tracing::warn!(error = %err, "top movers unavailable; using fallback lists");
                *guard = Some(fallback_movers());
                RefreshOutcome::UsedFallback
            }
        }
    }

    /// Refreshes now and then every `interval` until the task is aborted.
    pub fn spawn_refresh_loop(self: Arc<Self>, interval: Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                self.refresh().await;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StubMarketData;

    fn live_movers() -> TopMovers {
        TopMovers {
            gainers: vec![Mover {
                ticker: "ABCD".to_string(),
                company_name: "ABCD".to_string(),
                price: 2.0,
                change_amount: 1.0,
                change_percent: 100.0,
            }],
            losers: Vec::new(),
        }
    }

    #[test]
    fn fallback_lists_have_three_each() {
        let m = fallback_movers();
        assert_eq!(m.gainers.len(), 3);
        assert_eq!(m.losers.len(), 3);
        assert_eq!(m.gainers[0].ticker, FALLBACK_GAINERS[0].ticker);
        assert_eq!(m.losers[2].company_name, "Advanced Micro Devices");
    }

    #[tokio::test]
    async fn failure_before_first_success_uses_fallback() {
        let board = MoversBoard::new(Arc::new(StubMarketData::new()), Duration::from_secs(1));
        assert_eq!(board.refresh().await, RefreshOutcome::UsedFallback);
        assert_eq!(board.current().await, fallback_movers());
    }

    #[tokio::test]
    async fn failure_after_success_keeps_previous_snapshot() {
        let live = Arc::new(StubMarketData {
            movers: Some(live_movers()),
            ..Default::default()
        });
        let board = MoversBoard::new(live, Duration::from_secs(1));
        assert_eq!(board.refresh().await, RefreshOutcome::Updated);

        // Swap in a failing collaborator while keeping the snapshot.
        let board = MoversBoard {
            client: Arc::new(StubMarketData::new()),
            deadline: board.deadline,
            snapshot: RwLock::new(board.snapshot.into_inner()),
        };
        assert_eq!(board.refresh().await, RefreshOutcome::KeptPrevious);
        assert_eq!(board.current().await, live_movers());
    }

    #[tokio::test]
    async fn refresh_loop_runs_in_background() {
        let stub = Arc::new(StubMarketData {
            movers: Some(live_movers()),
            ..Default::default()
        });
        let board = Arc::new(MoversBoard::new(stub.clone(), Duration::from_secs(1)));
        let handle = board.clone().spawn_refresh_loop(Duration::from_millis(10));

        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.abort();

        assert!(stub.calls() >= 2);
        assert_eq!(board.current().await, live_movers());
    }
}
