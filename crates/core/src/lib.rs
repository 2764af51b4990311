pub mod analytics;
pub mod chat;
pub mod domain;
pub mod error;
pub mod market;
pub mod projection;
pub mod recommend;

#[cfg(test)]
pub(crate) mod testing;

pub mod config {
    use anyhow::Context;
    use std::time::Duration;

    const DEFAULT_ALPHA_VANTAGE_BASE_URL: &str = "https://www.alphavantage.co/query";
    const DEFAULT_NEWS_API_BASE_URL: &str = "https://newsapi.org/v2/everything";
    const DEFAULT_NEWS_QUERY: &str = "finance";
    const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;
    const DEFAULT_MARKET_DATA_RETRIES: u32 = 1;
    const DEFAULT_MOVERS_REFRESH_SECS: u64 = 300;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub alpha_vantage_api_key: String,
        pub alpha_vantage_base_url: String,
        pub news_api_key: Option<String>,
        pub news_api_base_url: String,
        pub news_query: String,
        pub fetch_timeout_secs: u64,
        pub market_data_retries: u32,
        pub movers_refresh_secs: u64,
        pub sentry_dsn: Option<String>,
    }

    impl Default for Settings {
        fn default() -> Self {
            Self {
                alpha_vantage_api_key: "demo".to_string(),
                alpha_vantage_base_url: DEFAULT_ALPHA_VANTAGE_BASE_URL.to_string(),
                news_api_key: None,
                news_api_base_url: DEFAULT_NEWS_API_BASE_URL.to_string(),
                news_query: DEFAULT_NEWS_QUERY.to_string(),
                fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
                market_data_retries: DEFAULT_MARKET_DATA_RETRIES,
                movers_refresh_secs: DEFAULT_MOVERS_REFRESH_SECS,
                sentry_dsn: None,
            }
        }
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            let defaults = Self::default();
            Ok(Self {
                alpha_vantage_api_key: non_empty_var("ALPHA_VANTAGE_API_KEY")
                    .unwrap_or(defaults.alpha_vantage_api_key),
                alpha_vantage_base_url: non_empty_var("ALPHA_VANTAGE_BASE_URL")
                    .unwrap_or(defaults.alpha_vantage_base_url),
                news_api_key: non_empty_var("NEWS_API_KEY"),
                news_api_base_url: non_empty_var("NEWS_API_BASE_URL")
                    .unwrap_or(defaults.news_api_base_url),
                news_query: non_empty_var("NEWS_QUERY").unwrap_or(defaults.news_query),
                fetch_timeout_secs: parsed_var("FETCH_TIMEOUT_SECS")?
                    .unwrap_or(defaults.fetch_timeout_secs),
                market_data_retries: parsed_var("MARKET_DATA_RETRIES")?
                    .unwrap_or(defaults.market_data_retries),
                movers_refresh_secs: parsed_var("MOVERS_REFRESH_SECS")?
                    .unwrap_or(defaults.movers_refresh_secs),
                sentry_dsn: non_empty_var("SENTRY_DSN"),
            })
        }

        pub fn fetch_timeout(&self) -> Duration {
            Duration::from_secs(self.fetch_timeout_secs.max(1))
        }

        pub fn movers_refresh_interval(&self) -> Duration {
            Duration::from_secs(self.movers_refresh_secs.max(1))
        }
    }

    fn non_empty_var(key: &str) -> Option<String> {
        std::env::var(key)
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    fn parsed_var<T>(key: &str) -> anyhow::Result<Option<T>>
    where
        T: std::str::FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        non_empty_var(key)
            .map(|s| s.parse::<T>().with_context(|| format!("{key} is not valid: {s}")))
            .transpose()
    }
}
