use std::fmt;
use thiserror::Error;

/// Diagnostics for a failed call to an external market or news collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchError {
    pub provider: &'static str,
    pub stage: &'static str,
    pub detail: String,
}

impl FetchError {
    pub fn new(provider: &'static str, stage: &'static str, detail: impl Into<String>) -> Self {
        Self {
            provider,
            stage,
            detail: detail.into(),
        }
    }

    pub fn timeout(provider: &'static str, after: std::time::Duration) -> Self {
        Self::new(provider, "timeout", format!("no response after {after:?}"))
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "fetch error (provider={}, stage={}): {}",
            self.provider, self.stage, self.detail
        )
    }
}

impl std::error::Error for FetchError {}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("{0}")]
    FetchFailure(#[from] FetchError),

    #[error("not enough history: need {needed} closes, got {got}")]
    DataInsufficient { needed: usize, got: usize },

    #[error("metric is undefined: {0}")]
    UndefinedMetric(&'static str),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("request for {symbol} was superseded by a newer one")]
    Superseded { symbol: String },
}

impl Error {
    pub fn invalid_input(detail: impl Into<String>) -> Self {
        Self::InvalidInput(detail.into())
    }

    pub fn is_fetch_failure(&self) -> bool {
        matches!(self, Self::FetchFailure(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
