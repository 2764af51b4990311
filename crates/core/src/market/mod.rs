pub mod http;
pub mod movers;
pub mod provider;
pub mod wire;

pub use provider::{with_deadline, MarketDataClient};
