//! Rule-based assistant: classifies one message at a time and answers it from
//! the caller's metrics plus live market data.

pub mod format;
pub mod intent;
pub mod router;

pub use intent::{classify, extract_ticker, Intent};
pub use router::DialogueRouter;
