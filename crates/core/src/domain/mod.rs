pub mod chat;
pub mod market;
pub mod prediction;
pub mod recommendation;
pub mod transaction;
