use anyhow::Context;
use finsight_core::analytics;
use finsight_core::domain::transaction::Transaction;
use std::path::Path;

/// Reads an exported transaction history (a JSON array, oldest first).
pub fn load(path: &Path) -> anyhow::Result<Vec<Transaction>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read transactions file {}", path.display()))?;
    let txs = parse(&text).with_context(|| format!("invalid transactions in {}", path.display()))?;

    tracing::info!(path = %path.display(), count = txs.len(), "loaded transactions");
    Ok(txs)
}

pub fn parse(text: &str) -> anyhow::Result<Vec<Transaction>> {
    let txs: Vec<Transaction> =
        serde_json::from_str(text).context("transactions must be a JSON array of records")?;
    analytics::validate_transactions(&txs)?;
    Ok(txs)
}
