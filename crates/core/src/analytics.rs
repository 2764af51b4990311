//! Reduces a transaction history into the dashboard aggregates.

use crate::domain::transaction::{
    Dashboard, FinancialMetrics, MonthlyBucket, Transaction, TransactionOverview, TurnoverSummary,
};
use crate::error::{Error, Result};
use std::collections::HashMap;

pub fn validate_transactions(transactions: &[Transaction]) -> Result<()> {
    for (idx, tx) in transactions.iter().enumerate() {
        if !tx.amount.is_finite() || tx.amount < 0.0 {
            return Err(Error::invalid_input(format!(
                "transaction {idx} ({}) has invalid amount {}",
                tx.title, tx.amount
            )));
        }
    }
    Ok(())
}

pub fn financial_metrics(transactions: &[Transaction]) -> FinancialMetrics {
    let (total_income, total_expense) = partition_totals(transactions);
    let balance = total_income - total_expense;

    FinancialMetrics {
        total_income,
        total_expense,
        balance,
        savings_rate: percent_of(balance, total_income),
    }
}

/// Month buckets in the order each month label is first seen.
pub fn monthly_buckets(transactions: &[Transaction]) -> Vec<MonthlyBucket> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut buckets: Vec<MonthlyBucket> = Vec::new();

    for tx in transactions {
        let slot = *index.entry(tx.month.as_str()).or_insert_with(|| {
            buckets.push(MonthlyBucket {
                month: tx.month.clone(),
                revenue: 0.0,
                expenses: 0.0,
            });
            buckets.len() - 1
        });

        let bucket = &mut buckets[slot];
        if tx.is_credit() {
            bucket.revenue += tx.amount;
        } else {
            bucket.expenses += tx.amount;
        }
    }

    buckets
}

/// `(month, revenue - expenses)` per bucket, for the balance line chart.
pub fn monthly_balance_series(buckets: &[MonthlyBucket]) -> Vec<(String, f64)> {
    buckets.iter().map(|b| (b.month.clone(), b.net())).collect()
}

pub fn transaction_overview(transactions: &[Transaction]) -> TransactionOverview {
    let total_count = transactions.len();
    let income_count = transactions.iter().filter(|t| t.is_credit()).count();
    let expense_count = total_count - income_count;

    TransactionOverview {
        total_count,
        income_count,
        expense_count,
        income_share_percent: percent_of(income_count as f64, total_count as f64),
        expense_share_percent: percent_of(expense_count as f64, total_count as f64),
    }
}

pub fn turnover_summary(transactions: &[Transaction]) -> TurnoverSummary {
    let (income_turnover, expense_turnover) = partition_totals(transactions);

    TurnoverSummary {
        total_turnover: transactions.iter().map(|t| t.amount).sum(),
        income_turnover,
        expense_turnover,
        net_margin_percent: percent_of(income_turnover - expense_turnover, income_turnover),
        expense_ratio_percent: percent_of(expense_turnover, income_turnover),
    }
}

pub fn dashboard(transactions: &[Transaction]) -> Dashboard {
    let monthly = monthly_buckets(transactions);
    let dashboard = Dashboard {
        metrics: financial_metrics(transactions),
        overview: transaction_overview(transactions),
        turnover: turnover_summary(transactions),
        balance_series: monthly_balance_series(&monthly),
        monthly,
    };

    tracing::debug!(
        transactions = transactions.len(),
        months = dashboard.monthly.len(),
        balance = dashboard.metrics.balance,
        "dashboard aggregated"
    );
    dashboard
}

fn partition_totals(transactions: &[Transaction]) -> (f64, f64) {
    transactions.iter().fold((0.0, 0.0), |(income, expense), tx| {
        if tx.is_credit() {
            (income + tx.amount, expense)
        } else {
            (income, expense + tx.amount)
        }
    })
}

fn percent_of(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 {
        return None;
    }
    let v = numerator / denominator * 100.0;
    v.is_finite().then_some(v)
}
