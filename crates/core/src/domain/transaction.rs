use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    #[serde(alias = "income")]
    Credit,
    Expense,
}

/// A recorded transaction as exported by the persistence layer. Read-only here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub date: NaiveDate,
    pub title: String,
    pub amount: f64,
    pub category: String,
    pub transaction_type: TransactionType,
    pub month: String,
}

impl Transaction {
    pub fn is_credit(&self) -> bool {
        self.transaction_type == TransactionType::Credit
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FinancialMetrics {
    pub total_income: f64,
    pub total_expense: f64,
    pub balance: f64,
    /// `None` when there is no income to divide by.
    pub savings_rate: Option<f64>,
}

impl FinancialMetrics {
    pub fn require_savings_rate(&self) -> crate::error::Result<f64> {
        self.savings_rate
            .ok_or(crate::error::Error::UndefinedMetric("savings rate (no income)"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyBucket {
    pub month: String,
    pub revenue: f64,
    pub expenses: f64,
}

impl MonthlyBucket {
    pub fn net(&self) -> f64 {
        self.revenue - self.expenses
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransactionOverview {
    pub total_count: usize,
    pub income_count: usize,
    pub expense_count: usize,
    pub income_share_percent: Option<f64>,
    pub expense_share_percent: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TurnoverSummary {
    pub total_turnover: f64,
    pub income_turnover: f64,
    pub expense_turnover: f64,
    /// (income - expense) / income * 100, kept as the dashboard has always shown it.
    pub net_margin_percent: Option<f64>,
    pub expense_ratio_percent: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    pub metrics: FinancialMetrics,
    pub overview: TransactionOverview,
    pub turnover: TurnoverSummary,
    pub monthly: Vec<MonthlyBucket>,
    /// `(month, revenue - expenses)` in the same order as `monthly`.
    pub balance_series: Vec<(String, f64)>,
}
