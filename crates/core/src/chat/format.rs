use crate::domain::market::{NewsArticle, Quote};
use crate::domain::transaction::FinancialMetrics;
use crate::recommend::RankingOutcome;
use std::fmt::Write;

pub const GREETING_TEXT: &str = "Hello! I can help you with:\n- Investment recommendations\n- Financial analysis\n- Portfolio suggestions\n- Market insights\n\nWhat would you like to know?";

pub const FALLBACK_TEXT: &str = "I can help you with:\n- Investment recommendations\n- Financial analysis\n- Portfolio suggestions\n- Market insights\n- Stock information\n- Latest news\n\nWhat would you like to know?";

pub const SYMBOL_PROMPT_TEXT: &str = "Please specify a stock symbol (e.g., \"AAPL\" for Apple)";

pub const EMPTY_MESSAGE_TEXT: &str = "Please type a question, for example \"What is my balance?\"";

pub const MAX_NEWS_ITEMS: usize = 3;

pub fn money(amount: f64) -> String {
    format!("₹{amount:.2}")
}

pub fn investment_report(balance: f64, outcome: &RankingOutcome) -> String {
    if !outcome.has_recommendations() {
        return format!(
            "I couldn't find any investment options suitable for your current balance of {}. Consider saving more to access our investment opportunities.",
            money(balance)
        );
    }

    let mut out = format!(
        "Based on your current balance of {}, here are personalized investment recommendations:\n\n",
        money(balance)
    );

    for sector in outcome.sectors.iter().filter(|s| !s.is_empty()) {
        let _ = writeln!(out, "📊 {} Sector:", sector.sector.sector_name);
        let _ = writeln!(
            out,
            "   Market Performance: {}\n",
            sector.sector.performance_text
        );

        for rec in &sector.recommendations {
            let _ = writeln!(out, "\n💡 {}", rec.fund_name);
            let _ = writeln!(out, "   Description: {}", rec.description);
            let _ = writeln!(out, "   Risk Level: {}", rec.risk_level);
            let _ = writeln!(out, "   Expected Return: {}", rec.expected_return_range);
            let _ = writeln!(
                out,
                "   Minimum Investment: ₹{:.0}",
                rec.minimum_investment
            );
        }

        if !sector.news.is_empty() {
            out.push_str("\n📰 Recent News:\n");
            for article in &sector.news {
                let _ = writeln!(out, "   - {}", article.title);
                let _ = writeln!(out, "     Source: {}", article.source_name);
            }
        }
        out.push('\n');
    }

    out
}

pub fn stock_quote(symbol: &str, quote: &Quote) -> String {
    format!(
        "Stock Information for {symbol}:\nPrice: ${:.2}\nChange: {:.2}%\nVolume: {}",
        quote.price, quote.change_percent, quote.volume
    )
}

/// `None` when there is nothing to show.
pub fn news_digest(articles: &[NewsArticle]) -> Option<String> {
    if articles.is_empty() {
        return None;
    }

    let items: Vec<String> = articles
        .iter()
        .take(MAX_NEWS_ITEMS)
        .map(|a| format!("📰 {}\n   Source: {}\n   {}\n", a.title, a.source_name, a.url))
        .collect();
    Some(format!("Latest Financial News:\n\n{}", items.join("\n")))
}

pub fn balance_summary(metrics: &FinancialMetrics) -> String {
    let savings_rate = metrics
        .savings_rate
        .map(|r| format!("{r:.1}%"))
        .unwrap_or_else(|| "not available".to_string());

    format!(
        "Your current balance is {}\nTotal income: {}\nTotal expenses: {}\nSavings rate: {}",
        money(metrics.balance),
        money(metrics.total_income),
        money(metrics.total_expense),
        savings_rate
    )
}
