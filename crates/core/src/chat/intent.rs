use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    Greeting,
    Investment,
    Stock,
    News,
    Balance,
    Fallback,
}

pub struct IntentRule {
    pub intent: Intent,
    pub keywords: &'static [&'static str],
}

/// Checked in order; the first rule with a keyword contained in the message wins.
pub const INTENT_RULES: [IntentRule; 5] = [
    IntentRule {
        intent: Intent::Greeting,
        keywords: &["hello", "hi"],
    },
    IntentRule {
        intent: Intent::Investment,
        keywords: &["invest", "portfolio", "recommend"],
    },
    IntentRule {
        intent: Intent::Stock,
        keywords: &["stock", "market", "price", "quote"],
    },
    IntentRule {
        intent: Intent::News,
        keywords: &["news", "update"],
    },
    IntentRule {
        intent: Intent::Balance,
        keywords: &["balance", "total"],
    },
];

pub fn classify(text: &str) -> Intent {
    let lower = text.to_lowercase();
    INTENT_RULES
        .iter()
        .find(|rule| rule.keywords.iter().any(|k| lower.contains(k)))
        .map(|rule| rule.intent)
        .unwrap_or(Intent::Fallback)
}

/// First whitespace token of 1 to 5 characters, uppercased.
///
/// Surrounding punctuation is ignored and the stock rule's own keywords are
/// skipped, so `"stock AAPL?"` yields `AAPL`.
pub fn extract_ticker(text: &str) -> Option<String> {
    let stock_keywords = INTENT_RULES
        .iter()
        .find(|r| r.intent == Intent::Stock)
        .map(|r| r.keywords)
        .unwrap_or(&[]);

    text.split_whitespace()
        .map(|t| t.trim_matches(|c: char| c.is_ascii_punctuation()))
        .filter(|t| (1..=5).contains(&t.chars().count()))
        .find(|t| !stock_keywords.contains(&t.to_lowercase().as_str()))
        .map(str::to_uppercase)
}
