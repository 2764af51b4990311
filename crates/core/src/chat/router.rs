use crate::chat::format;
use crate::chat::intent::{classify, extract_ticker, Intent};
use crate::domain::chat::{ChatMessage, ConversationLog};
use crate::domain::transaction::FinancialMetrics;
use crate::market::{with_deadline, MarketDataClient};
use crate::recommend::SectorRanker;
use std::sync::Arc;
use std::time::Duration;

/// Stateless: each message is answered on its own against the given metrics.
#[derive(Clone)]
pub struct DialogueRouter {
    client: Arc<dyn MarketDataClient>,
    deadline: Duration,
    news_query: String,
}

impl DialogueRouter {
    pub fn new(client: Arc<dyn MarketDataClient>, deadline: Duration, news_query: &str) -> Self {
        Self {
            client,
            deadline,
            news_query: news_query.to_string(),
        }
    }

    /// Answers `text`, then appends the user message and the reply to `log`, in that order.
    pub async fn handle_message(
        &self,
        log: &mut ConversationLog,
        text: &str,
        metrics: &FinancialMetrics,
    ) -> ChatMessage {
        let (user, reply) = self.exchange(text, metrics).await;
        log.record_exchange(user, reply.clone());
        reply
    }

    /// The user message (stamped on arrival) and its reply, not yet logged.
    pub async fn exchange(
        &self,
        text: &str,
        metrics: &FinancialMetrics,
    ) -> (ChatMessage, ChatMessage) {
        let user = ChatMessage::user(text);
        let reply = self.respond(text, metrics).await;
        (user, reply)
    }

    pub async fn respond(&self, text: &str, metrics: &FinancialMetrics) -> ChatMessage {
        if text.trim().is_empty() {
            return ChatMessage::bot(format::EMPTY_MESSAGE_TEXT);
        }

        let intent = classify(text);
        tracing::debug!(?intent, "routing chat message");

        let reply = match intent {
            Intent::Greeting => format::GREETING_TEXT.to_string(),
            Intent::Investment => self.investment(metrics.balance).await,
            Intent::Stock => self.stock(text).await,
            Intent::News => self
                .news()
                .await
                .unwrap_or_else(|| format::FALLBACK_TEXT.to_string()),
            Intent::Balance => format::balance_summary(metrics),
            Intent::Fallback => format::FALLBACK_TEXT.to_string(),
        };
        ChatMessage::bot(reply)
    }

    async fn investment(&self, balance: f64) -> String {
        let ranker = SectorRanker::new(self.client.as_ref(), self.deadline, &self.news_query);
        let outcome = ranker.recommend(balance).await;
        format::investment_report(balance, &outcome)
    }

    async fn stock(&self, text: &str) -> String {
        let Some(symbol) = extract_ticker(text) else {
            return format::SYMBOL_PROMPT_TEXT.to_string();
        };

        let provider = self.client.provider_name();
        match with_deadline(provider, self.deadline, self.client.fetch_quote(&symbol)).await {
            Ok(quote) => format::stock_quote(&symbol, &quote),
            Err(err) => {
                tracing::warn!(%symbol, error = %err, "quote lookup failed");
                format::SYMBOL_PROMPT_TEXT.to_string()
            }
        }
    }

    async fn news(&self) -> Option<String> {
        let provider = self.client.provider_name();
        match with_deadline(provider, self.deadline, self.client.fetch_news(&self.news_query)).await {
            Ok(articles) => format::news_digest(&articles),
            Err(err) => {
                tracing::warn!(error = %err, "news lookup failed");
                None
            }
        }
    }
}
