//! Evaluation input bundle

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{FundamentalMetrics, NewsItem, PricePoint};

/// Everything needed to evaluate one symbol
///
/// Deserializes from the JSON bundle the CLI reads; every section is optional
/// and an absent section simply lowers that domain's confidence to zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    /// Reference time for news recency; latest input timestamp when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub as_of: Option<DateTime<Utc>>,
    #[serde(alias = "prices")]
    pub price_history: Vec<PricePoint>,
    pub fundamentals: FundamentalMetrics,
    pub news: Vec<NewsItem>,
}

impl EvaluationRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = Some(symbol.into());
        self
    }

    pub fn with_as_of(mut self, as_of: DateTime<Utc>) -> Self {
        self.as_of = Some(as_of);
        self
    }

    pub fn with_prices(mut self, prices: Vec<PricePoint>) -> Self {
        self.price_history = prices;
        self
    }

    pub fn with_fundamentals(mut self, fundamentals: FundamentalMetrics) -> Self {
        self.fundamentals = fundamentals;
        self
    }

    pub fn with_news(mut self, news: Vec<NewsItem>) -> Self {
        self.news = news;
        self
    }

    /// Explicit `as_of`, otherwise the latest news or usable price timestamp
    ///
    /// Never reads the clock, so the same request always evaluates the same way.
    pub fn reference_time(&self) -> Option<DateTime<Utc>> {
        self.as_of.or_else(|| latest_timestamp(&self.price_history, &self.news))
    }

    /// Label for logs and errors
    pub fn label(&self) -> &str {
        self.symbol.as_deref().unwrap_or("<unnamed>")
    }
}

pub(crate) fn latest_timestamp(prices: &[PricePoint], news: &[NewsItem]) -> Option<DateTime<Utc>> {
    let latest_price = prices
        .iter()
        .filter(|p| p.is_usable())
        .map(|p| p.timestamp)
        .max();
    let latest_news = news.iter().map(|n| n.published_at).max();
    latest_price.max(latest_news)
}
