//! News items and per-item sentiment

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One news article about a symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    #[serde(alias = "published")]
    pub published_at: DateTime<Utc>,
    #[serde(alias = "title")]
    pub headline: String,
    #[serde(default, alias = "description", alias = "summary")]
    pub body: String,
    #[serde(default)]
    pub source: String,
}

impl NewsItem {
    pub fn new(
        published_at: DateTime<Utc>,
        headline: impl Into<String>,
        body: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            published_at,
            headline: headline.into(),
            body: body.into(),
            source: source.into(),
        }
    }
}

/// Polarity bucket for a sentiment score
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SentimentLabel {
    Positive,
    Negative,
    #[default]
    Neutral,
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SentimentLabel::Positive => "POSITIVE",
            SentimentLabel::Negative => "NEGATIVE",
            SentimentLabel::Neutral => "NEUTRAL",
        };
        f.write_str(label)
    }
}

/// Classifier output for one item
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SentimentResult {
    /// Compound polarity in [-1, 1]
    pub score: f64,
    pub label: SentimentLabel,
}

impl SentimentResult {
    /// Label a score using symmetric neutral band `threshold`
    pub fn from_score(score: f64, threshold: f64) -> Self {
        let score = if score.is_finite() {
            score.clamp(-1.0, 1.0)
        } else {
            0.0
        };
        let label = if score >= threshold {
            SentimentLabel::Positive
        } else if score <= -threshold {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        };
        Self { score, label }
    }

    pub fn neutral() -> Self {
        Self::default()
    }
}

/// Direction of sentiment across the recency window
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SentimentTrend {
    Improving,
    #[default]
    Stable,
    Worsening,
}

impl fmt::Display for SentimentTrend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SentimentTrend::Improving => "IMPROVING",
            SentimentTrend::Stable => "STABLE",
            SentimentTrend::Worsening => "WORSENING",
        };
        f.write_str(label)
    }
}

/// One in-window item with its classification and recency weight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredItem {
    pub published_at: DateTime<Utc>,
    pub headline: String,
    pub result: SentimentResult,
    pub weight: f64,
}

/// Items per polarity bucket
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelCounts {
    pub positive: usize,
    pub negative: usize,
    pub neutral: usize,
}

impl LabelCounts {
    pub fn tally(items: &[ScoredItem]) -> Self {
        items.iter().fold(Self::default(), |mut counts, item| {
            match item.result.label {
                SentimentLabel::Positive => counts.positive += 1,
                SentimentLabel::Negative => counts.negative += 1,
                SentimentLabel::Neutral => counts.neutral += 1,
            }
            counts
        })
    }
}

/// Aggregate news sentiment behind the sentiment sub-score
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SentimentSummary {
    /// Recency-weighted mean polarity in [-1, 1]
    pub mean: f64,
    pub trend: SentimentTrend,
    pub counts: LabelCounts,
    /// In-window items, oldest first
    pub items: Vec<ScoredItem>,
    /// Items outside the window or dated after the reference time
    pub ignored: usize,
}
