//! Recommendation output and its flat presentation record

use serde::{Deserialize, Serialize};
use std::fmt;

use super::fundamentals::Metric;
use super::news::SentimentSummary;
use super::price::TechnicalSnapshot;
use super::score::{CompositeScore, SubScore};

/// Discrete investment action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    Buy,
    Sell,
    Hold,
    DoNothing,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Action::Buy => "BUY",
            Action::Sell => "SELL",
            Action::Hold => "HOLD",
            Action::DoNothing => "DO NOTHING",
        };
        f.write_str(label)
    }
}

/// Qualifiers attached to an action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdvisoryFlag {
    /// HOLD in the upper band
    LeanPositive,
    /// HOLD in the upper band held back by confidently negative news
    Caution,
    /// SELL in the lowest band
    Strong,
    /// Combined confidence below the minimum; action forced to DO_NOTHING
    InsufficientData,
    /// Action set by an oversold/overbought confluence rule
    Confluence,
}

/// Analyzer output behind the sub-scores
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationDetails {
    pub technical: TechnicalSnapshot,
    /// Fundamental metrics that were absent or not finite
    pub missing_fundamentals: Vec<Metric>,
    pub sentiment: SentimentSummary,
}

/// Action, rationale and the score behind them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub symbol: Option<String>,
    pub action: Action,
    pub flags: Vec<AdvisoryFlag>,
    pub rationale: Vec<String>,
    pub score: CompositeScore,
    #[serde(default)]
    pub details: EvaluationDetails,
}

impl Recommendation {
    pub fn with_details(mut self, details: EvaluationDetails) -> Self {
        self.details = details;
        self
    }

    pub fn has_flag(&self, flag: AdvisoryFlag) -> bool {
        self.flags.contains(&flag)
    }

    pub fn overall(&self) -> f64 {
        self.score.overall
    }

    /// Flatten into the record shape a presentation layer stores or renders
    pub fn to_record(&self) -> RecommendationRecord {
        RecommendationRecord {
            symbol: self.symbol.clone(),
            action: self.action,
            overall: self.score.overall,
            technical: DomainSummary::from(&self.score.technical),
            fundamental: DomainSummary::from(&self.score.fundamental),
            sentiment: DomainSummary::from(&self.score.sentiment),
            flags: self.flags.clone(),
            rationale: self.rationale.clone(),
        }
    }
}

/// Value and confidence of one domain
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DomainSummary {
    pub value: f64,
    pub confidence: f64,
}

impl From<&SubScore> for DomainSummary {
    fn from(score: &SubScore) -> Self {
        Self {
            value: score.value,
            confidence: score.confidence,
        }
    }
}

/// Flat key-value form of a [`Recommendation`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationRecord {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub symbol: Option<String>,
    pub action: Action,
    pub overall: f64,
    pub technical: DomainSummary,
    pub fundamental: DomainSummary,
    pub sentiment: DomainSummary,
    pub flags: Vec<AdvisoryFlag>,
    pub rationale: Vec<String>,
}
