//! Stock scoring and advisory engine
//!
//! This crate turns pre-fetched market data for one symbol into a 1-10
//! composite score and an investment recommendation. It includes:
//!
//! - Technical analysis of a price series (SMA, EMA, RSI, MACD, Bollinger
//!   Bands, ATR, momentum, volume)
//! - Fundamental analysis of valuation, profitability and balance-sheet ratios
//! - News sentiment analysis with recency weighting
//! - Confidence-weighted combination of the three sub-scores
//! - Advice (BUY / HOLD / SELL / DO NOTHING) with a ranked rationale
//!
//! # Architecture
//!
//! Each analyzer is a pure function from its input to a [`SubScore`] carrying
//! a confidence in [0, 1]. Missing or malformed data lowers confidence instead
//! of failing. The [`CompositeScorer`](scoring::CompositeScorer) weights each
//! domain by configured weight times confidence, and the
//! [`Advisor`](advisory::Advisor) maps the result to an action.
//! [`AdvisoryEngine`] wires them together and runs the analyzers in parallel.
//!
//! # Example
//!
//! ```rust
//! use advisor_engine::{evaluate, Action, FundamentalMetrics, Metric, WeightConfig};
//!
//! let fundamentals = FundamentalMetrics::new()
//!     .with(Metric::PeRatio, 18.0)
//!     .with(Metric::Roe, 0.21);
//!
//! let recommendation = evaluate(&[], &fundamentals, &[], &WeightConfig::default())?;
//!
//! // One thin domain is not enough to act on
//! assert_eq!(recommendation.action, Action::DoNothing);
//! # Ok::<(), advisor_engine::AdvisorError>(())
//! ```

pub mod advisory;
pub mod analysis;
pub mod config;
pub mod engine;
pub mod error;
pub mod interface;
pub mod models;
pub mod scoring;

// Re-export main types for convenience
pub use advisory::{Advisor, ConfluenceSignals};
pub use analysis::{
    FundamentalAnalyzer, LexiconClassifier, SentimentAnalyzer, SentimentClassifier,
    TechnicalAnalyzer,
};
pub use config::{
    AdvisoryConfig, EngineConfig, FundamentalConfig, RecencyDecay, SentimentConfig,
    SharedWeights, TechnicalConfig, WeightConfig,
};
pub use engine::{AdvisoryEngine, EvaluationRequest, evaluate};
pub use error::{AdvisorError, Result};
pub use models::{
    Action, AdvisoryFlag, CompositeScore, Domain, EvaluationDetails, FundamentalMetrics, Metric,
    NewsItem, PricePoint, Recommendation, RecommendationRecord, SentimentSummary, SubScore,
};
pub use scoring::CompositeScorer;
