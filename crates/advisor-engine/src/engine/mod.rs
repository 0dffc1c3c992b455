//! Evaluation entry points
//!
//! [`AdvisoryEngine`] owns validated configuration and runs the three
//! analyzers concurrently; [`evaluate`] is the one-shot convenience form.

pub mod advisory_engine;
pub mod request;

pub use advisory_engine::AdvisoryEngine;
pub use request::EvaluationRequest;

use crate::config::{EngineConfig, WeightConfig};
use crate::error::Result;
use crate::models::{FundamentalMetrics, NewsItem, PricePoint, Recommendation};

/// Evaluate one symbol with default analyzer settings and the given weights
///
/// Fails only when the weights are invalid.
pub fn evaluate(
    price_history: &[PricePoint],
    fundamentals: &FundamentalMetrics,
    news: &[NewsItem],
    weights: &WeightConfig,
) -> Result<Recommendation> {
    let config = EngineConfig::builder().weights(*weights).build()?;
    AdvisoryEngine::new(config)?.evaluate(price_history, fundamentals, news)
}
