//! Composite scoring across the three domains

use tracing::debug;

use crate::config::WeightConfig;
use crate::error::Result;
use crate::models::{CompositeScore, Domain, DomainWeights, NEUTRAL_SCORE, SubScore};

pub const MIN_OVERALL: f64 = 1.0;
pub const MAX_OVERALL: f64 = 10.0;

/// Combines sub-scores with confidence-adjusted weights
///
/// Each domain's effective weight is its configured weight times its
/// confidence, renormalized over the domains that carry any information.
#[derive(Debug, Clone, Copy)]
pub struct CompositeScorer {
    weights: DomainWeights,
}

impl CompositeScorer {
    /// Fails if the weights are negative, non-finite or all zero
    pub fn new(weights: &WeightConfig) -> Result<Self> {
        Ok(Self {
            weights: weights.normalized()?,
        })
    }

    /// Configured weights, normalized to sum to one
    pub fn weights(&self) -> DomainWeights {
        self.weights
    }

    pub fn combine(
        &self,
        technical: SubScore,
        fundamental: SubScore,
        sentiment: SubScore,
    ) -> CompositeScore {
        let raw = DomainWeights {
            technical: self.weights.technical * technical.confidence,
            fundamental: self.weights.fundamental * fundamental.confidence,
            sentiment: self.weights.sentiment * sentiment.confidence,
        };
        // Normalized weights, so this is also the weighted mean confidence
        let total = raw.sum();

        let (overall, effective_weights, insufficient_data) = if total > 0.0 {
            let effective = DomainWeights {
                technical: raw.technical / total,
                fundamental: raw.fundamental / total,
                sentiment: raw.sentiment / total,
            };
            let blended = effective.technical * technical.value
                + effective.fundamental * fundamental.value
                + effective.sentiment * sentiment.value;
            let clamped = if blended.is_finite() {
                blended.clamp(MIN_OVERALL, MAX_OVERALL)
            } else {
                NEUTRAL_SCORE
            };
            (round_to_tenth(clamped), effective, false)
        } else {
            (NEUTRAL_SCORE, DomainWeights::default(), true)
        };

        let score = CompositeScore {
            overall,
            technical,
            fundamental,
            sentiment,
            weights_used: self.weights,
            effective_weights,
            combined_confidence: total.clamp(0.0, 1.0),
            insufficient_data,
        };

        debug!(
            overall,
            combined_confidence = score.combined_confidence,
            technical = score.effective_weights.get(Domain::Technical),
            fundamental = score.effective_weights.get(Domain::Fundamental),
            sentiment = score.effective_weights.get(Domain::Sentiment),
            insufficient_data,
            "composite score computed"
        );

        score
    }
}

/// Round to one decimal, half away from zero
///
/// The value is first snapped to micro-units so sums such as 7.15 that land a
/// hair below the midpoint still round up.
pub fn round_to_tenth(value: f64) -> f64 {
    let micro = (value * 1e6).round();
    (micro / 1e5).round() / 10.0
}
