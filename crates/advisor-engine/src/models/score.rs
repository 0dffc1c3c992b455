//! Sub-scores, factors and the composite score

use serde::{Deserialize, Serialize};
use std::fmt;

/// Midpoint of the 0-10 scale, reported when a domain has nothing to say
pub const NEUTRAL_SCORE: f64 = 5.0;

/// Signal domain a sub-score belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Domain {
    Technical,
    Fundamental,
    Sentiment,
}

impl Domain {
    pub const ALL: [Domain; 3] = [Domain::Technical, Domain::Fundamental, Domain::Sentiment];
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Domain::Technical => "Technical",
            Domain::Fundamental => "Fundamental",
            Domain::Sentiment => "Sentiment",
        };
        f.write_str(label)
    }
}

/// How a single factor reads for the investment case
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Judgment {
    Favorable,
    #[default]
    Neutral,
    Unfavorable,
}

impl Judgment {
    /// Bucket a signal in [-1, 1]
    pub fn from_signal(signal: f64) -> Self {
        if signal >= 0.25 {
            Judgment::Favorable
        } else if signal <= -0.25 {
            Judgment::Unfavorable
        } else {
            Judgment::Neutral
        }
    }
}

/// One inspectable input to a sub-score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Factor {
    pub name: String,
    /// Relative weight inside its domain
    pub weight: f64,
    /// The indicator or metric value the signal was read from
    pub raw_value: Option<f64>,
    /// Normalized direction in [-1, 1], positive is bullish
    pub signal: f64,
    /// Sub-score points this factor moved away from 5.0
    pub contribution: f64,
    pub judgment: Judgment,
    /// Rationale sentence for this factor
    pub description: String,
}

impl Factor {
    pub fn new(
        name: impl Into<String>,
        weight: f64,
        raw_value: Option<f64>,
        signal: f64,
        description: impl Into<String>,
    ) -> Self {
        let signal = if signal.is_finite() {
            signal.clamp(-1.0, 1.0)
        } else {
            0.0
        };
        Self {
            name: name.into(),
            weight: weight.max(0.0),
            raw_value: raw_value.filter(|v| v.is_finite()),
            signal,
            contribution: 0.0,
            judgment: Judgment::from_signal(signal),
            description: description.into(),
        }
    }

    pub fn with_judgment(mut self, judgment: Judgment) -> Self {
        self.judgment = judgment;
        self
    }
}

/// Normalized score for one domain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubScore {
    pub domain: Domain,
    /// In [0, 10]
    pub value: f64,
    /// In [0, 1]; zero means the value carries no information
    pub confidence: f64,
    /// Ordered by absolute contribution, largest first
    pub factors: Vec<Factor>,
}

impl SubScore {
    /// 5.0 with zero confidence
    pub fn neutral(domain: Domain) -> Self {
        Self {
            domain,
            value: NEUTRAL_SCORE,
            confidence: 0.0,
            factors: Vec::new(),
        }
    }

    /// Blend factors as `5 + 5 * sum(w * s) / sum(w)`
    ///
    /// Fills in each factor's contribution and sorts the factors by its
    /// magnitude. Zero-weight factors are kept for rationale but move nothing.
    pub fn from_factors(domain: Domain, mut factors: Vec<Factor>, confidence: f64) -> Self {
        let total_weight: f64 = factors.iter().map(|f| f.weight).sum();

        if total_weight > 0.0 {
            for factor in &mut factors {
                factor.contribution = NEUTRAL_SCORE * factor.weight * factor.signal / total_weight;
            }
        }

        let value = NEUTRAL_SCORE + factors.iter().map(|f| f.contribution).sum::<f64>();
        factors.sort_by(|a, b| b.contribution.abs().total_cmp(&a.contribution.abs()));

        Self {
            domain,
            value: clamp_or(value, 0.0, 10.0, NEUTRAL_SCORE),
            confidence: clamp_or(confidence, 0.0, 1.0, 0.0),
            factors,
        }
    }

    pub fn has_data(&self) -> bool {
        self.confidence > 0.0
    }

    pub fn factor(&self, name: &str) -> Option<&Factor> {
        self.factors.iter().find(|f| f.name == name)
    }
}

/// Per-domain weights; always non-negative
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DomainWeights {
    pub technical: f64,
    pub fundamental: f64,
    pub sentiment: f64,
}

impl DomainWeights {
    pub fn get(&self, domain: Domain) -> f64 {
        match domain {
            Domain::Technical => self.technical,
            Domain::Fundamental => self.fundamental,
            Domain::Sentiment => self.sentiment,
        }
    }

    pub fn sum(&self) -> f64 {
        self.technical + self.fundamental + self.sentiment
    }
}

/// Confidence-weighted combination of the three sub-scores
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeScore {
    /// In [1, 10], one decimal
    pub overall: f64,
    pub technical: SubScore,
    pub fundamental: SubScore,
    pub sentiment: SubScore,
    /// Configured weights after normalization
    pub weights_used: DomainWeights,
    /// Weights actually applied: configured weight times confidence, renormalized
    pub effective_weights: DomainWeights,
    /// Configured-weight average of the domain confidences
    pub combined_confidence: f64,
    /// Every domain had zero confidence
    pub insufficient_data: bool,
}

impl CompositeScore {
    pub fn sub_score(&self, domain: Domain) -> &SubScore {
        match domain {
            Domain::Technical => &self.technical,
            Domain::Fundamental => &self.fundamental,
            Domain::Sentiment => &self.sentiment,
        }
    }

    pub fn sub_scores(&self) -> [&SubScore; 3] {
        [&self.technical, &self.fundamental, &self.sentiment]
    }
}

pub(crate) fn clamp_or(value: f64, min: f64, max: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value.clamp(min, max)
    } else {
        fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_factors_blends_and_orders() {
        let factors = vec![
            Factor::new("small", 1.0, Some(1.0), 0.2, "small push"),
            Factor::new("big", 1.0, Some(2.0), -1.0, "big drag"),
        ];
        let score = SubScore::from_factors(Domain::Technical, factors, 0.8);

        // 5 + 5 * (0.2 - 1.0) / 2
        assert!((score.value - 3.0).abs() < 1e-12);
        assert_eq!(score.factors[0].name, "big");
        assert!((score.factors[0].contribution + 2.5).abs() < 1e-12);
        assert_eq!(score.factors[0].judgment, Judgment::Unfavorable);
        assert_eq!(score.confidence, 0.8);
    }

    #[test]
    fn test_zero_weight_factor_is_informational() {
        let factors = vec![
            Factor::new("avg", 1.0, Some(0.5), 0.5, "positive"),
            Factor::new("trend", 0.0, None, 1.0, "improving"),
        ];
        let score = SubScore::from_factors(Domain::Sentiment, factors, 1.0);
        assert!((score.value - 7.5).abs() < 1e-12);
        assert_eq!(score.factor("trend").map(|f| f.contribution), Some(0.0));
    }

    #[test]
    fn test_sub_score_bounds() {
        let score = SubScore::from_factors(Domain::Fundamental, Vec::new(), f64::NAN);
        assert_eq!(score.value, NEUTRAL_SCORE);
        assert_eq!(score.confidence, 0.0);
        assert!(!score.has_data());

        let factor = Factor::new("x", 1.0, None, 7.0, "clamped");
        assert_eq!(factor.signal, 1.0);
    }
}
