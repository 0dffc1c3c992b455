//! Maps a composite score to an action, flags and rationale

use tracing::debug;

use crate::analysis::technical::{NEAR_LOWER_BAND, NEAR_UPPER_BAND};
use crate::analysis::{SentimentAnalysis, TechnicalAnalysis};
use crate::config::{AdvisoryConfig, TechnicalConfig};
use crate::models::{
    Action, AdvisoryFlag, CompositeScore, Domain, EvaluationDetails, Factor, Indicator,
    Recommendation,
};

/// Mean news polarity a confluence rule needs on its side
pub const CONFLUENCE_SENTIMENT: f64 = 0.1;

/// Technical and sentiment readings consulted by the confluence rules
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ConfluenceSignals {
    pub oversold: bool,
    pub overbought: bool,
    pub percent_b: Option<f64>,
    /// `None` when no news fell inside the window
    pub sentiment_mean: Option<f64>,
}

impl ConfluenceSignals {
    pub fn from_analyses(
        technical: &TechnicalAnalysis,
        sentiment: &SentimentAnalysis,
        config: &TechnicalConfig,
    ) -> Self {
        let rsi = technical.snapshot.get(Indicator::Rsi);
        Self {
            oversold: rsi.is_some_and(|r| r < config.rsi_oversold),
            overbought: rsi.is_some_and(|r| r > config.rsi_overbought),
            percent_b: technical.snapshot.get(Indicator::BollingerPercentB),
            sentiment_mean: (!sentiment.items.is_empty()).then_some(sentiment.mean),
        }
    }

    fn bullish(&self) -> bool {
        self.oversold
            && self.percent_b.is_some_and(|b| b <= NEAR_LOWER_BAND)
            && self.sentiment_mean.is_some_and(|m| m > CONFLUENCE_SENTIMENT)
    }

    fn bearish(&self) -> bool {
        self.overbought
            && self.percent_b.is_some_and(|b| b >= NEAR_UPPER_BAND)
            && self.sentiment_mean.is_some_and(|m| m < -CONFLUENCE_SENTIMENT)
    }
}

/// Turns composite scores into recommendations
#[derive(Debug, Clone, Default)]
pub struct Advisor {
    config: AdvisoryConfig,
}

impl Advisor {
    pub fn new(config: AdvisoryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AdvisoryConfig {
        &self.config
    }

    pub fn advise(
        &self,
        symbol: Option<String>,
        score: CompositeScore,
        signals: &ConfluenceSignals,
    ) -> Recommendation {
        let config = &self.config;
        let overall = score.overall;

        let (action, flags) = if score.insufficient_data
            || score.combined_confidence < config.min_combined_confidence
        {
            (Action::DoNothing, vec![AdvisoryFlag::InsufficientData])
        } else if config.confluence_overrides && signals.bullish() {
            (Action::Buy, vec![AdvisoryFlag::Confluence])
        } else if config.confluence_overrides && signals.bearish() {
            (Action::Sell, vec![AdvisoryFlag::Confluence])
        } else {
            self.band(&score)
        };

        let rationale = self.rationale(&score, action, &flags);

        debug!(
            symbol = symbol.as_deref().unwrap_or("-"),
            %action,
            overall,
            flags = ?flags,
            "advice derived"
        );

        Recommendation {
            symbol,
            action,
            flags,
            rationale,
            score,
            details: EvaluationDetails::default(),
        }
    }

    fn band(&self, score: &CompositeScore) -> (Action, Vec<AdvisoryFlag>) {
        let config = &self.config;
        let overall = score.overall;

        if overall >= config.buy_threshold {
            (Action::Buy, Vec::new())
        } else if overall >= config.lean_positive_threshold {
            let sentiment = &score.sentiment;
            let cautious = sentiment.value < config.caution_sentiment
                && sentiment.confidence >= config.caution_min_confidence;
            if cautious {
                (Action::Hold, vec![AdvisoryFlag::Caution])
            } else {
                (Action::Hold, vec![AdvisoryFlag::LeanPositive])
            }
        } else if overall >= config.hold_threshold {
            (Action::Hold, Vec::new())
        } else if overall >= config.strong_sell_threshold {
            (Action::Sell, Vec::new())
        } else {
            (Action::Sell, vec![AdvisoryFlag::Strong])
        }
    }

    /// Headline, then flag sentences, then the most influential factors
    fn rationale(
        &self,
        score: &CompositeScore,
        action: Action,
        flags: &[AdvisoryFlag],
    ) -> Vec<String> {
        let mut lines = vec![self.headline(score.overall)];

        for flag in flags {
            let line = match flag {
                AdvisoryFlag::InsufficientData => format!(
                    "Insufficient data for a recommendation (combined confidence {:.2}).",
                    score.combined_confidence
                ),
                AdvisoryFlag::Caution => format!(
                    "Negative news sentiment ({:.1}/10) tempers the otherwise positive outlook.",
                    score.sentiment.value
                ),
                AdvisoryFlag::Confluence if action == Action::Buy => {
                    "Oversold conditions with positive news make this a potential buying opportunity."
                        .to_string()
                }
                AdvisoryFlag::Confluence => {
                    "Overbought conditions with negative news suggest taking profits.".to_string()
                }
                AdvisoryFlag::Strong => {
                    "Weakness across the evaluated signals warrants a strong sell.".to_string()
                }
                AdvisoryFlag::LeanPositive => continue,
            };
            lines.push(line);
        }

        if !score.insufficient_data {
            for sub in score.sub_scores() {
                if !sub.has_data() {
                    lines.push(format!(
                        "No usable {} data; the score rests on the other domains.",
                        sub.domain.to_string().to_lowercase()
                    ));
                }
            }
        }

        lines.extend(
            self.ranked_factors(score)
                .into_iter()
                .map(|factor| sentence(&factor.description)),
        );
        lines
    }

    fn headline(&self, overall: f64) -> String {
        let config = &self.config;
        let text = if overall >= config.buy_threshold {
            "Very strong overall performance metrics"
        } else if overall >= config.lean_positive_threshold {
            "Good overall performance metrics"
        } else if overall >= config.hold_threshold {
            "Average overall performance metrics"
        } else if overall >= config.strong_sell_threshold {
            "Below average performance metrics"
        } else {
            "Poor overall performance metrics"
        };
        format!("{text} ({overall:.1}/10).")
    }

    /// Per-domain candidates merged by influence on the overall score
    ///
    /// Each domain with data contributes its non-zero factors up to the cap,
    /// or its leading factor when every contribution is zero. The stable
    /// sort keeps domain order on ties.
    fn ranked_factors<'a>(&self, score: &'a CompositeScore) -> Vec<&'a Factor> {
        let mut candidates: Vec<(f64, &Factor)> = Vec::new();

        for domain in Domain::ALL {
            let sub = score.sub_score(domain);
            if !sub.has_data() {
                continue;
            }
            let weight = score.effective_weights.get(domain);
            let mut picked: Vec<&Factor> = sub
                .factors
                .iter()
                .filter(|f| f.contribution != 0.0)
                .take(self.config.max_factors_per_domain)
                .collect();
            if picked.is_empty() {
                picked.extend(sub.factors.first());
            }
            candidates.extend(picked.into_iter().map(|f| ((f.contribution * weight).abs(), f)));
        }

        candidates.sort_by(|a, b| b.0.total_cmp(&a.0));
        candidates.into_iter().map(|(_, f)| f).collect()
    }
}

fn sentence(text: &str) -> String {
    if text.ends_with(['.', '!', '?']) {
        text.to_string()
    } else {
        format!("{text}.")
    }
}
