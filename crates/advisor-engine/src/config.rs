//! Configuration for scoring and advisory operations
//!
//! Every threshold the analyzers and the advisory bands use lives here, with
//! defaults matching the documented behaviour. Configurations are validated
//! once, up front; evaluation itself never fails on configuration.

use crate::error::{AdvisorError, Result};
use crate::models::{DomainWeights, Metric};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Environment variables read by [`WeightConfig::with_env_overrides`]
pub mod env {
    pub const WEIGHT_TECHNICAL: &str = "ADVISOR_WEIGHT_TECHNICAL";
    pub const WEIGHT_FUNDAMENTAL: &str = "ADVISOR_WEIGHT_FUNDAMENTAL";
    pub const WEIGHT_SENTIMENT: &str = "ADVISOR_WEIGHT_SENTIMENT";
}

/// Relative importance of the three domains
///
/// Weights need not sum to one; they are normalized before use. Negative,
/// non-finite or all-zero weights are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeightConfig {
    pub technical: f64,
    pub fundamental: f64,
    pub sentiment: f64,
}

impl Default for WeightConfig {
    fn default() -> Self {
        Self {
            technical: 0.4,
            fundamental: 0.35,
            sentiment: 0.25,
        }
    }
}

impl WeightConfig {
    pub fn new(technical: f64, fundamental: f64, sentiment: f64) -> Result<Self> {
        let weights = Self {
            technical,
            fundamental,
            sentiment,
        };
        weights.validate()?;
        Ok(weights)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("technical", self.technical),
            ("fundamental", self.fundamental),
            ("sentiment", self.sentiment),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(AdvisorError::Config(format!(
                    "{name} weight must be a non-negative number, got {value}"
                )));
            }
        }

        if self.technical + self.fundamental + self.sentiment <= 0.0 {
            return Err(AdvisorError::Config(
                "at least one domain weight must be positive".to_string(),
            ));
        }

        Ok(())
    }

    /// Weights scaled to sum to one
    pub fn normalized(&self) -> Result<DomainWeights> {
        self.validate()?;
        let total = self.technical + self.fundamental + self.sentiment;
        Ok(DomainWeights {
            technical: self.technical / total,
            fundamental: self.fundamental / total,
            sentiment: self.sentiment / total,
        })
    }

    /// Override individual weights from `ADVISOR_WEIGHT_*` variables
    pub fn with_env_overrides(mut self) -> Result<Self> {
        for (var, slot) in [
            (env::WEIGHT_TECHNICAL, &mut self.technical),
            (env::WEIGHT_FUNDAMENTAL, &mut self.fundamental),
            (env::WEIGHT_SENTIMENT, &mut self.sentiment),
        ] {
            if let Ok(raw) = std::env::var(var) {
                *slot = raw.trim().parse::<f64>().map_err(|e| {
                    AdvisorError::Config(format!("{var} is not a number ({raw:?}): {e}"))
                })?;
            }
        }
        self.validate()?;
        Ok(self)
    }
}

/// Per-signal weights inside the technical sub-score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TechnicalWeights {
    pub rsi: f64,
    pub macd: f64,
    pub price_vs_sma: f64,
    pub trend: f64,
    pub bollinger: f64,
    pub momentum: f64,
    pub volume: f64,
}

impl Default for TechnicalWeights {
    fn default() -> Self {
        Self {
            rsi: 0.20,
            macd: 0.20,
            price_vs_sma: 0.15,
            trend: 0.20,
            bollinger: 0.10,
            momentum: 0.10,
            volume: 0.05,
        }
    }
}

impl TechnicalWeights {
    pub fn total(&self) -> f64 {
        self.rsi
            + self.macd
            + self.price_vs_sma
            + self.trend
            + self.bollinger
            + self.momentum
            + self.volume
    }

    fn values(&self) -> [f64; 7] {
        [
            self.rsi,
            self.macd,
            self.price_vs_sma,
            self.trend,
            self.bollinger,
            self.momentum,
            self.volume,
        ]
    }
}

/// Windows and thresholds for the technical analyzer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TechnicalConfig {
    pub sma_short: usize,
    pub sma_medium: usize,
    pub sma_long: usize,
    pub ema_fast: usize,
    pub ema_slow: usize,
    pub macd_signal: usize,
    pub rsi_period: usize,
    pub rsi_overbought: f64,
    pub rsi_oversold: f64,
    pub bollinger_period: usize,
    pub bollinger_std_dev: f64,
    pub atr_period: usize,
    pub adx_period: usize,
    /// ADX above this marks an up or down trend as strong
    pub strong_trend_adx: f64,
    pub volume_period: usize,
    pub momentum_lookback: usize,
    /// Bars used to measure the medium SMA slope
    pub slope_lookback: usize,
    /// Percent distance from the medium SMA that saturates its signal
    pub sma_distance_saturation_pct: f64,
    /// Mean daily return (percent) that saturates the momentum signal
    pub momentum_saturation_pct: f64,
    /// An interval wider than this multiple of the median interval is a gap
    pub gap_tolerance: f64,
    pub weights: TechnicalWeights,
}

impl Default for TechnicalConfig {
    fn default() -> Self {
        Self {
            sma_short: 20,
            sma_medium: 50,
            sma_long: 200,
            ema_fast: 12,
            ema_slow: 26,
            macd_signal: 9,
            rsi_period: 14,
            rsi_overbought: 70.0,
            rsi_oversold: 30.0,
            bollinger_period: 20,
            bollinger_std_dev: 2.0,
            atr_period: 14,
            adx_period: 14,
            strong_trend_adx: 25.0,
            volume_period: 20,
            momentum_lookback: 5,
            slope_lookback: 5,
            sma_distance_saturation_pct: 5.0,
            momentum_saturation_pct: 2.0,
            gap_tolerance: 5.0,
            weights: TechnicalWeights::default(),
        }
    }
}

impl TechnicalConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let periods = [
            ("sma_short", self.sma_short),
            ("sma_medium", self.sma_medium),
            ("sma_long", self.sma_long),
            ("ema_fast", self.ema_fast),
            ("ema_slow", self.ema_slow),
            ("macd_signal", self.macd_signal),
            ("rsi_period", self.rsi_period),
            ("bollinger_period", self.bollinger_period),
            ("atr_period", self.atr_period),
            ("adx_period", self.adx_period),
            ("volume_period", self.volume_period),
            ("momentum_lookback", self.momentum_lookback),
            ("slope_lookback", self.slope_lookback),
        ];
        if let Some((name, _)) = periods.iter().find(|(_, p)| *p == 0) {
            return Err(AdvisorError::Config(format!(
                "{name} must be greater than 0"
            )));
        }

        if self.ema_fast >= self.ema_slow {
            return Err(AdvisorError::Config(
                "ema_fast must be shorter than ema_slow".to_string(),
            ));
        }

        if !(0.0..=100.0).contains(&self.rsi_oversold)
            || !(0.0..=100.0).contains(&self.rsi_overbought)
            || self.rsi_oversold >= self.rsi_overbought
        {
            return Err(AdvisorError::Config(
                "RSI thresholds must satisfy 0 <= oversold < overbought <= 100".to_string(),
            ));
        }

        for (name, value) in [
            ("bollinger_std_dev", self.bollinger_std_dev),
            ("sma_distance_saturation_pct", self.sma_distance_saturation_pct),
            ("momentum_saturation_pct", self.momentum_saturation_pct),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(AdvisorError::Config(format!("{name} must be positive")));
            }
        }

        if !(0.0..=100.0).contains(&self.strong_trend_adx) {
            return Err(AdvisorError::Config(
                "strong_trend_adx must be between 0 and 100".to_string(),
            ));
        }

        if !self.gap_tolerance.is_finite() || self.gap_tolerance < 1.0 {
            return Err(AdvisorError::Config(
                "gap_tolerance must be at least 1.0".to_string(),
            ));
        }

        validate_weights("technical signal", &self.weights.values())
    }
}

/// Healthy-range thresholds for fundamental metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FundamentalConfig {
    pub pe_healthy_min: f64,
    pub pe_healthy_max: f64,
    pub pe_ceiling: f64,
    pub pb_favorable_max: f64,
    pub pb_ceiling: f64,
    pub roe_floor: f64,
    pub roe_poor: f64,
    pub margin_floor: f64,
    pub margin_poor: f64,
    pub dividend_high: f64,
    pub dividend_low: f64,
    pub debt_to_equity_low: f64,
    pub debt_to_equity_ceiling: f64,
    pub current_ratio_strong: f64,
    pub current_ratio_weak: f64,
    pub beta_low: f64,
    pub beta_high: f64,
    pub growth_favorable: f64,
    pub growth_unfavorable: f64,
    /// Relative weight per metric; metrics missing from the map weigh 1.0
    pub metric_weights: BTreeMap<Metric, f64>,
}

impl Default for FundamentalConfig {
    fn default() -> Self {
        let metric_weights = BTreeMap::from([
            (Metric::PeRatio, 1.0),
            (Metric::ForwardPe, 0.5),
            (Metric::PriceToBook, 0.75),
            (Metric::Roe, 1.0),
            (Metric::ProfitMargin, 0.75),
            (Metric::DividendYield, 0.5),
            (Metric::DebtToEquity, 1.0),
            (Metric::CurrentRatio, 0.75),
            (Metric::Beta, 0.25),
            (Metric::RevenueGrowth, 0.75),
            (Metric::EarningsGrowth, 0.75),
        ]);

        Self {
            pe_healthy_min: 10.0,
            pe_healthy_max: 25.0,
            pe_ceiling: 40.0,
            pb_favorable_max: 1.5,
            pb_ceiling: 5.0,
            roe_floor: 0.15,
            roe_poor: 0.05,
            margin_floor: 0.15,
            margin_poor: 0.05,
            dividend_high: 0.04,
            dividend_low: 0.01,
            debt_to_equity_low: 0.5,
            debt_to_equity_ceiling: 2.0,
            current_ratio_strong: 2.0,
            current_ratio_weak: 1.0,
            beta_low: 0.8,
            beta_high: 1.5,
            growth_favorable: 0.10,
            growth_unfavorable: 0.0,
            metric_weights,
        }
    }
}

impl FundamentalConfig {
    pub fn weight(&self, metric: Metric) -> f64 {
        self.metric_weights.get(&metric).copied().unwrap_or(1.0)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let ordered = [
            ("pe_healthy_min < pe_healthy_max", self.pe_healthy_min, self.pe_healthy_max),
            ("pe_healthy_max <= pe_ceiling", self.pe_healthy_max, self.pe_ceiling),
            ("pb_favorable_max <= pb_ceiling", self.pb_favorable_max, self.pb_ceiling),
            ("roe_poor <= roe_floor", self.roe_poor, self.roe_floor),
            ("margin_poor <= margin_floor", self.margin_poor, self.margin_floor),
            ("dividend_low <= dividend_high", self.dividend_low, self.dividend_high),
            (
                "debt_to_equity_low <= debt_to_equity_ceiling",
                self.debt_to_equity_low,
                self.debt_to_equity_ceiling,
            ),
            (
                "current_ratio_weak <= current_ratio_strong",
                self.current_ratio_weak,
                self.current_ratio_strong,
            ),
            ("beta_low <= beta_high", self.beta_low, self.beta_high),
            (
                "growth_unfavorable <= growth_favorable",
                self.growth_unfavorable,
                self.growth_favorable,
            ),
        ];

        for (rule, low, high) in ordered {
            if !low.is_finite() || !high.is_finite() || low > high {
                return Err(AdvisorError::Config(format!(
                    "fundamental thresholds violate {rule}"
                )));
            }
        }

        if self.pe_healthy_min >= self.pe_healthy_max {
            return Err(AdvisorError::Config(
                "pe_healthy_min must be below pe_healthy_max".to_string(),
            ));
        }

        let weights: Vec<f64> = self.metric_weights.values().copied().collect();
        validate_weights("fundamental metric", &weights)
    }
}

/// How quickly older news loses influence
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecencyDecay {
    /// Weight falls linearly from 1 at the reference time to `floor` at the
    /// edge of the recency window
    Linear { floor: f64 },
    /// Weight halves every `half_life_days`
    Exponential { half_life_days: f64 },
}

impl Default for RecencyDecay {
    fn default() -> Self {
        Self::Exponential {
            half_life_days: 2.0,
        }
    }
}

impl RecencyDecay {
    /// Weight of an item `age_days` old; non-increasing in age
    pub fn weight(&self, age_days: f64, window_days: f64) -> f64 {
        let age = age_days.max(0.0);
        match *self {
            RecencyDecay::Linear { floor } => {
                if window_days <= 0.0 {
                    return 1.0;
                }
                let remaining = (1.0 - age / window_days).clamp(0.0, 1.0);
                floor + (1.0 - floor) * remaining
            }
            RecencyDecay::Exponential { half_life_days } => {
                (-std::f64::consts::LN_2 * age / half_life_days).exp()
            }
        }
    }

    fn validate(&self) -> Result<()> {
        match *self {
            RecencyDecay::Linear { floor } if !(0.0..=1.0).contains(&floor) => Err(
                AdvisorError::Config("linear decay floor must be within [0, 1]".to_string()),
            ),
            RecencyDecay::Exponential { half_life_days }
                if !half_life_days.is_finite() || half_life_days <= 0.0 =>
            {
                Err(AdvisorError::Config(
                    "exponential decay half-life must be positive".to_string(),
                ))
            }
            _ => Ok(()),
        }
    }
}

/// Settings for news sentiment aggregation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SentimentConfig {
    /// Items older than this many days before the reference time are ignored
    pub recency_window_days: f64,
    pub decay: RecencyDecay,
    /// Item count at which confidence reaches 1.0
    pub expected_min_items: usize,
    /// Compound score magnitude separating POSITIVE/NEGATIVE from NEUTRAL
    pub label_threshold: f64,
    /// Half-over-half mean change that counts as a trend
    pub trend_threshold: f64,
}

impl Default for SentimentConfig {
    fn default() -> Self {
        Self {
            recency_window_days: 7.0,
            decay: RecencyDecay::default(),
            expected_min_items: 5,
            label_threshold: 0.05,
            trend_threshold: 0.1,
        }
    }
}

impl SentimentConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if !self.recency_window_days.is_finite() || self.recency_window_days <= 0.0 {
            return Err(AdvisorError::Config(
                "recency_window_days must be positive".to_string(),
            ));
        }
        if self.expected_min_items == 0 {
            return Err(AdvisorError::Config(
                "expected_min_items must be greater than 0".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&self.label_threshold) {
            return Err(AdvisorError::Config(
                "label_threshold must be within [0, 1)".to_string(),
            ));
        }
        if !self.trend_threshold.is_finite() || self.trend_threshold < 0.0 {
            return Err(AdvisorError::Config(
                "trend_threshold must be non-negative".to_string(),
            ));
        }
        self.decay.validate()
    }
}

/// Score bands and rationale settings for the advisory engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisoryConfig {
    pub buy_threshold: f64,
    pub lean_positive_threshold: f64,
    pub hold_threshold: f64,
    pub strong_sell_threshold: f64,
    /// Sentiment sub-score below which the upper HOLD band turns cautious
    pub caution_sentiment: f64,
    pub caution_min_confidence: f64,
    /// Combined confidence below which the action is DO_NOTHING
    pub min_combined_confidence: f64,
    pub max_factors_per_domain: usize,
    /// Let oversold/overbought confluence set BUY/SELL directly
    pub confluence_overrides: bool,
}

impl Default for AdvisoryConfig {
    fn default() -> Self {
        Self {
            buy_threshold: 8.0,
            lean_positive_threshold: 6.0,
            hold_threshold: 4.0,
            strong_sell_threshold: 2.0,
            caution_sentiment: 3.0,
            caution_min_confidence: 0.5,
            min_combined_confidence: 0.3,
            max_factors_per_domain: 3,
            confluence_overrides: false,
        }
    }
}

impl AdvisoryConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let bands = [
            self.strong_sell_threshold,
            self.hold_threshold,
            self.lean_positive_threshold,
            self.buy_threshold,
        ];
        if bands.iter().any(|b| !b.is_finite()) || !bands.windows(2).all(|w| w[0] <= w[1]) {
            return Err(AdvisorError::Config(
                "score bands must satisfy strong_sell <= hold <= lean_positive <= buy".to_string(),
            ));
        }
        for (name, value) in [
            ("caution_min_confidence", self.caution_min_confidence),
            ("min_combined_confidence", self.min_combined_confidence),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(AdvisorError::Config(format!("{name} must be within [0, 1]")));
            }
        }
        if self.max_factors_per_domain == 0 {
            return Err(AdvisorError::Config(
                "max_factors_per_domain must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub weights: WeightConfig,
    pub technical: TechnicalConfig,
    pub fundamental: FundamentalConfig,
    pub sentiment: SentimentConfig,
    pub advisory: AdvisoryConfig,
    /// Return an error instead of DO_NOTHING when no domain has data
    pub strict: bool,
}

impl EngineConfig {
    /// Create a new configuration builder
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }

    /// Parse and validate a JSON document; absent sections take defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.weights.validate()?;
        self.technical.validate()?;
        self.fundamental.validate()?;
        self.sentiment.validate()?;
        self.advisory.validate()
    }
}

/// Builder for EngineConfig
#[derive(Debug, Default)]
pub struct EngineConfigBuilder {
    weights: Option<WeightConfig>,
    technical: Option<TechnicalConfig>,
    fundamental: Option<FundamentalConfig>,
    sentiment: Option<SentimentConfig>,
    advisory: Option<AdvisoryConfig>,
    strict: Option<bool>,
    env_weights: bool,
}

impl EngineConfigBuilder {
    /// Set the domain weights
    pub fn weights(mut self, weights: WeightConfig) -> Self {
        self.weights = Some(weights);
        self
    }

    /// Set technical analyzer settings
    pub fn technical(mut self, config: TechnicalConfig) -> Self {
        self.technical = Some(config);
        self
    }

    /// Set fundamental thresholds
    pub fn fundamental(mut self, config: FundamentalConfig) -> Self {
        self.fundamental = Some(config);
        self
    }

    /// Set sentiment aggregation settings
    pub fn sentiment(mut self, config: SentimentConfig) -> Self {
        self.sentiment = Some(config);
        self
    }

    /// Set the recency decay only, keeping other sentiment settings
    pub fn recency_decay(mut self, decay: RecencyDecay) -> Self {
        let mut sentiment = self.sentiment.take().unwrap_or_default();
        sentiment.decay = decay;
        self.sentiment = Some(sentiment);
        self
    }

    /// Set advisory bands
    pub fn advisory(mut self, config: AdvisoryConfig) -> Self {
        self.advisory = Some(config);
        self
    }

    /// Enable strict mode
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = Some(strict);
        self
    }

    /// Apply `ADVISOR_WEIGHT_*` overrides at build time
    pub fn with_env_weights(mut self) -> Self {
        self.env_weights = true;
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<EngineConfig> {
        let mut weights = self.weights.unwrap_or_default();
        if self.env_weights {
            weights = weights.with_env_overrides()?;
        }

        let config = EngineConfig {
            weights,
            technical: self.technical.unwrap_or_default(),
            fundamental: self.fundamental.unwrap_or_default(),
            sentiment: self.sentiment.unwrap_or_default(),
            advisory: self.advisory.unwrap_or_default(),
            strict: self.strict.unwrap_or(false),
        };

        config.validate()?;
        Ok(config)
    }
}

/// Process-wide weights that can be swapped between evaluations
///
/// Readers take an `Arc` snapshot and keep it for a whole evaluation, so a
/// concurrent [`SharedWeights::replace`] never changes weights mid-flight.
#[derive(Debug)]
pub struct SharedWeights {
    current: RwLock<Arc<WeightConfig>>,
}

impl SharedWeights {
    pub fn new(weights: WeightConfig) -> Result<Self> {
        weights.validate()?;
        Ok(Self {
            current: RwLock::new(Arc::new(weights)),
        })
    }

    /// Current weights
    pub fn snapshot(&self) -> Arc<WeightConfig> {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Validate and atomically install new weights
    pub fn replace(&self, weights: WeightConfig) -> Result<()> {
        weights.validate()?;
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Arc::new(weights);
        tracing::info!(
            technical = weights.technical,
            fundamental = weights.fundamental,
            sentiment = weights.sentiment,
            "domain weights replaced"
        );
        Ok(())
    }
}

impl Default for SharedWeights {
    fn default() -> Self {
        Self {
            current: RwLock::new(Arc::new(WeightConfig::default())),
        }
    }
}

fn validate_weights(kind: &str, weights: &[f64]) -> Result<()> {
    if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
        return Err(AdvisorError::Config(format!(
            "{kind} weights must be non-negative"
        )));
    }
    if weights.iter().sum::<f64>() <= 0.0 {
        return Err(AdvisorError::Config(format!(
            "at least one {kind} weight must be positive"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.weights.technical, 0.4);
        assert_eq!(config.technical.rsi_period, 14);
        assert!(!config.strict);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = EngineConfig::builder()
            .weights(WeightConfig::new(0.5, 0.3, 0.2).unwrap())
            .recency_decay(RecencyDecay::Linear { floor: 0.2 })
            .strict(true)
            .build()
            .unwrap();

        assert_eq!(config.weights.technical, 0.5);
        assert_eq!(config.sentiment.decay, RecencyDecay::Linear { floor: 0.2 });
        assert_eq!(config.sentiment.recency_window_days, 7.0);
        assert!(config.strict);
    }

    #[test]
    fn test_negative_weight_rejected() {
        let err = WeightConfig::new(0.5, -0.1, 0.6).unwrap_err();
        assert!(matches!(err, AdvisorError::Config(_)));
        assert!(WeightConfig::new(0.0, 0.0, 0.0).is_err());
        assert!(WeightConfig::new(f64::NAN, 0.5, 0.5).is_err());
    }

    #[test]
    fn test_weights_normalized() {
        let weights = WeightConfig::new(2.0, 1.0, 1.0).unwrap().normalized().unwrap();
        assert_eq!(weights.technical, 0.5);
        assert_eq!(weights.fundamental, 0.25);
        assert!((weights.sum() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_sections_rejected() {
        let config = EngineConfig {
            technical: TechnicalConfig {
                ema_fast: 30,
                ..TechnicalConfig::default()
            },
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());

        let config = EngineConfig {
            technical: TechnicalConfig {
                strong_trend_adx: 140.0,
                ..TechnicalConfig::default()
            },
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());

        let config = EngineConfig {
            advisory: AdvisoryConfig {
                buy_threshold: 5.0,
                ..AdvisoryConfig::default()
            },
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());

        let config = EngineConfig {
            sentiment: SentimentConfig {
                decay: RecencyDecay::Exponential { half_life_days: 0.0 },
                ..SentimentConfig::default()
            },
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_json_partial() {
        let config = EngineConfig::from_json(
            r#"{
                "weights": {"technical": 1, "fundamental": 1, "sentiment": 0},
                "sentiment": {"decay": {"kind": "linear", "floor": 0.1}}
            }"#,
        )
        .unwrap();
        assert_eq!(config.weights.sentiment, 0.0);
        assert_eq!(config.sentiment.decay, RecencyDecay::Linear { floor: 0.1 });
        assert_eq!(config.advisory.buy_threshold, 8.0);

        assert!(EngineConfig::from_json(r#"{"weights": {"technical": -1}}"#).is_err());
    }

    #[test]
    fn test_recency_decay_is_monotonic() {
        for decay in [
            RecencyDecay::Linear { floor: 0.1 },
            RecencyDecay::Exponential { half_life_days: 2.0 },
        ] {
            let mut previous = f64::INFINITY;
            for age in 0..=7 {
                let weight = decay.weight(f64::from(age), 7.0);
                assert!(weight <= previous);
                assert!(weight > 0.0);
                previous = weight;
            }
        }

        let exp = RecencyDecay::Exponential { half_life_days: 2.0 };
        assert!((exp.weight(2.0, 7.0) - 0.5).abs() < 1e-12);
        let linear = RecencyDecay::Linear { floor: 0.1 };
        assert!((linear.weight(7.0, 7.0) - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_shared_weights_replace() {
        let shared = SharedWeights::default();
        let before = shared.snapshot();

        shared.replace(WeightConfig::new(1.0, 0.0, 0.0).unwrap()).unwrap();
        assert_eq!(before.technical, 0.4);
        assert_eq!(shared.snapshot().technical, 1.0);

        let invalid = WeightConfig {
            technical: -1.0,
            ..WeightConfig::default()
        };
        assert!(shared.replace(invalid).is_err());
        assert_eq!(shared.snapshot().technical, 1.0);
    }
}
