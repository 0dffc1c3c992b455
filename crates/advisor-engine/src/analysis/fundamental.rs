//! Fundamental analyzer: valuation, profitability and balance-sheet judgments

use tracing::debug;

use crate::config::FundamentalConfig;
use crate::models::{Domain, Factor, FundamentalMetrics, Judgment, Metric, SubScore};

/// Output of [`FundamentalAnalyzer`]
#[derive(Debug, Clone, PartialEq)]
pub struct FundamentalAnalysis {
    pub score: SubScore,
    /// Metrics that were absent or non-finite
    pub missing: Vec<Metric>,
}

/// Judges each present metric against configured thresholds
#[derive(Debug, Clone, Default)]
pub struct FundamentalAnalyzer {
    config: FundamentalConfig,
}

impl FundamentalAnalyzer {
    pub fn new(config: FundamentalConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FundamentalConfig {
        &self.config
    }

    pub fn analyze(&self, metrics: &FundamentalMetrics) -> FundamentalAnalysis {
        let trailing_pe = metrics.get(Metric::PeRatio);
        let mut factors = Vec::new();
        let mut missing = Vec::new();

        for metric in Metric::ALL {
            let Some(value) = metrics.get(metric) else {
                missing.push(metric);
                continue;
            };
            let (judgment, description) = self.judge(metric, value, trailing_pe);
            let signal = match judgment {
                Judgment::Favorable => 1.0,
                Judgment::Neutral => 0.0,
                Judgment::Unfavorable => -1.0,
            };
            factors.push(Factor::new(
                metric.label(),
                self.config.weight(metric),
                Some(value),
                signal,
                description,
            ));
        }

        if factors.is_empty() {
            debug!("no fundamental metrics supplied");
            return FundamentalAnalysis {
                score: SubScore::neutral(Domain::Fundamental),
                missing,
            };
        }

        let confidence = factors.len() as f64 / Metric::ALL.len() as f64;
        let score = SubScore::from_factors(Domain::Fundamental, factors, confidence);

        debug!(
            present = Metric::ALL.len() - missing.len(),
            value = score.value,
            confidence = score.confidence,
            "fundamental analysis complete"
        );

        FundamentalAnalysis { score, missing }
    }

    fn judge(&self, metric: Metric, value: f64, trailing_pe: Option<f64>) -> (Judgment, String) {
        use Judgment::{Favorable, Neutral, Unfavorable};
        let c = &self.config;
        let pct = value * 100.0;

        match metric {
            Metric::PeRatio => {
                if value < 0.0 {
                    (Unfavorable, format!("Negative P/E ratio ({value:.1}) reflects losses"))
                } else if value > c.pe_ceiling {
                    (
                        Unfavorable,
                        format!("High P/E ratio ({value:.1}) suggests potential overvaluation"),
                    )
                } else if (c.pe_healthy_min..=c.pe_healthy_max).contains(&value) {
                    (Favorable, format!("P/E ratio ({value:.1}) is in a healthy range"))
                } else {
                    (Neutral, format!("P/E ratio ({value:.1}) is outside the healthy range"))
                }
            }
            Metric::ForwardPe => match trailing_pe {
                Some(trailing) if value > 0.0 && value < trailing => (
                    Favorable,
                    format!("Forward P/E ({value:.1}) below trailing ({trailing:.1}) implies expected earnings growth"),
                ),
                Some(trailing) if value > trailing => (
                    Unfavorable,
                    format!("Forward P/E ({value:.1}) above trailing ({trailing:.1}) implies shrinking earnings"),
                ),
                Some(_) => (Neutral, format!("Forward P/E ({value:.1}) is in line with trailing")),
                None => (
                    Neutral,
                    format!("Forward P/E ({value:.1}) has no trailing figure to compare against"),
                ),
            },
            Metric::PriceToBook => {
                if value <= 0.0 {
                    (Unfavorable, format!("Non-positive price/book ({value:.2}) indicates negative equity"))
                } else if value > c.pb_ceiling {
                    (Unfavorable, format!("High price/book ratio ({value:.2})"))
                } else if value <= c.pb_favorable_max {
                    (Favorable, format!("Low price/book ratio ({value:.2}) suggests value"))
                } else {
                    (Neutral, format!("Price/book ratio ({value:.2}) is moderate"))
                }
            }
            Metric::Roe => {
                if value > c.roe_floor {
                    (Favorable, format!("Strong return on equity ({pct:.1}%)"))
                } else if value < c.roe_poor {
                    (Unfavorable, format!("Weak return on equity ({pct:.1}%)"))
                } else {
                    (Neutral, format!("Moderate return on equity ({pct:.1}%)"))
                }
            }
            Metric::ProfitMargin => {
                if value > c.margin_floor {
                    (Favorable, format!("Healthy profit margin ({pct:.1}%)"))
                } else if value < c.margin_poor {
                    (Unfavorable, format!("Thin profit margin ({pct:.1}%)"))
                } else {
                    (Neutral, format!("Moderate profit margin ({pct:.1}%)"))
                }
            }
            Metric::DividendYield => {
                if value > c.dividend_high {
                    (Favorable, format!("Attractive dividend yield ({pct:.2}%)"))
                } else if value > 0.0 && value < c.dividend_low {
                    (Unfavorable, format!("Low dividend yield ({pct:.2}%)"))
                } else if value <= 0.0 {
                    (Neutral, "No dividend paid".to_string())
                } else {
                    (Neutral, format!("Moderate dividend yield ({pct:.2}%)"))
                }
            }
            Metric::DebtToEquity => {
                if value < c.debt_to_equity_low {
                    (Favorable, format!("Low debt/equity ({value:.2}) indicates a strong balance sheet"))
                } else if value > c.debt_to_equity_ceiling {
                    (Unfavorable, format!("High debt/equity ({value:.2}) indicates leverage risk"))
                } else {
                    (Neutral, format!("Moderate debt/equity ({value:.2})"))
                }
            }
            Metric::CurrentRatio => {
                if value > c.current_ratio_strong {
                    (Favorable, format!("Strong liquidity (current ratio {value:.2})"))
                } else if value < c.current_ratio_weak {
                    (Unfavorable, format!("Weak liquidity (current ratio {value:.2})"))
                } else {
                    (Neutral, format!("Adequate liquidity (current ratio {value:.2})"))
                }
            }
            Metric::Beta => {
                if value < c.beta_low {
                    (Favorable, format!("Low volatility relative to the market (beta {value:.2})"))
                } else if value > c.beta_high {
                    (Unfavorable, format!("High volatility relative to the market (beta {value:.2})"))
                } else {
                    (Neutral, format!("Market-like volatility (beta {value:.2})"))
                }
            }
            Metric::RevenueGrowth | Metric::EarningsGrowth => {
                let label = metric.label();
                if value > c.growth_favorable {
                    (Favorable, format!("Strong {} ({pct:+.1}%)", label.to_lowercase()))
                } else if value < c.growth_unfavorable {
                    (Unfavorable, format!("Declining {} ({pct:+.1}%)", label.to_lowercase()))
                } else {
                    (Neutral, format!("Modest {} ({pct:+.1}%)", label.to_lowercase()))
                }
            }
        }
    }
}
