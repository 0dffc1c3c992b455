//! Company fundamental metrics

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Fundamental ratios the analyzer knows how to judge
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    PeRatio,
    ForwardPe,
    PriceToBook,
    Roe,
    ProfitMargin,
    DividendYield,
    DebtToEquity,
    CurrentRatio,
    Beta,
    RevenueGrowth,
    EarningsGrowth,
}

impl Metric {
    /// Every metric, in judgment order
    pub const ALL: [Metric; 11] = [
        Metric::PeRatio,
        Metric::ForwardPe,
        Metric::PriceToBook,
        Metric::Roe,
        Metric::ProfitMargin,
        Metric::DividendYield,
        Metric::DebtToEquity,
        Metric::CurrentRatio,
        Metric::Beta,
        Metric::RevenueGrowth,
        Metric::EarningsGrowth,
    ];

    /// Human readable label used in rationale text
    pub fn label(self) -> &'static str {
        match self {
            Metric::PeRatio => "P/E ratio",
            Metric::ForwardPe => "Forward P/E",
            Metric::PriceToBook => "Price/Book",
            Metric::Roe => "Return on equity",
            Metric::ProfitMargin => "Profit margin",
            Metric::DividendYield => "Dividend yield",
            Metric::DebtToEquity => "Debt/Equity",
            Metric::CurrentRatio => "Current ratio",
            Metric::Beta => "Beta",
            Metric::RevenueGrowth => "Revenue growth",
            Metric::EarningsGrowth => "Earnings growth",
        }
    }

    /// Canonical snake_case key, as serialized
    pub fn key(self) -> &'static str {
        match self {
            Metric::PeRatio => "pe_ratio",
            Metric::ForwardPe => "forward_pe",
            Metric::PriceToBook => "price_to_book",
            Metric::Roe => "roe",
            Metric::ProfitMargin => "profit_margin",
            Metric::DividendYield => "dividend_yield",
            Metric::DebtToEquity => "debt_to_equity",
            Metric::CurrentRatio => "current_ratio",
            Metric::Beta => "beta",
            Metric::RevenueGrowth => "revenue_growth",
            Metric::EarningsGrowth => "earnings_growth",
        }
    }

    /// Parse a provider field name, accepting the common aliases
    pub fn from_name(name: &str) -> Option<Self> {
        let normalized = name.trim().to_ascii_lowercase().replace(&['-', ' ', '/'][..], "_");
        let metric = match normalized.as_str() {
            "pe_ratio" | "pe" | "trailing_pe" | "p_e" => Metric::PeRatio,
            "forward_pe" => Metric::ForwardPe,
            "price_to_book" | "pb_ratio" | "pb" => Metric::PriceToBook,
            "roe" | "return_on_equity" => Metric::Roe,
            "profit_margin" | "profit_margins" | "net_margin" => Metric::ProfitMargin,
            "dividend_yield" => Metric::DividendYield,
            "debt_to_equity" | "de_ratio" => Metric::DebtToEquity,
            "current_ratio" => Metric::CurrentRatio,
            "beta" => Metric::Beta,
            "revenue_growth" => Metric::RevenueGrowth,
            "earnings_growth" | "eps_growth" => Metric::EarningsGrowth,
            _ => return None,
        };
        Some(metric)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Snapshot of company ratios; any metric may be missing
///
/// Deserializes from a flat JSON object whose keys go through
/// [`Metric::from_name`]. Unknown keys and non-numeric values are ignored,
/// `null` means "not reported", and a canonical key beats its aliases.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, Value>")]
pub struct FundamentalMetrics {
    pub pe_ratio: Option<f64>,
    pub forward_pe: Option<f64>,
    pub price_to_book: Option<f64>,
    pub roe: Option<f64>,
    pub profit_margin: Option<f64>,
    pub dividend_yield: Option<f64>,
    pub debt_to_equity: Option<f64>,
    pub current_ratio: Option<f64>,
    pub beta: Option<f64>,
    pub revenue_growth: Option<f64>,
    pub earnings_growth: Option<f64>,
}

impl FundamentalMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(name, value)` pairs, dropping names we do not recognize
    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, Option<f64>)>,
    {
        let mut entries: Vec<(Metric, bool, f64)> = Vec::new();
        for (name, value) in pairs {
            let Some(metric) = Metric::from_name(name) else {
                tracing::debug!(name, "ignoring unsupported fundamental metric");
                continue;
            };
            if let Some(value) = value {
                entries.push((metric, name == metric.key(), value));
            }
        }
        // Aliases first so canonical keys overwrite them
        entries.sort_by_key(|(_, canonical, _)| *canonical);

        let mut metrics = Self::default();
        for (metric, _, value) in entries {
            metrics.set(metric, Some(value));
        }
        metrics
    }

    /// Builder-style setter
    pub fn with(mut self, metric: Metric, value: f64) -> Self {
        self.set(metric, Some(value));
        self
    }

    pub fn set(&mut self, metric: Metric, value: Option<f64>) {
        *self.slot_mut(metric) = value;
    }

    /// Reported value, with non-finite numbers treated as missing
    pub fn get(&self, metric: Metric) -> Option<f64> {
        let value = match metric {
            Metric::PeRatio => self.pe_ratio,
            Metric::ForwardPe => self.forward_pe,
            Metric::PriceToBook => self.price_to_book,
            Metric::Roe => self.roe,
            Metric::ProfitMargin => self.profit_margin,
            Metric::DividendYield => self.dividend_yield,
            Metric::DebtToEquity => self.debt_to_equity,
            Metric::CurrentRatio => self.current_ratio,
            Metric::Beta => self.beta,
            Metric::RevenueGrowth => self.revenue_growth,
            Metric::EarningsGrowth => self.earnings_growth,
        };
        value.filter(|v| v.is_finite())
    }

    /// Number of usable metrics
    pub fn present_count(&self) -> usize {
        Metric::ALL.iter().filter(|m| self.get(**m).is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.present_count() == 0
    }

    fn slot_mut(&mut self, metric: Metric) -> &mut Option<f64> {
        match metric {
            Metric::PeRatio => &mut self.pe_ratio,
            Metric::ForwardPe => &mut self.forward_pe,
            Metric::PriceToBook => &mut self.price_to_book,
            Metric::Roe => &mut self.roe,
            Metric::ProfitMargin => &mut self.profit_margin,
            Metric::DividendYield => &mut self.dividend_yield,
            Metric::DebtToEquity => &mut self.debt_to_equity,
            Metric::CurrentRatio => &mut self.current_ratio,
            Metric::Beta => &mut self.beta,
            Metric::RevenueGrowth => &mut self.revenue_growth,
            Metric::EarningsGrowth => &mut self.earnings_growth,
        }
    }
}

impl From<BTreeMap<String, Value>> for FundamentalMetrics {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Self::from_pairs(map.iter().map(|(name, value)| {
            let number = match value {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.trim().parse().ok(),
                _ => None,
            };
            (name.as_str(), number)
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_ignores_unknown_and_accepts_aliases() {
        let json = r#"{
            "trailing_pe": 18.5,
            "roe": null,
            "profit_margins": 0.21,
            "ebitda_multiple": 12.0
        }"#;
        let metrics: FundamentalMetrics = serde_json::from_str(json).unwrap();
        assert_eq!(metrics.get(Metric::PeRatio), Some(18.5));
        assert_eq!(metrics.get(Metric::Roe), None);
        assert_eq!(metrics.get(Metric::ProfitMargin), Some(0.21));
        assert_eq!(metrics.present_count(), 2);
    }

    #[test]
    fn test_deserialize_shares_alias_table() {
        let json = r#"{
            "eps_growth": 0.12,
            "net_margin": "0.18",
            "de_ratio": 0.7,
            "sector": "Technology"
        }"#;
        let metrics: FundamentalMetrics = serde_json::from_str(json).unwrap();
        assert_eq!(metrics.get(Metric::EarningsGrowth), Some(0.12));
        assert_eq!(metrics.get(Metric::ProfitMargin), Some(0.18));
        assert_eq!(metrics.get(Metric::DebtToEquity), Some(0.7));
        assert_eq!(metrics.present_count(), 3);
    }

    #[test]
    fn test_canonical_key_beats_alias() {
        let json = r#"{"pe_ratio": 20.0, "trailing_pe": 25.0, "pe": 30.0}"#;
        let metrics: FundamentalMetrics = serde_json::from_str(json).unwrap();
        assert_eq!(metrics.get(Metric::PeRatio), Some(20.0));

        // A null canonical value leaves the alias in place
        let json = r#"{"roe": null, "return_on_equity": 0.2}"#;
        let metrics: FundamentalMetrics = serde_json::from_str(json).unwrap();
        assert_eq!(metrics.get(Metric::Roe), Some(0.2));
    }

    #[test]
    fn test_serialize_round_trip() {
        let metrics = FundamentalMetrics::new()
            .with(Metric::PeRatio, 18.0)
            .with(Metric::Beta, 1.1);
        let json = serde_json::to_string(&metrics).unwrap();
        assert!(json.contains("\"pe_ratio\":18.0"));
        let parsed: FundamentalMetrics = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, metrics);
    }

    #[test]
    fn test_from_pairs() {
        let metrics = FundamentalMetrics::from_pairs([
            ("P/E", Some(12.0)),
            ("Debt-to-Equity", Some(0.4)),
            ("moat_score", Some(9.0)),
        ]);
        assert_eq!(metrics.get(Metric::PeRatio), Some(12.0));
        assert_eq!(metrics.get(Metric::DebtToEquity), Some(0.4));
        assert_eq!(metrics.present_count(), 2);
    }

    #[test]
    fn test_non_finite_counts_as_missing() {
        let metrics = FundamentalMetrics::new().with(Metric::Beta, f64::INFINITY);
        assert_eq!(metrics.get(Metric::Beta), None);
        assert!(metrics.is_empty());
    }
}
