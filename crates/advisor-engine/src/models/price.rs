//! Price series and technical snapshot types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One OHLCV bar
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: f64,
}

impl PricePoint {
    /// Create a bar
    pub fn new(
        timestamp: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// A bar whose OHLC are all `close`; handy for close-only feeds
    pub fn from_close(timestamp: DateTime<Utc>, close: f64, volume: f64) -> Self {
        Self::new(timestamp, close, close, close, close, volume)
    }

    /// Whether the close is usable for indicator math
    pub fn is_usable(&self) -> bool {
        self.close.is_finite() && self.close > 0.0
    }
}

impl ta::Open for PricePoint {
    fn open(&self) -> f64 {
        self.open
    }
}

impl ta::High for PricePoint {
    fn high(&self) -> f64 {
        // Feeds occasionally leave high/low at zero
        if self.high.is_finite() && self.high >= self.close {
            self.high
        } else {
            self.close
        }
    }
}

impl ta::Low for PricePoint {
    fn low(&self) -> f64 {
        if self.low.is_finite() && self.low > 0.0 && self.low <= self.close {
            self.low
        } else {
            self.close
        }
    }
}

impl ta::Close for PricePoint {
    fn close(&self) -> f64 {
        self.close
    }
}

impl ta::Volume for PricePoint {
    fn volume(&self) -> f64 {
        if self.volume.is_finite() {
            self.volume.max(0.0)
        } else {
            0.0
        }
    }
}

/// Direction of the price trend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Trend {
    Uptrend,
    Downtrend,
    #[default]
    Sideways,
}

impl Trend {
    /// +1 for up, -1 for down, 0 otherwise
    pub fn direction(self) -> f64 {
        match self {
            Trend::Uptrend => 1.0,
            Trend::Downtrend => -1.0,
            Trend::Sideways => 0.0,
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Trend::Uptrend => "UPTREND",
            Trend::Downtrend => "DOWNTREND",
            Trend::Sideways => "SIDEWAYS",
        };
        f.write_str(label)
    }
}

/// Named technical indicators
///
/// Names follow the default windows; the windows themselves are configurable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Indicator {
    #[serde(rename = "SMA20")]
    SmaShort,
    #[serde(rename = "SMA50")]
    SmaMedium,
    #[serde(rename = "SMA200")]
    SmaLong,
    #[serde(rename = "EMA12")]
    EmaFast,
    #[serde(rename = "EMA26")]
    EmaSlow,
    #[serde(rename = "RSI14")]
    Rsi,
    #[serde(rename = "MACD")]
    Macd,
    #[serde(rename = "MACD_SIGNAL")]
    MacdSignal,
    #[serde(rename = "MACD_HIST")]
    MacdHistogram,
    #[serde(rename = "BB_UPPER")]
    BollingerUpper,
    #[serde(rename = "BB_MIDDLE")]
    BollingerMiddle,
    #[serde(rename = "BB_LOWER")]
    BollingerLower,
    #[serde(rename = "BB_PERCENT_B")]
    BollingerPercentB,
    #[serde(rename = "ATR14")]
    Atr,
    #[serde(rename = "ADX14")]
    Adx,
    #[serde(rename = "VOLATILITY_PCT")]
    VolatilityPct,
    #[serde(rename = "MOMENTUM_PCT")]
    MomentumPct,
    #[serde(rename = "VOLUME_RATIO")]
    VolumeRatio,
}

impl Indicator {
    /// Canonical display name, matching the serialized key
    pub fn name(self) -> &'static str {
        match self {
            Indicator::SmaShort => "SMA20",
            Indicator::SmaMedium => "SMA50",
            Indicator::SmaLong => "SMA200",
            Indicator::EmaFast => "EMA12",
            Indicator::EmaSlow => "EMA26",
            Indicator::Rsi => "RSI14",
            Indicator::Macd => "MACD",
            Indicator::MacdSignal => "MACD_SIGNAL",
            Indicator::MacdHistogram => "MACD_HIST",
            Indicator::BollingerUpper => "BB_UPPER",
            Indicator::BollingerMiddle => "BB_MIDDLE",
            Indicator::BollingerLower => "BB_LOWER",
            Indicator::BollingerPercentB => "BB_PERCENT_B",
            Indicator::Atr => "ATR14",
            Indicator::Adx => "ADX14",
            Indicator::VolatilityPct => "VOLATILITY_PCT",
            Indicator::MomentumPct => "MOMENTUM_PCT",
            Indicator::VolumeRatio => "VOLUME_RATIO",
        }
    }
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Indicator values keyed by [`Indicator`]; absent means unavailable
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndicatorSet(BTreeMap<Indicator, f64>);

impl IndicatorSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a value; non-finite values are treated as unavailable
    pub fn insert(&mut self, indicator: Indicator, value: f64) {
        if value.is_finite() {
            self.0.insert(indicator, value);
        }
    }

    pub fn get(&self, indicator: Indicator) -> Option<f64> {
        self.0.get(&indicator).copied()
    }

    pub fn contains(&self, indicator: Indicator) -> bool {
        self.0.contains_key(&indicator)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Indicator, f64)> + '_ {
        self.0.iter().map(|(k, v)| (*k, *v))
    }
}

/// Indicators derived from one price series
///
/// Built once per series by the technical analyzer and never mutated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TechnicalSnapshot {
    pub indicators: IndicatorSet,
    pub trend: Trend,
    pub last_close: Option<f64>,
    /// Usable points after sanitizing
    pub data_points: usize,
    /// Intervals wider than the gap tolerance
    pub gaps: usize,
    pub macd_bullish_cross: bool,
    pub macd_bearish_cross: bool,
    /// Directional trend with ADX above the strength threshold
    pub strong_trend: bool,
}

impl TechnicalSnapshot {
    pub fn get(&self, indicator: Indicator) -> Option<f64> {
        self.indicators.get(indicator)
    }
}
