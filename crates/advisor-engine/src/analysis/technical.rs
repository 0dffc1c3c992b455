//! Technical analyzer: price series to technical sub-score

use tracing::debug;

use super::indicators::{self, BollingerReading, MacdReading};
use crate::config::TechnicalConfig;
use crate::models::{
    Domain, Factor, Indicator, IndicatorSet, Judgment, PricePoint, SubScore, TechnicalSnapshot,
    Trend,
};

/// %B at or below this reads as "near the lower band"
pub const NEAR_LOWER_BAND: f64 = 0.1;
/// %B at or above this reads as "near the upper band"
pub const NEAR_UPPER_BAND: f64 = 0.9;
/// Trend signal magnitude when ADX does not confirm the trend
const WEAK_TREND_SIGNAL: f64 = 0.6;

/// Output of [`TechnicalAnalyzer`]
#[derive(Debug, Clone, PartialEq)]
pub struct TechnicalAnalysis {
    pub snapshot: TechnicalSnapshot,
    pub score: SubScore,
}

/// Converts a price/volume series into indicators and a sub-score
#[derive(Debug, Clone, Default)]
pub struct TechnicalAnalyzer {
    config: TechnicalConfig,
}

impl TechnicalAnalyzer {
    pub fn new(config: TechnicalConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TechnicalConfig {
        &self.config
    }

    /// Compute the snapshot and sub-score for a series
    ///
    /// Never fails: unusable bars are dropped, indicators whose lookback is
    /// not met are left out, and fewer than two usable bars gives a neutral
    /// score with zero confidence.
    pub fn analyze(&self, points: &[PricePoint]) -> TechnicalAnalysis {
        let bars = sanitize(points);
        let config = &self.config;

        let mut snapshot = TechnicalSnapshot {
            last_close: bars.last().map(|b| b.close),
            data_points: bars.len(),
            ..TechnicalSnapshot::default()
        };

        if bars.len() < 2 {
            debug!(
                supplied = points.len(),
                usable = bars.len(),
                "too few price points for technical analysis"
            );
            return TechnicalAnalysis {
                snapshot,
                score: SubScore::neutral(Domain::Technical),
            };
        }

        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let volumes: Vec<f64> = bars.iter().map(|b| ta::Volume::volume(b)).collect();
        let timestamps: Vec<_> = bars.iter().map(|b| b.timestamp).collect();
        let last_close = closes[closes.len() - 1];

        snapshot.gaps = indicators::count_gaps(&timestamps, config.gap_tolerance);
        snapshot.indicators = compute_indicators(&bars, &closes, &volumes, config);
        snapshot.trend = classify_trend(&closes, config);
        snapshot.strong_trend = snapshot.trend != Trend::Sideways
            && snapshot
                .get(Indicator::Adx)
                .is_some_and(|adx| adx > config.strong_trend_adx);

        let macd = indicators::macd(&closes, config.ema_fast, config.ema_slow, config.macd_signal);
        if let Some(reading) = macd {
            snapshot.macd_bullish_cross = reading.bullish_cross();
            snapshot.macd_bearish_cross = reading.bearish_cross();
        }
        let bands = indicators::bollinger(&closes, config.bollinger_period, config.bollinger_std_dev);

        let trend_available = closes.len() >= config.sma_short + config.slope_lookback;
        let factors = build_factors(
            &snapshot,
            macd,
            bands,
            last_close,
            trend_available,
            config,
        );

        let available_weight: f64 = factors.iter().map(|f| f.weight).sum();
        let coverage = available_weight / config.weights.total();
        let intervals = (bars.len() - 1) as f64;
        let gap_factor = 1.0 - 0.5 * (snapshot.gaps as f64 / intervals);
        let kept_fraction = bars.len() as f64 / points.len().max(1) as f64;
        let confidence = coverage * gap_factor * kept_fraction;

        let score = SubScore::from_factors(Domain::Technical, factors, confidence);

        debug!(
            data_points = snapshot.data_points,
            gaps = snapshot.gaps,
            trend = %snapshot.trend,
            value = score.value,
            confidence = score.confidence,
            "technical analysis complete"
        );

        TechnicalAnalysis { snapshot, score }
    }
}

/// Drop unusable bars, order by time and keep the last bar per timestamp
fn sanitize(points: &[PricePoint]) -> Vec<PricePoint> {
    let mut usable: Vec<PricePoint> = points.iter().filter(|p| p.is_usable()).copied().collect();
    usable.sort_by_key(|p| p.timestamp);

    let mut bars: Vec<PricePoint> = Vec::with_capacity(usable.len());
    for bar in usable {
        match bars.last_mut() {
            Some(last) if last.timestamp == bar.timestamp => *last = bar,
            _ => bars.push(bar),
        }
    }

    if bars.len() < points.len() {
        debug!(
            supplied = points.len(),
            kept = bars.len(),
            "dropped unusable or duplicate price points"
        );
    }
    bars
}

fn compute_indicators(
    bars: &[PricePoint],
    closes: &[f64],
    volumes: &[f64],
    config: &TechnicalConfig,
) -> IndicatorSet {
    let mut set = IndicatorSet::new();
    let mut put = |indicator: Indicator, value: Option<f64>| {
        if let Some(value) = value {
            set.insert(indicator, value);
        }
    };

    put(Indicator::SmaShort, indicators::sma(closes, config.sma_short));
    put(Indicator::SmaMedium, indicators::sma(closes, config.sma_medium));
    put(Indicator::SmaLong, indicators::sma(closes, config.sma_long));
    put(Indicator::EmaFast, indicators::ema(closes, config.ema_fast));
    put(Indicator::EmaSlow, indicators::ema(closes, config.ema_slow));
    put(Indicator::Rsi, indicators::rsi(closes, config.rsi_period));

    if let Some(reading) =
        indicators::macd(closes, config.ema_fast, config.ema_slow, config.macd_signal)
    {
        put(Indicator::Macd, Some(reading.macd));
        put(Indicator::MacdSignal, Some(reading.signal));
        put(Indicator::MacdHistogram, Some(reading.histogram));
    }

    if let Some(bands) =
        indicators::bollinger(closes, config.bollinger_period, config.bollinger_std_dev)
    {
        put(Indicator::BollingerUpper, Some(bands.upper));
        put(Indicator::BollingerMiddle, Some(bands.middle));
        put(Indicator::BollingerLower, Some(bands.lower));
        put(Indicator::BollingerPercentB, Some(bands.percent_b));
    }

    let atr = indicators::atr(bars, config.atr_period);
    put(Indicator::Atr, atr);
    put(Indicator::Adx, indicators::adx(bars, config.adx_period));
    let last_close = closes.last().copied().unwrap_or_default();
    put(
        Indicator::VolatilityPct,
        atr.filter(|_| last_close > 0.0).map(|a| a / last_close * 100.0),
    );
    put(
        Indicator::MomentumPct,
        indicators::momentum_pct(closes, config.momentum_lookback),
    );
    put(
        Indicator::VolumeRatio,
        indicators::volume_ratio(volumes, config.volume_period),
    );

    set
}

/// Trend from price against the medium SMA and that SMA's slope
///
/// Falls back to the short SMA when the series is too short for the medium
/// one.
fn classify_trend(closes: &[f64], config: &TechnicalConfig) -> Trend {
    let Some(&last) = closes.last() else {
        return Trend::Sideways;
    };
    let lookback = config.slope_lookback;
    let long_enough = |period: usize| closes.len() >= period + lookback;

    let medium = indicators::sma_series(closes, config.sma_medium)
        .filter(|_| long_enough(config.sma_medium));
    let short = indicators::sma_series(closes, config.sma_short)
        .filter(|_| long_enough(config.sma_short));

    let (anchor, fast) = match (medium, short) {
        (Some(medium), short) => (medium, short.and_then(|s| s.last().copied())),
        (None, Some(short)) => (short, None),
        (None, None) => return Trend::Sideways,
    };

    let current = anchor[anchor.len() - 1];
    let previous = anchor[anchor.len() - 1 - lookback];
    let tolerance = current.abs() * 1e-9;
    let slope = current - previous;

    let fast_above = fast.is_none_or(|f| f > current);
    let fast_below = fast.is_none_or(|f| f < current);

    if last > current && slope > tolerance && fast_above {
        Trend::Uptrend
    } else if last < current && slope < -tolerance && fast_below {
        Trend::Downtrend
    } else {
        Trend::Sideways
    }
}

fn build_factors(
    snapshot: &TechnicalSnapshot,
    macd: Option<MacdReading>,
    bands: Option<BollingerReading>,
    last_close: f64,
    trend_available: bool,
    config: &TechnicalConfig,
) -> Vec<Factor> {
    let weights = &config.weights;
    let mut factors = Vec::new();

    if let Some(rsi) = snapshot.get(Indicator::Rsi) {
        factors.push(rsi_factor(rsi, weights.rsi, config));
    }

    if let Some(reading) = macd {
        factors.push(macd_factor(&reading, weights.macd, last_close.abs() * 1e-9));
    }

    let sma_reference = snapshot
        .get(Indicator::SmaMedium)
        .map(|v| (v, config.sma_medium))
        .or_else(|| {
            snapshot
                .get(Indicator::SmaShort)
                .map(|v| (v, config.sma_short))
        });
    if let Some((sma, period)) = sma_reference.filter(|(sma, _)| *sma > 0.0) {
        let distance_pct = (last_close / sma - 1.0) * 100.0;
        let signal = distance_pct / config.sma_distance_saturation_pct;
        let side = if distance_pct >= 0.0 { "above" } else { "below" };
        factors.push(Factor::new(
            format!("Price vs SMA{period}"),
            weights.price_vs_sma,
            Some(distance_pct),
            signal,
            format!(
                "Price is {:.1}% {side} its {period}-period moving average",
                distance_pct.abs()
            ),
        ));
    }

    if trend_available {
        let adx = snapshot.get(Indicator::Adx);
        let description = match (snapshot.trend, snapshot.strong_trend) {
            (Trend::Uptrend, true) => "Strong uptrend in price action".to_string(),
            (Trend::Downtrend, true) => "Strong downtrend in price action".to_string(),
            (Trend::Uptrend, false) => "Price is in an uptrend".to_string(),
            (Trend::Downtrend, false) => "Price is in a downtrend".to_string(),
            (Trend::Sideways, _) => "Price is moving sideways".to_string(),
        };
        let description = match adx {
            Some(adx) if snapshot.trend != Trend::Sideways => {
                format!("{description} (ADX {adx:.1})")
            }
            _ => description,
        };
        let strength = if snapshot.strong_trend { 1.0 } else { WEAK_TREND_SIGNAL };
        factors.push(Factor::new(
            "Trend",
            weights.trend,
            adx,
            snapshot.trend.direction() * strength,
            description,
        ));
    }

    if let Some(bands) = bands {
        let percent_b = bands.percent_b;
        let description = if percent_b <= NEAR_LOWER_BAND {
            "Price is near the lower Bollinger band, potential bounce point".to_string()
        } else if percent_b >= NEAR_UPPER_BAND {
            "Price is near the upper Bollinger band, may face selling pressure".to_string()
        } else {
            format!("Price is inside the Bollinger bands (%B {percent_b:.2})")
        };
        factors.push(Factor::new(
            "Bollinger %B",
            weights.bollinger,
            Some(percent_b),
            1.0 - 2.0 * percent_b,
            description,
        ));
    }

    if let Some(momentum) = snapshot.get(Indicator::MomentumPct) {
        let direction = if momentum >= 0.0 { "gaining" } else { "losing" };
        factors.push(Factor::new(
            "Momentum",
            weights.momentum,
            Some(momentum),
            momentum / config.momentum_saturation_pct,
            format!(
                "Price has been {direction} {:.2}% per bar over the last {} bars",
                momentum.abs(),
                config.momentum_lookback
            ),
        ));
    }

    if let Some(ratio) = snapshot.get(Indicator::VolumeRatio) {
        let (signal, description) = match snapshot.trend {
            Trend::Uptrend if ratio > 1.0 => (
                0.5,
                format!("Above-average volume ({ratio:.2}x) confirms the uptrend"),
            ),
            Trend::Downtrend if ratio > 1.0 => (
                -0.5,
                format!("Above-average volume ({ratio:.2}x) confirms the downtrend"),
            ),
            _ => (0.0, format!("Volume is {ratio:.2}x its recent average")),
        };
        factors.push(Factor::new("Volume", weights.volume, Some(ratio), signal, description));
    }

    if let Some(volatility) = snapshot.get(Indicator::VolatilityPct) {
        factors.push(Factor::new(
            "Volatility",
            0.0,
            Some(volatility),
            0.0,
            format!("Average true range is {volatility:.2}% of price"),
        ));
    }

    factors
}

fn rsi_factor(rsi: f64, weight: f64, config: &TechnicalConfig) -> Factor {
    let (signal, judgment, description) = if rsi < config.rsi_oversold {
        (
            1.0,
            Judgment::Favorable,
            format!("RSI indicates oversold condition ({rsi:.1})"),
        )
    } else if rsi > config.rsi_overbought {
        (
            -1.0,
            Judgment::Unfavorable,
            format!("RSI indicates overbought condition ({rsi:.1})"),
        )
    } else {
        (
            (50.0 - rsi) / 40.0,
            Judgment::Neutral,
            format!("RSI is neutral ({rsi:.1})"),
        )
    };
    Factor::new("RSI", weight, Some(rsi), signal, description).with_judgment(judgment)
}

/// `flat` absorbs rounding noise so a constant series reads as no signal
fn macd_factor(reading: &MacdReading, weight: f64, flat: f64) -> Factor {
    let histogram = reading.histogram;
    let (signal, description) = if histogram.abs() <= flat {
        (0.0, "MACD is flat against its signal line".to_string())
    } else if reading.bullish_cross() {
        (
            1.0,
            "Recent MACD bullish crossover suggests upward momentum".to_string(),
        )
    } else if reading.bearish_cross() {
        (
            -1.0,
            "Recent MACD bearish crossover suggests downward momentum".to_string(),
        )
    } else if histogram > 0.0 {
        (
            0.5,
            format!("MACD is above its signal line (histogram {histogram:+.3})"),
        )
    } else {
        (
            -0.5,
            format!("MACD is below its signal line (histogram {histogram:+.3})"),
        )
    };
    Factor::new("MACD", weight, Some(histogram), signal, description)
}
