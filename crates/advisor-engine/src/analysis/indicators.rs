//! Indicator math over price series
//!
//! Pure functions, no I/O. Moving averages, Bollinger Bands, ATR and MACD are
//! driven through the `ta` crate. RSI and ADX are computed here: both need
//! Wilder's smoothing (alpha = 1/period), and `ta` has no ADX at all.
//!
//! Every function returns `None` when the series is shorter than its lookback.

use chrono::{DateTime, Utc};
use ta::{High, Low, Next};
use ta::indicators::{
    AverageTrueRange, BollingerBands, ExponentialMovingAverage,
    MovingAverageConvergenceDivergence, SimpleMovingAverage,
};

use crate::error::AdvisorError;
use crate::models::PricePoint;

/// Relative band width under which Bollinger %B is reported as 0.5
const FLAT_BAND_EPSILON: f64 = 1e-12;

/// Latest MACD line, signal and histogram plus the previous bar's values
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacdReading {
    pub macd: f64,
    pub signal: f64,
    pub histogram: f64,
    pub prev_macd: f64,
    pub prev_signal: f64,
}

impl MacdReading {
    /// MACD line crossed above the signal line on the last bar
    pub fn bullish_cross(&self) -> bool {
        self.prev_macd < self.prev_signal && self.macd > self.signal
    }

    /// MACD line crossed below the signal line on the last bar
    pub fn bearish_cross(&self) -> bool {
        self.prev_macd > self.prev_signal && self.macd < self.signal
    }
}

/// Latest Bollinger Band values
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BollingerReading {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
    /// Position of the close inside the bands: 0 at lower, 1 at upper
    pub percent_b: f64,
}

fn build<T>(indicator: Result<T, ta::errors::TaError>, name: &str) -> Option<T> {
    indicator
        .map_err(|e| {
            let err = AdvisorError::from(e);
            tracing::warn!(indicator = name, error = %err, "indicator unavailable");
        })
        .ok()
}

/// Simple moving average for every bar; entries before `period - 1` are
/// warm-up values and should not be read
pub fn sma_series(values: &[f64], period: usize) -> Option<Vec<f64>> {
    if period == 0 || values.len() < period {
        return None;
    }
    let mut sma = build(SimpleMovingAverage::new(period), "SMA")?;
    Some(values.iter().map(|v| sma.next(*v)).collect())
}

/// Simple moving average of the last `period` values
pub fn sma(values: &[f64], period: usize) -> Option<f64> {
    sma_series(values, period)?.last().copied()
}

/// Exponential moving average at the last value
pub fn ema(values: &[f64], period: usize) -> Option<f64> {
    if period == 0 || values.len() < period {
        return None;
    }
    let mut ema = build(ExponentialMovingAverage::new(period), "EMA")?;
    values.iter().fold(None, |_, v| Some(ema.next(*v)))
}

/// Relative Strength Index with Wilder smoothing
///
/// Needs `period + 1` closes. A series with no movement at all reads 50.
pub fn rsi(closes: &[f64], period: usize) -> Option<f64> {
    if period == 0 || closes.len() < period + 1 {
        return None;
    }

    let changes: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();
    let period_f = period as f64;

    let (mut avg_gain, mut avg_loss) = changes[..period]
        .iter()
        .fold((0.0, 0.0), |(gain, loss), change| {
            (gain + change.max(0.0), loss + (-change).max(0.0))
        });
    avg_gain /= period_f;
    avg_loss /= period_f;

    for change in &changes[period..] {
        avg_gain = (avg_gain * (period_f - 1.0) + change.max(0.0)) / period_f;
        avg_loss = (avg_loss * (period_f - 1.0) + (-change).max(0.0)) / period_f;
    }

    let value = if avg_gain + avg_loss <= 0.0 {
        50.0
    } else if avg_loss <= 0.0 {
        100.0
    } else {
        let rs = avg_gain / avg_loss;
        100.0 - 100.0 / (1.0 + rs)
    };

    Some(value.clamp(0.0, 100.0))
}

/// MACD line, signal and histogram; needs `slow + signal` closes
pub fn macd(closes: &[f64], fast: usize, slow: usize, signal: usize) -> Option<MacdReading> {
    if fast == 0 || slow == 0 || signal == 0 || closes.len() < slow + signal {
        return None;
    }
    let mut indicator = build(
        MovingAverageConvergenceDivergence::new(fast, slow, signal),
        "MACD",
    )?;

    let outputs: Vec<_> = closes.iter().map(|c| indicator.next(*c)).collect();
    let last = outputs.last()?;
    let prev = outputs.get(outputs.len().checked_sub(2)?)?;

    Some(MacdReading {
        macd: last.macd,
        signal: last.signal,
        histogram: last.histogram,
        prev_macd: prev.macd,
        prev_signal: prev.signal,
    })
}

/// Bollinger Bands at the last close
pub fn bollinger(closes: &[f64], period: usize, std_dev: f64) -> Option<BollingerReading> {
    if period == 0 || closes.len() < period {
        return None;
    }
    let mut bands = build(BollingerBands::new(period, std_dev), "Bollinger Bands")?;
    let output = closes.iter().fold(None, |_, c| Some(bands.next(*c)))?;
    let close = *closes.last()?;

    let width = output.upper - output.lower;
    let percent_b = if width.abs() <= FLAT_BAND_EPSILON * output.average.abs().max(1.0) {
        0.5
    } else {
        (close - output.lower) / width
    };

    Some(BollingerReading {
        upper: output.upper,
        middle: output.average,
        lower: output.lower,
        percent_b,
    })
}

/// Average True Range at the last bar
pub fn atr(bars: &[PricePoint], period: usize) -> Option<f64> {
    if period == 0 || bars.len() < period {
        return None;
    }
    let mut atr = build(AverageTrueRange::new(period), "ATR")?;
    bars.iter().fold(None, |_, bar| Some(atr.next(bar)))
}

/// Average Directional Index with Wilder smoothing
///
/// Needs `2 * period` bars: `period` moves seed the directional averages and
/// `period` DX values seed the ADX. Reads 0 when price never moves.
pub fn adx(bars: &[PricePoint], period: usize) -> Option<f64> {
    if period == 0 || bars.len() < 2 * period {
        return None;
    }

    let moves: Vec<(f64, f64)> = bars
        .windows(2)
        .map(|w| {
            let up = w[1].high() - w[0].high();
            let down = w[0].low() - w[1].low();
            let plus_dm = if up > down && up > 0.0 { up } else { 0.0 };
            let minus_dm = if down > up && down > 0.0 { down } else { 0.0 };
            (plus_dm, minus_dm)
        })
        .collect();

    let period_f = period as f64;
    let wilder = |avg: f64, value: f64| (avg * (period_f - 1.0) + value) / period_f;
    // DI+ and DI- share the true-range denominator, so it cancels in DX
    let dx = |plus: f64, minus: f64| {
        let sum = plus + minus;
        if sum > 0.0 { (plus - minus).abs() / sum * 100.0 } else { 0.0 }
    };

    let (seed, rest) = moves.split_at(period);
    let mut plus = seed.iter().map(|m| m.0).sum::<f64>() / period_f;
    let mut minus = seed.iter().map(|m| m.1).sum::<f64>() / period_f;

    let mut dx_values = Vec::with_capacity(rest.len() + 1);
    dx_values.push(dx(plus, minus));
    for &(plus_dm, minus_dm) in rest {
        plus = wilder(plus, plus_dm);
        minus = wilder(minus, minus_dm);
        dx_values.push(dx(plus, minus));
    }

    let (seed_dx, rest_dx) = dx_values.split_at(period);
    let initial = seed_dx.iter().sum::<f64>() / period_f;
    let value = rest_dx.iter().fold(initial, |avg, v| wilder(avg, *v));
    Some(value.clamp(0.0, 100.0))
}

/// Mean close-to-close return over the last `lookback` bars, in percent
pub fn momentum_pct(closes: &[f64], lookback: usize) -> Option<f64> {
    if lookback == 0 || closes.len() < lookback + 1 {
        return None;
    }
    let tail = &closes[closes.len() - lookback - 1..];
    let total: f64 = tail
        .windows(2)
        .filter(|w| w[0] > 0.0)
        .map(|w| (w[1] / w[0] - 1.0) * 100.0)
        .sum();
    Some(total / lookback as f64)
}

/// Last volume divided by the mean of the `period` volumes before it
pub fn volume_ratio(volumes: &[f64], period: usize) -> Option<f64> {
    if period == 0 || volumes.len() < period + 1 {
        return None;
    }
    let (last, history) = volumes.split_last()?;
    let window = &history[history.len() - period..];
    let mean = window.iter().sum::<f64>() / period as f64;
    if mean > 0.0 { Some(last / mean) } else { None }
}

/// Count intervals wider than `tolerance` times the median interval
pub fn count_gaps(timestamps: &[DateTime<Utc>], tolerance: f64) -> usize {
    let mut intervals: Vec<i64> = timestamps
        .windows(2)
        .map(|w| (w[1] - w[0]).num_seconds())
        .collect();
    if intervals.is_empty() {
        return 0;
    }

    let mut sorted = intervals.clone();
    sorted.sort_unstable();
    let median = sorted[sorted.len() / 2] as f64;
    if median <= 0.0 {
        return 0;
    }

    intervals.retain(|i| *i as f64 > median * tolerance);
    intervals.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_sma_requires_full_window() {
        assert_eq!(sma(&[1.0, 2.0], 3), None);
        assert!(approx(sma(&[1.0, 2.0, 3.0, 4.0], 3).unwrap(), 3.0));
    }

    #[test]
    fn test_ema_of_constant_series() {
        let closes = vec![10.0; 30];
        assert!(approx(ema(&closes, 12).unwrap(), 10.0));
        assert_eq!(ema(&closes[..5], 12), None);
    }

    #[test]
    fn test_rsi_all_gains() {
        let closes: Vec<f64> = (1..=20).map(f64::from).collect();
        assert_eq!(rsi(&closes, 14), Some(100.0));
    }

    #[test]
    fn test_rsi_all_losses() {
        let closes: Vec<f64> = (1..=20).rev().map(f64::from).collect();
        assert_eq!(rsi(&closes, 14), Some(0.0));
    }

    #[test]
    fn test_rsi_flat_series_is_neutral() {
        let closes = vec![42.0; 30];
        assert_eq!(rsi(&closes, 14), Some(50.0));
    }

    #[test]
    fn test_rsi_insufficient_data() {
        let closes = vec![1.0; 14];
        assert_eq!(rsi(&closes, 14), None);
    }

    #[test]
    fn test_rsi_alternating_is_balanced() {
        let closes: Vec<f64> = (0..40)
            .map(|i| if i % 2 == 0 { 100.0 } else { 101.0 })
            .collect();
        let value = rsi(&closes, 14).unwrap();
        assert!((40.0..=60.0).contains(&value), "rsi = {value}");
    }

    #[test]
    fn test_macd_flat_prices() {
        let closes = vec![50.0; 40];
        let reading = macd(&closes, 12, 26, 9).unwrap();
        assert!(approx(reading.macd, 0.0));
        assert!(approx(reading.histogram, 0.0));
        assert!(!reading.bullish_cross());
        assert!(!reading.bearish_cross());
    }

    #[test]
    fn test_macd_insufficient_data() {
        let closes = vec![50.0; 34];
        assert_eq!(macd(&closes, 12, 26, 9), None);
    }

    #[test]
    fn test_macd_crossovers() {
        let up = MacdReading {
            macd: 1.0,
            signal: 0.5,
            histogram: 0.5,
            prev_macd: 0.2,
            prev_signal: 0.4,
        };
        assert!(up.bullish_cross());
        let down = MacdReading {
            macd: 0.1,
            signal: 0.5,
            histogram: -0.4,
            prev_macd: 0.6,
            prev_signal: 0.5,
        };
        assert!(down.bearish_cross());
    }

    #[test]
    fn test_bollinger_flat_prices() {
        let closes = vec![20.0; 25];
        let bands = bollinger(&closes, 20, 2.0).unwrap();
        assert!(approx(bands.upper, 20.0));
        assert!(approx(bands.lower, 20.0));
        assert_eq!(bands.percent_b, 0.5);
    }

    #[test]
    fn test_bollinger_position() {
        let mut closes: Vec<f64> = (0..20).map(|i| 100.0 + f64::from(i % 3)).collect();
        closes.push(90.0);
        let bands = bollinger(&closes, 20, 2.0).unwrap();
        assert!(bands.upper > bands.middle && bands.middle > bands.lower);
        assert!(bands.percent_b < 0.0);
    }

    #[test]
    fn test_atr_of_constant_range() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let bars: Vec<PricePoint> = (0..20)
            .map(|i| {
                PricePoint::new(start + Duration::days(i), 10.0, 11.0, 9.0, 10.0, 1_000.0)
            })
            .collect();
        assert!(approx(atr(&bars, 14).unwrap(), 2.0));
        assert_eq!(atr(&bars[..5], 14), None);
    }

    fn bars_from(highs_lows: &[(f64, f64)]) -> Vec<PricePoint> {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        highs_lows
            .iter()
            .enumerate()
            .map(|(i, &(high, low))| {
                let close = (high + low) / 2.0;
                PricePoint::new(start + Duration::days(i as i64), close, high, low, close, 1_000.0)
            })
            .collect()
    }

    #[test]
    fn test_adx_one_way_market() {
        let rising: Vec<_> = (0..40).map(|i| (101.0 + f64::from(i), 99.0 + f64::from(i))).collect();
        assert!(approx(adx(&bars_from(&rising), 14).unwrap(), 100.0));

        let falling: Vec<_> = (0..40).map(|i| (101.0 - f64::from(i), 99.0 - f64::from(i))).collect();
        assert!(approx(adx(&bars_from(&falling), 14).unwrap(), 100.0));
    }

    #[test]
    fn test_adx_flat_and_short() {
        let flat = vec![(11.0, 9.0); 40];
        assert_eq!(adx(&bars_from(&flat), 14), Some(0.0));
        assert_eq!(adx(&bars_from(&flat[..27]), 14), None);
        assert!(adx(&bars_from(&flat[..28]), 14).is_some());
    }

    #[test]
    fn test_adx_choppy_market_is_weak() {
        let choppy: Vec<_> = (0..60)
            .map(|i| if i % 2 == 0 { (103.0, 97.0) } else { (104.0, 98.0) })
            .collect();
        let value = adx(&bars_from(&choppy), 14).unwrap();
        assert!(value < 25.0, "adx = {value}");
    }

    #[test]
    fn test_momentum_pct() {
        let closes = [100.0, 101.0, 102.01];
        assert!(approx(momentum_pct(&closes, 2).unwrap(), 1.0));
        assert_eq!(momentum_pct(&closes, 5), None);
    }

    #[test]
    fn test_volume_ratio() {
        let volumes = [100.0, 100.0, 100.0, 250.0];
        assert!(approx(volume_ratio(&volumes, 3).unwrap(), 2.5));
        assert_eq!(volume_ratio(&[0.0, 0.0, 5.0], 2), None);
    }

    #[test]
    fn test_count_gaps() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut stamps: Vec<_> = (0..10).map(|i| start + Duration::days(i)).collect();
        stamps.push(start + Duration::days(30));
        assert_eq!(count_gaps(&stamps, 5.0), 1);
        assert_eq!(count_gaps(&stamps[..1], 5.0), 0);
    }
}
