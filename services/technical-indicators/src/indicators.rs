//! Pure indicator computations over close/volume series
//!
//! Each function takes the buffered series oldest-first and returns the
//! latest indicator value, or `None` when the required history is not
//! available. Non-finite results are filtered out at the aggregation
//! step so they never reach the wire.

use std::collections::BTreeMap;

const MACD_FAST: usize = 7;
const MACD_SLOW: usize = 14;
const MACD_SIGNAL: usize = 9;
/// Minimum history before MACD values are published
const MACD_MIN_HISTORY: usize = 26;

/// Configured period sets for the moving-average family
#[derive(Debug, Clone)]
pub struct IndicatorPeriods {
    pub sma: Vec<usize>,
    pub ema: Vec<usize>,
    pub rsi: Vec<usize>,
}

impl Default for IndicatorPeriods {
    fn default() -> Self {
        let default = vec![7, 14, 21, 60];
        Self {
            sma: default.clone(),
            ema: default.clone(),
            rsi: default,
        }
    }
}

/// Arithmetic mean of the last `period` values
pub fn sma(values: &[f64], period: usize) -> Option<f64> {
    if period == 0 || values.len() < period {
        return None;
    }
    let window = &values[values.len() - period..];
    Some(window.iter().sum::<f64>() / period as f64)
}

/// Exponential moving average with smoothing `2 / (period + 1)`,
/// seeded with the SMA of the first `period` values
pub fn ema(values: &[f64], period: usize) -> Option<f64> {
    if period == 0 || values.len() < period {
        return None;
    }
    let alpha = 2.0 / (period as f64 + 1.0);
    let seed = values[..period].iter().sum::<f64>() / period as f64;
    let mut current = seed;
    for value in &values[period..] {
        current = value * alpha + current * (1.0 - alpha);
    }
    Some(current)
}

/// Relative strength index with Wilder smoothing
///
/// Needs `period + 1` values: the first `period` deltas seed the average
/// gain/loss, later deltas are folded in with weight `1/period`.
pub fn rsi(values: &[f64], period: usize) -> Option<f64> {
    if period == 0 || values.len() < period + 1 {
        return None;
    }

    let deltas: Vec<f64> = values.windows(2).map(|w| w[1] - w[0]).collect();

    let mut avg_gain = deltas[..period].iter().filter(|&&d| d > 0.0).sum::<f64>() / period as f64;
    let mut avg_loss = -deltas[..period].iter().filter(|&&d| d < 0.0).sum::<f64>() / period as f64;

    for &delta in &deltas[period..] {
        let gain = delta.max(0.0);
        let loss = (-delta).max(0.0);
        avg_gain = (avg_gain * (period as f64 - 1.0) + gain) / period as f64;
        avg_loss = (avg_loss * (period as f64 - 1.0) + loss) / period as f64;
    }

    if avg_loss == 0.0 {
        return Some(100.0);
    }
    let rs = avg_gain / avg_loss;
    Some(100.0 - 100.0 / (1.0 + rs))
}

/// MACD line, signal line and histogram
///
/// Fast EMA 7 minus slow EMA 14, with an EMA-9 signal over the MACD
/// series; published only once 26 candles are buffered.
pub fn macd(values: &[f64]) -> Option<(f64, f64, f64)> {
    if values.len() < MACD_MIN_HISTORY {
        return None;
    }

    let fast = ema_series(values, MACD_FAST);
    let slow = ema_series(values, MACD_SLOW);

    // Both EMAs are defined from index MACD_SLOW - 1 onwards.
    let macd_line: Vec<f64> = (MACD_SLOW - 1..values.len())
        .map(|i| fast[i - (MACD_FAST - 1)] - slow[i - (MACD_SLOW - 1)])
        .collect();

    let signal = ema(&macd_line, MACD_SIGNAL)?;
    let macd_value = *macd_line.last()?;
    Some((macd_value, signal, macd_value - signal))
}

/// EMA at every index from `period - 1` onwards
fn ema_series(values: &[f64], period: usize) -> Vec<f64> {
    let alpha = 2.0 / (period as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len() - period + 1);
    let mut current = values[..period].iter().sum::<f64>() / period as f64;
    out.push(current);
    for value in &values[period..] {
        current = value * alpha + current * (1.0 - alpha);
        out.push(current);
    }
    out
}

/// On-balance volume: cumulative signed volume from the start of the
/// buffer, initial value 0
pub fn obv(closes: &[f64], volumes: &[f64]) -> Option<f64> {
    if closes.is_empty() || closes.len() != volumes.len() {
        return None;
    }
    let mut total = 0.0;
    for i in 1..closes.len() {
        if closes[i] > closes[i - 1] {
            total += volumes[i];
        } else if closes[i] < closes[i - 1] {
            total -= volumes[i];
        }
    }
    Some(total)
}

/// Compute the full indicator set over the buffered series
///
/// Indicators with insufficient history or non-finite results are absent
/// from the returned map.
pub fn compute_all(
    closes: &[f64],
    volumes: &[f64],
    periods: &IndicatorPeriods,
) -> BTreeMap<String, f64> {
    let mut out = BTreeMap::new();

    for &period in &periods.sma {
        insert_finite(&mut out, format!("sma_{period}"), sma(closes, period));
    }
    for &period in &periods.ema {
        insert_finite(&mut out, format!("ema_{period}"), ema(closes, period));
    }
    for &period in &periods.rsi {
        insert_finite(&mut out, format!("rsi_{period}"), rsi(closes, period));
    }

    if let Some((macd_value, signal, histogram)) = macd(closes) {
        insert_finite(&mut out, "macd_7".to_string(), Some(macd_value));
        insert_finite(&mut out, "macdsignal_7".to_string(), Some(signal));
        insert_finite(&mut out, "macdhist_7".to_string(), Some(histogram));
    }

    insert_finite(&mut out, "obv".to_string(), obv(closes, volumes));

    out
}

fn insert_finite(out: &mut BTreeMap<String, f64>, name: String, value: Option<f64>) {
    if let Some(value) = value {
        if value.is_finite() {
            out.insert(name, value);
        }
    }
}
