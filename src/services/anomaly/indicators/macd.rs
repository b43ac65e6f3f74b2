//! MACD (Moving Average Convergence Divergence).

use super::ema::{ema, ema_dense};

/// MACD line, signal line and histogram, aligned to the input index space.
#[derive(Debug, Clone, PartialEq)]
pub struct MacdSeries {
    /// EMA(fast) - EMA(slow).
    pub line: Vec<Option<f64>>,
    /// EMA(signal) of the compacted MACD line.
    pub signal: Vec<Option<f64>>,
    /// Line - signal.
    pub histogram: Vec<Option<f64>>,
}

/// MACD with the usual `(12, 26, 9)` parameters supplied by the caller.
///
/// The signal line is computed over the null-stripped MACD line and then
/// right-aligned back at the first index where the line is defined.
pub fn macd(closes: &[f64], fast: usize, slow: usize, signal_period: usize) -> MacdSeries {
    let fast_ema = ema_dense(closes, fast);
    let slow_ema = ema_dense(closes, slow);

    let line: Vec<Option<f64>> = fast_ema
        .iter()
        .zip(slow_ema.iter())
        .map(|(f, s)| match (f, s) {
            (Some(f), Some(s)) => Some(f - s),
            _ => None,
        })
        .collect();

    let mut signal = vec![None; closes.len()];
    if let Some(first) = line.iter().position(|v| v.is_some()) {
        let compacted: Vec<Option<f64>> = line.iter().filter(|v| v.is_some()).copied().collect();
        for (offset, value) in ema(&compacted, signal_period).into_iter().enumerate() {
            if let Some(slot) = signal.get_mut(first + offset) {
                *slot = value;
            }
        }
    }

    let histogram = line
        .iter()
        .zip(signal.iter())
        .map(|(l, s)| match (l, s) {
            (Some(l), Some(s)) => Some(l - s),
            _ => None,
        })
        .collect();

    MacdSeries {
        line,
        signal,
        histogram,
    }
}
