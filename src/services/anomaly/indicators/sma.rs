//! Simple Moving Average (SMA).

/// Trailing arithmetic mean. `None` for indices `< period - 1`.
pub fn sma(series: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut result = vec![None; series.len()];
    if period == 0 || series.len() < period {
        return result;
    }

    for i in (period - 1)..series.len() {
        let window = &series[i + 1 - period..=i];
        result[i] = Some(window.iter().sum::<f64>() / period as f64);
    }

    result
}
