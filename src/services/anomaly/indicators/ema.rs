//! Exponential Moving Average (EMA).

/// EMA over a series with gaps.
///
/// The recursion seeds with the first present value (no look-back average) and
/// then applies `alpha = 2 / (period + 1)`. Output stays `None` until `period`
/// values have been observed. After that, a missing input repeats the last
/// computed value instead of resetting state.
pub fn ema(series: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    let multiplier = 2.0 / (period as f64 + 1.0);
    let warmup = period.saturating_sub(1);
    let mut result = Vec::with_capacity(series.len());
    let mut prev: Option<f64> = None;
    let mut observed = 0usize;

    for value in series {
        match (prev, value) {
            (None, Some(v)) => {
                prev = Some(*v);
                observed = 1;
            }
            (Some(p), Some(v)) => {
                prev = Some((v - p) * multiplier + p);
                observed += 1;
            }
            _ => {}
        }
        result.push(if observed > warmup { prev } else { None });
    }

    result
}

/// EMA over a dense series.
pub fn ema_dense(series: &[f64], period: usize) -> Vec<Option<f64>> {
    let wrapped: Vec<Option<f64>> = series.iter().copied().map(Some).collect();
    ema(&wrapped, period)
}
