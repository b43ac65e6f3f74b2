//! Relative Strength Index (RSI) with Wilder smoothing.

/// Average loss below this is treated as zero.
const ZERO_LOSS_EPSILON: f64 = 1e-10;

/// Wilder RSI.
///
/// Average gain/loss are seeded with the plain mean of the first `period`
/// deltas and advanced with `avg = (avg * (period - 1) + x) / period`. This is
/// a `1/period` weight, not the `2/(period + 1)` of [`super::ema`].
///
/// Output is `None` for indices `< period`. RSI is 100 when the average loss
/// is numerically zero.
pub fn rsi_wilder(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut result = vec![None; closes.len()];
    if period == 0 || closes.len() <= period {
        return result;
    }

    let mut gains = Vec::with_capacity(closes.len() - 1);
    let mut losses = Vec::with_capacity(closes.len() - 1);

    for i in 1..closes.len() {
        let change = closes[i] - closes[i - 1];
        if change > 0.0 {
            gains.push(change);
            losses.push(0.0);
        } else {
            gains.push(0.0);
            losses.push(-change);
        }
    }

    // Calculate initial averages
    let mut avg_gain: f64 = gains.iter().take(period).sum::<f64>() / period as f64;
    let mut avg_loss: f64 = losses.iter().take(period).sum::<f64>() / period as f64;
    result[period] = Some(rsi_value(avg_gain, avg_loss));

    // Delta i-1 belongs to close i
    for i in (period + 1)..closes.len() {
        avg_gain = (avg_gain * (period - 1) as f64 + gains[i - 1]) / period as f64;
        avg_loss = (avg_loss * (period - 1) as f64 + losses[i - 1]) / period as f64;
        result[i] = Some(rsi_value(avg_gain, avg_loss));
    }

    result
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss < ZERO_LOSS_EPSILON {
        return 100.0;
    }
    let rs = avg_gain / avg_loss;
    100.0 - (100.0 / (1.0 + rs))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uptrend(count: usize) -> Vec<f64> {
        (0..count).map(|i| 100.0 + i as f64 * 1.5).collect()
    }

    fn downtrend(count: usize) -> Vec<f64> {
        (0..count).map(|i| 200.0 - i as f64 * 1.5).collect()
    }

    #[test]
    fn test_rsi_null_until_period() {
        let out = rsi_wilder(&uptrend(30), 14);
        assert!(out[..14].iter().all(|v| v.is_none()));
        assert!(out[14..].iter().all(|v| v.is_some()));
    }

    #[test]
    fn test_rsi_insufficient_data() {
        let out = rsi_wilder(&uptrend(14), 14);
        assert_eq!(out.len(), 14);
        assert!(out.iter().all(|v| v.is_none()));
    }

    #[test]
    fn test_rsi_no_losses_is_100() {
        let out = rsi_wilder(&uptrend(20), 14);
        assert_eq!(out[19], Some(100.0));
    }

    #[test]
    fn test_rsi_flat_series_is_100() {
        let out = rsi_wilder(&[50.0; 20], 14);
        assert_eq!(out[14], Some(100.0));
    }

    #[test]
    fn test_rsi_downtrend_is_zero() {
        let out = rsi_wilder(&downtrend(20), 14);
        assert_eq!(out[15], Some(0.0));
    }

    #[test]
    fn test_rsi_seed_is_plain_mean() {
        // Deltas: +2, -1, +2, -1 with period 4 -> avg gain 1.0, avg loss 0.5
        let closes = [10.0, 12.0, 11.0, 13.0, 12.0];
        let out = rsi_wilder(&closes, 4);
        let expected = 100.0 - 100.0 / (1.0 + 2.0);
        assert!((out[4].unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_rsi_wilder_recursion() {
        // Seed as above, then delta +3: gain (1.0*3 + 3)/4 = 1.5, loss (0.5*3 + 0)/4 = 0.375
        let closes = [10.0, 12.0, 11.0, 13.0, 12.0, 15.0];
        let out = rsi_wilder(&closes, 4);
        let expected = 100.0 - 100.0 / (1.0 + 1.5 / 0.375);
        assert!((out[5].unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_rsi_value_range() {
        let closes: Vec<f64> = (0..60)
            .map(|i| 100.0 + (i as f64 * 0.7).sin() * 5.0)
            .collect();
        for v in rsi_wilder(&closes, 14).into_iter().flatten() {
            assert!((0.0..=100.0).contains(&v));
        }
    }
}
