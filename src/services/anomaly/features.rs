//! Feature matrix construction.
//!
//! Turns a bar sequence into the 7-column matrix the encoder consumes and
//! fills every unset cell.

use super::indicators::{
    bollinger_bands, macd, rsi_wilder, sma, BB_MULTIPLIER, BB_PERIOD, MACD_FAST, MACD_SIGNAL,
    MACD_SLOW, MOMENTUM_LOOKBACK, RSI_PERIOD, TREND_SMA_PERIOD, VOLUME_SMA_PERIOD,
};
use crate::types::{
    closes, volumes, Bar, FeatureColumn, FeatureMatrix, FeatureRow, RawFeatureMatrix,
    FEATURE_COUNT,
};

/// Band width below this maps BB_Position to the midpoint.
const MIN_BAND_WIDTH: f64 = 1e-10;

/// Compute every feature column, leaving warm-up cells unset.
///
/// Zero denominators after warm-up keep their NaN or infinite value; the
/// scaler decides what the model sees for them.
pub fn build_raw_features(bars: &[Bar]) -> RawFeatureMatrix {
    let n = bars.len();
    let close = closes(bars);
    let volume = volumes(bars);

    let rsi = rsi_wilder(&close, RSI_PERIOD);
    let macd_series = macd(&close, MACD_FAST, MACD_SLOW, MACD_SIGNAL);
    let bands = bollinger_bands(&close, BB_PERIOD, BB_MULTIPLIER);
    let volume_sma = sma(&volume, VOLUME_SMA_PERIOD);
    let trend_sma = sma(&close, TREND_SMA_PERIOD);

    let bb_position = (0..n)
        .map(|i| {
            bands[i].map(|band| {
                let width = band.width();
                if width < MIN_BAND_WIDTH {
                    0.5
                } else {
                    (close[i] - band.lower) / width
                }
            })
        })
        .collect();

    let vol_ratio = (0..n)
        .map(|i| volume_sma[i].map(|avg| volume[i] / avg))
        .collect();

    let momentum = (0..n)
        .map(|i| {
            if i < MOMENTUM_LOOKBACK {
                return None;
            }
            let reference = close[i - MOMENTUM_LOOKBACK];
            Some(100.0 * (close[i] - reference) / reference)
        })
        .collect();

    let sma_ratio = (0..n)
        .map(|i| trend_sma[i].map(|avg| close[i] / avg))
        .collect();

    let columns: [Vec<Option<f64>>; FEATURE_COUNT] = [
        rsi,
        macd_series.line,
        macd_series.histogram,
        bb_position,
        vol_ratio,
        momentum,
        sma_ratio,
    ];

    RawFeatureMatrix { columns }
}

/// Replace every unset cell. The order of these steps decides which values
/// seed the forward and backward fills.
///
/// 1. SMA_Ratio cells before its first observation become `1.0`.
/// 2. Every column is forward-filled.
/// 3. Remaining leading gaps are backward-filled from the first observation.
/// 4. Columns with no observation at all take the column's neutral value.
pub fn fill_nulls(raw: RawFeatureMatrix) -> FeatureMatrix {
    let RawFeatureMatrix { mut columns } = raw;

    let sma_ratio = &mut columns[FeatureColumn::SmaRatio.index()];
    let first = sma_ratio
        .iter()
        .position(|v| v.is_some())
        .unwrap_or(sma_ratio.len());
    for cell in sma_ratio[..first].iter_mut() {
        *cell = Some(1.0);
    }

    for column in columns.iter_mut() {
        forward_fill(column);
    }

    for column in columns.iter_mut() {
        backward_fill_leading(column);
    }

    let n = columns[0].len();
    let rows: Vec<FeatureRow> = (0..n)
        .map(|i| {
            let mut row = [0.0; FEATURE_COUNT];
            for (j, column) in FeatureColumn::ALL.iter().enumerate() {
                row[j] = columns[j][i].unwrap_or_else(|| column.neutral_value());
            }
            row
        })
        .collect();

    FeatureMatrix::from_rows(rows)
}

/// Build the filled feature matrix for a bar sequence.
pub fn build_feature_matrix(bars: &[Bar]) -> FeatureMatrix {
    fill_nulls(build_raw_features(bars))
}

fn forward_fill(column: &mut [Option<f64>]) {
    let mut last = None;
    for cell in column.iter_mut() {
        if cell.is_some() {
            last = *cell;
        } else {
            *cell = last;
        }
    }
}

fn backward_fill_leading(column: &mut [Option<f64>]) {
    if let Some(first) = column.iter().position(|v| v.is_some()) {
        let seed = column[first];
        for cell in column[..first].iter_mut() {
            *cell = seed;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn bars_from(close: &[f64], volume: &[f64]) -> Vec<Bar> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        close
            .iter()
            .zip(volume.iter())
            .enumerate()
            .map(|(i, (&c, &v))| Bar::new(start + Duration::days(i as i64), c, c, c, c, v))
            .collect()
    }

    fn wave(count: usize) -> Vec<Bar> {
        let close: Vec<f64> = (0..count)
            .map(|i| 100.0 + (i as f64 * 0.4).sin() * 8.0 + i as f64 * 0.1)
            .collect();
        let volume: Vec<f64> = (0..count).map(|i| 1000.0 + (i % 7) as f64 * 50.0).collect();
        bars_from(&close, &volume)
    }

    #[test]
    fn test_raw_null_boundaries() {
        let raw = build_raw_features(&wave(80));
        let first_defined = |c: FeatureColumn| raw.column(c).iter().position(|v| v.is_some());

        assert_eq!(first_defined(FeatureColumn::Rsi14), Some(14));
        assert_eq!(first_defined(FeatureColumn::Macd), Some(25));
        assert_eq!(first_defined(FeatureColumn::MacdHist), Some(33));
        assert_eq!(first_defined(FeatureColumn::BbPosition), Some(19));
        assert_eq!(first_defined(FeatureColumn::VolRatio), Some(19));
        assert_eq!(first_defined(FeatureColumn::Momentum), Some(10));
        assert_eq!(first_defined(FeatureColumn::SmaRatio), Some(49));
    }

    #[test]
    fn test_sma_ratio_leading_cells_are_par() {
        let matrix = build_feature_matrix(&wave(80));
        let ratio = matrix.column(FeatureColumn::SmaRatio);
        assert!(ratio[..49].iter().all(|v| *v == 1.0));
        assert_ne!(ratio[49], 1.0);
    }

    #[test]
    fn test_leading_cells_backfilled_from_first_observation() {
        let bars = wave(80);
        let raw = build_raw_features(&bars);
        let first_rsi = raw.column(FeatureColumn::Rsi14)[14].unwrap();
        let matrix = fill_nulls(raw);
        let rsi = matrix.column(FeatureColumn::Rsi14);
        assert!(rsi[..14].iter().all(|v| *v == first_rsi));
    }

    #[test]
    fn test_short_series_uses_neutral_values() {
        let matrix = build_feature_matrix(&wave(12));
        let row = matrix.rows()[0];
        assert_eq!(row[FeatureColumn::Rsi14.index()], 50.0);
        assert_eq!(row[FeatureColumn::Macd.index()], 0.0);
        assert_eq!(row[FeatureColumn::BbPosition.index()], 0.5);
        assert_eq!(row[FeatureColumn::VolRatio.index()], 1.0);
        assert_eq!(row[FeatureColumn::SmaRatio.index()], 1.0);
        // Momentum observed at index 10, back-filled to the start
        assert_ne!(row[FeatureColumn::Momentum.index()], 0.0);
    }

    #[test]
    fn test_flat_prices_pin_band_position() {
        let bars = bars_from(&[50.0; 30], &[1000.0; 30]);
        let matrix = build_feature_matrix(&bars);
        let position = matrix.column(FeatureColumn::BbPosition);
        assert!(position.iter().all(|v| *v == 0.5));
    }

    #[test]
    fn test_zero_volume_reaches_scaler_as_nan() {
        use crate::services::anomaly::Scaler;

        let bars = bars_from(&[50.0; 60], &[0.0; 60]);
        let raw = build_raw_features(&bars);
        let column = FeatureColumn::VolRatio;
        assert!(raw.column(column)[..19].iter().all(|v| v.is_none()));
        assert!(raw.column(column)[30].is_some_and(f64::is_nan));

        let matrix = fill_nulls(raw);
        let value = matrix.column(column)[30];
        assert!(value.is_nan());

        let scaler = Scaler::new([0.0; FEATURE_COUNT], [3.0; FEATURE_COUNT]);
        assert_eq!(scaler.scale_value(column.index(), value), 0.0);
    }

    #[test]
    fn test_zero_reference_close_keeps_infinite_momentum() {
        let mut close = vec![0.0];
        close.extend([5.0; 12]);
        let raw = build_raw_features(&bars_from(&close, &[1.0; 13]));
        let momentum = raw.column(FeatureColumn::Momentum)[10].unwrap();
        assert_eq!(momentum, f64::INFINITY);
    }

    #[test]
    fn test_momentum_formula() {
        let close: Vec<f64> = (0..11).map(|i| if i == 0 { 100.0 } else { 110.0 }).collect();
        let bars = bars_from(&close, &[1.0; 11]);
        let raw = build_raw_features(&bars);
        let momentum = raw.column(FeatureColumn::Momentum)[10].unwrap();
        assert!((momentum - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_matrix_is_aligned_with_bars() {
        for len in [0usize, 1, 19, 20, 50, 120] {
            let matrix = build_feature_matrix(&wave(len));
            assert_eq!(matrix.len(), len);
            assert_eq!(matrix.column_count(), FEATURE_COUNT);
        }
    }

    #[test]
    fn test_no_non_finite_cells_after_fill() {
        let matrix = build_feature_matrix(&wave(100));
        assert!(matrix.rows().iter().flatten().all(|v| v.is_finite()));
    }
}
