//! Threshold calibration over a historical window population.

use super::model::{BackendScope, ModelAdapter};
use super::Scaler;
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::types::{CalibrationState, NumericBackend, ScaledWindow, Window};
use tracing::{debug, info, warn};

/// Value at rank `floor(percentile * n)`, clamped to the last index.
///
/// Sorts `errors` in place. Returns `None` for an empty slice.
pub fn percentile_floor(errors: &mut [f64], percentile: f64) -> Option<f64> {
    if errors.is_empty() {
        return None;
    }
    errors.sort_by(|a, b| a.total_cmp(b));
    let rank = ((percentile * errors.len() as f64).floor() as usize).min(errors.len() - 1);
    Some(errors[rank])
}

/// Score every window and derive the decision threshold.
///
/// Windows are processed in index order, in batches of `config.batch_size`,
/// yielding to the runtime every `config.yield_every` batches. An empty
/// population returns the empty state without touching the adapter. Any
/// failure discards the errors gathered so far.
pub async fn calibrate<A: ModelAdapter>(
    adapter: &mut A,
    backend: NumericBackend,
    scaler: &Scaler,
    windows: &[Window],
    config: &PipelineConfig,
) -> Result<CalibrationState> {
    if windows.is_empty() {
        debug!("No windows to calibrate on");
        return Ok(CalibrationState::empty());
    }

    let batch_size = config.batch_size.max(1);
    let yield_every = config.yield_every.max(1);
    let batch_count = windows.len().div_ceil(batch_size);
    let mut errors: Vec<f64> = Vec::with_capacity(windows.len());

    info!(
        "Calibrating on {} windows in {} batches",
        windows.len(),
        batch_count
    );

    for (batch_index, chunk) in windows.chunks(batch_size).enumerate() {
        let scaled: Vec<ScaledWindow> = chunk.iter().map(|w| scaler.transform(w)).collect();
        let batch_errors = BackendScope::enter(adapter, backend, scaled).run().await?;
        errors.extend(batch_errors);

        debug!(
            "Calibration batch {}/{} done ({} errors)",
            batch_index + 1,
            batch_count,
            errors.len()
        );

        if (batch_index + 1) % yield_every == 0 {
            tokio::task::yield_now().await;
        }
    }

    let window_count = errors.len();
    let threshold = percentile_floor(&mut errors, config.percentile).unwrap_or(0.0);
    let state = CalibrationState::calibrated(threshold, window_count, config.reliable_window_count);

    if state.is_reliable() {
        info!(
            "Calibrated threshold {:.6} from {} windows",
            threshold, window_count
        );
    } else {
        warn!(
            "Calibrated threshold {:.6} from only {} windows (< {}), treat as unreliable",
            threshold, window_count, config.reliable_window_count
        );
    }

    Ok(state)
}
