//! Scoring of a single window against a calibrated threshold.

use super::model::{BackendScope, ModelAdapter};
use super::Scaler;
use crate::error::{AppError, Result};
use crate::types::{CalibrationState, NumericBackend, ScoreResult, Window};
use tracing::debug;

/// Score `window` with a batch of one.
///
/// Fails with a precondition violation if `state` carries no threshold.
pub async fn score<A: ModelAdapter>(
    adapter: &mut A,
    backend: NumericBackend,
    scaler: &Scaler,
    state: &CalibrationState,
    window: &Window,
) -> Result<ScoreResult> {
    let threshold = state.require_threshold()?;

    let errors = BackendScope::enter(adapter, backend, vec![scaler.transform(window)])
        .run()
        .await?;
    let recon_error = errors.first().copied().ok_or_else(|| {
        AppError::InvalidModelOutput("model produced no error for the scored window".into())
    })?;

    let result = ScoreResult::from_error(recon_error, threshold);
    debug!(
        "Scored window: error {:.6} vs threshold {:.6} -> {} (confidence {:.3})",
        result.recon_error,
        threshold,
        result.verdict().label(),
        result.confidence
    );

    Ok(result)
}
