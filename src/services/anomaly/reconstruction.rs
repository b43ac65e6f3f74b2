//! Reduction of model output to one anomaly error per sample.

use super::model::ModelOutput;
use crate::error::{AppError, Result};
use crate::types::{ScaledWindow, Tensor};

/// Log-variance is clipped into this range before exponentiation.
pub const LOG_VAR_MIN: f64 = -10.0;
pub const LOG_VAR_MAX: f64 = 50.0;

/// Per-sample non-negative error for a classified model output.
///
/// - `KlPair`: mean over latent dims of `-0.5 * (1 + logvar - mean^2 - exp(logvar))`.
/// - `SameShape`: mean squared difference between input and reconstruction.
/// - `Latent`: Euclidean norm of the latent vector.
pub fn compute_batch_errors(
    input: &[ScaledWindow],
    output: &ModelOutput,
    batch_size: usize,
) -> Result<Vec<f64>> {
    match output {
        ModelOutput::KlPair { mean, log_var } => {
            check_batch(mean, batch_size)?;
            check_batch(log_var, batch_size)?;
            Ok((0..batch_size)
                .map(|i| kl_divergence(mean.sample(i), log_var.sample(i)))
                .collect())
        }
        ModelOutput::SameShape(reconstruction) => {
            check_batch(reconstruction, batch_size)?;
            if input.len() != batch_size {
                return Err(AppError::InvalidModelOutput(format!(
                    "input batch has {} windows, expected {}",
                    input.len(),
                    batch_size
                )));
            }
            Ok(input
                .iter()
                .enumerate()
                .map(|(i, window)| mean_squared_error(window, reconstruction.sample(i)))
                .collect())
        }
        ModelOutput::Latent(latent) => {
            check_batch(latent, batch_size)?;
            Ok((0..batch_size)
                .map(|i| euclidean_norm(latent.sample(i)))
                .collect())
        }
    }
}

fn check_batch(tensor: &Tensor, batch_size: usize) -> Result<()> {
    if tensor.batch() != batch_size {
        return Err(AppError::InvalidModelOutput(format!(
            "output batch dimension {} does not match batch size {}",
            tensor.batch(),
            batch_size
        )));
    }
    Ok(())
}

fn kl_divergence(mean: &[f64], log_var: &[f64]) -> f64 {
    if mean.is_empty() {
        return 0.0;
    }
    let total: f64 = mean
        .iter()
        .zip(log_var.iter())
        .map(|(mu, lv)| {
            let lv = lv.clamp(LOG_VAR_MIN, LOG_VAR_MAX);
            -0.5 * (1.0 + lv - mu * mu - lv.exp())
        })
        .sum();
    (total / mean.len() as f64).max(0.0)
}

fn mean_squared_error(input: &ScaledWindow, reconstruction: &[f64]) -> f64 {
    if reconstruction.is_empty() {
        return 0.0;
    }
    let total: f64 = input
        .flatten()
        .zip(reconstruction.iter())
        .map(|(x, y)| (x - y).powi(2))
        .sum();
    (total / reconstruction.len() as f64).max(0.0)
}

fn euclidean_norm(values: &[f64]) -> f64 {
    values.iter().map(|v| v * v).sum::<f64>().sqrt().max(0.0)
}
