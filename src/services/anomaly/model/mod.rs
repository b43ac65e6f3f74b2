//! Encoder model boundary.
//!
//! The encoder is an external collaborator. This module defines the contract
//! for invoking it ([`ModelAdapter`]), the classification of whatever it
//! returns ([`ModelOutput`]), and the scoped acquisition every inference call
//! runs under ([`BackendScope`]).

pub mod artifact;
pub mod http;

pub use artifact::{ArtifactConfig, ModelArtifact};
pub use http::HttpModelAdapter;

use super::reconstruction::compute_batch_errors;
use crate::error::{AppError, Result};
use crate::types::{NumericBackend, ScaledWindow, Tensor, FEATURE_COUNT};
use std::future::Future;
use tracing::{debug, warn};

/// Invokes the pretrained encoder on a batch of scaled windows.
///
/// An adapter is single-owner for the duration of a request. Sessions that run
/// concurrently each hold their own adapter.
pub trait ModelAdapter: Send + Sync {
    /// Backend the adapter currently executes on.
    fn backend(&self) -> NumericBackend;

    /// Switch the adapter to `backend`, discarding any state tied to the old one.
    fn set_backend(&mut self, backend: NumericBackend);

    /// Run the encoder. Returns one tensor or a short ordered list of tensors.
    fn infer(
        &mut self,
        batch: &[ScaledWindow],
    ) -> impl Future<Output = Result<Vec<Tensor>>> + Send;
}

/// Model output, classified once at the boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelOutput {
    /// Latent mean and log-variance, each `(batch, D)`.
    KlPair { mean: Tensor, log_var: Tensor },
    /// Reconstruction with the same shape as the input batch.
    SameShape(Tensor),
    /// Latent vector `(batch, D)` without a distributional head.
    Latent(Tensor),
}

impl ModelOutput {
    /// Classify raw tensors. Two or more tensors are a KL pair; otherwise an
    /// exact shape match with the input is a reconstruction; anything else is
    /// a latent vector.
    pub fn classify(outputs: Vec<Tensor>, input_shape: &[usize]) -> Result<Self> {
        let mut outputs = outputs.into_iter();
        let first = outputs
            .next()
            .ok_or_else(|| AppError::InvalidModelOutput("model returned no tensors".into()))?;

        if let Some(second) = outputs.next() {
            if first.shape() != second.shape() {
                return Err(AppError::InvalidModelOutput(format!(
                    "mean shape {:?} does not match log-variance shape {:?}",
                    first.shape(),
                    second.shape()
                )));
            }
            return Ok(ModelOutput::KlPair {
                mean: first,
                log_var: second,
            });
        }

        if first.shape() == input_shape {
            Ok(ModelOutput::SameShape(first))
        } else {
            Ok(ModelOutput::Latent(first))
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ModelOutput::KlPair { .. } => "kl_pair",
            ModelOutput::SameShape(_) => "same_shape",
            ModelOutput::Latent(_) => "latent",
        }
    }
}

/// `[batch, window, features]` for a batch of scaled windows.
pub fn batch_shape(batch: &[ScaledWindow]) -> [usize; 3] {
    let window = batch.first().map(|w| w.len()).unwrap_or(0);
    [batch.len(), window, FEATURE_COUNT]
}

/// One inference call's hold on the adapter.
///
/// Entering pins the adapter to the session backend, resetting it if it has
/// drifted. The scope owns the scaled batch, and dropping it (on success, on
/// error, or when the future is dropped mid-flight) releases the batch and
/// re-pins the backend.
pub struct BackendScope<'a, A: ModelAdapter> {
    adapter: &'a mut A,
    pinned: NumericBackend,
    batch: Vec<ScaledWindow>,
}

impl<'a, A: ModelAdapter> BackendScope<'a, A> {
    pub fn enter(adapter: &'a mut A, pinned: NumericBackend, batch: Vec<ScaledWindow>) -> Self {
        if adapter.backend() != pinned {
            warn!(
                "Model adapter drifted to {} backend, resetting to {}",
                adapter.backend(),
                pinned
            );
            adapter.set_backend(pinned);
        }
        Self {
            adapter,
            pinned,
            batch,
        }
    }

    /// Infer, classify the output and reduce it to one error per window.
    pub async fn run(mut self) -> Result<Vec<f64>> {
        if self.batch.is_empty() {
            return Ok(Vec::new());
        }
        let shape = batch_shape(&self.batch);
        let raw = self.adapter.infer(&self.batch).await?;
        let output = ModelOutput::classify(raw, &shape)?;
        debug!(
            "Model returned {} output for batch of {}",
            output.label(),
            self.batch.len()
        );
        compute_batch_errors(&self.batch, &output, self.batch.len())
    }
}

impl<A: ModelAdapter> Drop for BackendScope<'_, A> {
    fn drop(&mut self) {
        if self.adapter.backend() != self.pinned {
            warn!(
                "Backend changed to {} during inference, restoring {}",
                self.adapter.backend(),
                self.pinned
            );
            self.adapter.set_backend(self.pinned);
        }
        self.batch.clear();
    }
}
