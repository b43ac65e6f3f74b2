//! Anomaly scoring service module.
//!
//! Bars flow through indicator computation, feature filling, windowing and
//! scaling into the encoder. The encoder's output is reduced to one error per
//! window, calibrated into a percentile threshold, and used to score the most
//! recent window.

pub mod calibrator;
pub mod features;
pub mod indicators;
pub mod model;
pub mod reconstruction;
pub mod scaler;
pub mod scorer;
pub mod session;
pub mod windows;

pub use features::build_feature_matrix;
pub use model::{HttpModelAdapter, ModelAdapter, ModelArtifact, ModelOutput};
pub use scaler::Scaler;
pub use session::{AnomalySession, SessionStore};
pub use windows::build_windows;

use crate::config::PipelineConfig;
use crate::error::{AppError, Result};
use crate::types::{
    Bar, CalibrationState, NumericBackend, ScoreResult, Window, FEATURE_COUNT,
};
use serde::Serialize;
use std::path::Path;
use tracing::{info, warn};

/// Readiness as reported to callers polling the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Readiness {
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Outcome of loading the model artifact, kept for the process lifetime.
#[derive(Debug, Clone)]
pub enum ModelStatus {
    Loaded(ModelArtifact),
    Failed(String),
}

impl ModelStatus {
    /// Load the artifact from `dir`. Failure is recorded, never raised.
    pub fn load(dir: &Path) -> Self {
        match ModelArtifact::load(dir) {
            Ok(artifact) => ModelStatus::Loaded(artifact),
            Err(e) => {
                warn!("Model not ready: {}", e);
                ModelStatus::Failed(e.to_string())
            }
        }
    }

    pub fn readiness(&self) -> Readiness {
        match self {
            ModelStatus::Loaded(_) => Readiness {
                ready: true,
                reason: None,
            },
            ModelStatus::Failed(reason) => Readiness {
                ready: false,
                reason: Some(reason.clone()),
            },
        }
    }
}

enum PipelineState<A> {
    Ready { artifact: ModelArtifact, adapter: A },
    NotReady { reason: String },
}

/// End-to-end anomaly pipeline bound to one model adapter.
pub struct AnomalyPipeline<A: ModelAdapter> {
    config: PipelineConfig,
    backend: NumericBackend,
    state: PipelineState<A>,
}

impl<A: ModelAdapter> AnomalyPipeline<A> {
    /// Bind `adapter` to a model status. The adapter's current backend is
    /// pinned for the lifetime of the pipeline.
    pub fn new(config: PipelineConfig, status: &ModelStatus, adapter: A) -> Self {
        let backend = adapter.backend();
        let state = match status {
            ModelStatus::Loaded(artifact) => {
                warn_on_shape_mismatch(artifact, &config);
                PipelineState::Ready {
                    artifact: artifact.clone(),
                    adapter,
                }
            }
            ModelStatus::Failed(reason) => PipelineState::NotReady {
                reason: reason.clone(),
            },
        };
        Self {
            config,
            backend,
            state,
        }
    }

    /// Load the artifact from `dir` and bind `adapter` to it.
    pub fn load(config: PipelineConfig, dir: &Path, adapter: A) -> Self {
        Self::new(config, &ModelStatus::load(dir), adapter)
    }

    /// Pipeline that fails every operation with `NotReady`.
    pub fn not_ready(config: PipelineConfig, reason: impl Into<String>) -> Self {
        Self {
            config,
            backend: NumericBackend::default(),
            state: PipelineState::NotReady {
                reason: reason.into(),
            },
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, PipelineState::Ready { .. })
    }

    pub fn readiness(&self) -> Readiness {
        match &self.state {
            PipelineState::Ready { .. } => Readiness {
                ready: true,
                reason: None,
            },
            PipelineState::NotReady { reason } => Readiness {
                ready: false,
                reason: Some(reason.clone()),
            },
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn backend(&self) -> NumericBackend {
        self.backend
    }

    pub fn artifact(&self) -> Option<&ModelArtifact> {
        match &self.state {
            PipelineState::Ready { artifact, .. } => Some(artifact),
            PipelineState::NotReady { .. } => None,
        }
    }

    /// Feature matrix and windows for a bar sequence. Pure, needs no model.
    pub fn build_windows(&self, bars: &[Bar]) -> Vec<Window> {
        let matrix = build_feature_matrix(bars);
        build_windows(&matrix, self.config.window_size)
    }

    fn loaded(&mut self) -> Result<(&Scaler, &mut A)> {
        match &mut self.state {
            PipelineState::Ready { artifact, adapter } => Ok((&artifact.scaler, adapter)),
            PipelineState::NotReady { reason } => Err(AppError::NotReady(reason.clone())),
        }
    }

    /// Calibrate a threshold over `windows`.
    pub async fn calibrate(&mut self, windows: &[Window]) -> Result<CalibrationState> {
        let backend = self.backend;
        let config = self.config.clone();
        let (scaler, adapter) = self.loaded()?;
        calibrator::calibrate(adapter, backend, scaler, windows, &config).await
    }

    /// Build every window of `bars` and calibrate over them.
    pub async fn calibrate_bars(&mut self, bars: &[Bar]) -> Result<CalibrationState> {
        let windows = self.build_windows(bars);
        self.calibrate(&windows).await
    }

    /// Score one window against `state`.
    pub async fn score(&mut self, state: &CalibrationState, window: &Window) -> Result<ScoreResult> {
        let backend = self.backend;
        let (scaler, adapter) = self.loaded()?;
        scorer::score(adapter, backend, scaler, state, window).await
    }

    /// Score the most recent window of `bars`.
    pub async fn score_latest(
        &mut self,
        state: &CalibrationState,
        bars: &[Bar],
    ) -> Result<ScoreResult> {
        self.loaded()?;
        state.require_threshold()?;

        let matrix = build_feature_matrix(bars);
        let window = windows::latest_window(&matrix, self.config.window_size).ok_or_else(|| {
            AppError::BadRequest(format!(
                "need at least {} bars to score, got {}",
                self.config.window_size,
                bars.len()
            ))
        })?;

        self.score(state, &window).await
    }
}

fn warn_on_shape_mismatch(artifact: &ModelArtifact, config: &PipelineConfig) {
    if let Some(window_size) = artifact.config.window_size() {
        if window_size != config.window_size {
            warn!(
                "Model was trained on windows of {} rows, pipeline builds {}",
                window_size, config.window_size
            );
        }
    }
    if let Some(n_features) = artifact.config.n_features() {
        if n_features != FEATURE_COUNT {
            warn!(
                "Model expects {} features, pipeline produces {}",
                n_features, FEATURE_COUNT
            );
        }
    }
    info!(
        "Anomaly pipeline ready (window {}, batch {})",
        config.window_size, config.batch_size
    );
}
