//! Per ticker/timeframe calibration sessions.

use super::{AnomalyPipeline, ModelAdapter, ModelStatus, Readiness};
use crate::config::PipelineConfig;
use crate::error::{AppError, Result};
use crate::types::{Bar, CalibrationState, ScoreResult, SessionKey};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// One session: its own pipeline (and adapter) plus the latest calibration.
pub struct AnomalySession<A: ModelAdapter> {
    key: SessionKey,
    pipeline: AnomalyPipeline<A>,
    calibration: CalibrationState,
    /// Millisecond timestamp of the last successful calibration.
    calibrated_at: Option<i64>,
}

impl<A: ModelAdapter> AnomalySession<A> {
    pub fn new(key: SessionKey, pipeline: AnomalyPipeline<A>) -> Self {
        Self {
            key,
            pipeline,
            calibration: CalibrationState::empty(),
            calibrated_at: None,
        }
    }

    pub fn key(&self) -> &SessionKey {
        &self.key
    }

    pub fn calibration(&self) -> &CalibrationState {
        &self.calibration
    }

    pub fn calibrated_at(&self) -> Option<i64> {
        self.calibrated_at
    }

    /// Calibrate over `bars`, replacing the stored state on success.
    pub async fn recalibrate(&mut self, bars: &[Bar]) -> Result<CalibrationState> {
        let state = self.pipeline.calibrate_bars(bars).await?;
        self.calibration = state.clone();
        self.calibrated_at = Some(chrono::Utc::now().timestamp_millis());
        info!(
            "Session {} calibrated on {} windows",
            self.key,
            state.window_count()
        );
        Ok(state)
    }

    /// Score the most recent window of `bars` against the stored calibration.
    pub async fn score_latest(&mut self, bars: &[Bar]) -> Result<ScoreResult> {
        self.pipeline.score_latest(&self.calibration, bars).await
    }
}

type SharedSession<A> = Arc<Mutex<AnomalySession<A>>>;

/// Concurrent map of sessions. Each session is locked for the duration of a
/// calibrate or score, so requests for the same key run one at a time.
pub struct SessionStore<A: ModelAdapter> {
    sessions: DashMap<SessionKey, SharedSession<A>>,
    status: ModelStatus,
    config: PipelineConfig,
    make_adapter: Box<dyn Fn() -> A + Send + Sync>,
}

impl<A: ModelAdapter + 'static> SessionStore<A> {
    /// Create a store. `make_adapter` is called once per new session.
    pub fn new(
        status: ModelStatus,
        config: PipelineConfig,
        make_adapter: impl Fn() -> A + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            sessions: DashMap::new(),
            status,
            config,
            make_adapter: Box::new(make_adapter),
        })
    }

    pub fn readiness(&self) -> Readiness {
        self.status.readiness()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn get(&self, key: &SessionKey) -> Option<SharedSession<A>> {
        self.sessions.get(key).map(|s| Arc::clone(&s))
    }

    fn get_or_create(&self, key: &SessionKey) -> SharedSession<A> {
        self.sessions
            .entry(key.clone())
            .or_insert_with(|| {
                debug!("Opening session {}", key);
                let pipeline =
                    AnomalyPipeline::new(self.config.clone(), &self.status, (self.make_adapter)());
                Arc::new(Mutex::new(AnomalySession::new(key.clone(), pipeline)))
            })
            .clone()
    }

    /// Calibrate the session for `key`, opening it if needed.
    pub async fn recalibrate(&self, key: &SessionKey, bars: &[Bar]) -> Result<CalibrationState> {
        if let Some(reason) = self.readiness().reason {
            return Err(AppError::NotReady(reason));
        }
        let session = self.get_or_create(key);
        let mut session = session.lock().await;
        session.recalibrate(bars).await
    }

    /// Score the latest window of `bars` for `key`.
    pub async fn score_latest(&self, key: &SessionKey, bars: &[Bar]) -> Result<ScoreResult> {
        if let Some(reason) = self.readiness().reason {
            return Err(AppError::NotReady(reason));
        }
        let session = self.get(key).ok_or_else(|| {
            AppError::PreconditionViolation(format!("session {} has not been calibrated", key))
        })?;
        let mut session = session.lock().await;
        session.score_latest(bars).await
    }

    /// Current calibration for `key`, if the session exists.
    pub async fn calibration(&self, key: &SessionKey) -> Option<CalibrationState> {
        let session = self.get(key)?;
        let session = session.lock().await;
        Some(session.calibration().clone())
    }

    /// Drop the session for `key`. Returns whether one existed.
    pub fn invalidate(&self, key: &SessionKey) -> bool {
        let removed = self.sessions.remove(key).is_some();
        if removed {
            info!("Invalidated session {}", key);
        }
        removed
    }
}
