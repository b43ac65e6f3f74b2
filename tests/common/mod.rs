//! Shared fixtures: seeded random-walk bars and stub model adapters.

#![allow(dead_code)]

use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use wraith::services::anomaly::model::{batch_shape, ArtifactConfig};
use wraith::services::anomaly::{ModelAdapter, ModelArtifact, ModelStatus, Scaler};
use wraith::types::{Bar, NumericBackend, ScaledWindow, Tensor};
use wraith::Result;

pub const LATENT_DIM: usize = 8;

/// Daily bars following a seeded geometric random walk.
pub fn random_walk_bars(n: usize, seed: u64) -> Vec<Bar> {
    let mut rng = StdRng::seed_from_u64(seed);
    let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
    let mut close: f64 = 100.0;

    (0..n)
        .map(|i| {
            let open = close;
            close *= 1.0 + rng.gen_range(-0.03..0.03);
            let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
            let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
            let volume = rng.gen_range(5_000.0..50_000.0);
            Bar::new(start + Duration::days(i as i64), open, high, low, close, volume)
        })
        .collect()
}

/// Bars with the given closes and a flat volume.
pub fn bars_from_closes(closes: &[f64]) -> Vec<Bar> {
    let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| Bar::new(start + Duration::days(i as i64), c, c, c, c, 1_000.0))
        .collect()
}

/// Scaler fitted loosely to the random-walk fixtures.
pub fn fixture_scaler() -> Scaler {
    Scaler::new(
        [0.0, -3.0, -2.0, -0.5, 0.0, -0.3, 0.7],
        [100.0, 6.0, 4.0, 2.0, 3.0, 0.6, 0.6],
    )
}

pub fn loaded_status() -> ModelStatus {
    ModelStatus::Loaded(ModelArtifact {
        dir: PathBuf::from("fixture"),
        scaler: fixture_scaler(),
        config: ArtifactConfig::default(),
    })
}

/// Output format a stub adapter produces.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputFormat {
    /// Latent mean and log-variance derived from the input.
    KlPair,
    /// Zero mean and zero log-variance.
    ZeroKl,
    /// Input scaled by 0.9.
    SameShape,
    /// Leading input values as a latent vector.
    Latent,
}

/// Deterministic adapter that records every call.
pub struct StubAdapter {
    pub format: OutputFormat,
    pub backend: NumericBackend,
    /// Backend the stub switches itself to during each call, if any.
    pub drift_to: Option<NumericBackend>,
    pub calls: Arc<AtomicUsize>,
    pub batch_sizes: Arc<Mutex<Vec<usize>>>,
    pub seen_backends: Arc<Mutex<Vec<NumericBackend>>>,
}

impl StubAdapter {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            backend: NumericBackend::Cpu,
            drift_to: None,
            calls: Arc::new(AtomicUsize::new(0)),
            batch_sizes: Arc::new(Mutex::new(Vec::new())),
            seen_backends: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

fn latent(window: &ScaledWindow) -> Vec<f64> {
    window.flatten().take(LATENT_DIM).collect()
}

impl ModelAdapter for StubAdapter {
    fn backend(&self) -> NumericBackend {
        self.backend
    }

    fn set_backend(&mut self, backend: NumericBackend) {
        self.backend = backend;
    }

    async fn infer(&mut self, batch: &[ScaledWindow]) -> Result<Vec<Tensor>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.batch_sizes.lock().unwrap().push(batch.len());
        self.seen_backends.lock().unwrap().push(self.backend);
        if let Some(backend) = self.drift_to {
            self.backend = backend;
        }

        let b = batch.len();
        let outputs = match self.format {
            OutputFormat::KlPair => {
                let means: Vec<Vec<f64>> = batch.iter().map(latent).collect();
                vec![
                    Tensor::from_rows(&means).unwrap(),
                    Tensor::new(vec![b, LATENT_DIM], vec![0.1; b * LATENT_DIM]).unwrap(),
                ]
            }
            OutputFormat::ZeroKl => vec![
                Tensor::new(vec![b, LATENT_DIM], vec![0.0; b * LATENT_DIM]).unwrap(),
                Tensor::new(vec![b, LATENT_DIM], vec![0.0; b * LATENT_DIM]).unwrap(),
            ],
            OutputFormat::SameShape => {
                let data = batch.iter().flat_map(|w| w.flatten().map(|v| v * 0.9)).collect();
                vec![Tensor::new(batch_shape(batch).to_vec(), data).unwrap()]
            }
            OutputFormat::Latent => {
                let rows: Vec<Vec<f64>> = batch.iter().map(latent).collect();
                vec![Tensor::from_rows(&rows).unwrap()]
            }
        };
        Ok(outputs)
    }
}
