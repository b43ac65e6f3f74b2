//! Model artifact loading.
//!
//! An artifact directory holds the encoder descriptor plus two companion
//! files fitted offline alongside it: the feature scaler and a free-form
//! training config.

use crate::error::{AppError, Result};
use crate::services::anomaly::Scaler;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const MODEL_FILE: &str = "model.json";
pub const SCALER_FILE: &str = "scaler.json";
pub const CONFIG_FILE: &str = "config.json";

/// Free-form training config. Only consulted for informational fields.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ArtifactConfig {
    raw: Value,
}

impl ArtifactConfig {
    pub fn new(raw: Value) -> Self {
        Self { raw }
    }

    pub fn raw(&self) -> &Value {
        &self.raw
    }

    fn usize_field(&self, keys: &[&str]) -> Option<usize> {
        keys.iter()
            .find_map(|k| self.raw.get(*k))
            .and_then(Value::as_u64)
            .map(|v| v as usize)
    }

    pub fn latent_dim(&self) -> Option<usize> {
        self.usize_field(&["latent_dim", "latentDim"])
    }

    pub fn window_size(&self) -> Option<usize> {
        self.usize_field(&["window_size", "windowSize", "seq_len"])
    }

    pub fn n_features(&self) -> Option<usize> {
        self.usize_field(&["n_features", "nFeatures"])
    }
}

/// Loaded encoder artifact.
#[derive(Debug, Clone)]
pub struct ModelArtifact {
    pub dir: PathBuf,
    pub scaler: Scaler,
    pub config: ArtifactConfig,
}

impl ModelArtifact {
    /// Load `model.json`, `scaler.json` and `config.json` from `dir`.
    pub fn load(dir: &Path) -> Result<Self> {
        let model_path = dir.join(MODEL_FILE);
        if !model_path.is_file() {
            return Err(AppError::ModelLoad(format!(
                "missing model descriptor {}",
                model_path.display()
            )));
        }

        let scaler_json = read(dir, SCALER_FILE)?;
        let scaler = Scaler::from_json(&scaler_json).map_err(|e| {
            AppError::ModelLoad(format!("invalid {}: {}", SCALER_FILE, e))
        })?;

        let config_json = read(dir, CONFIG_FILE)?;
        let raw: Value = serde_json::from_str(&config_json)
            .map_err(|e| AppError::ModelLoad(format!("invalid {}: {}", CONFIG_FILE, e)))?;
        if !raw.is_object() {
            return Err(AppError::ModelLoad(format!(
                "{} must be a JSON object",
                CONFIG_FILE
            )));
        }
        let config = ArtifactConfig::new(raw);

        info!(
            "Loaded model artifact from {} (latent dim {:?})",
            dir.display(),
            config.latent_dim()
        );

        Ok(Self {
            dir: dir.to_path_buf(),
            scaler,
            config,
        })
    }
}

fn read(dir: &Path, file: &str) -> Result<String> {
    let path = dir.join(file);
    debug!("Reading {}", path.display());
    fs::read_to_string(&path)
        .map_err(|e| AppError::ModelLoad(format!("cannot read {}: {}", path.display(), e)))
}
