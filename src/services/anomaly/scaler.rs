//! Fixed per-feature affine scaling into the unit range.

use crate::error::{AppError, Result};
use crate::types::{FeatureRow, ScaledWindow, Window, FEATURE_COUNT};
use serde::{Deserialize, Serialize};

/// Scaler parameters as stored next to the model (`scaler.json`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScalerParams {
    pub min: Vec<f64>,
    pub scale: Vec<f64>,
}

/// Min/scale transform fitted offline. Immutable once loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct Scaler {
    min: [f64; FEATURE_COUNT],
    scale: [f64; FEATURE_COUNT],
}

impl Scaler {
    pub fn new(min: [f64; FEATURE_COUNT], scale: [f64; FEATURE_COUNT]) -> Self {
        Self { min, scale }
    }

    /// Identity-like scaler: `min = 0`, `scale = 1`.
    pub fn unit() -> Self {
        Self::new([0.0; FEATURE_COUNT], [1.0; FEATURE_COUNT])
    }

    /// Validate stored parameters: exactly one finite entry per feature.
    pub fn from_params(params: ScalerParams) -> Result<Self> {
        let min = to_feature_array("min", &params.min)?;
        let scale = to_feature_array("scale", &params.scale)?;
        Ok(Self::new(min, scale))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let params: ScalerParams = serde_json::from_str(json)?;
        Self::from_params(params)
    }

    pub fn min(&self) -> &[f64; FEATURE_COUNT] {
        &self.min
    }

    pub fn scale(&self) -> &[f64; FEATURE_COUNT] {
        &self.scale
    }

    /// Scale one value of feature `j`. Zero scale or a NaN result maps to 0;
    /// infinities clip to the nearest bound.
    pub fn scale_value(&self, j: usize, value: f64) -> f64 {
        if self.scale[j] == 0.0 {
            return 0.0;
        }
        let scaled = (value - self.min[j]) / self.scale[j];
        if scaled.is_nan() {
            0.0
        } else {
            scaled.clamp(0.0, 1.0)
        }
    }

    pub fn scale_row(&self, row: &FeatureRow) -> FeatureRow {
        let mut out = [0.0; FEATURE_COUNT];
        for (j, value) in row.iter().enumerate() {
            out[j] = self.scale_value(j, *value);
        }
        out
    }

    /// Scale a window row by row. The source window is left untouched.
    pub fn transform(&self, window: &Window) -> ScaledWindow {
        ScaledWindow::from_rows(window.rows().iter().map(|r| self.scale_row(r)).collect())
    }
}

fn to_feature_array(name: &str, values: &[f64]) -> Result<[f64; FEATURE_COUNT]> {
    let array: [f64; FEATURE_COUNT] = values.try_into().map_err(|_| {
        AppError::ModelLoad(format!(
            "scaler {} must have {} entries, got {}",
            name,
            FEATURE_COUNT,
            values.len()
        ))
    })?;
    if array.iter().any(|v| !v.is_finite()) {
        return Err(AppError::ModelLoad(format!(
            "scaler {} contains non-finite values",
            name
        )));
    }
    Ok(array)
}
