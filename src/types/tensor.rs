use serde::{Deserialize, Serialize};
use std::fmt;

/// Numeric backend an inference session is pinned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NumericBackend {
    #[default]
    Cpu,
    Wasm,
    Gpu,
}

impl NumericBackend {
    /// Parse from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "cpu" => Some(Self::Cpu),
            "wasm" => Some(Self::Wasm),
            "gpu" | "webgl" => Some(Self::Gpu),
            _ => None,
        }
    }
}

impl fmt::Display for NumericBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumericBackend::Cpu => write!(f, "cpu"),
            NumericBackend::Wasm => write!(f, "wasm"),
            NumericBackend::Gpu => write!(f, "gpu"),
        }
    }
}

/// Dense row-major tensor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tensor {
    shape: Vec<usize>,
    data: Vec<f64>,
}

impl Tensor {
    /// Create a tensor, checking that `data` fills `shape` exactly. Shapes
    /// whose element count overflows `usize` are rejected.
    pub fn new(shape: Vec<usize>, data: Vec<f64>) -> Option<Self> {
        let (&batch, rest) = shape.split_first()?;
        let expected = checked_volume(rest)?.checked_mul(batch)?;
        if expected != data.len() {
            return None;
        }
        Some(Self { shape, data })
    }

    /// Build a `(rows, cols)` tensor from nested rows. Rows must share a width.
    pub fn from_rows(rows: &[Vec<f64>]) -> Option<Self> {
        let cols = rows.first().map(|r| r.len()).unwrap_or(0);
        if rows.iter().any(|r| r.len() != cols) {
            return None;
        }
        let data = rows.iter().flatten().copied().collect();
        Self::new(vec![rows.len(), cols], data)
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Leading dimension.
    pub fn batch(&self) -> usize {
        self.shape[0]
    }

    /// Number of values per leading-dimension entry.
    pub fn sample_len(&self) -> usize {
        self.shape[1..].iter().product()
    }

    /// Flattened values of sample `i`.
    pub fn sample(&self, i: usize) -> &[f64] {
        let len = self.sample_len();
        &self.data[i * len..(i + 1) * len]
    }
}

fn checked_volume(dims: &[usize]) -> Option<usize> {
    dims.iter().try_fold(1usize, |acc, d| acc.checked_mul(*d))
}
