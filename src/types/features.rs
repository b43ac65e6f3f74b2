use serde::{Deserialize, Serialize};

/// Number of feature columns per row.
pub const FEATURE_COUNT: usize = 7;

/// One fully populated feature row, in [`FeatureColumn::ALL`] order.
pub type FeatureRow = [f64; FEATURE_COUNT];

/// Feature matrix column.
///
/// The declaration order is the column order the encoder was trained on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeatureColumn {
    #[serde(rename = "RSI14")]
    Rsi14,
    #[serde(rename = "MACD")]
    Macd,
    #[serde(rename = "MACD_Hist")]
    MacdHist,
    #[serde(rename = "BB_Position")]
    BbPosition,
    #[serde(rename = "Vol_Ratio")]
    VolRatio,
    #[serde(rename = "Momentum")]
    Momentum,
    #[serde(rename = "SMA_Ratio")]
    SmaRatio,
}

impl FeatureColumn {
    pub const ALL: [FeatureColumn; FEATURE_COUNT] = [
        FeatureColumn::Rsi14,
        FeatureColumn::Macd,
        FeatureColumn::MacdHist,
        FeatureColumn::BbPosition,
        FeatureColumn::VolRatio,
        FeatureColumn::Momentum,
        FeatureColumn::SmaRatio,
    ];

    /// Position of this column within a row.
    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn name(&self) -> &'static str {
        match self {
            FeatureColumn::Rsi14 => "RSI14",
            FeatureColumn::Macd => "MACD",
            FeatureColumn::MacdHist => "MACD_Hist",
            FeatureColumn::BbPosition => "BB_Position",
            FeatureColumn::VolRatio => "Vol_Ratio",
            FeatureColumn::Momentum => "Momentum",
            FeatureColumn::SmaRatio => "SMA_Ratio",
        }
    }

    /// Value used when a column has no observation anywhere in the series.
    pub fn neutral_value(&self) -> f64 {
        match self {
            FeatureColumn::Rsi14 => 50.0,
            FeatureColumn::Macd | FeatureColumn::MacdHist | FeatureColumn::Momentum => 0.0,
            FeatureColumn::BbPosition => 0.5,
            FeatureColumn::VolRatio | FeatureColumn::SmaRatio => 1.0,
        }
    }
}

/// Feature matrix before null filling, stored column-major.
#[derive(Debug, Clone, PartialEq)]
pub struct RawFeatureMatrix {
    pub(crate) columns: [Vec<Option<f64>>; FEATURE_COUNT],
}

impl RawFeatureMatrix {
    pub fn len(&self) -> usize {
        self.columns[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn column(&self, column: FeatureColumn) -> &[Option<f64>] {
        &self.columns[column.index()]
    }

    /// Count of unset cells across all columns.
    pub fn null_count(&self) -> usize {
        self.columns
            .iter()
            .map(|c| c.iter().filter(|v| v.is_none()).count())
            .sum()
    }
}

/// Fully populated feature matrix, one row per input bar.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureMatrix {
    rows: Vec<FeatureRow>,
}

impl FeatureMatrix {
    pub(crate) fn from_rows(rows: Vec<FeatureRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[FeatureRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_count(&self) -> usize {
        FEATURE_COUNT
    }

    /// Values of a single column, in row order.
    pub fn column(&self, column: FeatureColumn) -> Vec<f64> {
        self.rows.iter().map(|r| r[column.index()]).collect()
    }
}

/// Contiguous run of filled feature rows used as one model sample.
#[derive(Debug, Clone, PartialEq)]
pub struct Window {
    rows: Vec<FeatureRow>,
}

impl Window {
    /// Build a window from rows. Returns `None` for an empty slice.
    pub fn from_rows(rows: &[FeatureRow]) -> Option<Self> {
        if rows.is_empty() {
            return None;
        }
        Some(Self {
            rows: rows.to_vec(),
        })
    }

    pub fn rows(&self) -> &[FeatureRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Window mapped through the scaler into `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaledWindow {
    rows: Vec<FeatureRow>,
}

impl ScaledWindow {
    pub(crate) fn from_rows(rows: Vec<FeatureRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[FeatureRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row-major flattening: `W * FEATURE_COUNT` values.
    pub fn flatten(&self) -> impl Iterator<Item = f64> + '_ {
        self.rows.iter().flat_map(|r| r.iter().copied())
    }
}
