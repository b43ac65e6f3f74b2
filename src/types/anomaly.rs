use crate::error::{AppError, Result};
use crate::types::Bar;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of one calibration run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalibrationState {
    threshold: Option<f64>,
    window_count: usize,
    is_reliable: bool,
}

impl CalibrationState {
    /// State for a calibration over zero windows.
    pub fn empty() -> Self {
        Self {
            threshold: None,
            window_count: 0,
            is_reliable: false,
        }
    }

    /// State for a calibration over `window_count` windows.
    ///
    /// A zero count always yields the empty state, whatever `threshold` is.
    pub fn calibrated(threshold: f64, window_count: usize, reliable_window_count: usize) -> Self {
        if window_count == 0 {
            return Self::empty();
        }
        Self {
            threshold: Some(threshold),
            window_count,
            is_reliable: window_count >= reliable_window_count,
        }
    }

    pub fn threshold(&self) -> Option<f64> {
        self.threshold
    }

    pub fn window_count(&self) -> usize {
        self.window_count
    }

    /// Advisory: thresholds from small populations are less trustworthy.
    pub fn is_reliable(&self) -> bool {
        self.is_reliable
    }

    /// The calibrated threshold, or a precondition error if calibration never produced one.
    pub fn require_threshold(&self) -> Result<f64> {
        self.threshold.ok_or_else(|| {
            AppError::PreconditionViolation(
                "score requires a calibration over at least one window".to_string(),
            )
        })
    }
}

/// Anomaly verdict for a scored window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Normal,
    Anomalous,
}

impl Verdict {
    pub fn label(&self) -> &'static str {
        match self {
            Verdict::Normal => "Normal",
            Verdict::Anomalous => "Anomalous",
        }
    }
}

/// Score of a single window against a calibrated threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreResult {
    /// Scalar reconstruction/divergence error.
    pub recon_error: f64,
    /// `1 - error/threshold`, clipped to `[0, 1]`.
    pub confidence: f64,
    /// Error strictly above threshold.
    pub is_anomaly: bool,
    /// Threshold the window was scored against.
    pub threshold: f64,
}

impl ScoreResult {
    pub fn from_error(recon_error: f64, threshold: f64) -> Self {
        let confidence = (1.0 - recon_error / threshold).clamp(0.0, 1.0);
        Self {
            recon_error,
            confidence: if confidence.is_nan() { 0.0 } else { confidence },
            is_anomaly: recon_error > threshold,
            threshold,
        }
    }

    pub fn verdict(&self) -> Verdict {
        if self.is_anomaly {
            Verdict::Anomalous
        } else {
            Verdict::Normal
        }
    }

    /// Scale an independent confidence (e.g. a rule-based signal's) by how
    /// normal this window looked.
    pub fn scale_confidence(&self, confidence: f64) -> f64 {
        (confidence * self.confidence).clamp(0.0, 1.0)
    }
}

/// Identifies one calibration session: a ticker at a timeframe.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionKey {
    pub ticker: String,
    pub timeframe: String,
}

impl SessionKey {
    pub fn new(ticker: &str, timeframe: &str) -> Self {
        Self {
            ticker: ticker.trim().to_uppercase(),
            timeframe: timeframe.trim().to_lowercase(),
        }
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.ticker, self.timeframe)
    }
}

/// Request body for calibrate and score endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnomalyRequest {
    pub ticker: String,
    #[serde(default = "default_timeframe")]
    pub timeframe: String,
    pub bars: Vec<Bar>,
}

fn default_timeframe() -> String {
    "1d".to_string()
}

impl AnomalyRequest {
    pub fn session_key(&self) -> SessionKey {
        SessionKey::new(&self.ticker, &self.timeframe)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_calibration_state() {
        let state = CalibrationState::empty();
        assert_eq!(state.threshold(), None);
        assert_eq!(state.window_count(), 0);
        assert!(!state.is_reliable());
        assert!(matches!(
            state.require_threshold(),
            Err(AppError::PreconditionViolation(_))
        ));
    }

    #[test]
    fn test_calibrated_reliability_boundary() {
        assert!(!CalibrationState::calibrated(0.5, 199, 200).is_reliable());
        assert!(CalibrationState::calibrated(0.5, 200, 200).is_reliable());
        assert_eq!(CalibrationState::calibrated(0.5, 0, 200), CalibrationState::empty());
    }

    #[test]
    fn test_calibration_state_serialization() {
        let json = serde_json::to_string(&CalibrationState::calibrated(0.25, 300, 200)).unwrap();
        assert!(json.contains("\"threshold\":0.25"));
        assert!(json.contains("\"windowCount\":300"));
        assert!(json.contains("\"isReliable\":true"));

        let empty = serde_json::to_string(&CalibrationState::empty()).unwrap();
        assert!(empty.contains("\"threshold\":null"));
    }

    #[test]
    fn test_score_result_confidence() {
        let normal = ScoreResult::from_error(0.25, 1.0);
        assert_eq!(normal.confidence, 0.75);
        assert!(!normal.is_anomaly);
        assert_eq!(normal.verdict(), Verdict::Normal);

        let anomalous = ScoreResult::from_error(2.0, 1.0);
        assert_eq!(anomalous.confidence, 0.0);
        assert!(anomalous.is_anomaly);
        assert_eq!(anomalous.verdict().label(), "Anomalous");
    }

    #[test]
    fn test_score_at_threshold_is_not_anomalous() {
        let result = ScoreResult::from_error(1.0, 1.0);
        assert!(!result.is_anomaly);
        assert_eq!(result.confidence, 0.0);
    }

    #[test]
    fn test_scale_confidence() {
        let result = ScoreResult::from_error(0.5, 1.0);
        assert_eq!(result.scale_confidence(0.8), 0.4);
        assert_eq!(ScoreResult::from_error(3.0, 1.0).scale_confidence(0.9), 0.0);
    }

    #[test]
    fn test_session_key_normalization() {
        let key = SessionKey::new(" aapl ", "1D");
        assert_eq!(key.ticker, "AAPL");
        assert_eq!(key.timeframe, "1d");
        assert_eq!(key.to_string(), "AAPL:1d");
    }

    #[test]
    fn test_request_default_timeframe() {
        let req: AnomalyRequest =
            serde_json::from_str(r#"{"ticker":"msft","bars":[]}"#).unwrap();
        assert_eq!(req.timeframe, "1d");
        assert_eq!(req.session_key(), SessionKey::new("MSFT", "1d"));
    }
}
