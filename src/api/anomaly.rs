//! Anomaly API endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::services::anomaly::ModelAdapter;
use crate::types::{is_chronological, AnomalyRequest, CalibrationState, ScoreResult, SessionKey};
use crate::AppState;

/// API response wrapper.
#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub data: T,
}

impl<T> ApiResponse<T> {
    fn new(data: T) -> Self {
        Self { data }
    }
}

/// Create the anomaly router.
pub fn router<A: ModelAdapter + 'static>() -> Router<AppState<A>> {
    Router::new()
        .route("/calibrate", post(calibrate::<A>))
        .route("/score", post(score::<A>))
        .route(
            "/:ticker/:timeframe",
            get(get_calibration::<A>).delete(invalidate::<A>),
        )
}

fn validate(request: &AnomalyRequest) -> Result<SessionKey> {
    if request.ticker.trim().is_empty() {
        return Err(AppError::BadRequest("ticker must not be empty".to_string()));
    }
    if !is_chronological(&request.bars) {
        return Err(AppError::BadRequest(
            "bars must be in strictly ascending date order".to_string(),
        ));
    }
    Ok(request.session_key())
}

/// Calibrate a session's threshold on the submitted history.
async fn calibrate<A: ModelAdapter + 'static>(
    State(state): State<AppState<A>>,
    Json(request): Json<AnomalyRequest>,
) -> Result<Json<ApiResponse<CalibrationState>>> {
    let key = validate(&request)?;
    let calibration = state.sessions.recalibrate(&key, &request.bars).await?;
    Ok(Json(ApiResponse::new(calibration)))
}

/// Score the most recent window of the submitted bars.
async fn score<A: ModelAdapter + 'static>(
    State(state): State<AppState<A>>,
    Json(request): Json<AnomalyRequest>,
) -> Result<Json<ApiResponse<ScoreResult>>> {
    let key = validate(&request)?;
    let result = state.sessions.score_latest(&key, &request.bars).await?;
    Ok(Json(ApiResponse::new(result)))
}

/// Get the current calibration for a session.
async fn get_calibration<A: ModelAdapter + 'static>(
    State(state): State<AppState<A>>,
    Path((ticker, timeframe)): Path<(String, String)>,
) -> Result<Json<ApiResponse<CalibrationState>>> {
    let key = SessionKey::new(&ticker, &timeframe);
    let calibration = state
        .sessions
        .calibration(&key)
        .await
        .ok_or_else(|| AppError::NotFound(format!("No session for {}", key)))?;
    Ok(Json(ApiResponse::new(calibration)))
}

/// Drop a session and its calibration.
async fn invalidate<A: ModelAdapter + 'static>(
    State(state): State<AppState<A>>,
    Path((ticker, timeframe)): Path<(String, String)>,
) -> Result<StatusCode> {
    let key = SessionKey::new(&ticker, &timeframe);
    if state.sessions.invalidate(&key) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("No session for {}", key)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Bar;
    use chrono::NaiveDate;

    fn bar(day: u32) -> Bar {
        Bar::new(
            NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
            10.0,
            11.0,
            9.0,
            10.5,
            100.0,
        )
    }

    #[test]
    fn test_validate_rejects_empty_ticker() {
        let request = AnomalyRequest {
            ticker: "  ".to_string(),
            timeframe: "1d".to_string(),
            bars: vec![],
        };
        assert!(matches!(validate(&request), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_validate_rejects_unordered_bars() {
        let request = AnomalyRequest {
            ticker: "aapl".to_string(),
            timeframe: "1d".to_string(),
            bars: vec![bar(2), bar(1)],
        };
        assert!(matches!(validate(&request), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_validate_normalizes_key() {
        let request = AnomalyRequest {
            ticker: "aapl".to_string(),
            timeframe: "1D".to_string(),
            bars: vec![bar(1), bar(2)],
        };
        assert_eq!(validate(&request).unwrap(), SessionKey::new("AAPL", "1d"));
    }

    #[test]
    fn test_api_response_shape() {
        let json = serde_json::to_value(ApiResponse::new(CalibrationState::empty())).unwrap();
        assert_eq!(json["data"]["windowCount"], 0);
    }
}
