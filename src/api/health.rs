use crate::services::anomaly::ModelAdapter;
use crate::AppState;
use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    model_ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    not_ready_reason: Option<String>,
}

async fn health<A: ModelAdapter + 'static>(
    State(state): State<AppState<A>>,
) -> Json<HealthResponse> {
    let readiness = state.sessions.readiness();
    Json(HealthResponse {
        status: if readiness.ready { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        model_ready: readiness.ready,
        not_ready_reason: readiness.reason,
    })
}

pub fn router<A: ModelAdapter + 'static>() -> Router<AppState<A>> {
    Router::new().route("/api/health", get(health::<A>))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_response_serialization() {
        let response = HealthResponse {
            status: "ok",
            version: "1.0.0",
            model_ready: true,
            not_ready_reason: None,
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"status\":\"ok\""));
        assert!(json.contains("\"modelReady\":true"));
        assert!(!json.contains("notReadyReason"));
    }

    #[test]
    fn test_degraded_response_carries_reason() {
        let response = HealthResponse {
            status: "degraded",
            version: env!("CARGO_PKG_VERSION"),
            model_ready: false,
            not_ready_reason: Some("missing model descriptor".to_string()),
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["modelReady"], false);
        assert_eq!(json["notReadyReason"], "missing model descriptor");
    }
}
