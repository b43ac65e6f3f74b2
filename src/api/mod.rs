pub mod anomaly;
pub mod health;

use crate::services::anomaly::ModelAdapter;
use crate::AppState;
use axum::Router;

/// Create the API router.
pub fn router<A: ModelAdapter + 'static>() -> Router<AppState<A>> {
    Router::new()
        .merge(health::router::<A>())
        .nest("/api/anomaly", anomaly::router::<A>())
}
