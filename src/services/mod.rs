pub mod anomaly;

pub use anomaly::{
    AnomalyPipeline, AnomalySession, HttpModelAdapter, ModelAdapter, ModelArtifact, ModelStatus,
    Readiness, SessionStore,
};
