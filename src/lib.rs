//! Wraith - encoder-based anomaly scoring for OHLCV price series

pub mod api;
pub mod config;
pub mod error;
pub mod services;
pub mod types;

use config::Config;
use services::{ModelAdapter, SessionStore};
use std::sync::Arc;

/// Application state shared across handlers.
pub struct AppState<A: ModelAdapter> {
    pub config: Arc<Config>,
    pub sessions: Arc<SessionStore<A>>,
}

impl<A: ModelAdapter> Clone for AppState<A> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            sessions: Arc::clone(&self.sessions),
        }
    }
}

// Re-export commonly used types
pub use error::{AppError, Result};
pub use types::*;
