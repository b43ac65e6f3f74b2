//! Remote inference over HTTP.

use super::{batch_shape, ModelAdapter};
use crate::config::ModelConfig;
use crate::error::{AppError, Result};
use crate::types::{FeatureRow, NumericBackend, ScaledWindow, Tensor};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Serialize)]
struct InferRequest<'a> {
    backend: NumericBackend,
    shape: [usize; 3],
    inputs: Vec<&'a [FeatureRow]>,
}

#[derive(Debug, Deserialize)]
struct TensorPayload {
    shape: Vec<usize>,
    data: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct InferResponse {
    #[serde(default)]
    backend: Option<NumericBackend>,
    outputs: Vec<TensorPayload>,
}

/// Model adapter backed by an inference server (`POST {endpoint}/v1/infer`).
#[derive(Clone)]
pub struct HttpModelAdapter {
    client: Client,
    endpoint: String,
    backend: NumericBackend,
}

impl HttpModelAdapter {
    pub fn new(config: &ModelConfig) -> Self {
        let client = Client::builder()
            .user_agent("Wraith/1.0")
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            backend: config.backend,
        }
    }

    fn url(&self) -> String {
        format!("{}/v1/infer", self.endpoint)
    }

    async fn post(&self, batch: &[ScaledWindow]) -> Result<InferResponse> {
        let request = InferRequest {
            backend: self.backend,
            shape: batch_shape(batch),
            inputs: batch.iter().map(|w| w.rows()).collect(),
        };

        let response = self.client.post(self.url()).json(&request).send().await?;

        if !response.status().is_success() {
            return Err(AppError::Inference(format!(
                "inference server returned {}",
                response.status()
            )));
        }

        Ok(response.json::<InferResponse>().await?)
    }

    /// A response computed on another backend is rejected outright.
    fn check_backend(&self, reported: Option<NumericBackend>) -> Result<()> {
        match reported {
            Some(reported) if reported != self.backend => {
                warn!(
                    "Inference server ran on {} instead of {}",
                    reported, self.backend
                );
                Err(AppError::Inference(format!(
                    "inference server ran on {} instead of pinned {}",
                    reported, self.backend
                )))
            }
            _ => Ok(()),
        }
    }
}

impl ModelAdapter for HttpModelAdapter {
    fn backend(&self) -> NumericBackend {
        self.backend
    }

    fn set_backend(&mut self, backend: NumericBackend) {
        self.backend = backend;
    }

    async fn infer(&mut self, batch: &[ScaledWindow]) -> Result<Vec<Tensor>> {
        let response = self.post(batch).await?;
        self.check_backend(response.backend)?;

        debug!(
            "Inference returned {} tensor(s) for {} windows",
            response.outputs.len(),
            batch.len()
        );

        response
            .outputs
            .into_iter()
            .map(|payload| {
                let shape = payload.shape.clone();
                Tensor::new(payload.shape, payload.data).ok_or_else(|| {
                    AppError::InvalidModelOutput(format!(
                        "tensor data does not fill shape {:?}",
                        shape
                    ))
                })
            })
            .collect()
    }
}
