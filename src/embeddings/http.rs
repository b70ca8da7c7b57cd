//! HTTP embedding service client.
//!
//! Talks to an OpenAI-compatible embeddings API: POST {model, input} to the
//! configured endpoint, decode {data: [{embedding}]}. Output vectors are
//! L2-normalized before being returned.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::EmbeddingsConfig;
use crate::embeddings::{normalize, TextEmbedder};
use crate::error::{KglinkError, Result};
use crate::retry::RetryPolicy;

#[derive(Serialize)]
struct EmbeddingRequest {
    model: String,
    input: Vec<String>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// Embedding service client with bounded timeout and the shared retry policy.
pub struct HttpEmbedder {
    client: Client,
    endpoint: String,
    model: String,
    dimensions: usize,
    api_key: Option<String>,
    policy: RetryPolicy,
}

impl HttpEmbedder {
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be created (should not happen in
    /// normal operation).
    pub fn new(config: &EmbeddingsConfig, api_key: Option<String>, policy: RetryPolicy) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            dimensions: config.dimensions,
            api_key,
            policy,
        }
    }

    /// One API request for a batch of texts.
    async fn request_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let request = EmbeddingRequest {
            model: self.model.clone(),
            input: texts.to_vec(),
        };

        let mut builder = self.client.post(&self.endpoint).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.header("Authorization", format!("Bearer {}", key));
        }

        let response = builder
            .send()
            .await
            .map_err(|e| KglinkError::Embedding(format!("Network error: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(KglinkError::Embedding(format!(
                "Embedding service error {}: {}",
                status, body
            )));
        }

        let result: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| KglinkError::Embedding(format!("Failed to parse response: {}", e)))?;

        if result.data.len() != texts.len() {
            return Err(KglinkError::Embedding(format!(
                "Expected {} embeddings, got {}",
                texts.len(),
                result.data.len()
            )));
        }

        let mut embeddings = Vec::with_capacity(result.data.len());
        for data in result.data {
            let mut vector = data.embedding;
            if vector.len() != self.dimensions {
                return Err(KglinkError::Embedding(format!(
                    "Unexpected embedding dimension: expected {}, got {}",
                    self.dimensions,
                    vector.len()
                )));
            }
            normalize(&mut vector);
            embeddings.push(vector);
        }
        Ok(embeddings)
    }
}

#[async_trait]
impl TextEmbedder for HttpEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let texts = vec![text.to_string()];
        let mut embeddings = self
            .policy
            .run("embedding request", || self.request_batch(&texts))
            .await?;
        embeddings
            .pop()
            .ok_or_else(|| KglinkError::Embedding("Empty response from embedding service".to_string()))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.policy
            .run("embedding request", || self.request_batch(texts))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_embedder() -> HttpEmbedder {
        let config = EmbeddingsConfig {
            endpoint: "http://localhost:8089/embed".to_string(),
            model: "all-MiniLM-L6-v2".to_string(),
            dimensions: 384,
            api_key_env: None,
        };
        HttpEmbedder::new(
            &config,
            None,
            RetryPolicy::new(2, Duration::from_millis(1)),
        )
    }

    #[test]
    fn test_embedder_configuration() {
        let embedder = test_embedder();
        assert_eq!(embedder.model, "all-MiniLM-L6-v2");
        assert_eq!(embedder.dimensions, 384);
        assert!(embedder.api_key.is_none());
    }

    #[test]
    fn test_response_decoding() {
        let body = serde_json::json!({
            "data": [
                {"embedding": [0.1, 0.2]},
                {"embedding": [0.3, 0.4]}
            ]
        });
        let decoded: EmbeddingResponse = serde_json::from_value(body).unwrap();
        assert_eq!(decoded.data.len(), 2);
        assert_eq!(decoded.data[1].embedding, vec![0.3, 0.4]);
    }

    // Integration tests against a live embedding service require a running
    // endpoint and are exercised through the pipeline tests with doubles.
}
