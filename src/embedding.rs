//! Embedding provider abstraction and implementations.
//!
//! Defines the [`EmbeddingProvider`] trait and concrete implementations:
//! - **[`DisabledProvider`]** — returns errors; used when embeddings are not configured.
//! - **[`OllamaProvider`]** — calls a local Ollama instance's `/api/embed` endpoint
//!   with batching, retry, and backoff.
//!
//! Also provides vector utilities for working with stored vectors:
//! - [`cosine_similarity`] — compute similarity between two embedding vectors
//! - [`vec_to_blob`] — encode a `Vec<f32>` as little-endian bytes for BLOB storage
//! - [`blob_to_vec`] — decode a BLOB back into a `Vec<f32>`
//!
//! # Retry Strategy
//!
//! The Ollama provider uses exponential backoff for transient errors:
//! - HTTP 429 (rate limited) and 5xx (server error) → retry
//! - HTTP 4xx (client error, not 429) → fail immediately
//! - Network errors → retry
//! - Backoff: 1s, 2s, 4s, 8s, 16s, 32s (capped at 2^5)

use anyhow::{anyhow, bail, Result};
use std::time::Duration;

use crate::config::EmbeddingConfig;

/// Trait for embedding providers.
///
/// The engine is synchronous; `embed` blocks until the whole batch is
/// vectorized or fails.
pub trait EmbeddingProvider: Send + Sync {
    /// Returns the model identifier (e.g. `"bge-m3"`).
    fn model_name(&self) -> &str;

    /// Embed a batch of texts, one vector per input, in input order.
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single query text.
    fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        let results = self.embed(&[text.to_string()])?;
        results
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("Empty embedding response"))
    }
}

/// Instantiate the provider selected by the configuration.
pub fn create_provider(config: &EmbeddingConfig) -> Result<Box<dyn EmbeddingProvider>> {
    match config.provider.as_str() {
        "ollama" => Ok(Box::new(OllamaProvider::new(config))),
        "disabled" => Ok(Box::new(DisabledProvider)),
        other => bail!(
            "Unknown embedding provider: '{}'. Must be disabled or ollama.",
            other
        ),
    }
}

// ============ Disabled Provider ============

/// A no-op embedding provider that always returns errors.
pub struct DisabledProvider;

impl EmbeddingProvider for DisabledProvider {
    fn model_name(&self) -> &str {
        "disabled"
    }

    fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
        bail!("Embedding provider is disabled; configure [embedding] to index")
    }
}

// ============ Ollama Provider ============

/// Embeds through a local Ollama instance's `/api/embed` endpoint.
pub struct OllamaProvider {
    model: String,
    endpoint: String,
    batch_size: usize,
    max_retries: u32,
    timeout: Duration,
}

impl OllamaProvider {
    pub fn new(config: &EmbeddingConfig) -> Self {
        Self {
            model: config.model.clone(),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            batch_size: config.batch_size.max(1),
            max_retries: config.max_retries,
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    fn call_api(&self, texts: &[String]) -> std::result::Result<Vec<Vec<f32>>, CallError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| CallError::Fatal(anyhow!("Failed to build HTTP client: {}", e)))?;

        let url = format!("{}/api/embed", self.endpoint);
        let body = serde_json::json!({
            "model": self.model,
            "input": texts,
        });

        let response = client
            .post(&url)
            .json(&body)
            .send()
            .map_err(|e| CallError::Retryable(format!("network error: {}", e)))?;

        let status = response.status();
        if status.as_u16() == 429 || status.is_server_error() {
            return Err(CallError::Retryable(format!("HTTP {}", status)));
        }
        if !status.is_success() {
            return Err(CallError::Fatal(anyhow!(
                "Ollama embed request failed with HTTP {}",
                status
            )));
        }

        #[derive(serde::Deserialize)]
        struct EmbedResponse {
            embeddings: Vec<Vec<f32>>,
        }

        let parsed: EmbedResponse = response
            .json()
            .map_err(|e| CallError::Fatal(anyhow!("Invalid embed response: {}", e)))?;

        if parsed.embeddings.len() != texts.len() {
            return Err(CallError::Fatal(anyhow!(
                "Embedding count mismatch: sent {}, received {}",
                texts.len(),
                parsed.embeddings.len()
            )));
        }

        Ok(parsed.embeddings)
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut attempt: u32 = 0;
        loop {
            match self.call_api(texts) {
                Ok(vectors) => return Ok(vectors),
                Err(CallError::Fatal(err)) => return Err(err),
                Err(CallError::Retryable(reason)) => {
                    if attempt >= self.max_retries {
                        bail!(
                            "Ollama embed failed after {} retries: {}",
                            self.max_retries,
                            reason
                        );
                    }
                    let backoff = 1u64 << attempt.min(5);
                    std::thread::sleep(Duration::from_secs(backoff));
                    attempt += 1;
                }
            }
        }
    }
}

enum CallError {
    Retryable(String),
    Fatal(anyhow::Error),
}

impl EmbeddingProvider for OllamaProvider {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            vectors.extend(self.embed_batch(batch)?);
        }
        Ok(vectors)
    }
}

// ============ Vector Utilities ============

/// Cosine similarity between two vectors; 0.0 on mismatch or zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if mag_a < f32::EPSILON || mag_b < f32::EPSILON {
        0.0
    } else {
        dot / (mag_a * mag_b)
    }
}

/// Encode an embedding vector as little-endian bytes for BLOB storage.
pub fn vec_to_blob(vector: &[f32]) -> Vec<u8> {
    let mut blob = Vec::with_capacity(vector.len() * 4);
    for value in vector {
        blob.extend_from_slice(&value.to_le_bytes());
    }
    blob
}

/// Decode a BLOB of little-endian bytes back into an embedding vector.
pub fn blob_to_vec(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|bytes| f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
        .collect()
}
