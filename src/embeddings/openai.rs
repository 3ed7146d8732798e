//! OpenAI embedding API client.

use crate::embeddings::provider::EmbeddingProvider;
use crate::types::{Dependency, EngineError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/embeddings";

/// OpenAI API embedding request.
#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: serde_json::Value, // String or Vec<String>
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

/// OpenAI API embedding response.
#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

/// OpenAI embedding provider.
pub struct OpenAIEmbedder {
    api_key: String,
    model: String,
    dimensions: usize,
    /// Request reduced dimensions (text-embedding-3 models only)
    reduced: bool,
    endpoint: String,
    client: Client,
}

impl OpenAIEmbedder {
    /// Create new OpenAI embedder with the model's native dimensionality.
    ///
    /// # Arguments
    ///
    /// * `api_key` - OpenAI API key
    /// * `model` - Model name (e.g., "text-embedding-3-small")
    pub fn new(api_key: String, model: String) -> Self {
        let dimensions = native_dimensions(&model);
        Self {
            api_key,
            model,
            dimensions,
            reduced: false,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            client: Client::new(),
        }
    }

    /// Request `dimensions`-long vectors so they match a pre-built index.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::ConfigError` if the model cannot shorten its output
    pub fn with_dimensions(mut self, dimensions: usize) -> Result<Self> {
        if dimensions == self.dimensions {
            return Ok(self);
        }
        if !self.model.starts_with("text-embedding-3") || dimensions == 0 || dimensions > self.dimensions {
            return Err(EngineError::ConfigError(format!(
                "Model {} cannot produce {}-dimensional embeddings",
                self.model, dimensions
            )));
        }
        self.dimensions = dimensions;
        self.reduced = true;
        Ok(self)
    }

    /// Override the API endpoint (proxies, compatible servers).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Call OpenAI embeddings API.
    async fn call_api(&self, input: serde_json::Value) -> Result<Vec<Vec<f32>>> {
        let request = EmbeddingRequest {
            model: &self.model,
            input,
            dimensions: self.reduced.then_some(self.dimensions),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(EngineError::unavailable(
                Dependency::Embedding,
                format!("OpenAI API error ({}): {}", status, error_text),
            ));
        }

        let mut embedding_response: EmbeddingResponse = response.json().await?;
        embedding_response.data.sort_by_key(|d| d.index);

        Ok(embedding_response
            .data
            .into_iter()
            .map(|d| d.embedding)
            .collect())
    }
}

/// Native output size of known OpenAI embedding models.
fn native_dimensions(model: &str) -> usize {
    match model {
        "text-embedding-3-small" => 1536,
        "text-embedding-3-large" => 3072,
        "text-embedding-ada-002" => 1536,
        _ => 1536,
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAIEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let embeddings = self.call_api(serde_json::json!(text)).await?;

        embeddings.into_iter().next().ok_or_else(|| {
            EngineError::unavailable(Dependency::Embedding, "No embedding returned from OpenAI")
        })
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        // Caller chunks large inputs; the API accepts ~2048 texts per request
        self.call_api(serde_json::json!(texts)).await
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn system(&self) -> &'static str {
        "openai"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_dimensions() {
        let embedder = OpenAIEmbedder::new("key".into(), "text-embedding-3-large".into());
        assert_eq!(embedder.dimensions(), 3072);
    }

    #[test]
    fn test_reduced_dimensions() {
        let embedder = OpenAIEmbedder::new("key".into(), "text-embedding-3-small".into())
            .with_dimensions(384)
            .unwrap();
        assert_eq!(embedder.dimensions(), 384);

        let legacy = OpenAIEmbedder::new("key".into(), "text-embedding-ada-002".into());
        assert!(legacy.with_dimensions(384).is_err());
    }

    #[test]
    fn test_request_omits_native_dimensions() {
        let request = EmbeddingRequest {
            model: "text-embedding-3-small",
            input: serde_json::json!("egg flour"),
            dimensions: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("dimensions").is_none());
    }
}
