use crate::config::EmbeddingSettings;
use crate::error::EmbeddingError;
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Remote capability turning text into embedding vectors
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Check the provider configuration without making a request
    fn validate(&self) -> Result<(), EmbeddingError> {
        Ok(())
    }

    /// Embed `texts`, returning one vector per input in input order
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

/// OpenAI-compatible embeddings client
///
/// Sends `POST {endpoint}/embeddings` with `{model, input}` and bearer auth.
pub struct HttpEmbeddingClient {
    base_url: String,
    api_key: String,
    model: String,
    client: Client,
}

impl HttpEmbeddingClient {
    /// Create a new embedding client
    pub fn new(settings: &EmbeddingSettings) -> Result<Self, EmbeddingError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| EmbeddingError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: settings.endpoint.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
            client,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddingClient {
    fn validate(&self) -> Result<(), EmbeddingError> {
        if self.model.trim().is_empty() {
            return Err(EmbeddingError::Config("model identifier is empty".into()));
        }
        if self.api_key.trim().is_empty() {
            return Err(EmbeddingError::Config("API credential is missing".into()));
        }

        let url = Url::parse(&self.base_url)
            .map_err(|e| EmbeddingError::Config(format!("invalid endpoint '{}': {}", self.base_url, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(EmbeddingError::Config(format!(
                "unsupported endpoint scheme '{}'",
                url.scheme()
            )));
        }
        Ok(())
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/embeddings", self.base_url);
        tracing::trace!("Requesting {} embeddings from {}", texts.len(), url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&EmbeddingRequest {
                model: &self.model,
                input: texts,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read body".to_string());
            return Err(classify_status(status, body));
        }

        let mut parsed: EmbeddingResponse = response.json().await?;
        if parsed.data.len() != texts.len() {
            return Err(EmbeddingError::InvalidResponse(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                parsed.data.len()
            )));
        }

        parsed.data.sort_by_key(|d| d.index);
        if parsed.data.iter().enumerate().any(|(i, d)| d.index != i) {
            return Err(EmbeddingError::InvalidResponse(
                "embedding indices do not cover the input".into(),
            ));
        }

        Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
    }
}

fn classify_status(status: StatusCode, body: String) -> EmbeddingError {
    let message = format!("{}: {}", status, body);
    if status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
        || status.is_server_error()
    {
        EmbeddingError::Transient(message)
    } else {
        EmbeddingError::Rejected(message)
    }
}
