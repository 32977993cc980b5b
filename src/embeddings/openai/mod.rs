
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, warn};
use url::Url;

use crate::config::Config;
use crate::embeddings::TextEmbedder;
use crate::{JobsError, Result};

const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
const EXPONENTIAL_BACKOFF_BASE: u64 = 2;

/// Client for the OpenAI embeddings endpoint.
///
/// The credential, model identifier, and target dimensionality are fixed at
/// construction; they are deployment configuration, not per-call parameters.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    api_base: Url,
    api_key: String,
    model: String,
    dimensions: u32,
    agent: ureq::Agent,
    retry_attempts: u32,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    input: &'a str,
    model: &'a str,
    dimensions: u32,
    encoding_format: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct ModelsResponse {
    data: Vec<ModelInfo>,
}

#[derive(Debug, Deserialize)]
pub struct ModelInfo {
    pub id: String,
}

impl OpenAiClient {
    #[inline]
    pub fn new(config: &Config) -> Result<Self> {
        let api_base = config
            .openai
            .api_base_url()
            .map_err(|e| JobsError::Config(e.to_string()))?;

        let api_key = config
            .openai
            .api_key()
            .map_err(|e| JobsError::Config(e.to_string()))?;

        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(DEFAULT_TIMEOUT_SECONDS)))
            .build()
            .into();

        Ok(Self {
            api_base,
            api_key,
            model: config.openai.model.clone(),
            dimensions: config.openai.dimensions,
            agent,
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
        })
    }

    #[inline]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();
        self
    }

    #[inline]
    pub fn with_retry_attempts(mut self, attempts: u32) -> Self {
        self.retry_attempts = attempts;
        self
    }

    /// Check that the provider is reachable and the pinned model is served.
    #[inline]
    pub fn health_check(&self) -> Result<()> {
        debug!("Performing health check against {}", self.api_base);

        let models = self.list_models()?;

        if models.iter().any(|m| m.id == self.model) {
            debug!("Model {} is available", self.model);
            Ok(())
        } else {
            warn!("Model {} not listed by provider", self.model);
            Err(JobsError::Config(format!(
                "Model '{}' is not available from the provider",
                self.model
            )))
        }
    }

    /// List the model identifiers the provider currently serves.
    #[inline]
    pub fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let url = self.endpoint("models")?;

        debug!("Fetching available models from {}", url);

        let response_text = self.request_with_retry(|| {
            self.agent
                .get(url.as_str())
                .header("Authorization", &format!("Bearer {}", self.api_key))
                .call()
                .and_then(|mut resp| resp.body_mut().read_to_string())
        })?;

        let models: ModelsResponse = serde_json::from_str(&response_text)
            .map_err(|e| JobsError::Provider(format!("Failed to parse models response: {e}")))?;

        debug!("Provider lists {} models", models.data.len());
        Ok(models.data)
    }

    /// Generate an embedding for a single text input.
    ///
    /// Empty input is passed through as-is; whether the provider embeds or
    /// rejects the empty string is its decision and propagates unchanged.
    #[inline]
    pub fn generate_embedding(&self, text: &str) -> Result<Vec<f32>> {
        debug!("Generating embedding for text (length: {})", text.len());

        let request = EmbeddingRequest {
            input: text,
            model: &self.model,
            dimensions: self.dimensions,
            encoding_format: "float",
        };

        let url = self.endpoint("embeddings")?;

        let request_json = serde_json::to_string(&request)
            .map_err(|e| JobsError::Provider(format!("Failed to serialize request: {e}")))?;

        let response_text = self.request_with_retry(|| {
            self.agent
                .post(url.as_str())
                .header("Authorization", &format!("Bearer {}", self.api_key))
                .header("Content-Type", "application/json")
                .send(&request_json)
                .and_then(|mut resp| resp.body_mut().read_to_string())
        })?;

        let response: EmbeddingResponse = serde_json::from_str(&response_text)
            .map_err(|e| JobsError::Provider(format!("Failed to parse embedding response: {e}")))?;

        let embedding = response
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| {
                JobsError::Provider("Response contained no embedding payload".to_string())
            })?;

        if embedding.len() != self.dimensions as usize {
            return Err(JobsError::Provider(format!(
                "Expected {} dimensions, provider returned {}",
                self.dimensions,
                embedding.len()
            )));
        }

        debug!("Generated embedding with {} dimensions", embedding.len());
        Ok(embedding)
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        // Url::join drops the last path segment of a base without a trailing
        // slash, so build the path by hand.
        let mut url = self.api_base.clone();
        let joined = format!("{}/{}", url.path().trim_end_matches('/'), path);
        url.set_path(&joined);
        Ok(url)
    }

    fn request_with_retry<F>(&self, mut request_fn: F) -> Result<String>
    where
        F: FnMut() -> std::result::Result<String, ureq::Error>,
    {
        let mut last_error = None;

        for attempt in 1..=self.retry_attempts {
            debug!("HTTP request attempt {}/{}", attempt, self.retry_attempts);

            match request_fn() {
                Ok(response_text) => {
                    debug!("Request succeeded on attempt {}", attempt);
                    return Ok(response_text);
                }
                Err(error) => {
                    let should_retry = match &error {
                        ureq::Error::StatusCode(status) => {
                            if *status >= 500 {
                                warn!(
                                    "Provider server error (status {}), attempt {}/{}",
                                    status, attempt, self.retry_attempts
                                );
                                true
                            } else {
                                warn!("Provider client error (status {}), not retrying", status);
                                return Err(JobsError::Provider(format!(
                                    "Provider returned HTTP {status}"
                                )));
                            }
                        }
                        ureq::Error::ConnectionFailed
                        | ureq::Error::HostNotFound
                        | ureq::Error::Timeout(_)
                        | ureq::Error::Io(_) => {
                            warn!(
                                "Transport error: {}, attempt {}/{}",
                                error, attempt, self.retry_attempts
                            );
                            true
                        }
                        _ => {
                            warn!("Non-retryable error: {}", error);
                            false
                        }
                    };

                    if !should_retry {
                        return Err(JobsError::Provider(format!("Request failed: {error}")));
                    }

                    last_error = Some(JobsError::Provider(format!("Request error: {error}")));

                    if attempt < self.retry_attempts {
                        let delay_ms = EXPONENTIAL_BACKOFF_BASE.pow(attempt - 1) * 1000;
                        let delay = Duration::from_millis(delay_ms);
                        debug!("Waiting {:?} before retry", delay);
                        std::thread::sleep(delay);
                    }
                }
            }
        }

        error!("All retry attempts failed for request to {}", self.api_base);

        Err(last_error
            .unwrap_or_else(|| JobsError::Provider("Request failed after retries".to_string())))
    }
}

impl TextEmbedder for OpenAiClient {
    #[inline]
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.generate_embedding(text)
    }

    #[inline]
    fn dimensions(&self) -> usize {
        self.dimensions as usize
    }
}
