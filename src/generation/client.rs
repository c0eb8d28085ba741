//! HTTP client for the Generative Language `generateText` API.

use super::types::{GenerateTextRequest, GenerateTextResponse};
use crate::config::GenerationConfig;
use crate::{Error, ErrorContext, Result};
use async_trait::async_trait;
use std::time::Duration;
use url::Url;

/// Prompt in, zero or more raw candidate texts out.
///
/// Any error returned here is treated by the caller as "generation
/// unavailable" and yields an empty result; implementations should still
/// prefer `Error::Generation` or `Error::Remote` so the cause is clear in logs.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate_text(&self, request: &GenerateTextRequest) -> Result<Vec<String>>;

    fn name(&self) -> &str;
}

/// Client for the Generative Language service.
///
/// The API key travels as the `key` query parameter.
pub struct GenerativeLanguageClient {
    http_client: reqwest::Client,
    base_url: Url,
    model: String,
    api_key: String,
}

impl GenerativeLanguageClient {
    pub fn builder() -> GenerativeLanguageClientBuilder {
        GenerativeLanguageClientBuilder::new()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta2/{}:generateText",
            self.base_url.as_str().trim_end_matches('/'),
            self.model
        )
    }
}

#[async_trait]
impl TextGenerator for GenerativeLanguageClient {
    async fn generate_text(&self, request: &GenerateTextRequest) -> Result<Vec<String>> {
        let endpoint = self.endpoint();
        let response = self
            .http_client
            .post(&endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&request.to_wire_body())
            .send()
            .await?;
        let status = response.status();
        let body_str = response.text().await?;
        if !status.is_success() {
            return Err(Error::Remote {
                status: status.as_u16(),
                message: body_str,
            });
        }
        let parsed: GenerateTextResponse = serde_json::from_str(&body_str).map_err(|e| {
            Error::generation_with_context(
                format!("Invalid generateText response: {}", e),
                ErrorContext::new().with_source("generative_language"),
            )
        })?;
        if parsed.candidates.is_empty() && !parsed.filters.is_empty() {
            tracing::warn!(filters = parsed.filters.len(), "prompt was filtered by the service");
        }
        let outputs: Vec<String> = parsed
            .candidates
            .into_iter()
            .map(|c| c.output)
            .filter(|output| !output.trim().is_empty())
            .collect();
        tracing::debug!(model = %self.model, candidates = outputs.len(), "generateText completed");
        Ok(outputs)
    }

    fn name(&self) -> &str {
        "generative_language"
    }
}

pub struct GenerativeLanguageClientBuilder {
    model: Option<String>,
    api_key: Option<String>,
    base_url: Option<String>,
    timeout: Duration,
}

impl GenerativeLanguageClientBuilder {
    pub fn new() -> Self {
        Self {
            model: None,
            api_key: None,
            base_url: None,
            timeout: Duration::from_secs(30),
        }
    }

    /// Seeds every builder field from configuration.
    pub fn from_config(config: &GenerationConfig) -> Self {
        let mut builder = Self::new()
            .model(config.model.clone())
            .base_url(config.base_url.clone())
            .timeout(config.timeout());
        if let Some(key) = &config.api_key {
            builder = builder.api_key(key.clone());
        }
        builder
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<GenerativeLanguageClient> {
        let model = self
            .model
            .filter(|m| !m.trim().is_empty())
            .ok_or_else(|| Error::configuration("Model must be specified"))?;
        let api_key = self
            .api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                Error::configuration_with_context(
                    "API key required",
                    ErrorContext::new().with_field_path("generation.api_key"),
                )
            })?;
        let base_url = self
            .base_url
            .unwrap_or_else(|| crate::config::DEFAULT_BASE_URL.to_string());
        let base_url = Url::parse(&base_url).map_err(|e| {
            Error::configuration_with_context(
                format!("Invalid base URL {}: {}", base_url, e),
                ErrorContext::new().with_field_path("generation.base_url"),
            )
        })?;
        let http_client = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| Error::configuration(format!("Failed to create HTTP client: {}", e)))?;
        Ok(GenerativeLanguageClient {
            http_client,
            base_url,
            model,
            api_key,
        })
    }
}

impl Default for GenerativeLanguageClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_requires_api_key() {
        let err = GenerativeLanguageClient::builder()
            .model("models/text-bison-001")
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, Error::Configuration { .. }));
        assert!(err.to_string().contains("generation.api_key"));
    }

    #[test]
    fn test_build_rejects_bad_base_url() {
        let err = GenerativeLanguageClient::builder()
            .model("models/text-bison-001")
            .api_key("k")
            .base_url("not a url")
            .build()
            .err()
            .unwrap();
        assert!(err.to_string().contains("generation.base_url"));
    }

    #[test]
    fn test_endpoint_includes_model_method() {
        let client = GenerativeLanguageClient::builder()
            .model("models/text-bison-001")
            .api_key("k")
            .base_url("http://localhost:8080/")
            .build()
            .unwrap();
        assert_eq!(
            client.endpoint(),
            "http://localhost:8080/v1beta2/models/text-bison-001:generateText"
        );
        assert_eq!(client.name(), "generative_language");
    }
}
