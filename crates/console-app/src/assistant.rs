//! Generative-text assistant
//!
//! Produces flavor text for the audit panel. The service is an opaque
//! prompt → text function; this module only guarantees that it is never
//! called without a configured credential and that its output is escaped
//! before anything renders it.

use crate::config::AssistantConfig;
use crate::credentials::{CredentialStore, ASSISTANT_KEY};
use crate::error::AssistantError;
use async_trait::async_trait;
use console_security::sanitize;
use reqwest::header::HeaderValue;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

/// Header carrying the service key
pub const API_KEY_HEADER: &str = "x-goog-api-key";

/// Deadline used when none is configured
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Prompt → text generator
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate text for `prompt` with `model`
    async fn generate(&self, prompt: &str, model: &str) -> Result<String, AssistantError>;
}

/// HTTP client for the `generateContent` endpoint
#[derive(Debug, Clone)]
pub struct GenAiClient {
    http: reqwest::Client,
    endpoint: String,
    credentials: CredentialStore,
    timeout: Duration,
}

impl GenAiClient {
    /// Create client for `endpoint` reading its key from `credentials`
    #[must_use]
    pub fn new(endpoint: impl Into<String>, credentials: CredentialStore) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
            credentials,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set the per-call deadline
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Per-call deadline
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    // Rendered errors never carry the request URL.
    fn request_error(&self, err: reqwest::Error) -> AssistantError {
        if err.is_timeout() {
            AssistantError::Timeout {
                timeout_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            }
        } else {
            AssistantError::Request(err.without_url())
        }
    }

    fn url(&self, model: &str) -> String {
        format!(
            "{}/v1beta/models/{model}:generateContent",
            self.endpoint.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl TextGenerator for GenAiClient {
    async fn generate(&self, prompt: &str, model: &str) -> Result<String, AssistantError> {
        let Some(key) = self.credentials.get(ASSISTANT_KEY)? else {
            warn!("assistant call blocked: no credential configured");
            return Err(AssistantError::MissingCredential);
        };

        let mut api_key =
            HeaderValue::from_str(&key).map_err(|_| AssistantError::InvalidCredential)?;
        api_key.set_sensitive(true);

        debug!(model, timeout_ms = self.timeout.as_millis(), "assistant request");
        let response = self
            .http
            .post(self.url(model))
            .header(API_KEY_HEADER, api_key)
            .timeout(self.timeout)
            .json(&json!({ "contents": [{ "parts": [{ "text": prompt }] }] }))
            .send()
            .await
            .map_err(|err| self.request_error(err))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AssistantError::Status {
                status: status.as_u16(),
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|err| self.request_error(err))?;
        body.pointer("/candidates/0/content/parts/0/text")
            .and_then(Value::as_str)
            .filter(|text| !text.trim().is_empty())
            .map(str::to_string)
            .ok_or(AssistantError::EmptyResponse)
    }
}

/// Audit assistant producing render-safe text
#[derive(Debug, Clone)]
pub struct Assistant<G> {
    generator: G,
    model: String,
}

impl<G: TextGenerator> Assistant<G> {
    /// Wrap `generator` using `model`
    #[must_use]
    pub fn new(generator: G, model: impl Into<String>) -> Self {
        Self {
            generator,
            model: model.into(),
        }
    }

    /// Model identifier in use
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Generate flavor text for `prompt`, escaped for markup
    ///
    /// # Errors
    /// Any [`AssistantError`] from the generator, unchanged.
    pub async fn brief(&self, prompt: &str) -> Result<String, AssistantError> {
        let text = self.generator.generate(prompt, &self.model).await?;
        Ok(sanitize(text))
    }
}

impl Assistant<GenAiClient> {
    /// Assistant backed by the configured HTTP service
    #[must_use]
    pub fn from_config(config: &AssistantConfig, credentials: CredentialStore) -> Self {
        Self::new(
            GenAiClient::new(config.endpoint.clone(), credentials).with_timeout(config.timeout()),
            config.model.clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;

    #[tokio::test]
    async fn brief_sanitizes_generated_text() {
        let mut generator = MockTextGenerator::new();
        generator
            .expect_generate()
            .with(eq("status report"), eq("test-model"))
            .times(1)
            .returning(|_, _| Ok("<i>all nodes nominal</i>".to_string()));

        let assistant = Assistant::new(generator, "test-model");
        let text = assistant.brief("status report").await.unwrap();

        assert_eq!(text, "&lt;i&gt;all nodes nominal&lt;&#x2F;i&gt;");
    }

    #[tokio::test]
    async fn brief_surfaces_generator_errors() {
        let mut generator = MockTextGenerator::new();
        generator
            .expect_generate()
            .returning(|_, _| Err(AssistantError::MissingCredential));

        let assistant = Assistant::new(generator, "m");
        let err = assistant.brief("x").await.unwrap_err();

        assert!(err.is_missing_credential());
    }

    #[test]
    fn url_includes_model() {
        let dir = tempfile::tempdir().unwrap();
        let client = GenAiClient::new(
            "https://ai.example.test/",
            CredentialStore::new(dir.path().join("c.json")),
        );
        assert_eq!(
            client.url("gemini-2.0-flash"),
            "https://ai.example.test/v1beta/models/gemini-2.0-flash:generateContent"
        );
        assert_eq!(client.timeout(), DEFAULT_TIMEOUT);
    }

    #[tokio::test]
    async fn unusable_key_is_rejected_before_sending() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path().join("c.json"));
        store.set(ASSISTANT_KEY, "line\nbreak").unwrap();

        let client = GenAiClient::new("http://127.0.0.1:9", store);
        let err = client.generate("x", "m").await.unwrap_err();

        assert!(matches!(err, AssistantError::InvalidCredential));
    }
}
