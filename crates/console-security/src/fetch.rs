//! Secured request wrapper
//!
//! One outbound HTTP call per [`SecureClient::fetch`], decorated with:
//! - `Authorization: Bearer <token>` when a session is active
//! - anti-cache and anti-framing headers that caller headers cannot weaken
//! - a hard deadline covering the whole exchange
//! - forced logout when the server answers 401
//!
//! ```text
//! FetchOptions ─→ merge headers ─→ timeout_at(send) ─→ status ─→ timeout_at(body) ─→ T
//!                                        │                │
//!                                   Timeout error     401 → session.expire()
//! ```
//!
//! There are no retries: a single attempt succeeds or fails the caller.

use crate::error::FetchError;
use crate::session::SessionStore;
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CACHE_CONTROL, CONTENT_TYPE,
    X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS,
};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, warn, Instrument};
use uuid::Uuid;

/// Deadline applied when the caller sets none
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(8000);

const NO_STORE: &str = "no-store, no-cache, must-revalidate";

/// Per-call request options
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// HTTP method
    pub method: Method,
    /// Caller headers; security headers override conflicting entries
    pub headers: HeaderMap,
    /// Request body
    pub body: Option<Vec<u8>>,
    /// Deadline, [`DEFAULT_TIMEOUT`] when unset
    pub timeout: Option<Duration>,
}

impl FetchOptions {
    /// GET without body
    #[must_use]
    pub fn get() -> Self {
        Self::default()
    }

    /// Request with the given method
    #[must_use]
    pub fn method(method: Method) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }

    /// POST with a JSON body
    ///
    /// # Errors
    /// - `FetchError::Decode` if `body` cannot be serialized
    pub fn post_json<B: Serialize>(body: &B) -> Result<Self, FetchError> {
        Self::method(Method::POST).with_json(body)
    }

    /// With JSON body and `Content-Type: application/json`
    ///
    /// # Errors
    /// - `FetchError::Decode` if `body` cannot be serialized
    pub fn with_json<B: Serialize>(mut self, body: &B) -> Result<Self, FetchError> {
        self.body = Some(serde_json::to_vec(body)?);
        self.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(self)
    }

    /// With raw body
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// With an extra header
    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// With an extra header given as text
    ///
    /// # Errors
    /// - `FetchError::InvalidRequest` if the name or value is not a legal header
    pub fn with_raw_header(self, name: &str, value: &str) -> Result<Self, FetchError> {
        let name = HeaderName::from_bytes(name.trim().as_bytes())
            .map_err(|e| FetchError::InvalidRequest(format!("header name {name:?}: {e}")))?;
        let value = HeaderValue::from_str(value.trim())
            .map_err(|e| FetchError::InvalidRequest(format!("header {name}: {e}")))?;
        Ok(self.with_header(name, value))
    }

    /// With deadline
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// With deadline in milliseconds
    #[must_use]
    pub fn with_timeout_ms(self, timeout_ms: u64) -> Self {
        self.with_timeout(Duration::from_millis(timeout_ms))
    }
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            method: Method::GET,
            headers: HeaderMap::new(),
            body: None,
            timeout: None,
        }
    }
}

/// One secured call, as logged
#[derive(Debug, Clone)]
pub struct RequestEnvelope {
    /// Correlation id
    pub id: Uuid,
    /// HTTP method
    pub method: Method,
    /// Target URL
    pub url: String,
    /// Effective deadline
    pub timeout: Duration,
}

/// HTTP client bound to a session store
#[derive(Debug, Clone)]
pub struct SecureClient {
    http: reqwest::Client,
    session: Arc<SessionStore>,
}

impl SecureClient {
    /// Create client with a default reqwest client
    #[must_use]
    pub fn new(session: Arc<SessionStore>) -> Self {
        Self::with_http_client(reqwest::Client::new(), session)
    }

    /// Create client around an existing reqwest client
    #[must_use]
    pub fn with_http_client(http: reqwest::Client, session: Arc<SessionStore>) -> Self {
        Self { http, session }
    }

    /// Session this client authenticates with
    #[inline]
    #[must_use]
    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    /// Perform one secured call and parse the JSON body as `T`
    ///
    /// # Errors
    /// - `FetchError::Timeout` if the deadline elapses first
    /// - `FetchError::SessionExpired` on 401, after clearing the session
    /// - `FetchError::Api` on any other non-success status
    /// - `FetchError::Transport` on connection failure
    /// - `FetchError::Decode` if the body is not valid JSON for `T`
    pub async fn fetch<T: DeserializeOwned>(
        &self,
        url: &str,
        options: FetchOptions,
    ) -> Result<T, FetchError> {
        let envelope = RequestEnvelope {
            id: Uuid::new_v4(),
            method: options.method.clone(),
            url: url.to_string(),
            timeout: options.timeout.unwrap_or(DEFAULT_TIMEOUT),
        };
        let span = tracing::debug_span!(
            "secure_fetch",
            request_id = %envelope.id,
            method = %envelope.method,
            url = %envelope.url,
        );

        let result = self.execute(&envelope, options).instrument(span.clone()).await;
        if let Err(ref err) = result {
            span.in_scope(|| warn!(kind = err.kind(), error = %err, "secure fetch failed"));
        }
        result
    }

    /// [`fetch`](Self::fetch) into an untyped JSON value
    ///
    /// # Errors
    /// See [`fetch`](Self::fetch).
    pub async fn fetch_json(
        &self,
        url: &str,
        options: FetchOptions,
    ) -> Result<serde_json::Value, FetchError> {
        self.fetch(url, options).await
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        envelope: &RequestEnvelope,
        options: FetchOptions,
    ) -> Result<T, FetchError> {
        let timeout_ms = u64::try_from(envelope.timeout.as_millis()).unwrap_or(u64::MAX);
        let deadline = Instant::now() + envelope.timeout;
        let has_body = options.body.is_some();

        let headers = self.secure_headers(options.headers, has_body)?;
        let mut request = self
            .http
            .request(envelope.method.clone(), envelope.url.as_str())
            .headers(headers);
        if let Some(body) = options.body {
            request = request.body(body);
        }

        // Dropping the send future on expiry aborts the request.
        let response = timeout_at(deadline, request.send())
            .await
            .map_err(|_| FetchError::Timeout { timeout_ms })?
            .map_err(|e| classify(e, timeout_ms))?;

        let status = response.status();
        debug!(status = status.as_u16(), "response received");

        if status == StatusCode::UNAUTHORIZED {
            self.session.expire();
            return Err(FetchError::SessionExpired);
        }
        if !status.is_success() {
            return Err(FetchError::Api {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let body = timeout_at(deadline, response.bytes())
            .await
            .map_err(|_| FetchError::Timeout { timeout_ms })?
            .map_err(|e| classify(e, timeout_ms))?;

        Ok(serde_json::from_slice(&body)?)
    }

    /// Caller headers first, security headers last so they win
    fn secure_headers(&self, caller: HeaderMap, has_body: bool) -> Result<HeaderMap, FetchError> {
        let mut headers = caller;

        if let Some(token) = self.session.token() {
            let mut value = HeaderValue::from_str(&token.bearer())
                .map_err(|_| FetchError::InvalidRequest("token is not a valid header".into()))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        headers.insert(CACHE_CONTROL, HeaderValue::from_static(NO_STORE));
        headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
        headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));

        if has_body && !headers.contains_key(CONTENT_TYPE) {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }

        Ok(headers)
    }
}

fn classify(err: reqwest::Error, timeout_ms: u64) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout { timeout_ms }
    } else {
        FetchError::Transport(err)
    }
}
