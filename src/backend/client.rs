//! HTTP client for the restaurant backend REST API.
//!
//! Every call is at-most-once: there are no retries here, and the only
//! deadline is the optional client timeout.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error};

#[derive(Debug, Error)]
pub enum BackendError {
    /// The backend answered with a non-2xx status.
    #[error("Request failed with status {status}: {body}")]
    Upstream { status: u16, body: String },

    /// The backend could not be reached or the exchange broke midway.
    #[error("the restaurant backend could not be reached, the server might be down ({0})")]
    Transport(#[from] reqwest::Error),

    #[error("invalid header {0}")]
    InvalidHeader(String),
}

/// A successfully received body: JSON when it parses, raw text otherwise.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendBody {
    Json(Value),
    Text(String),
}

impl BackendBody {
    fn parse(text: String) -> Self {
        match serde_json::from_str(&text) {
            Ok(value) => BackendBody::Json(value),
            Err(_) => BackendBody::Text(text),
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            BackendBody::Json(value) => Some(value),
            BackendBody::Text(_) => None,
        }
    }

    /// The `message` field most backend endpoints use as their domain status.
    pub fn message(&self) -> Option<&str> {
        self.as_json()
            .and_then(|v| v.get("message"))
            .and_then(Value::as_str)
    }

    /// Look up a top-level field of a JSON object body.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.as_json().and_then(|v| v.get(key))
    }

    pub fn into_json(self) -> Value {
        match self {
            BackendBody::Json(value) => value,
            BackendBody::Text(text) => Value::String(text),
        }
    }
}

/// Per-request options.
#[derive(Debug, Clone, Copy)]
pub struct RequestOptions<'a> {
    /// Raw token, sent unprefixed in `Authorization`.
    pub token: &'a str,
    /// JSON body; only sent for non-GET methods.
    pub body: Option<&'a Value>,
    /// Extra headers, applied after the defaults (may override them).
    pub headers: &'a [(&'a str, &'a str)],
}

impl<'a> RequestOptions<'a> {
    pub fn new(token: &'a str) -> Self {
        Self {
            token,
            body: None,
            headers: &[],
        }
    }

    pub fn with_body(mut self, body: &'a Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_headers(mut self, headers: &'a [(&'a str, &'a str)]) -> Self {
        self.headers = headers;
        self
    }
}

pub struct BackendClient {
    client: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    /// Create a new backend client.
    ///
    /// # Arguments
    /// * `base_url` - Base URL of the backend API (e.g., "http://localhost:9000/api/v1")
    /// * `timeout_sec` - Optional request timeout; `None` leaves calls unbounded
    pub fn new(base_url: impl Into<String>, timeout_sec: Option<u64>) -> Result<Self, BackendError> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = timeout_sec {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build()?;

        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for an endpoint path such as `/tables/create`.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn build_headers(options: &RequestOptions<'_>) -> Result<HeaderMap, BackendError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(options.token)
                .map_err(|_| BackendError::InvalidHeader("authorization".to_string()))?,
        );

        for (name, value) in options.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| BackendError::InvalidHeader(name.to_string()))?;
            let value = HeaderValue::from_str(value)
                .map_err(|_| BackendError::InvalidHeader(name.to_string()))?;
            headers.insert(name, value);
        }

        Ok(headers)
    }

    /// Issue an authenticated request and return the parsed body.
    pub async fn request(
        &self,
        method: Method,
        url: &str,
        options: RequestOptions<'_>,
    ) -> Result<BackendBody, BackendError> {
        let headers = Self::build_headers(&options)?;
        let mut request = self.client.request(method.clone(), url).headers(headers);

        if method != Method::GET {
            if let Some(body) = options.body {
                request = request.body(body.to_string());
            }
        }

        debug!("Backend {} {}", method, url);
        let response = request.send().await.map_err(|e| {
            error!("Error making {} request to {}: {}", method, url, e);
            BackendError::Transport(e)
        })?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            debug!("Backend {} {} answered {}", method, url, status);
            return Err(BackendError::Upstream {
                status: status.as_u16(),
                body: text,
            });
        }

        Ok(BackendBody::parse(text))
    }

    pub async fn get(&self, url: &str, token: &str) -> Result<BackendBody, BackendError> {
        self.request(Method::GET, url, RequestOptions::new(token))
            .await
    }

    pub async fn post(
        &self,
        url: &str,
        token: &str,
        body: &Value,
    ) -> Result<BackendBody, BackendError> {
        self.request(Method::POST, url, RequestOptions::new(token).with_body(body))
            .await
    }

    pub async fn put(
        &self,
        url: &str,
        token: &str,
        body: &Value,
    ) -> Result<BackendBody, BackendError> {
        self.request(Method::PUT, url, RequestOptions::new(token).with_body(body))
            .await
    }

    pub async fn delete(&self, url: &str, token: &str) -> Result<BackendBody, BackendError> {
        self.request(Method::DELETE, url, RequestOptions::new(token))
            .await
    }
}
