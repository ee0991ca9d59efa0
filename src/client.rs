//! Request dispatcher for the compliance platform API.
//!
//! Every tool funnels through [`ApiClient::request`], which performs exactly
//! one HTTP call and folds any failure into an [`ApiResponse::Failure`].

use std::error::Error as _;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Method;
use serde_json::Value as JsonValue;

use crate::config::Config;

/// Per-call timeout for upstream requests.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Outcome of a single upstream call.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
    /// Decoded JSON body of a 2xx response.
    Success(JsonValue),
    /// HTTP or transport failure description.
    Failure(String),
}

impl ApiResponse {
    /// Whether this is a failure.
    pub fn is_failure(&self) -> bool {
        matches!(self, ApiResponse::Failure(_))
    }

    /// Render as the JSON handed back to the tool caller.
    ///
    /// Failures become `{"error": "<message>"}`.
    pub fn into_json(self) -> JsonValue {
        match self {
            ApiResponse::Success(body) => body,
            ApiResponse::Failure(message) => serde_json::json!({ "error": message }),
        }
    }
}

/// Ordered query parameters for one request.
pub type QueryParams = Vec<(&'static str, String)>;

/// Client for the compliance platform API.
///
/// Cheap to clone; clones share the same immutable [`Config`].
#[derive(Debug, Clone)]
pub struct ApiClient {
    config: Arc<Config>,
    timeout: Duration,
}

impl ApiClient {
    /// Create a client using the default [`REQUEST_TIMEOUT`].
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
            timeout: REQUEST_TIMEOUT,
        }
    }

    /// Override the per-call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The configuration this client sends requests with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Issue a GET request without a body.
    pub async fn get(&self, path: &str, params: &QueryParams) -> ApiResponse {
        self.request(Method::GET, path, params, None).await
    }

    /// Issue one request against `base_url + path`.
    ///
    /// Never fails: non-2xx statuses and transport errors are returned as
    /// [`ApiResponse::Failure`].
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        params: &QueryParams,
        body: Option<&JsonValue>,
    ) -> ApiResponse {
        let url = format!("{}{}", self.config.base_url(), path);
        tracing::debug!(%method, %url, ?params, "upstream request");

        match self.send(method, &url, params, body).await {
            Ok(response) => response,
            Err(err) => {
                let message = describe_transport_error(&err);
                tracing::warn!(%url, error = %message, "upstream request failed");
                ApiResponse::Failure(message)
            }
        }
    }

    async fn send(
        &self,
        method: Method,
        url: &str,
        params: &QueryParams,
        body: Option<&JsonValue>,
    ) -> std::result::Result<ApiResponse, reqwest::Error> {
        let headers = match self.config.headers() {
            Ok(headers) => headers,
            Err(e) => return Ok(ApiResponse::Failure(e.to_string())),
        };

        // A fresh client per call: no connection is reused across calls.
        // Redirects are not followed; a 3xx is reported like any other non-2xx.
        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::none())
            .pool_max_idle_per_host(0)
            .build()?;

        let mut request = client.request(method, url).query(params);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        tracing::debug!(status = status.as_u16(), bytes = text.len(), "upstream response");

        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), %url, "upstream returned error status");
            return Ok(ApiResponse::Failure(format!(
                "API Error {}: {}",
                status.as_u16(),
                text
            )));
        }

        match serde_json::from_str(&text) {
            Ok(body) => Ok(ApiResponse::Success(body)),
            Err(e) => Ok(ApiResponse::Failure(format!(
                "Invalid JSON in response: {}",
                e
            ))),
        }
    }
}

/// Flatten a reqwest error and its sources into one message.
fn describe_transport_error(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }

    if err.is_timeout() {
        format!("request timed out: {}", message)
    } else {
        message
    }
}
