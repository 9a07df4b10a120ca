//! HTTP utilities for Morpheus REST API calls

use super::error::ApiError;
use reqwest::{Client, Method, StatusCode};
use serde_json::Value;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Sanitize response body for logging
/// Truncates long responses and strips control characters
fn sanitize_for_log(body: &str) -> String {
    let truncated = match body.char_indices().nth(MAX_LOG_BODY_LENGTH) {
        Some((cut, _)) => format!("{}... [truncated, {} bytes total]", &body[..cut], body.len()),
        None => body.to_string(),
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// Decoded reply of a successful API call
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl ApiResponse {
    /// Object stored under `key` in the response envelope, if any
    pub fn entity(&self, key: &str) -> Option<&Value> {
        self.body.get(key).filter(|v| !v.is_null())
    }
}

/// HTTP client wrapper for Morpheus API calls
#[derive(Clone)]
pub struct MorpheusHttpClient {
    client: Client,
}

impl MorpheusHttpClient {
    /// Create a new HTTP client
    pub fn new() -> Result<Self, ApiError> {
        let client = Client::builder()
            .user_agent(concat!("morpheus-provider/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client })
    }

    /// Make a GET request
    pub async fn get(&self, url: &str, token: &str) -> Result<ApiResponse, ApiError> {
        self.send(Method::GET, url, token, None).await
    }

    /// Make a POST request with a JSON body
    pub async fn post(&self, url: &str, token: &str, body: &Value) -> Result<ApiResponse, ApiError> {
        self.send(Method::POST, url, token, Some(body)).await
    }

    /// Make a PUT request with a JSON body
    pub async fn put(&self, url: &str, token: &str, body: &Value) -> Result<ApiResponse, ApiError> {
        self.send(Method::PUT, url, token, Some(body)).await
    }

    /// Make a DELETE request
    pub async fn delete(&self, url: &str, token: &str) -> Result<ApiResponse, ApiError> {
        self.send(Method::DELETE, url, token, None).await
    }

    /// Make an unauthenticated form POST (used for the OAuth token exchange)
    pub async fn post_form(
        &self,
        url: &str,
        form: &[(&str, &str)],
    ) -> Result<ApiResponse, ApiError> {
        tracing::debug!("POST {}", url);

        let response = self.client.post(url).form(form).send().await?;
        Self::read_response(response).await
    }

    async fn send(
        &self,
        method: Method,
        url: &str,
        token: &str,
        body: Option<&Value>,
    ) -> Result<ApiResponse, ApiError> {
        // Request bodies may carry secrets, only the target is logged
        tracing::debug!("{} {}", method, url);

        let mut request = self.client.request(method, url).bearer_auth(token);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        Self::read_response(response).await
    }

    async fn read_response(response: reqwest::Response) -> Result<ApiResponse, ApiError> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            // Security: Only log sanitized/truncated error body to avoid leaking sensitive data
            tracing::error!("API error: {} - {}", status, sanitize_for_log(&body));
            return Err(ApiError::Status {
                status,
                message: error_message(&body).unwrap_or_else(|| {
                    status.canonical_reason().unwrap_or("unknown").to_string()
                }),
            });
        }

        // Handle empty response
        if body.trim().is_empty() {
            return Ok(ApiResponse {
                status,
                body: Value::Null,
            });
        }

        let body = serde_json::from_str(&body)?;
        Ok(ApiResponse { status, body })
    }
}

/// Pull the human readable message out of a Morpheus error body
fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .get("msg")
        .or_else(|| value.get("message"))
        .or_else(|| value.get("error_description"))
        .and_then(|v| v.as_str())
        .map(sanitize_for_log)
}

/// Format an API error for display
/// Security: generic messages avoid echoing server internals back to the user
pub fn format_api_error(error: &ApiError) -> String {
    match error.status().map(|s| s.as_u16()) {
        Some(401) => "Authentication failed. Check the Morpheus access token or credentials.".to_string(),
        Some(403) => "Permission denied. Check the Morpheus role permissions of this user.".to_string(),
        Some(404) => "Resource not found.".to_string(),
        Some(409) => "Resource conflict. The resource may already exist or be in use.".to_string(),
        Some(429) => "Rate limit exceeded. Please try again later.".to_string(),
        Some(400) | Some(422) => match error {
            ApiError::Status { message, .. } => format!("Invalid request: {}", message),
            _ => "Invalid request. Check your parameters.".to_string(),
        },
        Some(code) if code >= 500 => {
            "Morpheus appliance temporarily unavailable. Please try again.".to_string()
        }
        _ => error
            .to_string()
            .chars()
            .filter(|c| c.is_ascii_graphic() || *c == ' ')
            .take(80)
            .collect(),
    }
}
