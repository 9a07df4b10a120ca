//! Morpheus Client
//!
//! Main client for interacting with the Morpheus API, combining authentication
//! and HTTP functionality.

use super::auth::{AuthMethod, MorpheusCredentials};
use super::error::ApiError;
use super::http::{ApiResponse, MorpheusHttpClient};
use reqwest::StatusCode;
use serde_json::Value;
use url::Url;

/// Main Morpheus client
#[derive(Clone)]
pub struct MorpheusClient {
    pub credentials: MorpheusCredentials,
    pub http: MorpheusHttpClient,
    pub base_url: Url,
}

impl MorpheusClient {
    /// Create a new client for the appliance at `url`
    pub fn new(url: &str, auth: AuthMethod) -> Result<Self, ApiError> {
        let mut base_url = Url::parse(url)?;
        // Url::join replaces the last segment unless the base ends with a slash
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let http = MorpheusHttpClient::new()?;
        let credentials = MorpheusCredentials::new(&base_url, auth, http.clone())?;

        Ok(Self {
            credentials,
            http,
            base_url,
        })
    }

    /// Build an absolute API URL from a path such as `/api/tasks/12`
    pub fn api_url(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    /// Make a GET request to the Morpheus API
    pub async fn get(&self, url: &Url) -> Result<ApiResponse, ApiError> {
        let token = self.credentials.get_token().await?;
        match self.http.get(url.as_str(), &token).await {
            Err(err) if self.token_rejected(&err) => {
                let token = self.credentials.refresh_token().await?;
                self.http.get(url.as_str(), &token).await
            }
            other => other,
        }
    }

    /// Make a POST request to the Morpheus API
    pub async fn post(&self, url: &Url, body: &Value) -> Result<ApiResponse, ApiError> {
        let token = self.credentials.get_token().await?;
        match self.http.post(url.as_str(), &token, body).await {
            Err(err) if self.token_rejected(&err) => {
                let token = self.credentials.refresh_token().await?;
                self.http.post(url.as_str(), &token, body).await
            }
            other => other,
        }
    }

    /// Make a PUT request to the Morpheus API
    pub async fn put(&self, url: &Url, body: &Value) -> Result<ApiResponse, ApiError> {
        let token = self.credentials.get_token().await?;
        match self.http.put(url.as_str(), &token, body).await {
            Err(err) if self.token_rejected(&err) => {
                let token = self.credentials.refresh_token().await?;
                self.http.put(url.as_str(), &token, body).await
            }
            other => other,
        }
    }

    /// Make a DELETE request to the Morpheus API
    pub async fn delete(&self, url: &Url) -> Result<ApiResponse, ApiError> {
        let token = self.credentials.get_token().await?;
        match self.http.delete(url.as_str(), &token).await {
            Err(err) if self.token_rejected(&err) => {
                let token = self.credentials.refresh_token().await?;
                self.http.delete(url.as_str(), &token).await
            }
            other => other,
        }
    }

    /// A 401 is worth one retry only when the token came from a password grant
    fn token_rejected(&self, err: &ApiError) -> bool {
        err.status() == Some(StatusCode::UNAUTHORIZED) && self.credentials.is_renewable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(url: &str) -> MorpheusClient {
        MorpheusClient::new(url, AuthMethod::AccessToken("t".into())).unwrap()
    }

    #[test]
    fn test_api_url_keeps_base_path() {
        let client = client("https://cmp.example.com/morpheus");
        let url = client.api_url("/api/tasks/7").unwrap();
        assert_eq!(url.as_str(), "https://cmp.example.com/morpheus/api/tasks/7");
    }

    #[test]
    fn test_api_url_on_bare_host() {
        let client = client("https://cmp.example.com");
        let url = client.api_url("api/library/option-types").unwrap();
        assert_eq!(url.as_str(), "https://cmp.example.com/api/library/option-types");
    }

    #[test]
    fn test_invalid_url_is_rejected() {
        let result = MorpheusClient::new("not a url", AuthMethod::AccessToken("t".into()));
        assert!(matches!(result, Err(ApiError::Url(_))));
    }
}
