//! Morpheus Authentication
//!
//! Handles authentication with either a pre-issued API access token or a
//! username/password pair exchanged through the appliance's OAuth endpoint.

use super::error::ApiError;
use super::http::MorpheusHttpClient;
use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use url::Url;

/// OAuth client id Morpheus issues API tokens for
pub const OAUTH_CLIENT_ID: &str = "morph-api";

/// Token expiry buffer - refresh tokens this much before they actually expire
/// This prevents using tokens that are about to expire during a request
const TOKEN_EXPIRY_BUFFER: Duration = Duration::from_secs(60);

/// Default token TTL if the appliance doesn't report one
const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(30 * 60);

/// How the provider proves its identity to the appliance
#[derive(Clone)]
pub enum AuthMethod {
    /// Pre-issued access token, used as is
    AccessToken(String),
    /// Username and password exchanged for a bearer token
    Password { username: String, password: String },
}

impl std::fmt::Debug for AuthMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AccessToken(_) => f.write_str("AccessToken(***)"),
            Self::Password { username, .. } => f
                .debug_struct("Password")
                .field("username", username)
                .finish_non_exhaustive(),
        }
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// Morpheus credentials holder with token caching
#[derive(Clone)]
pub struct MorpheusCredentials {
    method: AuthMethod,
    token_url: Url,
    http: MorpheusHttpClient,
    token_cache: Arc<RwLock<Option<CachedToken>>>,
}

#[derive(Clone)]
struct CachedToken {
    token: String,
    /// When this token expires (with buffer applied)
    expires_at: Instant,
}

impl CachedToken {
    /// Check if this cached token is still valid
    fn is_valid(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

impl MorpheusCredentials {
    pub fn new(base_url: &Url, method: AuthMethod, http: MorpheusHttpClient) -> Result<Self, ApiError> {
        let mut token_url = base_url.join("oauth/token")?;
        token_url
            .query_pairs_mut()
            .append_pair("grant_type", "password")
            .append_pair("scope", "write")
            .append_pair("client_id", OAUTH_CLIENT_ID);

        Ok(Self {
            method,
            token_url,
            http,
            token_cache: Arc::new(RwLock::new(None)),
        })
    }

    /// Get an access token for API calls
    /// Security: Checks token expiry before returning cached token
    pub async fn get_token(&self) -> Result<String, ApiError> {
        let (username, password) = match &self.method {
            AuthMethod::AccessToken(token) => return Ok(token.clone()),
            AuthMethod::Password { username, password } => (username, password),
        };

        // Check cache first - but only return if token is still valid
        {
            let cache = self.token_cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.is_valid() {
                    return Ok(cached.token.clone());
                }
                tracing::debug!("Cached token expired, fetching new token");
            }
        }

        let response = self
            .http
            .post_form(
                self.token_url.as_str(),
                &[("username", username.as_str()), ("password", password.as_str())],
            )
            .await
            .map_err(|e| ApiError::Auth(e.to_string()))?;

        let token: TokenResponse = serde_json::from_value(response.body)
            .map_err(|_| ApiError::Auth("token response did not contain an access_token".into()))?;

        let ttl = token
            .expires_in
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TOKEN_TTL);
        let expires_at = Instant::now() + ttl.saturating_sub(TOKEN_EXPIRY_BUFFER);

        {
            let mut cache = self.token_cache.write().await;
            *cache = Some(CachedToken {
                token: token.access_token.clone(),
                expires_at,
            });
        }

        tracing::debug!(
            "New token cached for {}, expires in ~{} minutes",
            username,
            ttl.saturating_sub(TOKEN_EXPIRY_BUFFER).as_secs() / 60
        );

        Ok(token.access_token)
    }

    /// Whether a rejected token can be replaced by asking the appliance again
    pub fn is_renewable(&self) -> bool {
        matches!(self.method, AuthMethod::Password { .. })
    }

    /// Force refresh the token
    pub async fn refresh_token(&self) -> Result<String, ApiError> {
        {
            let mut cache = self.token_cache.write().await;
            *cache = None;
        }

        self.get_token().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_url_carries_grant_parameters() {
        let base = Url::parse("https://morpheus.example.com/").unwrap();
        let creds = MorpheusCredentials::new(
            &base,
            AuthMethod::AccessToken("abc".into()),
            MorpheusHttpClient::new().unwrap(),
        )
        .unwrap();

        assert_eq!(creds.token_url.path(), "/oauth/token");
        let query = creds.token_url.query().unwrap();
        assert!(query.contains("grant_type=password"));
        assert!(query.contains("client_id=morph-api"));
    }

    #[test]
    fn test_access_token_is_returned_verbatim() {
        let base = Url::parse("https://morpheus.example.com/").unwrap();
        let creds = MorpheusCredentials::new(
            &base,
            AuthMethod::AccessToken("abc".into()),
            MorpheusHttpClient::new().unwrap(),
        )
        .unwrap();

        let token = tokio_test::block_on(creds.get_token()).unwrap();
        assert_eq!(token, "abc");
    }

    #[test]
    fn test_debug_hides_secrets() {
        let method = AuthMethod::Password {
            username: "admin".into(),
            password: "hunter2".into(),
        };
        let rendered = format!("{:?}", method);
        assert!(rendered.contains("admin"));
        assert!(!rendered.contains("hunter2"));
        assert_eq!(
            format!("{:?}", AuthMethod::AccessToken("tok".into())),
            "AccessToken(***)"
        );
    }
}
