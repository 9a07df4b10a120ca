//! Configuration Management
//!
//! Connection settings for the Morpheus appliance. Values come from command
//! line flags (which clap also fills from `MORPHEUS_API_*` environment
//! variables) and fall back to the config file.

use crate::morpheus::auth::AuthMethod;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Persisted connection settings. Secrets are never written back.
#[derive(Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    /// Appliance URL, e.g. `https://morpheus.example.com`
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default, skip_serializing)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mask = |v: &Option<String>| v.as_ref().map(|_| "***");
        f.debug_struct("Config")
            .field("url", &self.url)
            .field("access_token", &mask(&self.access_token))
            .field("username", &self.username)
            .field("password", &mask(&self.password))
            .finish()
    }
}

impl Config {
    /// Get the config file path
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("morpheus-provider").join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };

        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring unreadable config {:?}: {}", path, e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {:?}", parent))?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, content).with_context(|| format!("Failed to write {:?}", path))?;

        Ok(())
    }

    /// Overlay `overrides` (CLI / env) on top of the file values
    pub fn merged(self, overrides: Config) -> Self {
        Self {
            url: overrides.url.or(self.url),
            access_token: overrides.access_token.or(self.access_token),
            username: overrides.username.or(self.username),
            password: overrides.password.or(self.password),
        }
    }

    /// Get effective appliance URL
    pub fn effective_url(&self) -> Result<&str> {
        match self.url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => Ok(url),
            _ => bail!("No Morpheus URL configured (use --url or MORPHEUS_API_URL)"),
        }
    }

    /// Get effective credentials (access token > username/password)
    pub fn auth_method(&self) -> Result<AuthMethod> {
        if let Some(token) = self.access_token.as_ref().filter(|t| !t.is_empty()) {
            return Ok(AuthMethod::AccessToken(token.clone()));
        }
        match (&self.username, &self.password) {
            (Some(username), Some(password)) if !username.is_empty() => Ok(AuthMethod::Password {
                username: username.clone(),
                password: password.clone(),
            }),
            (Some(_), None) => bail!("A username was given without a password"),
            _ => bail!(
                "No Morpheus credentials configured (use --access-token or --username/--password)"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_win_over_file() {
        let file = Config {
            url: Some("https://file.example.com".into()),
            username: Some("file-user".into()),
            ..Default::default()
        };
        let cli = Config {
            url: Some("https://cli.example.com".into()),
            password: Some("pw".into()),
            ..Default::default()
        };

        let config = file.merged(cli);
        assert_eq!(config.effective_url().unwrap(), "https://cli.example.com");
        assert!(matches!(
            config.auth_method().unwrap(),
            AuthMethod::Password { ref username, .. } if username == "file-user"
        ));
    }

    #[test]
    fn test_token_preferred_over_password() {
        let config = Config {
            access_token: Some("tok".into()),
            username: Some("admin".into()),
            password: Some("pw".into()),
            ..Default::default()
        };
        assert!(matches!(config.auth_method().unwrap(), AuthMethod::AccessToken(_)));
    }

    #[test]
    fn test_missing_settings_are_errors() {
        let config = Config::default();
        assert!(config.effective_url().is_err());
        assert!(config.auth_method().is_err());
    }

    #[test]
    fn test_secrets_are_not_persisted() {
        let config = Config {
            url: Some("https://m.example.com".into()),
            access_token: Some("tok".into()),
            password: Some("pw".into()),
            ..Default::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("tok"));
        assert!(!json.contains("pw"));
        assert!(!format!("{:?}", config).contains("tok"));
    }
}
