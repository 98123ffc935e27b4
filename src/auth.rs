//! Google OAuth2 credential handling.
//!
//! Credential acquisition is modeled as an injected capability: the Drive client only sees
//! the [`CredentialProvider`] trait, so tests can substitute a canned token. The concrete
//! [`OAuthCredentialProvider`] works from files on disk — the client secrets downloaded from
//! Google Cloud Console and a previously provisioned token — and refreshes the access token
//! against the token endpoint when it has expired. The interactive consent flow that mints
//! the first token is out of scope for a headless server process.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use time::{Duration, OffsetDateTime, format_description::well_known::Rfc3339};
use tokio::sync::Mutex;

use crate::config::get_config;

/// Clock skew subtracted from the stored expiry when deciding whether to refresh.
const EXPIRY_SKEW_SECONDS: i64 = 60;

/// Errors raised while obtaining or refreshing Google credentials.
#[derive(Debug, Error)]
pub enum AuthError {
    /// OAuth2 client secrets file is missing.
    #[error(
        "credentials file not found at {0}; download it from Google Cloud Console > APIs & Services > Credentials"
    )]
    MissingCredentials(PathBuf),
    /// Stored token file is missing.
    #[error(
        "token file not found at {0}; provision one with a one-time OAuth consent flow before starting the server"
    )]
    MissingToken(PathBuf),
    /// Credentials or token file could not be parsed.
    #[error("failed to parse {path}: {source}")]
    Malformed {
        /// File that failed to parse.
        path: PathBuf,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
    /// Token refresh request was rejected or unreachable.
    #[error("token refresh failed: {0}")]
    Refresh(String),
    /// Filesystem access to a credential file failed.
    #[error("credential file I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Capability for producing a valid Drive access token on demand.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Return a currently valid bearer token, refreshing if necessary.
    async fn access_token(&self) -> Result<String, AuthError>;
}

/// OAuth2 client identity parsed from the secrets file.
#[derive(Debug, Clone, Deserialize)]
struct ClientSecrets {
    client_id: String,
    client_secret: String,
    #[serde(default = "default_token_uri")]
    token_uri: String,
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

/// Wrapper matching the Google Cloud Console download format.
#[derive(Debug, Deserialize)]
struct SecretsFile {
    installed: Option<ClientSecrets>,
    web: Option<ClientSecrets>,
}

/// Persisted token state, compatible with the file format written by Google's
/// client libraries (`token` plus optional `refresh_token` and RFC3339 `expiry`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredToken {
    /// Current access token.
    #[serde(alias = "access_token")]
    pub token: String,
    /// Long-lived refresh token, when the consent flow granted one.
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// RFC3339 expiry of the access token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<String>,
}

impl StoredToken {
    /// Whether the access token should be considered stale.
    ///
    /// Tokens without an expiry are trusted; an unparseable expiry is treated as expired
    /// so a refresh gets a chance to repair the file.
    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        match self.expiry.as_deref() {
            None => false,
            Some(raw) => match OffsetDateTime::parse(raw, &Rfc3339) {
                Ok(expiry) => now + Duration::seconds(EXPIRY_SKEW_SECONDS) >= expiry,
                Err(_) => true,
            },
        }
    }
}

/// Shape of the token endpoint's refresh response.
#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,
    expires_in: i64,
}

/// File-backed credential provider with token refresh.
pub struct OAuthCredentialProvider {
    http: Client,
    credentials_path: PathBuf,
    token_path: PathBuf,
    cached: Mutex<Option<StoredToken>>,
}

impl OAuthCredentialProvider {
    /// Build a provider from explicit file locations.
    pub fn new(credentials_path: impl Into<PathBuf>, token_path: impl Into<PathBuf>) -> Self {
        let http = Client::builder()
            .user_agent("docsum/auth")
            .build()
            .expect("Failed to construct reqwest::Client for auth");
        Self {
            http,
            credentials_path: credentials_path.into(),
            token_path: token_path.into(),
            cached: Mutex::new(None),
        }
    }

    /// Build a provider from the loaded configuration.
    pub fn from_config() -> Self {
        let config = get_config();
        Self::new(
            config.google_credentials_path.clone(),
            config.google_token_path.clone(),
        )
    }

    async fn load_secrets(&self) -> Result<ClientSecrets, AuthError> {
        if !self.credentials_path.exists() {
            return Err(AuthError::MissingCredentials(self.credentials_path.clone()));
        }
        let raw = tokio::fs::read_to_string(&self.credentials_path).await?;
        let parsed: SecretsFile =
            serde_json::from_str(&raw).map_err(|source| AuthError::Malformed {
                path: self.credentials_path.clone(),
                source,
            })?;
        parsed
            .installed
            .or(parsed.web)
            .ok_or_else(|| AuthError::Refresh("client secrets carry no installed or web section".to_string()))
    }

    async fn load_token(&self) -> Result<StoredToken, AuthError> {
        if !self.token_path.exists() {
            return Err(AuthError::MissingToken(self.token_path.clone()));
        }
        let raw = tokio::fs::read_to_string(&self.token_path).await?;
        serde_json::from_str(&raw).map_err(|source| AuthError::Malformed {
            path: self.token_path.clone(),
            source,
        })
    }

    async fn persist_token(&self, token: &StoredToken) -> Result<(), AuthError> {
        if let Some(parent) = self.token_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let raw = serde_json::to_string_pretty(token)
            .expect("StoredToken serialization cannot fail");
        tokio::fs::write(&self.token_path, raw).await?;
        tracing::debug!(path = %self.token_path.display(), "Persisted refreshed token");
        Ok(())
    }

    async fn refresh(&self, token: &StoredToken) -> Result<StoredToken, AuthError> {
        let refresh_token = token.refresh_token.as_deref().ok_or_else(|| {
            AuthError::Refresh("stored token has expired and carries no refresh token".to_string())
        })?;
        let secrets = self.load_secrets().await?;

        let params = [
            ("client_id", secrets.client_id.as_str()),
            ("client_secret", secrets.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];
        let response = self
            .http
            .post(&secrets.token_uri)
            .form(&params)
            .send()
            .await
            .map_err(|error| {
                AuthError::Refresh(format!(
                    "failed to reach token endpoint {}: {error}",
                    secrets.token_uri
                ))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Refresh(format!(
                "token endpoint returned {status}: {body}"
            )));
        }

        let body: RefreshResponse = response.json().await.map_err(|error| {
            AuthError::Refresh(format!("malformed token endpoint response: {error}"))
        })?;

        let expiry = OffsetDateTime::now_utc() + Duration::seconds(body.expires_in);
        let refreshed = StoredToken {
            token: body.access_token,
            refresh_token: token.refresh_token.clone(),
            expiry: Some(
                expiry
                    .format(&Rfc3339)
                    .expect("RFC3339 formatting cannot fail for UTC timestamps"),
            ),
        };
        self.persist_token(&refreshed).await?;
        tracing::info!("Refreshed Drive access token");
        Ok(refreshed)
    }

    /// Path of the client secrets file this provider reads.
    pub fn credentials_path(&self) -> &Path {
        &self.credentials_path
    }
}

#[async_trait]
impl CredentialProvider for OAuthCredentialProvider {
    async fn access_token(&self) -> Result<String, AuthError> {
        let mut cached = self.cached.lock().await;
        let now = OffsetDateTime::now_utc();

        if let Some(token) = cached.as_ref() {
            if !token.is_expired(now) {
                return Ok(token.token.clone());
            }
        }

        let stored = match cached.take() {
            Some(token) => token,
            None => self.load_token().await?,
        };

        let live = if stored.is_expired(now) {
            self.refresh(&stored).await?
        } else {
            stored
        };

        let bearer = live.token.clone();
        *cached = Some(live);
        Ok(bearer)
    }
}
