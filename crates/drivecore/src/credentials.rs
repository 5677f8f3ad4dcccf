//! Google OAuth credentials for the Drive client
//!
//! The deployment stores an authorized-user token (the JSON the Google
//! client libraries write after consent) base64-encoded in
//! `GOOGLE_TOKEN_B64`, and optionally the OAuth client file in
//! `GOOGLE_CREDS_B64`. [`AuthorizedUser`] turns those into bearer tokens,
//! refreshing through the token endpoint when the cached one is about to
//! expire. Obtaining consent in the first place is out of scope.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::core::config::Config;
use crate::core::error::CredentialError;

/// Scope the stored token was granted
pub const DRIVE_FILE_SCOPE: &str = "https://www.googleapis.com/auth/drive.file";

/// Token endpoint used when neither blob names one
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// A cached token is refreshed this long before it expires
const EXPIRY_MARGIN_SECS: i64 = 60;

/// Source of bearer tokens for the storage API
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn access_token(&self) -> Result<SecretString, CredentialError>;
}

/// Fixed token, never refreshed. Handy against local API fakes.
pub struct StaticToken(SecretString);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(SecretString::from(token.into()))
    }
}

#[async_trait]
impl CredentialProvider for StaticToken {
    async fn access_token(&self) -> Result<SecretString, CredentialError> {
        Ok(SecretString::from(self.0.expose_secret().to_owned()))
    }
}

/// Stands in when the stored credentials could not be decoded at startup.
///
/// Every upload then fails with the decoding error instead of the bot
/// refusing to start.
pub struct Unavailable(String);

impl Unavailable {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

#[async_trait]
impl CredentialProvider for Unavailable {
    async fn access_token(&self) -> Result<SecretString, CredentialError> {
        Err(CredentialError::Unavailable(self.0.clone()))
    }
}

/// Authorized-user token document
#[derive(Debug, Deserialize)]
struct AuthorizedUserInfo {
    #[serde(default, alias = "access_token")]
    token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    client_id: Option<String>,
    #[serde(default)]
    client_secret: Option<String>,
    #[serde(default)]
    token_uri: Option<String>,
    #[serde(default)]
    expiry: Option<String>,
}

/// OAuth client file: `{"installed": {...}}` or `{"web": {...}}`
#[derive(Debug, Deserialize)]
struct ClientSecrets {
    #[serde(alias = "web")]
    installed: ClientSection,
}

#[derive(Debug, Deserialize)]
struct ClientSection {
    client_id: String,
    client_secret: String,
    #[serde(default)]
    token_uri: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

struct CachedToken {
    token: SecretString,
    expires_at: Option<DateTime<Utc>>,
}

impl CachedToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(at) => now + Duration::seconds(EXPIRY_MARGIN_SECS) < at,
            None => true,
        }
    }
}

/// Refreshable authorized-user credentials
pub struct AuthorizedUser {
    http: reqwest::Client,
    refresh_token: Option<SecretString>,
    client_id: Option<String>,
    client_secret: Option<SecretString>,
    token_uri: String,
    cached: Mutex<Option<CachedToken>>,
}

fn decode_blob<T: DeserializeOwned>(encoded: &str) -> Result<T, CredentialError> {
    let bytes = STANDARD.decode(encoded.trim())?;
    Ok(serde_json::from_slice(&bytes)?)
}

fn parse_expiry(raw: &str) -> Option<DateTime<Utc>> {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(at) => Some(at.with_timezone(&Utc)),
        Err(e) => {
            log::warn!("Ignoring unparseable token expiry {:?}: {}", raw, e);
            None
        }
    }
}

impl AuthorizedUser {
    /// Decodes the base64 blobs.
    ///
    /// Client id, secret and token URI missing from the token document are
    /// taken from the client file when one is given.
    pub fn from_base64(
        token_b64: &str,
        client_secrets_b64: Option<&str>,
        http: reqwest::Client,
    ) -> Result<Self, CredentialError> {
        let info: AuthorizedUserInfo = decode_blob(token_b64)?;
        let client = client_secrets_b64
            .map(decode_blob::<ClientSecrets>)
            .transpose()?
            .map(|secrets| secrets.installed);

        let client_id = info.client_id.or_else(|| client.as_ref().map(|c| c.client_id.clone()));
        let client_secret = info
            .client_secret
            .or_else(|| client.as_ref().map(|c| c.client_secret.clone()));
        let token_uri = info
            .token_uri
            .or_else(|| client.as_ref().and_then(|c| c.token_uri.clone()))
            .unwrap_or_else(|| DEFAULT_TOKEN_URI.to_string());

        // Without an expiry a refreshable token is treated as stale; one that
        // can not be refreshed is used as-is.
        let expires_at = match info.expiry.as_deref().and_then(parse_expiry) {
            Some(at) => Some(at),
            None if info.refresh_token.is_some() => Some(DateTime::<Utc>::MIN_UTC),
            None => None,
        };
        let cached = info.token.map(|token| CachedToken {
            token: SecretString::from(token),
            expires_at,
        });

        if cached.is_none() && info.refresh_token.is_none() {
            return Err(CredentialError::Missing("token or refresh_token"));
        }

        Ok(Self {
            http,
            refresh_token: info.refresh_token.map(SecretString::from),
            client_id,
            client_secret: client_secret.map(SecretString::from),
            token_uri,
            cached: Mutex::new(cached),
        })
    }

    /// Builds the provider from `GOOGLE_TOKEN_B64` / `GOOGLE_CREDS_B64`.
    pub fn from_config(config: &Config, http: reqwest::Client) -> Result<Self, CredentialError> {
        let token = config
            .google_token_b64
            .as_ref()
            .ok_or(CredentialError::Missing("GOOGLE_TOKEN_B64"))?;
        let secrets = config.google_creds_b64.as_ref().map(|s| s.expose_secret());
        Self::from_base64(token.expose_secret(), secrets, http)
    }

    pub fn token_uri(&self) -> &str {
        &self.token_uri
    }

    async fn refresh(&self) -> Result<CachedToken, CredentialError> {
        let refresh_token = self
            .refresh_token
            .as_ref()
            .ok_or(CredentialError::Missing("refresh_token"))?;
        let client_id = self.client_id.as_deref().ok_or(CredentialError::Missing("client_id"))?;
        let client_secret = self
            .client_secret
            .as_ref()
            .ok_or(CredentialError::Missing("client_secret"))?;

        log::info!("Refreshing Google access token via {}", self.token_uri);

        let response = self
            .http
            .post(&self.token_uri)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token.expose_secret()),
                ("client_id", client_id),
                ("client_secret", client_secret.expose_secret()),
                ("scope", DRIVE_FILE_SCOPE),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<TokenErrorResponse>(&body) {
                Ok(err) => match err.error_description {
                    Some(description) => format!("{}: {}", err.error, description),
                    None => err.error,
                },
                Err(_) => body,
            };
            return Err(CredentialError::Refresh { status, message });
        }

        let token: TokenResponse = response.json().await?;
        Ok(CachedToken {
            token: SecretString::from(token.access_token),
            expires_at: token.expires_in.map(|secs| Utc::now() + Duration::seconds(secs)),
        })
    }
}

#[async_trait]
impl CredentialProvider for AuthorizedUser {
    async fn access_token(&self) -> Result<SecretString, CredentialError> {
        let mut cached = self.cached.lock().await;

        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh(Utc::now())) {
            return Ok(SecretString::from(token.token.expose_secret().to_owned()));
        }

        let fresh = self.refresh().await?;
        let token = SecretString::from(fresh.token.expose_secret().to_owned());
        *cached = Some(fresh);
        Ok(token)
    }
}
