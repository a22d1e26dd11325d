//! Bearer token providers for the management API
//!
//! A provider is constructed once and shared; [`ClientSecretCredential`]
//! caches its token and only goes back to the authority when the token is
//! about to expire.

use crate::error::QueryClientError;
use crate::models::CredentialsConfig;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use std::fmt;
use tokio::sync::RwLock;
use tracing::{debug, info};
use url::Url;

/// Public cloud token authority
pub const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com/";

/// Scope granting access to the Azure Resource Manager API
pub const MANAGEMENT_SCOPE: &str = "https://management.azure.com/.default";

/// Refresh tokens this long before they expire
const EXPIRY_MARGIN_SECS: i64 = 60;

/// A bearer token and the instant it stops being valid
#[derive(Clone)]
pub struct AccessToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at
            .checked_sub_signed(Duration::seconds(EXPIRY_MARGIN_SECS))
            .is_some_and(|refresh_at| refresh_at > now)
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Source of bearer tokens for the monitoring API
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn access_token(&self) -> Result<AccessToken, QueryClientError>;
}

/// Returns a pre-issued token
pub struct StaticTokenCredential {
    token: String,
}

impl StaticTokenCredential {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl CredentialProvider for StaticTokenCredential {
    async fn access_token(&self) -> Result<AccessToken, QueryClientError> {
        Ok(AccessToken {
            token: self.token.clone(),
            expires_at: DateTime::<Utc>::MAX_UTC,
        })
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

/// OAuth2 client-credentials grant against the identity platform
pub struct ClientSecretCredential {
    http: reqwest::Client,
    token_url: Url,
    client_id: String,
    client_secret: String,
    cached: RwLock<Option<AccessToken>>,
}

impl ClientSecretCredential {
    pub fn new(config: &CredentialsConfig, http: reqwest::Client) -> Result<Self, QueryClientError> {
        if config.tenant_id.is_empty() || config.client_id.is_empty() {
            return Err(QueryClientError::Authorization(
                "tenantID and clientID are required for client secret credentials".to_string(),
            ));
        }

        let mut authority = config
            .authority_host
            .clone()
            .unwrap_or_else(|| DEFAULT_AUTHORITY_HOST.to_string());
        if !authority.ends_with('/') {
            authority.push('/');
        }

        let token_url =
            Url::parse(&authority)?.join(&format!("{}/oauth2/v2.0/token", config.tenant_id))?;

        Ok(Self {
            http,
            token_url,
            client_id: config.client_id.clone(),
            client_secret: config.client_password.clone(),
            cached: RwLock::new(None),
        })
    }

    /// Token endpoint this credential requests from
    pub fn token_url(&self) -> &Url {
        &self.token_url
    }

    async fn request_token(&self) -> Result<AccessToken, QueryClientError> {
        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("scope", MANAGEMENT_SCOPE),
        ];

        let response = self
            .http
            .post(self.token_url.clone())
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;
        if !status.is_success() {
            return Err(QueryClientError::Authorization(format!(
                "token request returned {}: {}",
                status.as_u16(),
                String::from_utf8_lossy(&body)
            )));
        }

        let token: TokenResponse = serde_json::from_slice(&body)?;
        let expires_at = Duration::try_seconds(token.expires_in)
            .and_then(|lifetime| Utc::now().checked_add_signed(lifetime))
            .ok_or_else(|| {
                QueryClientError::Authorization(format!(
                    "token response carried an out-of-range expires_in of {}",
                    token.expires_in
                ))
            })?;

        Ok(AccessToken {
            token: token.access_token,
            expires_at,
        })
    }
}

#[async_trait]
impl CredentialProvider for ClientSecretCredential {
    async fn access_token(&self) -> Result<AccessToken, QueryClientError> {
        if let Some(token) = self.cached.read().await.as_ref() {
            if token.is_fresh(Utc::now()) {
                return Ok(token.clone());
            }
        }

        let mut cached = self.cached.write().await;
        // Another caller may have refreshed while we waited for the lock
        if let Some(token) = cached.as_ref() {
            if token.is_fresh(Utc::now()) {
                return Ok(token.clone());
            }
        }

        debug!(token_url = %self.token_url, "Requesting access token");
        let token = self.request_token().await?;
        info!(expires_at = %token.expires_at, "Acquired management API access token");

        *cached = Some(token.clone());
        Ok(token)
    }
}
