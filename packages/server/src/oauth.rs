//! OAuth identity provider client.
//!
//! The login flow only needs two things from the provider: where to send the
//! browser, and who the user is once a code comes back. [`IdentityProvider`]
//! captures exactly that so the callback handler can run against a stub.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url, header};
use serde::Deserialize;
use tracing::debug;

use crate::config::GitHubConfig;

const USER_AGENT: &str = concat!("tgphoto/", env!("CARGO_PKG_VERSION"));
const SCOPE: &str = "read:user";

#[derive(Debug, thiserror::Error)]
pub enum OAuthError {
    /// The provider refused the authorization code.
    #[error("authorization rejected: {0}")]
    Denied(String),
    #[error("identity provider not configured: {0}")]
    NotConfigured(&'static str),
    #[error("identity provider request failed: {0}")]
    Upstream(String),
    #[error("unexpected identity provider response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for OAuthError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            OAuthError::InvalidResponse(err.to_string())
        } else {
            OAuthError::Upstream(err.to_string())
        }
    }
}

/// Account as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalIdentity {
    /// Stable account id, used as the token's `user_id`.
    pub id: String,
    /// Display name; may change between logins.
    pub login: String,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// URL the browser is sent to in order to start the login.
    fn authorize_url(&self) -> Result<String, OAuthError>;

    /// Exchange an authorization code for the identity behind it.
    async fn authenticate(&self, code: &str) -> Result<ExternalIdentity, OAuthError>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GitHubUser {
    id: i64,
    login: String,
}

pub struct GitHubProvider {
    config: GitHubConfig,
    client: Client,
}

impl GitHubProvider {
    pub fn new(config: GitHubConfig) -> Result<Self, OAuthError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { config, client })
    }

    async fn exchange_code(&self, code: &str) -> Result<String, OAuthError> {
        // GitHub answers 200 with an `error` field for bad or expired codes.
        let response: TokenResponse = self
            .client
            .post(&self.config.token_url)
            .header(header::ACCEPT, "application/json")
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("code", code),
                ("redirect_uri", self.config.redirect_uri.as_str()),
            ])
            .send()
            .await?
            .json()
            .await?;

        match response {
            TokenResponse {
                access_token: Some(token),
                ..
            } if !token.is_empty() => Ok(token),
            TokenResponse {
                error: Some(error),
                error_description,
                ..
            } => Err(OAuthError::Denied(error_description.unwrap_or(error))),
            _ => Err(OAuthError::InvalidResponse(
                "token response without access_token".into(),
            )),
        }
    }

    async fn fetch_user(&self, access_token: &str) -> Result<GitHubUser, OAuthError> {
        let response = self
            .client
            .get(&self.config.user_api_url)
            .header(header::ACCEPT, "application/json")
            .bearer_auth(access_token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(OAuthError::Upstream(format!("user API returned {status}")));
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl IdentityProvider for GitHubProvider {
    fn authorize_url(&self) -> Result<String, OAuthError> {
        if self.config.client_id.is_empty() {
            return Err(OAuthError::NotConfigured("github.client_id"));
        }

        let url = Url::parse_with_params(
            &self.config.authorize_url,
            &[
                ("client_id", self.config.client_id.as_str()),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("scope", SCOPE),
            ],
        )
        .map_err(|e| OAuthError::InvalidResponse(format!("bad github.authorize_url: {e}")))?;

        Ok(url.into())
    }

    async fn authenticate(&self, code: &str) -> Result<ExternalIdentity, OAuthError> {
        if self.config.client_id.is_empty() || self.config.client_secret.is_empty() {
            return Err(OAuthError::NotConfigured("github.client_secret"));
        }

        let access_token = self.exchange_code(code).await?;
        let user = self.fetch_user(&access_token).await?;
        debug!(github_id = user.id, login = %user.login, "GitHub identity resolved");

        Ok(ExternalIdentity {
            id: user.id.to_string(),
            login: user.login,
        })
    }
}
