//! The external credential issuer behind the login endpoint.

use config::AuthConfig;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use url::Url;

use super::SessionError;

/// The opaque bearer token pair issued for a session. The gateway stores
/// both in cookies and never looks inside either.
pub struct SessionTokens {
    /// Token whose presence the gate treats as "authenticated".
    pub access_token: String,
    /// Token the downstream pages use to renew the session.
    pub refresh_token: String,
}

/// Exchanges a login handle and password for a session token pair.
#[async_trait::async_trait]
pub trait TokenIssuer: Send + Sync {
    /// Performs the credential exchange. `Rejected` means the issuer
    /// answered and said no; `IssuerUnreachable` covers everything else.
    async fn exchange(&self, handle: &str, password: SecretString) -> Result<SessionTokens, SessionError>;
}

/// Production issuer: the hosted auth service's password grant endpoint.
pub struct HttpIssuer {
    client: reqwest::Client,
    token_url: Url,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
}

impl HttpIssuer {
    /// Builds an issuer for the configured auth service base URL.
    pub fn new(base_url: &Url, config: &AuthConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;

        let mut token_url = base_url.clone();
        token_url
            .path_segments_mut()
            .map_err(|_| anyhow::anyhow!("Auth URL cannot be a base: {base_url}"))?
            .pop_if_empty()
            .push("token");
        token_url.set_query(Some("grant_type=password"));

        Ok(Self { client, token_url })
    }
}

#[async_trait::async_trait]
impl TokenIssuer for HttpIssuer {
    async fn exchange(&self, handle: &str, password: SecretString) -> Result<SessionTokens, SessionError> {
        let response = self
            .client
            .post(self.token_url.clone())
            .json(&serde_json::json!({
                "email": handle,
                "password": password.expose_secret(),
            }))
            .send()
            .await
            .map_err(|e| SessionError::IssuerUnreachable(e.to_string()))?;

        let status = response.status();

        if status.is_client_error() {
            log::debug!("Issuer rejected credentials for {handle} with {status}");
            return Err(SessionError::Rejected);
        }

        if !status.is_success() {
            return Err(SessionError::IssuerUnreachable(format!("issuer answered {status}")));
        }

        let tokens: TokenResponse = response
            .json()
            .await
            .map_err(|e| SessionError::IssuerUnreachable(format!("malformed token response: {e}")))?;

        Ok(SessionTokens {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
        })
    }
}
