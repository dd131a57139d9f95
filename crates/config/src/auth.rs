//! Credential issuer and login handle settings.

use std::time::Duration;

use duration_str::deserialize_duration;
use serde::Deserialize;
use url::Url;

/// Settings for the external credential issuer and for login handle
/// derivation.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthConfig {
    /// Base URL of the external token issuer. Login requests fail with a
    /// configuration error when unset.
    pub url: Option<Url>,
    /// Domain appended to the normalized RUN to form the login handle.
    pub login_domain: String,
    /// Timeout for requests to the token issuer.
    #[serde(deserialize_with = "deserialize_duration")]
    pub timeout: Duration,
}

impl AuthConfig {
    /// Fallback domain used when no `login_domain` is configured.
    pub const DEFAULT_LOGIN_DOMAIN: &'static str = "liceo.cl";
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            url: None,
            login_domain: Self::DEFAULT_LOGIN_DOMAIN.into(),
            timeout: Duration::from_secs(10),
        }
    }
}
