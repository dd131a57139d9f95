//! Liceo configuration structures to map the liceo.toml configuration.

#![deny(missing_docs)]

mod auth;
mod cors;
mod gate;
mod loader;

use std::{
    borrow::Cow,
    net::SocketAddr,
    path::{Path, PathBuf},
};

pub use auth::AuthConfig;
pub use cors::{AllowedOrigins, CorsConfig};
pub use gate::GateConfig;
use serde::Deserialize;

/// Main configuration structure for the Liceo portal gateway.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// HTTP server configuration settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Access gate path rules.
    #[serde(default)]
    pub gate: GateConfig,
    /// Credential issuer and login handle settings.
    #[serde(default)]
    pub auth: AuthConfig,
}

impl Config {
    /// Load configuration from a file path.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Config> {
        loader::load(path)
    }
}

/// HTTP server configuration settings.
#[derive(Default, Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// The socket address the server should listen on.
    pub listen_address: Option<SocketAddr>,
    /// TLS configuration for secure connections.
    pub tls: Option<TlsServerConfig>,
    /// Health endpoint configuration.
    #[serde(default)]
    pub health: HealthConfig,
    /// CORS configuration.
    pub cors: Option<CorsConfig>,
    /// Names and attributes of the session cookie pair.
    #[serde(default)]
    pub cookies: CookieConfig,
}

/// TLS configuration for secure connections.
#[derive(Default, Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TlsServerConfig {
    /// Path to the TLS certificate PEM file.
    pub certificate: PathBuf,
    /// Path to the TLS private key PEM file.
    pub key: PathBuf,
}

/// Health endpoint configuration.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HealthConfig {
    /// Whether the health endpoint is enabled.
    pub enabled: bool,
    /// The socket address the health endpoint should listen on.
    pub listen: Option<SocketAddr>,
    /// The path for the health endpoint.
    pub path: Cow<'static, str>,
}

impl Default for HealthConfig {
    fn default() -> Self {
        HealthConfig {
            enabled: true,
            listen: None,
            path: Cow::Borrowed("/health"),
        }
    }
}

/// Names and attributes of the session cookie pair.
///
/// The gate only ever checks for the *presence* of the access cookie; the
/// session endpoints set and clear both cookies.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CookieConfig {
    /// Name of the access-token cookie.
    pub access_name: String,
    /// Name of the refresh-token cookie.
    pub refresh_name: String,
    /// Whether cookies are set with the Secure attribute.
    pub secure: bool,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            access_name: "sb-access-token".into(),
            refresh_name: "sb-refresh-token".into(),
            secure: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use crate::Config;

    #[test]
    fn defaults() {
        let config: Config = toml::from_str("").unwrap();

        insta::assert_debug_snapshot!(&config, @r#"
        Config {
            server: ServerConfig {
                listen_address: None,
                tls: None,
                health: HealthConfig {
                    enabled: true,
                    listen: None,
                    path: "/health",
                },
                cors: None,
                cookies: CookieConfig {
                    access_name: "sb-access-token",
                    refresh_name: "sb-refresh-token",
                    secure: true,
                },
            },
            gate: GateConfig {
                public_paths: {
                    "/",
                    "/login",
                    "/recuperar",
                },
                bypass_prefixes: [
                    "/_next",
                    "/static",
                    "/assets",
                    "/favicon.ico",
                    "/auth",
                ],
                static_extensions: {
                    "css",
                    "gif",
                    "ico",
                    "jpeg",
                    "jpg",
                    "js",
                    "map",
                    "png",
                    "svg",
                    "txt",
                    "webp",
                    "woff",
                    "woff2",
                },
                protected_prefixes: [
                    "/admin",
                    "/docente",
                    "/estudiante",
                ],
                login_path: "/login",
            },
            auth: AuthConfig {
                url: None,
                login_domain: "liceo.cl",
                timeout: 10s,
            },
        }
        "#);
    }

    #[test]
    fn server_section() {
        let config = indoc! {r#"
            [server]
            listen_address = "127.0.0.1:8080"

            [server.cookies]
            access_name = "portal-access"
            refresh_name = "portal-refresh"
            secure = false

            [server.health]
            enabled = true
            path = "/healthz"
        "#};

        let config: Config = toml::from_str(config).unwrap();

        insta::assert_debug_snapshot!(&config.server, @r#"
        ServerConfig {
            listen_address: Some(
                127.0.0.1:8080,
            ),
            tls: None,
            health: HealthConfig {
                enabled: true,
                listen: None,
                path: "/healthz",
            },
            cors: None,
            cookies: CookieConfig {
                access_name: "portal-access",
                refresh_name: "portal-refresh",
                secure: false,
            },
        }
        "#);
    }

    #[test]
    fn tls_section() {
        let config = indoc! {r#"
            [server.tls]
            certificate = "/etc/liceo/cert.pem"
            key = "/etc/liceo/key.pem"
        "#};

        let config: Config = toml::from_str(config).unwrap();

        insta::assert_debug_snapshot!(&config.server.tls, @r#"
        Some(
            TlsServerConfig {
                certificate: "/etc/liceo/cert.pem",
                key: "/etc/liceo/key.pem",
            },
        )
        "#);
    }

    #[test]
    fn gate_section_overrides() {
        let config = indoc! {r#"
            [gate]
            public_paths = ["/", "/ingreso"]
            protected_prefixes = ["/apoderado"]
            login_path = "/ingreso"
        "#};

        let config: Config = toml::from_str(config).unwrap();
        let gate = config.gate;

        assert!(gate.public_paths.contains("/ingreso"));
        assert!(!gate.public_paths.contains("/login"));
        assert_eq!(gate.protected_prefixes, vec!["/apoderado"]);
        assert_eq!(gate.login_path, "/ingreso");
    }

    #[test]
    fn auth_section() {
        let config = indoc! {r#"
            [auth]
            url = "https://auth.example.com/auth/v1"
            login_domain = "alumnos.liceo.cl"
            timeout = "5s"
        "#};

        let config: Config = toml::from_str(config).unwrap();

        assert_eq!(
            config.auth.url.as_ref().map(|url| url.as_str()),
            Some("https://auth.example.com/auth/v1")
        );
        assert_eq!(config.auth.login_domain, "alumnos.liceo.cl");
        assert_eq!(config.auth.timeout, std::time::Duration::from_secs(5));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let config = indoc! {r#"
            [server]
            listen_adress = "127.0.0.1:8080"
        "#};

        let error = toml::from_str::<Config>(config).unwrap_err();

        assert!(error.to_string().contains("unknown field `listen_adress`"), "{error}");
    }

    #[test]
    fn cors_allow_credentials() {
        let input = indoc! {r#"
            [server.cors]
            allow_credentials = true
        "#};

        let config: Config = toml::from_str(input).unwrap();
        let cors = config.server.cors.unwrap();

        assert!(cors.allow_credentials);
    }

    #[test]
    fn cors_allow_origins_any() {
        let input = indoc! {r#"
            [server.cors]
            allow_origins = "*"
        "#};

        let config: Config = toml::from_str(input).unwrap();
        let cors = config.server.cors.unwrap();

        assert_eq!(Some(crate::AllowedOrigins::Any), cors.allow_origins)
    }

    #[test]
    fn cors_allow_origins_explicit() {
        let input = indoc! {r#"
            [server.cors]
            allow_origins = ["https://portal.liceo.cl"]
        "#};

        let config: Config = toml::from_str(input).unwrap();
        let cors = config.server.cors.unwrap();
        let expected = crate::AllowedOrigins::Explicit(vec!["https://portal.liceo.cl".parse().unwrap()]);

        assert_eq!(Some(expected), cors.allow_origins)
    }

    #[test]
    fn cors_allow_origins_invalid_url() {
        let input = indoc! {r#"
            [server.cors]
            allow_origins = ["foo"]
        "#};

        let error = toml::from_str::<Config>(input).unwrap_err();

        assert!(error.to_string().contains("relative URL without a base"), "{error}");
    }

    #[test]
    fn cors_max_age() {
        let input = indoc! {r#"
           [server.cors]
           max_age = "60s"
        "#};

        let config: Config = toml::from_str(input).unwrap();
        let cors = config.server.cors.unwrap();

        assert_eq!(Some(std::time::Duration::from_secs(60)), cors.max_age);
    }
}
