//! Access gate path rules.

use std::collections::BTreeSet;

use serde::Deserialize;

/// Path rules consulted by the access gate on every request.
///
/// All fields have working defaults; a deployment overrides them in the
/// `[gate]` section of liceo.toml. The gate receives this value at
/// construction time, so tests can build their own rule sets.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GateConfig {
    /// Paths allowed through regardless of session state, matched exactly.
    pub public_paths: BTreeSet<String>,
    /// Path prefixes allowed through unconditionally, for framework
    /// internals and static assets.
    pub bypass_prefixes: Vec<String>,
    /// Lowercase file extensions allowed through unconditionally.
    pub static_extensions: BTreeSet<String>,
    /// Path prefixes that require the access-token cookie.
    pub protected_prefixes: Vec<String>,
    /// Where unauthenticated requests to protected paths are redirected.
    pub login_path: String,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            public_paths: ["/", "/login", "/recuperar"].map(String::from).into(),
            bypass_prefixes: ["/_next", "/static", "/assets", "/favicon.ico", "/auth"]
                .map(String::from)
                .into(),
            static_extensions: [
                "css", "js", "map", "ico", "png", "jpg", "jpeg", "svg", "gif", "webp", "woff", "woff2", "txt",
            ]
            .map(String::from)
            .into(),
            protected_prefixes: ["/admin", "/docente", "/estudiante"].map(String::from).into(),
            login_path: "/login".into(),
        }
    }
}
