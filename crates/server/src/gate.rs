//! The access gate: per-request routing between public and protected paths.
//!
//! The gate only checks that the access-token cookie *exists*. It provides
//! routing convenience, not security enforcement: token contents and expiry
//! are verified downstream by whatever serves the protected pages.

use std::{
    fmt::Display,
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use axum::body::Body;
use config::GateConfig;
use http::{HeaderValue, Request, Response, StatusCode, header};
use tower::Layer;

/// Terminal outcome of the gate for a single request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum GateDecision {
    /// Forward the request untouched.
    Allow,
    /// Send the client to the login page, carrying the original
    /// path and query in the `redirect` parameter.
    Redirect(String),
}

/// Pure decision function over (path, query, cookie presence).
///
/// Stateless across requests; the rules are fixed at construction.
pub(crate) struct GatePolicy {
    rules: GateConfig,
}

impl GatePolicy {
    pub(crate) fn new(rules: GateConfig) -> Self {
        Self { rules }
    }

    pub(crate) fn decide(&self, path: &str, query: Option<&str>, has_access_cookie: bool) -> GateDecision {
        if self.rules.public_paths.contains(path) {
            return GateDecision::Allow;
        }

        if self.rules.bypass_prefixes.iter().any(|prefix| path.starts_with(prefix)) {
            return GateDecision::Allow;
        }

        if let Some((_, extension)) = path.rsplit_once('.')
            && self.rules.static_extensions.contains(&extension.to_ascii_lowercase())
        {
            return GateDecision::Allow;
        }

        let protected = self.rules.protected_prefixes.iter().any(|prefix| path.starts_with(prefix));

        // Unrecognized paths fall through to the page itself.
        if !protected || has_access_cookie {
            return GateDecision::Allow;
        }

        let original = match query {
            Some(query) if !query.is_empty() => format!("{path}?{query}"),
            _ => path.to_string(),
        };

        let encoded: String = url::form_urlencoded::byte_serialize(original.as_bytes()).collect();

        GateDecision::Redirect(format!("{}?redirect={encoded}", self.rules.login_path))
    }
}

#[derive(Clone)]
pub(crate) struct GateLayer(Arc<GateLayerInner>);

struct GateLayerInner {
    policy: GatePolicy,
    access_cookie: String,
}

impl GateLayer {
    pub(crate) fn new(rules: GateConfig, access_cookie: String) -> Self {
        Self(Arc::new(GateLayerInner {
            policy: GatePolicy::new(rules),
            access_cookie,
        }))
    }
}

impl<Service> Layer<Service> for GateLayer
where
    Service: Send + Clone,
{
    type Service = GateService<Service>;

    fn layer(&self, next: Service) -> Self::Service {
        GateService {
            next,
            layer: self.0.clone(),
        }
    }
}

#[derive(Clone)]
pub(crate) struct GateService<Service> {
    next: Service,
    layer: Arc<GateLayerInner>,
}

impl<Service, ReqBody> tower::Service<Request<ReqBody>> for GateService<Service>
where
    Service: tower::Service<Request<ReqBody>, Response = Response<Body>> + Send + Clone + 'static,
    Service::Future: Send,
    Service::Error: Display + 'static,
    ReqBody: http_body::Body + Send + 'static,
{
    type Response = http::Response<Body>;
    type Error = Service::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Response<Body>, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.next.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        let mut next = self.next.clone();
        let layer = self.layer.clone();

        Box::pin(async move {
            let has_cookie = has_cookie(&req, &layer.access_cookie);
            let path = req.uri().path();

            match layer.policy.decide(path, req.uri().query(), has_cookie) {
                GateDecision::Allow => next.call(req).await,
                GateDecision::Redirect(target) => {
                    log::debug!("Gate redirecting unauthenticated request for {path}");

                    // The encoder only produces ASCII; if the configured
                    // login path still is not a valid header value, use a
                    // safe fallback.
                    let location = HeaderValue::from_str(&target)
                        .or_else(|_| HeaderValue::from_str(&layer.policy.rules.login_path))
                        .unwrap_or_else(|_| HeaderValue::from_static("/login"));

                    let response = Response::builder()
                        .status(StatusCode::TEMPORARY_REDIRECT)
                        .header(header::LOCATION, location)
                        .body(Body::empty())
                        .unwrap();

                    Ok(response)
                }
            }
        })
    }
}

/// Checks the Cookie headers for a cookie with the given name, ignoring
/// its value entirely.
fn has_cookie<B>(req: &Request<B>, name: &str) -> bool {
    req.headers()
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.split_once('='))
        .any(|(key, _)| key.trim() == name)
}

#[cfg(test)]
mod tests {
    use axum::{Router, routing::get};
    use tower::ServiceExt;

    use super::*;

    fn policy() -> GatePolicy {
        GatePolicy::new(GateConfig::default())
    }

    #[test]
    fn protected_path_without_cookie_redirects() {
        let decision = policy().decide("/admin/x", None, false);

        assert_eq!(
            decision,
            GateDecision::Redirect("/login?redirect=%2Fadmin%2Fx".to_string())
        );
    }

    #[test]
    fn redirect_carries_the_query_string() {
        let decision = policy().decide("/estudiante/grades", Some("x=1"), false);

        assert_eq!(
            decision,
            GateDecision::Redirect("/login?redirect=%2Festudiante%2Fgrades%3Fx%3D1".to_string())
        );
    }

    #[test]
    fn protected_path_with_cookie_is_allowed() {
        assert_eq!(policy().decide("/estudiante/grades", Some("x=1"), true), GateDecision::Allow);
        assert_eq!(policy().decide("/admin/x", None, true), GateDecision::Allow);
    }

    #[test]
    fn public_paths_are_allowed_without_cookie() {
        assert_eq!(policy().decide("/login", None, false), GateDecision::Allow);
        assert_eq!(policy().decide("/", None, false), GateDecision::Allow);
    }

    #[test]
    fn static_assets_are_allowed_without_cookie() {
        assert_eq!(policy().decide("/static/app.css", None, false), GateDecision::Allow);
        assert_eq!(policy().decide("/admin/logo.PNG", None, false), GateDecision::Allow);
        assert_eq!(policy().decide("/_next/chunk.js", None, false), GateDecision::Allow);
    }

    #[test]
    fn unrecognized_paths_default_to_allow() {
        assert_eq!(policy().decide("/totally/unknown", None, false), GateDecision::Allow);
        assert_eq!(policy().decide("", None, false), GateDecision::Allow);
    }

    #[test]
    fn empty_query_is_not_appended() {
        let decision = policy().decide("/admin", Some(""), false);

        assert_eq!(decision, GateDecision::Redirect("/login?redirect=%2Fadmin".to_string()));
    }

    fn app() -> Router {
        Router::new()
            .route("/admin/x", get(|| async { "admin" }))
            .route("/login", get(|| async { "login" }))
            .layer(GateLayer::new(GateConfig::default(), "sb-access-token".to_string()))
    }

    #[tokio::test]
    async fn layer_redirects_without_cookie() {
        let request = Request::builder().uri("/admin/x").body(Body::empty()).unwrap();
        let response = app().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/login?redirect=%2Fadmin%2Fx"
        );
    }

    #[tokio::test]
    async fn layer_forwards_with_cookie() {
        let request = Request::builder()
            .uri("/admin/x")
            .header(header::COOKIE, "theme=dark; sb-access-token=opaque; lang=es")
            .body(Body::empty())
            .unwrap();

        let response = app().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn layer_ignores_cookie_name_prefixes() {
        let request = Request::builder()
            .uri("/admin/x")
            .header(header::COOKIE, "sb-access-token-old=stale")
            .body(Body::empty())
            .unwrap();

        let response = app().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    }

    #[tokio::test]
    async fn layer_allows_login_without_cookie() {
        let request = Request::builder().uri("/login").body(Body::empty()).unwrap();
        let response = app().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
