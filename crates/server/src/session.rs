//! Session endpoints: credential exchange on login, cookie teardown on
//! logout.
//!
//! The gateway never verifies passwords itself. Login normalizes the RUN,
//! derives the synthetic login handle and forwards both to the configured
//! token issuer; the returned bearer tokens land in the cookie pair the
//! gate checks for.

mod issuer;

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    response::{IntoResponse, Response},
    routing::post,
};
use config::{AuthConfig, CookieConfig};
use http::{HeaderValue, StatusCode, header};
pub use issuer::{HttpIssuer, SessionTokens, TokenIssuer};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// Why a login attempt produced no session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The supplied RUN failed the check-digit validation.
    #[error("Invalid RUN")]
    InvalidRun,
    /// The issuer refused the credentials.
    #[error("Credentials rejected by the issuer")]
    Rejected,
    /// The issuer could not be reached or answered with garbage.
    #[error("Token issuer unreachable: {0}")]
    IssuerUnreachable(String),
    /// No issuer URL is configured.
    #[error("No token issuer configured")]
    IssuerMisconfigured,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: &'static str,
}

impl SessionError {
    fn status(&self) -> StatusCode {
        match self {
            SessionError::InvalidRun => StatusCode::UNPROCESSABLE_ENTITY,
            SessionError::Rejected => StatusCode::UNAUTHORIZED,
            SessionError::IssuerUnreachable(_) => StatusCode::BAD_GATEWAY,
            SessionError::IssuerMisconfigured => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            SessionError::InvalidRun => "invalid_run",
            SessionError::Rejected => "invalid_credentials",
            SessionError::IssuerUnreachable(_) => "issuer_unreachable",
            SessionError::IssuerMisconfigured => "issuer_misconfigured",
        }
    }
}

impl IntoResponse for SessionError {
    fn into_response(self) -> Response {
        if let SessionError::IssuerUnreachable(reason) = &self {
            log::error!("Token issuer unreachable: {reason}");
        }

        (self.status(), Json(ErrorResponse { error: self.code() })).into_response()
    }
}

pub(crate) struct SessionState {
    issuer: Option<Arc<dyn TokenIssuer>>,
    auth: AuthConfig,
    cookies: CookieConfig,
    login_path: String,
}

pub(crate) fn router(
    issuer: Option<Arc<dyn TokenIssuer>>,
    auth: AuthConfig,
    cookies: CookieConfig,
    login_path: String,
) -> Router {
    let state = Arc::new(SessionState {
        issuer,
        auth,
        cookies,
        login_path,
    });

    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .with_state(state)
}

#[derive(Deserialize)]
struct LoginRequest {
    run: String,
    password: SecretString,
}

#[derive(Deserialize)]
struct LoginQuery {
    redirect: Option<String>,
}

#[derive(Serialize)]
struct LoginResponse {
    redirect_to: String,
}

async fn login(
    State(state): State<Arc<SessionState>>,
    Query(query): Query<LoginQuery>,
    Json(request): Json<LoginRequest>,
) -> Result<Response, SessionError> {
    if !identity::validate(&request.run) {
        return Err(SessionError::InvalidRun);
    }

    let issuer = state.issuer.as_ref().ok_or(SessionError::IssuerMisconfigured)?;
    let handle = identity::login_handle(&request.run, &state.auth.login_domain);

    let tokens = issuer.exchange(&handle, request.password).await?;

    log::info!("Session opened for {handle}");

    let body = Json(LoginResponse {
        redirect_to: sanitize_redirect(query.redirect.as_deref()),
    });

    let mut response = (StatusCode::OK, body).into_response();

    append_cookie(
        &mut response,
        &set_cookie(&state.cookies.access_name, &tokens.access_token, &state.cookies),
    );
    append_cookie(
        &mut response,
        &set_cookie(&state.cookies.refresh_name, &tokens.refresh_token, &state.cookies),
    );

    Ok(response)
}

async fn logout(State(state): State<Arc<SessionState>>) -> Response {
    let location = HeaderValue::from_str(&state.login_path).unwrap_or_else(|_| HeaderValue::from_static("/login"));
    let mut response = (StatusCode::SEE_OTHER, [(header::LOCATION, location)]).into_response();

    append_cookie(&mut response, &clear_cookie(&state.cookies.access_name, &state.cookies));
    append_cookie(&mut response, &clear_cookie(&state.cookies.refresh_name, &state.cookies));

    response
}

/// Only same-site absolute paths may be used as a post-login target. Full
/// URLs and protocol-relative paths would make the parameter an open
/// redirect.
fn sanitize_redirect(redirect: Option<&str>) -> String {
    match redirect {
        Some(path) if path.starts_with('/') && !path.starts_with("//") => path.to_string(),
        _ => "/".to_string(),
    }
}

fn set_cookie(name: &str, value: &str, config: &CookieConfig) -> String {
    let mut cookie = format!("{name}={value}; Path=/; HttpOnly; SameSite=Lax");

    if config.secure {
        cookie.push_str("; Secure");
    }

    cookie
}

fn clear_cookie(name: &str, config: &CookieConfig) -> String {
    let mut cookie = format!("{name}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");

    if config.secure {
        cookie.push_str("; Secure");
    }

    cookie
}

fn append_cookie(response: &mut Response, cookie: &str) {
    // Bearer tokens and cookie names are ASCII; skip the header rather than
    // fail the login when an issuer returns something else.
    match HeaderValue::from_str(cookie) {
        Ok(value) => {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
        Err(_) => log::error!("Dropping session cookie with a non-ASCII value"),
    }
}
