//! Liceo server library.
//!
//! Provides a reusable server function to serve the portal gateway either
//! for the binary, or for the integration tests.

#![deny(missing_docs)]

mod cors;
mod gate;
mod health;
mod session;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::anyhow;
use axum::{Router, routing::get};
use axum_server::tls_rustls::RustlsConfig;
use config::Config;
use gate::GateLayer;
pub use session::{HttpIssuer, SessionError, SessionTokens, TokenIssuer};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

/// Configuration for serving the portal gateway.
pub struct ServeConfig {
    /// The socket address (IP and port) the server will bind to
    pub listen_address: SocketAddr,
    /// The deserialized liceo TOML configuration.
    pub config: Config,
}

/// Starts and runs the portal gateway with the provided configuration.
pub async fn serve(ServeConfig { listen_address, config }: ServeConfig) -> anyhow::Result<()> {
    let cors = match &config.server.cors {
        Some(cors_config) => cors::generate(cors_config),
        None => CorsLayer::permissive(),
    };

    let issuer: Option<Arc<dyn TokenIssuer>> = match &config.auth.url {
        Some(url) => Some(Arc::new(HttpIssuer::new(url, &config.auth)?)),
        None => {
            log::warn!("No token issuer configured - /auth/login will answer 503");
            None
        }
    };

    let mut app = session::router(
        issuer,
        config.auth.clone(),
        config.server.cookies.clone(),
        config.gate.login_path.clone(),
    );

    // The gate sees every request; its own rules keep /auth and the public
    // paths reachable without a session.
    app = app.layer(GateLayer::new(
        config.gate.clone(),
        config.server.cookies.access_name.clone(),
    ));

    // Health is exposed after the gate so probes never depend on gate rules.
    if config.server.health.enabled {
        if let Some(listen) = config.server.health.listen {
            tokio::spawn(health::bind_health_endpoint(
                listen,
                config.server.tls.clone(),
                config.server.health.clone(),
            ));
        } else {
            let health_router = Router::new().route(&config.server.health.path, get(health::health));

            app = app.merge(health_router);
        }
    }

    let app = app.layer(cors);

    let listener = TcpListener::bind(listen_address)
        .await
        .map_err(|e| anyhow!("Failed to bind to {listen_address}: {e}"))?;

    match &config.server.tls {
        Some(tls_config) => {
            let rustls_config = RustlsConfig::from_pem_file(&tls_config.certificate, &tls_config.key)
                .await
                .map_err(|e| anyhow!("Failed to load TLS certificate and key: {e}"))?;

            log::info!("Portal gateway listening at: https://{listen_address}");

            axum_server::from_tcp_rustls(listener.into_std()?, rustls_config)
                .serve(app.into_make_service())
                .await
                .map_err(|e| anyhow!("Failed to start HTTPS server: {e}"))?;
        }
        None => {
            log::info!("Portal gateway listening at: http://{listen_address}");

            axum::serve(listener, app)
                .await
                .map_err(|e| anyhow!("Failed to start HTTP server: {}", e))?;
        }
    }

    Ok(())
}
