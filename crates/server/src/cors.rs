use config::{AllowedOrigins, CorsConfig};
use http::HeaderValue;
use tower_http::cors::{AllowOrigin, CorsLayer};

pub(super) fn generate(config: &CorsConfig) -> CorsLayer {
    let mut cors_layer = CorsLayer::new().allow_credentials(config.allow_credentials);

    if let Some(allow_origins) = &config.allow_origins {
        cors_layer = cors_layer.allow_origin(match allow_origins {
            AllowedOrigins::Any => AllowOrigin::any(),
            AllowedOrigins::Explicit(origins) => {
                let origins = origins
                    .iter()
                    .map(|origin| &origin[..url::Position::BeforePath])
                    .filter_map(|origin| HeaderValue::from_str(origin).ok());

                AllowOrigin::list(origins)
            }
        });
    }

    if let Some(max_age) = config.max_age {
        cors_layer = cors_layer.max_age(max_age);
    }

    cors_layer
}
