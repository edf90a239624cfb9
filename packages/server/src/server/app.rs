//! Application setup and server configuration.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::Extension,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware,
    routing::get,
    Router,
};
use sqlx::PgPool;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::domains;
use crate::kernel::ServerDeps;
use crate::server::middleware::{extract_client_ip, jwt_auth_middleware};
use crate::server::routes::health_handler;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub deps: Arc<ServerDeps>,
}

impl AppState {
    pub fn new(deps: Arc<ServerDeps>) -> Self {
        Self {
            db_pool: deps.db_pool.clone(),
            deps,
        }
    }
}

/// All domain routes. Mounted under `/api/v1`.
pub fn api_router() -> Router {
    Router::new()
        .merge(domains::auth::routes::router())
        .merge(domains::users::routes::router())
        .merge(domains::organizations::routes::router())
        .merge(domains::campaigns::routes::router())
        .merge(domains::donations::routes::router())
        .merge(domains::donation_types::routes::router())
        .merge(domains::applications::routes::router())
        .merge(domains::evidence::routes::router())
        .merge(domains::transparency::routes::router())
        .merge(domains::reports::routes::router())
        .merge(domains::notifications::routes::router())
        .merge(domains::audit::routes::router())
        .merge(domains::settings::routes::router())
        .merge(domains::dashboard::routes::router())
}

/// Empty list means any origin.
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE]);

    if allowed_origins.is_empty() {
        return cors.allow_origin(Any);
    }
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    cors.allow_origin(origins)
}

/// Router with every route and middleware except rate limiting.
/// Integration tests drive this directly.
pub fn build_router(deps: Arc<ServerDeps>, allowed_origins: &[String]) -> Router {
    let app_state = AppState::new(deps.clone());
    let jwt_service = deps.jwt_service.clone();

    Router::new()
        .nest("/api/v1", api_router())
        .route("/health", get(health_handler))
        // Middleware layers (applied in reverse order - last added runs first)
        .layer(middleware::from_fn(move |req, next| {
            jwt_auth_middleware(jwt_service.clone(), req, next)
        }))
        .layer(middleware::from_fn(extract_client_ip))
        .layer(Extension(app_state))
        .layer(cors_layer(allowed_origins))
        .layer(TraceLayer::new_for_http())
}

/// Build the Axum application: `build_router` plus per-IP rate limiting
/// (10 req/s, bursts of 20). Needs `into_make_service_with_connect_info`.
pub fn build_app(deps: Arc<ServerDeps>, allowed_origins: &[String]) -> Result<Router> {
    let rate_limit_config = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(10)
            .burst_size(20)
            .use_headers()
            .finish()
            .context("Invalid rate limiter configuration")?,
    );

    Ok(build_router(deps, allowed_origins).layer(GovernorLayer {
        config: rate_limit_config,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_origins_are_skipped() {
        // Must not panic on a header value with control characters
        let _ = cors_layer(&["https://seffafbagis.org".to_string(), "bad\norigin".to_string()]);
        let _ = cors_layer(&[]);
    }
}
