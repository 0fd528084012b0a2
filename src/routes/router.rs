use crate::config::RateLimitConfig;
use crate::cors::{cors_layer, OriginPolicy};
use crate::error::{AppError, AppResult};
use crate::middleware::{request_id_middleware, ClientIpKeyExtractor, RequestId};
use crate::services::photos::UPLOADS_ROUTE;
use axum::body::Body;
use axum::extract::DefaultBodyLimit;
use axum::http::Request;
use axum::middleware;
use axum::routing::{get, post};
use std::sync::Arc;
use tower_governor::governor::GovernorConfigBuilder;
use tower_governor::GovernorLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use super::auth_handlers;
use super::favorite_handlers;
use super::health;
use super::recipe_handlers;
use super::AppState;

/// Create application router
pub fn create_router<P>(
    state: Arc<AppState>,
    origin_policy: Arc<P>,
    rate_limit_config: &RateLimitConfig,
    max_body_bytes: usize,
) -> AppResult<axum::Router>
where
    P: OriginPolicy + ?Sized + 'static,
{
    // Throttle credential endpoints per client IP
    let governor_config = GovernorConfigBuilder::default()
        .per_millisecond(rate_limit_config.replenish_interval_ms())
        .burst_size(rate_limit_config.burst_size)
        .key_extractor(ClientIpKeyExtractor)
        .finish()
        .ok_or_else(|| AppError::Configuration("Invalid rate limit settings".to_string()))?;
    let governor_layer = GovernorLayer::new(governor_config);

    let auth_routes = axum::Router::new()
        .route("/api/auth/register", post(auth_handlers::register))
        .route("/api/auth/login", post(auth_handlers::login))
        .layer(governor_layer);

    let recipe_routes = axum::Router::new()
        .route(
            "/api/recipes",
            get(recipe_handlers::list_recipes).post(recipe_handlers::create_recipe),
        )
        .route(
            "/api/recipes/me/favorites",
            get(favorite_handlers::list_favorites),
        )
        .route(
            "/api/recipes/{id}",
            get(recipe_handlers::get_recipe)
                .put(recipe_handlers::update_recipe)
                .delete(recipe_handlers::delete_recipe),
        )
        .route("/api/recipes/{id}/comments", post(recipe_handlers::add_comment))
        .route("/api/recipes/{id}/ratings", post(recipe_handlers::add_rating))
        .route(
            "/api/recipes/{id}/favorite",
            post(favorite_handlers::add_favorite).delete(favorite_handlers::remove_favorite),
        );

    // Health check endpoints (no rate limiting)
    let health_routes = axum::Router::new()
        .route("/", get(health::root))
        .route("/api/health", get(health::health_check))
        .route("/api/test", get(health::store_test));

    let trace_layer = TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
        let request_id = req
            .extensions()
            .get::<RequestId>()
            .map(RequestId::as_str)
            .unwrap_or("-");
        tracing::info_span!(
            "http_request",
            request_id = %request_id,
            method = %req.method(),
            path = %req.uri().path(),
        )
    });

    let uploads = ServeDir::new(&state.upload_dir);

    let router = auth_routes
        .merge(recipe_routes)
        .merge(health_routes)
        .nest_service(UPLOADS_ROUTE, uploads)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(trace_layer)
        .layer(cors_layer(origin_policy))
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state);

    Ok(router)
}
