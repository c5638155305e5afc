//! Router assembly and shared application state.

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware,
    routing::get,
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::auth::{authenticate, enforce_origin};
use crate::config::AppConfig;
use crate::error::render_errors;
use crate::handlers;
use crate::identity::IdentityVerifier;
use crate::store::TaskStore;

const BODY_LIMIT: usize = 1024 * 1024;

/// Everything a request needs, constructed once at startup.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn TaskStore>,
    pub verifier: Arc<dyn IdentityVerifier>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn TaskStore>,
        verifier: Arc<dyn IdentityVerifier>,
        config: AppConfig,
    ) -> Self {
        Self {
            store,
            verifier,
            config: Arc::new(config),
        }
    }
}

fn task_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_tasks)
                .post(handlers::create_task)
                .fallback(handlers::route_not_found),
        )
        .route(
            "/:id",
            get(handlers::get_task)
                .put(handlers::update_task)
                .delete(handlers::delete_task)
                .fallback(handlers::route_not_found),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), authenticate))
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    // Credentials rule out a wildcard, so "any origin" mirrors the caller.
    let origins = if config.allowed_origins.is_empty() {
        AllowOrigin::mirror_request()
    } else {
        AllowOrigin::list(
            config
                .allowed_origins
                .iter()
                .filter_map(|origin| HeaderValue::from_str(origin).ok()),
        )
    };

    CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

pub fn router(state: AppState) -> Router {
    let mut app = Router::new()
        // A known path with an unsupported method is reported like an
        // unknown route.
        .route("/", get(handlers::health).fallback(handlers::route_not_found))
        .route(
            "/favicon.ico",
            get(handlers::favicon).fallback(handlers::route_not_found),
        )
        .nest("/api/tasks", task_routes(&state))
        // Clients that drop the `/api` prefix reach the same handlers.
        .nest("/tasks", task_routes(&state));

    if state.config.static_dir.is_dir() {
        app = app.nest_service("/app", ServeDir::new(&state.config.static_dir));
    }

    app.fallback(handlers::route_not_found)
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(cors_layer(&state.config))
        .layer(middleware::from_fn_with_state(state.clone(), enforce_origin))
        .layer(middleware::from_fn_with_state(state.clone(), render_errors))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
