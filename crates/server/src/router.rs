//! HTTP router construction.
//!
//! Every endpoint module contributes one router; [`registered_routers`] lists
//! them with their mount prefix and [`include_routers`] mounts them.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::http::HeaderValue;
use axum::middleware;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::api;
use crate::metrics::track_rest_calls;
use crate::state::AppState;

/// Prefix of the versioned API.
pub const API_V1: &str = "/v1";

pub struct RegisteredRouter {
    pub name: &'static str,
    /// `None` mounts the routes at the root.
    pub prefix: Option<&'static str>,
    pub router: Router<Arc<AppState>>,
}

fn register(
    name: &'static str,
    prefix: Option<&'static str>,
    router: Router<Arc<AppState>>,
) -> RegisteredRouter {
    RegisteredRouter {
        name,
        prefix,
        router,
    }
}

/// All endpoint routers in mount order.
pub fn registered_routers() -> Vec<RegisteredRouter> {
    vec![
        register("root", None, api::root::router()),
        register("info", Some(API_V1), api::info::router()),
        register("models", Some(API_V1), api::models::router()),
        register("query", Some(API_V1), api::query::router()),
        register("streaming_query", Some(API_V1), api::streaming_query::router()),
        register("config", Some(API_V1), api::config::router()),
        register("feedback", Some(API_V1), api::feedback::router()),
        register("health", None, api::health::router()),
        register("authorized", None, api::authorized::router()),
        register("conversations", Some(API_V1), api::conversations::router()),
        register("metrics", None, api::metrics::router()),
    ]
}

/// Mount every registered router on `app`.
///
/// Routers sharing a prefix are merged first and nested once.
pub fn include_routers(app: Router<Arc<AppState>>) -> Router<Arc<AppState>> {
    let mut nested: BTreeMap<&'static str, Router<Arc<AppState>>> = BTreeMap::new();
    let mut app = app;

    for registered in registered_routers() {
        tracing::debug!(
            router = registered.name,
            prefix = registered.prefix.unwrap_or("/"),
            "including router"
        );
        match registered.prefix {
            Some(prefix) => {
                let group = nested.remove(prefix).unwrap_or_default();
                nested.insert(prefix, group.merge(registered.router));
            }
            None => app = app.merge(registered.router),
        }
    }

    nested
        .into_iter()
        .fold(app, |app, (prefix, group)| app.nest(prefix, group))
}

fn cors_layer(origin: &str) -> CorsLayer {
    if origin == "*" {
        return CorsLayer::permissive();
    }
    match origin.parse::<HeaderValue>() {
        Ok(value) => CorsLayer::new()
            .allow_origin(value)
            .allow_methods(Any)
            .allow_headers(Any),
        Err(_) => {
            tracing::warn!("Invalid CORS_ORIGIN '{}', allowing any origin", origin);
            CorsLayer::permissive()
        }
    }
}

/// Build the complete application router with all routes and middleware.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config.service.cors_origin);

    include_routers(Router::new())
        .route_layer(middleware::from_fn_with_state(state.clone(), track_rest_calls))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
        .merge(Scalar::with_url("/docs", api::doc::ApiDoc::openapi()))
}
