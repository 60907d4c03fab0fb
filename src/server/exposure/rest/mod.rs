//! REST API exposure
//!
//! Consumes the entity registry (and the optional login service) and
//! produces an Axum `Router`: health routes at the root, entity and login
//! routes under `/api`.

use crate::core::auth::LoginService;
use crate::server::entity_registry::EntityRegistry;
use crate::server::login::login_routes;
use axum::{Json, Router, routing::get};
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;

/// Prefix of every entity route
pub const API_PREFIX: &str = "/api";

/// REST API exposure implementation
pub struct RestExposure;

impl RestExposure {
    /// Build the REST router
    ///
    /// Returns a router with:
    /// - Health check routes
    /// - Entity CRUD routes under `/api`
    /// - The login route under `/api` when a login service is given
    /// - Custom routes, merged as-is
    pub fn build_router(
        registry: &EntityRegistry,
        login: Option<LoginService>,
        custom_routes: Vec<Router>,
    ) -> Router {
        let mut api = registry.build_routes();
        if let Some(service) = login {
            api = api.merge(login_routes(service));
        }

        let mut app = Self::health_routes().nest(API_PREFIX, api);
        for custom_router in custom_routes {
            app = app.merge(custom_router);
        }

        app.layer(TraceLayer::new_for_http())
    }

    /// Build health check routes
    fn health_routes() -> Router {
        Router::new()
            .route("/health", get(Self::health_check))
            .route("/healthz", get(Self::health_check))
    }

    /// Health check endpoint handler
    async fn health_check() -> Json<Value> {
        Json(json!({
            "status": "ok",
            "service": "anycrud"
        }))
    }
}
