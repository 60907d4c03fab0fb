//! ServerBuilder for fluent API to build HTTP servers

use super::discovery::{DiscoveryReport, EntityCatalog, discover};
use super::entity_registry::{EntityBinding, EntityRegistry};
use super::exposure::RestExposure;
use crate::config::AppConfig;
use crate::core::auth::LoginService;
use anyhow::Result;
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Builder for creating HTTP servers with auto-registered entity routes
///
/// # Example
///
/// ```ignore
/// let app = ServerBuilder::new(config)
///     .discover(&catalog, Arc::new(db))
///     .with_login(login_service)
///     .build()?;
/// ```
pub struct ServerBuilder {
    config: AppConfig,
    entity_registry: EntityRegistry,
    login: Option<LoginService>,
    custom_routes: Vec<Router>,
    reports: Vec<DiscoveryReport>,
}

impl ServerBuilder {
    /// Create a new ServerBuilder
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            entity_registry: EntityRegistry::new(),
            login: None,
            custom_routes: Vec::new(),
            reports: Vec::new(),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Bind every exposed type of `catalog` over `db`
    ///
    /// Types already registered (by an earlier call or by
    /// [`register`](Self::register)) are left untouched.
    pub fn discover<D: Send + Sync + 'static>(
        mut self,
        catalog: &EntityCatalog<D>,
        db: Arc<D>,
    ) -> Self {
        let report = discover(catalog, db, &self.config, &mut self.entity_registry);
        tracing::info!(
            registered = report.registered.len(),
            skipped = report.skipped.len(),
            disabled = report.disabled.len(),
            failed = report.failed.len(),
            "entity discovery finished"
        );
        self.reports.push(report);
        self
    }

    /// Register a hand-written binding
    pub fn register(mut self, binding: Box<dyn EntityBinding>) -> Self {
        self.entity_registry.register(binding);
        self
    }

    /// Serve `POST /api/User/login` through `service`
    pub fn with_login(mut self, service: LoginService) -> Self {
        self.login = Some(service);
        self
    }

    /// Add custom routes to the server
    ///
    /// Use this for endpoints that don't fit the CRUD pattern. They are
    /// merged at the root, not under `/api`.
    pub fn with_custom_routes(mut self, routes: Router) -> Self {
        self.custom_routes.push(routes);
        self
    }

    /// Reports of every discovery pass run so far
    pub fn discovery_reports(&self) -> &[DiscoveryReport] {
        &self.reports
    }

    pub fn entity_types(&self) -> Vec<&str> {
        self.entity_registry.entity_types()
    }

    /// Build the final REST router
    pub fn build(self) -> Result<Router> {
        self.config.validate()?;
        if self.login.is_some() && self.config.jwt.secret.is_empty() {
            anyhow::bail!("jwt.secret must be set when the login route is enabled");
        }

        Ok(RestExposure::build_router(
            &self.entity_registry,
            self.login,
            self.custom_routes,
        ))
    }

    /// Serve the application with graceful shutdown
    ///
    /// This will:
    /// - Bind to `server.host:server.port` from the configuration
    /// - Start serving requests
    /// - Handle SIGTERM and SIGINT (Ctrl+C) for graceful shutdown
    pub async fn serve(self) -> Result<()> {
        let addr = self.config.server.address();
        let app = self.build()?;
        let listener = TcpListener::bind(&addr).await?;

        tracing::info!("Server listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

/// Wait for shutdown signal (SIGTERM or Ctrl+C)
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::warn!("failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::warn!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal, initiating graceful shutdown...");
        },
    }
}
