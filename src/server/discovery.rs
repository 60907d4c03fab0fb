//! Entity discovery and handler registration
//!
//! Domain types are listed explicitly in an [`EntityCatalog`] at startup.
//! [`discover`] walks the catalog once and binds a [`GenericHandler`] for
//! every type whose `expose` marker is set, naming its route segment after
//! the type.
//!
//! ```rust,ignore
//! let catalog = EntityCatalog::<InMemoryDatabase>::new()
//!     .with::<Widget>()
//!     .with::<Role>();
//!
//! let mut registry = EntityRegistry::new();
//! let report = discover(&catalog, Arc::new(db), &config, &mut registry);
//! assert!(report.failed.is_empty());
//! ```

use crate::config::AppConfig;
use crate::core::entity::Entity;
use crate::core::error::CrudError;
use crate::core::store::StoreFactory;
use crate::server::entity_registry::{EntityBinding, EntityRegistry};
use crate::server::handler::GenericHandler;
use std::sync::Arc;

/// Builds the binding of one catalog entry over database handle `D`
pub type Binder<D> =
    Box<dyn Fn(Arc<D>, &AppConfig) -> Result<Box<dyn EntityBinding>, CrudError> + Send + Sync>;

/// One domain type known to the application
pub struct CatalogEntry<D> {
    pub type_name: &'static str,
    /// Whether the type asks for a generic CRUD surface
    pub expose: bool,
    bind: Binder<D>,
}

/// Explicit list of domain types served over database handle `D`
pub struct EntityCatalog<D> {
    entries: Vec<CatalogEntry<D>>,
}

impl<D> Default for EntityCatalog<D> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<D: Send + Sync + 'static> EntityCatalog<D> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `T`, bound through the generic handler
    pub fn with<T>(self) -> Self
    where
        T: Entity,
        D: StoreFactory<T>,
    {
        self.with_binder(T::type_name(), T::expose_crud(), |db, config| {
            let stores: Arc<dyn StoreFactory<T>> = db;
            let handler = GenericHandler::<T>::new(stores, config.paging.default_page_size)?;
            Ok(Box::new(handler) as Box<dyn EntityBinding>)
        })
    }

    /// Add a type bound through a custom binder
    pub fn with_binder<F>(mut self, type_name: &'static str, expose: bool, bind: F) -> Self
    where
        F: Fn(Arc<D>, &AppConfig) -> Result<Box<dyn EntityBinding>, CrudError>
            + Send
            + Sync
            + 'static,
    {
        self.entries.push(CatalogEntry {
            type_name,
            expose,
            bind: Box::new(bind),
        });
        self
    }

    pub fn entries(&self) -> &[CatalogEntry<D>] {
        &self.entries
    }
}

/// What one discovery pass did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveryReport {
    /// Types bound and registered by this pass
    pub registered: Vec<String>,
    /// Marked types already present in the registry
    pub skipped: Vec<String>,
    /// Marked types switched off by configuration
    pub disabled: Vec<String>,
    /// Types whose binding failed, with the reason
    pub failed: Vec<(String, String)>,
}

/// Bind and register every exposed catalog entry not yet in `registry`
///
/// A failing binding is logged and recorded in the report; the remaining
/// entries are still processed. Running it again registers nothing new.
pub fn discover<D: Send + Sync + 'static>(
    catalog: &EntityCatalog<D>,
    db: Arc<D>,
    config: &AppConfig,
    registry: &mut EntityRegistry,
) -> DiscoveryReport {
    let mut report = DiscoveryReport::default();

    for entry in catalog.entries().iter().filter(|e| e.expose) {
        let name = entry.type_name.to_string();

        if registry.contains(entry.type_name) {
            report.skipped.push(name);
            continue;
        }
        if !config.is_exposed(entry.type_name) {
            tracing::info!(entity_type = %name, "exposure disabled by configuration");
            report.disabled.push(name);
            continue;
        }

        match (entry.bind)(db.clone(), config) {
            Ok(binding) => {
                registry.register(binding);
                report.registered.push(name);
            }
            Err(e) => {
                tracing::warn!(entity_type = %name, error = %e, "failed to bind entity handler");
                report.failed.push((name, e.to_string()));
            }
        }
    }

    report
}
