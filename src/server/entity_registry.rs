//! Entity registry collecting one route binding per exposed entity type

use axum::Router;
use std::collections::BTreeMap;

/// A bound API surface for one entity type
///
/// Produced by entity discovery; each binding owns everything its routes
/// need (store factory, paging defaults).
pub trait EntityBinding: Send + Sync {
    /// The entity type name, also the route segment (e.g., "Widget")
    fn type_name(&self) -> &str;

    /// Build the routes for this entity
    ///
    /// Paths are relative to the API root, e.g. `/Widget` and `/Widget/{id}`.
    fn build_routes(&self) -> Router;
}

/// Registry for all bound entities in the application
///
/// Built once at startup and handed to the router; there is no process-wide
/// registry.
#[derive(Default)]
pub struct EntityRegistry {
    bindings: BTreeMap<String, Box<dyn EntityBinding>>,
}

impl EntityRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a binding under its type name
    ///
    /// A second binding for the same type replaces the first.
    pub fn register(&mut self, binding: Box<dyn EntityBinding>) {
        let type_name = binding.type_name().to_string();
        tracing::info!(entity_type = %type_name, "registered entity routes");
        self.bindings.insert(type_name, binding);
    }

    /// Whether a binding exists for `type_name`
    pub fn contains(&self, type_name: &str) -> bool {
        self.bindings.contains_key(type_name)
    }

    /// Build a router with all registered entity routes
    pub fn build_routes(&self) -> Router {
        self.bindings
            .values()
            .fold(Router::new(), |router, binding| {
                router.merge(binding.build_routes())
            })
    }

    /// Registered entity types, sorted by name
    pub fn entity_types(&self) -> Vec<&str> {
        self.bindings.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::routing::get;
    use tower::ServiceExt;

    struct StaticBinding {
        type_name: String,
    }

    impl StaticBinding {
        fn boxed(type_name: &str) -> Box<dyn EntityBinding> {
            Box::new(Self {
                type_name: type_name.to_string(),
            })
        }
    }

    impl EntityBinding for StaticBinding {
        fn type_name(&self) -> &str {
            &self.type_name
        }

        fn build_routes(&self) -> Router {
            let name = self.type_name.clone();
            Router::new().route(&format!("/{}", self.type_name), get(move || async move { name }))
        }
    }

    #[test]
    fn test_new_registry_is_empty() {
        let registry = EntityRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.entity_types().is_empty());
    }

    #[test]
    fn test_register_and_contains() {
        let mut registry = EntityRegistry::new();
        registry.register(StaticBinding::boxed("Widget"));

        assert!(registry.contains("Widget"));
        assert!(!registry.contains("widget"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_entity_types_sorted() {
        let mut registry = EntityRegistry::new();
        registry.register(StaticBinding::boxed("Widget"));
        registry.register(StaticBinding::boxed("Role"));
        registry.register(StaticBinding::boxed("User"));
        assert_eq!(registry.entity_types(), vec!["Role", "User", "Widget"]);
    }

    #[test]
    fn test_register_duplicate_replaces() {
        let mut registry = EntityRegistry::new();
        registry.register(StaticBinding::boxed("Widget"));
        registry.register(StaticBinding::boxed("Widget"));
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_build_routes_merges_every_binding() {
        let mut registry = EntityRegistry::new();
        registry.register(StaticBinding::boxed("Widget"));
        registry.register(StaticBinding::boxed("Role"));
        let router = registry.build_routes();

        for path in ["/Widget", "/Role"] {
            let response = router
                .clone()
                .oneshot(Request::get(path).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }
    }
}
