//! Server module for building HTTP servers with auto-registered routes
//!
//! This module provides:
//! - entity discovery binding one generic handler per exposed type
//! - the registry collecting those bindings
//! - a `ServerBuilder` that exposes everything over REST

pub mod builder;
pub mod discovery;
pub mod entity_registry;
pub mod exposure;
pub mod handler;
pub mod login;
pub mod response;

pub use builder::ServerBuilder;
pub use discovery::{DiscoveryReport, EntityCatalog, discover};
pub use entity_registry::{EntityBinding, EntityRegistry};
pub use exposure::RestExposure;
pub use handler::GenericHandler;
pub use response::ApiResponse;
