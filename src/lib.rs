//! # anycrud
//!
//! A generic CRUD engine: one implementation serves create / read / update /
//! delete / recover for any entity type, with no per-entity query code.
//!
//! ## Features
//!
//! - **Descriptor-driven queries**: predicates, substring search across all
//!   textual fields and key lookups are built from the entity descriptor at
//!   call time
//! - **Paged reads**: 1-based pages, `page = -1` for everything, total row
//!   and page counts
//! - **Soft delete**: `deleted_date` marker, recover, hard delete
//! - **Nested property writes**: dotted paths such as `"address.city"`
//! - **Entity discovery**: one REST surface per exposed type, named after it
//! - **Pluggable persistence**: any `Store` implementation; an in-memory
//!   engine ships with the crate
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use anycrud::prelude::*;
//!
//! impl_crud_entity!(Widget, expose: true, {
//!     name: String,
//!     code: Option<String>,
//! });
//!
//! let db = InMemoryDatabase::new();
//! let mut logic = BusinessLogic::new(StoreFactory::<Widget>::open(&db)?);
//! let created = logic.create(Widget::new("Alpha".to_string(), None)).await?;
//!
//! let page = logic.read(1, 10, "Alp", false, false, "").await?;
//! assert_eq!(page.data.items.len(), 1);
//!
//! logic.delete(created.data.id, true).await?; // soft delete
//! logic.recover(created.data.id).await?;
//! ```

pub mod config;
pub mod core;
pub mod entities;
pub mod server;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core ===
    pub use crate::core::{
        auth::{
            Claims, CredentialCheck, CredentialOutcome, JwtTokenIssuer, LoginRequest,
            LoginService, StaticCredentialCheck, TokenIssuer,
        },
        entity::{Entity, Reflect},
        error::{AuthError, ConfigError, CrudError, StorageError, ValidationError},
        field::{EntityDescriptor, FieldDescriptor, FieldKind, FieldType, FieldValue},
        predicate::{CompareOp, FilterSpec, Predicate, build_filter, build_text_filter},
        property::set_nested_property,
        query::{ALL_PAGES, PageEnvelope},
        service::{BusinessLogic, OperationResult},
        store::{Query, QueryOp, Store, StoreFactory},
    };

    // === Macros ===
    pub use crate::{impl_crud_entity, impl_reflect_value};

    // === Storage ===
    pub use crate::storage::{InMemoryDatabase, InMemorySession};

    // === Config ===
    pub use crate::config::{AppConfig, EntityConfig, JwtConfig, PagingConfig, ServerConfig};

    // === Server ===
    pub use crate::server::{
        ApiResponse, DiscoveryReport, EntityBinding, EntityCatalog, EntityRegistry,
        GenericHandler, ServerBuilder, discover,
    };

    // === External dependencies ===
    pub use anyhow::Result;
    pub use async_trait::async_trait;
    pub use chrono::{DateTime, Utc};
    pub use serde::{Deserialize, Serialize};

    // === Axum ===
    pub use axum::Router;
}
