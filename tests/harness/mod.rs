//! Shared fixtures for the integration tests
//!
//! Provides a few entity types with different field shapes, a store that
//! fails on demand, and helpers to wire engines and routers.
//!
//! ```rust,ignore
//! mod harness;
//! use harness::*;
//! ```

#![allow(dead_code)]

use anycrud::prelude::*;
use std::marker::PhantomData;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

impl_crud_entity!(Widget, expose: true, {
    name: String,
    code: Option<String>,
});

// Entity without any string field; substring search cannot be built for it
impl_crud_entity!(Counter, expose: true, {
    value: i64,
});

// Entity not marked for exposure
impl_crud_entity!(AuditEntry, expose: false, {
    action: String,
});

impl_reflect_value!(Address, {
    street: Option<String>,
    city: Option<String>,
});

impl_crud_entity!(
    Customer,
    expose: true,
    {
        name: String,
        email: Option<String>,
    },
    nested: {
        address: Address,
    }
);

// ---------------------------------------------------------------------------
// Stores
// ---------------------------------------------------------------------------

/// Store whose every access fails with `StorageError::Unavailable`
pub struct UnavailableStore<T> {
    _marker: PhantomData<T>,
}

impl<T> UnavailableStore<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }

    fn error() -> StorageError {
        StorageError::Unavailable {
            backend: "test".to_string(),
            message: "connection refused".to_string(),
        }
    }
}

#[async_trait]
impl<T: Entity> Store<T> for UnavailableStore<T> {
    fn add(&mut self, entity: T) -> std::result::Result<T, StorageError> {
        Ok(entity)
    }

    fn update(&mut self, entity: T) -> std::result::Result<T, StorageError> {
        Ok(entity)
    }

    fn remove(&mut self, entity: T) -> std::result::Result<T, StorageError> {
        Ok(entity)
    }

    async fn fetch(&self, _query: &Query<T>) -> std::result::Result<Vec<T>, StorageError> {
        Err(Self::error())
    }

    async fn count(&self, _query: &Query<T>) -> std::result::Result<usize, StorageError> {
        Err(Self::error())
    }

    async fn commit(&mut self) -> std::result::Result<usize, StorageError> {
        Err(Self::error())
    }
}

/// Database handle whose sessions are all unavailable
pub struct UnavailableDatabase;

impl<T: Entity> StoreFactory<T> for UnavailableDatabase {
    fn open(&self) -> std::result::Result<Box<dyn Store<T>>, StorageError> {
        Ok(Box::new(UnavailableStore::<T>::new()))
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Fresh engine for `T` over `db`
pub fn logic<T: Entity>(db: &InMemoryDatabase) -> BusinessLogic<T> {
    BusinessLogic::new(Box::new(db.session::<T>()))
}

/// Create one widget per name, in order, and return the stored copies
pub async fn seed_widgets(db: &InMemoryDatabase, names: &[&str]) -> Vec<Widget> {
    let mut engine = logic::<Widget>(db);
    let mut created = Vec::with_capacity(names.len());
    for name in names {
        let result = engine
            .create(Widget::new(name.to_string(), None))
            .await
            .unwrap();
        created.push(result.data);
    }
    created
}

pub fn catalog() -> EntityCatalog<InMemoryDatabase> {
    EntityCatalog::new()
        .with::<Widget>()
        .with::<Counter>()
        .with::<Customer>()
        .with::<AuditEntry>()
}

pub const TEST_SECRET: &str = "integration-test-secret-0123456789";

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.jwt.secret = TEST_SECRET.to_string();
    config
}

pub fn login_service(config: &AppConfig) -> LoginService {
    let credentials = StaticCredentialCheck::new().with_user("ada", "lovelace", &["admin"]);
    LoginService::new(
        Arc::new(credentials),
        Arc::new(JwtTokenIssuer::from_config(&config.jwt)),
        config.jwt.clone(),
    )
}

/// Full application router over `db`, login route included
pub fn build_app(db: InMemoryDatabase) -> Router {
    let config = test_config();
    let login = login_service(&config);
    ServerBuilder::new(config)
        .discover(&catalog(), Arc::new(db))
        .with_login(login)
        .build()
        .unwrap()
}
