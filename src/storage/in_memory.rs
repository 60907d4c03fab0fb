//! In-memory persistence engine for testing and development
//!
//! [`InMemoryDatabase`] keeps one table per entity type behind a shared
//! `RwLock`. Each [`InMemorySession`] stages changes and applies them in a
//! single commit: every staged change is checked first, then all are written
//! under one write lock.

use crate::core::entity::Entity;
use crate::core::error::StorageError;
use crate::core::field::FieldValue;
use crate::core::store::{Query, QueryOp, Store, StoreFactory};
use async_trait::async_trait;
use std::any::{Any, TypeId};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

/// Expands one related-entity path onto a fetched row
///
/// Resolvers run after the table lock is released, so they may read other
/// tables through the database handle.
pub type IncludeResolver<T> =
    Arc<dyn Fn(&InMemoryDatabase, &mut T) -> Result<(), StorageError> + Send + Sync>;

type AnyTable = Box<dyn Any + Send + Sync>;
type AnyResolver = Arc<dyn Any + Send + Sync>;

struct Table<T> {
    rows: BTreeMap<i64, T>,
    next_id: i64,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            next_id: 1,
        }
    }
}

/// Shared in-memory database
///
/// Cloning is cheap and every clone sees the same tables.
#[derive(Clone, Default)]
pub struct InMemoryDatabase {
    tables: Arc<RwLock<HashMap<TypeId, AnyTable>>>,
    includes: Arc<HashMap<(TypeId, String), AnyResolver>>,
}

impl InMemoryDatabase {
    /// Create an empty database
    pub fn new() -> Self {
        Self::default()
    }

    /// Register how to expand `path` on rows of `T`
    pub fn with_include<T, F>(mut self, path: impl Into<String>, resolver: F) -> Self
    where
        T: Entity,
        F: Fn(&InMemoryDatabase, &mut T) -> Result<(), StorageError> + Send + Sync + 'static,
    {
        let resolver: IncludeResolver<T> = Arc::new(resolver);
        Arc::make_mut(&mut self.includes)
            .insert((TypeId::of::<T>(), path.into()), Arc::new(resolver));
        self
    }

    /// Open a new unit-of-work session over `T`
    pub fn session<T: Entity>(&self) -> InMemorySession<T> {
        InMemorySession::new(self.clone())
    }

    /// Read one stored row by primary key, soft-deleted rows included
    pub fn find<T: Entity>(&self, id: i64) -> Result<Option<T>, StorageError> {
        self.with_table(|table: Option<&Table<T>>| {
            table.and_then(|t| t.rows.get(&id).cloned())
        })
    }

    /// Number of stored rows of `T`
    pub fn len<T: Entity>(&self) -> Result<usize, StorageError> {
        self.with_table(|table: Option<&Table<T>>| table.map_or(0, |t| t.rows.len()))
    }

    fn with_table<T: Entity, R>(
        &self,
        f: impl FnOnce(Option<&Table<T>>) -> R,
    ) -> Result<R, StorageError> {
        let tables = self.tables.read().map_err(|e| StorageError::Lock {
            message: format!("Failed to acquire read lock: {}", e),
        })?;
        let table = tables
            .get(&TypeId::of::<T>())
            .and_then(|t| t.downcast_ref::<Table<T>>());
        Ok(f(table))
    }

    fn with_table_mut<T: Entity, R>(
        &self,
        f: impl FnOnce(&mut Table<T>) -> Result<R, StorageError>,
    ) -> Result<R, StorageError> {
        let mut tables = self.tables.write().map_err(|e| StorageError::Lock {
            message: format!("Failed to acquire write lock: {}", e),
        })?;
        let slot = tables
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(Table::<T>::default()));
        let table = slot
            .downcast_mut::<Table<T>>()
            .ok_or_else(|| StorageError::Unavailable {
                backend: "in-memory".to_string(),
                message: format!("table for '{}' holds another type", T::type_name()),
            })?;
        f(table)
    }

    fn resolver<T: Entity>(&self, path: &str) -> Option<IncludeResolver<T>> {
        self.includes
            .get(&(TypeId::of::<T>(), path.to_string()))
            .and_then(|r| r.downcast_ref::<IncludeResolver<T>>())
            .cloned()
    }

    /// Run the row-shaping ops of `query`, returning the surviving rows
    fn run<T: Entity>(&self, query: &Query<T>) -> Result<Vec<T>, StorageError> {
        self.with_table(|table: Option<&Table<T>>| {
            let mut rows: Vec<&T> = table.map(|t| t.rows.values().collect()).unwrap_or_default();

            for op in query.ops() {
                match op {
                    QueryOp::Filter(predicate) => rows.retain(|row| predicate.evaluate(*row)),
                    QueryOp::Skip(n) => {
                        rows.drain(..(*n).min(rows.len()));
                    }
                    QueryOp::Take(n) => rows.truncate(*n),
                    QueryOp::Include(_) => {}
                }
            }

            rows.into_iter().cloned().collect()
        })
    }
}

impl<T: Entity> StoreFactory<T> for InMemoryDatabase {
    fn open(&self) -> Result<Box<dyn Store<T>>, StorageError> {
        Ok(Box::new(self.session::<T>()))
    }
}

enum Change<T> {
    Added(T),
    Updated(T),
    Removed(i64),
}

impl<T: Entity> Change<T> {
    fn id(&self) -> i64 {
        match self {
            Change::Added(row) | Change::Updated(row) => row.id(),
            Change::Removed(id) => *id,
        }
    }
}

/// One unit of work against an [`InMemoryDatabase`]
pub struct InMemorySession<T: Entity> {
    db: InMemoryDatabase,
    pending: Vec<Change<T>>,
}

impl<T: Entity> InMemorySession<T> {
    pub fn new(db: InMemoryDatabase) -> Self {
        Self {
            db,
            pending: Vec::new(),
        }
    }

    /// Number of staged, uncommitted changes
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    fn reserve_id(&self, requested: i64) -> Result<i64, StorageError> {
        self.db.with_table_mut(|table: &mut Table<T>| {
            let id = if requested > 0 { requested } else { table.next_id };
            let next = id.checked_add(1).ok_or_else(|| StorageError::KeyOutOfRange {
                entity_type: T::type_name().to_string(),
                id,
            })?;
            table.next_id = table.next_id.max(next);
            Ok(id)
        })
    }
}

#[async_trait]
impl<T: Entity> Store<T> for InMemorySession<T> {
    fn add(&mut self, mut entity: T) -> Result<T, StorageError> {
        let id = self.reserve_id(entity.id())?;
        entity.set_field(T::key_field(), FieldValue::Integer(id));
        self.pending.push(Change::Added(entity.clone()));
        Ok(entity)
    }

    fn update(&mut self, entity: T) -> Result<T, StorageError> {
        self.pending.push(Change::Updated(entity.clone()));
        Ok(entity)
    }

    fn remove(&mut self, entity: T) -> Result<T, StorageError> {
        self.pending.push(Change::Removed(entity.id()));
        Ok(entity)
    }

    async fn fetch(&self, query: &Query<T>) -> Result<Vec<T>, StorageError> {
        let resolvers = query
            .includes()
            .map(|path| {
                self.db
                    .resolver::<T>(path)
                    .ok_or_else(|| StorageError::UnknownInclude {
                        entity_type: T::type_name().to_string(),
                        path: path.to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut rows = self.db.run(query)?;
        for resolver in &resolvers {
            for row in rows.iter_mut() {
                resolver(&self.db, row)?;
            }
        }
        Ok(rows)
    }

    async fn count(&self, query: &Query<T>) -> Result<usize, StorageError> {
        Ok(self.db.run(query)?.len())
    }

    async fn commit(&mut self) -> Result<usize, StorageError> {
        let changes = std::mem::take(&mut self.pending);

        let written = self.db.with_table_mut(|table: &mut Table<T>| {
            // Presence of each touched id as the batch would leave it
            let mut present: HashMap<i64, bool> = HashMap::new();
            for change in &changes {
                let id = change.id();
                let exists = present
                    .get(&id)
                    .copied()
                    .unwrap_or_else(|| table.rows.contains_key(&id));
                match change {
                    Change::Added(_) if exists => {
                        return Err(StorageError::DuplicateKey {
                            entity_type: T::type_name().to_string(),
                            id,
                        });
                    }
                    Change::Updated(_) | Change::Removed(_) if !exists => {
                        return Err(StorageError::RowNotFound {
                            entity_type: T::type_name().to_string(),
                            id,
                        });
                    }
                    Change::Removed(_) => present.insert(id, false),
                    _ => present.insert(id, true),
                };
            }

            let written = changes.len();
            for change in changes {
                match change {
                    Change::Added(row) | Change::Updated(row) => {
                        table.rows.insert(row.id(), row);
                    }
                    Change::Removed(id) => {
                        table.rows.remove(&id);
                    }
                }
            }
            Ok(written)
        })?;

        tracing::debug!(entity_type = T::type_name(), rows = written, "in-memory commit");
        Ok(written)
    }
}
