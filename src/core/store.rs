//! Persistence engine interface consumed by the generic engine
//!
//! A [`Store`] is one unit-of-work session: `add`, `update` and `remove`
//! stage changes, `commit` applies them all and reports how many rows were
//! written. Reads go through [`Query`], a lazy ordered pipeline the store
//! executes as a whole.

use crate::core::entity::Entity;
use crate::core::error::StorageError;
use crate::core::predicate::Predicate;
use async_trait::async_trait;
use std::marker::PhantomData;

/// One step of a [`Query`] pipeline, executed in order
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOp {
    /// Keep rows matching the predicate
    Filter(Predicate),
    /// Drop the first `n` rows
    Skip(usize),
    /// Keep at most `n` rows
    Take(usize),
    /// Expand a related-entity path on every returned row
    Include(String),
}

/// A lazy query over the rows of `T`
///
/// Nothing runs until the query is handed to [`Store::fetch`] or
/// [`Store::count`].
#[derive(Debug, Clone)]
pub struct Query<T> {
    ops: Vec<QueryOp>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Entity> Default for Query<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Entity> Query<T> {
    pub fn new() -> Self {
        Self {
            ops: Vec::new(),
            _marker: PhantomData,
        }
    }

    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.ops.push(QueryOp::Filter(predicate));
        self
    }

    pub fn skip(mut self, n: usize) -> Self {
        self.ops.push(QueryOp::Skip(n));
        self
    }

    pub fn take(mut self, n: usize) -> Self {
        self.ops.push(QueryOp::Take(n));
        self
    }

    pub fn include(mut self, path: impl Into<String>) -> Self {
        self.ops.push(QueryOp::Include(path.into()));
        self
    }

    pub fn ops(&self) -> &[QueryOp] {
        &self.ops
    }

    /// Paths requested through `include`, in order
    pub fn includes(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            QueryOp::Include(path) => Some(path.as_str()),
            _ => None,
        })
    }
}

/// A unit-of-work session over the rows of one entity type
///
/// Implementations must apply a commit atomically: either every staged
/// change is written or none is.
#[async_trait]
pub trait Store<T: Entity>: Send + Sync {
    /// Stage an insert; the store assigns the primary key
    fn add(&mut self, entity: T) -> Result<T, StorageError>;

    /// Stage a full replacement of the row with the same primary key
    fn update(&mut self, entity: T) -> Result<T, StorageError>;

    /// Stage a permanent removal
    fn remove(&mut self, entity: T) -> Result<T, StorageError>;

    /// Run the query and materialize the rows
    async fn fetch(&self, query: &Query<T>) -> Result<Vec<T>, StorageError>;

    /// Run the query and count the rows without materializing includes
    async fn count(&self, query: &Query<T>) -> Result<usize, StorageError>;

    /// Apply every staged change and return the number of rows written
    async fn commit(&mut self) -> Result<usize, StorageError>;
}

/// Hands out fresh [`Store`] sessions for `T`
pub trait StoreFactory<T: Entity>: Send + Sync {
    fn open(&self) -> Result<Box<dyn Store<T>>, StorageError>;
}
