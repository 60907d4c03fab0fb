//! Generic business logic engine
//!
//! [`BusinessLogic`] serves create / read / update / delete / recover / key
//! lookup for any [`Entity`] over one store session. It never names a
//! concrete field: soft-delete filters and key lookups are built from the
//! entity descriptor at call time.

use crate::core::entity::Entity;
use crate::core::error::{CrudError, ValidationError};
use crate::core::field::FieldValue;
use crate::core::predicate::{FilterSpec, NEGATION_MARKER, build_filter};
use crate::core::property::set_nested_property;
use crate::core::query::{ALL_PAGES, PageEnvelope, get, parse_includes};
use crate::core::store::Store;
use chrono::Utc;
use serde::Serialize;

/// Outcome of one engine call
///
/// `rows_affected` counts persisted changes for writes and returned items
/// for reads.
#[derive(Debug, Clone, Serialize)]
pub struct OperationResult<P> {
    pub data: P,
    pub rows_affected: usize,
}

impl<P> OperationResult<P> {
    pub fn new(data: P, rows_affected: usize) -> Self {
        Self {
            data,
            rows_affected,
        }
    }
}

/// CRUD facade bound to entity type `T`
///
/// Owns a single store session. Each mutating call issues exactly one
/// commit; sequences of calls are not transactional.
pub struct BusinessLogic<T: Entity> {
    store: Box<dyn Store<T>>,
}

impl<T: Entity> BusinessLogic<T> {
    pub fn new(store: Box<dyn Store<T>>) -> Self {
        Self { store }
    }

    /// Insert `entity`; the returned copy carries the store-assigned id
    pub async fn create(&mut self, entity: T) -> Result<OperationResult<T>, CrudError> {
        let staged = self.store.add(entity)?;
        let rows = self.store.commit().await?;
        tracing::debug!(entity_type = T::type_name(), id = staged.id(), rows, "created");
        Ok(OperationResult::new(staged, rows))
    }

    /// Paged read with soft-delete filtering
    ///
    /// - `include_deleted == false`: active rows only
    /// - `include_deleted && exclude_actived`: soft-deleted rows only
    /// - `exclude_actived` without `include_deleted` is rejected
    pub async fn read(
        &self,
        page: i64,
        page_size: i64,
        filter: &str,
        include_deleted: bool,
        exclude_actived: bool,
        includes: &str,
    ) -> Result<OperationResult<PageEnvelope<T>>, CrudError> {
        let mut spec = FilterSpec::new();
        match (include_deleted, exclude_actived) {
            (false, true) => return Err(ValidationError::ExcludeActiveWithoutDeleted.into()),
            (false, false) => {
                spec.insert(T::soft_delete_field().to_string(), FieldValue::Null);
            }
            (true, true) => {
                spec.insert(
                    format!("{}{}", NEGATION_MARKER, T::soft_delete_field()),
                    FieldValue::Null,
                );
            }
            (true, false) => {}
        }

        let predicate = build_filter::<T>(&spec)?;
        let envelope = get(
            self.store.as_ref(),
            predicate,
            page,
            page_size,
            filter,
            &parse_includes(includes),
        )
        .await?;

        let rows = envelope.items.len();
        Ok(OperationResult::new(envelope, rows))
    }

    /// Replace the stored row with the same id
    pub async fn update(&mut self, entity: T) -> Result<OperationResult<T>, CrudError> {
        let staged = self.store.update(entity)?;
        let rows = self.store.commit().await?;
        tracing::debug!(entity_type = T::type_name(), id = staged.id(), rows, "updated");
        Ok(OperationResult::new(staged, rows))
    }

    /// Soft-delete (`save_data == true`) or permanently remove the row `id`
    ///
    /// A missing row yields `{None, 0}` and nothing is committed.
    pub async fn delete(
        &mut self,
        id: i64,
        save_data: bool,
    ) -> Result<OperationResult<Option<T>>, CrudError> {
        let Some(mut entity) = self.find_by_id(id).await? else {
            return Ok(OperationResult::new(None, 0));
        };

        let staged = if save_data {
            set_nested_property(
                &mut entity,
                T::soft_delete_field(),
                FieldValue::DateTime(Utc::now()),
            );
            self.store.update(entity)?
        } else {
            self.store.remove(entity)?
        };

        let rows = self.store.commit().await?;
        tracing::debug!(entity_type = T::type_name(), id, save_data, rows, "deleted");
        Ok(OperationResult::new(Some(staged), rows))
    }

    /// Clear the soft-delete marker of row `id`
    ///
    /// A missing row yields `{None, 0}` and nothing is committed.
    pub async fn recover(&mut self, id: i64) -> Result<OperationResult<Option<T>>, CrudError> {
        let Some(mut entity) = self.find_by_id(id).await? else {
            return Ok(OperationResult::new(None, 0));
        };

        set_nested_property(&mut entity, T::soft_delete_field(), FieldValue::Null);
        let staged = self.store.update(entity)?;
        let rows = self.store.commit().await?;
        tracing::debug!(entity_type = T::type_name(), id, rows, "recovered");
        Ok(OperationResult::new(Some(staged), rows))
    }

    /// First row whose field `key` (case-insensitive) equals `value`
    ///
    /// `value` is coerced to the field's kind. Soft-deleted rows are
    /// included. `rows_affected` is reported as 1 whether or not a row
    /// matched.
    pub async fn get_by_key(
        &self,
        key: &str,
        value: &str,
    ) -> Result<OperationResult<Option<T>>, CrudError> {
        let found = self.lookup(key, value).await?;
        Ok(OperationResult::new(found, 1))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<T>, CrudError> {
        self.lookup(T::key_field(), &id.to_string()).await
    }

    async fn lookup(&self, key: &str, value: &str) -> Result<Option<T>, CrudError> {
        let descriptor = T::describe();
        let field = descriptor
            .find(key)
            .ok_or_else(|| ValidationError::UnknownField {
                entity_type: T::type_name().to_string(),
                field: key.to_string(),
            })?;

        let coerced = field
            .kind
            .parse(value)
            .ok_or_else(|| ValidationError::InvalidValue {
                entity_type: T::type_name().to_string(),
                field: field.name.to_string(),
                kind: field.kind,
                value: value.to_string(),
            })?;

        let mut spec = FilterSpec::new();
        spec.insert(field.name.to_string(), coerced);
        let predicate = build_filter::<T>(&spec)?;

        let envelope = get(self.store.as_ref(), predicate, ALL_PAGES, 1, "", &[]).await?;
        Ok(envelope.items.into_iter().next())
    }
}
