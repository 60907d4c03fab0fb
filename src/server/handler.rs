//! Generic REST handler bound to one entity type
//!
//! Routes, relative to the API root (`{Type}` is `Entity::type_name()`):
//! - `POST   /{Type}` create
//! - `GET    /{Type}?page&page_size&filter&include_deleted&exclude_actived&includes` read
//! - `PUT    /{Type}` update
//! - `DELETE /{Type}/{id}?save_data=true` delete (soft by default)
//! - `PUT    /{Type}/{id}/recover` recover
//! - `GET    /{Type}/by-key?key&value` key lookup
//!
//! Every request opens its own store session and business logic engine.

use crate::core::entity::Entity;
use crate::core::error::{CrudError, ValidationError};
use crate::core::field::FieldKind;
use crate::core::query::ALL_PAGES;
use crate::core::service::BusinessLogic;
use crate::core::store::StoreFactory;
use crate::server::entity_registry::EntityBinding;
use crate::server::response::ApiResponse;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, put};
use axum::{Json, Router};
use serde::Deserialize;
use std::sync::Arc;

/// Query string of a read request; absent values take the defaults
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReadParams {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub filter: Option<String>,
    pub include_deleted: Option<bool>,
    pub exclude_actived: Option<bool>,
    pub includes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeleteParams {
    pub save_data: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct KeyParams {
    pub key: Option<String>,
    pub value: Option<String>,
}

struct HandlerState<T: Entity> {
    stores: Arc<dyn StoreFactory<T>>,
    default_page_size: i64,
}

impl<T: Entity> Clone for HandlerState<T> {
    fn clone(&self) -> Self {
        Self {
            stores: self.stores.clone(),
            default_page_size: self.default_page_size,
        }
    }
}

impl<T: Entity> HandlerState<T> {
    fn logic(&self) -> Result<BusinessLogic<T>, CrudError> {
        Ok(BusinessLogic::new(self.stores.open()?))
    }
}

/// CRUD API surface for entity type `T`
pub struct GenericHandler<T: Entity> {
    state: HandlerState<T>,
}

impl<T: Entity> GenericHandler<T> {
    /// Bind a handler for `T` after checking its descriptor
    ///
    /// The descriptor must have case-insensitively unique names, an integer
    /// key field and a nullable timestamp soft-delete field.
    pub fn new(
        stores: Arc<dyn StoreFactory<T>>,
        default_page_size: i64,
    ) -> Result<Self, ValidationError> {
        check_descriptor::<T>()?;
        Ok(Self {
            state: HandlerState {
                stores,
                default_page_size,
            },
        })
    }
}

fn check_descriptor<T: Entity>() -> Result<(), ValidationError> {
    let descriptor = T::describe();
    let invalid = |message: String| ValidationError::InvalidDescriptor {
        entity_type: T::type_name().to_string(),
        message,
    };

    if let Some(name) = descriptor.duplicate_name() {
        return Err(invalid(format!("field name '{}' is not unique", name)));
    }

    match descriptor.find(T::key_field()) {
        Some(field) if field.kind == FieldKind::Integer && !field.nullable => {}
        _ => {
            return Err(invalid(format!(
                "key field '{}' must be a non-null integer",
                T::key_field()
            )));
        }
    }

    match descriptor.find(T::soft_delete_field()) {
        Some(field) if field.kind == FieldKind::DateTime && field.nullable => Ok(()),
        _ => Err(invalid(format!(
            "soft-delete field '{}' must be a nullable timestamp",
            T::soft_delete_field()
        ))),
    }
}

impl<T: Entity> EntityBinding for GenericHandler<T> {
    fn type_name(&self) -> &str {
        T::type_name()
    }

    fn build_routes(&self) -> Router {
        let base = format!("/{}", T::type_name());

        Router::new()
            .route(
                &base,
                get(read::<T>).post(create::<T>).put(update::<T>),
            )
            .route(&format!("{}/by-key", base), get(get_by_key::<T>))
            .route(&format!("{}/{{id}}", base), delete(remove::<T>))
            .route(&format!("{}/{{id}}/recover", base), put(recover::<T>))
            .with_state(self.state.clone())
    }
}

fn invalid_parameter(name: &str, message: &str) -> CrudError {
    ValidationError::InvalidParameter {
        name: name.to_string(),
        message: message.to_string(),
    }
    .into()
}

fn check_id(id: i64) -> Result<(), CrudError> {
    if id < 1 {
        return Err(invalid_parameter("id", "must be at least 1"));
    }
    Ok(())
}

async fn create<T: Entity>(
    State(state): State<HandlerState<T>>,
    Json(entity): Json<T>,
) -> Result<Response, CrudError> {
    let result = state.logic()?.create(entity).await?;

    Ok(if result.rows_affected == 1 {
        ApiResponse::new(format!("{} created", T::type_name()), result).into_response()
    } else {
        ApiResponse::new(format!("Could not create {}", T::type_name()), result)
            .with_status(StatusCode::INTERNAL_SERVER_ERROR)
    })
}

async fn read<T: Entity>(
    State(state): State<HandlerState<T>>,
    Query(params): Query<ReadParams>,
) -> Result<Response, CrudError> {
    let page = params.page.unwrap_or(1);
    let page_size = params.page_size.unwrap_or(state.default_page_size);
    if page < 1 && page != ALL_PAGES {
        return Err(invalid_parameter("page", "must be at least 1, or -1 for all rows"));
    }
    if page_size < 1 {
        return Err(invalid_parameter("page_size", "must be at least 1"));
    }

    let result = state
        .logic()?
        .read(
            page,
            page_size,
            params.filter.as_deref().unwrap_or(""),
            params.include_deleted.unwrap_or(true),
            params.exclude_actived.unwrap_or(false),
            params.includes.as_deref().unwrap_or(""),
        )
        .await?;

    let envelope = &result.data;
    let message = if page == ALL_PAGES {
        format!(
            "{}: {} items. Showing all items (no pagination).",
            T::type_name(),
            envelope.row_count
        )
    } else {
        format!(
            "{}: {} items. {} per page, showing page {} of {}.",
            T::type_name(),
            envelope.row_count,
            envelope.page_size,
            envelope.current_page,
            envelope.page_count
        )
    };

    Ok(ApiResponse::new(message, result).into_response())
}

async fn update<T: Entity>(
    State(state): State<HandlerState<T>>,
    Json(entity): Json<T>,
) -> Result<Response, CrudError> {
    let id = entity.id();
    check_id(id)?;
    let result = state.logic()?.update(entity).await?;

    Ok(if result.rows_affected == 1 {
        ApiResponse::new(format!("{} {} updated", T::type_name(), id), result).into_response()
    } else {
        ApiResponse::new(format!("Could not update {} {}", T::type_name(), id), result)
            .with_status(StatusCode::INTERNAL_SERVER_ERROR)
    })
}

async fn remove<T: Entity>(
    State(state): State<HandlerState<T>>,
    Path(id): Path<i64>,
    Query(params): Query<DeleteParams>,
) -> Result<Response, CrudError> {
    check_id(id)?;
    let save_data = params.save_data.unwrap_or(true);
    let result = state.logic()?.delete(id, save_data).await?;

    let verb = if save_data { "soft-deleted" } else { "deleted" };
    Ok(if result.data.is_none() {
        ApiResponse::new(format!("{} {} not found", T::type_name(), id), result)
            .with_status(StatusCode::NOT_FOUND)
    } else if result.rows_affected == 1 {
        ApiResponse::new(format!("{} {} {}", T::type_name(), id, verb), result).into_response()
    } else {
        ApiResponse::new(format!("{} {} could not be {}", T::type_name(), id, verb), result)
            .with_status(StatusCode::INTERNAL_SERVER_ERROR)
    })
}

async fn recover<T: Entity>(
    State(state): State<HandlerState<T>>,
    Path(id): Path<i64>,
) -> Result<Response, CrudError> {
    check_id(id)?;
    let result = state.logic()?.recover(id).await?;

    Ok(if result.data.is_none() {
        ApiResponse::new(format!("{} {} not found", T::type_name(), id), result)
            .with_status(StatusCode::NOT_FOUND)
    } else if result.rows_affected == 1 {
        ApiResponse::new(format!("{} {} recovered", T::type_name(), id), result).into_response()
    } else {
        ApiResponse::new(format!("{} {} could not be recovered", T::type_name(), id), result)
            .into_response()
    })
}

async fn get_by_key<T: Entity>(
    State(state): State<HandlerState<T>>,
    Query(params): Query<KeyParams>,
) -> Result<Response, CrudError> {
    let key = params.key.unwrap_or_default();
    let value = params.value.unwrap_or_default();
    if key.is_empty() || value.is_empty() {
        return Err(invalid_parameter("key/value", "must not be empty"));
    }

    let result = state.logic()?.get_by_key(&key, &value).await?;
    let message = format!("{} where {} = {}", T::type_name(), key, value);
    Ok(ApiResponse::new(message, result).into_response())
}
