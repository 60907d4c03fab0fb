//! Core module containing the generic engine and its collaborator interfaces

pub mod auth;
pub mod entity;
pub mod error;
pub mod field;
pub mod predicate;
pub mod property;
pub mod query;
pub mod service;
pub mod store;

pub use auth::{CredentialCheck, CredentialOutcome, LoginService, TokenIssuer};
pub use entity::{Entity, Reflect};
pub use error::{AuthError, ConfigError, CrudError, StorageError, ValidationError};
pub use field::{EntityDescriptor, FieldDescriptor, FieldKind, FieldType, FieldValue};
pub use predicate::{CompareOp, FilterSpec, Predicate, build_filter, build_text_filter};
pub use property::set_nested_property;
pub use query::{PageEnvelope, get};
pub use service::{BusinessLogic, OperationResult};
pub use store::{Query, QueryOp, Store, StoreFactory};
