//! Entity traits defining the introspection surface used by the generic engine

use crate::core::field::{EntityDescriptor, FieldValue};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Run-time field access on an instance of an arbitrary type.
///
/// The generic engine never names concrete fields; it reads, compares and
/// writes them through this trait. Implementations are generated by
/// `impl_crud_entity!` and `impl_reflect_value!`.
pub trait Reflect: Send + Sync {
    /// Read a scalar field by its exact name
    fn field(&self, name: &str) -> Option<FieldValue>;

    /// Write a scalar field by its exact name
    ///
    /// Returns `false` when the field does not exist or `value` does not fit
    /// the field's type; the instance is left untouched in that case.
    fn set_field(&mut self, name: &str, value: FieldValue) -> bool;

    /// Borrow a nested value object by its exact name
    fn nested_mut(&mut self, _name: &str) -> Option<&mut dyn Reflect> {
        None
    }
}

/// Base trait for every domain type the engine can serve.
///
/// All entities carry:
/// - id: integer primary key assigned by the store
/// - created_date: creation timestamp
/// - deleted_date: soft deletion timestamp (`None` while active)
pub trait Entity: Reflect + Clone + Serialize + DeserializeOwned + 'static {
    /// Type name, also used as the route segment (e.g., "Widget")
    fn type_name() -> &'static str;

    /// Whether discovery should bind a generic CRUD handler for this type
    fn expose_crud() -> bool;

    /// Enumerate the fields of this type
    fn describe() -> EntityDescriptor;

    /// Primary key
    fn id(&self) -> i64;

    /// Name of the primary key field
    fn key_field() -> &'static str {
        "id"
    }

    /// Name of the soft-delete timestamp field
    fn soft_delete_field() -> &'static str {
        "deleted_date"
    }

    /// Check if the entity has been soft-deleted
    fn is_deleted(&self) -> bool {
        self.field(Self::soft_delete_field())
            .is_some_and(|value| !value.is_null())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::field::{FieldDescriptor, FieldType};
    use chrono::{DateTime, Utc};
    use serde::Deserialize;

    #[derive(Clone, Debug, Serialize, Deserialize)]
    struct Note {
        id: i64,
        text: String,
        deleted_date: Option<DateTime<Utc>>,
    }

    impl Reflect for Note {
        fn field(&self, name: &str) -> Option<FieldValue> {
            match name {
                "id" => Some(self.id.to_field_value()),
                "text" => Some(self.text.to_field_value()),
                "deleted_date" => Some(self.deleted_date.to_field_value()),
                _ => None,
            }
        }

        fn set_field(&mut self, name: &str, value: FieldValue) -> bool {
            match name {
                "deleted_date" => match FieldType::from_field_value(value) {
                    Some(v) => {
                        self.deleted_date = v;
                        true
                    }
                    None => false,
                },
                _ => false,
            }
        }
    }

    impl Entity for Note {
        fn type_name() -> &'static str {
            "Note"
        }

        fn expose_crud() -> bool {
            false
        }

        fn describe() -> EntityDescriptor {
            EntityDescriptor {
                type_name: "Note",
                fields: vec![
                    FieldDescriptor::of::<i64>("id"),
                    FieldDescriptor::of::<String>("text"),
                    FieldDescriptor::of::<Option<DateTime<Utc>>>("deleted_date"),
                ],
                nested: vec![],
            }
        }

        fn id(&self) -> i64 {
            self.id
        }
    }

    #[test]
    fn test_entity_is_deleted() {
        let mut note = Note {
            id: 1,
            text: "hello".to_string(),
            deleted_date: None,
        };
        assert!(!note.is_deleted());

        assert!(note.set_field("deleted_date", FieldValue::DateTime(Utc::now())));
        assert!(note.is_deleted());
    }

    #[test]
    fn test_default_field_names() {
        assert_eq!(Note::key_field(), "id");
        assert_eq!(Note::soft_delete_field(), "deleted_date");
    }

    #[test]
    fn test_nested_mut_defaults_to_none() {
        let mut note = Note {
            id: 1,
            text: String::new(),
            deleted_date: None,
        };
        assert!(note.nested_mut("anything").is_none());
    }
}
