//! Macros for reducing boilerplate when defining entities
//!
//! These macros generate the struct, the `Reflect` field table and the
//! `Entity` implementation the generic engine needs for each domain type.

/// Complete macro to create a CRUD entity with automatic trait implementations
///
/// Every generated entity carries the base fields:
/// - `id: i64` assigned by the store (defaults to 0 when absent from JSON)
/// - `created_date: DateTime<Utc>` (defaults to now when absent from JSON)
/// - `deleted_date: Option<DateTime<Utc>>` soft-delete marker
///
/// `expose` is the marker read by entity discovery. Nested value objects
/// (generated with [`impl_reflect_value!`](crate::impl_reflect_value)) are
/// reachable through dotted property paths such as `"address.city"`.
///
/// # Example
///
/// ```rust,ignore
/// use anycrud::prelude::*;
///
/// impl_reflect_value!(Address, {
///     city: Option<String>,
/// });
///
/// impl_crud_entity!(
///     Customer,
///     expose: true,
///     {
///         name: String,
///         email: Option<String>,
///     },
///     nested: {
///         address: Address,
///     }
/// );
///
/// let customer = Customer::new("Ada".to_string(), None);
/// assert_eq!(customer.id, 0);
/// ```
#[macro_export]
macro_rules! impl_crud_entity {
    (
        $type:ident,
        expose: $expose:expr,
        {
            $( $field:ident : $field_type:ty ),* $(,)?
        }
        $(, nested: {
            $( $nested:ident : $nested_type:ty ),* $(,)?
        } )?
        $(,)?
    ) => {
        #[derive(Debug, Clone, ::serde::Serialize, ::serde::Deserialize)]
        pub struct $type {
            /// Primary key assigned by the store
            #[serde(default)]
            pub id: i64,

            /// When this entity was created
            #[serde(default = "::chrono::Utc::now")]
            pub created_date: ::chrono::DateTime<::chrono::Utc>,

            /// When this entity was soft-deleted (if applicable)
            #[serde(default)]
            pub deleted_date: Option<::chrono::DateTime<::chrono::Utc>>,

            $( pub $field : $field_type, )*

            $( $(
                #[serde(default)]
                pub $nested : $nested_type,
            )* )?
        }

        impl $crate::core::entity::Reflect for $type {
            fn field(&self, name: &str) -> Option<$crate::core::field::FieldValue> {
                use $crate::core::field::FieldType;

                match name {
                    "id" => return Some(self.id.to_field_value()),
                    "created_date" => return Some(self.created_date.to_field_value()),
                    "deleted_date" => return Some(self.deleted_date.to_field_value()),
                    _ => {}
                }
                $(
                    if name == stringify!($field) {
                        return Some(self.$field.to_field_value());
                    }
                )*
                None
            }

            fn set_field(&mut self, name: &str, value: $crate::core::field::FieldValue) -> bool {
                use $crate::core::field::assign_field;

                match name {
                    "id" => return assign_field(&mut self.id, value),
                    "created_date" => return assign_field(&mut self.created_date, value),
                    "deleted_date" => return assign_field(&mut self.deleted_date, value),
                    _ => {}
                }
                $(
                    if name == stringify!($field) {
                        return assign_field(&mut self.$field, value);
                    }
                )*
                false
            }

            fn nested_mut(&mut self, name: &str) -> Option<&mut dyn $crate::core::entity::Reflect> {
                $( $(
                    if name == stringify!($nested) {
                        return Some(&mut self.$nested);
                    }
                )* )?
                let _ = name;
                None
            }
        }

        impl $crate::core::entity::Entity for $type {
            fn type_name() -> &'static str {
                stringify!($type)
            }

            fn expose_crud() -> bool {
                $expose
            }

            fn describe() -> $crate::core::field::EntityDescriptor {
                use $crate::core::field::FieldDescriptor;

                $crate::core::field::EntityDescriptor {
                    type_name: stringify!($type),
                    fields: vec![
                        FieldDescriptor::of::<i64>("id"),
                        FieldDescriptor::of::<::chrono::DateTime<::chrono::Utc>>("created_date"),
                        FieldDescriptor::of::<Option<::chrono::DateTime<::chrono::Utc>>>("deleted_date"),
                        $( FieldDescriptor::of::<$field_type>(stringify!($field)), )*
                    ],
                    nested: vec![ $( $( stringify!($nested), )* )? ],
                }
            }

            fn id(&self) -> i64 {
                self.id
            }
        }

        impl $type {
            /// Create a new, not yet stored instance of this entity
            #[allow(dead_code, clippy::too_many_arguments)]
            pub fn new( $( $field: $field_type ),* ) -> Self {
                Self {
                    id: 0,
                    created_date: ::chrono::Utc::now(),
                    deleted_date: None,
                    $( $field, )*
                    $( $( $nested: <$nested_type as ::std::default::Default>::default(), )* )?
                }
            }
        }
    };
}

/// Create a nested value object that can be reached through dotted paths
///
/// # Example
///
/// ```rust,ignore
/// impl_reflect_value!(Address, {
///     street: Option<String>,
///     city: Option<String>,
/// });
/// ```
#[macro_export]
macro_rules! impl_reflect_value {
    (
        $type:ident,
        {
            $( $field:ident : $field_type:ty ),* $(,)?
        }
    ) => {
        #[derive(Debug, Clone, Default, PartialEq, ::serde::Serialize, ::serde::Deserialize)]
        pub struct $type {
            $(
                #[serde(default)]
                pub $field : $field_type,
            )*
        }

        impl $crate::core::entity::Reflect for $type {
            fn field(&self, name: &str) -> Option<$crate::core::field::FieldValue> {
                use $crate::core::field::FieldType;

                $(
                    if name == stringify!($field) {
                        return Some(self.$field.to_field_value());
                    }
                )*
                None
            }

            fn set_field(&mut self, name: &str, value: $crate::core::field::FieldValue) -> bool {
                $(
                    if name == stringify!($field) {
                        return $crate::core::field::assign_field(&mut self.$field, value);
                    }
                )*
                let _ = (name, value);
                false
            }
        }
    };
}
