//! Field values, field kinds and entity descriptors

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A polymorphic field value that can hold different types
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FieldValue {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Uuid(Uuid),
    DateTime(DateTime<Utc>),
    Null,
}

impl FieldValue {
    /// Get the value as a string if possible
    pub fn as_string(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get the value as an integer if possible
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Get the value as a timestamp if possible
    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            FieldValue::DateTime(d) => Some(*d),
            _ => None,
        }
    }

    /// Check if the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// The kind of this value, `None` for `Null`
    pub fn kind(&self) -> Option<FieldKind> {
        match self {
            FieldValue::String(_) => Some(FieldKind::String),
            FieldValue::Integer(_) => Some(FieldKind::Integer),
            FieldValue::Float(_) => Some(FieldKind::Float),
            FieldValue::Boolean(_) => Some(FieldKind::Boolean),
            FieldValue::Uuid(_) => Some(FieldKind::Uuid),
            FieldValue::DateTime(_) => Some(FieldKind::DateTime),
            FieldValue::Null => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::String(s) => write!(f, "{}", s),
            FieldValue::Integer(i) => write!(f, "{}", i),
            FieldValue::Float(x) => write!(f, "{}", x),
            FieldValue::Boolean(b) => write!(f, "{}", b),
            FieldValue::Uuid(u) => write!(f, "{}", u),
            FieldValue::DateTime(d) => write!(f, "{}", d.to_rfc3339()),
            FieldValue::Null => write!(f, "null"),
        }
    }
}

/// Runtime type tag of a scalar entity field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    String,
    Integer,
    Float,
    Boolean,
    Uuid,
    DateTime,
}

impl FieldKind {
    /// Only string fields take part in substring search
    pub fn is_textual(self) -> bool {
        matches!(self, FieldKind::String)
    }

    /// Coerce a raw string into a value of this kind
    ///
    /// Returns `None` when the text cannot be read as this kind.
    pub fn parse(self, raw: &str) -> Option<FieldValue> {
        match self {
            FieldKind::String => Some(FieldValue::String(raw.to_string())),
            FieldKind::Integer => raw.trim().parse().ok().map(FieldValue::Integer),
            FieldKind::Float => raw.trim().parse().ok().map(FieldValue::Float),
            FieldKind::Boolean => match raw.trim().to_ascii_lowercase().as_str() {
                "true" => Some(FieldValue::Boolean(true)),
                "false" => Some(FieldValue::Boolean(false)),
                _ => None,
            },
            FieldKind::Uuid => Uuid::parse_str(raw.trim()).ok().map(FieldValue::Uuid),
            FieldKind::DateTime => DateTime::parse_from_rfc3339(raw.trim())
                .ok()
                .map(|d| FieldValue::DateTime(d.with_timezone(&Utc))),
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldKind::String => "string",
            FieldKind::Integer => "integer",
            FieldKind::Float => "float",
            FieldKind::Boolean => "boolean",
            FieldKind::Uuid => "uuid",
            FieldKind::DateTime => "datetime",
        };
        f.write_str(name)
    }
}

/// Conversion between a Rust field type and [`FieldValue`]
///
/// Implemented for every type that may appear as a scalar field inside
/// `impl_crud_entity!` / `impl_reflect_value!`.
pub trait FieldType: Sized {
    /// Kind reported in the entity descriptor
    const KIND: FieldKind;

    /// Whether the field accepts `Null`
    const NULLABLE: bool = false;

    fn to_field_value(&self) -> FieldValue;

    /// Returns `None` when `value` does not fit this type
    fn from_field_value(value: FieldValue) -> Option<Self>;
}

impl FieldType for String {
    const KIND: FieldKind = FieldKind::String;

    fn to_field_value(&self) -> FieldValue {
        FieldValue::String(self.clone())
    }

    fn from_field_value(value: FieldValue) -> Option<Self> {
        match value {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl FieldType for i64 {
    const KIND: FieldKind = FieldKind::Integer;

    fn to_field_value(&self) -> FieldValue {
        FieldValue::Integer(*self)
    }

    fn from_field_value(value: FieldValue) -> Option<Self> {
        value.as_integer()
    }
}

impl FieldType for i32 {
    const KIND: FieldKind = FieldKind::Integer;

    fn to_field_value(&self) -> FieldValue {
        FieldValue::Integer(i64::from(*self))
    }

    fn from_field_value(value: FieldValue) -> Option<Self> {
        value.as_integer().and_then(|i| i32::try_from(i).ok())
    }
}

impl FieldType for f64 {
    const KIND: FieldKind = FieldKind::Float;

    fn to_field_value(&self) -> FieldValue {
        FieldValue::Float(*self)
    }

    fn from_field_value(value: FieldValue) -> Option<Self> {
        match value {
            FieldValue::Float(x) => Some(x),
            _ => None,
        }
    }
}

impl FieldType for bool {
    const KIND: FieldKind = FieldKind::Boolean;

    fn to_field_value(&self) -> FieldValue {
        FieldValue::Boolean(*self)
    }

    fn from_field_value(value: FieldValue) -> Option<Self> {
        match value {
            FieldValue::Boolean(b) => Some(b),
            _ => None,
        }
    }
}

impl FieldType for Uuid {
    const KIND: FieldKind = FieldKind::Uuid;

    fn to_field_value(&self) -> FieldValue {
        FieldValue::Uuid(*self)
    }

    fn from_field_value(value: FieldValue) -> Option<Self> {
        match value {
            FieldValue::Uuid(u) => Some(u),
            _ => None,
        }
    }
}

impl FieldType for DateTime<Utc> {
    const KIND: FieldKind = FieldKind::DateTime;

    fn to_field_value(&self) -> FieldValue {
        FieldValue::DateTime(*self)
    }

    fn from_field_value(value: FieldValue) -> Option<Self> {
        value.as_datetime()
    }
}

impl<T: FieldType> FieldType for Option<T> {
    const KIND: FieldKind = T::KIND;
    const NULLABLE: bool = true;

    fn to_field_value(&self) -> FieldValue {
        match self {
            Some(inner) => inner.to_field_value(),
            None => FieldValue::Null,
        }
    }

    fn from_field_value(value: FieldValue) -> Option<Self> {
        match value {
            FieldValue::Null => Some(None),
            other => T::from_field_value(other).map(Some),
        }
    }
}

/// Overwrite `slot` with `value` when it fits; used by generated `Reflect` impls
pub fn assign_field<F: FieldType>(slot: &mut F, value: FieldValue) -> bool {
    match F::from_field_value(value) {
        Some(converted) => {
            *slot = converted;
            true
        }
        None => false,
    }
}

/// A named, typed scalar field of an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub kind: FieldKind,
    pub nullable: bool,
}

impl FieldDescriptor {
    pub fn of<F: FieldType>(name: &'static str) -> Self {
        Self {
            name,
            kind: F::KIND,
            nullable: F::NULLABLE,
        }
    }

    /// Whether `value` may be stored in or compared against this field
    pub fn accepts(&self, value: &FieldValue) -> bool {
        match value.kind() {
            Some(kind) => kind == self.kind,
            None => self.nullable,
        }
    }
}

/// The introspected shape of an entity type
///
/// Built fresh by `Entity::describe()` on every call.
#[derive(Debug, Clone, Serialize)]
pub struct EntityDescriptor {
    pub type_name: &'static str,
    pub fields: Vec<FieldDescriptor>,
    /// Names of nested value objects reachable through `Reflect::nested_mut`
    pub nested: Vec<&'static str>,
}

impl EntityDescriptor {
    /// Find a scalar field, ignoring ASCII case
    pub fn find(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(name))
    }

    /// Scalar fields holding text
    pub fn textual_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|f| f.kind.is_textual())
    }

    /// First name that collides case-insensitively with an earlier one
    pub fn duplicate_name(&self) -> Option<&'static str> {
        let names: Vec<&'static str> = self
            .fields
            .iter()
            .map(|f| f.name)
            .chain(self.nested.iter().copied())
            .collect();

        names.iter().enumerate().find_map(|(i, name)| {
            names[..i]
                .iter()
                .any(|earlier| earlier.eq_ignore_ascii_case(name))
                .then_some(*name)
        })
    }
}
