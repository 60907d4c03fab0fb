//! Predicate algebra and the builders that derive predicates from descriptors
//!
//! Predicates are small expression trees evaluated in-process against any
//! [`Reflect`] instance. Field names inside a predicate are always the
//! canonical names taken from the entity descriptor, so evaluation never
//! needs to resolve case again.

use crate::core::entity::{Entity, Reflect};
use crate::core::error::ValidationError;
use crate::core::field::FieldValue;
use indexmap::IndexMap;

/// Prefix that turns an equality entry of a [`FilterSpec`] into an inequality
pub const NEGATION_MARKER: char = '!';

/// Field name (optionally prefixed with `!`) to comparison value.
///
/// Insertion order is kept so that error reporting follows the caller's order.
pub type FilterSpec = IndexMap<String, FieldValue>;

/// Comparison operator of a [`Predicate::Compare`] node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
}

/// A boolean test over one entity instance
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// `field == value` or `field != value`
    Compare {
        field: &'static str,
        op: CompareOp,
        value: FieldValue,
    },

    /// Case-sensitive substring test on a textual field
    Contains { field: &'static str, needle: String },

    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    Not(Box<Predicate>),
}

impl Predicate {
    /// Conjunction of `predicates`; `None` when there is nothing to test
    pub fn all(mut predicates: Vec<Predicate>) -> Option<Predicate> {
        match predicates.len() {
            0 => None,
            1 => predicates.pop(),
            _ => Some(Predicate::And(predicates)),
        }
    }

    /// Disjunction of `predicates`; `None` when there is nothing to test
    pub fn any(mut predicates: Vec<Predicate>) -> Option<Predicate> {
        match predicates.len() {
            0 => None,
            1 => predicates.pop(),
            _ => Some(Predicate::Or(predicates)),
        }
    }

    pub fn negate(self) -> Predicate {
        Predicate::Not(Box::new(self))
    }

    /// Evaluate against one instance
    ///
    /// A field the instance does not expose reads as `Null`. For substring
    /// tests a `Null` text reads as the empty string.
    pub fn evaluate(&self, target: &dyn Reflect) -> bool {
        match self {
            Predicate::Compare { field, op, value } => {
                let actual = target.field(field).unwrap_or(FieldValue::Null);
                match op {
                    CompareOp::Eq => actual == *value,
                    CompareOp::Ne => actual != *value,
                }
            }
            Predicate::Contains { field, needle } => match target.field(field) {
                Some(FieldValue::String(text)) => text.contains(needle.as_str()),
                Some(FieldValue::Null) | None => needle.is_empty(),
                Some(_) => false,
            },
            Predicate::And(parts) => parts.iter().all(|p| p.evaluate(target)),
            Predicate::Or(parts) => parts.iter().any(|p| p.evaluate(target)),
            Predicate::Not(inner) => !inner.evaluate(target),
        }
    }
}

/// Build an equality/inequality predicate over `T` from a filter spec.
///
/// Every entry becomes one comparison and all comparisons are combined with
/// AND. An empty spec yields `None` (no filtering).
pub fn build_filter<T: Entity>(spec: &FilterSpec) -> Result<Option<Predicate>, ValidationError> {
    let descriptor = T::describe();
    let mut comparisons = Vec::with_capacity(spec.len());

    for (key, value) in spec {
        let (op, name) = match key.strip_prefix(NEGATION_MARKER) {
            Some(stripped) => (CompareOp::Ne, stripped),
            None => (CompareOp::Eq, key.as_str()),
        };

        let field = descriptor
            .find(name)
            .ok_or_else(|| ValidationError::UnknownField {
                entity_type: T::type_name().to_string(),
                field: name.to_string(),
            })?;

        if !field.accepts(value) {
            return Err(ValidationError::TypeMismatch {
                entity_type: T::type_name().to_string(),
                field: field.name.to_string(),
                expected: field.kind,
                value: value.clone(),
            });
        }

        comparisons.push(Predicate::Compare {
            field: field.name,
            op,
            value: value.clone(),
        });
    }

    Ok(Predicate::all(comparisons))
}

/// Build a predicate that holds when any textual field of `T` contains
/// `search`.
///
/// Fails when `T` has no textual field at all.
pub fn build_text_filter<T: Entity>(search: &str) -> Result<Predicate, ValidationError> {
    let descriptor = T::describe();
    let conditions = descriptor
        .textual_fields()
        .map(|field| Predicate::Contains {
            field: field.name,
            needle: search.to_string(),
        })
        .collect();

    Predicate::any(conditions).ok_or_else(|| ValidationError::NoTextualFields {
        entity_type: T::type_name().to_string(),
    })
}
