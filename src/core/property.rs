//! Dotted-path property writes on reflected object graphs

use crate::core::entity::Reflect;
use crate::core::field::FieldValue;

/// Write `value` into the property named by a dot-separated `path`.
///
/// Every segment but the last names a nested value object to descend into;
/// the last names the scalar field to overwrite. An unknown segment, or a
/// value that does not fit the final field, leaves `target` untouched.
pub fn set_nested_property(target: &mut dyn Reflect, path: &str, value: FieldValue) {
    let mut segments: Vec<&str> = path.split('.').collect();
    let Some(last) = segments.pop() else {
        return;
    };

    let mut current = target;
    for segment in segments {
        current = match current.nested_mut(segment) {
            Some(child) => child,
            None => return,
        };
    }

    current.set_field(last, value);
}
