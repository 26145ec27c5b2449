//! Additive merging of fragments into a type registry.
//!
//! Object types absent from the target are inserted unchanged. Object types
//! already present get the incoming fields appended after their own; field
//! names are not checked for collisions, so a field may appear twice. Type
//! extensions (`extend type`) follow the same rule as plain definitions.

use super::fragment::{EnumTypeDef, ObjectTypeDef, TypeRegistry};

/// Merges every definition of `from` into `into`.
///
/// Scalars are unioned, enum values are appended like fields, and directive
/// declarations keep the first one seen.
pub fn merge(from: TypeRegistry, into: &mut TypeRegistry) {
    let TypeRegistry {
        objects,
        scalars,
        enums,
        directives,
    } = from;

    for object in objects.into_values() {
        merge_object(into, object);
    }
    into.scalars.extend(scalars);
    for enum_type in enums.into_values() {
        merge_enum(into, enum_type);
    }
    for (name, directive) in directives {
        into.directives.entry(name).or_insert(directive);
    }
}

pub(crate) fn merge_object(into: &mut TypeRegistry, object: ObjectTypeDef) {
    match into.objects.get_mut(&object.name) {
        Some(existing) => existing.fields.extend(object.fields),
        None => {
            into.objects.insert(object.name.clone(), object);
        }
    }
}

pub(crate) fn merge_enum(into: &mut TypeRegistry, enum_type: EnumTypeDef) {
    match into.enums.get_mut(&enum_type.name) {
        Some(existing) => existing.values.extend(enum_type.values),
        None => {
            into.enums.insert(enum_type.name.clone(), enum_type);
        }
    }
}
