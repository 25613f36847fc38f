//! Built-in primitive types and well-known annotation names.

use std::sync::Arc;

use once_cell::sync::Lazy;

use crate::element::id::ElemId;
use crate::element::types::{Element, PrimitiveKind, PrimitiveType, TypeMap, TypeRef};

/// Field annotation marking a value as hidden from the workspace view.
pub const HIDDEN_ANNOTATION: &str = "_hidden";

/// Instance annotation listing the ids an instance depends on.
pub const DEPENDS_ON_ANNOTATION: &str = "_depends_on";

static STRING: Lazy<TypeRef> = Lazy::new(|| {
    Arc::new(Element::Primitive(PrimitiveType::new(
        ElemId::new("", "string"),
        PrimitiveKind::String,
    )))
});

static NUMBER: Lazy<TypeRef> = Lazy::new(|| {
    Arc::new(Element::Primitive(PrimitiveType::new(
        ElemId::new("", "number"),
        PrimitiveKind::Number,
    )))
});

static BOOLEAN: Lazy<TypeRef> = Lazy::new(|| {
    Arc::new(Element::Primitive(PrimitiveType::new(
        ElemId::new("", "boolean"),
        PrimitiveKind::Boolean,
    )))
});

pub fn string() -> TypeRef {
    Arc::clone(&STRING)
}

pub fn number() -> TypeRef {
    Arc::clone(&NUMBER)
}

pub fn boolean() -> TypeRef {
    Arc::clone(&BOOLEAN)
}

/// Annotation schema shared by every instance element.
pub fn instance_annotation_types() -> TypeMap {
    let mut types = TypeMap::new();
    types.insert(DEPENDS_ON_ANNOTATION.to_string(), string());
    types
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_ids() {
        assert_eq!(string().elem_id().full_name(), "string");
        assert_eq!(number().elem_id().full_name(), "number");
        assert_eq!(boolean().elem_id().full_name(), "boolean");
    }

    #[test]
    fn test_builtins_are_shared() {
        assert!(Arc::ptr_eq(&string(), &string()));
    }

    #[test]
    fn test_instance_annotation_types() {
        let types = instance_annotation_types();
        assert!(types.contains_key(DEPENDS_ON_ANNOTATION));
    }
}
