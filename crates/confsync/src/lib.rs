//! Typed configuration tree model and transformation engine.
//!
//! The crate models an external service's configuration as elements:
//! types, fields and instances addressed by structural ids and carrying
//! untyped value trees. On top of the model it provides schema-guided
//! transformation, reference resolution and restoration, id-predicate
//! filtering, hidden-value handling and lookup utilities, plus the
//! [`Adapter`] trait a service connector implements.

pub mod adapter;
pub mod element;
pub mod filter;
pub mod hidden;
pub mod lookup;
pub mod reference;
pub mod transform;

pub use adapter::{ensure_same_identity, Adapter};
pub use element::{
    builtin, ElemId, Element, Field, IdType, InstanceElement, ListType, ModelError, ObjectType,
    PathSegment, PrimitiveKind, PrimitiveType, ReferenceExpression, Result, StaticContent,
    TemplateExpression, TemplatePart, TypeMap, TypeRef, Value, Values, DEPENDS_ON_ANNOTATION,
    HIDDEN_ANNOTATION,
};
pub use filter::{filter_by_id, IdPredicate};
pub use hidden::{add_hidden_values, remove_hidden_values};
pub use lookup::{
    find_element, find_elements, find_instances, find_object_type, flatten_element_str, nacl_case,
    resolve_path, values_deep_some, PathResult,
};
pub use reference::{resolve_references, restore_references, Resolver};
pub use transform::{
    transform_element, transform_values, transform_values_with_path, TransformFunc,
    TransformResult, TransformSchema,
};
