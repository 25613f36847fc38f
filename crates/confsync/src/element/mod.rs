//! The configuration element model: structural ids, the untyped value
//! tree and the typed schema elements built on both.

pub mod builtin;
pub mod error;
pub mod id;
pub mod types;
pub mod value;

pub use builtin::{DEPENDS_ON_ANNOTATION, HIDDEN_ANNOTATION};
pub use error::{ModelError, Result};
pub use id::{ElemId, IdType, PathSegment};
pub use types::{
    Element, Field, InstanceElement, ListType, ObjectType, PrimitiveKind, PrimitiveType, TypeMap,
    TypeRef,
};
pub use value::{
    ReferenceExpression, StaticContent, TemplateExpression, TemplatePart, Value, Values,
};
