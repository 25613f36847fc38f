//! Typed schema elements: primitive types, object types, list types,
//! fields and instances.

use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::element::builtin::HIDDEN_ANNOTATION;
use crate::element::id::ElemId;
use crate::element::value::{Value, Values};

/// Shared handle to a type definition. Types are immutable once built, so
/// fields and instances point at them through cheap clones.
pub type TypeRef = Arc<Element>;

/// Named collection of type handles, keyed by annotation or type name.
pub type TypeMap = IndexMap<String, TypeRef>;

/// Kind of scalar a primitive type accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveKind {
    String,
    Number,
    Boolean,
}

/// A scalar type definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrimitiveType {
    pub elem_id: ElemId,
    pub primitive: PrimitiveKind,
    #[serde(default)]
    pub annotations: Values,
    #[serde(skip)]
    pub annotation_types: TypeMap,
}

impl PrimitiveType {
    pub fn new(elem_id: ElemId, primitive: PrimitiveKind) -> Self {
        Self {
            elem_id,
            primitive,
            annotations: Values::new(),
            annotation_types: TypeMap::new(),
        }
    }
}

/// A structured type definition with named, typed fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectType {
    pub elem_id: ElemId,
    #[serde(default)]
    pub fields: IndexMap<String, Field>,
    #[serde(default)]
    pub annotations: Values,
    #[serde(skip)]
    pub annotation_types: TypeMap,
}

impl ObjectType {
    pub fn new(elem_id: ElemId) -> Self {
        Self {
            elem_id,
            fields: IndexMap::new(),
            annotations: Values::new(),
            annotation_types: TypeMap::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, field_type: TypeRef) -> Self {
        let name = name.into();
        let field = Field::new(self.elem_id.clone(), name.clone(), field_type);
        self.fields.insert(name, field);
        self
    }

    pub fn with_field_annotations(
        mut self,
        name: impl Into<String>,
        field_type: TypeRef,
        annotations: Values,
    ) -> Self {
        let name = name.into();
        let mut field = Field::new(self.elem_id.clone(), name.clone(), field_type);
        field.annotations = annotations;
        self.fields.insert(name, field);
        self
    }

    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }

    pub fn with_annotation_type(mut self, key: impl Into<String>, type_ref: TypeRef) -> Self {
        self.annotation_types.insert(key.into(), type_ref);
        self
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    pub fn into_type_ref(self) -> TypeRef {
        Arc::new(Element::Object(self))
    }
}

/// A homogeneous sequence type wrapping an inner element type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListType {
    pub elem_id: ElemId,
    pub inner: TypeRef,
}

impl ListType {
    pub fn new(inner: TypeRef) -> Self {
        let elem_id = ElemId::new("", format!("list<{}>", inner.elem_id().full_name()));
        Self { elem_id, inner }
    }

    pub fn into_type_ref(self) -> TypeRef {
        Arc::new(Element::List(self))
    }
}

/// A named, typed slot of an object type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub parent_id: ElemId,
    pub name: String,
    pub field_type: TypeRef,
    #[serde(default)]
    pub annotations: Values,
}

impl Field {
    pub fn new(parent_id: ElemId, name: impl Into<String>, field_type: TypeRef) -> Self {
        Self {
            parent_id,
            name: name.into(),
            field_type,
            annotations: Values::new(),
        }
    }

    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }

    pub fn elem_id(&self) -> ElemId {
        self.parent_id.create_nested_id(["field", self.name.as_str()])
    }

    pub fn is_hidden(&self) -> bool {
        self.annotations.get(HIDDEN_ANNOTATION) == Some(&Value::Bool(true))
    }
}

/// A named configuration entity conforming to a type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceElement {
    pub name: String,
    pub instance_type: TypeRef,
    #[serde(default)]
    pub value: Values,
    #[serde(default)]
    pub annotations: Values,
}

impl InstanceElement {
    pub fn new(name: impl Into<String>, instance_type: TypeRef, value: Values) -> Self {
        Self {
            name: name.into(),
            instance_type,
            value,
            annotations: Values::new(),
        }
    }

    pub fn elem_id(&self) -> ElemId {
        let type_id = self.instance_type.elem_id();
        ElemId::instance(type_id.adapter(), type_id.type_name(), self.name.as_str())
    }
}

/// Any element of the configuration model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Element {
    Primitive(PrimitiveType),
    Object(ObjectType),
    List(ListType),
    Field(Field),
    Instance(InstanceElement),
}

impl Element {
    pub fn elem_id(&self) -> ElemId {
        match self {
            Element::Primitive(t) => t.elem_id.clone(),
            Element::Object(t) => t.elem_id.clone(),
            Element::List(t) => t.elem_id.clone(),
            Element::Field(f) => f.elem_id(),
            Element::Instance(i) => i.elem_id(),
        }
    }

    pub fn annotations(&self) -> &Values {
        static EMPTY: once_cell::sync::Lazy<Values> = once_cell::sync::Lazy::new(Values::new);
        match self {
            Element::Primitive(t) => &t.annotations,
            Element::Object(t) => &t.annotations,
            Element::Field(f) => &f.annotations,
            Element::Instance(i) => &i.annotations,
            Element::List(_) => &EMPTY,
        }
    }

    pub fn annotation_types(&self) -> &TypeMap {
        static EMPTY: once_cell::sync::Lazy<TypeMap> = once_cell::sync::Lazy::new(TypeMap::new);
        match self {
            Element::Primitive(t) => &t.annotation_types,
            Element::Object(t) => &t.annotation_types,
            Element::Field(_) | Element::Instance(_) | Element::List(_) => &EMPTY,
        }
    }

    pub fn is_type(&self) -> bool {
        matches!(
            self,
            Element::Primitive(_) | Element::Object(_) | Element::List(_)
        )
    }

    pub fn as_object(&self) -> Option<&ObjectType> {
        match self {
            Element::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_primitive(&self) -> Option<&PrimitiveType> {
        match self {
            Element::Primitive(primitive) => Some(primitive),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&ListType> {
        match self {
            Element::List(list) => Some(list),
            _ => None,
        }
    }

    pub fn as_instance(&self) -> Option<&InstanceElement> {
        match self {
            Element::Instance(instance) => Some(instance),
            _ => None,
        }
    }

    pub fn as_field(&self) -> Option<&Field> {
        match self {
            Element::Field(field) => Some(field),
            _ => None,
        }
    }
}
