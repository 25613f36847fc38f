//! Schema-guided traversal of value trees.
//!
//! A single callback sees every addressed value together with the field
//! that declares it, and decides per value whether to keep, rewrite or
//! omit it. Every other operation on value trees in this crate is built
//! on this walk.

use std::sync::Arc;

use crate::element::builtin;
use crate::element::error::Result;
use crate::element::id::{ElemId, PathSegment};
use crate::element::types::{Element, Field, InstanceElement, ObjectType, TypeMap, TypeRef};
use crate::element::value::{Value, Values};

/// Schema driving a values walk: either a concrete type whose fields
/// declare the keys, or a flat name-to-type table (used for annotations).
#[derive(Clone, Copy)]
pub enum TransformSchema<'a> {
    Type(&'a TypeRef),
    TypeMap(&'a TypeMap),
}

impl<'a> TransformSchema<'a> {
    fn field_for(&self, key: &str) -> Option<Field> {
        match self {
            TransformSchema::Type(type_ref) => {
                type_ref.as_object().and_then(|object| object.field(key)).cloned()
            }
            TransformSchema::TypeMap(types) => types
                .get(key)
                .map(|type_ref| Field::new(ElemId::new("", ""), key, Arc::clone(type_ref))),
        }
    }
}

/// Outcome of one callback invocation: `Ok(None)` omits the value.
pub type TransformResult = Result<Option<Value>>;

/// Per-value callback. Returning `Ok(None)` omits the value from the
/// result; returning `Ok(Some(v))` keeps `v` (and recurses into it when
/// the declared field type calls for it).
pub trait TransformFunc: FnMut(Value, Option<&Field>, Option<&ElemId>) -> TransformResult {}

impl<F> TransformFunc for F where
    F: FnMut(Value, Option<&Field>, Option<&ElemId>) -> TransformResult
{
}

/// Walks `values` under `schema`, applying `f` to every declared value.
///
/// Keys with no declared field are dropped silently when `strict`,
/// otherwise passed to `f` once with no field and never recursed into.
/// Returns `None` when nothing survives.
pub fn transform_values<F: TransformFunc>(
    values: &Values,
    schema: TransformSchema<'_>,
    mut f: F,
    strict: bool,
) -> Result<Option<Values>> {
    transform_values_with_path(values, schema, None, &mut f, strict)
}

/// Same as [`transform_values`], threading a base id so the callback sees
/// the address of every value it visits.
pub fn transform_values_with_path<F: TransformFunc>(
    values: &Values,
    schema: TransformSchema<'_>,
    path: Option<&ElemId>,
    f: &mut F,
    strict: bool,
) -> Result<Option<Values>> {
    let mut result = Values::new();
    for (key, value) in values {
        let child_path = path.map(|p| p.create_nested_id([key.as_str()]));
        let field = schema.field_for(key);
        let transformed = match field {
            Some(field) => transform_value(value, Some(&field), child_path.as_ref(), f, strict)?,
            None if strict => None,
            None => f(value.clone(), None, child_path.as_ref())?,
        };
        if let Some(new_value) = transformed {
            result.insert(key.clone(), new_value);
        }
    }
    if result.is_empty() {
        Ok(None)
    } else {
        Ok(Some(result))
    }
}

fn transform_value<F: TransformFunc>(
    value: &Value,
    field: Option<&Field>,
    path: Option<&ElemId>,
    f: &mut F,
    strict: bool,
) -> Result<Option<Value>> {
    let field = match field {
        Some(field) => field,
        None if strict => return Ok(None),
        None => return f(value.clone(), None, path),
    };

    // references, templates and static content are atomic leaves
    if matches!(
        value,
        Value::Reference(_) | Value::Template(_) | Value::StaticContent(_)
    ) {
        return f(value.clone(), Some(field), path);
    }

    if let Some(list) = field.field_type.as_list() {
        let mut item_field = Field::new(
            field.parent_id.clone(),
            field.name.clone(),
            Arc::clone(&list.inner),
        );
        item_field.annotations = field.annotations.clone();
        // the callback never sees the sequence container itself
        if let Value::List(items) = value {
            let mut result = Vec::with_capacity(items.len());
            for (index, item) in items.iter().enumerate() {
                let item_path = path.map(|p| p.create_nested_id([PathSegment::Index(index)]));
                if let Some(new_item) =
                    transform_value(item, Some(&item_field), item_path.as_ref(), f, strict)?
                {
                    result.push(new_item);
                }
            }
            if result.is_empty() {
                return Ok(None);
            }
            return Ok(Some(Value::List(result)));
        }
        // a bare value under a sequence type is treated as a single item
        return transform_value(value, Some(&item_field), path, f, strict);
    }

    let new_value = match f(value.clone(), Some(field), path)? {
        Some(new_value) => new_value,
        None => return Ok(None),
    };

    if field.field_type.as_object().is_some() {
        if let Value::Map(map) = &new_value {
            let schema = TransformSchema::Type(&field.field_type);
            return Ok(transform_values_with_path(map, schema, path, f, strict)?.map(Value::Map));
        }
    }
    Ok(Some(new_value))
}

/// Applies `f` to every value the element carries: instance values and
/// the annotations of types, fields and instances. The element's identity
/// and schema are preserved; only values change.
pub fn transform_element<F: TransformFunc>(
    element: &Element,
    mut f: F,
    strict: bool,
) -> Result<Element> {
    let _span =
        tracing::debug_span!("transform_element", id = %element.elem_id()).entered();
    match element {
        Element::Instance(instance) => {
            let elem_id = instance.elem_id();
            let value = transform_values_with_path(
                &instance.value,
                TransformSchema::Type(&instance.instance_type),
                Some(&elem_id),
                &mut f,
                strict,
            )?
            .unwrap_or_default();
            let annotation_types = builtin::instance_annotation_types();
            let annotations = transform_values(
                &instance.annotations,
                TransformSchema::TypeMap(&annotation_types),
                &mut f,
                strict,
            )?
            .unwrap_or_default();
            let mut result = InstanceElement::new(
                instance.name.clone(),
                Arc::clone(&instance.instance_type),
                value,
            );
            result.annotations = annotations;
            Ok(Element::Instance(result))
        }
        Element::Object(object) => {
            let attr_path = object.elem_id.create_nested_id(["attr"]);
            let annotations = transform_values_with_path(
                &object.annotations,
                TransformSchema::TypeMap(&object.annotation_types),
                Some(&attr_path),
                &mut f,
                strict,
            )?
            .unwrap_or_default();
            let mut result = ObjectType::new(object.elem_id.clone());
            result.annotations = annotations;
            result.annotation_types = object.annotation_types.clone();
            for (name, field) in &object.fields {
                let field_id = field.elem_id();
                let field_annotations = transform_values_with_path(
                    &field.annotations,
                    TransformSchema::TypeMap(field.field_type.annotation_types()),
                    Some(&field_id),
                    &mut f,
                    strict,
                )?
                .unwrap_or_default();
                let mut new_field = Field::new(
                    field.parent_id.clone(),
                    field.name.clone(),
                    Arc::clone(&field.field_type),
                );
                new_field.annotations = field_annotations;
                result.fields.insert(name.clone(), new_field);
            }
            Ok(Element::Object(result))
        }
        Element::Primitive(primitive) => {
            let annotations = transform_values(
                &primitive.annotations,
                TransformSchema::TypeMap(&primitive.annotation_types),
                &mut f,
                strict,
            )?
            .unwrap_or_default();
            let mut result = primitive.clone();
            result.annotations = annotations;
            Ok(Element::Primitive(result))
        }
        Element::Field(field) => {
            let field_id = field.elem_id();
            let annotations = transform_values_with_path(
                &field.annotations,
                TransformSchema::TypeMap(field.field_type.annotation_types()),
                Some(&field_id),
                &mut f,
                strict,
            )?
            .unwrap_or_default();
            let mut result = field.clone();
            result.annotations = annotations;
            Ok(Element::Field(result))
        }
        Element::List(_) => Ok(element.clone()),
    }
}
