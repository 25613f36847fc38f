//! Lookups and small value utilities: resolving an id inside an element,
//! searching element collections, name normalization and string cleanup.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::element::id::ElemId;
use crate::element::types::{Element, Field, InstanceElement, ObjectType, TypeMap, TypeRef};
use crate::element::value::{TemplateExpression, TemplatePart, Value, Values};

/// What an id resolved to inside an element.
#[derive(Debug, Clone, PartialEq)]
pub enum PathResult<'a> {
    Element(&'a Element),
    Field(&'a Field),
    Value(&'a Value),
}

/// Resolves `id` inside `root`. Returns `None` when the id is not the
/// root's own id or a descendant of it, or when the addressed position
/// does not exist.
pub fn resolve_path<'a>(root: &'a Element, id: &ElemId) -> Option<PathResult<'a>> {
    let root_id = root.elem_id();
    if *id == root_id {
        return Some(PathResult::Element(root));
    }
    if !root_id.is_parent_of(id) {
        return None;
    }
    let root_parts = root_id.full_name_parts();
    let id_parts = id.full_name_parts();
    let rel: Vec<&str> = id_parts[root_parts.len()..]
        .iter()
        .map(String::as_str)
        .collect();
    walk_element(root, &rel)
}

fn walk_element<'a>(element: &'a Element, rel: &[&str]) -> Option<PathResult<'a>> {
    match element {
        Element::Instance(instance) => walk_values(&instance.value, rel),
        Element::Object(object) => match rel[0] {
            "attr" => walk_values(&object.annotations, &rel[1..]),
            "field" => {
                let field = object.field(*rel.get(1)?)?;
                walk_field(field, &rel[2..])
            }
            "annotation" => {
                let type_ref = object.annotation_types.get(*rel.get(1)?)?;
                if rel.len() == 2 {
                    Some(PathResult::Element(type_ref))
                } else {
                    walk_element(type_ref, &rel[2..])
                }
            }
            _ => walk_values(&object.annotations, rel),
        },
        Element::Primitive(primitive) => match rel[0] {
            "attr" => walk_values(&primitive.annotations, &rel[1..]),
            "annotation" => {
                let type_ref = primitive.annotation_types.get(*rel.get(1)?)?;
                if rel.len() == 2 {
                    Some(PathResult::Element(type_ref))
                } else {
                    walk_element(type_ref, &rel[2..])
                }
            }
            _ => walk_values(&primitive.annotations, rel),
        },
        Element::Field(field) => walk_field(field, rel),
        Element::List(_) => None,
    }
}

fn walk_field<'a>(field: &'a Field, rel: &[&str]) -> Option<PathResult<'a>> {
    if rel.is_empty() {
        Some(PathResult::Field(field))
    } else {
        walk_values(&field.annotations, rel)
    }
}

fn walk_values<'a>(values: &'a Values, rel: &[&str]) -> Option<PathResult<'a>> {
    let value = values.get(*rel.first()?)?;
    walk_value(value, &rel[1..])
}

fn walk_value<'a>(value: &'a Value, rel: &[&str]) -> Option<PathResult<'a>> {
    let step = match rel.first() {
        Some(step) => step,
        None => return Some(PathResult::Value(value)),
    };
    match value {
        Value::Map(map) => walk_value(map.get(*step)?, &rel[1..]),
        Value::List(items) => {
            let index: usize = step.parse().ok()?;
            walk_value(items.get(index)?, &rel[1..])
        }
        _ => None,
    }
}

/// All elements in `elements` whose id matches `id`.
pub fn find_elements<'a>(
    elements: &'a [Element],
    id: &'a ElemId,
) -> impl Iterator<Item = &'a Element> {
    elements
        .iter()
        .filter(move |element| element.elem_id() == *id)
}

/// The first element in `elements` whose id matches `id`.
pub fn find_element<'a>(elements: &'a [Element], id: &ElemId) -> Option<&'a Element> {
    elements.iter().find(|element| element.elem_id() == *id)
}

/// The first object type in `elements` with the given id.
pub fn find_object_type<'a>(elements: &'a [Element], id: &ElemId) -> Option<&'a ObjectType> {
    elements.iter().find_map(|element| {
        element
            .as_object()
            .filter(|object| object.elem_id == *id)
    })
}

/// All instances of the type identified by `type_id`.
pub fn find_instances<'a>(
    elements: &'a [Element],
    type_id: &'a ElemId,
) -> impl Iterator<Item = &'a InstanceElement> {
    elements.iter().filter_map(move |element| {
        element
            .as_instance()
            .filter(|instance| instance.instance_type.elem_id() == *type_id)
    })
}

static WHITESPACE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\s+").expect("whitespace pattern is valid")
});

/// Normalizes a service-provided name into a valid element name by
/// collapsing each whitespace run into a single underscore.
pub fn nacl_case(name: &str) -> String {
    WHITESPACE.replace_all(name, "_").into_owned()
}

/// Returns `element` with every template expression normalized: empty
/// literal parts dropped and adjacent literal parts coalesced. Applying
/// it twice gives the same result as applying it once.
pub fn flatten_element_str(element: &Element) -> Element {
    match element {
        Element::Instance(instance) => {
            let mut result = InstanceElement::new(
                instance.name.clone(),
                std::sync::Arc::clone(&instance.instance_type),
                flatten_values(&instance.value),
            );
            result.annotations = flatten_values(&instance.annotations);
            Element::Instance(result)
        }
        Element::Object(object) => {
            let mut result = ObjectType::new(object.elem_id.clone());
            result.annotations = flatten_values(&object.annotations);
            result.annotation_types = flatten_type_map(&object.annotation_types);
            for (name, field) in &object.fields {
                let mut new_field = Field::new(
                    field.parent_id.clone(),
                    field.name.clone(),
                    std::sync::Arc::clone(&field.field_type),
                );
                new_field.annotations = flatten_values(&field.annotations);
                result.fields.insert(name.clone(), new_field);
            }
            Element::Object(result)
        }
        Element::Primitive(primitive) => {
            let mut result = primitive.clone();
            result.annotations = flatten_values(&primitive.annotations);
            result.annotation_types = flatten_type_map(&primitive.annotation_types);
            Element::Primitive(result)
        }
        Element::Field(field) => {
            let mut result = field.clone();
            result.annotations = flatten_values(&field.annotations);
            Element::Field(result)
        }
        Element::List(_) => element.clone(),
    }
}

fn flatten_type_map(types: &TypeMap) -> TypeMap {
    types
        .iter()
        .map(|(key, type_ref)| {
            let flattened: TypeRef = std::sync::Arc::new(flatten_element_str(type_ref));
            (key.clone(), flattened)
        })
        .collect()
}

fn flatten_values(values: &Values) -> Values {
    values
        .iter()
        .map(|(key, value)| (key.clone(), flatten_value(value)))
        .collect()
}

fn flatten_value(value: &Value) -> Value {
    match value {
        Value::Template(template) => Value::Template(flatten_template(template)),
        Value::List(items) => Value::List(items.iter().map(flatten_value).collect()),
        Value::Map(map) => Value::Map(flatten_values(map)),
        Value::Reference(reference) => {
            let mut result = reference.clone();
            result.resolved = reference
                .resolved
                .as_deref()
                .map(|resolved| Box::new(flatten_value(resolved)));
            Value::Reference(result)
        }
        other => other.clone(),
    }
}

fn flatten_template(template: &TemplateExpression) -> TemplateExpression {
    let mut parts: Vec<TemplatePart> = Vec::with_capacity(template.parts.len());
    for part in &template.parts {
        match part {
            TemplatePart::Literal(literal) if literal.is_empty() => {}
            TemplatePart::Literal(literal) => match parts.last_mut() {
                Some(TemplatePart::Literal(previous)) => previous.push_str(literal),
                _ => parts.push(TemplatePart::Literal(literal.clone())),
            },
            TemplatePart::Reference(reference) => {
                parts.push(TemplatePart::Reference(reference.clone()));
            }
        }
    }
    TemplateExpression::new(parts)
}

/// Whether `predicate` holds for `value` itself or any value nested
/// inside it.
pub fn values_deep_some<P: Fn(&Value) -> bool>(value: &Value, predicate: &P) -> bool {
    if predicate(value) {
        return true;
    }
    match value {
        Value::List(items) => items.iter().any(|item| values_deep_some(item, predicate)),
        Value::Map(map) => map.values().any(|item| values_deep_some(item, predicate)),
        _ => false,
    }
}
