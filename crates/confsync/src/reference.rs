//! Resolving reference and template expressions into literal values, and
//! restoring them after an external system handed the literal form back.

use std::sync::Arc;

use crate::element::error::Result;
use crate::element::id::ElemId;
use crate::element::types::{Element, Field, InstanceElement, ObjectType};
use crate::element::value::{TemplateExpression, TemplatePart, Value, Values};
use crate::element::ModelError;

/// Produces the literal value a reference target stands for.
pub trait Resolver: Fn(&ElemId) -> Result<Value> {}

impl<R> Resolver for R where R: Fn(&ElemId) -> Result<Value> {}

/// Returns a copy of `element` with every reference and template expression
/// replaced by its literal value. The input is never modified.
pub fn resolve_references<R: Resolver>(element: &Element, resolver: R) -> Result<Element> {
    let _span =
        tracing::debug_span!("resolve_references", id = %element.elem_id()).entered();
    match element {
        Element::Instance(instance) => {
            let mut result = InstanceElement::new(
                instance.name.clone(),
                Arc::clone(&instance.instance_type),
                resolve_values(&instance.value, &resolver)?,
            );
            result.annotations = resolve_values(&instance.annotations, &resolver)?;
            Ok(Element::Instance(result))
        }
        Element::Object(object) => {
            let mut result = ObjectType::new(object.elem_id.clone());
            result.annotations = resolve_values(&object.annotations, &resolver)?;
            result.annotation_types = object.annotation_types.clone();
            for (name, field) in &object.fields {
                let mut new_field = Field::new(
                    field.parent_id.clone(),
                    field.name.clone(),
                    Arc::clone(&field.field_type),
                );
                new_field.annotations = resolve_values(&field.annotations, &resolver)?;
                result.fields.insert(name.clone(), new_field);
            }
            Ok(Element::Object(result))
        }
        Element::Primitive(primitive) => {
            let mut result = primitive.clone();
            result.annotations = resolve_values(&primitive.annotations, &resolver)?;
            Ok(Element::Primitive(result))
        }
        Element::Field(field) => {
            let mut result = field.clone();
            result.annotations = resolve_values(&field.annotations, &resolver)?;
            Ok(Element::Field(result))
        }
        Element::List(_) => Ok(element.clone()),
    }
}

fn resolve_values<R: Resolver>(values: &Values, resolver: &R) -> Result<Values> {
    values
        .iter()
        .map(|(key, value)| Ok((key.clone(), resolve_value(value, resolver)?)))
        .collect()
}

fn resolve_value<R: Resolver>(value: &Value, resolver: &R) -> Result<Value> {
    match value {
        Value::Reference(reference) => resolver(&reference.target),
        Value::Template(template) => {
            Ok(Value::String(evaluate_template(template, resolver)?))
        }
        Value::List(items) => items
            .iter()
            .map(|item| resolve_value(item, resolver))
            .collect::<Result<Vec<_>>>()
            .map(Value::List),
        Value::Map(map) => resolve_values(map, resolver).map(Value::Map),
        other => Ok(other.clone()),
    }
}

fn evaluate_template<R: Resolver>(template: &TemplateExpression, resolver: &R) -> Result<String> {
    let mut rendered = String::new();
    for part in &template.parts {
        match part {
            TemplatePart::Literal(literal) => rendered.push_str(literal),
            TemplatePart::Reference(reference) => {
                let resolved = resolver(&reference.target)?;
                let scalar = scalar_to_template_string(&resolved).ok_or_else(|| {
                    ModelError::NonScalarTemplatePart {
                        target: reference.target.clone(),
                    }
                })?;
                rendered.push_str(&scalar);
            }
        }
    }
    Ok(rendered)
}

fn scalar_to_template_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(render_number(*n)),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn render_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < (i64::MAX as f64) {
        (n as i64).to_string()
    } else {
        n.to_string()
    }
}

/// Puts reference and template expressions from `original` back into
/// `resolved`, position by position. A position is restored only when the
/// resolved value still equals what the expression evaluates to; edited
/// positions keep the edited literal. Values added in `resolved` with no
/// counterpart in `original` are kept as is.
pub fn restore_references<R: Resolver>(
    original: &Element,
    resolved: &Element,
    resolver: R,
) -> Result<Element> {
    let _span =
        tracing::debug_span!("restore_references", id = %original.elem_id()).entered();
    match (original, resolved) {
        (Element::Instance(orig), Element::Instance(res)) => {
            let mut result = InstanceElement::new(
                res.name.clone(),
                Arc::clone(&res.instance_type),
                restore_values(&orig.value, &res.value, &resolver)?,
            );
            result.annotations = restore_values(&orig.annotations, &res.annotations, &resolver)?;
            Ok(Element::Instance(result))
        }
        (Element::Object(orig), Element::Object(res)) => {
            let mut result = ObjectType::new(res.elem_id.clone());
            result.annotations = restore_values(&orig.annotations, &res.annotations, &resolver)?;
            result.annotation_types = res.annotation_types.clone();
            for (name, field) in &res.fields {
                let orig_annotations = orig
                    .field(name)
                    .map(|f| &f.annotations)
                    .cloned()
                    .unwrap_or_default();
                let mut new_field = Field::new(
                    field.parent_id.clone(),
                    field.name.clone(),
                    Arc::clone(&field.field_type),
                );
                new_field.annotations =
                    restore_values(&orig_annotations, &field.annotations, &resolver)?;
                result.fields.insert(name.clone(), new_field);
            }
            Ok(Element::Object(result))
        }
        (Element::Primitive(orig), Element::Primitive(res)) => {
            let mut result = res.clone();
            result.annotations = restore_values(&orig.annotations, &res.annotations, &resolver)?;
            Ok(Element::Primitive(result))
        }
        (Element::Field(orig), Element::Field(res)) => {
            let mut result = res.clone();
            result.annotations = restore_values(&orig.annotations, &res.annotations, &resolver)?;
            Ok(Element::Field(result))
        }
        _ => Ok(resolved.clone()),
    }
}

fn restore_values<R: Resolver>(
    original: &Values,
    resolved: &Values,
    resolver: &R,
) -> Result<Values> {
    resolved
        .iter()
        .map(|(key, value)| {
            Ok((key.clone(), restore_value(original.get(key), value, resolver)?))
        })
        .collect()
}

fn restore_value<R: Resolver>(
    original: Option<&Value>,
    resolved: &Value,
    resolver: &R,
) -> Result<Value> {
    match original {
        Some(Value::Reference(reference)) => {
            if resolver(&reference.target)? == *resolved {
                Ok(Value::Reference(reference.clone()))
            } else {
                Ok(resolved.clone())
            }
        }
        Some(Value::Template(template)) => {
            let rendered = evaluate_template(template, resolver)?;
            if resolved.as_str() == Some(rendered.as_str()) {
                Ok(Value::Template(template.clone()))
            } else {
                Ok(resolved.clone())
            }
        }
        Some(Value::Map(orig_map)) => match resolved {
            Value::Map(res_map) => res_map
                .iter()
                .map(|(key, value)| {
                    Ok((key.clone(), restore_value(orig_map.get(key), value, resolver)?))
                })
                .collect::<Result<Values>>()
                .map(Value::Map),
            _ => Ok(resolved.clone()),
        },
        Some(Value::List(orig_items)) => match resolved {
            Value::List(res_items) => res_items
                .iter()
                .enumerate()
                .map(|(index, item)| restore_value(orig_items.get(index), item, resolver))
                .collect::<Result<Vec<_>>>()
                .map(Value::List),
            _ => Ok(resolved.clone()),
        },
        _ => Ok(resolved.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::builtin;
    use crate::element::value::ReferenceExpression;
    use indexmap::indexmap;

    fn target_id() -> ElemId {
        ElemId::instance("test", "settings", "global").create_nested_id(["region"])
    }

    fn resolver(id: &ElemId) -> Result<Value> {
        if *id == target_id() {
            Ok(Value::from("eu-west-1"))
        } else {
            Err(ModelError::UnresolvedReference { target: id.clone() })
        }
    }

    fn instance_with(value: Values) -> Element {
        let object = ObjectType::new(ElemId::new("test", "service"))
            .with_field("region", builtin::string())
            .with_field("name", builtin::string())
            .into_type_ref();
        Element::Instance(InstanceElement::new("svc", object, value))
    }

    #[test]
    fn test_resolve_replaces_reference() {
        let element = instance_with(indexmap! {
            "region".to_string() => Value::Reference(ReferenceExpression::new(target_id())),
            "name".to_string() => Value::from("svc"),
        });
        let resolved = resolve_references(&element, resolver).unwrap();
        let instance = resolved.as_instance().unwrap();
        assert_eq!(instance.value.get("region"), Some(&Value::from("eu-west-1")));
        assert_eq!(instance.value.get("name"), Some(&Value::from("svc")));
    }

    #[test]
    fn test_resolve_does_not_mutate_input() {
        let element = instance_with(indexmap! {
            "region".to_string() => Value::Reference(ReferenceExpression::new(target_id())),
        });
        let before = element.clone();
        resolve_references(&element, resolver).unwrap();
        assert_eq!(element, before);
    }

    #[test]
    fn test_resolve_reaches_nested_values() {
        let element = instance_with(indexmap! {
            "name".to_string() => Value::List(vec![
                Value::Map(indexmap! {
                    "where".to_string() =>
                        Value::Reference(ReferenceExpression::new(target_id())),
                }),
            ]),
        });
        let resolved = resolve_references(&element, resolver).unwrap();
        let instance = resolved.as_instance().unwrap();
        let nested = instance.value.get("name").and_then(Value::as_list).unwrap();
        assert_eq!(
            nested[0].as_map().unwrap().get("where"),
            Some(&Value::from("eu-west-1"))
        );
    }

    #[test]
    fn test_resolve_template() {
        let template = TemplateExpression::new(vec![
            TemplatePart::Literal("https://".to_string()),
            TemplatePart::Reference(ReferenceExpression::new(target_id())),
            TemplatePart::Literal(".example.com".to_string()),
        ]);
        let element = instance_with(indexmap! {
            "name".to_string() => Value::Template(template),
        });
        let resolved = resolve_references(&element, resolver).unwrap();
        assert_eq!(
            resolved.as_instance().unwrap().value.get("name"),
            Some(&Value::from("https://eu-west-1.example.com"))
        );
    }

    #[test]
    fn test_unresolvable_reference_is_error() {
        let element = instance_with(indexmap! {
            "region".to_string() =>
                Value::Reference(ReferenceExpression::new(ElemId::new("test", "missing"))),
        });
        assert!(resolve_references(&element, resolver).is_err());
    }

    #[test]
    fn test_restore_round_trip() {
        let template = TemplateExpression::new(vec![
            TemplatePart::Literal("in ".to_string()),
            TemplatePart::Reference(ReferenceExpression::new(target_id())),
        ]);
        let element = instance_with(indexmap! {
            "region".to_string() => Value::Reference(ReferenceExpression::new(target_id())),
            "name".to_string() => Value::Template(template),
        });
        let resolved = resolve_references(&element, resolver).unwrap();
        let restored = restore_references(&element, &resolved, resolver).unwrap();
        assert_eq!(restored, element);
    }

    #[test]
    fn test_restore_keeps_edited_value() {
        let element = instance_with(indexmap! {
            "region".to_string() => Value::Reference(ReferenceExpression::new(target_id())),
        });
        let mut resolved = resolve_references(&element, resolver).unwrap();
        if let Element::Instance(instance) = &mut resolved {
            instance
                .value
                .insert("region".to_string(), Value::from("us-east-1"));
        }
        let restored = restore_references(&element, &resolved, resolver).unwrap();
        assert_eq!(
            restored.as_instance().unwrap().value.get("region"),
            Some(&Value::from("us-east-1"))
        );
    }

    #[test]
    fn test_restore_keeps_added_values() {
        let element = instance_with(indexmap! {
            "region".to_string() => Value::Reference(ReferenceExpression::new(target_id())),
        });
        let mut resolved = resolve_references(&element, resolver).unwrap();
        if let Element::Instance(instance) = &mut resolved {
            instance.value.insert("name".to_string(), Value::from("new"));
        }
        let restored = restore_references(&element, &resolved, resolver).unwrap();
        let instance = restored.as_instance().unwrap();
        assert_eq!(instance.value.get("name"), Some(&Value::from("new")));
        assert!(matches!(
            instance.value.get("region"),
            Some(Value::Reference(_))
        ));
    }

    #[test]
    fn test_template_with_non_scalar_target_is_error() {
        let nested_resolver = |_: &ElemId| Ok(Value::Map(Values::new()));
        let template = TemplateExpression::new(vec![TemplatePart::Reference(
            ReferenceExpression::new(target_id()),
        )]);
        let element = instance_with(indexmap! {
            "name".to_string() => Value::Template(template),
        });
        assert!(matches!(
            resolve_references(&element, nested_resolver),
            Err(ModelError::NonScalarTemplatePart { .. })
        ));
    }

    #[test]
    fn test_resolve_object_annotations() {
        let object = ObjectType::new(ElemId::new("test", "service"))
            .with_annotation(
                "owner",
                Value::Reference(ReferenceExpression::new(target_id())),
            )
            .with_field_annotations(
                "region",
                builtin::string(),
                indexmap! {
                    "default".to_string() =>
                        Value::Reference(ReferenceExpression::new(target_id())),
                },
            );
        let element = Element::Object(object);
        let resolved = resolve_references(&element, resolver).unwrap();
        let object = resolved.as_object().unwrap();
        assert_eq!(object.annotations.get("owner"), Some(&Value::from("eu-west-1")));
        assert_eq!(
            object.field("region").unwrap().annotations.get("default"),
            Some(&Value::from("eu-west-1"))
        );
        let restored = restore_references(&element, &resolved, resolver).unwrap();
        assert_eq!(restored, element);
    }

    #[test]
    fn test_render_number() {
        assert_eq!(render_number(3.0), "3");
        assert_eq!(render_number(3.5), "3.5");
        assert_eq!(render_number(-2.0), "-2");
    }
}
