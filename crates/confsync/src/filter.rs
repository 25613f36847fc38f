//! Projecting elements through an id predicate.
//!
//! Every addressable position of an element is offered to an async
//! predicate; positions it rejects are removed, together with everything
//! underneath them. Callers bring their own error type, so a failing
//! permission lookup or IO call aborts the walk unchanged.

use std::future::Future;

use futures_util::future::{try_join_all, BoxFuture, FutureExt};

use crate::element::id::{ElemId, PathSegment};
use crate::element::types::{Element, Field, InstanceElement, ObjectType, TypeMap};
use crate::element::value::{Value, Values};

/// Async predicate over addresses. `Ok(true)` keeps the position.
pub trait IdPredicate<E>: Send + Sync {
    fn check(&self, id: ElemId) -> BoxFuture<'_, Result<bool, E>>;
}

impl<F, Fut, E> IdPredicate<E> for F
where
    F: Fn(ElemId) -> Fut + Send + Sync,
    Fut: Future<Output = Result<bool, E>> + Send + 'static,
{
    fn check(&self, id: ElemId) -> BoxFuture<'_, Result<bool, E>> {
        self(id).boxed()
    }
}

/// Returns the part of `element` whose addresses pass `predicate`, or
/// `None` when the element's own id is rejected. Each address is checked
/// exactly once. Tables that belong to the element itself (fields,
/// annotations, annotation types) may be left empty; containers nested
/// inside values are dropped once they lose all entries.
pub async fn filter_by_id<P, E>(
    id: &ElemId,
    element: &Element,
    predicate: &P,
) -> Result<Option<Element>, E>
where
    P: IdPredicate<E>,
    E: Send,
{
    if !predicate.check(id.clone()).await? {
        return Ok(None);
    }
    match element {
        Element::Object(object) => {
            let mut result = ObjectType::new(object.elem_id.clone());
            result.annotations =
                filter_table(&object.annotations, id, Some("attr"), predicate).await?;
            result.annotation_types =
                filter_type_map(&object.annotation_types, id, predicate).await?;
            let field_entries = try_join_all(object.fields.iter().map(|(name, field)| {
                let field_id = id.create_nested_id(["field", name.as_str()]);
                async move {
                    if !predicate.check(field_id.clone()).await? {
                        return Ok(None);
                    }
                    let mut new_field = Field::new(
                        field.parent_id.clone(),
                        field.name.clone(),
                        std::sync::Arc::clone(&field.field_type),
                    );
                    new_field.annotations =
                        filter_table(&field.annotations, &field_id, None, predicate).await?;
                    Ok(Some((name.clone(), new_field)))
                }
            }))
            .await?;
            result.fields = field_entries.into_iter().flatten().collect();
            Ok(Some(Element::Object(result)))
        }
        Element::Primitive(primitive) => {
            let mut result = primitive.clone();
            result.annotations =
                filter_table(&primitive.annotations, id, Some("attr"), predicate).await?;
            result.annotation_types =
                filter_type_map(&primitive.annotation_types, id, predicate).await?;
            Ok(Some(Element::Primitive(result)))
        }
        Element::Instance(instance) => {
            let mut result = InstanceElement::new(
                instance.name.clone(),
                std::sync::Arc::clone(&instance.instance_type),
                filter_table(&instance.value, id, None, predicate).await?,
            );
            result.annotations =
                filter_table(&instance.annotations, id, Some("attr"), predicate).await?;
            Ok(Some(Element::Instance(result)))
        }
        Element::Field(field) => {
            let mut result = field.clone();
            result.annotations = filter_table(&field.annotations, id, None, predicate).await?;
            Ok(Some(Element::Field(result)))
        }
        Element::List(_) => Ok(Some(element.clone())),
    }
}

/// Filters a name-keyed value table belonging to the element itself.
/// The table survives even when every entry is removed.
async fn filter_table<P, E>(
    values: &Values,
    base: &ElemId,
    marker: Option<&str>,
    predicate: &P,
) -> Result<Values, E>
where
    P: IdPredicate<E>,
    E: Send,
{
    let entries = try_join_all(values.iter().map(|(key, value)| {
        let entry_id = match marker {
            Some(marker) => base.create_nested_id([marker, key.as_str()]),
            None => base.create_nested_id([key.as_str()]),
        };
        async move {
            Ok(filter_value(value, entry_id, predicate)
                .await?
                .map(|kept| (key.clone(), kept)))
        }
    }))
    .await?;
    Ok(entries.into_iter().flatten().collect())
}

async fn filter_type_map<P, E>(
    types: &TypeMap,
    base: &ElemId,
    predicate: &P,
) -> Result<TypeMap, E>
where
    P: IdPredicate<E>,
    E: Send,
{
    let entries = try_join_all(types.iter().map(|(key, type_ref)| {
        let entry_id = base.create_nested_id(["annotation", key.as_str()]);
        async move {
            if predicate.check(entry_id).await? {
                Ok(Some((key.clone(), std::sync::Arc::clone(type_ref))))
            } else {
                Ok(None)
            }
        }
    }))
    .await?;
    Ok(entries.into_iter().flatten().collect())
}

/// Filters a single value position. Containers nested inside values are
/// dropped entirely once they have no surviving entries.
fn filter_value<'a, P, E>(
    value: &'a Value,
    id: ElemId,
    predicate: &'a P,
) -> BoxFuture<'a, Result<Option<Value>, E>>
where
    P: IdPredicate<E>,
    E: Send + 'a,
{
    async move {
        if !predicate.check(id.clone()).await? {
            return Ok(None);
        }
        match value {
            Value::Map(map) => {
                let entries = try_join_all(map.iter().map(|(key, child)| {
                    let child_id = id.create_nested_id([key.as_str()]);
                    async move {
                        Ok(filter_value(child, child_id, predicate)
                            .await?
                            .map(|kept| (key.clone(), kept)))
                    }
                }))
                .await?;
                let kept: Values = entries.into_iter().flatten().collect();
                if kept.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(Value::Map(kept)))
                }
            }
            Value::List(items) => {
                let entries = try_join_all(items.iter().enumerate().map(|(index, child)| {
                    let child_id = id.create_nested_id([PathSegment::Index(index)]);
                    filter_value(child, child_id, predicate)
                }))
                .await?;
                let kept: Vec<Value> = entries.into_iter().flatten().collect();
                if kept.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(Value::List(kept)))
                }
            }
            other => Ok(Some(other.clone())),
        }
    }
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::builtin;
    use crate::element::id::IdType;
    use crate::element::value::Value;
    use indexmap::indexmap;
    use std::convert::Infallible;

    fn sample_object() -> Element {
        Element::Object(
            ObjectType::new(ElemId::new("salesforce", "lead"))
                .with_annotation("label", "Lead")
                .with_annotation("internal", true)
                .with_annotation_type("label", builtin::string())
                .with_field_annotations(
                    "status",
                    builtin::string(),
                    indexmap! { "label".to_string() => Value::from("Status") },
                )
                .with_field("owner", builtin::string()),
        )
    }

    fn sample_instance() -> Element {
        let object = ObjectType::new(ElemId::new("salesforce", "lead"))
            .with_field("name", builtin::string())
            .into_type_ref();
        Element::Instance(InstanceElement::new(
            "my_lead",
            object,
            indexmap! {
                "name".to_string() => Value::from("lead"),
                "nested".to_string() => Value::Map(indexmap! {
                    "secret".to_string() => Value::from("x"),
                }),
                "emails".to_string() => Value::List(vec![
                    Value::from("a@example.com"),
                    Value::from("b@example.com"),
                ]),
            },
        ))
    }

    async fn accept_all(_: ElemId) -> Result<bool, Infallible> {
        Ok(true)
    }

    #[tokio::test]
    async fn test_accepting_predicate_keeps_element() {
        let element = sample_object();
        let id = element.elem_id();
        let kept = filter_by_id(&id, &element, &accept_all).await.unwrap();
        assert_eq!(kept, Some(element));
    }

    #[tokio::test]
    async fn test_rejected_base_id_drops_element() {
        let element = sample_object();
        let id = element.elem_id();
        let reject = |checked: ElemId| {
            let id = id.clone();
            async move { Ok::<_, Infallible>(checked != id) }
        };
        let kept = filter_by_id(&id, &element, &reject).await.unwrap();
        assert!(kept.is_none());
    }

    #[tokio::test]
    async fn test_filter_object_annotations() {
        let element = sample_object();
        let id = element.elem_id();
        let no_attrs =
            |checked: ElemId| async move { Ok::<_, Infallible>(checked.id_type() != IdType::Attr) };
        let kept = filter_by_id(&id, &element, &no_attrs).await.unwrap().unwrap();
        let object = kept.as_object().unwrap();
        // the annotations table survives empty, only its entries go
        assert!(object.annotations.is_empty());
        assert!(!object.fields.is_empty());
    }

    #[tokio::test]
    async fn test_filter_object_fields() {
        let element = sample_object();
        let id = element.elem_id();
        let no_status = |checked: ElemId| async move {
            Ok::<_, Infallible>(
                !(checked.id_type() == IdType::Field && checked.name() == "status"),
            )
        };
        let kept = filter_by_id(&id, &element, &no_status).await.unwrap().unwrap();
        let object = kept.as_object().unwrap();
        assert!(object.field("status").is_none());
        assert!(object.field("owner").is_some());
    }

    #[tokio::test]
    async fn test_filter_annotation_types() {
        let element = sample_object();
        let id = element.elem_id();
        let no_annotation_schema = |checked: ElemId| async move {
            Ok::<_, Infallible>(checked.id_type() != IdType::Annotation)
        };
        let kept = filter_by_id(&id, &element, &no_annotation_schema)
            .await
            .unwrap()
            .unwrap();
        assert!(kept.as_object().unwrap().annotation_types.is_empty());
    }

    #[tokio::test]
    async fn test_filter_instance_values() {
        let element = sample_instance();
        let id = element.elem_id();
        let no_secret = |checked: ElemId| async move {
            Ok::<_, Infallible>(checked.name() != "secret")
        };
        let kept = filter_by_id(&id, &element, &no_secret).await.unwrap().unwrap();
        let instance = kept.as_instance().unwrap();
        assert_eq!(instance.value.get("name"), Some(&Value::from("lead")));
        // the nested map lost its only entry, so the whole container goes
        assert!(instance.value.get("nested").is_none());
    }

    #[tokio::test]
    async fn test_filter_list_items() {
        let element = sample_instance();
        let id = element.elem_id();
        let drop_first = |checked: ElemId| async move {
            let is_first = checked.path().last() == Some(&PathSegment::Index(0));
            Ok::<_, Infallible>(!is_first)
        };
        let kept = filter_by_id(&id, &element, &drop_first).await.unwrap().unwrap();
        let emails = kept
            .as_instance()
            .unwrap()
            .value
            .get("emails")
            .and_then(Value::as_list)
            .unwrap();
        assert_eq!(emails, &[Value::from("b@example.com")]);
    }

    #[tokio::test]
    async fn test_predicate_error_aborts() {
        let element = sample_instance();
        let id = element.elem_id();
        let failing = |_: ElemId| async move { Err::<bool, _>("lookup failed") };
        let result = filter_by_id(&id, &element, &failing).await;
        assert_eq!(result.unwrap_err(), "lookup failed");
    }
}
