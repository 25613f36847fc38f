//! Splitting and recombining hidden values.
//!
//! Fields annotated as hidden never appear in the workspace view of an
//! instance. Before comparing a workspace element against the service
//! state the hidden values are merged back in from the state copy, and
//! before writing fetched state to the workspace they are stripped.

use std::collections::HashMap;

use crate::element::error::Result;
use crate::element::types::Element;
use crate::element::value::{Value, Values};
use crate::transform::transform_element;

/// Returns the workspace elements with hidden values copied back in from
/// their state twins. Elements without a twin, and non-instance elements,
/// pass through unchanged.
pub fn add_hidden_values(workspace: &[Element], state: &[Element]) -> Result<Vec<Element>> {
    let state_by_name: HashMap<String, &Element> = state
        .iter()
        .map(|element| (element.elem_id().full_name(), element))
        .collect();
    workspace
        .iter()
        .map(|element| {
            let twin = match (
                element.as_instance(),
                state_by_name.get(&element.elem_id().full_name()),
            ) {
                (Some(_), Some(twin)) => twin,
                _ => return Ok(element.clone()),
            };
            let hidden_only = transform_element(
                twin,
                |value, field, _| {
                    if field.is_some_and(|f| f.is_hidden()) {
                        Ok(Some(value))
                    } else {
                        Ok(None)
                    }
                },
                true,
            )?;
            let mut merged = element.clone();
            if let (Element::Instance(target), Element::Instance(hidden)) =
                (&mut merged, hidden_only)
            {
                merge_values(&mut target.value, hidden.value);
            }
            Ok(merged)
        })
        .collect()
}

/// Returns `element` without the values of hidden fields. Non-instance
/// elements pass through unchanged.
pub fn remove_hidden_values(element: &Element) -> Result<Element> {
    if element.as_instance().is_none() {
        return Ok(element.clone());
    }
    transform_element(
        element,
        |value, field, _| {
            if field.is_some_and(|f| f.is_hidden()) {
                Ok(None)
            } else {
                Ok(Some(value))
            }
        },
        false,
    )
}

/// Merges `overlay` into `base`. Mappings merge key by key, recursively;
/// any other value, sequences included, replaces the base value whole.
fn merge_values(base: &mut Values, overlay: Values) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(Value::Map(existing)), Value::Map(incoming)) => {
                merge_values(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}
