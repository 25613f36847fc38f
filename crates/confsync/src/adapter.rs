//! The boundary between the element model and a concrete service.

use async_trait::async_trait;

use crate::element::error::{ModelError, Result};
use crate::element::types::{Element, InstanceElement, TypeRef};

/// A connector to one external service. Implementations translate between
/// the service's native objects and elements, in both directions.
#[async_trait]
pub trait Adapter: Send + Sync {
    /// The type describing this adapter's own configuration.
    fn config_type(&self) -> TypeRef;

    /// Reads every element the service currently holds.
    async fn fetch(&self) -> Result<Vec<Element>>;

    /// Creates `element` in the service and returns it as the service now
    /// sees it, service-assigned values included.
    async fn add(&self, element: Element) -> Result<Element>;

    /// Deletes `element` from the service.
    async fn remove(&self, element: Element) -> Result<()>;

    /// Applies the difference between `before` and `after` to the
    /// service. Both must describe the same instance.
    async fn update(&self, before: InstanceElement, after: InstanceElement)
        -> Result<InstanceElement>;
}

/// Verifies that an update keeps the element's identity stable.
pub fn ensure_same_identity(
    before: &InstanceElement,
    after: &InstanceElement,
) -> Result<()> {
    let before_id = before.elem_id();
    let after_id = after.elem_id();
    if before_id == after_id {
        Ok(())
    } else {
        Err(ModelError::IdentityMismatch {
            before: before_id.full_name(),
            after: after_id.full_name(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::builtin;
    use crate::element::id::ElemId;
    use crate::element::types::ObjectType;
    use crate::element::value::Values;

    fn instance(name: &str) -> InstanceElement {
        let object = ObjectType::new(ElemId::new("test", "service"))
            .with_field("name", builtin::string())
            .into_type_ref();
        InstanceElement::new(name, object, Values::new())
    }

    #[test]
    fn test_same_identity_passes() {
        let before = instance("svc");
        let after = instance("svc");
        assert!(ensure_same_identity(&before, &after).is_ok());
    }

    #[test]
    fn test_renamed_instance_is_rejected() {
        let before = instance("svc");
        let after = instance("renamed");
        assert!(matches!(
            ensure_same_identity(&before, &after),
            Err(ModelError::IdentityMismatch { .. })
        ));
    }
}
