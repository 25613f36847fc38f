//! Hierarchical, structural addresses for configuration entities.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::element::error::{ModelError, Result};

/// Role of the entity or sub-value an [`ElemId`] addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IdType {
    /// A named type (primitive, object or list).
    Type,
    /// A field of an object type.
    Field,
    /// An instance, or a position inside an instance's value tree.
    Instance,
    /// An annotation value on a type.
    Attr,
    /// An entry of a type's annotation-type schema.
    Annotation,
    /// A standalone annotation-type address produced by adapters.
    AnnotationType,
    /// A raw value position addressed without schema context.
    Value,
}

impl IdType {
    /// Returns the stable string marker used in rendered full names.
    pub fn marker(&self) -> &'static str {
        match self {
            IdType::Type => "type",
            IdType::Field => "field",
            IdType::Instance => "instance",
            IdType::Attr => "attr",
            IdType::Annotation => "annotation",
            IdType::AnnotationType => "annotationType",
            IdType::Value => "value",
        }
    }

    fn from_marker(marker: &str) -> Option<IdType> {
        match marker {
            "type" => Some(IdType::Type),
            "field" => Some(IdType::Field),
            "instance" => Some(IdType::Instance),
            "attr" => Some(IdType::Attr),
            "annotation" => Some(IdType::Annotation),
            "annotationType" => Some(IdType::AnnotationType),
            "value" => Some(IdType::Value),
            _ => None,
        }
    }
}

impl fmt::Display for IdType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.marker())
    }
}

impl std::str::FromStr for IdType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        IdType::from_marker(s).ok_or_else(|| ModelError::InvalidElemId(s.to_string()))
    }
}

/// One step of an address path: a mapping key / field name, or a sequence index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    Index(usize),
    Name(String),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Index(index) => write!(f, "{}", index),
            PathSegment::Name(name) => write!(f, "{}", name),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(name: &str) -> Self {
        PathSegment::Name(name.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(name: String) -> Self {
        PathSegment::Name(name)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        PathSegment::Index(index)
    }
}

/// Structural identifier locating an entity or sub-value within the
/// configuration tree.
///
/// An `ElemId` is a pure value: it carries no ownership over the element it
/// names, and two ids are the same address exactly when they are equal.
/// Lookups always go through an explicit elements collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElemId {
    adapter: String,
    type_name: String,
    id_type: IdType,
    path: Vec<PathSegment>,
}

impl ElemId {
    const SEPARATOR: char = '.';

    /// Creates a top-level type id.
    pub fn new(adapter: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            adapter: adapter.into(),
            type_name: type_name.into(),
            id_type: IdType::Type,
            path: Vec::new(),
        }
    }

    /// Creates a top-level instance id for an instance of the given type.
    pub fn instance(
        adapter: impl Into<String>,
        type_name: impl Into<String>,
        instance_name: impl Into<String>,
    ) -> Self {
        Self {
            adapter: adapter.into(),
            type_name: type_name.into(),
            id_type: IdType::Instance,
            path: vec![PathSegment::Name(instance_name.into())],
        }
    }

    pub fn adapter(&self) -> &str {
        &self.adapter
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn id_type(&self) -> IdType {
        self.id_type
    }

    pub fn path(&self) -> &[PathSegment] {
        &self.path
    }

    /// The most specific name in the address: the last path segment, or the
    /// top-level name when the path is empty.
    pub fn name(&self) -> String {
        self.path
            .last()
            .map(ToString::to_string)
            .unwrap_or_else(|| self.type_name.clone())
    }

    /// Whether this id addresses a whole element rather than a nested part.
    pub fn is_top_level(&self) -> bool {
        match self.id_type {
            IdType::Type => self.path.is_empty(),
            IdType::Instance => self.path.len() == 1,
            _ => false,
        }
    }

    /// Derives a child address. On a bare type id the first segment is a
    /// role marker (`field` / `attr` / `annotation` / ...) selecting the
    /// child's [`IdType`]; all remaining segments extend the path.
    pub fn create_nested_id<I>(&self, parts: I) -> ElemId
    where
        I: IntoIterator,
        I::Item: Into<PathSegment>,
    {
        let mut segments = parts.into_iter().map(Into::into);
        let mut id = self.clone();
        if id.id_type == IdType::Type && id.path.is_empty() {
            match segments.next() {
                Some(PathSegment::Name(name)) => match IdType::from_marker(&name) {
                    Some(role) if role != IdType::Type => id.id_type = role,
                    _ => id.path.push(PathSegment::Name(name)),
                },
                Some(segment) => id.path.push(segment),
                None => {}
            }
        }
        id.path.extend(segments);
        id
    }

    /// Derives the parent address by dropping the last path segment. A
    /// top-level id collapses to the adapter id; other exhausted paths
    /// collapse to the top-level type id.
    pub fn create_parent_id(&self) -> ElemId {
        if self.is_top_level() {
            return ElemId::new(self.adapter.clone(), "");
        }
        let mut id = self.clone();
        id.path.pop();
        if id.path.is_empty() && id.id_type != IdType::Instance {
            return ElemId::new(self.adapter.clone(), self.type_name.clone());
        }
        id
    }

    /// Renders the address as its ordered name parts. The `type` role marker
    /// is omitted; empty adapter / top-level names are skipped.
    pub fn full_name_parts(&self) -> Vec<String> {
        let mut parts = Vec::with_capacity(self.path.len() + 3);
        if !self.adapter.is_empty() {
            parts.push(self.adapter.clone());
        }
        if !self.type_name.is_empty() {
            parts.push(self.type_name.clone());
        }
        if self.id_type != IdType::Type {
            parts.push(self.id_type.marker().to_string());
        }
        parts.extend(self.path.iter().map(ToString::to_string));
        parts
    }

    /// Stable string form of the address.
    pub fn full_name(&self) -> String {
        self.full_name_parts().join(".")
    }

    /// Whether `other` addresses a strict descendant of this address.
    pub fn is_parent_of(&self, other: &ElemId) -> bool {
        let mine = self.full_name_parts();
        let theirs = other.full_name_parts();
        theirs.len() > mine.len() && theirs[..mine.len()] == mine[..]
    }

    /// Parses a rendered full name back into an id. Inverse of
    /// [`ElemId::full_name`] for ids with a non-empty adapter.
    pub fn from_full_name(full_name: &str) -> Result<ElemId> {
        if full_name.is_empty() {
            return Err(ModelError::InvalidElemId(full_name.to_string()));
        }
        let mut parts = full_name.split(Self::SEPARATOR);
        let adapter = parts.next().unwrap_or_default();
        let type_name = match parts.next() {
            Some(name) => name,
            None => return Ok(ElemId::new(adapter, "")),
        };
        let mut id = ElemId::new(adapter, type_name);
        if let Some(marker) = parts.next() {
            let role = IdType::from_marker(marker)
                .ok_or_else(|| ModelError::InvalidElemId(full_name.to_string()))?;
            id.id_type = role;
            id.path = parts
                .map(|segment| match segment.parse::<usize>() {
                    Ok(index) => PathSegment::Index(index),
                    Err(_) => PathSegment::Name(segment.to_string()),
                })
                .collect();
        }
        Ok(id)
    }
}

impl fmt::Display for ElemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.full_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_id_full_name() {
        let id = ElemId::new("salesforce", "lead");
        assert_eq!(id.full_name(), "salesforce.lead");
        assert_eq!(id.id_type(), IdType::Type);
    }

    #[test]
    fn test_instance_id_full_name() {
        let id = ElemId::instance("salesforce", "lead", "my_lead");
        assert_eq!(id.full_name(), "salesforce.lead.instance.my_lead");
        assert!(id.is_top_level());
    }

    #[test]
    fn test_nested_id_role_marker() {
        let id = ElemId::new("salesforce", "lead");
        let attr = id.create_nested_id(["attr", "label"]);
        assert_eq!(attr.id_type(), IdType::Attr);
        assert_eq!(attr.full_name(), "salesforce.lead.attr.label");

        let field = id.create_nested_id(["field", "status"]);
        assert_eq!(field.id_type(), IdType::Field);
        assert_eq!(field.full_name(), "salesforce.lead.field.status");

        let anno = id.create_nested_id(["annotation", "label"]);
        assert_eq!(anno.full_name(), "salesforce.lead.annotation.label");
    }

    #[test]
    fn test_nested_id_appends_on_non_type() {
        let id = ElemId::instance("salesforce", "lead", "my_lead");
        let nested = id.create_nested_id(["status"]);
        assert_eq!(nested.full_name(), "salesforce.lead.instance.my_lead.status");
        assert_eq!(nested.id_type(), IdType::Instance);
    }

    #[test]
    fn test_index_segments() {
        let id = ElemId::instance("salesforce", "lead", "my_lead")
            .create_nested_id(["emails"])
            .create_nested_id([PathSegment::Index(2)]);
        assert_eq!(id.full_name(), "salesforce.lead.instance.my_lead.emails.2");
    }

    #[test]
    fn test_parent_id() {
        let id = ElemId::new("salesforce", "lead");
        let field_anno = id.create_nested_id(["field", "status", "label"]);
        assert_eq!(
            field_anno.create_parent_id().full_name(),
            "salesforce.lead.field.status"
        );
        let field = field_anno.create_parent_id();
        // an exhausted path collapses to the type id
        assert_eq!(field.create_parent_id(), id);
        // a top-level id collapses to the adapter id
        assert_eq!(id.create_parent_id().full_name(), "salesforce");
    }

    #[test]
    fn test_instance_parent_is_adapter() {
        let id = ElemId::instance("salesforce", "lead", "my_lead");
        assert_eq!(id.create_parent_id().full_name(), "salesforce");
    }

    #[test]
    fn test_is_parent_of() {
        let id = ElemId::new("salesforce", "lead");
        assert!(id.is_parent_of(&id.create_nested_id(["attr", "label"])));
        assert!(id.is_parent_of(&ElemId::instance("salesforce", "lead", "x")));
        assert!(!id.is_parent_of(&id));
        assert!(!id.is_parent_of(&ElemId::new("salesforce", "account")));
        assert!(!ElemId::new("netsuite", "lead").is_parent_of(&id));
    }

    #[test]
    fn test_from_full_name_round_trip() {
        let ids = [
            ElemId::new("salesforce", "lead"),
            ElemId::instance("salesforce", "lead", "my_lead"),
            ElemId::new("salesforce", "lead").create_nested_id(["field", "status", "label"]),
            ElemId::instance("salesforce", "lead", "my_lead")
                .create_nested_id(["emails"])
                .create_nested_id([PathSegment::Index(0)]),
        ];
        for id in ids {
            assert_eq!(ElemId::from_full_name(&id.full_name()).unwrap(), id);
        }
    }

    #[test]
    fn test_from_full_name_rejects_bad_marker() {
        assert!(ElemId::from_full_name("salesforce.lead.bogus.x").is_err());
        assert!(ElemId::from_full_name("").is_err());
    }

    #[test]
    fn test_name_accessor() {
        assert_eq!(ElemId::new("a", "t").name(), "t");
        assert_eq!(ElemId::instance("a", "t", "i").name(), "i");
        assert_eq!(
            ElemId::new("a", "t").create_nested_id(["attr", "label"]).name(),
            "label"
        );
    }
}
