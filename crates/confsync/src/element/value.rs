//! The untyped value tree carried by instances and annotations.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::element::error::{ModelError, Result};
use crate::element::id::ElemId;

/// Ordered string-keyed mapping of values. Iteration follows insertion
/// order so rendered output stays stable.
pub type Values = IndexMap<String, Value>;

/// Pointer to binary content stored outside the configuration tree.
/// Equality is by path and content hash, never by the bytes themselves.
///
/// The `expression` tag keeps the serialized form distinguishable from a
/// plain map that happens to carry the same keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "expression", rename = "staticContent")]
pub struct StaticContent {
    pub filepath: String,
    pub hash: String,
}

impl StaticContent {
    pub fn new(filepath: impl Into<String>, hash: impl Into<String>) -> Self {
        Self {
            filepath: filepath.into(),
            hash: hash.into(),
        }
    }
}

/// A symbolic pointer to another address in the tree, optionally carrying
/// the value it resolved to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "expression", rename = "reference")]
pub struct ReferenceExpression {
    pub target: ElemId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved: Option<Box<Value>>,
}

impl ReferenceExpression {
    pub fn new(target: ElemId) -> Self {
        Self {
            target,
            resolved: None,
        }
    }

    pub fn with_resolved(target: ElemId, resolved: Value) -> Self {
        Self {
            target,
            resolved: Some(Box::new(resolved)),
        }
    }
}

/// One piece of a template string: literal text or an embedded reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TemplatePart {
    Literal(String),
    Reference(ReferenceExpression),
}

/// A string assembled from literal runs and embedded references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "expression", rename = "template")]
pub struct TemplateExpression {
    pub parts: Vec<TemplatePart>,
}

impl TemplateExpression {
    pub fn new(parts: Vec<TemplatePart>) -> Self {
        Self { parts }
    }
}

/// A node in the configuration value tree.
///
/// Numbers are carried as `f64`, which is why `Value` is `PartialEq` but
/// not `Eq`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    String(String),
    Number(f64),
    Bool(bool),
    // expression variants carry an `expression` tag field and are tried
    // before Map, so plain maps never deserialize as expressions
    Reference(ReferenceExpression),
    Template(TemplateExpression),
    StaticContent(StaticContent),
    List(Vec<Value>),
    Map(Values),
}

impl Value {
    /// Whether the value is an atomic leaf a template part may render.
    pub fn is_scalar(&self) -> bool {
        matches!(self, Value::String(_) | Value::Number(_) | Value::Bool(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Values> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<Values> for Value {
    fn from(map: Values) -> Self {
        Value::Map(map)
    }
}

impl From<ReferenceExpression> for Value {
    fn from(reference: ReferenceExpression) -> Self {
        Value::Reference(reference)
    }
}

impl From<TemplateExpression> for Value {
    fn from(template: TemplateExpression) -> Self {
        Value::Template(template)
    }
}

impl From<StaticContent> for Value {
    fn from(content: StaticContent) -> Self {
        Value::StaticContent(content)
    }
}

impl TryFrom<serde_json::Value> for Value {
    type Error = ModelError;

    fn try_from(json: serde_json::Value) -> Result<Self> {
        match json {
            serde_json::Value::Null => Err(ModelError::IncompatibleValue(
                "null has no tree representation, omit the key instead".to_string(),
            )),
            serde_json::Value::Bool(b) => Ok(Value::Bool(b)),
            serde_json::Value::Number(n) => n
                .as_f64()
                .map(Value::Number)
                .ok_or_else(|| ModelError::IncompatibleValue(format!("number {} overflows", n))),
            serde_json::Value::String(s) => Ok(Value::String(s)),
            serde_json::Value::Array(items) => items
                .into_iter()
                .map(Value::try_from)
                .collect::<Result<Vec<_>>>()
                .map(Value::List),
            serde_json::Value::Object(entries) => entries
                .into_iter()
                .map(|(key, value)| Ok((key, Value::try_from(value)?)))
                .collect::<Result<Values>>()
                .map(Value::Map),
        }
    }
}

impl TryFrom<Value> for serde_json::Value {
    type Error = ModelError;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::String(s) => Ok(serde_json::Value::String(s)),
            // integral numbers cross back as JSON integers, not floats
            Value::Number(n) if n.fract() == 0.0 && n.abs() < (i64::MAX as f64) => {
                Ok(serde_json::Value::Number(serde_json::Number::from(n as i64)))
            }
            Value::Number(n) => serde_json::Number::from_f64(n)
                .map(serde_json::Value::Number)
                .ok_or_else(|| ModelError::IncompatibleValue(format!("number {} is not finite", n))),
            Value::Bool(b) => Ok(serde_json::Value::Bool(b)),
            Value::List(items) => items
                .into_iter()
                .map(serde_json::Value::try_from)
                .collect::<Result<Vec<_>>>()
                .map(serde_json::Value::Array),
            Value::Map(map) => map
                .into_iter()
                .map(|(key, value)| Ok((key, serde_json::Value::try_from(value)?)))
                .collect::<Result<serde_json::Map<_, _>>>()
                .map(serde_json::Value::Object),
            Value::Reference(reference) => Err(ModelError::IncompatibleValue(format!(
                "unresolved reference to {} cannot be rendered as plain data",
                reference.target
            ))),
            Value::Template(_) => Err(ModelError::IncompatibleValue(
                "template expression cannot be rendered as plain data".to_string(),
            )),
            Value::StaticContent(content) => Err(ModelError::IncompatibleValue(format!(
                "static content {} cannot be rendered as plain data",
                content.filepath
            ))),
        }
    }
}
