//! Errors produced by the element model and the operations built on it.

use thiserror::Error;

use crate::element::id::ElemId;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ModelError>;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("reference to {target} could not be resolved")]
    UnresolvedReference { target: ElemId },

    #[error("reference to {target} inside a template resolved to a non-scalar value")]
    NonScalarTemplatePart { target: ElemId },

    #[error("invalid element id: {0}")]
    InvalidElemId(String),

    #[error("element identity changed from {before} to {after}")]
    IdentityMismatch { before: String, after: String },

    #[error("incompatible value: {0}")]
    IncompatibleValue(String),

    #[error("transform callback failed: {0}")]
    Callback(String),

    #[error("adapter error: {0}")]
    Adapter(String),
}
