//! Error types for the dynamic field and its host boundary.

use thiserror::Error;

use crate::types::ElementId;

/// Result type for field operations.
pub type FieldResult<T> = Result<T, FieldError>;

/// Errors raised by a [`Host`](crate::engine::Host) while instantiating or
/// addressing elements.
#[derive(Debug, Error)]
pub enum HostError {
    /// The descriptor names a widget kind the host cannot build.
    #[error("unknown widget kind: {0}")]
    UnknownKind(String),

    /// An element handle that the host does not (or no longer) know.
    #[error("unknown element: {0}")]
    UnknownElement(ElementId),

    /// The layout engine rejected an operation.
    #[error("layout engine error: {0}")]
    Layout(#[from] taffy::TaffyError),
}

/// Errors raised by the dynamic field.
#[derive(Debug, Error)]
pub enum FieldError {
    /// The host failed to build or address a row element.
    #[error("host error: {0}")]
    Host(#[from] HostError),

    /// Configuration could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}
