//! Error types for the widget layer.

use thiserror::Error;
use trellis_render::RenderError;

use crate::component::ComponentId;

/// Errors that can occur when working with components and skins.
#[derive(Error, Debug)]
pub enum WidgetError {
    /// An argument failed validation.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A component's model or skin is not of the expected type.
    #[error("type mismatch: expected {expected}, found {actual}")]
    TypeMismatch {
        /// The type the caller asked for.
        expected: &'static str,
        /// The type that is actually there.
        actual: &'static str,
    },

    /// The component does not exist (or has been removed).
    #[error("component not found: {0:?}")]
    ComponentNotFound(ComponentId),

    /// A requested image could not be loaded.
    #[error("unable to load image: {0}")]
    Load(#[from] RenderError),

    /// A configuration file could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    /// Reading a configuration file or folder failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl WidgetError {
    /// Shorthand for an [`InvalidArgument`](Self::InvalidArgument) error.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }
}

/// Result type for widget operations.
pub type WidgetResult<T> = Result<T, WidgetError>;
