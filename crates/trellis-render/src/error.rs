//! Error types for the render crate.

use thiserror::Error;

/// Errors that can occur while painting or loading images.
#[derive(Error, Debug)]
pub enum RenderError {
    /// Image data could not be decoded.
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    /// Reading an image source failed.
    #[error("failed to read image source: {0}")]
    Io(#[from] std::io::Error),

    /// The URL scheme has no loader.
    #[error("unsupported URL scheme: {scheme}")]
    UnsupportedScheme { scheme: String },

    /// A `file:` URL that does not map to a local path.
    #[error("invalid file URL: {0}")]
    InvalidFileUrl(String),

    /// Raw pixel data does not match the given dimensions.
    #[error("invalid image dimensions: {width}x{height} for {len} bytes")]
    InvalidDimensions { width: u32, height: u32, len: usize },

    /// A named resource does not exist below the resource root.
    #[error("resource not found: {0}")]
    ResourceNotFound(String),
}

/// Result type for render operations.
pub type RenderResult<T> = Result<T, RenderError>;
