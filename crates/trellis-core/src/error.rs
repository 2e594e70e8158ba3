//! Error types for Trellis core.

use thiserror::Error;

/// Errors produced while building or parsing a [`Version`](crate::Version).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionError {
    /// The version string was empty.
    #[error("version string is empty")]
    Empty,
    /// The version string could not be parsed.
    #[error("invalid version string: {0:?}")]
    InvalidFormat(String),
    /// A revision component exceeded the supported range.
    #[error("{name} must be less than or equal 32767.")]
    OutOfRange {
        /// Which revision was out of range.
        name: &'static str,
        /// The rejected value.
        value: u32,
    },
}
