//! Logging targets for the render crate.
//!
//! Same layout as `trellis_core::logging`. This crate does not depend on
//! `trellis-core`, so its targets live here.

/// Target names for log filtering.
pub mod targets {
    /// Image loading and the resource cache.
    pub const RESOURCE: &str = "trellis_render::resource";
    /// Surface allocation.
    pub const SURFACE: &str = "trellis_render::surface";
}
