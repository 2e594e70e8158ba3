//! Logging conventions for Trellis.
//!
//! Trellis is instrumented with the `tracing` crate and never installs a
//! subscriber itself. Applications choose their own, for example:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("trellis::dispatch=trace,trellis=debug")
//!     .init();
//! ```
//!
//! Every event emitted by the toolkit uses one of the [`targets`] below, so a
//! subsystem can be switched on or off without touching the others.

/// Span names used throughout Trellis for tracing.
pub mod span_names {
    /// A full paint pass over a component tree.
    pub const PAINT: &str = "trellis::paint";
    /// A layout (validation) pass.
    pub const LAYOUT: &str = "trellis::layout";
    /// Delivery of one input event including bubbling.
    pub const DISPATCH: &str = "trellis::dispatch";
}

/// Target names for log filtering.
pub mod targets {
    /// Listener list bookkeeping.
    pub const LISTENER: &str = "trellis_core::listener";
    /// Deferred task queue.
    pub const TASK: &str = "trellis_core::task";
    /// Component tree structure and state changes.
    pub const COMPONENT: &str = "trellis::component";
    /// Skin install/uninstall and skin callbacks.
    pub const SKIN: &str = "trellis::skin";
    /// Input dispatch and bubbling.
    pub const DISPATCH: &str = "trellis::dispatch";
    /// Decorator paint passes.
    pub const DECORATOR: &str = "trellis::decorator";
    /// Platform property lookups.
    pub const PLATFORM: &str = "trellis::platform";
    /// Configuration loading.
    pub const CONFIG: &str = "trellis::config";
    /// Transitions.
    pub const TRANSITION: &str = "trellis::transition";
}
