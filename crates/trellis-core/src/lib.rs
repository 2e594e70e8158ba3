//! Core systems for Trellis.
//!
//! This crate provides the building blocks shared by the rest of the toolkit:
//!
//! - **Listener lists**: ordered, non-owning observer registries with
//!   snapshot broadcast semantics
//! - **Task queue**: deferred work for the UI thread
//! - **Versions**: parsing and formatting of four-part version numbers
//! - **Logging**: tracing targets and span names used across the workspace
//!
//! # Listener Example
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use trellis_core::ListenerList;
//!
//! trait PressListener {
//!     fn pressed(&self) -> bool;
//! }
//!
//! struct Consumer(Cell<u32>);
//!
//! impl PressListener for Consumer {
//!     fn pressed(&self) -> bool {
//!         self.0.set(self.0.get() + 1);
//!         true
//!     }
//! }
//!
//! let list: ListenerList<dyn PressListener> = ListenerList::new();
//! let consumer: Rc<dyn PressListener> = Rc::new(Consumer(Cell::new(0)));
//! list.add(&consumer);
//!
//! assert!(list.any_consumed(|l| l.pressed()));
//! ```

mod error;
pub mod listener;
pub mod logging;
pub mod task;
pub mod version;

pub use error::VersionError;
pub use listener::ListenerList;
pub use task::TaskQueue;
pub use version::{MAX_REVISION, Version};

// Listener lists and task queues are UI-thread objects.
static_assertions::assert_not_impl_any!(ListenerList<dyn Fn()>: Send, Sync);
static_assertions::assert_not_impl_any!(TaskQueue<()>: Send, Sync);
static_assertions::assert_impl_all!(Version: Send, Sync, Clone);
