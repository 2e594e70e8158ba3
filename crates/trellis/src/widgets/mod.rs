//! Widget models.
//!
//! A widget model is the typed payload of a [`Component`](crate::Component):
//! it holds the widget's content and its widget-specific listener lists.
//! Mutations that have to notify listeners or the skin go through
//! [`ComponentTree`](crate::ComponentTree) methods defined next to each model,
//! for example [`ComponentTree::press`](crate::ComponentTree::press) or
//! [`ComponentTree::set_image`](crate::ComponentTree::set_image).
//!
//! # Available Widgets
//!
//! - [`Button`]: push, toggle and tri-state buttons
//! - [`ImageView`]: displays a single image
//! - [`FileBrowser`]: folder listing with file selection
//! - [`Panel`]: plain container

mod button;
mod file_browser;
mod image_view;
mod panel;

pub use button::{Button, ButtonListener, ButtonPressListener, ButtonState, ButtonStateListener};
pub use file_browser::{FileBrowser, FileBrowserListener, FileFilter};
pub use image_view::{ImageView, ImageViewListener};
pub use panel::Panel;
