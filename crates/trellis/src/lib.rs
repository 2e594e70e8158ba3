//! Trellis: a skinnable widget toolkit.
//!
//! Components hold state; skins paint them and turn raw input into component
//! operations. The two are joined at run time, so the look of any widget can
//! be replaced without touching its logic.
//!
//! - [`ComponentTree`] owns every [`Component`] and routes repaint, layout,
//!   focus and deferred work.
//! - [`skin`] defines the skin contract and ships the default skins.
//! - [`decorator`] wraps a component's painting in effects such as blur.
//! - [`dispatch`] delivers input with bubbling up the parent chain.
//! - [`widgets`] has the component models: buttons, image views, file
//!   browsers and panels.
//! - [`binding`], [`platform`], [`config`] and [`transition`] cover data
//!   binding, desktop settings, configuration files and animations.
//!
//! # Example
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use trellis::dispatch::DisplayInput;
//! use trellis::input::MouseButton;
//! use trellis::skin::TerraPushButtonSkin;
//! use trellis::widgets::{Button, ButtonPressListener};
//! use trellis::{Component, ComponentId, ComponentTree};
//! use trellis_render::Bounds;
//!
//! struct Counter(Cell<u32>);
//!
//! impl ButtonPressListener for Counter {
//!     fn button_pressed(&self, _button: ComponentId) {
//!         self.0.set(self.0.get() + 1);
//!     }
//! }
//!
//! let mut tree = ComponentTree::new();
//! let ok = tree.insert(Component::new(Button::new("OK")).with_bounds(Bounds::new(0, 0, 80, 24)));
//! tree.set_skin(ok, TerraPushButtonSkin::new())?;
//!
//! let counter = Rc::new(Counter(Cell::new(0)));
//! let listener: Rc<dyn ButtonPressListener> = counter.clone();
//! tree.model::<Button>(ok)?.press_listeners().add(&listener);
//!
//! let mut input = DisplayInput::with_multi_click_interval(std::time::Duration::from_millis(400));
//! input.mouse_down(&mut tree, MouseButton::Left, 10, 10);
//! input.mouse_up(&mut tree, MouseButton::Left, 10, 10);
//!
//! assert_eq!(counter.0.get(), 1);
//! # Ok::<(), trellis::WidgetError>(())
//! ```

pub mod binding;
pub mod component;
pub mod config;
pub mod decorator;
pub mod dispatch;
mod error;
pub mod input;
pub mod listener;
pub mod platform;
pub mod skin;
pub mod transition;
pub mod tree;
pub mod widgets;

pub use binding::{BindValue, Dictionary};
pub use component::{Component, ComponentId};
pub use config::ToolkitConfig;
pub use decorator::{BlurDecorator, Decorator, FadeDecorator};
pub use dispatch::{DispatchResult, DisplayInput, EventDispatcher};
pub use error::{WidgetError, WidgetResult};
pub use platform::Platform;
pub use skin::Skin;
pub use tree::{ComponentTree, TaskReport};

// Components, skins and trees live on the UI thread.
static_assertions::assert_not_impl_any!(ComponentTree: Send, Sync);
static_assertions::assert_not_impl_any!(Component: Send, Sync);
static_assertions::assert_impl_all!(WidgetError: Send, Sync, std::error::Error);
