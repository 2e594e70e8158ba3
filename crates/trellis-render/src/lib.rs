//! CPU painting for Trellis.
//!
//! This crate holds everything the widget layer paints with:
//!
//! - **Geometry and colour**: [`Point`], [`Dimensions`], [`Bounds`],
//!   [`Insets`], [`Color`]
//! - **Surfaces**: [`Surface`], an RGBA buffer with origin and clip state
//! - **Images**: [`Image`], a shared decoded picture compared by identity
//! - **Resources**: [`ImageLoader`] and [`ResourceCache`] for turning URLs and
//!   resource names into images, synchronously or on the rayon pool
//!
//! # Example
//!
//! ```
//! use trellis_render::{Bounds, Color, Surface};
//!
//! let mut surface = Surface::new(16, 16);
//! surface.save();
//! surface.translate(4, 4);
//! surface.fill_rect(Bounds::new(0, 0, 8, 8), Color::RED);
//! surface.restore();
//!
//! assert_eq!(surface.pixel(4, 4), Some(Color::RED));
//! assert_eq!(surface.pixel(0, 0), Some(Color::TRANSPARENT));
//! ```

mod error;
mod image;
pub mod logging;
mod resource;
mod surface;
mod types;

pub use error::{RenderError, RenderResult};
pub use image::Image;
pub use resource::{CompletedLoad, ImageLoader, LoadQueue, LoadTicket, ResourceCache};
pub use surface::Surface;
pub use types::{Bounds, Color, Dimensions, Insets, Point};

// Images and caches cross into background decode jobs.
static_assertions::assert_impl_all!(Image: Send, Sync, Clone);
static_assertions::assert_impl_all!(Surface: Send, Clone);
static_assertions::assert_impl_all!(ResourceCache: Send, Sync);
static_assertions::assert_impl_all!(ImageLoader: Send, Sync);
static_assertions::assert_impl_all!(LoadQueue: Send, Sync);
