//! Decoded, immutable images.
//!
//! An [`Image`] is a cheap, cloneable handle to a decoded RGBA picture. Clones
//! share the same pixels, and identity (not pixel content) is what widgets
//! use to detect a change of image.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use image::RgbaImage;

use crate::error::{RenderError, RenderResult};
use crate::types::{Color, Dimensions};

/// A decoded picture that can be drawn onto a [`Surface`](crate::Surface).
#[derive(Clone)]
pub struct Image {
    pixels: Arc<RgbaImage>,
}

impl Image {
    /// Wrap an already decoded buffer.
    pub fn from_rgba_image(pixels: RgbaImage) -> Self {
        Self {
            pixels: Arc::new(pixels),
        }
    }

    /// Create an image from raw, row-major RGBA8 bytes.
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> RenderResult<Self> {
        let len = data.len();
        RgbaImage::from_raw(width, height, data)
            .map(Self::from_rgba_image)
            .ok_or(RenderError::InvalidDimensions { width, height, len })
    }

    /// Decode an encoded image (PNG, JPEG, ...) from memory.
    pub fn from_bytes(bytes: &[u8]) -> RenderResult<Self> {
        let decoded = image::load_from_memory(bytes)?;
        Ok(Self::from_rgba_image(decoded.to_rgba8()))
    }

    /// Decode an image file.
    pub fn from_file(path: impl AsRef<Path>) -> RenderResult<Self> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    /// An image filled with one colour.
    pub fn solid(width: u32, height: u32, color: Color) -> Self {
        Self::from_rgba_image(RgbaImage::from_pixel(width, height, color.into()))
    }

    /// Width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    /// Height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Width and height.
    #[inline]
    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.width(), self.height())
    }

    /// The underlying pixel buffer.
    #[inline]
    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Colour of one pixel, or `None` outside the image.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        self.pixels.get_pixel_checked(x, y).map(|p| Color::from(*p))
    }

    /// Whether two handles refer to the same decoded image.
    #[inline]
    pub fn ptr_eq(a: &Image, b: &Image) -> bool {
        Arc::ptr_eq(&a.pixels, &b.pixels)
    }

    /// Identity comparison for optional images.
    ///
    /// Two `None`s are the same; `Some` values are the same only if they
    /// share pixels.
    pub fn same(a: Option<&Image>, b: Option<&Image>) -> bool {
        match (a, b) {
            (None, None) => true,
            (Some(a), Some(b)) => Image::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Image")
            .field("width", &self.width())
            .field("height", &self.height())
            .field("ptr", &Arc::as_ptr(&self.pixels))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rgba_validates_length() {
        let image = Image::from_rgba(2, 1, vec![255, 0, 0, 255, 0, 255, 0, 255]).unwrap();
        assert_eq!(image.dimensions(), Dimensions::new(2, 1));
        assert_eq!(image.pixel(1, 0), Some(Color::GREEN));
        assert_eq!(image.pixel(2, 0), None);

        let err = Image::from_rgba(2, 2, vec![0; 4]).unwrap_err();
        assert!(matches!(
            err,
            RenderError::InvalidDimensions {
                width: 2,
                height: 2,
                len: 4
            }
        ));
    }

    #[test]
    fn test_identity() {
        let a = Image::solid(1, 1, Color::RED);
        let b = a.clone();
        let c = Image::solid(1, 1, Color::RED);

        assert!(Image::ptr_eq(&a, &b));
        assert!(!Image::ptr_eq(&a, &c));
        assert!(Image::same(None, None));
        assert!(Image::same(Some(&a), Some(&b)));
        assert!(!Image::same(Some(&a), None));
    }

    #[test]
    fn test_decode_garbage_fails() {
        assert!(matches!(
            Image::from_bytes(b"not an image"),
            Err(RenderError::Decode(_))
        ));
    }
}
