//! CPU drawing surfaces.
//!
//! A [`Surface`] is an RGBA pixel buffer with a current origin and clip
//! rectangle. Drawing operations take coordinates relative to the origin and
//! are clipped to the clip rectangle, which is stored in device (buffer)
//! coordinates. [`save`](Surface::save) and [`restore`](Surface::restore)
//! bracket changes to both, the way component painting nests.

use std::fmt;

use image::RgbaImage;

use crate::image::Image;
use crate::logging::targets;
use crate::types::{Bounds, Color, Dimensions, Point};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SurfaceState {
    origin: Point,
    clip: Bounds,
}

/// A paintable RGBA buffer.
#[derive(Clone)]
pub struct Surface {
    pixels: RgbaImage,
    state: SurfaceState,
    saved: Vec<SurfaceState>,
}

impl Surface {
    /// Create a fully transparent surface.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: RgbaImage::new(width, height),
            state: SurfaceState {
                origin: Point::ZERO,
                clip: Bounds::new(0, 0, width, height),
            },
            saved: Vec::new(),
        }
    }

    /// Width of the buffer in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    /// Height of the buffer in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Buffer size.
    #[inline]
    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.width(), self.height())
    }

    /// Resize the buffer.
    ///
    /// The buffer is only reallocated when the size actually changes; the
    /// return value reports whether that happened. Either way the origin and
    /// clip are reset and the saved state stack is emptied.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        let reallocated = self.width() != width || self.height() != height;
        if reallocated {
            tracing::debug!(
                target: targets::SURFACE,
                width,
                height,
                "surface reallocated"
            );
            self.pixels = RgbaImage::new(width, height);
        }
        self.reset_state();
        reallocated
    }

    fn reset_state(&mut self) {
        self.state = SurfaceState {
            origin: Point::ZERO,
            clip: Bounds::new(0, 0, self.width(), self.height()),
        };
        self.saved.clear();
    }

    /// Current origin in device coordinates.
    #[inline]
    pub fn origin(&self) -> Point {
        self.state.origin
    }

    /// Move the origin by the given offset.
    pub fn translate(&mut self, dx: i32, dy: i32) {
        self.state.origin = self.state.origin.offset(dx, dy);
    }

    /// Current clip rectangle in device coordinates.
    #[inline]
    pub fn clip(&self) -> Bounds {
        self.state.clip
    }

    /// The clip rectangle expressed relative to the current origin.
    pub fn local_clip(&self) -> Bounds {
        self.state
            .clip
            .translate(-self.state.origin.x, -self.state.origin.y)
    }

    /// Replace the clip rectangle (device coordinates).
    ///
    /// The clip is always kept inside the buffer.
    pub fn set_clip(&mut self, clip: Bounds) {
        let buffer = Bounds::new(0, 0, self.width(), self.height());
        self.state.clip = clip.intersect(&buffer).unwrap_or(Bounds::ZERO);
    }

    /// Intersect the clip with a rectangle relative to the current origin.
    pub fn clip_to(&mut self, bounds: Bounds) {
        let device = bounds.translate(self.state.origin.x, self.state.origin.y);
        self.state.clip = self.state.clip.intersect(&device).unwrap_or(Bounds::ZERO);
    }

    /// Push the current origin and clip.
    pub fn save(&mut self) {
        self.saved.push(self.state);
    }

    /// Pop the most recently saved origin and clip.
    ///
    /// Restoring with nothing saved resets to the full buffer.
    pub fn restore(&mut self) {
        match self.saved.pop() {
            Some(state) => self.state = state,
            None => {
                self.state = SurfaceState {
                    origin: Point::ZERO,
                    clip: Bounds::new(0, 0, self.width(), self.height()),
                };
            }
        }
    }

    /// Overwrite every pixel, ignoring origin and clip.
    pub fn clear(&mut self, color: Color) {
        let pixel: image::Rgba<u8> = color.into();
        for p in self.pixels.pixels_mut() {
            *p = pixel;
        }
    }

    /// Fill a rectangle, blending with what is already there.
    pub fn fill_rect(&mut self, bounds: Bounds, color: Color) {
        if color.a == 0 {
            return;
        }
        let Some(area) = self.device_area(bounds) else {
            return;
        };
        let source = color.to_array();
        for y in area.top()..area.bottom() {
            for x in area.left()..area.right() {
                let dest = self.pixels.get_pixel_mut(x as u32, y as u32);
                dest.0 = blend(source, dest.0, 1.0);
            }
        }
    }

    /// Outline a rectangle with a line of the given thickness, drawn inside
    /// the rectangle.
    pub fn stroke_rect(&mut self, bounds: Bounds, color: Color, thickness: u32) {
        if bounds.is_empty() || thickness == 0 {
            return;
        }
        let t = thickness.min(bounds.width).min(bounds.height);
        let inner_height = bounds.height.saturating_sub(2 * t);
        self.fill_rect(Bounds::new(bounds.x, bounds.y, bounds.width, t), color);
        self.fill_rect(
            Bounds::new(bounds.x, bounds.bottom() - t as i32, bounds.width, t),
            color,
        );
        self.fill_rect(
            Bounds::new(bounds.x, bounds.y + t as i32, t, inner_height),
            color,
        );
        self.fill_rect(
            Bounds::new(bounds.right() - t as i32, bounds.y + t as i32, t, inner_height),
            color,
        );
    }

    /// Draw an image with its top-left corner at `(x, y)`.
    pub fn draw_image(&mut self, image: &Image, x: i32, y: i32) {
        self.composite(image.pixels(), x, y, 1.0);
    }

    /// Draw an image with a uniform opacity in `0.0..=1.0`.
    pub fn draw_image_with_opacity(&mut self, image: &Image, x: i32, y: i32, opacity: f32) {
        self.composite(image.pixels(), x, y, opacity);
    }

    /// Composite another surface's pixels with its top-left corner at `(x, y)`.
    pub fn draw_surface(&mut self, source: &Surface, x: i32, y: i32) {
        self.composite(&source.pixels, x, y, 1.0);
    }

    /// Composite another surface with a uniform opacity.
    pub fn draw_surface_with_opacity(&mut self, source: &Surface, x: i32, y: i32, opacity: f32) {
        self.composite(&source.pixels, x, y, opacity);
    }

    fn composite(&mut self, source: &RgbaImage, x: i32, y: i32, opacity: f32) {
        let opacity = opacity.clamp(0.0, 1.0);
        if opacity == 0.0 {
            return;
        }
        let placed = Bounds::new(x, y, source.width(), source.height());
        let Some(area) = self.device_area(placed) else {
            return;
        };
        // Device position of the source's top-left pixel.
        let sx0 = x + self.state.origin.x;
        let sy0 = y + self.state.origin.y;
        for dy in area.top()..area.bottom() {
            for dx in area.left()..area.right() {
                let src = source.get_pixel((dx - sx0) as u32, (dy - sy0) as u32).0;
                let dest = self.pixels.get_pixel_mut(dx as u32, dy as u32);
                dest.0 = blend(src, dest.0, opacity);
            }
        }
    }

    /// Map a rectangle relative to the origin into clipped device space.
    fn device_area(&self, bounds: Bounds) -> Option<Bounds> {
        bounds
            .translate(self.state.origin.x, self.state.origin.y)
            .intersect(&self.state.clip)
    }

    /// Colour of the pixel at device coordinates `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        self.pixels.get_pixel_checked(x, y).map(|p| Color::from(*p))
    }

    /// The underlying buffer.
    #[inline]
    pub fn image(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Mutable access to the underlying buffer.
    #[inline]
    pub fn image_mut(&mut self) -> &mut RgbaImage {
        &mut self.pixels
    }

    /// Snapshot the current pixels as an immutable [`Image`].
    pub fn to_image(&self) -> Image {
        Image::from_rgba_image(self.pixels.clone())
    }
}

/// Source-over blend of straight-alpha RGBA8 pixels.
fn blend(source: [u8; 4], dest: [u8; 4], opacity: f32) -> [u8; 4] {
    let sa = f32::from(source[3]) / 255.0 * opacity;
    if sa <= 0.0 {
        return dest;
    }
    if sa >= 1.0 {
        return source;
    }
    let da = f32::from(dest[3]) / 255.0;
    let out_a = sa + da * (1.0 - sa);
    let mut out = [0u8; 4];
    for i in 0..3 {
        let c = (f32::from(source[i]) * sa + f32::from(dest[i]) * da * (1.0 - sa)) / out_a;
        out[i] = c.round().clamp(0.0, 255.0) as u8;
    }
    out[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
    out
}

impl PartialEq for Surface {
    fn eq(&self, other: &Self) -> bool {
        self.pixels.dimensions() == other.pixels.dimensions()
            && self.pixels.as_raw() == other.pixels.as_raw()
    }
}

impl Eq for Surface {}

impl fmt::Debug for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Surface")
            .field("width", &self.width())
            .field("height", &self.height())
            .field("origin", &self.state.origin)
            .field("clip", &self.state.clip)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_respects_origin_and_clip() {
        let mut surface = Surface::new(10, 10);
        surface.translate(2, 2);
        surface.clip_to(Bounds::new(0, 0, 3, 3));
        surface.fill_rect(Bounds::new(-5, -5, 20, 20), Color::RED);

        assert_eq!(surface.pixel(1, 1), Some(Color::TRANSPARENT));
        assert_eq!(surface.pixel(2, 2), Some(Color::RED));
        assert_eq!(surface.pixel(4, 4), Some(Color::RED));
        assert_eq!(surface.pixel(5, 5), Some(Color::TRANSPARENT));
    }

    #[test]
    fn test_save_restore() {
        let mut surface = Surface::new(8, 8);
        surface.save();
        surface.translate(3, 4);
        surface.clip_to(Bounds::new(0, 0, 1, 1));
        assert_eq!(surface.clip(), Bounds::new(3, 4, 1, 1));
        assert_eq!(surface.local_clip(), Bounds::new(0, 0, 1, 1));
        surface.restore();

        assert_eq!(surface.origin(), Point::ZERO);
        assert_eq!(surface.clip(), Bounds::new(0, 0, 8, 8));
    }

    #[test]
    fn test_resize_only_on_change() {
        let mut surface = Surface::new(4, 4);
        assert!(!surface.resize(4, 4));
        assert!(surface.resize(5, 4));
        assert_eq!(surface.dimensions(), Dimensions::new(5, 4));
        assert_eq!(surface.clip(), Bounds::new(0, 0, 5, 4));
    }

    #[test]
    fn test_blend_half_alpha_over_opaque() {
        let mut surface = Surface::new(1, 1);
        surface.clear(Color::WHITE);
        surface.fill_rect(Bounds::new(0, 0, 1, 1), Color::BLACK.with_alpha(128));
        let pixel = surface.pixel(0, 0).unwrap();
        assert_eq!(pixel.a, 255);
        assert!((126..=128).contains(&pixel.r));
    }

    #[test]
    fn test_draw_image_with_opacity() {
        let image = Image::solid(2, 2, Color::BLUE);
        let mut surface = Surface::new(4, 4);
        surface.draw_image(&image, 1, 1);
        assert_eq!(surface.pixel(1, 1), Some(Color::BLUE));
        assert_eq!(surface.pixel(3, 3), Some(Color::TRANSPARENT));

        let mut faded = Surface::new(1, 1);
        faded.draw_image_with_opacity(&image, 0, 0, 0.0);
        assert_eq!(faded.pixel(0, 0), Some(Color::TRANSPARENT));
    }

    #[test]
    fn test_stroke_rect() {
        let mut surface = Surface::new(5, 5);
        surface.stroke_rect(Bounds::new(0, 0, 5, 5), Color::BLACK, 1);
        assert_eq!(surface.pixel(0, 0), Some(Color::BLACK));
        assert_eq!(surface.pixel(4, 2), Some(Color::BLACK));
        assert_eq!(surface.pixel(2, 2), Some(Color::TRANSPARENT));
    }

    #[test]
    fn test_equality_is_pixelwise() {
        let mut a = Surface::new(2, 2);
        let mut b = Surface::new(2, 2);
        b.translate(1, 0);
        assert_eq!(a, b);
        a.fill_rect(Bounds::new(0, 0, 1, 1), Color::GREEN);
        assert_ne!(a, b);
    }
}
