//! Geometry and colour types.
//!
//! All geometry is in integer pixels. Components are laid out on a pixel
//! grid and the CPU surface paints whole pixels, so there is no need for
//! fractional coordinates.

/// A 2D point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    /// Create a new point.
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Origin point (0, 0).
    pub const ZERO: Self = Self { x: 0, y: 0 };

    /// Offset the point by the given amount.
    #[inline]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

/// A width and height pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    /// Create new dimensions.
    #[inline]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Zero dimensions.
    pub const ZERO: Self = Self {
        width: 0,
        height: 0,
    };

    /// Whether either side is zero.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// A rectangle defined by its top-left corner and its size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Bounds {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Bounds {
    /// Create a new rectangle.
    #[inline]
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a rectangle at the origin with the given size.
    #[inline]
    pub const fn from_dimensions(size: Dimensions) -> Self {
        Self::new(0, 0, size.width, size.height)
    }

    /// Empty rectangle at origin.
    pub const ZERO: Self = Self::new(0, 0, 0, 0);

    /// Left edge x coordinate.
    #[inline]
    pub const fn left(&self) -> i32 {
        self.x
    }

    /// Top edge y coordinate.
    #[inline]
    pub const fn top(&self) -> i32 {
        self.y
    }

    /// Right edge x coordinate (exclusive).
    #[inline]
    pub const fn right(&self) -> i32 {
        self.x + self.width as i32
    }

    /// Bottom edge y coordinate (exclusive).
    #[inline]
    pub const fn bottom(&self) -> i32 {
        self.y + self.height as i32
    }

    /// Top-left corner.
    #[inline]
    pub const fn location(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// The rectangle's size.
    #[inline]
    pub const fn size(&self) -> Dimensions {
        Dimensions::new(self.width, self.height)
    }

    /// Check if the rectangle has no area.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Check if a point is inside the rectangle.
    #[inline]
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.left()
            && point.x < self.right()
            && point.y >= self.top()
            && point.y < self.bottom()
    }

    /// Compute the intersection of two rectangles.
    pub fn intersect(&self, other: &Bounds) -> Option<Bounds> {
        let left = self.left().max(other.left());
        let top = self.top().max(other.top());
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        if left < right && top < bottom {
            Some(Bounds::new(
                left,
                top,
                (right - left) as u32,
                (bottom - top) as u32,
            ))
        } else {
            None
        }
    }

    /// Compute the union (bounding box) of two rectangles.
    ///
    /// Empty rectangles do not contribute to the result.
    pub fn union(&self, other: &Bounds) -> Bounds {
        if other.is_empty() {
            return *self;
        }
        if self.is_empty() {
            return *other;
        }
        let left = self.left().min(other.left());
        let top = self.top().min(other.top());
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Bounds::new(left, top, (right - left) as u32, (bottom - top) as u32)
    }

    /// Offset the rectangle by the given amount.
    #[inline]
    pub const fn translate(&self, dx: i32, dy: i32) -> Bounds {
        Bounds::new(self.x + dx, self.y + dy, self.width, self.height)
    }
}

/// Space reserved around the inside edge of a rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Insets {
    pub top: u32,
    pub left: u32,
    pub bottom: u32,
    pub right: u32,
}

impl Insets {
    /// The same inset on every side.
    #[inline]
    pub const fn uniform(value: u32) -> Self {
        Self {
            top: value,
            left: value,
            bottom: value,
            right: value,
        }
    }

    /// No insets.
    pub const NONE: Self = Self::uniform(0);

    /// Total horizontal inset.
    #[inline]
    pub const fn horizontal(&self) -> u32 {
        self.left + self.right
    }

    /// Total vertical inset.
    #[inline]
    pub const fn vertical(&self) -> u32 {
        self.top + self.bottom
    }
}

/// An 8-bit RGBA colour with straight (non-premultiplied) alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    /// Create a colour from RGBA components.
    #[inline]
    pub const fn from_rgba8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Create an opaque colour from RGB components.
    #[inline]
    pub const fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self::from_rgba8(r, g, b, 255)
    }

    /// Create a colour from a hex string (e.g., "#FF0000" or "#FF0000FF").
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim_start_matches('#');
        let len = hex.len();

        if len != 6 && len != 8 {
            return None;
        }

        let r = u8::from_str_radix(hex.get(0..2)?, 16).ok()?;
        let g = u8::from_str_radix(hex.get(2..4)?, 16).ok()?;
        let b = u8::from_str_radix(hex.get(4..6)?, 16).ok()?;
        let a = if len == 8 {
            u8::from_str_radix(hex.get(6..8)?, 16).ok()?
        } else {
            255
        };

        Some(Self::from_rgba8(r, g, b, a))
    }

    /// Return a new colour with modified alpha.
    #[inline]
    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    /// Darken by a factor (0.0 = no change, 1.0 = black).
    pub fn darker(self, factor: f32) -> Self {
        let keep = 1.0 - factor.clamp(0.0, 1.0);
        let scale = |c: u8| (f32::from(c) * keep).round() as u8;
        Self::from_rgba8(scale(self.r), scale(self.g), scale(self.b), self.a)
    }

    /// Lighten by a factor (0.0 = no change, 1.0 = white).
    pub fn lighter(self, factor: f32) -> Self {
        let factor = factor.clamp(0.0, 1.0);
        let scale = |c: u8| (f32::from(c) + (255.0 - f32::from(c)) * factor).round() as u8;
        Self::from_rgba8(scale(self.r), scale(self.g), scale(self.b), self.a)
    }

    /// Convert to an `[r, g, b, a]` array.
    #[inline]
    pub const fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    // Common colours
    pub const TRANSPARENT: Self = Self::from_rgba8(0, 0, 0, 0);
    pub const BLACK: Self = Self::from_rgb8(0, 0, 0);
    pub const WHITE: Self = Self::from_rgb8(255, 255, 255);
    pub const RED: Self = Self::from_rgb8(255, 0, 0);
    pub const GREEN: Self = Self::from_rgb8(0, 255, 0);
    pub const BLUE: Self = Self::from_rgb8(0, 0, 255);
    pub const GRAY: Self = Self::from_rgb8(128, 128, 128);
    pub const LIGHT_GRAY: Self = Self::from_rgb8(192, 192, 192);
    pub const DARK_GRAY: Self = Self::from_rgb8(64, 64, 64);
}

impl From<Color> for image::Rgba<u8> {
    fn from(color: Color) -> Self {
        image::Rgba(color.to_array())
    }
}

impl From<image::Rgba<u8>> for Color {
    fn from(pixel: image::Rgba<u8>) -> Self {
        let [r, g, b, a] = pixel.0;
        Self::from_rgba8(r, g, b, a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_intersect() {
        let a = Bounds::new(0, 0, 10, 10);
        let b = Bounds::new(5, 5, 10, 10);
        assert_eq!(a.intersect(&b), Some(Bounds::new(5, 5, 5, 5)));
        assert_eq!(a.intersect(&Bounds::new(20, 20, 5, 5)), None);
    }

    #[test]
    fn test_bounds_union_ignores_empty() {
        let a = Bounds::new(2, 3, 4, 5);
        assert_eq!(a.union(&Bounds::ZERO), a);
        assert_eq!(Bounds::ZERO.union(&a), a);
        assert_eq!(
            a.union(&Bounds::new(-1, 0, 2, 2)),
            Bounds::new(-1, 0, 7, 8)
        );
    }

    #[test]
    fn test_bounds_contains() {
        let bounds = Bounds::new(10, 10, 5, 5);
        assert!(bounds.contains(Point::new(10, 10)));
        assert!(bounds.contains(Point::new(14, 14)));
        assert!(!bounds.contains(Point::new(15, 10)));
        assert_eq!(bounds.translate(-10, -10).location(), Point::ZERO);
    }

    #[test]
    fn test_color_hex() {
        assert_eq!(Color::from_hex("#FF8000"), Some(Color::from_rgb8(255, 128, 0)));
        assert_eq!(
            Color::from_hex("00000080"),
            Some(Color::from_rgba8(0, 0, 0, 128))
        );
        assert_eq!(Color::from_hex("#12"), None);
    }

    #[test]
    fn test_color_shading() {
        assert_eq!(Color::WHITE.darker(1.0), Color::BLACK);
        assert_eq!(Color::BLACK.lighter(1.0), Color::WHITE);
        assert_eq!(Color::GRAY.darker(0.0), Color::GRAY);
    }
}
