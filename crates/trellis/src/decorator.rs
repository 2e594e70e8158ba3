//! Decorators: paint-pass wrappers.
//!
//! A decorator intercepts a component's paint pass. Before the component
//! paints, [`Decorator::prepare`] hands out a scratch surface sized to the
//! component; the component (and its children) paint onto that instead of
//! the real surface. [`Decorator::update`] then takes the scratch surface
//! back, post-processes it and composites the result onto the real surface
//! at the component's origin.
//!
//! Decorators chain: the first decorator of a component wraps the real
//! surface, the second wraps the first one's scratch surface, and so on.
//! With an empty chain the component paints straight onto the real surface.
//!
//! Scratch buffers belong to their decorator and are reused across paint
//! passes. They are only reallocated when the component's size changes.

use trellis_core::logging::targets;
use trellis_render::{Bounds, Color, Surface};

use crate::component::Component;
use crate::error::{WidgetError, WidgetResult};

/// A paint-pass wrapper.
pub trait Decorator {
    /// Begin a paint pass and return the surface the component should paint
    /// onto.
    ///
    /// The returned surface has the component's size, origin `(0, 0)` and the
    /// same clip as `surface`.
    fn prepare(&mut self, component: &Component, surface: &Surface) -> Surface;

    /// End a paint pass: transform `scratch` and composite it onto `surface`
    /// at its current origin.
    fn update(&mut self, scratch: Surface, surface: &mut Surface);

    /// The region of the real surface affected by repainting `area` of the
    /// component.
    fn affected_area(&self, _component: &Component, area: Bounds) -> Bounds {
        area
    }
}

/// A reusable scratch surface.
///
/// The surface moves out to the paint pass in [`acquire`](Self::acquire) and
/// comes back in [`release`](Self::release).
#[derive(Debug, Default)]
pub struct ScratchBuffer {
    surface: Option<Surface>,
    allocations: u32,
}

impl ScratchBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand out a cleared surface of the given size, clipped to `clip`.
    pub fn acquire(&mut self, width: u32, height: u32, clip: Bounds) -> Surface {
        let mut surface = match self.surface.take() {
            Some(mut surface) => {
                if surface.resize(width, height) {
                    self.allocations += 1;
                }
                surface
            }
            None => {
                self.allocations += 1;
                tracing::debug!(target: targets::DECORATOR, width, height, "scratch buffer allocated");
                Surface::new(width, height)
            }
        };
        surface.clear(Color::TRANSPARENT);
        surface.set_clip(clip);
        surface
    }

    /// Take a surface back for the next pass.
    pub fn release(&mut self, surface: Surface) {
        self.surface = Some(surface);
    }

    /// How many times a buffer has been allocated.
    pub fn allocations(&self) -> u32 {
        self.allocations
    }
}

fn scratch_for(buffer: &mut ScratchBuffer, component: &Component, surface: &Surface) -> Surface {
    buffer.acquire(component.width(), component.height(), surface.local_clip())
}

/// Blurs everything the component paints with a box kernel.
///
/// The kernel is `magnitude` by `magnitude` with every cell weighted
/// `1 / magnitude²`. Pixels closer to the edge than the kernel reaches are
/// copied unchanged.
#[derive(Debug)]
pub struct BlurDecorator {
    magnitude: u32,
    scratch: ScratchBuffer,
}

impl Default for BlurDecorator {
    fn default() -> Self {
        Self {
            magnitude: Self::DEFAULT_MAGNITUDE,
            scratch: ScratchBuffer::new(),
        }
    }
}

impl BlurDecorator {
    pub const DEFAULT_MAGNITUDE: u32 = 9;

    /// Create a blur with the given kernel size.
    pub fn new(magnitude: u32) -> WidgetResult<Self> {
        if magnitude == 0 {
            return Err(WidgetError::invalid("blur magnitude must be at least 1"));
        }
        Ok(Self {
            magnitude,
            scratch: ScratchBuffer::new(),
        })
    }

    pub fn magnitude(&self) -> u32 {
        self.magnitude
    }

    /// Number of scratch buffer allocations so far.
    pub fn allocations(&self) -> u32 {
        self.scratch.allocations()
    }
}

impl Decorator for BlurDecorator {
    fn prepare(&mut self, component: &Component, surface: &Surface) -> Surface {
        scratch_for(&mut self.scratch, component, surface)
    }

    fn update(&mut self, mut scratch: Surface, surface: &mut Surface) {
        box_blur(scratch.image_mut(), self.magnitude);
        surface.draw_surface(&scratch, 0, 0);
        self.scratch.release(scratch);
    }
}

/// Box blur in place, leaving the uncovered border untouched.
fn box_blur(image: &mut image::RgbaImage, magnitude: u32) {
    let (width, height) = image.dimensions();
    if magnitude <= 1 || width < magnitude || height < magnitude {
        return;
    }
    let w = width as usize;
    let h = height as usize;
    let m = magnitude as usize;
    let origin = (m - 1) / 2;
    let cells = (m * m) as u64;

    // Summed-area table with one extra row and column of zeros.
    let stride = w + 1;
    let mut sums = vec![[0u64; 4]; stride * (h + 1)];
    for y in 0..h {
        let mut row = [0u64; 4];
        for x in 0..w {
            let pixel = image.get_pixel(x as u32, y as u32).0;
            for c in 0..4 {
                row[c] += u64::from(pixel[c]);
                sums[(y + 1) * stride + x + 1][c] = sums[y * stride + x + 1][c] + row[c];
            }
        }
    }

    for y in origin..=(h - m + origin) {
        let top = y - origin;
        let bottom = top + m;
        for x in origin..=(w - m + origin) {
            let left = x - origin;
            let right = left + m;
            let mut out = [0u8; 4];
            for c in 0..4 {
                let total = sums[bottom * stride + right][c] + sums[top * stride + left][c]
                    - sums[top * stride + right][c]
                    - sums[bottom * stride + left][c];
                out[c] = ((total + cells / 2) / cells) as u8;
            }
            image.put_pixel(x as u32, y as u32, image::Rgba(out));
        }
    }
}

/// Composites everything the component paints with a uniform opacity.
#[derive(Debug)]
pub struct FadeDecorator {
    opacity: f32,
    scratch: ScratchBuffer,
}

impl FadeDecorator {
    /// Create a fade with an opacity in `0.0..=1.0`.
    pub fn new(opacity: f32) -> WidgetResult<Self> {
        if !(0.0..=1.0).contains(&opacity) {
            return Err(WidgetError::invalid(format!(
                "opacity must be between 0 and 1, got {opacity}"
            )));
        }
        Ok(Self {
            opacity,
            scratch: ScratchBuffer::new(),
        })
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn allocations(&self) -> u32 {
        self.scratch.allocations()
    }
}

impl Decorator for FadeDecorator {
    fn prepare(&mut self, component: &Component, surface: &Surface) -> Surface {
        scratch_for(&mut self.scratch, component, surface)
    }

    fn update(&mut self, scratch: Surface, surface: &mut Surface) {
        surface.draw_surface_with_opacity(&scratch, 0, 0, self.opacity);
        self.scratch.release(scratch);
    }
}

/// Prepare every decorator of a chain, outermost first.
pub(crate) fn prepare_chain(
    decorators: &mut [Box<dyn Decorator>],
    component: &Component,
    surface: &Surface,
) -> Vec<Surface> {
    let mut scratches: Vec<Surface> = Vec::with_capacity(decorators.len());
    for decorator in decorators.iter_mut() {
        let scratch = match scratches.last() {
            Some(target) => decorator.prepare(component, target),
            None => decorator.prepare(component, surface),
        };
        scratches.push(scratch);
    }
    scratches
}

/// The surface the component paints onto: the innermost scratch surface, or
/// the real one when the chain is empty.
pub(crate) fn paint_target<'a>(scratches: &'a mut [Surface], surface: &'a mut Surface) -> &'a mut Surface {
    match scratches.last_mut() {
        Some(scratch) => scratch,
        None => surface,
    }
}

/// Update every decorator of a chain, innermost first.
pub(crate) fn update_chain(
    decorators: &mut [Box<dyn Decorator>],
    mut scratches: Vec<Surface>,
    surface: &mut Surface,
) {
    while let Some(scratch) = scratches.pop() {
        let Some(decorator) = decorators.get_mut(scratches.len()) else {
            break;
        };
        match scratches.last_mut() {
            Some(target) => decorator.update(scratch, target),
            None => decorator.update(scratch, surface),
        }
    }
}

/// Run `paint` through a decorator chain onto `surface`.
///
/// `surface` should already be translated and clipped to the component.
pub fn paint_decorated<F>(
    decorators: &mut [Box<dyn Decorator>],
    component: &Component,
    surface: &mut Surface,
    paint: F,
) where
    F: FnOnce(&mut Surface),
{
    let mut scratches = prepare_chain(decorators, component, surface);
    paint(paint_target(&mut scratches, surface));
    update_chain(decorators, scratches, surface);
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_render::Dimensions;

    fn sized(width: u32, height: u32) -> Component {
        Component::new(()).with_size(width, height)
    }

    fn scene(surface: &mut Surface) {
        surface.fill_rect(Bounds::new(0, 0, 8, 8), Color::WHITE);
        surface.fill_rect(Bounds::new(2, 2, 3, 3), Color::RED);
        surface.fill_rect(Bounds::new(4, 1, 2, 5), Color::BLUE.with_alpha(128));
    }

    #[test]
    fn test_prepare_sizes_scratch_to_component() {
        let mut blur = BlurDecorator::default();
        let surface = Surface::new(100, 100);
        let scratch = blur.prepare(&sized(20, 10), &surface);
        assert_eq!(scratch.dimensions(), Dimensions::new(20, 10));
        assert_eq!(blur.magnitude(), 9);
    }

    #[test]
    fn test_scratch_reused_until_size_changes() {
        let mut blur = BlurDecorator::new(3).unwrap();
        let mut surface = Surface::new(50, 50);
        let component = sized(16, 16);

        let scratch = blur.prepare(&component, &surface);
        blur.update(scratch, &mut surface);
        let scratch = blur.prepare(&component, &surface);
        blur.update(scratch, &mut surface);
        assert_eq!(blur.allocations(), 1);

        let scratch = blur.prepare(&sized(17, 16), &surface);
        assert_eq!(scratch.width(), 17);
        blur.update(scratch, &mut surface);
        assert_eq!(blur.allocations(), 2);
    }

    #[test]
    fn test_scratch_inherits_clip() {
        let mut fade = FadeDecorator::new(0.5).unwrap();
        let mut surface = Surface::new(40, 40);
        surface.translate(10, 10);
        surface.clip_to(Bounds::new(0, 0, 5, 5));

        let scratch = fade.prepare(&sized(20, 20), &surface);
        assert_eq!(scratch.clip(), Bounds::new(0, 0, 5, 5));
        fade.update(scratch, &mut surface);
    }

    #[test]
    fn test_empty_chain_matches_direct_paint() {
        let component = sized(8, 8);
        let mut direct = Surface::new(8, 8);
        scene(&mut direct);

        let mut decorated = Surface::new(8, 8);
        let mut chain: Vec<Box<dyn Decorator>> = Vec::new();
        paint_decorated(&mut chain, &component, &mut decorated, scene);

        assert_eq!(direct, decorated);
    }

    #[test]
    fn test_blur_averages_interior_and_keeps_edges() {
        let mut surface = Surface::new(3, 3);
        surface.fill_rect(Bounds::new(0, 0, 3, 3), Color::BLACK);
        surface.fill_rect(Bounds::new(1, 1, 1, 1), Color::from_rgb8(90, 90, 90));

        box_blur(surface.image_mut(), 3);
        assert_eq!(surface.pixel(1, 1), Some(Color::from_rgb8(10, 10, 10)));
        assert_eq!(surface.pixel(0, 0), Some(Color::BLACK));
        assert_eq!(surface.pixel(2, 1), Some(Color::BLACK));
    }

    #[test]
    fn test_blur_of_uniform_image_is_identity() {
        let component = sized(12, 12);
        let mut surface = Surface::new(12, 12);
        let mut chain: Vec<Box<dyn Decorator>> = vec![Box::new(BlurDecorator::new(5).unwrap())];
        paint_decorated(&mut chain, &component, &mut surface, |s| {
            s.fill_rect(Bounds::new(0, 0, 12, 12), Color::GREEN);
        });
        for (x, y) in [(0, 0), (6, 6), (11, 11)] {
            assert_eq!(surface.pixel(x, y), Some(Color::GREEN));
        }
    }

    #[test]
    fn test_chain_nests_in_order() {
        let component = sized(4, 4);
        let mut surface = Surface::new(4, 4);
        surface.clear(Color::WHITE);
        let mut chain: Vec<Box<dyn Decorator>> = vec![
            Box::new(FadeDecorator::new(0.0).unwrap()),
            Box::new(BlurDecorator::new(1).unwrap()),
        ];
        paint_decorated(&mut chain, &component, &mut surface, |s| {
            s.fill_rect(Bounds::new(0, 0, 4, 4), Color::BLACK);
        });
        // The outer fade hides everything the inner chain produced.
        assert_eq!(surface.pixel(2, 2), Some(Color::WHITE));
    }

    #[test]
    fn test_invalid_arguments() {
        assert!(matches!(
            BlurDecorator::new(0),
            Err(WidgetError::InvalidArgument(_))
        ));
        assert!(FadeDecorator::new(1.5).is_err());
        assert!(FadeDecorator::new(f32::NAN).is_err());
        assert_eq!(
            BlurDecorator::default().affected_area(&sized(1, 1), Bounds::new(1, 2, 3, 4)),
            Bounds::new(1, 2, 3, 4)
        );
    }
}
