use trellis_render::{Bounds, Color, Surface};

use super::{
    ComponentStateObserver, ConstrainedVisual, KeyInput, PointerInput, Skin, SkinBase, SkinView,
    Visual, check_model,
};
use crate::component::{Component, ComponentId};
use crate::error::{WidgetError, WidgetResult};
use crate::widgets::ImageView;

/// Paints an image view's image centred in the component.
///
/// The preferred size is the image's size, or zero without an image.
#[derive(Debug, Clone)]
pub struct ImageViewSkin {
    base: SkinBase,
    background_color: Option<Color>,
    opacity: f32,
}

impl Default for ImageViewSkin {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageViewSkin {
    pub fn new() -> Self {
        Self {
            base: SkinBase::new(),
            background_color: None,
            opacity: 1.0,
        }
    }

    pub fn with_background_color(mut self, color: Color) -> Self {
        self.background_color = Some(color);
        self
    }

    /// Draw the image with the given opacity in `0.0..=1.0`.
    pub fn with_opacity(mut self, opacity: f32) -> WidgetResult<Self> {
        if !(0.0..=1.0).contains(&opacity) {
            return Err(WidgetError::invalid(format!(
                "opacity must be between 0 and 1, got {opacity}"
            )));
        }
        self.opacity = opacity;
        Ok(self)
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }
}

impl Visual for ImageViewSkin {
    fn paint(&self, view: &dyn SkinView, surface: &mut Surface) {
        if let Some(color) = self.background_color {
            surface.fill_rect(Bounds::new(0, 0, view.width(), view.height()), color);
        }
        let Some(image) = view
            .component()
            .model::<ImageView>()
            .ok()
            .and_then(ImageView::image)
        else {
            return;
        };
        let x = (view.width() as i32 - image.width() as i32) / 2;
        let y = (view.height() as i32 - image.height() as i32) / 2;
        surface.draw_image_with_opacity(image, x, y, self.opacity);
    }
}

impl ConstrainedVisual for ImageViewSkin {
    fn preferred_width(&self, view: &dyn SkinView, _height: Option<u32>) -> u32 {
        view.component()
            .model::<ImageView>()
            .ok()
            .and_then(ImageView::image)
            .map_or(0, |image| image.width())
    }

    fn preferred_height(&self, view: &dyn SkinView, _width: Option<u32>) -> u32 {
        view.component()
            .model::<ImageView>()
            .ok()
            .and_then(ImageView::image)
            .map_or(0, |image| image.height())
    }
}

impl PointerInput for ImageViewSkin {}

impl KeyInput for ImageViewSkin {}

impl ComponentStateObserver for ImageViewSkin {}

impl Skin for ImageViewSkin {
    fn install(&mut self, id: ComponentId, component: &Component) -> WidgetResult<()> {
        check_model::<ImageView>(component)?;
        self.base.install(id);
        Ok(())
    }

    fn uninstall(&mut self) {
        self.base.uninstall();
    }

    fn component(&self) -> Option<ComponentId> {
        self.base.component()
    }
}
