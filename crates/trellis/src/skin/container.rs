//! Container skins.

use trellis_render::{Bounds, Color, Insets, Surface};

use super::{
    ComponentStateObserver, ConstrainedVisual, KeyInput, PointerInput, Skin, SkinBase, SkinHost,
    SkinView, Visual, check_model,
};
use crate::component::{Component, ComponentId};
use crate::error::WidgetResult;
use crate::widgets::Panel;

fn visible_children(view: &dyn SkinView) -> Vec<ComponentId> {
    view.children()
        .into_iter()
        .filter(|&child| view.child(child).is_some_and(Component::is_visible))
        .collect()
}

/// Skin for a panel whose children are positioned by hand.
///
/// Paints an optional background; layout leaves children where they are.
#[derive(Debug, Clone, Default)]
pub struct PanelSkin {
    base: SkinBase,
    background_color: Option<Color>,
}

impl PanelSkin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_background_color(mut self, color: Color) -> Self {
        self.background_color = Some(color);
        self
    }

    pub fn background_color(&self) -> Option<Color> {
        self.background_color
    }
}

impl Visual for PanelSkin {
    fn paint(&self, view: &dyn SkinView, surface: &mut Surface) {
        if let Some(color) = self.background_color {
            surface.fill_rect(Bounds::new(0, 0, view.width(), view.height()), color);
        }
    }
}

impl ConstrainedVisual for PanelSkin {
    /// The right-most edge of any visible child.
    fn preferred_width(&self, view: &dyn SkinView, _height: Option<u32>) -> u32 {
        visible_children(view)
            .into_iter()
            .filter_map(|child| view.child(child))
            .map(|child| child.bounds().right().max(0) as u32)
            .max()
            .unwrap_or(0)
    }

    /// The bottom-most edge of any visible child.
    fn preferred_height(&self, view: &dyn SkinView, _width: Option<u32>) -> u32 {
        visible_children(view)
            .into_iter()
            .filter_map(|child| view.child(child))
            .map(|child| child.bounds().bottom().max(0) as u32)
            .max()
            .unwrap_or(0)
    }
}

impl PointerInput for PanelSkin {}

impl KeyInput for PanelSkin {}

impl ComponentStateObserver for PanelSkin {}

impl Skin for PanelSkin {
    fn install(&mut self, id: ComponentId, component: &Component) -> WidgetResult<()> {
        check_model::<Panel>(component)?;
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

/// Axis along which a [`BoxPaneSkin`] stacks its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    Horizontal,
    Vertical,
}

/// Skin that stacks a panel's visible children in a row or a column.
///
/// Each child gets its preferred length along the axis and the full inner
/// extent across it.
#[derive(Debug, Clone)]
pub struct BoxPaneSkin {
    base: SkinBase,
    orientation: Orientation,
    spacing: u32,
    padding: Insets,
    background_color: Option<Color>,
}

impl Default for BoxPaneSkin {
    fn default() -> Self {
        Self::new(Orientation::Horizontal)
    }
}

impl BoxPaneSkin {
    pub fn new(orientation: Orientation) -> Self {
        Self {
            base: SkinBase::new(),
            orientation,
            spacing: 4,
            padding: Insets::NONE,
            background_color: None,
        }
    }

    pub fn with_spacing(mut self, spacing: u32) -> Self {
        self.spacing = spacing;
        self
    }

    pub fn with_padding(mut self, padding: Insets) -> Self {
        self.padding = padding;
        self
    }

    pub fn with_background_color(mut self, color: Color) -> Self {
        self.background_color = Some(color);
        self
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn spacing(&self) -> u32 {
        self.spacing
    }

    fn gaps(&self, count: usize) -> u32 {
        self.spacing * count.saturating_sub(1) as u32
    }
}

impl Visual for BoxPaneSkin {
    fn paint(&self, view: &dyn SkinView, surface: &mut Surface) {
        if let Some(color) = self.background_color {
            surface.fill_rect(Bounds::new(0, 0, view.width(), view.height()), color);
        }
    }
}

impl ConstrainedVisual for BoxPaneSkin {
    fn preferred_width(&self, view: &dyn SkinView, _height: Option<u32>) -> u32 {
        let children = visible_children(view);
        let widths = children.iter().map(|&child| view.preferred_size_of(child).width);
        let content = match self.orientation {
            Orientation::Horizontal => widths.sum::<u32>() + self.gaps(children.len()),
            Orientation::Vertical => widths.max().unwrap_or(0),
        };
        content + self.padding.horizontal()
    }

    fn preferred_height(&self, view: &dyn SkinView, _width: Option<u32>) -> u32 {
        let children = visible_children(view);
        let heights = children.iter().map(|&child| view.preferred_size_of(child).height);
        let content = match self.orientation {
            Orientation::Horizontal => heights.max().unwrap_or(0),
            Orientation::Vertical => heights.sum::<u32>() + self.gaps(children.len()),
        };
        content + self.padding.vertical()
    }
}

impl PointerInput for BoxPaneSkin {}

impl KeyInput for BoxPaneSkin {}

impl ComponentStateObserver for BoxPaneSkin {}

impl Skin for BoxPaneSkin {
    fn install(&mut self, id: ComponentId, component: &Component) -> WidgetResult<()> {
        check_model::<Panel>(component)?;
        self.base.install(id);
        Ok(())
    }

    fn uninstall(&mut self) {
        self.base.uninstall();
    }

    fn component(&self) -> Option<ComponentId> {
        self.base.component()
    }

    fn layout(&mut self, host: &mut dyn SkinHost) {
        let inner_width = host.width().saturating_sub(self.padding.horizontal());
        let inner_height = host.height().saturating_sub(self.padding.vertical());
        let mut x = self.padding.left as i32;
        let mut y = self.padding.top as i32;

        for child in visible_children(&*host) {
            let preferred = host.preferred_size_of(child);
            let bounds = match self.orientation {
                Orientation::Horizontal => {
                    let bounds = Bounds::new(x, y, preferred.width, inner_height);
                    x += (preferred.width + self.spacing) as i32;
                    bounds
                }
                Orientation::Vertical => {
                    let bounds = Bounds::new(x, y, inner_width, preferred.height);
                    y += (preferred.height + self.spacing) as i32;
                    bounds
                }
            };
            host.set_child_bounds(child, bounds);
        }
    }
}
