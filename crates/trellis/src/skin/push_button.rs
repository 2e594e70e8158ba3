//! Push button skins and the shared highlighted/pressed state machine.

use trellis_core::logging::targets;
use trellis_render::{Bounds, Color, Insets, Surface};

use super::{
    ComponentStateObserver, ConstrainedVisual, KeyInput, PointerInput, Skin, SkinBase, SkinHost,
    SkinView, Visual, check_model,
};
use crate::component::{Component, ComponentId};
use crate::error::WidgetResult;
use crate::input::{Key, KeyboardModifiers, MouseButton};
use crate::widgets::{Button, ButtonState};

/// Advance of one glyph cell, in pixels.
pub(crate) const GLYPH_WIDTH: u32 = 7;
/// Height of one line of text, in pixels.
pub(crate) const LINE_HEIGHT: u32 = 14;

/// The highlighted/pressed state machine of a push button.
///
/// The two flags vary independently: a button can be pressed from the
/// keyboard without hover, and hovered without being pressed. Every
/// transition requests a repaint. A press fires on SPACE release and on mouse
/// click, never on mouse up.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PushButtonBehavior {
    highlighted: bool,
    pressed: bool,
}

impl PushButtonBehavior {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_highlighted(&self) -> bool {
        self.highlighted
    }

    #[inline]
    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    pub fn enabled_changed(&mut self, host: &mut dyn SkinHost) {
        self.highlighted = false;
        self.pressed = false;
        host.repaint();
    }

    pub fn focused_changed(&mut self, host: &mut dyn SkinHost) {
        self.pressed = false;
        host.repaint();
    }

    pub fn mouse_over(&mut self, host: &mut dyn SkinHost) {
        self.highlighted = true;
        host.repaint();
    }

    pub fn mouse_out(&mut self, host: &mut dyn SkinHost) {
        self.highlighted = false;
        self.pressed = false;
        host.repaint();
    }

    /// Never consumes.
    pub fn mouse_down(&mut self, host: &mut dyn SkinHost) -> bool {
        self.pressed = true;
        host.repaint();
        false
    }

    /// Never consumes.
    pub fn mouse_up(&mut self, host: &mut dyn SkinHost) -> bool {
        self.pressed = false;
        host.repaint();
        false
    }

    /// Take focus if the component accepts it, then press. No repaint.
    pub fn mouse_click(&mut self, host: &mut dyn SkinHost) {
        if host.component().is_focusable() {
            host.request_focus();
        }
        press(host);
    }

    /// Handles SPACE only; other keys are left to the caller.
    pub fn key_pressed(&mut self, host: &mut dyn SkinHost, key: Key) -> bool {
        if key != Key::Space {
            return false;
        }
        self.pressed = true;
        host.repaint();
        true
    }

    /// Handles SPACE only; other keys are left to the caller.
    pub fn key_released(&mut self, host: &mut dyn SkinHost, key: Key) -> bool {
        if key != Key::Space {
            return false;
        }
        self.pressed = false;
        host.repaint();
        press(host);
        true
    }

    pub fn state_changed(&mut self, host: &mut dyn SkinHost) {
        host.repaint();
    }
}

/// Press the host's button.
///
/// Push button skins refuse to install on anything but a [`Button`], so a
/// failure here is a host bug: debug builds panic, release builds log it.
fn press(host: &mut dyn SkinHost) {
    let result = host.press();
    if let Err(error) = &result {
        tracing::error!(target: targets::SKIN, %error, "button press failed");
    }
    debug_assert!(result.is_ok(), "push button skin pressed a non-button component");
}

/// Paint one block per visible glyph cell of `label`.
pub(crate) fn paint_label(surface: &mut Surface, label: &str, x: i32, y: i32, color: Color) {
    let mut cursor = x;
    for ch in label.chars() {
        if !ch.is_whitespace() {
            surface.fill_rect(
                Bounds::new(cursor + 1, y + 3, GLYPH_WIDTH - 2, LINE_HEIGHT - 5),
                color,
            );
        }
        cursor += GLYPH_WIDTH as i32;
    }
}

pub(crate) fn label_width(label: &str) -> u32 {
    label.chars().count() as u32 * GLYPH_WIDTH
}

/// The default push button look: a bordered, filled box with the label
/// centred inside.
#[derive(Debug, Clone)]
pub struct TerraPushButtonSkin {
    base: SkinBase,
    behavior: PushButtonBehavior,
    background_color: Color,
    border_color: Color,
    color: Color,
    disabled_color: Color,
    padding: Insets,
}

impl Default for TerraPushButtonSkin {
    fn default() -> Self {
        Self::new()
    }
}

impl TerraPushButtonSkin {
    pub fn new() -> Self {
        Self {
            base: SkinBase::new(),
            behavior: PushButtonBehavior::new(),
            background_color: Color::from_rgb8(0xDD, 0xDC, 0xD5),
            border_color: Color::from_rgb8(0x99, 0x99, 0x99),
            color: Color::BLACK,
            disabled_color: Color::from_rgb8(0x99, 0x99, 0x99),
            padding: Insets {
                top: 3,
                left: 4,
                bottom: 3,
                right: 4,
            },
        }
    }

    pub fn with_background_color(mut self, color: Color) -> Self {
        self.background_color = color;
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn with_padding(mut self, padding: Insets) -> Self {
        self.padding = padding;
        self
    }

    /// The input state machine.
    pub fn behavior(&self) -> &PushButtonBehavior {
        &self.behavior
    }

    fn fill_color(&self, view: &dyn SkinView, state: ButtonState) -> Color {
        if !view.is_enabled() {
            self.background_color.lighter(0.4)
        } else if self.behavior.is_pressed() || state == ButtonState::Selected {
            self.background_color.darker(0.15)
        } else if self.behavior.is_highlighted() {
            self.background_color.lighter(0.25)
        } else {
            self.background_color
        }
    }
}

impl Visual for TerraPushButtonSkin {
    fn paint(&self, view: &dyn SkinView, surface: &mut Surface) {
        let Ok(button) = view.component().model::<Button>() else {
            return;
        };
        let width = view.width();
        let height = view.height();
        let bounds = Bounds::new(0, 0, width, height);

        surface.fill_rect(bounds, self.fill_color(view, button.state()));
        surface.stroke_rect(bounds, self.border_color, 1);

        if button.state() == ButtonState::Mixed {
            let y = (height / 2) as i32;
            surface.fill_rect(Bounds::new(3, y - 1, width.saturating_sub(6), 2), self.color);
        }

        let text_color = if view.is_enabled() {
            self.color
        } else {
            self.disabled_color
        };
        let text_width = label_width(button.label());
        let x = (width.saturating_sub(text_width) / 2) as i32;
        let y = (height.saturating_sub(LINE_HEIGHT) / 2) as i32;
        paint_label(surface, button.label(), x, y, text_color);

        if view.is_focused() {
            surface.stroke_rect(
                Bounds::new(2, 2, width.saturating_sub(4), height.saturating_sub(4)),
                self.border_color.darker(0.3),
                1,
            );
        }
    }
}

impl ConstrainedVisual for TerraPushButtonSkin {
    fn preferred_width(&self, view: &dyn SkinView, _height: Option<u32>) -> u32 {
        let label = view
            .component()
            .model::<Button>()
            .map(|b| label_width(b.label()))
            .unwrap_or(0);
        label + self.padding.horizontal() + 2
    }

    fn preferred_height(&self, _view: &dyn SkinView, _width: Option<u32>) -> u32 {
        LINE_HEIGHT + self.padding.vertical() + 2
    }
}

impl PointerInput for TerraPushButtonSkin {
    fn mouse_over(&mut self, host: &mut dyn SkinHost) {
        self.behavior.mouse_over(host);
    }

    fn mouse_out(&mut self, host: &mut dyn SkinHost) {
        self.behavior.mouse_out(host);
    }

    fn mouse_down(&mut self, host: &mut dyn SkinHost, _button: MouseButton, _x: i32, _y: i32) -> bool {
        self.behavior.mouse_down(host)
    }

    fn mouse_up(&mut self, host: &mut dyn SkinHost, _button: MouseButton, _x: i32, _y: i32) -> bool {
        self.behavior.mouse_up(host)
    }

    fn mouse_click(&mut self, host: &mut dyn SkinHost, _button: MouseButton, _x: i32, _y: i32, _count: u32) {
        self.behavior.mouse_click(host);
    }
}

impl KeyInput for TerraPushButtonSkin {
    fn key_pressed(&mut self, host: &mut dyn SkinHost, key: Key, modifiers: KeyboardModifiers) -> bool {
        self.behavior.key_pressed(host, key) || self.base.key_pressed(host, key, modifiers)
    }

    fn key_released(&mut self, host: &mut dyn SkinHost, key: Key, modifiers: KeyboardModifiers) -> bool {
        self.behavior.key_released(host, key) || self.base.key_released(host, key, modifiers)
    }
}

impl ComponentStateObserver for TerraPushButtonSkin {
    fn enabled_changed(&mut self, host: &mut dyn SkinHost) {
        self.behavior.enabled_changed(host);
    }

    fn focused_changed(&mut self, host: &mut dyn SkinHost) {
        self.behavior.focused_changed(host);
    }

    fn state_changed(&mut self, host: &mut dyn SkinHost, _previous: ButtonState) {
        self.behavior.state_changed(host);
    }
}

impl Skin for TerraPushButtonSkin {
    fn install(&mut self, id: ComponentId, component: &Component) -> WidgetResult<()> {
        check_model::<Button>(component)?;
        self.base.install(id);
        Ok(())
    }

    fn uninstall(&mut self) {
        self.behavior = PushButtonBehavior::new();
        self.base.uninstall();
    }

    fn component(&self) -> Option<ComponentId> {
        self.base.component()
    }

    fn is_focusable(&self) -> bool {
        true
    }
}

/// A push button drawn as a hyperlink: label only, underlined on hover.
#[derive(Debug, Clone)]
pub struct LinkButtonSkin {
    base: SkinBase,
    behavior: PushButtonBehavior,
    color: Color,
    disabled_color: Color,
}

impl Default for LinkButtonSkin {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkButtonSkin {
    pub fn new() -> Self {
        Self {
            base: SkinBase::new(),
            behavior: PushButtonBehavior::new(),
            color: Color::from_rgb8(0x2C, 0x56, 0x80),
            disabled_color: Color::from_rgb8(0x99, 0x99, 0x99),
        }
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn behavior(&self) -> &PushButtonBehavior {
        &self.behavior
    }
}

impl Visual for LinkButtonSkin {
    fn paint(&self, view: &dyn SkinView, surface: &mut Surface) {
        let Ok(button) = view.component().model::<Button>() else {
            return;
        };
        let color = if view.is_enabled() {
            self.color
        } else {
            self.disabled_color
        };
        paint_label(surface, button.label(), 0, 0, color);

        if self.behavior.is_highlighted() {
            let width = label_width(button.label()).min(view.width());
            surface.fill_rect(Bounds::new(0, LINE_HEIGHT as i32 - 1, width, 1), color);
        }
    }
}

impl ConstrainedVisual for LinkButtonSkin {
    fn preferred_width(&self, view: &dyn SkinView, _height: Option<u32>) -> u32 {
        view.component()
            .model::<Button>()
            .map(|b| label_width(b.label()))
            .unwrap_or(0)
    }

    fn preferred_height(&self, _view: &dyn SkinView, _width: Option<u32>) -> u32 {
        LINE_HEIGHT
    }
}

impl PointerInput for LinkButtonSkin {
    fn mouse_over(&mut self, host: &mut dyn SkinHost) {
        self.behavior.mouse_over(host);
    }

    fn mouse_out(&mut self, host: &mut dyn SkinHost) {
        self.behavior.mouse_out(host);
    }

    fn mouse_down(&mut self, host: &mut dyn SkinHost, _button: MouseButton, _x: i32, _y: i32) -> bool {
        self.behavior.mouse_down(host)
    }

    fn mouse_up(&mut self, host: &mut dyn SkinHost, _button: MouseButton, _x: i32, _y: i32) -> bool {
        self.behavior.mouse_up(host)
    }

    fn mouse_click(&mut self, host: &mut dyn SkinHost, _button: MouseButton, _x: i32, _y: i32, _count: u32) {
        self.behavior.mouse_click(host);
    }
}

impl KeyInput for LinkButtonSkin {
    fn key_pressed(&mut self, host: &mut dyn SkinHost, key: Key, modifiers: KeyboardModifiers) -> bool {
        self.behavior.key_pressed(host, key) || self.base.key_pressed(host, key, modifiers)
    }

    fn key_released(&mut self, host: &mut dyn SkinHost, key: Key, modifiers: KeyboardModifiers) -> bool {
        self.behavior.key_released(host, key) || self.base.key_released(host, key, modifiers)
    }
}

impl ComponentStateObserver for LinkButtonSkin {
    fn enabled_changed(&mut self, host: &mut dyn SkinHost) {
        self.behavior.enabled_changed(host);
    }

    fn focused_changed(&mut self, host: &mut dyn SkinHost) {
        self.behavior.focused_changed(host);
    }

    fn state_changed(&mut self, host: &mut dyn SkinHost, _previous: ButtonState) {
        self.behavior.state_changed(host);
    }
}

impl Skin for LinkButtonSkin {
    fn install(&mut self, id: ComponentId, component: &Component) -> WidgetResult<()> {
        check_model::<Button>(component)?;
        self.base.install(id);
        Ok(())
    }

    fn uninstall(&mut self) {
        self.behavior = PushButtonBehavior::new();
        self.base.uninstall();
    }

    fn component(&self) -> Option<ComponentId> {
        self.base.component()
    }
}
