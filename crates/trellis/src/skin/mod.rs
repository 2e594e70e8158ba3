//! Skins: pluggable renderers and input handlers.
//!
//! A skin is the view and controller of exactly one component. Rather than a
//! deep class hierarchy, the skin contract is split into small capability
//! traits that a concrete skin implements and combines:
//!
//! | Trait | Responsibility |
//! |---|---|
//! | [`Visual`] | painting |
//! | [`ConstrainedVisual`] | preferred size, optionally under a constraint |
//! | [`PointerInput`] | mouse movement, buttons and wheel |
//! | [`KeyInput`] | keyboard |
//! | [`ComponentStateObserver`] | enabled/focus/state/model changes |
//! | [`Skin`] | install/uninstall lifecycle, layout, focusability |
//!
//! Skins never see operating-system input. The component tree forwards
//! calls to them and hands them a [`SkinHost`] through which they reach back
//! to their component (repaint, focus, press, ...). Because the host is a
//! trait, a skin can be driven directly in tests with a mock host.
//!
//! Shared behaviour is composed rather than inherited: [`SkinBase`] carries
//! install bookkeeping and base key handling, and
//! [`PushButtonBehavior`] carries the push button state machine.

mod container;
mod file_browser;
mod image_view;
mod push_button;

use std::any::Any;

use trellis_core::logging::targets;
use trellis_render::{Bounds, Dimensions, Surface};

use crate::component::{Component, ComponentId};
use crate::error::{WidgetError, WidgetResult};
use crate::input::{FocusDirection, Key, KeyboardModifiers, MouseButton, ScrollType};
use crate::tree::ComponentTree;
use crate::widgets::ButtonState;

pub use container::{BoxPaneSkin, Orientation, PanelSkin};
pub use file_browser::{FileEntry, TerraFileBrowserSkin};
pub use image_view::ImageViewSkin;
pub use push_button::{LinkButtonSkin, PushButtonBehavior, TerraPushButtonSkin};

/// A deferred mutation of the component tree posted by a skin.
pub type TreeTask = Box<dyn FnOnce(&mut ComponentTree)>;

/// Read-only access to the component a skin is attached to.
///
/// Used for painting and preferred-size queries.
pub trait SkinView {
    /// Id of the component.
    fn component_id(&self) -> ComponentId;

    /// The component itself.
    fn component(&self) -> &Component;

    /// Another component in the same tree, if it is a child of this one.
    fn child(&self, child: ComponentId) -> Option<&Component>;

    /// Preferred size of a child component, as reported by its skin.
    fn preferred_size_of(&self, child: ComponentId) -> Dimensions;

    fn width(&self) -> u32 {
        self.component().width()
    }

    fn height(&self) -> u32 {
        self.component().height()
    }

    fn is_enabled(&self) -> bool {
        self.component().is_enabled()
    }

    fn is_focused(&self) -> bool {
        self.component().is_focused()
    }

    fn children(&self) -> Vec<ComponentId> {
        self.component().children().to_vec()
    }
}

/// Mutable access to the component a skin is attached to.
///
/// Passed to every input, state and layout callback.
pub trait SkinHost: SkinView {
    /// Request a repaint of the whole component.
    fn repaint(&mut self);

    /// Request a repaint of part of the component.
    fn repaint_area(&mut self, area: Bounds);

    /// Mark the component's layout as stale.
    fn invalidate(&mut self);

    /// Ask for keyboard focus. Returns whether the component now has it.
    fn request_focus(&mut self) -> bool;

    /// Move keyboard focus to the next or previous focusable component.
    fn transfer_focus(&mut self, direction: FocusDirection) -> bool;

    /// Fire the component's press action.
    ///
    /// Fails with [`WidgetError::TypeMismatch`](crate::WidgetError::TypeMismatch)
    /// when the component is not a button.
    fn press(&mut self) -> WidgetResult<()>;

    /// Position a child of this component.
    fn set_child_bounds(&mut self, child: ComponentId, bounds: Bounds);

    /// Run `task` against the tree once the current dispatch has finished.
    fn post_task(&mut self, task: TreeTask);
}

/// Anything paintable.
pub trait Visual {
    /// Paint onto `surface`, whose origin is the component's top-left corner.
    fn paint(&self, view: &dyn SkinView, surface: &mut Surface);
}

/// A [`Visual`] with a preferred size.
///
/// A constraint of `None` means unconstrained.
pub trait ConstrainedVisual: Visual {
    fn preferred_width(&self, view: &dyn SkinView, height: Option<u32>) -> u32;

    fn preferred_height(&self, view: &dyn SkinView, width: Option<u32>) -> u32;

    fn preferred_size(&self, view: &dyn SkinView) -> Dimensions {
        Dimensions::new(
            self.preferred_width(view, None),
            self.preferred_height(view, None),
        )
    }
}

/// Mouse input forwarded by the component.
///
/// Methods returning `bool` report whether the event was consumed.
pub trait PointerInput {
    fn mouse_move(&mut self, _host: &mut dyn SkinHost, _x: i32, _y: i32) -> bool {
        false
    }

    fn mouse_over(&mut self, _host: &mut dyn SkinHost) {}

    fn mouse_out(&mut self, _host: &mut dyn SkinHost) {}

    fn mouse_down(&mut self, _host: &mut dyn SkinHost, _button: MouseButton, _x: i32, _y: i32) -> bool {
        false
    }

    fn mouse_up(&mut self, _host: &mut dyn SkinHost, _button: MouseButton, _x: i32, _y: i32) -> bool {
        false
    }

    fn mouse_click(
        &mut self,
        _host: &mut dyn SkinHost,
        _button: MouseButton,
        _x: i32,
        _y: i32,
        _count: u32,
    ) {
    }

    fn mouse_wheel(
        &mut self,
        _host: &mut dyn SkinHost,
        _scroll_type: ScrollType,
        _amount: i32,
        _rotation: i32,
        _x: i32,
        _y: i32,
    ) -> bool {
        false
    }
}

/// Keyboard input forwarded by the component.
pub trait KeyInput {
    fn key_typed(&mut self, _host: &mut dyn SkinHost, _character: char) -> bool {
        false
    }

    fn key_pressed(&mut self, _host: &mut dyn SkinHost, _key: Key, _modifiers: KeyboardModifiers) -> bool {
        false
    }

    fn key_released(
        &mut self,
        _host: &mut dyn SkinHost,
        _key: Key,
        _modifiers: KeyboardModifiers,
    ) -> bool {
        false
    }
}

/// Component state changes forwarded to the skin.
pub trait ComponentStateObserver {
    fn enabled_changed(&mut self, _host: &mut dyn SkinHost) {}

    fn focused_changed(&mut self, _host: &mut dyn SkinHost) {}

    /// A button's selection state changed.
    fn state_changed(&mut self, _host: &mut dyn SkinHost, _previous: ButtonState) {}

    /// Widget content (label, image, folder, ...) changed.
    fn model_changed(&mut self, host: &mut dyn SkinHost) {
        host.invalidate();
        host.repaint();
    }
}

/// The complete skin contract.
pub trait Skin: ConstrainedVisual + PointerInput + KeyInput + ComponentStateObserver + Any {
    /// Bind the skin to a component.
    ///
    /// Fails with a type mismatch when the component's model is not one the
    /// skin can render. The tree always uninstalls the previous skin first.
    fn install(&mut self, id: ComponentId, component: &Component) -> WidgetResult<()>;

    /// Clear the back-reference and release cached resources.
    fn uninstall(&mut self);

    /// The component the skin is installed on.
    fn component(&self) -> Option<ComponentId>;

    /// Lay out children. No-op for components that are not containers.
    fn layout(&mut self, _host: &mut dyn SkinHost) {}

    fn is_focusable(&self) -> bool {
        false
    }

    /// Concrete type name, for diagnostics and type mismatch errors.
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Notifications that may have to wait for a busy skin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SkinNotice {
    EnabledChanged,
    FocusedChanged,
    StateChanged(ButtonState),
    ModelChanged,
}

impl SkinNotice {
    pub(crate) fn deliver(self, skin: &mut dyn Skin, host: &mut dyn SkinHost) {
        match self {
            SkinNotice::EnabledChanged => skin.enabled_changed(host),
            SkinNotice::FocusedChanged => skin.focused_changed(host),
            SkinNotice::StateChanged(previous) => skin.state_changed(host, previous),
            SkinNotice::ModelChanged => skin.model_changed(host),
        }
    }
}

/// Fail with a type mismatch unless the component's model is a `T`.
pub(crate) fn check_model<T: Any>(component: &Component) -> WidgetResult<()> {
    if component.is::<T>() {
        Ok(())
    } else {
        Err(WidgetError::TypeMismatch {
            expected: std::any::type_name::<T>(),
            actual: component.model_type(),
        })
    }
}

/// Bookkeeping and base behaviour shared by every concrete skin.
#[derive(Debug, Default, Clone)]
pub struct SkinBase {
    component: Option<ComponentId>,
}

impl SkinBase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the owning component.
    pub fn install(&mut self, id: ComponentId) {
        tracing::debug!(target: targets::SKIN, component = ?id, "skin installed");
        self.component = Some(id);
    }

    /// Forget the owning component.
    pub fn uninstall(&mut self) {
        if let Some(id) = self.component.take() {
            tracing::debug!(target: targets::SKIN, component = ?id, "skin uninstalled");
        }
    }

    #[inline]
    pub fn component(&self) -> Option<ComponentId> {
        self.component
    }

    /// Base key handling: Tab and Shift+Tab move focus and are consumed.
    pub fn key_pressed(&mut self, host: &mut dyn SkinHost, key: Key, modifiers: KeyboardModifiers) -> bool {
        if key == Key::Tab && host.is_focused() {
            let direction = if modifiers.shift {
                FocusDirection::Backward
            } else {
                FocusDirection::Forward
            };
            host.transfer_focus(direction);
            return true;
        }
        false
    }

    /// Base key handling for releases: nothing is consumed.
    pub fn key_released(&mut self, _host: &mut dyn SkinHost, _key: Key, _modifiers: KeyboardModifiers) -> bool {
        false
    }
}

/// A host double for driving skins without a tree.
#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::widgets::Button;

    #[derive(Debug)]
    pub(crate) struct MockHost {
        pub id: ComponentId,
        pub component: Component,
        pub repaints: u32,
        pub invalidations: u32,
        pub focus_requests: u32,
        pub presses: u32,
        pub transfers: Vec<FocusDirection>,
        pub child_bounds: Vec<(ComponentId, Bounds)>,
        pub tasks: Vec<String>,
        pub grant_focus: bool,
    }

    impl MockHost {
        pub fn new(component: Component) -> Self {
            Self {
                id: ComponentId::default(),
                component,
                repaints: 0,
                invalidations: 0,
                focus_requests: 0,
                presses: 0,
                transfers: Vec::new(),
                child_bounds: Vec::new(),
                tasks: Vec::new(),
                grant_focus: true,
            }
        }

        pub fn focused(mut self) -> Self {
            self.component.focused = true;
            self
        }

        pub fn focusable(mut self, focusable: bool) -> Self {
            self.component.focusable = focusable;
            self
        }
    }

    impl SkinView for MockHost {
        fn component_id(&self) -> ComponentId {
            self.id
        }

        fn component(&self) -> &Component {
            &self.component
        }

        fn child(&self, _child: ComponentId) -> Option<&Component> {
            None
        }

        fn preferred_size_of(&self, _child: ComponentId) -> Dimensions {
            Dimensions::new(10, 10)
        }
    }

    impl SkinHost for MockHost {
        fn repaint(&mut self) {
            self.repaints += 1;
        }

        fn repaint_area(&mut self, _area: Bounds) {
            self.repaints += 1;
        }

        fn invalidate(&mut self) {
            self.invalidations += 1;
        }

        fn request_focus(&mut self) -> bool {
            self.focus_requests += 1;
            if self.grant_focus {
                self.component.focused = true;
            }
            self.grant_focus
        }

        fn transfer_focus(&mut self, direction: FocusDirection) -> bool {
            self.transfers.push(direction);
            true
        }

        fn press(&mut self) -> WidgetResult<()> {
            if !self.component.is::<Button>() {
                return Err(WidgetError::TypeMismatch {
                    expected: std::any::type_name::<Button>(),
                    actual: self.component.model_type(),
                });
            }
            self.presses += 1;
            Ok(())
        }

        fn set_child_bounds(&mut self, child: ComponentId, bounds: Bounds) {
            self.child_bounds.push((child, bounds));
        }

        fn post_task(&mut self, _task: TreeTask) {
            self.tasks.push("task".to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::MockHost;
    use super::*;

    #[test]
    fn test_skin_base_tab_transfers_focus() {
        let mut base = SkinBase::new();
        let mut host = MockHost::new(Component::new(())).focused();

        assert!(base.key_pressed(&mut host, Key::Tab, KeyboardModifiers::NONE));
        assert!(base.key_pressed(&mut host, Key::Tab, KeyboardModifiers::SHIFT));
        assert_eq!(
            host.transfers,
            vec![FocusDirection::Forward, FocusDirection::Backward]
        );
    }

    #[test]
    fn test_skin_base_ignores_other_keys() {
        let mut base = SkinBase::new();
        let mut host = MockHost::new(Component::new(())).focused();

        assert!(!base.key_pressed(&mut host, Key::Enter, KeyboardModifiers::NONE));
        assert!(!base.key_released(&mut host, Key::Tab, KeyboardModifiers::NONE));
        assert!(host.transfers.is_empty());
    }

    #[test]
    fn test_skin_base_unfocused_tab_not_consumed() {
        let mut base = SkinBase::new();
        let mut host = MockHost::new(Component::new(()));
        assert!(!base.key_pressed(&mut host, Key::Tab, KeyboardModifiers::NONE));
    }

    #[test]
    fn test_skin_base_install_uninstall() {
        let mut base = SkinBase::new();
        assert_eq!(base.component(), None);
        base.install(ComponentId::default());
        assert_eq!(base.component(), Some(ComponentId::default()));
        base.uninstall();
        assert_eq!(base.component(), None);
    }
}
