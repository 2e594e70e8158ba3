//! Component-level listener interfaces.
//!
//! Every method has a default implementation, so a listener only implements
//! what it cares about. Methods that return `bool` belong to consumable
//! categories: returning `true` consumes the event and stops it from bubbling
//! further up the parent chain. The other methods are pure notifications.
//!
//! Listeners receive the [`ComponentId`] whose list they are registered on,
//! with coordinates in that component's space. They cannot touch the tree
//! during a broadcast; work that needs to mutate it is posted to the tree's
//! [`TaskQueue`](trellis_core::TaskQueue).

use trellis_core::ListenerList;

use crate::component::ComponentId;
use crate::input::{Key, KeyboardModifiers, MouseButton, ScrollType};

/// Component attribute changes.
pub trait ComponentStateListener {
    /// The enabled flag changed.
    fn enabled_changed(&self, _component: ComponentId) {}

    /// The component gained or lost keyboard focus.
    fn focused_changed(&self, _component: ComponentId, _focused: bool) {}

    /// The visible flag changed.
    fn visible_changed(&self, _component: ComponentId) {}
}

/// Pointer movement over a component.
pub trait ComponentMouseListener {
    /// The pointer moved. Consumable.
    fn mouse_move(&self, _component: ComponentId, _x: i32, _y: i32) -> bool {
        false
    }

    /// The pointer entered the component.
    fn mouse_over(&self, _component: ComponentId) {}

    /// The pointer left the component.
    fn mouse_out(&self, _component: ComponentId) {}
}

/// Mouse button presses.
pub trait ComponentMouseButtonListener {
    /// A button went down. Consumable.
    fn mouse_down(&self, _component: ComponentId, _button: MouseButton, _x: i32, _y: i32) -> bool {
        false
    }

    /// A button went up. Consumable.
    fn mouse_up(&self, _component: ComponentId, _button: MouseButton, _x: i32, _y: i32) -> bool {
        false
    }

    /// A button was pressed and released over the same component.
    fn mouse_click(
        &self,
        _component: ComponentId,
        _button: MouseButton,
        _x: i32,
        _y: i32,
        _count: u32,
    ) {
    }
}

/// Mouse wheel movement.
pub trait ComponentMouseWheelListener {
    /// The wheel moved. Consumable.
    fn mouse_wheel(
        &self,
        _component: ComponentId,
        _scroll_type: ScrollType,
        _amount: i32,
        _rotation: i32,
        _x: i32,
        _y: i32,
    ) -> bool {
        false
    }
}

/// Keyboard input.
pub trait ComponentKeyListener {
    /// A character was typed. Consumable.
    fn key_typed(&self, _component: ComponentId, _character: char) -> bool {
        false
    }

    /// A key went down. Consumable.
    fn key_pressed(&self, _component: ComponentId, _key: Key, _modifiers: KeyboardModifiers) -> bool {
        false
    }

    /// A key went up. Consumable.
    fn key_released(
        &self,
        _component: ComponentId,
        _key: Key,
        _modifiers: KeyboardModifiers,
    ) -> bool {
        false
    }
}

/// The listener lists every component carries.
#[derive(Debug, Default)]
pub struct ComponentListeners {
    pub state: ListenerList<dyn ComponentStateListener>,
    pub mouse: ListenerList<dyn ComponentMouseListener>,
    pub mouse_button: ListenerList<dyn ComponentMouseButtonListener>,
    pub mouse_wheel: ListenerList<dyn ComponentMouseWheelListener>,
    pub key: ListenerList<dyn ComponentKeyListener>,
}
