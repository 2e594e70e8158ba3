//! Buttons.
//!
//! A [`Button`] has a label and, when it is a toggle button, a selection
//! [`ButtonState`]. Pressing a toggle button advances the state before the
//! press listeners are notified.

use std::fmt;

use trellis_core::ListenerList;
use trellis_core::logging::targets;

use crate::component::ComponentId;
use crate::error::{WidgetError, WidgetResult};
use crate::skin::SkinNotice;
use crate::tree::ComponentTree;

/// Selection state of a toggle button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ButtonState {
    Selected,
    #[default]
    Unselected,
    /// Neither selected nor unselected. Only tri-state buttons reach it.
    Mixed,
}

/// Notified when a button is pressed.
pub trait ButtonPressListener {
    fn button_pressed(&self, button: ComponentId);
}

/// Notified when a toggle button's state changes.
pub trait ButtonStateListener {
    fn state_changed(&self, button: ComponentId, previous: ButtonState);
}

/// Notified when a button's configuration changes.
pub trait ButtonListener {
    fn label_changed(&self, _button: ComponentId, _previous: &str) {}

    fn toggle_button_changed(&self, _button: ComponentId) {}

    fn tri_state_changed(&self, _button: ComponentId) {}

    fn selected_key_changed(&self, _button: ComponentId, _previous: Option<&str>) {}
}

/// Model of a button.
pub struct Button {
    label: String,
    toggle: bool,
    tri_state: bool,
    state: ButtonState,
    selected_key: Option<String>,
    press_listeners: ListenerList<dyn ButtonPressListener>,
    state_listeners: ListenerList<dyn ButtonStateListener>,
    button_listeners: ListenerList<dyn ButtonListener>,
}

impl Button {
    /// Create a push button.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            toggle: false,
            tri_state: false,
            state: ButtonState::Unselected,
            selected_key: None,
            press_listeners: ListenerList::new(),
            state_listeners: ListenerList::new(),
            button_listeners: ListenerList::new(),
        }
    }

    /// Create a toggle button.
    pub fn toggle(label: impl Into<String>) -> Self {
        Self {
            toggle: true,
            ..Self::new(label)
        }
    }

    /// Create a tri-state toggle button.
    pub fn tri_state(label: impl Into<String>) -> Self {
        Self {
            toggle: true,
            tri_state: true,
            ..Self::new(label)
        }
    }

    /// Bind the selection state to a key when loading and storing.
    pub fn with_selected_key(mut self, key: impl Into<String>) -> Self {
        self.selected_key = Some(key.into());
        self
    }

    #[inline]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[inline]
    pub fn is_toggle_button(&self) -> bool {
        self.toggle
    }

    #[inline]
    pub fn is_tri_state(&self) -> bool {
        self.tri_state
    }

    #[inline]
    pub fn state(&self) -> ButtonState {
        self.state
    }

    #[inline]
    pub fn is_selected(&self) -> bool {
        self.state == ButtonState::Selected
    }

    pub fn selected_key(&self) -> Option<&str> {
        self.selected_key.as_deref()
    }

    pub fn press_listeners(&self) -> &ListenerList<dyn ButtonPressListener> {
        &self.press_listeners
    }

    pub fn state_listeners(&self) -> &ListenerList<dyn ButtonStateListener> {
        &self.state_listeners
    }

    pub fn button_listeners(&self) -> &ListenerList<dyn ButtonListener> {
        &self.button_listeners
    }

    /// The state a press moves a toggle button to.
    fn next_state(&self) -> ButtonState {
        match (self.state, self.tri_state) {
            (ButtonState::Selected, _) => ButtonState::Unselected,
            (ButtonState::Unselected, true) => ButtonState::Mixed,
            (ButtonState::Unselected, false) | (ButtonState::Mixed, _) => ButtonState::Selected,
        }
    }
}

impl fmt::Debug for Button {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Button")
            .field("label", &self.label)
            .field("toggle", &self.toggle)
            .field("tri_state", &self.tri_state)
            .field("state", &self.state)
            .field("selected_key", &self.selected_key)
            .finish()
    }
}

impl ComponentTree {
    /// Fire a button's press action.
    ///
    /// A toggle button advances its state first. Fails with a type mismatch
    /// when the component is not a button.
    pub fn press(&mut self, id: ComponentId) -> WidgetResult<()> {
        let button = self.model::<Button>(id)?;
        if button.toggle {
            let next = button.next_state();
            self.change_button_state(id, next)?;
        }

        tracing::debug!(target: targets::COMPONENT, component = ?id, "button pressed");
        let listeners = self.model::<Button>(id)?.press_listeners.snapshot();
        for listener in listeners {
            listener.button_pressed(id);
        }
        Ok(())
    }

    /// Set the state of a toggle button.
    pub fn set_button_state(&mut self, id: ComponentId, state: ButtonState) -> WidgetResult<()> {
        let button = self.model::<Button>(id)?;
        if !button.toggle {
            return Err(WidgetError::invalid("button is not a toggle button"));
        }
        if state == ButtonState::Mixed && !button.tri_state {
            return Err(WidgetError::invalid("button is not a tri-state button"));
        }
        self.change_button_state(id, state)
    }

    /// Select or deselect a toggle button.
    pub fn set_selected(&mut self, id: ComponentId, selected: bool) -> WidgetResult<()> {
        let state = if selected {
            ButtonState::Selected
        } else {
            ButtonState::Unselected
        };
        self.set_button_state(id, state)
    }

    pub fn set_label(&mut self, id: ComponentId, label: impl Into<String>) -> WidgetResult<()> {
        let label = label.into();
        let button = self.model_mut::<Button>(id)?;
        if button.label == label {
            return Ok(());
        }
        let previous = std::mem::replace(&mut button.label, label);
        let listeners = button.button_listeners.snapshot();
        for listener in listeners {
            listener.label_changed(id, &previous);
        }
        self.notify_skin(id, SkinNotice::ModelChanged);
        Ok(())
    }

    /// Turn toggle behaviour on or off.
    ///
    /// Turning it off also turns off tri-state and deselects the button.
    pub fn set_toggle_button(&mut self, id: ComponentId, toggle: bool) -> WidgetResult<()> {
        let button = self.model_mut::<Button>(id)?;
        if button.toggle == toggle {
            return Ok(());
        }
        if !toggle {
            self.set_tri_state(id, false)?;
            self.change_button_state(id, ButtonState::Unselected)?;
        }
        let button = self.model_mut::<Button>(id)?;
        button.toggle = toggle;
        let listeners = button.button_listeners.snapshot();
        for listener in listeners {
            listener.toggle_button_changed(id);
        }
        self.notify_skin(id, SkinNotice::ModelChanged);
        Ok(())
    }

    /// Turn tri-state behaviour on or off. Requires a toggle button.
    pub fn set_tri_state(&mut self, id: ComponentId, tri_state: bool) -> WidgetResult<()> {
        let button = self.model_mut::<Button>(id)?;
        if button.tri_state == tri_state {
            return Ok(());
        }
        if tri_state && !button.toggle {
            return Err(WidgetError::invalid("tri-state requires a toggle button"));
        }
        if !tri_state && button.state == ButtonState::Mixed {
            self.change_button_state(id, ButtonState::Unselected)?;
        }
        let button = self.model_mut::<Button>(id)?;
        button.tri_state = tri_state;
        let listeners = button.button_listeners.snapshot();
        for listener in listeners {
            listener.tri_state_changed(id);
        }
        Ok(())
    }

    pub fn set_selected_key(&mut self, id: ComponentId, key: Option<String>) -> WidgetResult<()> {
        let button = self.model_mut::<Button>(id)?;
        if button.selected_key == key {
            return Ok(());
        }
        let previous = std::mem::replace(&mut button.selected_key, key);
        let listeners = button.button_listeners.snapshot();
        for listener in listeners {
            listener.selected_key_changed(id, previous.as_deref());
        }
        Ok(())
    }

    fn change_button_state(&mut self, id: ComponentId, state: ButtonState) -> WidgetResult<()> {
        let button = self.model_mut::<Button>(id)?;
        if button.state == state {
            return Ok(());
        }
        let previous = std::mem::replace(&mut button.state, state);
        tracing::debug!(
            target: targets::COMPONENT,
            component = ?id,
            ?previous,
            ?state,
            "button state changed"
        );
        let listeners = button.state_listeners.snapshot();
        for listener in listeners {
            listener.state_changed(id, previous);
        }
        self.notify_skin(id, SkinNotice::StateChanged(previous));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::Component;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Recorder {
        events: RefCell<Vec<String>>,
    }

    impl ButtonPressListener for Recorder {
        fn button_pressed(&self, _button: ComponentId) {
            self.events.borrow_mut().push("pressed".into());
        }
    }

    impl ButtonStateListener for Recorder {
        fn state_changed(&self, _button: ComponentId, previous: ButtonState) {
            self.events.borrow_mut().push(format!("state from {previous:?}"));
        }
    }

    impl ButtonListener for Recorder {
        fn label_changed(&self, _button: ComponentId, previous: &str) {
            self.events.borrow_mut().push(format!("label from {previous}"));
        }
    }

    fn watched(tree: &mut ComponentTree, button: Button) -> (ComponentId, Rc<Recorder>) {
        let recorder = Rc::new(Recorder::default());
        let press: Rc<dyn ButtonPressListener> = recorder.clone();
        let state: Rc<dyn ButtonStateListener> = recorder.clone();
        let config: Rc<dyn ButtonListener> = recorder.clone();
        button.press_listeners().add(&press);
        button.state_listeners().add(&state);
        button.button_listeners().add(&config);
        let id = tree.insert(Component::new(button));
        (id, recorder)
    }

    #[test]
    fn test_push_button_press() {
        let mut tree = ComponentTree::new();
        let (id, recorder) = watched(&mut tree, Button::new("OK"));

        tree.press(id).unwrap();
        assert_eq!(*recorder.events.borrow(), vec!["pressed".to_string()]);
        assert_eq!(tree.model::<Button>(id).unwrap().state(), ButtonState::Unselected);
    }

    #[test]
    fn test_toggle_press_changes_state_before_press() {
        let mut tree = ComponentTree::new();
        let (id, recorder) = watched(&mut tree, Button::toggle("Bold"));

        tree.press(id).unwrap();
        assert!(tree.model::<Button>(id).unwrap().is_selected());
        assert_eq!(
            *recorder.events.borrow(),
            vec!["state from Unselected".to_string(), "pressed".to_string()]
        );
    }

    #[test]
    fn test_tri_state_cycle() {
        let mut tree = ComponentTree::new();
        let id = tree.insert(Component::new(Button::tri_state("All")));
        let mut seen = Vec::new();
        for _ in 0..3 {
            tree.press(id).unwrap();
            seen.push(tree.model::<Button>(id).unwrap().state());
        }
        assert_eq!(
            seen,
            vec![ButtonState::Mixed, ButtonState::Selected, ButtonState::Unselected]
        );
    }

    #[test]
    fn test_set_state_validation() {
        let mut tree = ComponentTree::new();
        let push = tree.insert(Component::new(Button::new("OK")));
        let toggle = tree.insert(Component::new(Button::toggle("On")));

        assert!(matches!(
            tree.set_selected(push, true),
            Err(WidgetError::InvalidArgument(_))
        ));
        assert!(tree.set_button_state(toggle, ButtonState::Mixed).is_err());
        tree.set_selected(toggle, true).unwrap();
        assert!(tree.model::<Button>(toggle).unwrap().is_selected());
        assert!(tree.set_tri_state(push, true).is_err());
    }

    #[test]
    fn test_disabling_toggle_resets_state() {
        let mut tree = ComponentTree::new();
        let id = tree.insert(Component::new(Button::tri_state("x")));
        tree.set_button_state(id, ButtonState::Mixed).unwrap();

        tree.set_toggle_button(id, false).unwrap();
        let button = tree.model::<Button>(id).unwrap();
        assert!(!button.is_toggle_button());
        assert!(!button.is_tri_state());
        assert_eq!(button.state(), ButtonState::Unselected);
    }

    #[test]
    fn test_set_label_fires_once() {
        let mut tree = ComponentTree::new();
        let (id, recorder) = watched(&mut tree, Button::new("a"));
        tree.set_label(id, "b").unwrap();
        tree.set_label(id, "b").unwrap();
        assert_eq!(*recorder.events.borrow(), vec!["label from a".to_string()]);
        assert_eq!(tree.model::<Button>(id).unwrap().label(), "b");
    }

    #[test]
    fn test_press_on_non_button() {
        let mut tree = ComponentTree::new();
        let id = tree.insert(Component::new(42u32));
        assert!(matches!(
            tree.press(id),
            Err(WidgetError::TypeMismatch { actual: "u32", .. })
        ));
    }
}
