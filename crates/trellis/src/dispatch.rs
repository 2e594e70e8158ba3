//! Input dispatch and bubbling.
//!
//! # Event Flow
//!
//! A consumable [`InputEvent`] sent to a target component goes through these
//! steps:
//!
//! 1. **Skin**: the target's skin handles the event, unless the target is
//!    disabled.
//! 2. **Listeners**: the target's listeners for the event's category are
//!    notified. Every listener runs; the event is consumed if any of them
//!    returns `true`.
//! 3. **Bubbling**: if nobody consumed the event, it moves to the parent with
//!    its coordinates translated into the parent's space, and the parent's
//!    listeners get it. This repeats up to the root.
//!
//! Listeners of disabled components are skipped, but the walk continues past
//! them.
//!
//! [`NotifyEvent`]s (pointer over/out, click) cannot be consumed. They reach
//! the target's skin and the listeners of every component on the chain.
//!
//! [`DisplayInput`] sits on top: it turns display-level input into component
//! events with hit testing, hover tracking, press capture and click counting.

use std::sync::Arc;
use std::time::{Duration, Instant};

use trellis_core::logging::{span_names, targets};
use trellis_render::Point;

use crate::component::ComponentId;
use crate::input::{Key, KeyboardModifiers, MouseButton, ScrollType};
use crate::listener::ComponentListeners;
use crate::platform::Platform;
use crate::skin::{Skin, SkinHost};
use crate::tree::ComponentTree;

/// A consumable input event, in the receiving component's coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    MouseMove {
        x: i32,
        y: i32,
    },
    MouseDown {
        button: MouseButton,
        x: i32,
        y: i32,
    },
    MouseUp {
        button: MouseButton,
        x: i32,
        y: i32,
    },
    MouseWheel {
        scroll_type: ScrollType,
        amount: i32,
        rotation: i32,
        x: i32,
        y: i32,
    },
    KeyTyped {
        character: char,
    },
    KeyPressed {
        key: Key,
        modifiers: KeyboardModifiers,
    },
    KeyReleased {
        key: Key,
        modifiers: KeyboardModifiers,
    },
}

impl InputEvent {
    /// The same event with its coordinates shifted by `(dx, dy)`.
    pub fn translated(self, dx: i32, dy: i32) -> Self {
        match self {
            Self::MouseMove { x, y } => Self::MouseMove { x: x + dx, y: y + dy },
            Self::MouseDown { button, x, y } => Self::MouseDown {
                button,
                x: x + dx,
                y: y + dy,
            },
            Self::MouseUp { button, x, y } => Self::MouseUp {
                button,
                x: x + dx,
                y: y + dy,
            },
            Self::MouseWheel {
                scroll_type,
                amount,
                rotation,
                x,
                y,
            } => Self::MouseWheel {
                scroll_type,
                amount,
                rotation,
                x: x + dx,
                y: y + dy,
            },
            keyboard => keyboard,
        }
    }

    fn deliver_to_skin(self, skin: &mut dyn Skin, host: &mut dyn SkinHost) -> bool {
        match self {
            Self::MouseMove { x, y } => skin.mouse_move(host, x, y),
            Self::MouseDown { button, x, y } => skin.mouse_down(host, button, x, y),
            Self::MouseUp { button, x, y } => skin.mouse_up(host, button, x, y),
            Self::MouseWheel {
                scroll_type,
                amount,
                rotation,
                x,
                y,
            } => skin.mouse_wheel(host, scroll_type, amount, rotation, x, y),
            Self::KeyTyped { character } => skin.key_typed(host, character),
            Self::KeyPressed { key, modifiers } => skin.key_pressed(host, key, modifiers),
            Self::KeyReleased { key, modifiers } => skin.key_released(host, key, modifiers),
        }
    }

    fn deliver_to_listeners(self, listeners: &ComponentListeners, id: ComponentId) -> bool {
        match self {
            Self::MouseMove { x, y } => listeners.mouse.any_consumed(|l| l.mouse_move(id, x, y)),
            Self::MouseDown { button, x, y } => listeners
                .mouse_button
                .any_consumed(|l| l.mouse_down(id, button, x, y)),
            Self::MouseUp { button, x, y } => listeners
                .mouse_button
                .any_consumed(|l| l.mouse_up(id, button, x, y)),
            Self::MouseWheel {
                scroll_type,
                amount,
                rotation,
                x,
                y,
            } => listeners
                .mouse_wheel
                .any_consumed(|l| l.mouse_wheel(id, scroll_type, amount, rotation, x, y)),
            Self::KeyTyped { character } => listeners.key.any_consumed(|l| l.key_typed(id, character)),
            Self::KeyPressed { key, modifiers } => listeners
                .key
                .any_consumed(|l| l.key_pressed(id, key, modifiers)),
            Self::KeyReleased { key, modifiers } => listeners
                .key
                .any_consumed(|l| l.key_released(id, key, modifiers)),
        }
    }
}

/// A notification that cannot be consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyEvent {
    MouseOver,
    MouseOut,
    MouseClick {
        button: MouseButton,
        x: i32,
        y: i32,
        count: u32,
    },
}

impl NotifyEvent {
    fn translated(self, dx: i32, dy: i32) -> Self {
        match self {
            Self::MouseClick { button, x, y, count } => Self::MouseClick {
                button,
                x: x + dx,
                y: y + dy,
                count,
            },
            other => other,
        }
    }

    fn deliver_to_skin(self, skin: &mut dyn Skin, host: &mut dyn SkinHost) {
        match self {
            Self::MouseOver => skin.mouse_over(host),
            Self::MouseOut => skin.mouse_out(host),
            Self::MouseClick { button, x, y, count } => skin.mouse_click(host, button, x, y, count),
        }
    }

    fn deliver_to_listeners(self, listeners: &ComponentListeners, id: ComponentId) {
        match self {
            Self::MouseOver => listeners.mouse.for_each(|l| l.mouse_over(id)),
            Self::MouseOut => listeners.mouse.for_each(|l| l.mouse_out(id)),
            Self::MouseClick { button, x, y, count } => listeners
                .mouse_button
                .for_each(|l| l.mouse_click(id, button, x, y, count)),
        }
    }
}

/// Result of dispatching an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchResult {
    /// The skin or a listener consumed the event.
    Consumed,
    /// The event reached the root unconsumed.
    Ignored,
    /// The target component does not exist.
    ComponentNotFound,
}

impl DispatchResult {
    pub fn was_consumed(&self) -> bool {
        matches!(self, Self::Consumed)
    }
}

/// Delivers events along the parent chain.
pub struct EventDispatcher;

impl EventDispatcher {
    /// Dispatch a consumable event to `target`, bubbling it up the parent
    /// chain until it is consumed.
    pub fn dispatch(tree: &mut ComponentTree, target: ComponentId, event: InputEvent) -> DispatchResult {
        let _span = tracing::trace_span!(span_names::DISPATCH, ?target, ?event).entered();
        let Some(component) = tree.get(target) else {
            return DispatchResult::ComponentNotFound;
        };

        if component.is_enabled() {
            let consumed = tree
                .with_skin(target, |skin, host| event.deliver_to_skin(skin, host))
                .unwrap_or(false);
            if consumed {
                tracing::trace!(target: targets::DISPATCH, ?target, "consumed by skin");
                return DispatchResult::Consumed;
            }
        }

        let mut current = Some(target);
        let mut event = event;
        while let Some(id) = current {
            let Some(component) = tree.get(id) else {
                break;
            };
            if component.is_enabled() && event.deliver_to_listeners(component.listeners(), id) {
                tracing::trace!(target: targets::DISPATCH, consumer = ?id, "consumed by listener");
                return DispatchResult::Consumed;
            }
            let location = component.location();
            event = event.translated(location.x, location.y);
            current = component.parent();
        }
        DispatchResult::Ignored
    }

    /// Deliver a notification to `target`'s skin and to the listeners of
    /// every component on the chain.
    pub fn notify(tree: &mut ComponentTree, target: ComponentId, event: NotifyEvent) -> DispatchResult {
        if !Self::notify_skin(tree, target, event) {
            return DispatchResult::ComponentNotFound;
        }
        let mut current = Some(target);
        let mut event = event;
        while let Some(id) = current {
            let Some(component) = tree.get(id) else {
                break;
            };
            if component.is_enabled() {
                event.deliver_to_listeners(component.listeners(), id);
            }
            let location = component.location();
            event = event.translated(location.x, location.y);
            current = component.parent();
        }
        DispatchResult::Ignored
    }

    /// Deliver a notification to one component only: its skin, then its
    /// own listeners.
    pub fn notify_one(tree: &mut ComponentTree, target: ComponentId, event: NotifyEvent) -> DispatchResult {
        if !Self::notify_skin(tree, target, event) {
            return DispatchResult::ComponentNotFound;
        }
        if let Some(component) = tree.get(target)
            && component.is_enabled()
        {
            event.deliver_to_listeners(component.listeners(), target);
        }
        DispatchResult::Ignored
    }

    fn notify_skin(tree: &mut ComponentTree, target: ComponentId, event: NotifyEvent) -> bool {
        let Some(component) = tree.get(target) else {
            return false;
        };
        if component.is_enabled() {
            tree.with_skin(target, |skin, host| event.deliver_to_skin(skin, host));
        }
        true
    }
}

/// Where a [`MultiClickTracker`] reads its interval.
#[derive(Debug, Clone)]
enum ClickInterval {
    Fixed(Duration),
    Global(&'static Platform),
    Shared(Arc<Platform>),
}

/// Counts successive clicks of the same button on the same component.
///
/// Trackers built from a [`Platform`] ask it for the interval on every click,
/// so invalidated or replaced desktop settings take effect immediately.
#[derive(Debug, Clone)]
pub struct MultiClickTracker {
    interval: ClickInterval,
    last: Option<(ComponentId, MouseButton, Instant)>,
    count: u32,
}

impl MultiClickTracker {
    /// A tracker with a fixed interval.
    pub fn new(interval: Duration) -> Self {
        Self::with_interval(ClickInterval::Fixed(interval))
    }

    /// A tracker following `platform`'s multi-click interval.
    pub fn from_platform(platform: Arc<Platform>) -> Self {
        Self::with_interval(ClickInterval::Shared(platform))
    }

    /// A tracker following the process-wide platform.
    pub fn global() -> Self {
        Self::with_interval(ClickInterval::Global(Platform::global()))
    }

    fn with_interval(interval: ClickInterval) -> Self {
        Self {
            interval,
            last: None,
            count: 0,
        }
    }

    /// The interval in effect right now.
    pub fn interval(&self) -> Duration {
        match &self.interval {
            ClickInterval::Fixed(interval) => *interval,
            ClickInterval::Global(platform) => platform.multi_click_interval(),
            ClickInterval::Shared(platform) => platform.multi_click_interval(),
        }
    }

    /// Record a click and return its count: 1 for a single click, 2 for a
    /// double click, and so on.
    pub fn click(&mut self, target: ComponentId, button: MouseButton, now: Instant) -> u32 {
        self.count = match self.last {
            Some((last_target, last_button, at))
                if last_target == target
                    && last_button == button
                    && now.saturating_duration_since(at) <= self.interval() =>
            {
                self.count + 1
            }
            _ => 1,
        };
        self.last = Some((target, button, now));
        self.count
    }

    pub fn reset(&mut self) {
        self.last = None;
        self.count = 0;
    }
}

/// Turns display-level pointer and keyboard input into component events.
///
/// Coordinates passed in are display coordinates. After every event the
/// tree's deferred tasks are processed.
#[derive(Debug)]
pub struct DisplayInput {
    /// Components under the pointer, root first.
    hovered: Vec<ComponentId>,
    /// Component that received the last mouse down, with its button.
    captured: Option<(ComponentId, MouseButton)>,
    clicks: MultiClickTracker,
}

impl Default for DisplayInput {
    /// Input following the process-wide platform.
    fn default() -> Self {
        Self::with_tracker(MultiClickTracker::global())
    }
}

impl DisplayInput {
    /// Input following `platform`'s settings as they change.
    pub fn new(platform: Arc<Platform>) -> Self {
        Self::with_tracker(MultiClickTracker::from_platform(platform))
    }

    /// Input with a fixed multi-click interval, ignoring the platform.
    pub fn with_multi_click_interval(interval: Duration) -> Self {
        Self::with_tracker(MultiClickTracker::new(interval))
    }

    fn with_tracker(clicks: MultiClickTracker) -> Self {
        Self {
            hovered: Vec::new(),
            captured: None,
            clicks,
        }
    }

    /// The deepest component under the pointer.
    pub fn mouse_over_component(&self) -> Option<ComponentId> {
        self.hovered.last().copied()
    }

    pub fn mouse_move(&mut self, tree: &mut ComponentTree, x: i32, y: i32) -> bool {
        let hit = tree.descendant_at(x, y);
        self.update_hover(tree, hit);

        let target = self.captured.map(|(id, _)| id).or(hit);
        let consumed = target.is_some_and(|target| {
            Self::dispatch_at(tree, target, x, y, |x, y| InputEvent::MouseMove { x, y })
        });
        Self::finish(tree);
        consumed
    }

    pub fn mouse_down(&mut self, tree: &mut ComponentTree, button: MouseButton, x: i32, y: i32) -> bool {
        let hit = tree.descendant_at(x, y);
        self.update_hover(tree, hit);
        let Some(target) = hit else {
            Self::finish(tree);
            return false;
        };
        self.captured = Some((target, button));
        let consumed = Self::dispatch_at(tree, target, x, y, |x, y| InputEvent::MouseDown { button, x, y });
        Self::finish(tree);
        consumed
    }

    pub fn mouse_up(&mut self, tree: &mut ComponentTree, button: MouseButton, x: i32, y: i32) -> bool {
        self.mouse_up_at(tree, button, x, y, Instant::now())
    }

    /// Like [`mouse_up`](Self::mouse_up) with an explicit timestamp for
    /// click counting.
    pub fn mouse_up_at(
        &mut self,
        tree: &mut ComponentTree,
        button: MouseButton,
        x: i32,
        y: i32,
        now: Instant,
    ) -> bool {
        let hit = tree.descendant_at(x, y);
        let captured = match self.captured {
            Some((id, captured_button)) if captured_button == button => {
                self.captured = None;
                Some(id)
            }
            _ => None,
        };

        let target = captured.or(hit);
        let consumed = target.is_some_and(|target| {
            Self::dispatch_at(tree, target, x, y, |x, y| InputEvent::MouseUp { button, x, y })
        });

        if let Some(target) = captured
            && hit == Some(target)
            && let Some(local) = tree.to_local(target, Point::new(x, y))
        {
            let count = self.clicks.click(target, button, now);
            tracing::trace!(target: targets::DISPATCH, ?target, count, "click");
            EventDispatcher::notify(
                tree,
                target,
                NotifyEvent::MouseClick {
                    button,
                    x: local.x,
                    y: local.y,
                    count,
                },
            );
        }

        self.update_hover(tree, hit);
        Self::finish(tree);
        consumed
    }

    pub fn mouse_wheel(
        &mut self,
        tree: &mut ComponentTree,
        scroll_type: ScrollType,
        amount: i32,
        rotation: i32,
        x: i32,
        y: i32,
    ) -> bool {
        let Some(target) = tree.descendant_at(x, y) else {
            return false;
        };
        let consumed = Self::dispatch_at(tree, target, x, y, |x, y| InputEvent::MouseWheel {
            scroll_type,
            amount,
            rotation,
            x,
            y,
        });
        Self::finish(tree);
        consumed
    }

    /// The pointer left the display.
    pub fn mouse_exit(&mut self, tree: &mut ComponentTree) {
        self.update_hover(tree, None);
        Self::finish(tree);
    }

    pub fn key_typed(&mut self, tree: &mut ComponentTree, character: char) -> bool {
        self.key_event(tree, InputEvent::KeyTyped { character })
    }

    pub fn key_pressed(&mut self, tree: &mut ComponentTree, key: Key, modifiers: KeyboardModifiers) -> bool {
        self.key_event(tree, InputEvent::KeyPressed { key, modifiers })
    }

    pub fn key_released(&mut self, tree: &mut ComponentTree, key: Key, modifiers: KeyboardModifiers) -> bool {
        self.key_event(tree, InputEvent::KeyReleased { key, modifiers })
    }

    fn key_event(&mut self, tree: &mut ComponentTree, event: InputEvent) -> bool {
        let Some(focused) = tree.focused() else {
            return false;
        };
        let consumed = EventDispatcher::dispatch(tree, focused, event).was_consumed();
        Self::finish(tree);
        consumed
    }

    fn dispatch_at(
        tree: &mut ComponentTree,
        target: ComponentId,
        x: i32,
        y: i32,
        event: impl FnOnce(i32, i32) -> InputEvent,
    ) -> bool {
        let Some(local) = tree.to_local(target, Point::new(x, y)) else {
            return false;
        };
        EventDispatcher::dispatch(tree, target, event(local.x, local.y)).was_consumed()
    }

    /// Send out/over so that exactly the components under `hit` (and its
    /// ancestors) are marked as hovered.
    fn update_hover(&mut self, tree: &mut ComponentTree, hit: Option<ComponentId>) {
        let chain: Vec<ComponentId> = match hit {
            Some(hit) => {
                let mut chain = tree.ancestors(hit);
                chain.reverse();
                chain.push(hit);
                chain
            }
            None => Vec::new(),
        };
        if chain == self.hovered {
            return;
        }

        let previous = std::mem::replace(&mut self.hovered, chain);
        for &left in previous.iter().rev() {
            if !self.hovered.contains(&left) {
                EventDispatcher::notify_one(tree, left, NotifyEvent::MouseOut);
            }
        }
        for &entered in &self.hovered {
            if !previous.contains(&entered) {
                EventDispatcher::notify_one(tree, entered, NotifyEvent::MouseOver);
            }
        }
    }

    fn finish(tree: &mut ComponentTree) {
        let report = tree.process_tasks();
        for (id, error) in report.failures {
            tracing::warn!(target: targets::DISPATCH, ?id, %error, "deferred work failed");
        }
    }
}
