//! Timed transitions over component state.
//!
//! A [`Transition`] only keeps time: given the current instant it reports how
//! far along it is. An [`Animation`] pairs a transition with the component
//! change it drives, and a [`TransitionDriver`] ticks a set of animations
//! against a [`ComponentTree`] from the host's frame loop.
//!
//! ```ignore
//! let mut driver = TransitionDriver::new();
//! driver.add(CollapseTransition::new(button, Duration::from_millis(300), 30)?, Instant::now());
//! // every frame:
//! driver.tick(&mut tree, Instant::now());
//! ```

use std::time::{Duration, Instant};

use trellis_core::logging::targets;

use crate::component::ComponentId;
use crate::error::{WidgetError, WidgetResult};
use crate::tree::ComponentTree;

/// Shape of a transition's progress curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Easing {
    #[default]
    Linear,
    /// Starts slow, accelerates.
    EaseIn,
    /// Starts fast, decelerates.
    EaseOut,
    EaseInOut,
}

/// Map linear progress in `0.0..=1.0` through an easing curve.
pub fn ease(easing: Easing, t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    match easing {
        Easing::Linear => t,
        Easing::EaseIn => t * t,
        Easing::EaseOut => 1.0 - (1.0 - t) * (1.0 - t),
        Easing::EaseInOut => {
            if t < 0.5 {
                2.0 * t * t
            } else {
                1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
            }
        }
    }
}

/// A clock for a fixed-length transition updated at a fixed rate.
#[derive(Debug, Clone)]
pub struct Transition {
    duration: Duration,
    interval: Duration,
    easing: Easing,
    start_time: Option<Instant>,
    last_update: Option<Instant>,
    reversed: bool,
}

impl Transition {
    /// A transition lasting `duration`, updated `rate` times per second.
    pub fn new(duration: Duration, rate: u32) -> WidgetResult<Self> {
        if rate == 0 {
            return Err(WidgetError::invalid("transition rate must be at least 1"));
        }
        Ok(Self {
            duration,
            interval: Duration::from_secs(1) / rate,
            easing: Easing::Linear,
            start_time: None,
            last_update: None,
            reversed: false,
        })
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    #[inline]
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Time between updates.
    #[inline]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.start_time.is_some()
    }

    #[inline]
    pub fn is_reversed(&self) -> bool {
        self.reversed
    }

    pub fn start(&mut self, now: Instant) {
        self.start_time = Some(now);
        self.last_update = None;
    }

    pub fn stop(&mut self) {
        self.start_time = None;
        self.last_update = None;
    }

    /// Run the other way. A running transition continues from its mirrored
    /// position, so the visible progress does not jump.
    pub fn reverse(&mut self, now: Instant) {
        self.reversed = !self.reversed;
        if let Some(start) = self.start_time {
            let elapsed = now.saturating_duration_since(start).min(self.duration);
            let remaining = self.duration - elapsed;
            self.start_time = Some(now.checked_sub(remaining).unwrap_or(now));
        }
    }

    /// Whether an update is due at `now`.
    pub fn is_due(&self, now: Instant) -> bool {
        self.is_running()
            && self
                .last_update
                .is_none_or(|last| now.saturating_duration_since(last) >= self.interval)
    }

    /// Advance to `now` and return the eased progress in `0.0..=1.0`, or
    /// `None` when not running. Reaching the end stops the transition; the
    /// final progress is still returned.
    pub fn update(&mut self, now: Instant) -> Option<f32> {
        let start = self.start_time?;
        self.last_update = Some(now);
        let elapsed = now.saturating_duration_since(start);
        let raw = if self.duration.is_zero() {
            1.0
        } else {
            (elapsed.as_secs_f32() / self.duration.as_secs_f32()).min(1.0)
        };
        if raw >= 1.0 {
            self.stop();
        }
        let progress = ease(self.easing, raw);
        Some(if self.reversed { 1.0 - progress } else { progress })
    }
}

/// A component change driven by a [`Transition`].
pub trait Animation {
    fn transition(&self) -> &Transition;

    fn transition_mut(&mut self) -> &mut Transition;

    /// Show the state at `progress`.
    fn apply(&mut self, tree: &mut ComponentTree, progress: f32);

    /// Called once after the final [`apply`](Self::apply).
    fn finish(&mut self, _tree: &mut ComponentTree) {}
}

/// What a [`CollapseTransition`] does with its component at the end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollapseEnd {
    /// Leave it at zero width.
    Keep,
    /// Hide it and give it back its original width.
    #[default]
    Hide,
    /// Give it back its original width and disable it.
    RestoreDisabled,
    /// Remove it from the tree.
    Remove,
}

/// Shrinks a component's width to zero.
#[derive(Debug, Clone)]
pub struct CollapseTransition {
    target: ComponentId,
    transition: Transition,
    end: CollapseEnd,
    initial_width: Option<u32>,
}

impl CollapseTransition {
    pub fn new(target: ComponentId, duration: Duration, rate: u32) -> WidgetResult<Self> {
        Ok(Self {
            target,
            transition: Transition::new(duration, rate)?,
            end: CollapseEnd::default(),
            initial_width: None,
        })
    }

    pub fn with_end(mut self, end: CollapseEnd) -> Self {
        self.end = end;
        self
    }

    pub fn target(&self) -> ComponentId {
        self.target
    }

    fn restore_width(&self, tree: &mut ComponentTree) -> WidgetResult<()> {
        let height = tree.component(self.target)?.height();
        tree.set_size(self.target, self.initial_width.unwrap_or(0), height)
    }
}

impl Animation for CollapseTransition {
    fn transition(&self) -> &Transition {
        &self.transition
    }

    fn transition_mut(&mut self) -> &mut Transition {
        &mut self.transition
    }

    fn apply(&mut self, tree: &mut ComponentTree, progress: f32) {
        let Some(component) = tree.get(self.target) else {
            self.transition.stop();
            return;
        };
        let initial = *self.initial_width.get_or_insert(component.width());
        let height = component.height();
        let width = (initial as f32 * (1.0 - progress)).round() as u32;
        if let Err(error) = tree.set_size(self.target, width, height) {
            tracing::warn!(target: targets::TRANSITION, %error, "collapse step failed");
        }
    }

    fn finish(&mut self, tree: &mut ComponentTree) {
        let result = match self.end {
            CollapseEnd::Keep => Ok(()),
            CollapseEnd::Hide => self
                .restore_width(tree)
                .and_then(|_| tree.set_visible(self.target, false)),
            CollapseEnd::RestoreDisabled => self
                .restore_width(tree)
                .and_then(|_| tree.set_enabled(self.target, false)),
            CollapseEnd::Remove => tree.remove(self.target),
        };
        if let Err(error) = result {
            tracing::warn!(target: targets::TRANSITION, component = ?self.target, %error, "collapse finish failed");
        }
    }
}

/// Ticks a set of animations from the host's frame loop.
#[derive(Default)]
pub struct TransitionDriver {
    animations: Vec<Box<dyn Animation>>,
}

impl TransitionDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start `animation` at `now` and keep ticking it until it ends.
    pub fn add(&mut self, mut animation: impl Animation + 'static, now: Instant) {
        animation.transition_mut().start(now);
        self.animations.push(Box::new(animation));
    }

    pub fn len(&self) -> usize {
        self.animations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.animations.is_empty()
    }

    /// Update every animation that is due. Returns how many are still
    /// running.
    pub fn tick(&mut self, tree: &mut ComponentTree, now: Instant) -> usize {
        self.animations.retain_mut(|animation| {
            if !animation.transition().is_due(now) {
                return animation.transition().is_running();
            }
            let Some(progress) = animation.transition_mut().update(now) else {
                return false;
            };
            animation.apply(tree, progress);
            if animation.transition().is_running() {
                return true;
            }
            animation.finish(tree);
            tracing::debug!(target: targets::TRANSITION, "animation finished");
            false
        });
        self.animations.len()
    }
}

impl std::fmt::Debug for TransitionDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransitionDriver")
            .field("animations", &self.animations.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::Component;
    use crate::widgets::Button;

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    #[test]
    fn test_easing_endpoints() {
        for easing in [Easing::Linear, Easing::EaseIn, Easing::EaseOut, Easing::EaseInOut] {
            assert_eq!(ease(easing, 0.0), 0.0);
            assert_eq!(ease(easing, 1.0), 1.0);
        }
        assert!(ease(Easing::EaseIn, 0.5) < 0.5);
        assert!(ease(Easing::EaseOut, 0.5) > 0.5);
    }

    #[test]
    fn test_transition_progress() {
        let start = Instant::now();
        let mut transition = Transition::new(ms(100), 10).unwrap();
        assert_eq!(transition.interval(), ms(100));
        assert_eq!(transition.update(start), None);

        transition.start(start);
        assert!(transition.is_due(start));
        let half = transition.update(start + ms(50)).unwrap();
        assert!((half - 0.5).abs() < 1e-3);
        assert!(!transition.is_due(start + ms(60)));
        assert!(transition.is_running());

        assert_eq!(transition.update(start + ms(150)), Some(1.0));
        assert!(!transition.is_running());
    }

    #[test]
    fn test_reverse_mirrors_progress() {
        let start = Instant::now();
        let mut transition = Transition::new(ms(100), 100).unwrap();
        transition.start(start);
        transition.reverse(start + ms(25));
        assert!(transition.is_reversed());
        let progress = transition.update(start + ms(25)).unwrap();
        assert!((progress - 0.25).abs() < 1e-3);
    }

    #[test]
    fn test_zero_rate_rejected() {
        assert!(Transition::new(ms(100), 0).is_err());
    }

    #[test]
    fn test_collapse_shrinks_then_hides() {
        let mut tree = ComponentTree::new();
        let button = tree.insert(Component::new(Button::new("Go")).with_size(100, 20));
        let start = Instant::now();

        let mut driver = TransitionDriver::new();
        driver.add(CollapseTransition::new(button, ms(300), 30).unwrap(), start);

        assert_eq!(driver.tick(&mut tree, start + ms(150)), 1);
        assert_eq!(tree.component(button).unwrap().width(), 50);

        assert_eq!(driver.tick(&mut tree, start + ms(300)), 0);
        let component = tree.component(button).unwrap();
        assert_eq!(component.width(), 100);
        assert!(!component.is_visible());
        assert!(driver.is_empty());
    }

    #[test]
    fn test_collapse_remove_and_keep() {
        let mut tree = ComponentTree::new();
        let removed = tree.insert(Component::new(Button::new("A")).with_size(40, 10));
        let kept = tree.insert(Component::new(Button::new("B")).with_size(40, 10));
        let start = Instant::now();

        let mut driver = TransitionDriver::new();
        driver.add(
            CollapseTransition::new(removed, ms(100), 10)
                .unwrap()
                .with_end(CollapseEnd::Remove),
            start,
        );
        driver.add(
            CollapseTransition::new(kept, ms(100), 10)
                .unwrap()
                .with_end(CollapseEnd::Keep),
            start,
        );
        driver.tick(&mut tree, start + ms(200));

        assert!(!tree.contains(removed));
        assert_eq!(tree.component(kept).unwrap().width(), 0);
    }
}
