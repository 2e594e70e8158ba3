//! Components: the logical state holders of the toolkit.
//!
//! A [`Component`] owns its attributes, its listener lists, an optional
//! [`Skin`] and a chain of [`Decorator`]s, plus a typed *model* that says what
//! kind of widget it is ([`Button`](crate::widgets::Button),
//! [`ImageView`](crate::widgets::ImageView), ...). Components live in a
//! [`ComponentTree`](crate::ComponentTree) and refer to each other through
//! [`ComponentId`] handles, never through owning pointers.

use std::any::Any;
use std::collections::VecDeque;
use std::fmt;

use trellis_render::{Bounds, Dimensions, Point};

use crate::decorator::Decorator;
use crate::error::{WidgetError, WidgetResult};
use crate::listener::ComponentListeners;
use crate::skin::{Skin, SkinNotice};

slotmap::new_key_type! {
    /// Non-owning handle to a component in a [`ComponentTree`](crate::ComponentTree).
    pub struct ComponentId;
}

/// A node of the component tree.
pub struct Component {
    pub(crate) bounds: Bounds,
    pub(crate) enabled: bool,
    pub(crate) visible: bool,
    pub(crate) focused: bool,
    pub(crate) focusable: bool,
    pub(crate) valid: bool,
    pub(crate) parent: Option<ComponentId>,
    pub(crate) children: Vec<ComponentId>,
    pub(crate) skin: Option<Box<dyn Skin>>,
    pub(crate) skin_checked_out: bool,
    pub(crate) pending: VecDeque<SkinNotice>,
    pub(crate) decorators: Vec<Box<dyn Decorator>>,
    listeners: ComponentListeners,
    model: Box<dyn Any>,
    model_type: &'static str,
    name: Option<String>,
}

impl Component {
    /// Create a detached component around a model.
    pub fn new<M: Any>(model: M) -> Self {
        Self {
            bounds: Bounds::ZERO,
            enabled: true,
            visible: true,
            focused: false,
            focusable: false,
            valid: false,
            parent: None,
            children: Vec::new(),
            skin: None,
            skin_checked_out: false,
            pending: VecDeque::new(),
            decorators: Vec::new(),
            listeners: ComponentListeners::default(),
            model: Box::new(model),
            model_type: std::any::type_name::<M>(),
            name: None,
        }
    }

    /// Set the initial bounds.
    pub fn with_bounds(mut self, bounds: Bounds) -> Self {
        self.bounds = bounds;
        self
    }

    /// Set the initial size.
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.bounds.width = width;
        self.bounds.height = height;
        self
    }

    /// Set the initial enabled flag.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Give the component a name for diagnostics.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Add a decorator before the component is inserted into a tree.
    pub fn with_decorator(mut self, decorator: impl Decorator + 'static) -> Self {
        self.decorators.push(Box::new(decorator));
        self
    }

    /// Bounds relative to the parent.
    #[inline]
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    #[inline]
    pub fn x(&self) -> i32 {
        self.bounds.x
    }

    #[inline]
    pub fn y(&self) -> i32 {
        self.bounds.y
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.bounds.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.bounds.height
    }

    #[inline]
    pub fn size(&self) -> Dimensions {
        self.bounds.size()
    }

    #[inline]
    pub fn location(&self) -> Point {
        self.bounds.location()
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[inline]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    #[inline]
    pub fn is_focused(&self) -> bool {
        self.focused
    }

    /// Whether the installed skin accepts keyboard focus.
    #[inline]
    pub fn is_focusable(&self) -> bool {
        self.focusable
    }

    /// Whether the last layout is still current.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    #[inline]
    pub fn parent(&self) -> Option<ComponentId> {
        self.parent
    }

    #[inline]
    pub fn children(&self) -> &[ComponentId] {
        &self.children
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Whether a skin is installed (including one that is currently busy
    /// handling a callback).
    pub fn has_skin(&self) -> bool {
        self.skin.is_some() || self.skin_checked_out
    }

    /// The installed skin, unless it is busy handling a callback.
    pub fn skin(&self) -> Option<&dyn Skin> {
        self.skin.as_deref()
    }

    /// The installed skin as a concrete type.
    pub fn skin_as<S: Skin>(&self) -> WidgetResult<&S> {
        let skin = self.skin.as_deref().ok_or(WidgetError::TypeMismatch {
            expected: std::any::type_name::<S>(),
            actual: "no skin",
        })?;
        let actual = skin.type_name();
        let any: &dyn Any = skin;
        any.downcast_ref::<S>().ok_or(WidgetError::TypeMismatch {
            expected: std::any::type_name::<S>(),
            actual,
        })
    }

    /// The decorator chain, outermost first.
    pub fn decorators(&self) -> &[Box<dyn Decorator>] {
        &self.decorators
    }

    /// The component's listener lists.
    #[inline]
    pub fn listeners(&self) -> &ComponentListeners {
        &self.listeners
    }

    /// Whether the model is a `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.model.is::<T>()
    }

    /// Type name of the model.
    pub fn model_type(&self) -> &'static str {
        self.model_type
    }

    /// The model as a `T`.
    pub fn model<T: Any>(&self) -> WidgetResult<&T> {
        let actual = self.model_type;
        self.model
            .downcast_ref::<T>()
            .ok_or(WidgetError::TypeMismatch {
                expected: std::any::type_name::<T>(),
                actual,
            })
    }

    /// The model as a mutable `T`.
    pub fn model_mut<T: Any>(&mut self) -> WidgetResult<&mut T> {
        let actual = self.model_type;
        self.model
            .downcast_mut::<T>()
            .ok_or(WidgetError::TypeMismatch {
                expected: std::any::type_name::<T>(),
                actual,
            })
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("name", &self.name)
            .field("model", &self.model_type)
            .field("bounds", &self.bounds)
            .field("enabled", &self.enabled)
            .field("visible", &self.visible)
            .field("focused", &self.focused)
            .field("skin", &self.skin.as_ref().map(|s| s.type_name()))
            .field("decorators", &self.decorators.len())
            .field("children", &self.children.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Gauge {
        level: u32,
    }

    #[test]
    fn test_model_access() {
        let mut component = Component::new(Gauge { level: 3 });
        assert!(component.is::<Gauge>());
        assert_eq!(component.model::<Gauge>().unwrap().level, 3);

        component.model_mut::<Gauge>().unwrap().level = 4;
        assert_eq!(component.model::<Gauge>().unwrap().level, 4);
    }

    #[test]
    fn test_model_type_mismatch() {
        let component = Component::new(Gauge { level: 0 });
        let err = component.model::<String>().unwrap_err();
        match err {
            WidgetError::TypeMismatch { expected, actual } => {
                assert_eq!(expected, std::any::type_name::<String>());
                assert!(actual.ends_with("Gauge"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_builders() {
        let component = Component::new(())
            .with_bounds(Bounds::new(1, 2, 30, 40))
            .with_enabled(false)
            .with_name("spacer");
        assert_eq!(component.location(), Point::new(1, 2));
        assert_eq!(component.size(), Dimensions::new(30, 40));
        assert!(!component.is_enabled());
        assert!(component.is_visible());
        assert_eq!(component.name(), Some("spacer"));
        assert!(!component.has_skin());
        assert!(component.skin_as::<crate::skin::PanelSkin>().is_err());
    }
}
