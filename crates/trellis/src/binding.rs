//! Loading component state from, and storing it into, a key-value context.
//!
//! Bindable widgets carry a key naming their slot in the context:
//!
//! - an [`ImageView`]'s image key: [`BindValue::Image`] sets the image,
//!   [`BindValue::Url`] loads it through the resource cache and
//!   [`BindValue::Text`] names a resource;
//! - a toggle [`Button`]'s selected key, bound to a [`BindValue::Bool`].
//!
//! [`ComponentTree::load`] and [`ComponentTree::store`] walk the whole
//! subtree below the given component.

use std::collections::HashMap;

use trellis_core::logging::targets;
use trellis_render::Image;
use url::Url;

use crate::component::ComponentId;
use crate::error::{WidgetError, WidgetResult};
use crate::tree::ComponentTree;
use crate::widgets::{Button, ImageView};

/// A value that can be bound to a component.
#[derive(Debug, Clone)]
pub enum BindValue {
    Image(Image),
    Url(Url),
    Text(String),
    Bool(bool),
}

impl BindValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            BindValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_image(&self) -> Option<&Image> {
        match self {
            BindValue::Image(image) => Some(image),
            _ => None,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            BindValue::Image(_) => "image",
            BindValue::Url(_) => "URL",
            BindValue::Text(_) => "text",
            BindValue::Bool(_) => "boolean",
        }
    }
}

impl From<Image> for BindValue {
    fn from(image: Image) -> Self {
        BindValue::Image(image)
    }
}

impl From<Url> for BindValue {
    fn from(url: Url) -> Self {
        BindValue::Url(url)
    }
}

impl From<&str> for BindValue {
    fn from(text: &str) -> Self {
        BindValue::Text(text.to_owned())
    }
}

impl From<String> for BindValue {
    fn from(text: String) -> Self {
        BindValue::Text(text)
    }
}

impl From<bool> for BindValue {
    fn from(value: bool) -> Self {
        BindValue::Bool(value)
    }
}

/// A string-keyed store of [`BindValue`]s.
pub trait Dictionary {
    fn get(&self, key: &str) -> Option<&BindValue>;

    /// Store `value`, returning the previous value for the key.
    fn put(&mut self, key: &str, value: BindValue) -> Option<BindValue>;

    fn remove(&mut self, key: &str) -> Option<BindValue>;

    fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }
}

impl Dictionary for HashMap<String, BindValue> {
    fn get(&self, key: &str) -> Option<&BindValue> {
        HashMap::get(self, key)
    }

    fn put(&mut self, key: &str, value: BindValue) -> Option<BindValue> {
        self.insert(key.to_owned(), value)
    }

    fn remove(&mut self, key: &str) -> Option<BindValue> {
        HashMap::remove(self, key)
    }

    fn contains_key(&self, key: &str) -> bool {
        HashMap::contains_key(self, key)
    }
}

fn cannot_bind(key: &str, value: &BindValue) -> WidgetError {
    WidgetError::invalid(format!("cannot bind {} value at \"{key}\"", value.kind()))
}

impl ComponentTree {
    /// Update every bindable component in `id`'s subtree from `context`.
    ///
    /// Components whose key is missing from the context are left alone.
    /// Stops at the first value that cannot be applied.
    pub fn load(&mut self, id: ComponentId, context: &dyn Dictionary) -> WidgetResult<()> {
        self.component(id)?;
        for current in self.descendants(id) {
            if let Ok(view) = self.model::<ImageView>(current)
                && let Some(key) = view.image_key()
                && let Some(value) = context.get(key)
            {
                let key = key.to_owned();
                tracing::trace!(target: targets::COMPONENT, ?current, %key, "loading image binding");
                match value {
                    BindValue::Image(image) => self.set_image(current, Some(image.clone()))?,
                    BindValue::Url(url) => self.set_image_url(current, url)?,
                    BindValue::Text(name) => self.set_image_resource(current, name)?,
                    other => return Err(cannot_bind(&key, other)),
                }
            } else if let Ok(button) = self.model::<Button>(current)
                && let Some(key) = button.selected_key()
                && let Some(value) = context.get(key)
            {
                let selected = value.as_bool().ok_or_else(|| cannot_bind(key, value))?;
                self.set_selected(current, selected)?;
            }
        }
        Ok(())
    }

    /// Write every enabled, bindable component in `id`'s subtree into
    /// `context`.
    ///
    /// An image view without an image removes its key.
    pub fn store(&self, id: ComponentId, context: &mut dyn Dictionary) -> WidgetResult<()> {
        self.component(id)?;
        for current in self.descendants(id) {
            let Some(component) = self.get(current) else {
                continue;
            };
            if !component.is_enabled() {
                continue;
            }
            if let Ok(view) = component.model::<ImageView>()
                && let Some(key) = view.image_key()
            {
                match view.image() {
                    Some(image) => context.put(key, BindValue::Image(image.clone())),
                    None => context.remove(key),
                };
            } else if let Ok(button) = component.model::<Button>()
                && let Some(key) = button.selected_key()
                && button.is_toggle_button()
            {
                context.put(key, BindValue::Bool(button.is_selected()));
            }
        }
        Ok(())
    }
}
