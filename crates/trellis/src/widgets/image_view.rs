//! Image views.
//!
//! An [`ImageView`] displays a single [`Image`]. The image can be set
//! directly, from a URL, from a named resource, or from a URL decoded in the
//! background. Setting the same image again is not a change and fires
//! nothing; images are compared by identity, not by pixels.

use std::fmt;

use trellis_core::ListenerList;
use trellis_core::logging::targets;
use trellis_render::{Image, LoadTicket};
use url::Url;

use crate::component::ComponentId;
use crate::error::{WidgetError, WidgetResult};
use crate::skin::SkinNotice;
use crate::tree::ComponentTree;

/// Notified when an image view's properties change.
pub trait ImageViewListener {
    fn image_changed(&self, _view: ComponentId, _previous: Option<&Image>) {}

    fn image_key_changed(&self, _view: ComponentId, _previous: Option<&str>) {}
}

/// Model of an image view.
#[derive(Default)]
pub struct ImageView {
    image: Option<Image>,
    image_key: Option<String>,
    listeners: ListenerList<dyn ImageViewListener>,
}

impl ImageView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_image(image: Image) -> Self {
        Self {
            image: Some(image),
            ..Self::default()
        }
    }

    /// Bind the image to a key when loading and storing.
    pub fn with_image_key(mut self, key: impl Into<String>) -> Self {
        self.image_key = Some(key.into());
        self
    }

    pub fn image(&self) -> Option<&Image> {
        self.image.as_ref()
    }

    pub fn image_key(&self) -> Option<&str> {
        self.image_key.as_deref()
    }

    pub fn listeners(&self) -> &ListenerList<dyn ImageViewListener> {
        &self.listeners
    }
}

impl fmt::Debug for ImageView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageView")
            .field("image", &self.image)
            .field("image_key", &self.image_key)
            .finish()
    }
}

impl ComponentTree {
    /// Replace the displayed image.
    ///
    /// Listeners are notified once with the previous image, unless `image`
    /// is the image already shown.
    pub fn set_image(&mut self, id: ComponentId, image: Option<Image>) -> WidgetResult<()> {
        let view = self.model_mut::<ImageView>(id)?;
        if Image::same(view.image.as_ref(), image.as_ref()) {
            return Ok(());
        }
        // Any background load still running would overwrite an explicit choice.
        self.pending_loads.retain(|_, target| *target != id);

        let view = self.model_mut::<ImageView>(id)?;
        let previous = std::mem::replace(&mut view.image, image);
        tracing::debug!(
            target: targets::COMPONENT,
            component = ?id,
            image = ?view.image,
            "image changed"
        );
        let listeners = view.listeners.snapshot();
        for listener in listeners {
            listener.image_changed(id, previous.as_ref());
        }
        self.notify_skin(id, SkinNotice::ModelChanged);
        Ok(())
    }

    /// Show the image at `url`, loading it through the resource cache.
    pub fn set_image_url(&mut self, id: ComponentId, url: &Url) -> WidgetResult<()> {
        self.model::<ImageView>(id)?;
        let image = self.resources.cache.get_or_load(url, &self.resources.loader)?;
        self.set_image(id, Some(image))
    }

    /// Show a named resource image.
    pub fn set_image_resource(&mut self, id: ComponentId, name: &str) -> WidgetResult<()> {
        if name.is_empty() {
            return Err(WidgetError::invalid("image resource name is empty"));
        }
        let url = self.resources.loader.resource_url(name)?;
        self.set_image_url(id, &url)
    }

    /// Show the image at `url` once it has been decoded in the background.
    ///
    /// Cached images are shown immediately and `None` is returned. Otherwise
    /// the view keeps its current image until
    /// [`process_tasks`](Self::process_tasks) picks up the finished load. A
    /// later call for the same view supersedes this one.
    pub fn set_image_url_async(&mut self, id: ComponentId, url: Url) -> WidgetResult<Option<LoadTicket>> {
        self.model::<ImageView>(id)?;
        if let Some(image) = self.resources.cache.get(&url) {
            self.set_image(id, Some(image))?;
            return Ok(None);
        }
        self.pending_loads.retain(|_, target| *target != id);
        let ticket = self.resources.loader.load_async_into(url, &self.loads);
        self.pending_loads.insert(ticket, id);
        Ok(Some(ticket))
    }

    pub fn set_image_key(&mut self, id: ComponentId, key: Option<String>) -> WidgetResult<()> {
        let view = self.model_mut::<ImageView>(id)?;
        if view.image_key == key {
            return Ok(());
        }
        let previous = std::mem::replace(&mut view.image_key, key);
        let listeners = view.listeners.snapshot();
        for listener in listeners {
            listener.image_key_changed(id, previous.as_deref());
        }
        Ok(())
    }
}
