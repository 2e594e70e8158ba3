//! Image loading and caching.
//!
//! [`ImageLoader`] turns URLs and resource names into decoded [`Image`]s,
//! either synchronously or on the rayon pool. [`ResourceCache`] keeps decoded
//! images keyed by URL so repeated requests share one decoded picture.
//!
//! Background loads never touch widgets. Each finished load is sent to the
//! [`LoadQueue`] it was started for and picked up from there on the UI thread.
//! A loader can serve several queues; results never cross between them.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, unbounded};
use parking_lot::RwLock;
use url::Url;

use crate::error::{RenderError, RenderResult};
use crate::image::Image;
use crate::logging::targets;

/// A URL-keyed cache of decoded images.
///
/// The cache is shared between the UI thread and whoever populates it, so it
/// uses interior locking; lookups hand out cheap [`Image`] clones.
#[derive(Debug, Default)]
pub struct ResourceCache {
    images: RwLock<HashMap<Url, Image>>,
}

impl ResourceCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a cached image.
    pub fn get(&self, url: &Url) -> Option<Image> {
        self.images.read().get(url).cloned()
    }

    /// Store an image, returning the one it replaced.
    pub fn put(&self, url: Url, image: Image) -> Option<Image> {
        tracing::trace!(target: targets::RESOURCE, %url, "image cached");
        self.images.write().insert(url, image)
    }

    /// Drop a cached image.
    pub fn remove(&self, url: &Url) -> Option<Image> {
        self.images.write().remove(url)
    }

    /// Whether an image is cached for `url`.
    pub fn contains(&self, url: &Url) -> bool {
        self.images.read().contains_key(url)
    }

    /// Number of cached images.
    pub fn len(&self) -> usize {
        self.images.read().len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.images.read().is_empty()
    }

    /// Drop every cached image.
    pub fn clear(&self) {
        self.images.write().clear();
    }

    /// Return the cached image for `url`, loading and caching it on a miss.
    pub fn get_or_load(&self, url: &Url, loader: &ImageLoader) -> RenderResult<Image> {
        if let Some(image) = self.get(url) {
            return Ok(image);
        }
        let image = loader.load(url)?;
        self.put(url.clone(), image.clone());
        Ok(image)
    }
}

/// Identifies one background load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoadTicket(u64);

impl LoadTicket {
    /// Raw ticket number.
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// The outcome of a background load.
#[derive(Debug)]
pub struct CompletedLoad {
    /// Ticket returned by [`ImageLoader::load_async`].
    pub ticket: LoadTicket,
    /// The URL that was requested.
    pub url: Url,
    /// The decoded image or the single terminal error.
    pub result: RenderResult<Image>,
}

/// Receives the results of background loads.
///
/// Each owner of pending loads (usually one component tree) keeps its own
/// queue, so a shared [`ImageLoader`] hands every result back to whoever
/// asked for it.
pub struct LoadQueue {
    tx: Sender<CompletedLoad>,
    rx: Receiver<CompletedLoad>,
    in_flight: Arc<AtomicUsize>,
}

impl Default for LoadQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl LoadQueue {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self {
            tx,
            rx,
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of loads started for this queue and not yet finished.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Drain every finished load without blocking.
    pub fn poll_completed(&self) -> Vec<CompletedLoad> {
        self.rx.try_iter().collect()
    }

    /// Block until one load finishes or `timeout` elapses.
    pub fn wait_completed(&self, timeout: Duration) -> Option<CompletedLoad> {
        self.rx.recv_timeout(timeout).ok()
    }
}

impl std::fmt::Debug for LoadQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadQueue")
            .field("in_flight", &self.in_flight())
            .field("ready", &self.rx.len())
            .finish()
    }
}

/// Decodes images from `file:` URLs and named resources.
pub struct ImageLoader {
    resource_root: Option<PathBuf>,
    next_ticket: AtomicU64,
    queue: LoadQueue,
}

impl Default for ImageLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageLoader {
    /// Create a loader without a resource root.
    pub fn new() -> Self {
        Self {
            resource_root: None,
            next_ticket: AtomicU64::new(1),
            queue: LoadQueue::new(),
        }
    }

    /// Resolve resource names relative to `root`.
    pub fn with_resource_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.resource_root = Some(root.into());
        self
    }

    /// The directory resource names are resolved against.
    pub fn resource_root(&self) -> Option<&Path> {
        self.resource_root.as_deref()
    }

    /// Turn a resource name into a `file:` URL.
    ///
    /// Names are resolved against the resource root, or used as paths
    /// directly when there is none.
    pub fn resource_url(&self, name: &str) -> RenderResult<Url> {
        let relative = name.trim_start_matches('/');
        let path = match &self.resource_root {
            Some(root) => root.join(relative),
            None => PathBuf::from(name),
        };
        if !path.is_file() {
            return Err(RenderError::ResourceNotFound(name.to_string()));
        }
        let absolute = std::path::absolute(&path)?;
        Url::from_file_path(&absolute)
            .map_err(|()| RenderError::InvalidFileUrl(absolute.display().to_string()))
    }

    /// Load and decode an image synchronously.
    pub fn load(&self, url: &Url) -> RenderResult<Image> {
        let result = load_url(url);
        match &result {
            Ok(image) => tracing::debug!(
                target: targets::RESOURCE,
                %url,
                width = image.width(),
                height = image.height(),
                "image loaded"
            ),
            Err(error) => tracing::debug!(target: targets::RESOURCE, %url, %error, "image load failed"),
        }
        result
    }

    /// Start decoding an image on the rayon pool.
    ///
    /// The result goes to the loader's own queue and is picked up with
    /// [`poll_completed`](Self::poll_completed).
    pub fn load_async(&self, url: Url) -> LoadTicket {
        self.load_async_into(url, &self.queue)
    }

    /// Start decoding an image on the rayon pool, delivering the result to
    /// `queue`.
    ///
    /// Tickets are unique across every queue this loader serves.
    pub fn load_async_into(&self, url: Url, queue: &LoadQueue) -> LoadTicket {
        let ticket = LoadTicket(self.next_ticket.fetch_add(1, Ordering::Relaxed));
        let tx = queue.tx.clone();
        let in_flight = queue.in_flight.clone();
        in_flight.fetch_add(1, Ordering::AcqRel);
        tracing::trace!(target: targets::RESOURCE, %url, ticket = ticket.0, "background load queued");

        rayon::spawn(move || {
            let result = load_url(&url);
            if let Err(error) = &result {
                tracing::warn!(target: targets::RESOURCE, %url, %error, "background image load failed");
            }
            in_flight.fetch_sub(1, Ordering::AcqRel);
            // A dropped queue means nobody is waiting for the result any more.
            let _ = tx.send(CompletedLoad {
                ticket,
                url,
                result,
            });
        });

        ticket
    }

    /// Number of loads on the loader's own queue not yet finished.
    pub fn in_flight(&self) -> usize {
        self.queue.in_flight()
    }

    /// Drain every finished load from the loader's own queue.
    pub fn poll_completed(&self) -> Vec<CompletedLoad> {
        self.queue.poll_completed()
    }

    /// Block until one load on the loader's own queue finishes or `timeout`
    /// elapses.
    pub fn wait_completed(&self, timeout: Duration) -> Option<CompletedLoad> {
        self.queue.wait_completed(timeout)
    }
}

impl std::fmt::Debug for ImageLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageLoader")
            .field("resource_root", &self.resource_root)
            .field("in_flight", &self.in_flight())
            .finish()
    }
}

fn load_url(url: &Url) -> RenderResult<Image> {
    if url.scheme() != "file" {
        return Err(RenderError::UnsupportedScheme {
            scheme: url.scheme().to_string(),
        });
    }
    let path = url
        .to_file_path()
        .map_err(|()| RenderError::InvalidFileUrl(url.to_string()))?;
    Image::from_file(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Color;

    fn write_png(dir: &Path, name: &str, color: Color) -> PathBuf {
        let path = dir.join(name);
        let pixels = image::RgbaImage::from_pixel(3, 2, color.into());
        pixels.save(&path).unwrap();
        path
    }

    #[test]
    fn test_load_file_url() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "red.png", Color::RED);
        let url = Url::from_file_path(&path).unwrap();

        let image = ImageLoader::new().load(&url).unwrap();
        assert_eq!(image.width(), 3);
        assert_eq!(image.height(), 2);
        assert_eq!(image.pixel(0, 0), Some(Color::RED));
    }

    #[test]
    fn test_unsupported_scheme() {
        let url = Url::parse("https://example.com/logo.png").unwrap();
        let err = ImageLoader::new().load(&url).unwrap_err();
        assert!(matches!(err, RenderError::UnsupportedScheme { ref scheme } if scheme == "https"));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let url = Url::from_file_path(dir.path().join("missing.png")).unwrap();
        assert!(matches!(
            ImageLoader::new().load(&url),
            Err(RenderError::Io(_))
        ));
    }

    #[test]
    fn test_resource_url() {
        let dir = tempfile::tempdir().unwrap();
        write_png(dir.path(), "icon.png", Color::BLUE);
        let loader = ImageLoader::new().with_resource_root(dir.path());

        let url = loader.resource_url("/icon.png").unwrap();
        assert_eq!(url.scheme(), "file");
        assert!(loader.load(&url).is_ok());
        assert!(matches!(
            loader.resource_url("nope.png"),
            Err(RenderError::ResourceNotFound(_))
        ));
    }

    #[test]
    fn test_cache_shares_decoded_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "green.png", Color::GREEN);
        let url = Url::from_file_path(&path).unwrap();
        let loader = ImageLoader::new();
        let cache = ResourceCache::new();

        let first = cache.get_or_load(&url, &loader).unwrap();
        let second = cache.get_or_load(&url, &loader).unwrap();
        assert!(Image::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);

        assert!(cache.remove(&url).is_some());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_async_load_completes() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "async.png", Color::WHITE);
        let url = Url::from_file_path(&path).unwrap();
        let loader = ImageLoader::new();

        let ticket = loader.load_async(url.clone());
        let done = loader
            .wait_completed(Duration::from_secs(10))
            .expect("load did not finish");
        assert_eq!(done.ticket, ticket);
        assert_eq!(done.url, url);
        assert!(done.result.is_ok());
    }

    #[test]
    fn test_async_failure_is_terminal() {
        let loader = ImageLoader::new();
        let url = Url::parse("ftp://example.com/a.png").unwrap();
        loader.load_async(url);

        let done = loader
            .wait_completed(Duration::from_secs(10))
            .expect("load did not finish");
        assert!(matches!(
            done.result,
            Err(RenderError::UnsupportedScheme { .. })
        ));
        assert!(loader.poll_completed().is_empty());
    }

    #[test]
    fn test_results_go_to_the_requesting_queue() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "queued.png", Color::RED);
        let url = Url::from_file_path(&path).unwrap();
        let loader = ImageLoader::new();
        let first = LoadQueue::new();
        let second = LoadQueue::new();

        let ticket = loader.load_async_into(url, &second);
        let done = second
            .wait_completed(Duration::from_secs(10))
            .expect("load did not finish");
        assert_eq!(done.ticket, ticket);
        assert_eq!(second.in_flight(), 0);

        assert!(first.poll_completed().is_empty());
        assert!(loader.poll_completed().is_empty());
    }
}
