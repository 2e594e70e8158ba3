//! Platform-specific desktop properties.
//!
//! A [`Platform`] answers questions such as "how fast must two clicks be to
//! count as a double click?" by asking a [`DesktopProperties`] source and
//! falling back to fixed defaults when the source has no answer.
//!
//! # Sources
//!
//! - [`EnvProperties`] reads `TRELLIS_*` environment variables.
//! - [`ConfigProperties`] reads the `[platform]` table of a
//!   [`ToolkitConfig`](crate::config::ToolkitConfig).
//! - [`ChainedProperties`] asks several sources in order; the first answer
//!   wins.
//!
//! ```ignore
//! use trellis::platform::{ChainedProperties, ConfigProperties, EnvProperties, Platform};
//!
//! let source = ChainedProperties::new()
//!     .with(EnvProperties::from_env())
//!     .with(ConfigProperties::new(config.platform.clone()));
//! let platform = Platform::new(source);
//! let interval = platform.multi_click_interval();
//! ```
//!
//! Lookups are cached until [`Platform::invalidate`] is called, so a host
//! that learns the desktop settings changed should invalidate (or
//! [`refresh`](Platform::refresh)) its platform.

mod flavor;

pub use flavor::FlavorMap;

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use trellis_core::logging::targets;

use crate::config::PlatformConfig;
use crate::error::{WidgetError, WidgetResult};

/// Multi-click interval used when the desktop does not provide one.
pub const DEFAULT_MULTI_CLICK_INTERVAL: Duration = Duration::from_millis(400);
/// Cursor blink rate used when the desktop does not provide one.
pub const DEFAULT_CURSOR_BLINK_RATE: Duration = Duration::from_millis(600);
/// Drag threshold, in pixels, used when the desktop does not provide one.
pub const DEFAULT_DRAG_THRESHOLD: u32 = 5;

static GLOBAL_PLATFORM: OnceLock<Platform> = OnceLock::new();

/// How text should be anti-aliased.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAntialiasing {
    Off,
    #[default]
    On,
    /// Follow the font's own grid-fitting table.
    Gasp,
    /// Sub-pixel rendering for LCD panels.
    Lcd,
}

impl FromStr for TextAntialiasing {
    type Err = WidgetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" => Ok(Self::Off),
            "on" => Ok(Self::On),
            "gasp" => Ok(Self::Gasp),
            "lcd" => Ok(Self::Lcd),
            other => Err(WidgetError::invalid(format!("unknown text antialiasing hint: {other}"))),
        }
    }
}

/// A source of desktop settings.
///
/// Every lookup may return `None`, meaning "not known here".
pub trait DesktopProperties: Send + Sync {
    fn multi_click_interval(&self) -> Option<Duration> {
        None
    }

    fn cursor_blink_rate(&self) -> Option<Duration> {
        None
    }

    fn text_antialiasing(&self) -> Option<TextAntialiasing> {
        None
    }

    fn drag_threshold(&self) -> Option<u32> {
        None
    }
}

/// A source that knows nothing; every lookup falls back to the defaults.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProperties;

impl DesktopProperties for NoProperties {}

type Lookup = dyn Fn(&str) -> Option<String> + Send + Sync;

/// Desktop properties from `TRELLIS_*` environment variables.
///
/// | Variable                          | Meaning                        |
/// |-----------------------------------|--------------------------------|
/// | `TRELLIS_MULTI_CLICK_INTERVAL_MS` | multi-click interval, ms       |
/// | `TRELLIS_CURSOR_BLINK_RATE_MS`    | cursor blink rate, ms          |
/// | `TRELLIS_TEXT_ANTIALIASING`       | `off`, `on`, `gasp` or `lcd`   |
/// | `TRELLIS_DRAG_THRESHOLD`          | drag threshold, pixels         |
///
/// Unparseable values are ignored with a warning.
pub struct EnvProperties {
    lookup: Box<Lookup>,
}

impl EnvProperties {
    pub const MULTI_CLICK_INTERVAL: &'static str = "TRELLIS_MULTI_CLICK_INTERVAL_MS";
    pub const CURSOR_BLINK_RATE: &'static str = "TRELLIS_CURSOR_BLINK_RATE_MS";
    pub const TEXT_ANTIALIASING: &'static str = "TRELLIS_TEXT_ANTIALIASING";
    pub const DRAG_THRESHOLD: &'static str = "TRELLIS_DRAG_THRESHOLD";

    /// Read the process environment.
    pub fn from_env() -> Self {
        Self::with_lookup(|name| std::env::var(name).ok())
    }

    /// Read variables through `lookup` instead of the process environment.
    pub fn with_lookup(lookup: impl Fn(&str) -> Option<String> + Send + Sync + 'static) -> Self {
        Self {
            lookup: Box::new(lookup),
        }
    }

    fn parse<T: FromStr>(&self, name: &str) -> Option<T> {
        let raw = (self.lookup)(name)?;
        match raw.trim().parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(target: targets::PLATFORM, variable = name, value = %raw, "ignoring unparseable value");
                None
            }
        }
    }
}

impl DesktopProperties for EnvProperties {
    fn multi_click_interval(&self) -> Option<Duration> {
        self.parse(Self::MULTI_CLICK_INTERVAL).map(Duration::from_millis)
    }

    fn cursor_blink_rate(&self) -> Option<Duration> {
        self.parse(Self::CURSOR_BLINK_RATE).map(Duration::from_millis)
    }

    fn text_antialiasing(&self) -> Option<TextAntialiasing> {
        self.parse(Self::TEXT_ANTIALIASING)
    }

    fn drag_threshold(&self) -> Option<u32> {
        self.parse(Self::DRAG_THRESHOLD)
    }
}

impl fmt::Debug for EnvProperties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvProperties").finish_non_exhaustive()
    }
}

/// Desktop properties from a configuration file's `[platform]` table.
#[derive(Debug, Clone, Default)]
pub struct ConfigProperties {
    config: PlatformConfig,
}

impl ConfigProperties {
    pub fn new(config: PlatformConfig) -> Self {
        Self { config }
    }
}

impl DesktopProperties for ConfigProperties {
    fn multi_click_interval(&self) -> Option<Duration> {
        self.config.multi_click_interval_ms.map(Duration::from_millis)
    }

    fn cursor_blink_rate(&self) -> Option<Duration> {
        self.config.cursor_blink_rate_ms.map(Duration::from_millis)
    }

    fn text_antialiasing(&self) -> Option<TextAntialiasing> {
        self.config.text_antialiasing
    }

    fn drag_threshold(&self) -> Option<u32> {
        self.config.drag_threshold
    }
}

/// Several sources asked in order.
#[derive(Default)]
pub struct ChainedProperties {
    sources: Vec<Box<dyn DesktopProperties>>,
}

impl ChainedProperties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a source, asked after the ones already added.
    pub fn with(mut self, source: impl DesktopProperties + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    fn first<T>(&self, lookup: impl Fn(&dyn DesktopProperties) -> Option<T>) -> Option<T> {
        self.sources.iter().find_map(|source| lookup(source.as_ref()))
    }
}

impl DesktopProperties for ChainedProperties {
    fn multi_click_interval(&self) -> Option<Duration> {
        self.first(|source| source.multi_click_interval())
    }

    fn cursor_blink_rate(&self) -> Option<Duration> {
        self.first(|source| source.cursor_blink_rate())
    }

    fn text_antialiasing(&self) -> Option<TextAntialiasing> {
        self.first(|source| source.text_antialiasing())
    }

    fn drag_threshold(&self) -> Option<u32> {
        self.first(|source| source.drag_threshold())
    }
}

impl fmt::Debug for ChainedProperties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainedProperties")
            .field("sources", &self.sources.len())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Cached {
    multi_click_interval: Option<Duration>,
    cursor_blink_rate: Option<Duration>,
    text_antialiasing: Option<TextAntialiasing>,
    drag_threshold: Option<u32>,
}

/// Desktop settings with defaults, cached per lookup.
pub struct Platform {
    source: RwLock<Arc<dyn DesktopProperties>>,
    cached: Mutex<Cached>,
    flavors: FlavorMap,
}

impl Platform {
    pub fn new(source: impl DesktopProperties + 'static) -> Self {
        Self {
            source: RwLock::new(Arc::new(source)),
            cached: Mutex::new(Cached::default()),
            flavors: FlavorMap::new(),
        }
    }

    /// A platform built from a configuration, with environment variables
    /// taking precedence.
    pub fn from_config(config: &PlatformConfig) -> Self {
        Self::new(
            ChainedProperties::new()
                .with(EnvProperties::from_env())
                .with(ConfigProperties::new(config.clone())),
        )
    }

    /// The process-wide platform.
    ///
    /// Created on first use from the environment unless
    /// [`init_global`](Self::init_global) ran first.
    pub fn global() -> &'static Platform {
        GLOBAL_PLATFORM.get_or_init(|| Platform::new(EnvProperties::from_env()))
    }

    /// Install the process-wide platform.
    ///
    /// Fails if [`global`](Self::global) was already used or initialized.
    pub fn init_global(platform: Platform) -> WidgetResult<&'static Platform> {
        GLOBAL_PLATFORM
            .set(platform)
            .map_err(|_| WidgetError::invalid("the global platform is already initialized"))?;
        Ok(Self::global())
    }

    /// Replace the property source and drop cached values.
    pub fn set_source(&self, source: impl DesktopProperties + 'static) {
        *self.source.write() = Arc::new(source);
        self.invalidate();
    }

    /// Forget cached values; the next lookups ask the source again.
    pub fn invalidate(&self) {
        *self.cached.lock() = Cached::default();
        tracing::debug!(target: targets::PLATFORM, "desktop properties invalidated");
    }

    /// Invalidate, then read every property again.
    pub fn refresh(&self) {
        self.invalidate();
        self.multi_click_interval();
        self.cursor_blink_rate();
        self.text_antialiasing_hint();
        self.drag_threshold();
    }

    fn lookup<T: Copy + fmt::Debug>(
        &self,
        name: &'static str,
        slot: impl Fn(&mut Cached) -> &mut Option<T>,
        read: impl Fn(&dyn DesktopProperties) -> Option<T>,
        default: T,
    ) -> T {
        let cached = *slot(&mut *self.cached.lock());
        if let Some(value) = cached {
            return value;
        }
        let source = self.source.read().clone();
        let value = read(source.as_ref()).unwrap_or_else(|| {
            tracing::debug!(target: targets::PLATFORM, property = name, ?default, "using default");
            default
        });
        *slot(&mut *self.cached.lock()) = Some(value);
        value
    }

    /// Maximum delay between clicks that still counts them as one
    /// multi-click.
    pub fn multi_click_interval(&self) -> Duration {
        self.lookup(
            "multi_click_interval",
            |cached| &mut cached.multi_click_interval,
            |source| source.multi_click_interval(),
            DEFAULT_MULTI_CLICK_INTERVAL,
        )
    }

    pub fn cursor_blink_rate(&self) -> Duration {
        self.lookup(
            "cursor_blink_rate",
            |cached| &mut cached.cursor_blink_rate,
            |source| source.cursor_blink_rate(),
            DEFAULT_CURSOR_BLINK_RATE,
        )
    }

    /// The text anti-aliasing hint. A desktop setting of
    /// [`Off`](TextAntialiasing::Off) is reported as
    /// [`On`](TextAntialiasing::On).
    pub fn text_antialiasing_hint(&self) -> TextAntialiasing {
        self.lookup(
            "text_antialiasing",
            |cached| &mut cached.text_antialiasing,
            |source| {
                source.text_antialiasing().map(|hint| match hint {
                    TextAntialiasing::Off => TextAntialiasing::On,
                    other => other,
                })
            },
            TextAntialiasing::On,
        )
    }

    /// Distance in pixels the pointer must travel with a button held before
    /// a drag starts.
    pub fn drag_threshold(&self) -> u32 {
        self.lookup(
            "drag_threshold",
            |cached| &mut cached.drag_threshold,
            |source| source.drag_threshold(),
            DEFAULT_DRAG_THRESHOLD,
        )
    }

    /// Clipboard flavour mappings.
    pub fn flavor_map(&self) -> &FlavorMap {
        &self.flavors
    }
}

impl Default for Platform {
    fn default() -> Self {
        Self::new(NoProperties)
    }
}

impl fmt::Debug for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Platform")
            .field("cached", &*self.cached.lock())
            .field("flavors", &self.flavors)
            .finish_non_exhaustive()
    }
}

static_assertions::assert_impl_all!(Platform: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn env(pairs: &[(&str, &str)]) -> EnvProperties {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        EnvProperties::with_lookup(move |name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let platform = Platform::default();
        assert_eq!(platform.multi_click_interval(), Duration::from_millis(400));
        assert_eq!(platform.cursor_blink_rate(), Duration::from_millis(600));
        assert_eq!(platform.text_antialiasing_hint(), TextAntialiasing::On);
        assert_eq!(platform.drag_threshold(), 5);
    }

    #[test]
    fn test_env_source() {
        let platform = Platform::new(env(&[
            (EnvProperties::MULTI_CLICK_INTERVAL, "250"),
            (EnvProperties::TEXT_ANTIALIASING, "lcd"),
            (EnvProperties::DRAG_THRESHOLD, "not a number"),
        ]));
        assert_eq!(platform.multi_click_interval(), Duration::from_millis(250));
        assert_eq!(platform.text_antialiasing_hint(), TextAntialiasing::Lcd);
        assert_eq!(platform.drag_threshold(), DEFAULT_DRAG_THRESHOLD);
    }

    #[test]
    fn test_antialiasing_off_is_promoted() {
        let platform = Platform::new(env(&[(EnvProperties::TEXT_ANTIALIASING, "off")]));
        assert_eq!(platform.text_antialiasing_hint(), TextAntialiasing::On);
    }

    #[test]
    fn test_chain_first_answer_wins() {
        let config = PlatformConfig {
            multi_click_interval_ms: Some(900),
            cursor_blink_rate_ms: Some(300),
            ..PlatformConfig::default()
        };
        let chain = ChainedProperties::new()
            .with(env(&[(EnvProperties::MULTI_CLICK_INTERVAL, "100")]))
            .with(ConfigProperties::new(config));
        let platform = Platform::new(chain);
        assert_eq!(platform.multi_click_interval(), Duration::from_millis(100));
        assert_eq!(platform.cursor_blink_rate(), Duration::from_millis(300));
    }

    struct Counting(Arc<AtomicUsize>, u64);

    impl DesktopProperties for Counting {
        fn multi_click_interval(&self) -> Option<Duration> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Some(Duration::from_millis(self.1))
        }
    }

    #[test]
    fn test_lookups_are_cached_until_invalidated() {
        let calls = Arc::new(AtomicUsize::new(0));
        let platform = Platform::new(Counting(Arc::clone(&calls), 200));

        platform.multi_click_interval();
        platform.multi_click_interval();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        platform.invalidate();
        platform.multi_click_interval();
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        platform.refresh();
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        platform.set_source(Counting(Arc::clone(&calls), 700));
        assert_eq!(platform.multi_click_interval(), Duration::from_millis(700));
    }

    #[test]
    fn test_hint_parsing() {
        assert_eq!(" Gasp ".parse::<TextAntialiasing>().unwrap(), TextAntialiasing::Gasp);
        assert!("bold".parse::<TextAntialiasing>().is_err());
    }
}
