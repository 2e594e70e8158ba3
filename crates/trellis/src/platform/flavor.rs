use std::collections::HashMap;

use parking_lot::RwLock;
use trellis_core::logging::targets;

/// MIME type of comma-separated values.
pub const CSV_FLAVOR: &str = "text/csv";
/// Native clipboard format name for comma-separated values.
pub const CSV_NATIVE: &str = "CSV";

/// Two-way mapping between data flavours (MIME types) and native clipboard
/// format names.
///
/// Flavours are compared by their base MIME type, case-insensitively, so
/// `text/csv; charset=utf-8` and `TEXT/CSV` are the same flavour. Native
/// names are compared exactly. Mappings keep insertion order and never hold
/// duplicates.
#[derive(Debug)]
pub struct FlavorMap {
    natives_by_flavor: RwLock<HashMap<String, Vec<String>>>,
    flavors_by_native: RwLock<HashMap<String, Vec<String>>>,
}

impl Default for FlavorMap {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize(flavor: &str) -> String {
    flavor
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

fn insert_unique(map: &RwLock<HashMap<String, Vec<String>>>, key: String, value: String) -> bool {
    let mut map = map.write();
    let values = map.entry(key).or_default();
    if values.contains(&value) {
        return false;
    }
    values.push(value);
    true
}

impl FlavorMap {
    /// A map with the default registrations (`text/csv` <-> `CSV`).
    pub fn new() -> Self {
        let map = Self::empty();
        map.add_unencoded_native_for_flavor(CSV_FLAVOR, CSV_NATIVE);
        map.add_flavor_for_unencoded_native(CSV_NATIVE, CSV_FLAVOR);
        map
    }

    /// A map without any registrations.
    pub fn empty() -> Self {
        Self {
            natives_by_flavor: RwLock::new(HashMap::new()),
            flavors_by_native: RwLock::new(HashMap::new()),
        }
    }

    /// Map `flavor` to the native format `native`, which carries the data
    /// without any further encoding.
    pub fn add_unencoded_native_for_flavor(&self, flavor: &str, native: &str) {
        if insert_unique(&self.natives_by_flavor, normalize(flavor), native.to_owned()) {
            tracing::debug!(target: targets::PLATFORM, flavor, native, "native registered for flavor");
        }
    }

    /// Map the native format `native` back to `flavor`.
    pub fn add_flavor_for_unencoded_native(&self, native: &str, flavor: &str) {
        if insert_unique(&self.flavors_by_native, native.to_owned(), normalize(flavor)) {
            tracing::debug!(target: targets::PLATFORM, native, flavor, "flavor registered for native");
        }
    }

    /// Native formats for a flavour, most preferred first.
    pub fn natives_for_flavor(&self, flavor: &str) -> Vec<String> {
        self.natives_by_flavor
            .read()
            .get(&normalize(flavor))
            .cloned()
            .unwrap_or_default()
    }

    /// Flavours for a native format, most preferred first.
    pub fn flavors_for_native(&self, native: &str) -> Vec<String> {
        self.flavors_by_native
            .read()
            .get(native)
            .cloned()
            .unwrap_or_default()
    }
}
