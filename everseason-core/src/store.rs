//! Durable key-value settings store collaborator.
use std::collections::BTreeMap;

/// Section/key/value store backing user settings, generated tables and the
/// save sidecar. Real hosts put an INI-style file behind this; when the data
/// actually hits disk is the host's concern, the core only touches the store
/// at lifecycle phase boundaries.
pub trait SettingsStore {
    fn get(&self, section: &str, key: &str) -> Option<String>;

    fn set(&mut self, section: &str, key: &str, value: &str);

    /// Removes a key, returning whether it existed.
    fn remove(&mut self, section: &str, key: &str) -> bool;

    /// Keys of a section, in stable order.
    fn keys(&self, section: &str) -> Vec<String>;

    /// Reads an integer, writing `default` back when the key is missing or
    /// malformed so the backing file documents itself.
    fn get_or_insert_i64(&mut self, section: &str, key: &str, default: i64) -> i64 {
        match self.get(section, key).and_then(|v| v.trim().parse().ok()) {
            Some(value) => value,
            None => {
                self.set(section, key, &default.to_string());
                default
            }
        }
    }

    /// Boolean variant of [`SettingsStore::get_or_insert_i64`].
    fn get_or_insert_bool(&mut self, section: &str, key: &str, default: bool) -> bool {
        match self.get(section, key).as_deref().and_then(parse_bool) {
            Some(value) => value,
            None => {
                self.set(section, key, if default { "true" } else { "false" });
                default
            }
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim() {
        "1" | "true" | "True" | "TRUE" => Some(true),
        "0" | "false" | "False" | "FALSE" => Some(false),
        _ => None,
    }
}

/// In-memory settings store. The default backend for tests and for hosts
/// that flush to their own config format at shutdown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStore {
    sections: BTreeMap<String, BTreeMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether nothing has been written yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sections.values().all(BTreeMap::is_empty)
    }
}

impl SettingsStore for MemoryStore {
    fn get(&self, section: &str, key: &str) -> Option<String> {
        self.sections.get(section)?.get(key).cloned()
    }

    fn set(&mut self, section: &str, key: &str, value: &str) {
        self.sections
            .entry(section.to_string())
            .or_default()
            .insert(key.to_string(), value.to_string());
    }

    fn remove(&mut self, section: &str, key: &str) -> bool {
        self.sections
            .get_mut(section)
            .is_some_and(|entries| entries.remove(key).is_some())
    }

    fn keys(&self, section: &str) -> Vec<String> {
        self.sections
            .get(section)
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default()
    }
}
