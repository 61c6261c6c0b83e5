//! Declarative swap-config documents and their discovery conventions.
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Name of the distinguished auto-generated winter bundle.
pub const MAIN_FORM_SWAP: &str = "MainFormSwap_WIN.ini";

/// Section listing the worldspaces a config affects (bare keys).
pub const WORLDSPACES: &str = "Worldspaces";

/// Ordered multi-key section document, the in-memory shape of one seasonal
/// config file. Entries are raw `base=replacement` lines (bare keys are
/// tolerated); within a section, declaration order is preserved so later
/// entries can override earlier ones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapDocument {
    sections: Vec<Section>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Section {
    name: String,
    entries: Vec<String>,
}

impl SwapDocument {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry, creating the section on first use.
    pub fn push_entry(&mut self, section: &str, entry: &str) {
        if let Some(existing) = self.sections.iter_mut().find(|s| s.name == section) {
            existing.entries.push(entry.to_string());
        } else {
            self.sections.push(Section {
                name: section.to_string(),
                entries: vec![entry.to_string()],
            });
        }
    }

    pub fn clear_section(&mut self, section: &str) {
        self.sections.retain(|s| s.name != section);
    }

    /// Entries of a section, empty when absent.
    #[must_use]
    pub fn entries(&self, section: &str) -> &[String] {
        self.sections
            .iter()
            .find(|s| s.name == section)
            .map_or(&[], |s| s.entries.as_slice())
    }

    /// Section names in declaration order.
    pub fn sections(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(|s| s.name.as_str())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sections.iter().all(|s| s.entries.is_empty())
    }
}

/// Source of seasonal config documents. Real hosts back this with a
/// directory of INI files; parsing and file I/O stay on the host side.
pub trait SwapConfigSource {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Names of every candidate config in the seasons folder.
    fn list(&self) -> Vec<String>;

    fn load(&self, name: &str) -> Result<SwapDocument, Self::Error>;

    fn save(&self, name: &str, doc: &SwapDocument) -> Result<(), Self::Error>;
}

/// Hand-authored configs for one season suffix, in sorted order so later
/// files extend or override earlier ones deterministically. The generated
/// bundle is excluded, it is loaded through its own path.
#[must_use]
pub fn season_configs(names: &[String], suffix: &str) -> Vec<String> {
    let tag = format!("_{suffix}");
    let mut configs: Vec<String> = names
        .iter()
        .filter(|name| name.contains(&tag) && !name.contains("MainFormSwap"))
        .cloned()
        .collect();
    configs.sort();
    configs
}

/// Error raised when a named config does not exist in the source.
#[derive(Debug, Error)]
#[error("no config named `{0}`")]
pub struct MissingConfig(pub String);

/// In-memory config source for hosts that preload their seasons folder and
/// for tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryConfigSource {
    docs: Rc<RefCell<HashMap<String, SwapDocument>>>,
}

impl MemoryConfigSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, name: &str, doc: SwapDocument) {
        self.docs.borrow_mut().insert(name.to_string(), doc);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<SwapDocument> {
        self.docs.borrow().get(name).cloned()
    }
}

impl SwapConfigSource for MemoryConfigSource {
    type Error = MissingConfig;

    fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.docs.borrow().keys().cloned().collect();
        names.sort();
        names
    }

    fn load(&self, name: &str) -> Result<SwapDocument, Self::Error> {
        self.docs
            .borrow()
            .get(name)
            .cloned()
            .ok_or_else(|| MissingConfig(name.to_string()))
    }

    fn save(&self, name: &str, doc: &SwapDocument) -> Result<(), Self::Error> {
        self.insert(name, doc.clone());
        Ok(())
    }
}
