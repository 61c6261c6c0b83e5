//! Everseason Core Engine
//!
//! Host-agnostic season state machine and form-swap resolution for the
//! Everseason seasonal-content system. This crate decides *which* asset
//! identifier a call site should use at any moment; asset loading,
//! rendering and engine hooking live in the host.

pub mod calendar;
pub mod form_swap;
pub mod manager;
pub mod season;
pub mod store;
pub mod substitution;
pub mod swap_config;

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

// Re-export commonly used types
pub use calendar::{Month, MonthToSeasonMap};
pub use form_swap::{FormCategory, FormId, FormInfo, FormKey, FormKeyError, FormSwapMap};
pub use manager::{SeasonChange, SeasonManager};
pub use season::{LodType, Season, SeasonKind, SeasonMode};
pub use store::{MemoryStore, SettingsStore};
pub use substitution::{
    effective_form, effective_grass_source, effective_material_source, effective_texture_set,
};
pub use swap_config::{
    MAIN_FORM_SWAP, MemoryConfigSource, SwapConfigSource, SwapDocument, season_configs,
};

/// Trait for abstracting the loaded game content set.
/// The host's data handler provides this once content is ready.
pub trait ContentProvider {
    /// Number of loaded content packages; the regeneration fingerprint.
    fn mod_count(&self) -> usize;

    /// Resolves a stable key to its runtime form, if present in this load.
    fn resolve(&self, key: &FormKey) -> Option<FormInfo>;

    /// Every loaded form in the swappable categories.
    fn all_forms(&self) -> Vec<FormInfo>;

    /// The texture set a land texture renders with.
    fn texture_set_of(&self, land_texture: FormId) -> Option<FormId>;
}

/// Trait for asking whether a save slot still exists on disk, used for
/// sidecar garbage collection.
pub trait SaveFiles {
    fn exists(&self, save_slug: &str) -> bool;
}

impl SaveFiles for HashSet<String> {
    fn exists(&self, save_slug: &str) -> bool {
        self.contains(save_slug)
    }
}

/// Save directory probe checking for `<root>/<slug>.<extension>` files.
#[derive(Debug, Clone)]
pub struct SaveDirectory {
    root: PathBuf,
    extension: String,
}

impl SaveDirectory {
    #[must_use]
    pub fn new(root: PathBuf, extension: &str) -> Self {
        Self {
            root,
            extension: extension.to_string(),
        }
    }
}

impl SaveFiles for SaveDirectory {
    fn exists(&self, save_slug: &str) -> bool {
        self.root
            .join(format!("{save_slug}.{}", self.extension))
            .is_file()
    }
}

/// Content snapshot provider backed by a prebuilt form list. Hosts that
/// precompute their content set hand it over through this; tests build
/// fixtures with it.
#[derive(Debug, Clone, Default)]
pub struct StaticContent {
    mod_count: usize,
    forms: Vec<FormInfo>,
    by_key: HashMap<FormKey, usize>,
    texture_sets: HashMap<FormId, FormId>,
}

impl StaticContent {
    #[must_use]
    pub fn new(mod_count: usize) -> Self {
        Self {
            mod_count,
            ..Self::default()
        }
    }

    pub fn set_mod_count(&mut self, mod_count: usize) {
        self.mod_count = mod_count;
    }

    /// Registers a form; later registrations with the same key win.
    pub fn add_form(&mut self, form: FormInfo) {
        self.by_key.insert(form.key.clone(), self.forms.len());
        self.forms.push(form);
    }

    /// Records which texture set a land texture renders with.
    pub fn link_texture_set(&mut self, land_texture: FormId, texture_set: FormId) {
        self.texture_sets.insert(land_texture, texture_set);
    }
}

impl ContentProvider for StaticContent {
    fn mod_count(&self) -> usize {
        self.mod_count
    }

    fn resolve(&self, key: &FormKey) -> Option<FormInfo> {
        self.by_key.get(key).map(|&i| self.forms[i].clone())
    }

    fn all_forms(&self) -> Vec<FormInfo> {
        self.forms.clone()
    }

    fn texture_set_of(&self, land_texture: FormId) -> Option<FormId> {
        self.texture_sets.get(&land_texture).copied()
    }
}

/// Lifecycle driver tying a [`SeasonManager`] to its collaborators. Hosts
/// forward their lifecycle hooks here in order: settings phase, content
/// ready, then save/load/delete and the recurring zone/activation signals.
pub struct SeasonEngine<P, S, C>
where
    P: ContentProvider,
    S: SettingsStore,
    C: SwapConfigSource,
{
    manager: SeasonManager,
    provider: P,
    store: S,
    configs: C,
}

impl<P, S, C> SeasonEngine<P, S, C>
where
    P: ContentProvider,
    S: SettingsStore,
    C: SwapConfigSource,
{
    /// Create an engine over the host's content, settings and config
    /// collaborators.
    pub fn new(provider: P, store: S, configs: C) -> Self {
        Self {
            manager: SeasonManager::new(),
            provider,
            store,
            configs,
        }
    }

    #[must_use]
    pub fn manager(&self) -> &SeasonManager {
        &self.manager
    }

    pub fn manager_mut(&mut self) -> &mut SeasonManager {
        &mut self.manager
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Settings phase: load configuration before any query.
    pub fn on_settings_phase(&mut self) {
        self.manager.load_settings(&mut self.store);
    }

    /// Content-ready phase: generate/load the swap tables, prune the save
    /// sidecar and resolve the initial season.
    ///
    /// # Errors
    ///
    /// Returns an error when a freshly generated winter bundle could not be
    /// persisted. All phases still run; the in-memory tables are complete,
    /// so gameplay degrades to regenerating on the next launch.
    pub fn on_content_ready(&mut self, saves: &impl SaveFiles) -> Result<(), anyhow::Error> {
        let persisted = self.manager.load_or_generate_winter_form_swap(
            &self.configs,
            &mut self.store,
            &self.provider,
        );
        self.manager
            .load_season_data(&self.configs, &mut self.store, &self.provider);
        self.manager.cleanup_serialized_seasons(&mut self.store, saves);
        self.manager.update_season();
        persisted.map_err(anyhow::Error::from)
    }

    /// Save hook: persist season state for this slot.
    pub fn on_save(&mut self, save_slug: &str) {
        self.manager.save_season(&mut self.store, save_slug);
    }

    /// Pre-load hook: restore season state before the first post-load
    /// query.
    pub fn on_pre_load(&mut self, save_slug: &str) {
        self.manager.load_season(&self.store, save_slug);
    }

    /// Delete hook: purge the slot's sidecar entry.
    pub fn on_delete(&mut self, save_slug: &str) {
        self.manager.clear_season(&mut self.store, save_slug);
    }

    /// Zone-transition signal.
    pub fn on_zone_changed(&mut self, is_exterior: bool) {
        self.manager.set_exterior(is_exterior);
    }

    /// Activation signal; returns whether the host should purge buffered
    /// cells.
    pub fn on_activate(&mut self, teleport_door: bool) -> bool {
        self.manager.on_activate(teleport_door)
    }
}
