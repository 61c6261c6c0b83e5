//! Seasonal variants and their per-season swap rules.
use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ContentProvider;
use crate::form_swap::{FormCategory, FormSwapMap};
use crate::store::SettingsStore;
use crate::swap_config::{SwapDocument, WORLDSPACES};

/// One of the four calendar-linked seasonal variants.
/// "No season" is represented as `Option<SeasonKind>::None` throughout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeasonKind {
    Winter,
    Spring,
    Summer,
    Autumn,
}

impl SeasonKind {
    pub const ALL: [SeasonKind; 4] = [
        SeasonKind::Winter,
        SeasonKind::Spring,
        SeasonKind::Summer,
        SeasonKind::Autumn,
    ];

    /// Short suffix used in config filenames and LOD asset names.
    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            SeasonKind::Winter => "WIN",
            SeasonKind::Spring => "SPR",
            SeasonKind::Summer => "SUM",
            SeasonKind::Autumn => "AUT",
        }
    }

    /// Settings section name for this season.
    #[must_use]
    pub const fn section(self) -> &'static str {
        match self {
            SeasonKind::Winter => "Winter",
            SeasonKind::Spring => "Spring",
            SeasonKind::Summer => "Summer",
            SeasonKind::Autumn => "Autumn",
        }
    }

    /// Wire code used in the settings store; 0 means "no season".
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            SeasonKind::Winter => 1,
            SeasonKind::Spring => 2,
            SeasonKind::Summer => 3,
            SeasonKind::Autumn => 4,
        }
    }

    /// Inverse of [`SeasonKind::code`]; 0 and out-of-range codes are `None`.
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(SeasonKind::Winter),
            2 => Some(SeasonKind::Spring),
            3 => Some(SeasonKind::Summer),
            4 => Some(SeasonKind::Autumn),
            _ => None,
        }
    }

    pub(crate) const fn index(self) -> usize {
        self as usize
    }
}

/// Process-wide season selection policy, loaded once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeasonMode {
    Disabled,
    PermanentWinter,
    PermanentSpring,
    PermanentSummer,
    PermanentAutumn,
    #[default]
    Seasonal,
}

impl SeasonMode {
    /// Wire code 0-5 used for the `Season Type` settings key.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            SeasonMode::Disabled => 0,
            SeasonMode::PermanentWinter => 1,
            SeasonMode::PermanentSpring => 2,
            SeasonMode::PermanentSummer => 3,
            SeasonMode::PermanentAutumn => 4,
            SeasonMode::Seasonal => 5,
        }
    }

    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(SeasonMode::Disabled),
            1 => Some(SeasonMode::PermanentWinter),
            2 => Some(SeasonMode::PermanentSpring),
            3 => Some(SeasonMode::PermanentSummer),
            4 => Some(SeasonMode::PermanentAutumn),
            5 => Some(SeasonMode::Seasonal),
            _ => None,
        }
    }

    /// The pinned season for permanent modes, `None` otherwise.
    #[must_use]
    pub const fn permanent_season(self) -> Option<SeasonKind> {
        match self {
            SeasonMode::PermanentWinter => Some(SeasonKind::Winter),
            SeasonMode::PermanentSpring => Some(SeasonKind::Spring),
            SeasonMode::PermanentSummer => Some(SeasonKind::Summer),
            SeasonMode::PermanentAutumn => Some(SeasonKind::Autumn),
            SeasonMode::Disabled | SeasonMode::Seasonal => None,
        }
    }
}

/// LOD asset classes that can carry seasonal variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LodType {
    Terrain,
    Object,
    Tree,
}

impl LodType {
    pub const ALL: [LodType; 3] = [LodType::Terrain, LodType::Object, LodType::Tree];

    /// Per-season settings key toggling swaps for this LOD class.
    #[must_use]
    pub const fn settings_key(self) -> &'static str {
        match self {
            LodType::Terrain => "Swap LOD Terrain",
            LodType::Object => "Swap LOD Objects",
            LodType::Tree => "Swap LOD Trees",
        }
    }

    const fn index(self) -> usize {
        self as usize
    }
}

/// One seasonal variant: identity, eligibility flags, its own form-swap
/// table and the set of worldspaces its configs touch. The four instances
/// are built once at startup and mutated only during load phases.
#[derive(Debug, Clone)]
pub struct Season {
    kind: SeasonKind,
    apply_snow_shader: bool,
    swap_lod: [bool; LodType::ALL.len()],
    swaps: FormSwapMap,
    worldspaces: BTreeSet<String>,
}

impl Season {
    #[must_use]
    pub fn new(kind: SeasonKind) -> Self {
        Self {
            kind,
            apply_snow_shader: matches!(kind, SeasonKind::Winter),
            swap_lod: [true; LodType::ALL.len()],
            swaps: FormSwapMap::new(),
            worldspaces: BTreeSet::new(),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> SeasonKind {
        self.kind
    }

    #[must_use]
    pub const fn suffix(&self) -> &'static str {
        self.kind.suffix()
    }

    /// Reads this season's eligibility flags from its settings section,
    /// writing the defaults back on first read.
    pub fn load_settings(&mut self, store: &mut impl SettingsStore) {
        let section = self.kind.section();
        self.apply_snow_shader = store.get_or_insert_bool(
            section,
            "Apply Snow Shader",
            matches!(self.kind, SeasonKind::Winter),
        );
        for lod in LodType::ALL {
            self.swap_lod[lod.index()] = store.get_or_insert_bool(section, lod.settings_key(), true);
        }
    }

    /// Merges one declarative config into this season's swap table and the
    /// affected-worldspace set. Called once per matching config, in sorted
    /// order, so later files extend or override earlier ones.
    pub fn load_data(&mut self, doc: &SwapDocument, provider: &impl ContentProvider) {
        for section in doc.sections() {
            if section == WORLDSPACES {
                for entry in doc.entries(section) {
                    let name = entry.split_once('=').map_or(entry.as_str(), |(k, _)| k);
                    let name = name.trim();
                    if !name.is_empty() {
                        self.worldspaces.insert(name.to_string());
                    }
                }
            } else if let Some(category) = FormCategory::from_section(section) {
                let entries = doc.entries(section);
                let loaded = self.swaps.load_form_swaps(category, entries, provider);
                log::info!("\t\t[{section}] read {loaded}/{} swaps", entries.len());
            } else {
                log::warn!("\t\tunknown section [{section}], skipping");
            }
        }
    }

    /// Writes the accumulated worldspace names back to the settings store
    /// for external LOD tooling; not consumed internally.
    pub fn save_data(&self, store: &mut impl SettingsStore) {
        if self.worldspaces.is_empty() {
            return;
        }
        let joined = self
            .worldspaces
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(",");
        store.set(self.kind.section(), WORLDSPACES, &joined);
    }

    /// Verifies on-disk presence of the per-worldspace seasonal LOD assets.
    /// Absence is logged, never an error; missing LOD only means that LOD
    /// keeps its vanilla look.
    pub fn check_lod_exists(&self, lod_root: &Path) {
        let suffix = self.kind.suffix();
        for worldspace in &self.worldspaces {
            let variant = format!("{worldspace}_{suffix}");
            let meshes = lod_root.join("meshes").join("terrain").join(&variant);
            let textures = lod_root.join("textures").join("terrain").join(&variant);
            if !meshes.is_dir() {
                log::warn!("\tno {suffix} LOD meshes for {worldspace}");
            }
            if !textures.is_dir() {
                log::warn!("\tno {suffix} LOD textures for {worldspace}");
            }
        }
    }

    #[must_use]
    pub const fn can_apply_snow_shader(&self) -> bool {
        self.apply_snow_shader
    }

    #[must_use]
    pub const fn can_swap_lod(&self, lod: LodType) -> bool {
        self.swap_lod[lod.index()]
    }

    /// Landscape swaps apply only when this season configured any.
    #[must_use]
    pub fn can_swap_landscape(&self) -> bool {
        self.swaps.has_swaps(FormCategory::LandTextures)
    }

    #[must_use]
    pub fn can_swap_form(&self, category: FormCategory) -> bool {
        self.swaps.has_swaps(category)
    }

    #[must_use]
    pub fn swaps(&self) -> &FormSwapMap {
        &self.swaps
    }

    pub fn swaps_mut(&mut self) -> &mut FormSwapMap {
        &mut self.swaps
    }

    #[must_use]
    pub fn worldspaces(&self) -> &BTreeSet<String> {
        &self.worldspaces
    }
}
