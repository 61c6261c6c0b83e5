//! Multi-keyed lookup from base asset identity to seasonal replacements.
use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ContentProvider;
use crate::swap_config::SwapDocument;

/// Opaque runtime identity of a loaded form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormId(pub u32);

/// Stable content identifier: plugin-relative form id plus the owning
/// plugin, written `0x<hex>~<plugin>` in config files. Load-order
/// independent; resolved to a [`FormId`] through the content provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FormKey {
    pub id: u32,
    pub plugin: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormKeyError {
    #[error("form key `{0}` is missing the `~<plugin>` part")]
    MissingPlugin(String),
    #[error("form key `{0}` has a malformed hex id")]
    BadId(String),
}

impl FormKey {
    #[must_use]
    pub fn new(id: u32, plugin: &str) -> Self {
        Self {
            id,
            plugin: plugin.to_string(),
        }
    }

    /// Parses the textual `0x<hex>~<plugin>` form.
    pub fn parse(raw: &str) -> Result<Self, FormKeyError> {
        let raw = raw.trim();
        let (id, plugin) = raw
            .split_once('~')
            .ok_or_else(|| FormKeyError::MissingPlugin(raw.to_string()))?;
        let plugin = plugin.trim();
        if plugin.is_empty() {
            return Err(FormKeyError::MissingPlugin(raw.to_string()));
        }
        let digits = id.trim().trim_start_matches("0x").trim_start_matches("0X");
        let id =
            u32::from_str_radix(digits, 16).map_err(|_| FormKeyError::BadId(raw.to_string()))?;
        Ok(Self {
            id,
            plugin: plugin.to_string(),
        })
    }
}

impl fmt::Display for FormKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:X}~{}", self.id, self.plugin)
    }
}

/// Closed set of swappable content categories. Categories are disjoint key
/// spaces: a swap declared in one can never satisfy a lookup in another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormCategory {
    LandTextures,
    Activators,
    Furniture,
    MovableStatics,
    Statics,
    Trees,
    Grass,
}

impl FormCategory {
    pub const ALL: [FormCategory; 7] = [
        FormCategory::LandTextures,
        FormCategory::Activators,
        FormCategory::Furniture,
        FormCategory::MovableStatics,
        FormCategory::Statics,
        FormCategory::Trees,
        FormCategory::Grass,
    ];

    /// Categories covered by the auto-generated winter bundle. Grass swaps
    /// are always hand-authored.
    pub const GENERATED: [FormCategory; 6] = [
        FormCategory::LandTextures,
        FormCategory::Activators,
        FormCategory::Furniture,
        FormCategory::MovableStatics,
        FormCategory::Statics,
        FormCategory::Trees,
    ];

    /// Config section name for this category.
    #[must_use]
    pub const fn section(self) -> &'static str {
        match self {
            FormCategory::LandTextures => "LandTextures",
            FormCategory::Activators => "Activators",
            FormCategory::Furniture => "Furniture",
            FormCategory::MovableStatics => "MovableStatics",
            FormCategory::Statics => "Statics",
            FormCategory::Trees => "Trees",
            FormCategory::Grass => "Grass",
        }
    }

    #[must_use]
    pub fn from_section(name: &str) -> Option<Self> {
        FormCategory::ALL
            .into_iter()
            .find(|category| category.section() == name)
    }

    /// Settings key disabling this category in the generated winter bundle.
    #[must_use]
    pub const fn skip_key(self) -> &'static str {
        match self {
            FormCategory::LandTextures => "Skip Land Textures",
            FormCategory::Activators => "Skip Activators",
            FormCategory::Furniture => "Skip Furniture",
            FormCategory::MovableStatics => "Skip Movable Statics",
            FormCategory::Statics => "Skip Statics",
            FormCategory::Trees => "Skip Trees",
            FormCategory::Grass => "Skip Grass",
        }
    }

    pub(crate) const fn index(self) -> usize {
        self as usize
    }
}

/// Resolved record for one loaded form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormInfo {
    pub id: FormId,
    pub key: FormKey,
    pub editor_id: String,
    pub category: FormCategory,
}

/// Per-season lookup table from base form to replacement, keyed by category.
/// Lookups are O(1); all mutation happens during the content-load phase.
#[derive(Debug, Clone)]
pub struct FormSwapMap {
    swaps: [HashMap<FormId, FormId>; FormCategory::ALL.len()],
    /// Alternate index into the land-texture table: texture set -> owning
    /// base land texture, built at load time.
    texture_sets: HashMap<FormId, FormId>,
}

impl Default for FormSwapMap {
    fn default() -> Self {
        Self {
            swaps: std::array::from_fn(|_| HashMap::new()),
            texture_sets: HashMap::new(),
        }
    }
}

impl FormSwapMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a swap, returning the previously declared replacement when
    /// the base was already mapped (last write wins).
    pub fn insert(
        &mut self,
        category: FormCategory,
        base: FormId,
        replacement: FormId,
    ) -> Option<FormId> {
        self.swaps[category.index()].insert(base, replacement)
    }

    #[must_use]
    pub fn get(&self, category: FormCategory, base: FormId) -> Option<FormId> {
        self.swaps[category.index()].get(&base).copied()
    }

    /// Replacement for a placed-object base form, if one was declared for
    /// its category.
    #[must_use]
    pub fn get_swap_form(&self, form: &FormInfo) -> Option<FormId> {
        self.get(form.category, form.id)
    }

    #[must_use]
    pub fn get_swap_land_texture(&self, base: FormId) -> Option<FormId> {
        self.get(FormCategory::LandTextures, base)
    }

    /// Land-texture replacement looked up through the texture set the base
    /// land texture renders with.
    #[must_use]
    pub fn get_swap_land_texture_from_texture_set(&self, texture_set: FormId) -> Option<FormId> {
        let base = *self.texture_sets.get(&texture_set)?;
        self.get_swap_land_texture(base)
    }

    #[must_use]
    pub fn has_swaps(&self, category: FormCategory) -> bool {
        !self.swaps[category.index()].is_empty()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.swaps.iter().all(HashMap::is_empty)
    }

    /// Parses declarative `base=replacement` entries for one category and
    /// inserts them, resolving textual keys to runtime identity. Bare keys
    /// are no-ops, unresolvable or self-referential entries are skipped
    /// with a warning, later duplicates overwrite earlier ones. Returns the
    /// number of entries inserted.
    pub fn load_form_swaps(
        &mut self,
        category: FormCategory,
        values: &[String],
        provider: &impl ContentProvider,
    ) -> usize {
        let mut inserted = 0;
        for raw in values {
            // a bare key declares "no swap" and is tolerated
            let Some((lhs, rhs)) = raw.split_once('=') else {
                continue;
            };
            let (base_key, replacement_key) = match (FormKey::parse(lhs), FormKey::parse(rhs)) {
                (Ok(base), Ok(replacement)) => (base, replacement),
                (Err(err), _) | (_, Err(err)) => {
                    log::warn!("\t\tskipping `{raw}`: {err}");
                    continue;
                }
            };
            let Some(base) = provider.resolve(&base_key) else {
                log::warn!("\t\tskipping `{raw}`: `{base_key}` not loaded");
                continue;
            };
            let Some(replacement) = provider.resolve(&replacement_key) else {
                log::warn!("\t\tskipping `{raw}`: `{replacement_key}` not loaded");
                continue;
            };
            if base.id == replacement.id {
                log::warn!("\t\tskipping `{raw}`: base maps to itself");
                continue;
            }
            self.insert(category, base.id, replacement.id);
            if category == FormCategory::LandTextures
                && let Some(texture_set) = provider.texture_set_of(base.id)
            {
                self.texture_sets.insert(texture_set, base.id);
            }
            inserted += 1;
        }
        inserted
    }

    /// Generates the winter bundle from the live content set and writes it
    /// into `doc`. Runs only when `force` is set (content-set fingerprint
    /// changed) or no generated data exists yet; returns whether generation
    /// occurred so the caller can persist `doc`.
    ///
    /// The content set is enumerated exactly once and grouped by category.
    /// A replacement is the first form whose editor id matches one of the
    /// winter naming candidates for the base; forms that already look like
    /// winter variants never become bases, which also rules out
    /// self-referential entries and swap chains.
    pub fn generate_form_swaps(
        &mut self,
        doc: &mut SwapDocument,
        provider: &impl ContentProvider,
        force: bool,
    ) -> bool {
        let has_generated = FormCategory::GENERATED
            .iter()
            .any(|category| !doc.entries(category.section()).is_empty());
        if !force && has_generated {
            return false;
        }

        for category in FormCategory::GENERATED {
            doc.clear_section(category.section());
        }

        let mut by_category: [Vec<FormInfo>; FormCategory::ALL.len()] =
            std::array::from_fn(|_| Vec::new());
        for form in provider.all_forms() {
            if FormCategory::GENERATED.contains(&form.category) {
                by_category[form.category.index()].push(form);
            }
        }

        for category in FormCategory::GENERATED {
            let forms = &by_category[category.index()];
            let index: HashMap<String, &FormInfo> = forms
                .iter()
                .map(|form| (form.editor_id.to_ascii_lowercase(), form))
                .collect();

            let mut generated = 0usize;
            for base in forms {
                if is_winter_variant(&base.editor_id) {
                    continue;
                }
                let Some(replacement) = find_winter_variant(base, &index) else {
                    continue;
                };
                self.insert(category, base.id, replacement.id);
                if category == FormCategory::LandTextures
                    && let Some(texture_set) = provider.texture_set_of(base.id)
                {
                    self.texture_sets.insert(texture_set, base.id);
                }
                doc.push_entry(
                    category.section(),
                    &format!("{}={}", base.key, replacement.key),
                );
                generated += 1;
            }
            if generated > 0 {
                log::info!("\t[{}] generated {generated} swaps", category.section());
            }
        }

        true
    }
}

fn is_winter_variant(editor_id: &str) -> bool {
    let lower = editor_id.to_ascii_lowercase();
    lower.contains("snow") || lower.contains("winter")
}

fn find_winter_variant<'a>(
    base: &FormInfo,
    index: &HashMap<String, &'a FormInfo>,
) -> Option<&'a FormInfo> {
    let eid = &base.editor_id;
    let candidates = [
        format!("{eid}Snow"),
        format!("Snow{eid}"),
        format!("Winter{eid}"),
        format!("{eid}Winter"),
    ];
    candidates
        .iter()
        .find_map(|candidate| index.get(&candidate.to_ascii_lowercase()).copied())
        .filter(|found| found.id != base.id)
}
