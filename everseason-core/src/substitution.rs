//! Thin adapters for engine asset-resolution call sites.
//!
//! Each helper answers "which identifier should this call site actually
//! use", returning the base identity whenever no swap applies. These run on
//! per-frame paths, so they are allocation-free and never fail.
use crate::ContentProvider;
use crate::form_swap::{FormId, FormInfo};
use crate::manager::SeasonManager;

/// Texture set handed to the landscape shader. When landscape swapping is
/// active and the set belongs to a swapped land texture, the replacement's
/// texture set is used instead.
#[must_use]
pub fn effective_texture_set(
    manager: &SeasonManager,
    provider: &impl ContentProvider,
    texture_set: FormId,
) -> FormId {
    if !manager.is_landscape_swap_allowed() {
        return texture_set;
    }
    manager
        .get_swap_land_texture_from_texture_set(texture_set)
        .and_then(|land_texture| provider.texture_set_of(land_texture))
        .unwrap_or(texture_set)
}

/// Land texture whose grass list should be rendered. `underwater` marks
/// grass that only renders below water, which never swaps.
#[must_use]
pub fn effective_grass_source(
    manager: &SeasonManager,
    land_texture: FormId,
    underwater: bool,
) -> FormId {
    if underwater || !manager.can_swap_grass() {
        return land_texture;
    }
    manager
        .get_swap_land_texture(land_texture)
        .unwrap_or(land_texture)
}

/// Land texture whose physics material applies underfoot.
#[must_use]
pub fn effective_material_source(manager: &SeasonManager, land_texture: FormId) -> FormId {
    if !manager.is_landscape_swap_allowed() {
        return land_texture;
    }
    manager
        .get_swap_land_texture(land_texture)
        .unwrap_or(land_texture)
}

/// Base form to place for an object reference.
#[must_use]
pub fn effective_form(manager: &SeasonManager, form: &FormInfo) -> FormId {
    if !manager.can_swap_form(form.category) {
        return form.id;
    }
    manager.get_swap_form(form).unwrap_or(form.id)
}
