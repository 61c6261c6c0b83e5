use std::collections::HashSet;

use everseason_core::store::{MemoryStore, SettingsStore};
use everseason_core::swap_config::{MemoryConfigSource, SwapDocument};
use everseason_core::{
    FormCategory, FormId, FormInfo, FormKey, Month, SeasonEngine, SeasonKind, StaticContent,
    effective_form, effective_grass_source, effective_material_source, effective_texture_set,
};

const PLUGIN: &str = "Everseason.esp";

fn form(id: u32, editor_id: &str, category: FormCategory) -> FormInfo {
    FormInfo {
        id: FormId(id),
        key: FormKey::new(id, PLUGIN),
        editor_id: editor_id.to_string(),
        category,
    }
}

fn fixture_provider() -> StaticContent {
    let mut provider = StaticContent::new(2);
    provider.add_form(form(0x100, "LGrassLand01", FormCategory::LandTextures));
    provider.add_form(form(0x101, "LGrassLand01Snow", FormCategory::LandTextures));
    provider.link_texture_set(FormId(0x100), FormId(0x900));
    provider.link_texture_set(FormId(0x101), FormId(0x901));

    provider.add_form(form(0x200, "FarmhouseWall", FormCategory::Statics));
    provider.add_form(form(0x201, "FarmhouseWallSnow", FormCategory::Statics));

    provider.add_form(form(0x400, "BarrelPlain", FormCategory::MovableStatics));

    provider.add_form(form(0x500, "GrassMeadow", FormCategory::Grass));
    provider.add_form(form(0x501, "GrassMeadowDead", FormCategory::Grass));
    provider
}

fn winter_engine() -> (
    SeasonEngine<StaticContent, MemoryStore, MemoryConfigSource>,
    StaticContent,
) {
    let provider = fixture_provider();

    let mut store = MemoryStore::new();
    store.set("Settings", "Season Type", "1"); // permanent winter

    // grass swaps are hand-authored, never generated
    let configs = MemoryConfigSource::new();
    let mut grass = SwapDocument::new();
    grass.push_entry(
        "Grass",
        &format!("{}={}", FormKey::new(0x500, PLUGIN), FormKey::new(0x501, PLUGIN)),
    );
    grass.push_entry("Worldspaces", "Tamriel");
    configs.insert("grass_WIN.ini", grass);

    let engine = SeasonEngine::new(provider.clone(), store, configs);
    (engine, provider)
}

#[test]
fn call_sites_resolve_through_the_active_season() {
    let (mut engine, provider) = winter_engine();
    engine.on_settings_phase();
    engine
        .on_content_ready(&HashSet::<String>::new())
        .expect("memory source always persists");
    engine.on_zone_changed(true);

    let manager = engine.manager();
    assert_eq!(manager.get_season(), Some(SeasonKind::Winter));

    // landscape shader: swapped texture set resolves through the base
    // land texture to the replacement's texture set
    assert_eq!(
        effective_texture_set(manager, &provider, FormId(0x900)),
        FormId(0x901)
    );
    // unknown texture sets pass through untouched
    assert_eq!(
        effective_texture_set(manager, &provider, FormId(0x999)),
        FormId(0x999)
    );

    // grass rendering honors the hand-authored swap, except underwater
    assert_eq!(
        effective_grass_source(manager, FormId(0x500), false),
        FormId(0x501)
    );
    assert_eq!(
        effective_grass_source(manager, FormId(0x500), true),
        FormId(0x500)
    );

    // footstep material follows the landscape swap
    assert_eq!(
        effective_material_source(manager, FormId(0x100)),
        FormId(0x101)
    );

    // placed objects: generated swap hits, unmatched base passes through
    let wall = form(0x200, "FarmhouseWall", FormCategory::Statics);
    assert_eq!(effective_form(manager, &wall), FormId(0x201));
    let barrel = form(0x400, "BarrelPlain", FormCategory::MovableStatics);
    assert_eq!(effective_form(manager, &barrel), FormId(0x400));

    // the worldspace set was exported for LOD tooling
    assert_eq!(
        engine.store().get("Winter", "Worldspaces").as_deref(),
        Some("Tamriel")
    );
}

#[test]
fn interiors_resolve_everything_to_the_base_identity() {
    let (mut engine, provider) = winter_engine();
    engine.on_settings_phase();
    engine
        .on_content_ready(&HashSet::<String>::new())
        .unwrap();
    engine.on_zone_changed(false);

    let manager = engine.manager();
    assert_eq!(manager.get_season(), None);
    assert_eq!(
        effective_texture_set(manager, &provider, FormId(0x900)),
        FormId(0x900)
    );
    assert_eq!(
        effective_grass_source(manager, FormId(0x500), false),
        FormId(0x500)
    );
    let wall = form(0x200, "FarmhouseWall", FormCategory::Statics);
    assert_eq!(effective_form(manager, &wall), FormId(0x200));
}

#[test]
fn save_slots_round_trip_and_delete_through_the_engine() {
    let (mut engine, _provider) = winter_engine();
    engine.on_settings_phase();
    engine
        .on_content_ready(&HashSet::<String>::new())
        .unwrap();
    engine.on_zone_changed(true);

    engine.on_save("slot-one");
    assert_eq!(
        engine.store().get("Saves", "slot-one").as_deref(),
        Some("1|0")
    );

    engine
        .manager_mut()
        .set_season_override(Some(SeasonKind::Autumn));
    engine.on_save("slot-one");
    assert_eq!(
        engine.store().get("Saves", "slot-one").as_deref(),
        Some("1|4")
    );

    // a fresh session restores the slot silently
    engine.manager_mut().set_season_override(None);
    engine.on_pre_load("slot-one");
    assert!(engine.manager_mut().update_season());
    assert!(engine.manager_mut().take_events().is_empty());
    assert_eq!(
        engine.manager().season_override(),
        Some(SeasonKind::Autumn)
    );

    engine.on_delete("slot-one");
    assert_eq!(engine.store().get("Saves", "slot-one"), None);
}

#[test]
fn content_ready_prunes_sidecar_entries_for_deleted_saves() {
    let provider = fixture_provider();
    let mut store = MemoryStore::new();
    store.set("Saves", "alive", "1|0");
    store.set("Saves", "gone", "2|0");

    let mut engine = SeasonEngine::new(provider, store, MemoryConfigSource::new());
    engine.on_settings_phase();

    let saves: HashSet<String> = ["alive".to_string()].into_iter().collect();
    engine.on_content_ready(&saves).unwrap();

    assert_eq!(engine.store().keys("Saves"), vec!["alive"]);
}

#[test]
fn teleport_door_activation_requests_a_purge_on_transition() {
    let provider = fixture_provider();
    let mut engine = SeasonEngine::new(provider, MemoryStore::new(), MemoryConfigSource::new());
    engine.on_settings_phase(); // defaults: seasonal calendar

    engine
        .on_content_ready(&HashSet::<String>::new())
        .unwrap();
    assert_eq!(engine.manager().current_season(), Some(SeasonKind::Summer));

    // the season changed while the player was inside; leaving through a
    // teleport door is the moment to purge buffered cells
    engine.on_zone_changed(false);
    engine.manager_mut().set_month(Month::December);
    assert!(!engine.on_activate(false));
    assert!(engine.on_activate(true));
    assert_eq!(engine.manager().current_season(), Some(SeasonKind::Winter));
    assert!(!engine.on_activate(true));

    // exterior activations never drive the transition
    engine.on_zone_changed(true);
    engine.manager_mut().set_month(Month::April);
    assert!(!engine.on_activate(true));
}
