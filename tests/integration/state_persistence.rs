//! State manager persistence and document schema.

use petlink::macros::MacroManager;
use petlink::model::{Macro, MicroController};
use petlink::state::StateManager;
use petlink::store::JsonStore;

use crate::common::fixtures::{read_json, DbFixture, DST_MAC, SRC_MAC};
use crate::common::init_test_logging;

fn sample_mc() -> MicroController {
    MicroController::new(SRC_MAC, DST_MAC, "eth0", "MC1")
}

#[test]
fn register_writes_the_expected_document_shape() {
    init_test_logging();
    let fixture = DbFixture::empty().unwrap();

    let mut state = StateManager::with_store(JsonStore::new(&fixture.db_path));
    state.load_from_store();
    state.register_mc(sample_mc()).unwrap();
    state.associate_pet(1, Some(DST_MAC.to_string()), true).unwrap();

    let doc = read_json(&fixture.db_path).unwrap();
    let entry = &doc["mc_registered"][SRC_MAC];
    assert_eq!(entry["mac_destiny"], DST_MAC);
    assert_eq!(entry["interface_destiny"], "eth0");
    assert_eq!(entry["label"], "MC1");
    assert!(entry["command_configs"].is_object());
    assert!(entry["last_state"].is_object());
    assert!(entry["macros"].is_object());

    let assoc = &doc["pet_associations"]["1"];
    assert_eq!(assoc["mc"], DST_MAC);
    assert_eq!(assoc["enabled"], true);
    // Untouched slots are persisted too, unassigned.
    assert_eq!(doc["pet_associations"]["10"]["mc"], serde_json::Value::Null);

    assert!(doc["macros"].is_object());
}

#[test]
fn seeded_document_hydrates_the_graph() {
    init_test_logging();
    let fixture = DbFixture::seeded().unwrap();

    let mut state = StateManager::with_store(JsonStore::new(&fixture.db_path));
    state.load_from_store();

    let mc = state.get_mc(SRC_MAC).expect("seeded controller");
    assert_eq!(mc.label, "MC1");
    assert_eq!(mc.selected_state("X_04_RO_ON | X_05_RO_OFF"), Some("ON"));
    assert_eq!(mc.delay_ms("X_04_RO_ON | X_05_RO_OFF"), 500);

    assert_eq!(state.get_enabled_pet_mcs(), vec![DST_MAC.to_string()]);
    assert_eq!(state.list_macros(None), vec!["warmup".to_string()]);
}

#[test]
fn corrupted_database_starts_empty_without_crashing() {
    init_test_logging();
    let fixture = DbFixture::corrupted().unwrap();

    let mut state = StateManager::with_store(JsonStore::new(&fixture.db_path));
    state.load_from_store();

    assert!(state.get_all_registered_mcs().is_empty());
    assert!(state.list_macros(None).is_empty());
    // Still writable afterwards.
    state.register_mc(sample_mc()).unwrap();
    let doc = read_json(&fixture.db_path).unwrap();
    assert!(doc["mc_registered"][SRC_MAC].is_object());
}

#[test]
fn unregister_cascade_survives_reload() {
    init_test_logging();
    let fixture = DbFixture::empty().unwrap();

    {
        let mut state = StateManager::with_store(JsonStore::new(&fixture.db_path));
        state.load_from_store();
        state.register_mc(sample_mc()).unwrap();
        state.associate_pet(3, Some(DST_MAC.to_string()), true).unwrap();
        assert!(state.unregister_mc(SRC_MAC));
    }

    let mut restored = StateManager::with_store(JsonStore::new(&fixture.db_path));
    restored.load_from_store();

    assert!(restored.get_mc_by_destiny(DST_MAC).is_none());
    let assoc = restored.get_pet_association(3).unwrap();
    assert!(assoc.mc_mac.is_none());
    assert!(!assoc.enabled);
}

#[test]
fn state_saves_preserve_macro_manager_writes() {
    init_test_logging();
    let fixture = DbFixture::empty().unwrap();

    let mut state = StateManager::with_store(JsonStore::new(&fixture.db_path));
    state.load_from_store();
    state.register_mc(sample_mc()).unwrap();

    // A macro saved through the macro manager, behind the state manager's back.
    {
        let mut store = JsonStore::new(&fixture.db_path);
        store.load();
        let mut manager = MacroManager::new(&mut store);
        manager.save(&Macro::new("side-saved"), None).unwrap();
    }

    // The next state mutation re-reads and merges before overwriting.
    state.associate_pet(2, Some(DST_MAC.to_string()), false).unwrap();

    let doc = read_json(&fixture.db_path).unwrap();
    assert!(
        doc["macros"]["side-saved"].is_object(),
        "macro written through MacroManager must survive a state save"
    );
    assert_eq!(doc["pet_associations"]["2"]["mc"], DST_MAC);
}

#[test]
fn controllers_round_trip_with_nested_macros() {
    init_test_logging();
    let fixture = DbFixture::empty().unwrap();

    {
        let mut state = StateManager::with_store(JsonStore::new(&fixture.db_path));
        state.load_from_store();
        state.register_mc(sample_mc()).unwrap();
        state.add_command_config(SRC_MAC, "X_04_RO_ON | X_05_RO_OFF").unwrap();
        state.set_last_state(SRC_MAC, "X_04_RO_ON | X_05_RO_OFF", "OFF").unwrap();
        let snap = Macro::snapshot_of("snap", state.get_mc(SRC_MAC).unwrap());
        state.save_macro(snap, Some(SRC_MAC)).unwrap();
    }

    let mut restored = StateManager::with_store(JsonStore::new(&fixture.db_path));
    restored.load_from_store();

    let mc = restored.get_mc(SRC_MAC).unwrap();
    assert_eq!(mc.selected_state("X_04_RO_ON | X_05_RO_OFF"), Some("OFF"));
    let snap = restored.load_macro("snap", Some(SRC_MAC)).expect("nested macro");
    assert_eq!(snap.name, "snap");
    assert!(snap.command_configs.contains_key("X_04_RO_ON | X_05_RO_OFF"));
}
