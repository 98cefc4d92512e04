//! Dual-scope macro CRUD and rename semantics.

use petlink::macros::MacroManager;
use petlink::model::Macro;
use petlink::store::JsonStore;

use crate::common::fixtures::{read_json, DbFixture, SRC_MAC};
use crate::common::init_test_logging;

fn store_over(fixture: &DbFixture) -> JsonStore {
    let mut store = JsonStore::new(&fixture.db_path);
    store.load();
    store
}

#[test]
fn same_name_lives_independently_in_both_scopes() {
    init_test_logging();
    let fixture = DbFixture::seeded().unwrap();
    let mut store = store_over(&fixture);
    let mut manager = MacroManager::new(&mut store);

    manager.save(&Macro::new("M1"), None).unwrap();
    manager.save(&Macro::new("M1"), Some(SRC_MAC)).unwrap();

    assert!(manager.list(None).contains(&"M1".to_string()));
    assert_eq!(manager.list(Some(SRC_MAC)), vec!["M1".to_string()]);

    // Deleting in one scope leaves the other untouched.
    assert!(manager.delete("M1", None).unwrap());
    assert!(!manager.exists("M1", None));
    assert!(manager.exists("M1", Some(SRC_MAC)));
}

#[test]
fn mc_scope_rejects_unregistered_boards() {
    init_test_logging();
    let fixture = DbFixture::seeded().unwrap();
    let mut store = store_over(&fixture);
    let mut manager = MacroManager::new(&mut store);

    assert!(manager.save(&Macro::new("M1"), Some("00:00:00:00:00:02")).is_err());
    assert!(manager.load("M1", Some("00:00:00:00:00:02")).is_none());
    assert!(manager.list(Some("00:00:00:00:00:02")).is_empty());
}

#[test]
fn rename_is_collision_guarded_in_each_scope() {
    init_test_logging();
    let fixture = DbFixture::seeded().unwrap();
    let mut store = store_over(&fixture);
    let mut manager = MacroManager::new(&mut store);

    manager.save(&Macro::new("a"), None).unwrap();
    manager.save(&Macro::new("b"), None).unwrap();
    assert!(manager.rename("a", "b", None).is_err());

    // The same target name is free in the controller scope.
    manager.save(&Macro::new("a"), Some(SRC_MAC)).unwrap();
    manager.rename("a", "b", Some(SRC_MAC)).unwrap();
    assert_eq!(manager.list(Some(SRC_MAC)), vec!["b".to_string()]);
}

#[test]
fn rename_moves_contents_without_loss() {
    init_test_logging();
    let fixture = DbFixture::seeded().unwrap();
    let mut store = store_over(&fixture);
    let mut manager = MacroManager::new(&mut store);

    let mut original = Macro::new("old");
    original.delta_time = Some(2.0);
    original
        .last_state
        .insert("X_FF_Reset".to_string(), serde_json::json!("ON"));
    manager.save(&original, None).unwrap();

    manager.rename("old", "new", None).unwrap();

    let renamed = manager.load("new", None).expect("renamed macro");
    assert_eq!(renamed.delta_time, Some(2.0));
    assert_eq!(renamed.last_state["X_FF_Reset"], "ON");
    assert!(manager.load("old", None).is_none());
}

#[test]
fn saves_are_flushed_to_disk_immediately() {
    init_test_logging();
    let fixture = DbFixture::seeded().unwrap();
    {
        let mut store = store_over(&fixture);
        let mut manager = MacroManager::new(&mut store);
        manager.save(&Macro::new("durable"), None).unwrap();
    }

    let doc = read_json(&fixture.db_path).unwrap();
    assert!(doc["macros"]["durable"].is_object());
    // The seeded universal macro is still there.
    assert!(doc["macros"]["warmup"].is_object());
}

#[test]
fn nested_macros_live_inside_the_controller_entry() {
    init_test_logging();
    let fixture = DbFixture::seeded().unwrap();
    {
        let mut store = store_over(&fixture);
        let mut manager = MacroManager::new(&mut store);
        manager.save(&Macro::new("local"), Some(SRC_MAC)).unwrap();
    }

    let doc = read_json(&fixture.db_path).unwrap();
    assert!(doc["mc_registered"][SRC_MAC]["macros"]["local"].is_object());
    assert!(doc["macros"]["local"].is_null());
}
