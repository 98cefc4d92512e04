//! Robot-mode end-to-end tests.

use crate::common::cli::CliRunner;
use crate::common::fixtures::{DbFixture, DST_MAC, SRC_MAC};
use crate::common::init_test_logging;

#[test]
fn robot_quick_start_outputs_json() {
    init_test_logging();
    let cli = CliRunner::new();
    let result = cli.run(&["--robot"]);
    result.assert_success();

    let json = result.json();
    assert_eq!(json.get("tool").and_then(|v| v.as_str()), Some("petlink"));
    assert!(json.get("discovery").is_some());
    assert!(json.get("output_modes").is_some());
}

#[test]
fn robot_version_has_version_field() {
    init_test_logging();
    let cli = CliRunner::new();
    let result = cli.run(&["version", "--format=json"]);
    result.assert_success();
    assert!(result.json().get("version").is_some());
}

#[test]
fn robot_list_is_an_array() {
    init_test_logging();
    let fixture = DbFixture::empty().unwrap();
    let cli = CliRunner::new().with_env("PETLINK_DB", fixture.db_str());

    let result = cli.run_robot(&["list"]);
    result.assert_success();
    let json = result.json();
    assert!(json.is_array());
    assert_eq!(json.as_array().unwrap().len(), 0);
}

#[test]
fn robot_register_then_list_round_trip() {
    init_test_logging();
    let fixture = DbFixture::empty().unwrap();
    let cli = CliRunner::new().with_env("PETLINK_DB", fixture.db_str());

    cli.run_robot(&["register", SRC_MAC, DST_MAC, "--interface", "eth0", "--label", "Lab1"])
        .assert_success();

    let result = cli.run_robot(&["list"]);
    result.assert_success();
    let json = result.json();
    assert_eq!(json.as_array().unwrap().len(), 1);
    assert_eq!(json[0]["mac_source"], SRC_MAC);
    assert_eq!(json[0]["mac_destiny"], DST_MAC);
    assert_eq!(json[0]["label"], "Lab1");
}

#[test]
fn robot_show_renders_seeded_configuration() {
    init_test_logging();
    let fixture = DbFixture::seeded().unwrap();
    let cli = CliRunner::new().with_env("PETLINK_DB", fixture.db_str());

    let result = cli.run_robot(&["show", SRC_MAC]);
    result.assert_success();
    let json = result.json();
    assert_eq!(json["label"], "MC1");
    assert_eq!(json["last_state"]["X_04_RO_ON | X_05_RO_OFF"], "ON");
    assert_eq!(json["pets"].as_array().unwrap().len(), 1);
}

#[test]
fn robot_errors_are_json_on_stderr() {
    init_test_logging();
    let fixture = DbFixture::empty().unwrap();
    let cli = CliRunner::new()
        .with_env("PETLINK_DB", fixture.db_str())
        .with_env("RUST_LOG", "off");

    let result = cli.run_robot(&["show", "00:00:00:00:00:09"]);
    result.assert_failure();

    let json = result.stderr_json();
    assert_eq!(json.get("error").and_then(|v| v.as_bool()), Some(true));
    assert!(json.get("message").is_some());
    assert!(json.get("suggestion").is_some());
    assert_eq!(json.get("recoverable").and_then(|v| v.as_bool()), Some(true));
}

#[test]
fn robot_protocol_lists_every_command() {
    init_test_logging();
    let cli = CliRunner::new();
    let result = cli.run_robot(&["protocol"]);
    result.assert_success();

    let json = result.json();
    assert_eq!(json["commands"].as_array().unwrap().len(), 28);
    assert!(!json["configs"].as_array().unwrap().is_empty());
}

#[test]
fn robot_pets_reflect_association_changes() {
    init_test_logging();
    let fixture = DbFixture::seeded().unwrap();
    let cli = CliRunner::new().with_env("PETLINK_DB", fixture.db_str());

    cli.run_robot(&["associate", "2", "--mc", DST_MAC]).assert_success();
    cli.run_robot(&["enable", "2"]).assert_success();

    let result = cli.run_robot(&["pets"]);
    result.assert_success();
    let slots = result.json();
    let slot2 = slots
        .as_array()
        .unwrap()
        .iter()
        .find(|s| s["pet_num"] == 2)
        .expect("slot 2 present");
    assert_eq!(slot2["mc_mac"], DST_MAC);
    assert_eq!(slot2["enabled"], true);
    assert_eq!(slot2["label"], "MC1");
}

#[test]
fn robot_dry_run_send_does_not_error() {
    init_test_logging();
    let fixture = DbFixture::seeded().unwrap();
    let cli = CliRunner::new().with_env("PETLINK_DB", fixture.db_str());

    let result = cli.run(&["send", SRC_MAC, "--dry-run", "--format=json-compact"]);
    result.assert_success();
    result.assert_stdout_contains("X_04_RO_ON");
}
