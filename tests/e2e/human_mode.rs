//! Human-mode end-to-end tests, via assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;

use crate::common::fixtures::{DbFixture, DST_MAC, SRC_MAC};
use crate::common::init_test_logging;

fn petlink(fixture: &DbFixture) -> Command {
    let mut cmd = Command::cargo_bin("petlink").expect("binary built");
    cmd.env("PETLINK_DB", fixture.db_str())
        .env("NO_COLOR", "1")
        .env_remove("PETLINK_FORMAT");
    cmd
}

#[test]
fn register_and_list_read_back() {
    init_test_logging();
    let fixture = DbFixture::empty().unwrap();

    petlink(&fixture)
        .args(["register", SRC_MAC, DST_MAC, "--interface", "eth0", "--label", "Lab1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Registered Lab1"));

    petlink(&fixture)
        .args(["list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Lab1").and(predicate::str::contains(DST_MAC)));
}

#[test]
fn unregister_twice_warns_the_second_time() {
    init_test_logging();
    let fixture = DbFixture::seeded().unwrap();

    petlink(&fixture)
        .args(["unregister", SRC_MAC])
        .assert()
        .success()
        .stdout(predicate::str::contains("Unregistered"));

    petlink(&fixture)
        .args(["unregister", SRC_MAC])
        .assert()
        .success()
        .stdout(predicate::str::contains("No board registered"));
}

#[test]
fn out_of_range_pet_slot_fails() {
    init_test_logging();
    let fixture = DbFixture::seeded().unwrap();

    petlink(&fixture)
        .args(["associate", "11", "--mc", DST_MAC])
        .assert()
        .failure()
        .stderr(predicate::str::contains("out of range"));

    petlink(&fixture)
        .args(["associate", "0", "--mc", DST_MAC])
        .assert()
        .failure()
        .stderr(predicate::str::contains("out of range"));
}

#[test]
fn pets_table_shows_assignments() {
    init_test_logging();
    let fixture = DbFixture::seeded().unwrap();

    petlink(&fixture)
        .args(["pets"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("PET  1")
                .and(predicate::str::contains("MC1"))
                .and(predicate::str::contains("unassigned")),
        );
}

#[test]
fn enabling_an_empty_slot_is_rejected() {
    init_test_logging();
    let fixture = DbFixture::seeded().unwrap();

    petlink(&fixture)
        .args(["enable", "4"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no associated controller"));
}

#[test]
fn macro_lifecycle_through_the_cli() {
    init_test_logging();
    let fixture = DbFixture::seeded().unwrap();

    petlink(&fixture)
        .args(["macro", "save", "M1", "--from", SRC_MAC])
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved macro 'M1'"));

    petlink(&fixture)
        .args(["macro", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("M1").and(predicate::str::contains("warmup")));

    petlink(&fixture)
        .args(["macro", "rename", "M1", "M2"])
        .assert()
        .success();

    petlink(&fixture)
        .args(["macro", "delete", "M2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted macro 'M2'"));

    petlink(&fixture)
        .args(["macro", "delete", "M2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("not found"));
}

#[test]
fn set_state_updates_shown_selection() {
    init_test_logging();
    let fixture = DbFixture::seeded().unwrap();

    petlink(&fixture)
        .args(["set-state", SRC_MAC, "X_04_RO_ON | X_05_RO_OFF", "OFF"])
        .assert()
        .success()
        .stdout(predicate::str::contains("set to OFF"));

    petlink(&fixture)
        .args(["show", SRC_MAC])
        .assert()
        .success()
        .stdout(predicate::str::contains("[OFF]"));
}

#[test]
fn dry_run_send_prints_plan_without_sending() {
    init_test_logging();
    let fixture = DbFixture::seeded().unwrap();

    petlink(&fixture)
        .args(["send", SRC_MAC, "--dry-run", "-c", "X_FF_Reset", "--reps", "3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Would send X_FF_Reset (reps=3"));
}

#[test]
fn backup_copies_the_database_file() {
    init_test_logging();
    let fixture = DbFixture::seeded().unwrap();
    let target = fixture.dir.path().join("copy.json");

    petlink(&fixture)
        .args(["backup", "--to", target.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("backed up"));

    assert!(target.exists());
}
