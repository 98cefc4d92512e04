//! Seeded database fixtures for registry scenarios.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde_json::json;
use tempfile::TempDir;

pub const SRC_MAC: &str = "aa:bb:cc:dd:ee:ff";
pub const DST_MAC: &str = "11:22:33:44:55:66";

/// A temp directory holding a database file path (not yet created).
pub struct DbFixture {
    pub dir: TempDir,
    pub db_path: PathBuf,
}

impl DbFixture {
    pub fn empty() -> Result<Self> {
        let dir = TempDir::new()?;
        let db_path = dir.path().join("db.json");
        Ok(Self { dir, db_path })
    }

    /// A database with one registered board, one enabled PET slot and one
    /// universal macro, in the persisted document shape.
    pub fn seeded() -> Result<Self> {
        let fixture = Self::empty()?;
        let document = json!({
            "mc_registered": {
                SRC_MAC: {
                    "mac_destiny": DST_MAC,
                    "interface_destiny": "eth0",
                    "label": "MC1",
                    "command_configs": {
                        "X_04_RO_ON | X_05_RO_OFF": {"ON": "X_04_RO_ON", "OFF": "X_05_RO_OFF"}
                    },
                    "last_state": {
                        "X_04_RO_ON | X_05_RO_OFF": "ON",
                        "X_04_RO_ON | X_05_RO_OFF_delta": 0.5
                    },
                    "macros": {}
                }
            },
            "macros": {
                "warmup": {"command_configs": {}, "last_state": {}}
            },
            "pet_associations": {
                "1": {"mc": DST_MAC, "enabled": true}
            }
        });
        write_json(&fixture.db_path, &document)?;
        Ok(fixture)
    }

    /// A database file holding invalid JSON.
    pub fn corrupted() -> Result<Self> {
        let fixture = Self::empty()?;
        fs::write(&fixture.db_path, "{this is not json")?;
        Ok(fixture)
    }

    pub fn db_str(&self) -> &str {
        self.db_path.to_str().expect("utf-8 temp path")
    }
}

pub fn write_json(path: &Path, value: &serde_json::Value) -> Result<()> {
    fs::write(path, serde_json::to_string_pretty(value)?)?;
    Ok(())
}

pub fn read_json(path: &Path) -> Result<serde_json::Value> {
    Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
}
