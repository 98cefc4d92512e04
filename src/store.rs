//! Single-document JSON persistence.
//!
//! One `JsonStore` wraps one file holding the whole application document
//! (registered controllers, PET associations, macros). Loading is forgiving:
//! a missing or corrupted file yields an empty document with a logged
//! warning, never an error, so the application stays usable. Saving rewrites
//! the whole file atomically (temp file + rename).

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::error::{PetlinkError, Result};

/// Default database filename when no path is configured.
pub const DEFAULT_DB_FILE: &str = "db.json";

/// JSON document store over a single file.
pub struct JsonStore {
    path: PathBuf,
    data: Map<String, Value>,
}

impl JsonStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            data: Map::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the document from disk.
    ///
    /// A missing file starts an empty document; malformed JSON is logged and
    /// also starts empty. Neither case is an error for the caller.
    pub fn load(&mut self) -> &Map<String, Value> {
        if !self.path.exists() {
            info!(path = %self.path.display(), "Database file does not exist, starting empty");
            self.data = Map::new();
            return &self.data;
        }

        match fs::read_to_string(&self.path) {
            Ok(contents) => match serde_json::from_str::<Value>(&contents) {
                Ok(Value::Object(map)) => {
                    debug!(path = %self.path.display(), keys = map.len(), "Database loaded");
                    self.data = map;
                }
                Ok(_) => {
                    warn!(path = %self.path.display(), "Database file is not a JSON object, starting empty");
                    self.data = Map::new();
                }
                Err(e) => {
                    warn!(path = %self.path.display(), error = %e, "Database file is corrupted, starting empty");
                    self.data = Map::new();
                }
            },
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read database file, starting empty");
                self.data = Map::new();
            }
        }

        &self.data
    }

    /// Writes the document to disk as pretty-printed UTF-8 JSON.
    ///
    /// The write goes to a temp file in the same directory which then
    /// replaces the target, so readers never observe a partial document.
    pub fn save(&mut self) -> Result<()> {
        let contents = serde_json::to_string_pretty(&Value::Object(self.data.clone()))
            .map_err(|e| self.persistence_error(format!("serialization failed: {e}")))?;

        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                fs::create_dir_all(dir)
                    .map_err(|e| self.persistence_error(format!("cannot create directory: {e}")))?;
            }
        }

        let tmp_path = self.temp_path();
        {
            let mut tmp = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&tmp_path)
                .map_err(|e| self.persistence_error(format!("cannot create temp file: {e}")))?;
            tmp.write_all(contents.as_bytes())
                .map_err(|e| self.persistence_error(format!("write failed: {e}")))?;
            tmp.flush()
                .map_err(|e| self.persistence_error(format!("flush failed: {e}")))?;
            let _ = tmp.sync_all();
        }

        fs::rename(&tmp_path, &self.path)
            .map_err(|e| self.persistence_error(format!("rename failed: {e}")))?;

        debug!(path = %self.path.display(), keys = self.data.len(), "Database saved");
        Ok(())
    }

    /// Replaces the whole document and saves it.
    pub fn save_document(&mut self, document: Map<String, Value>) -> Result<()> {
        self.data = document;
        self.save()
    }

    /// Top-level value for a key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Top-level value as an object map, empty when absent or not an object.
    pub fn get_map(&self, key: &str) -> Map<String, Value> {
        match self.data.get(key) {
            Some(Value::Object(map)) => map.clone(),
            _ => Map::new(),
        }
    }

    /// Sets a top-level key. With `auto_save`, flushes to disk immediately;
    /// without, the caller batches several writes into one `save()`.
    pub fn set(&mut self, key: &str, value: Value, auto_save: bool) -> Result<()> {
        self.data.insert(key.to_string(), value);
        if auto_save {
            self.save()?;
        }
        Ok(())
    }

    /// Deletes a top-level key. Returns false when the key was absent.
    pub fn delete(&mut self, key: &str, auto_save: bool) -> Result<bool> {
        if self.data.remove(key).is_none() {
            return Ok(false);
        }
        if auto_save {
            self.save()?;
        }
        Ok(true)
    }

    /// Merges several top-level keys at once.
    pub fn update(&mut self, entries: Map<String, Value>, auto_save: bool) -> Result<()> {
        for (key, value) in entries {
            self.data.insert(key, value);
        }
        if auto_save {
            self.save()?;
        }
        Ok(())
    }

    pub fn exists(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Drops every key from the document.
    pub fn clear(&mut self, auto_save: bool) -> Result<()> {
        self.data.clear();
        if auto_save {
            self.save()?;
        }
        Ok(())
    }

    pub fn get_all(&self) -> Map<String, Value> {
        self.data.clone()
    }

    /// Copies the current database file. Fails (without panicking) when the
    /// source file does not exist yet.
    pub fn backup(&self, backup_path: Option<&Path>) -> Result<PathBuf> {
        let target = backup_path.map_or_else(
            || {
                let mut os = self.path.clone().into_os_string();
                os.push(".backup");
                PathBuf::from(os)
            },
            Path::to_path_buf,
        );

        if !self.path.exists() {
            return Err(self.persistence_error("cannot backup: database file does not exist"));
        }

        fs::copy(&self.path, &target)
            .map_err(|e| self.persistence_error(format!("backup copy failed: {e}")))?;
        info!(from = %self.path.display(), to = %target.display(), "Database backed up");
        Ok(target)
    }

    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map_or_else(|| "db.json".to_string(), |n| n.to_string_lossy().into_owned());
        let tmp_name = format!(".{}.tmp-{}", name, std::process::id());
        self.path.with_file_name(tmp_name)
    }

    fn persistence_error(&self, reason: impl Into<String>) -> PetlinkError {
        PetlinkError::Persistence {
            path: self.path.display().to_string(),
            reason: reason.into(),
        }
    }
}
