//! Macro management over the persistence store.
//!
//! Macros live in two disjoint scopes: universal (top-level `macros` map) or
//! per-controller (inside a registered controller's `macros` map). Names are
//! unique only within a scope. The manager borrows the store for the
//! duration of an operation and works directly on the persisted document.

use serde_json::Value;
use tracing::debug;

use crate::error::{PetlinkError, Result};
use crate::model::Macro;
use crate::store::JsonStore;

const KEY_MACROS: &str = "macros";
const KEY_REGISTERED: &str = "mc_registered";

/// Scope-aware CRUD for saved macros.
pub struct MacroManager<'s> {
    store: &'s mut JsonStore,
}

impl<'s> MacroManager<'s> {
    pub fn new(store: &'s mut JsonStore) -> Self {
        Self { store }
    }

    /// Saves a macro, overwriting any existing one with the same name in the
    /// chosen scope. `mc_mac_source == None` means the universal scope.
    pub fn save(&mut self, macro_def: &Macro, mc_mac_source: Option<&str>) -> Result<()> {
        match mc_mac_source {
            None => {
                let mut macros = self.store.get_map(KEY_MACROS);
                macros.insert(macro_def.name.clone(), macro_def.to_value());
                self.store.set(KEY_MACROS, Value::Object(macros), true)
            }
            Some(mac) => {
                let mut registered = self.store.get_map(KEY_REGISTERED);
                let entry = registered
                    .get_mut(mac)
                    .and_then(Value::as_object_mut)
                    .ok_or_else(|| PetlinkError::ControllerNotFound {
                        mac_source: mac.to_string(),
                    })?;

                let macros = entry
                    .entry(KEY_MACROS.to_string())
                    .or_insert_with(|| Value::Object(serde_json::Map::new()));
                if let Some(map) = macros.as_object_mut() {
                    map.insert(macro_def.name.clone(), macro_def.to_value());
                }

                self.store.set(KEY_REGISTERED, Value::Object(registered), true)
            }
        }
    }

    /// Loads a macro from the chosen scope.
    pub fn load(&self, name: &str, mc_mac_source: Option<&str>) -> Option<Macro> {
        let value = match mc_mac_source {
            None => self.store.get_map(KEY_MACROS).get(name).cloned(),
            Some(mac) => self
                .store
                .get_map(KEY_REGISTERED)
                .get(mac)?
                .get(KEY_MACROS)?
                .get(name)
                .cloned(),
        }?;
        Macro::from_value(name, &value).ok()
    }

    /// Deletes a macro. Returns false when it did not exist in the scope.
    pub fn delete(&mut self, name: &str, mc_mac_source: Option<&str>) -> Result<bool> {
        match mc_mac_source {
            None => {
                let mut macros = self.store.get_map(KEY_MACROS);
                if macros.remove(name).is_none() {
                    return Ok(false);
                }
                self.store.set(KEY_MACROS, Value::Object(macros), true)?;
                Ok(true)
            }
            Some(mac) => {
                let mut registered = self.store.get_map(KEY_REGISTERED);
                let Some(entry) = registered.get_mut(mac).and_then(Value::as_object_mut) else {
                    return Ok(false);
                };
                let removed = entry
                    .get_mut(KEY_MACROS)
                    .and_then(Value::as_object_mut)
                    .is_some_and(|macros| macros.remove(name).is_some());
                if !removed {
                    return Ok(false);
                }
                self.store.set(KEY_REGISTERED, Value::Object(registered), true)?;
                Ok(true)
            }
        }
    }

    /// Macro names in the chosen scope.
    pub fn list(&self, mc_mac_source: Option<&str>) -> Vec<String> {
        match mc_mac_source {
            None => self.store.get_map(KEY_MACROS).keys().cloned().collect(),
            Some(mac) => self
                .store
                .get_map(KEY_REGISTERED)
                .get(mac)
                .and_then(|entry| entry.get(KEY_MACROS))
                .and_then(Value::as_object)
                .map(|macros| macros.keys().cloned().collect())
                .unwrap_or_default(),
        }
    }

    /// All macros of a scope, rebuilt as model objects.
    pub fn get_all(&self, mc_mac_source: Option<&str>) -> Vec<Macro> {
        self.list(mc_mac_source)
            .iter()
            .filter_map(|name| self.load(name, mc_mac_source))
            .collect()
    }

    pub fn exists(&self, name: &str, mc_mac_source: Option<&str>) -> bool {
        self.list(mc_mac_source).iter().any(|n| n == name)
    }

    /// Renames a macro within its scope.
    ///
    /// Fails when the new name is taken (no silent overwrite) or the old one
    /// does not exist. Saves under the new name before deleting the old one,
    /// so a crash mid-rename leaves at worst a duplicate, never data loss.
    pub fn rename(&mut self, old_name: &str, new_name: &str, mc_mac_source: Option<&str>) -> Result<()> {
        if self.exists(new_name, mc_mac_source) {
            return Err(PetlinkError::MacroNameTaken {
                name: new_name.to_string(),
            });
        }

        let mut macro_def =
            self.load(old_name, mc_mac_source)
                .ok_or_else(|| PetlinkError::MacroNotFound {
                    name: old_name.to_string(),
                })?;
        macro_def.name = new_name.to_string();

        self.save(&macro_def, mc_mac_source)?;
        self.delete(old_name, mc_mac_source)?;
        debug!(old = old_name, new = new_name, "Macro renamed");
        Ok(())
    }
}
