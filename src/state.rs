//! Central state management for controllers, PET associations and macros.
//!
//! `StateManager` owns the in-memory entity graph and, when a store is
//! configured, persists it after every mutation. It is not internally locked:
//! the design assumes a single interactive writer, and batch transmission
//! only reads data snapshotted at batch start. Callers exposing it to more
//! threads must add their own mutex around mutation.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::{PetlinkError, Result};
use crate::frame::validate_mac;
use crate::model::{Macro, MicroController, PetAssociation};
use crate::protocol;
use crate::store::JsonStore;

/// Number of fixed PET scanner slots, created once and only ever mutated.
pub const PET_SLOT_COUNT: u8 = 10;

const KEY_REGISTERED: &str = "mc_registered";
const KEY_ASSOCIATIONS: &str = "pet_associations";
const KEY_MACROS: &str = "macros";

/// Application state: available and registered controllers, PET slot
/// associations and universal macros.
pub struct StateManager {
    store: Option<JsonStore>,
    mc_available: BTreeMap<String, String>,
    mc_registered: BTreeMap<String, MicroController>,
    pet_associations: BTreeMap<u8, PetAssociation>,
    macros: BTreeMap<String, Macro>,
}

impl StateManager {
    pub fn new() -> Self {
        let pet_associations = (1..=PET_SLOT_COUNT)
            .map(|num| (num, PetAssociation::new(num)))
            .collect();
        Self {
            store: None,
            mc_available: BTreeMap::new(),
            mc_registered: BTreeMap::new(),
            pet_associations,
            macros: BTreeMap::new(),
        }
    }

    pub fn with_store(store: JsonStore) -> Self {
        let mut manager = Self::new();
        manager.store = Some(store);
        manager
    }

    pub fn store(&self) -> Option<&JsonStore> {
        self.store.as_ref()
    }

    pub fn store_mut(&mut self) -> Option<&mut JsonStore> {
        self.store.as_mut()
    }

    // === Controllers ===

    /// Registers a controller, overwriting any previous entry with the same
    /// source MAC. Both MAC addresses are format-checked before any mutation.
    ///
    /// Destiny-MAC collisions are allowed but logged: lookups by destiny MAC
    /// resolve to the first match.
    pub fn register_mc(&mut self, mc: MicroController) -> Result<()> {
        if !validate_mac(&mc.mac_source) {
            return Err(PetlinkError::InvalidMacAddress {
                value: mc.mac_source,
            });
        }
        if !validate_mac(&mc.mac_destiny) {
            return Err(PetlinkError::InvalidMacAddress {
                value: mc.mac_destiny,
            });
        }

        if let Some(existing) = self
            .mc_registered
            .values()
            .find(|other| other.mac_source != mc.mac_source && other.mac_destiny == mc.mac_destiny)
        {
            warn!(
                mac_destiny = %mc.mac_destiny,
                existing_source = %existing.mac_source,
                "Destiny MAC already used by another registered controller; lookups will resolve to the first match"
            );
        }

        debug!(mac_source = %mc.mac_source, label = %mc.label, "Registering controller");
        self.mc_registered.insert(mc.mac_source.clone(), mc);
        self.persist();
        Ok(())
    }

    /// Removes a controller. Clears every PET association pointing at the
    /// removed controller's destiny MAC, disabling the slot in the same step.
    /// Returns false when no controller was registered under the key.
    pub fn unregister_mc(&mut self, mac_source: &str) -> bool {
        let Some(removed) = self.mc_registered.remove(mac_source) else {
            return false;
        };

        for assoc in self.pet_associations.values_mut() {
            if assoc.mc_mac.as_deref() == Some(removed.mac_destiny.as_str()) {
                debug!(pet_num = assoc.pet_num, "Clearing PET association of removed controller");
                assoc.mc_mac = None;
                assoc.enabled = false;
            }
        }

        self.persist();
        true
    }

    pub fn get_mc(&self, mac_source: &str) -> Option<&MicroController> {
        self.mc_registered.get(mac_source)
    }

    /// Controller lookup by destiny MAC. Linear scan; when two controllers
    /// share a destiny MAC the first match wins.
    pub fn get_mc_by_destiny(&self, mac_destiny: &str) -> Option<&MicroController> {
        self.mc_registered
            .values()
            .find(|mc| mc.mac_destiny == mac_destiny)
    }

    pub fn get_all_registered_mcs(&self) -> Vec<&MicroController> {
        self.mc_registered.values().collect()
    }

    /// Replaces the available-interface map (MAC -> ifname) from discovery.
    pub fn update_mc_available(&mut self, available: BTreeMap<String, String>) {
        self.mc_available = available;
    }

    pub fn mc_available(&self) -> &BTreeMap<String, String> {
        &self.mc_available
    }

    // === Command configuration ===

    /// Attaches a protocol configuration to a controller, copying its state
    /// labels from the protocol table.
    pub fn add_command_config(&mut self, mac_source: &str, config: &str) -> Result<()> {
        let states = protocol::config_states(config)?;
        let mc = self.mc_mut(mac_source)?;
        mc.command_configs.insert(
            config.to_string(),
            states
                .iter()
                .map(|&(label, command)| (label.to_string(), command.to_string()))
                .collect(),
        );
        self.persist();
        Ok(())
    }

    /// Detaches a configuration (and its stored state) from a controller.
    pub fn remove_command_config(&mut self, mac_source: &str, config: &str) -> Result<bool> {
        let mc = self.mc_mut(mac_source)?;
        let removed = mc.command_configs.remove(config).is_some();
        if removed {
            mc.last_state.remove(config);
            mc.last_state
                .remove(&format!("{config}{}", crate::model::DELTA_SUFFIX));
            self.persist();
        }
        Ok(removed)
    }

    /// Stores the selected state label of a configuration. An empty label
    /// clears the selection.
    pub fn set_last_state(&mut self, mac_source: &str, config: &str, state: &str) -> Result<()> {
        if !state.is_empty() {
            protocol::command_for_state(config, state)?;
        }
        let mc = self.mc_mut(mac_source)?;
        if !mc.command_configs.contains_key(config) {
            return Err(PetlinkError::UnknownConfig {
                name: config.to_string(),
            });
        }
        mc.last_state
            .insert(config.to_string(), Value::String(state.to_string()));
        self.persist();
        Ok(())
    }

    /// Stores the per-configuration inter-send delay in seconds.
    pub fn set_state_delay(&mut self, mac_source: &str, config: &str, secs: f64) -> Result<()> {
        let mc = self.mc_mut(mac_source)?;
        if !mc.command_configs.contains_key(config) {
            return Err(PetlinkError::UnknownConfig {
                name: config.to_string(),
            });
        }
        let key = format!("{config}{}", crate::model::DELTA_SUFFIX);
        mc.last_state.insert(
            key,
            serde_json::Number::from_f64(secs).map_or(Value::Null, Value::Number),
        );
        self.persist();
        Ok(())
    }

    // === PET associations ===

    /// Associates a PET slot with a controller's destiny MAC.
    ///
    /// An empty association cannot be enabled: `enabled` is stored as false
    /// whenever `mc_mac` is `None`.
    pub fn associate_pet(&mut self, pet_num: u8, mc_mac: Option<String>, enabled: bool) -> Result<()> {
        let assoc = self
            .pet_associations
            .get_mut(&pet_num)
            .ok_or(PetlinkError::PetNumberOutOfRange { value: pet_num })?;

        assoc.enabled = enabled && mc_mac.is_some();
        assoc.mc_mac = mc_mac;
        self.persist();
        Ok(())
    }

    pub fn get_pet_association(&self, pet_num: u8) -> Option<&PetAssociation> {
        self.pet_associations.get(&pet_num)
    }

    pub fn pet_associations(&self) -> Vec<&PetAssociation> {
        self.pet_associations.values().collect()
    }

    /// Enables or disables a slot. Enabling a slot with no associated
    /// controller is rejected.
    pub fn set_pet_enabled(&mut self, pet_num: u8, enabled: bool) -> Result<()> {
        let assoc = self
            .pet_associations
            .get_mut(&pet_num)
            .ok_or(PetlinkError::PetNumberOutOfRange { value: pet_num })?;

        if enabled && assoc.mc_mac.is_none() {
            return Err(PetlinkError::PetNotAssociated { pet_num });
        }

        assoc.enabled = enabled;
        self.persist();
        Ok(())
    }

    /// Destiny MACs of controllers behind enabled slots.
    ///
    /// Checks both `enabled` and the association, so documents written by
    /// older tools (which could enable an empty slot) stay safe to read.
    pub fn get_enabled_pet_mcs(&self) -> Vec<String> {
        self.pet_associations
            .values()
            .filter(|assoc| assoc.enabled)
            .filter_map(|assoc| assoc.mc_mac.clone())
            .collect()
    }

    /// Slot numbers associated with a controller's destiny MAC.
    pub fn get_pets_by_mc(&self, mc_mac: &str) -> Vec<u8> {
        self.pet_associations
            .values()
            .filter(|assoc| assoc.mc_mac.as_deref() == Some(mc_mac))
            .map(|assoc| assoc.pet_num)
            .collect()
    }

    // === Macros ===

    /// Saves a macro in the universal scope, or in a controller's scope when
    /// `mc_mac` names a registered controller's source MAC.
    pub fn save_macro(&mut self, macro_def: Macro, mc_mac: Option<&str>) -> Result<()> {
        match mc_mac {
            Some(mac) => {
                let mc = self.mc_mut(mac)?;
                mc.macros.insert(macro_def.name.clone(), macro_def);
            }
            None => {
                self.macros.insert(macro_def.name.clone(), macro_def);
            }
        }
        self.persist();
        Ok(())
    }

    pub fn load_macro(&self, name: &str, mc_mac: Option<&str>) -> Option<Macro> {
        match mc_mac {
            Some(mac) => self.get_mc(mac)?.macros.get(name).cloned(),
            None => self.macros.get(name).cloned(),
        }
    }

    /// Deletes a macro from the given scope. Returns false when it did not
    /// exist (including an unregistered controller scope).
    pub fn delete_macro(&mut self, name: &str, mc_mac: Option<&str>) -> bool {
        let deleted = match mc_mac {
            Some(mac) => self
                .mc_registered
                .get_mut(mac)
                .is_some_and(|mc| mc.macros.remove(name).is_some()),
            None => self.macros.remove(name).is_some(),
        };
        if deleted {
            self.persist();
        }
        deleted
    }

    pub fn list_macros(&self, mc_mac: Option<&str>) -> Vec<String> {
        match mc_mac {
            Some(mac) => self
                .get_mc(mac)
                .map(|mc| mc.macros.keys().cloned().collect())
                .unwrap_or_default(),
            None => self.macros.keys().cloned().collect(),
        }
    }

    // === Persistence ===

    /// Hydrates the in-memory graph from the configured store.
    ///
    /// Invalid entries are skipped with a warning; a corrupted or missing
    /// document simply leaves the state empty.
    pub fn load_from_store(&mut self) {
        let Some(store) = self.store.as_mut() else {
            return;
        };
        store.load();

        for (mac_source, value) in store.get_map(KEY_REGISTERED) {
            match MicroController::from_value(&mac_source, &value) {
                Ok(mc) => {
                    self.mc_registered.insert(mac_source, mc);
                }
                Err(e) => warn!(mac_source = %mac_source, error = %e, "Skipping invalid controller entry"),
            }
        }

        for (key, value) in store.get_map(KEY_ASSOCIATIONS) {
            let Ok(pet_num) = key.parse::<u8>() else {
                warn!(key = %key, "Skipping PET association with non-numeric key");
                continue;
            };
            if !(1..=PET_SLOT_COUNT).contains(&pet_num) {
                warn!(pet_num, "Skipping PET association outside the fixed slot range");
                continue;
            }
            match PetAssociation::from_value(pet_num, &value) {
                Ok(assoc) => {
                    self.pet_associations.insert(pet_num, assoc);
                }
                Err(e) => warn!(pet_num, error = %e, "Skipping invalid PET association entry"),
            }
        }

        for (name, value) in store.get_map(KEY_MACROS) {
            match Macro::from_value(&name, &value) {
                Ok(m) => {
                    self.macros.insert(name, m);
                }
                Err(e) => warn!(name = %name, error = %e, "Skipping invalid macro entry"),
            }
        }
    }

    /// Current state as a persisted-document map.
    pub fn to_document(&self) -> Map<String, Value> {
        let mut doc = Map::new();
        doc.insert(KEY_REGISTERED.to_string(), self.controllers_value());
        doc.insert(KEY_ASSOCIATIONS.to_string(), self.associations_value());
        doc.insert(
            KEY_MACROS.to_string(),
            Value::Object(
                self.macros
                    .iter()
                    .map(|(name, m)| (name.clone(), m.to_value()))
                    .collect(),
            ),
        );
        doc
    }

    /// Writes the whole graph through the store in one atomic save.
    ///
    /// Universal macros are merged over the ones already persisted, so a save
    /// triggered by a controller edit cannot drop macros written through the
    /// macro manager since the last load. Store failures are logged and
    /// swallowed; the in-memory state stays authoritative.
    fn persist(&mut self) {
        let controllers = self.controllers_value();
        let associations = self.associations_value();

        let Some(store) = self.store.as_mut() else {
            return;
        };

        let mut merged = store.get_map(KEY_MACROS);
        for (name, m) in &self.macros {
            merged.insert(name.clone(), m.to_value());
        }

        let result = (|| {
            store.set(KEY_REGISTERED, controllers, false)?;
            store.set(KEY_ASSOCIATIONS, associations, false)?;
            store.set(KEY_MACROS, Value::Object(merged), false)?;
            store.save()
        })();

        if let Err(e) = result {
            warn!(error = %e, "Failed to persist state; continuing with in-memory state");
        }
    }

    fn controllers_value(&self) -> Value {
        Value::Object(
            self.mc_registered
                .iter()
                .map(|(mac, mc)| (mac.clone(), mc.to_value()))
                .collect(),
        )
    }

    fn associations_value(&self) -> Value {
        Value::Object(
            self.pet_associations
                .iter()
                .map(|(num, assoc)| (num.to_string(), assoc.to_value()))
                .collect(),
        )
    }

    fn mc_mut(&mut self, mac_source: &str) -> Result<&mut MicroController> {
        self.mc_registered
            .get_mut(mac_source)
            .ok_or_else(|| PetlinkError::ControllerNotFound {
                mac_source: mac_source.to_string(),
            })
    }
}

impl Default for StateManager {
    fn default() -> Self {
        Self::new()
    }
}
