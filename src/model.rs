//! Entity model for the PET link-control application.
//!
//! The persisted document keys controllers by source MAC, PET associations by
//! slot number and macros by name, so those identifiers live as map keys and
//! are re-attached after deserialization (`from_value` constructors) instead
//! of being duplicated inside the objects.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::protocol;

/// Suffix on `last_state` keys holding the per-configuration send delay in
/// seconds (a float, written next to the state label entry).
pub const DELTA_SUFFIX: &str = "_delta";

/// Default inter-send delay in seconds when a configuration has no stored delta.
pub const DEFAULT_DELTA_SECS: f64 = 1.0;

/// A registered microcontroller board, keyed by the local source MAC used to
/// reach it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MicroController {
    /// Source MAC of the local interface; map key in the registry, not serialized.
    #[serde(skip)]
    pub mac_source: String,
    /// MAC of the remote board.
    pub mac_destiny: String,
    /// Network interface name used to reach the board (e.g. "eth0").
    pub interface_destiny: String,
    /// Operator-facing label.
    pub label: String,
    /// Configuration name to {state label -> command name}.
    #[serde(default)]
    pub command_configs: BTreeMap<String, BTreeMap<String, String>>,
    /// Configuration name to selected state label (or empty), plus
    /// `<config>_delta` float entries carrying per-configuration delays.
    #[serde(default)]
    pub last_state: BTreeMap<String, Value>,
    /// Macros owned by this controller.
    #[serde(default)]
    pub macros: BTreeMap<String, Macro>,
}

impl MicroController {
    pub fn new(
        mac_source: impl Into<String>,
        mac_destiny: impl Into<String>,
        interface_destiny: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            mac_source: mac_source.into(),
            mac_destiny: mac_destiny.into(),
            interface_destiny: interface_destiny.into(),
            label: label.into(),
            ..Self::default()
        }
    }

    /// Rebuilds a controller from its persisted JSON value and registry key.
    pub fn from_value(mac_source: &str, value: &Value) -> Result<Self> {
        let mut mc: Self = serde_json::from_value(value.clone())
            .map_err(|e| crate::error::PetlinkError::Other(format!("invalid controller entry: {e}")))?;
        mc.mac_source = mac_source.to_string();
        for (name, m) in &mut mc.macros {
            m.name = name.clone();
        }
        Ok(mc)
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).expect("controller serialization cannot fail")
    }

    /// Selected state label of a configuration, if one is set and non-empty.
    pub fn selected_state(&self, config: &str) -> Option<&str> {
        self.last_state
            .get(config)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// Stored per-configuration delay in milliseconds.
    pub fn delay_ms(&self, config: &str) -> u64 {
        delta_ms(&self.last_state, config)
    }

    /// Commands currently selected on this controller, in configuration
    /// order, ready for transmission.
    pub fn selected_commands(&self) -> Result<Vec<CommandInfo>> {
        build_command_infos(&self.command_configs, &self.last_state)
    }
}

/// Association of one fixed PET scanner slot with a controller.
///
/// `mc_mac` is a weak reference: a destiny-MAC lookup key resolved through
/// the registry at read time, never an owning pointer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PetAssociation {
    /// Slot number (1-10); map key in the registry, not serialized.
    #[serde(skip)]
    pub pet_num: u8,
    /// Destiny MAC of the associated controller, if any.
    #[serde(rename = "mc")]
    pub mc_mac: Option<String>,
    #[serde(default)]
    pub enabled: bool,
}

impl PetAssociation {
    pub fn new(pet_num: u8) -> Self {
        Self {
            pet_num,
            mc_mac: None,
            enabled: false,
        }
    }

    pub fn from_value(pet_num: u8, value: &Value) -> Result<Self> {
        let mut assoc: Self = serde_json::from_value(value.clone()).map_err(|e| {
            crate::error::PetlinkError::Other(format!("invalid PET association entry: {e}"))
        })?;
        assoc.pet_num = pet_num;
        Ok(assoc)
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).expect("association serialization cannot fail")
    }
}

/// A saved snapshot of configuration selections, replayable later.
///
/// Lives either in the universal scope (top-level map) or inside one
/// controller's `macros` map; names are unique only within a scope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Macro {
    /// Map key in its scope, not serialized.
    #[serde(skip)]
    pub name: String,
    #[serde(default)]
    pub command_configs: BTreeMap<String, BTreeMap<String, String>>,
    #[serde(default)]
    pub last_state: BTreeMap<String, Value>,
    /// Optional default inter-send delay in seconds for the whole macro.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta_time: Option<f64>,
}

impl Macro {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn from_value(name: &str, value: &Value) -> Result<Self> {
        let mut m: Self = serde_json::from_value(value.clone())
            .map_err(|e| crate::error::PetlinkError::Other(format!("invalid macro entry: {e}")))?;
        m.name = name.to_string();
        Ok(m)
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).expect("macro serialization cannot fail")
    }

    /// Captures a controller's current selections as a macro snapshot.
    pub fn snapshot_of(name: impl Into<String>, mc: &MicroController) -> Self {
        Self {
            name: name.into(),
            command_configs: mc.command_configs.clone(),
            last_state: mc.last_state.clone(),
            delta_time: None,
        }
    }

    /// Commands selected by this macro's snapshot, ready for transmission.
    pub fn selected_commands(&self) -> Result<Vec<CommandInfo>> {
        let mut infos = build_command_infos(&self.command_configs, &self.last_state)?;
        if let Some(secs) = self.delta_time {
            let ms = secs_to_ms(secs);
            for info in &mut infos {
                info.delay_ms = ms;
            }
        }
        Ok(infos)
    }
}

/// One command ready to transmit. Ephemeral: built per send request, never
/// persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandInfo {
    pub config_name: String,
    pub command_name: String,
    pub command_byte: u8,
    pub repetitions: u32,
    pub delay_ms: u64,
    /// Additional bytes after the opcode for composite commands.
    pub extra_payload: Vec<u8>,
}

impl CommandInfo {
    /// Resolves a command name against the protocol table.
    pub fn resolve(config_name: impl Into<String>, command_name: impl Into<String>) -> Result<Self> {
        let command_name = command_name.into();
        let command_byte = protocol::command_byte(&command_name)?;
        Ok(Self {
            config_name: config_name.into(),
            command_name,
            command_byte,
            repetitions: 1,
            delay_ms: 0,
            extra_payload: Vec::new(),
        })
    }

    pub fn with_repetitions(mut self, repetitions: u32) -> Self {
        self.repetitions = repetitions.max(1);
        self
    }

    pub fn with_delay_ms(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }
}

impl fmt::Display for CommandInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (reps={}, delay={}ms)",
            self.command_name, self.repetitions, self.delay_ms
        )
    }
}

/// Builds transmission-ready commands from a configuration snapshot plus the
/// selected state labels, skipping configurations with no selection.
pub fn build_command_infos(
    command_configs: &BTreeMap<String, BTreeMap<String, String>>,
    last_state: &BTreeMap<String, Value>,
) -> Result<Vec<CommandInfo>> {
    let mut infos = Vec::new();
    for (config, states) in command_configs {
        let Some(state) = last_state
            .get(config)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
        else {
            continue;
        };
        let Some(command) = states.get(state) else {
            continue;
        };
        let info = CommandInfo::resolve(config.clone(), command.clone())?
            .with_delay_ms(delta_ms(last_state, config));
        infos.push(info);
    }
    Ok(infos)
}

fn delta_ms(last_state: &BTreeMap<String, Value>, config: &str) -> u64 {
    let secs = last_state
        .get(&format!("{config}{DELTA_SUFFIX}"))
        .and_then(Value::as_f64)
        .unwrap_or(DEFAULT_DELTA_SECS);
    secs_to_ms(secs)
}

fn secs_to_ms(secs: f64) -> u64 {
    if secs.is_finite() && secs > 0.0 {
        (secs * 1000.0).round() as u64
    } else {
        0
    }
}

/// Moves one entry of an ordered send list, as driven by UI row reordering.
///
/// Returns false (list untouched) when either index is out of bounds.
pub fn reorder<T>(items: &mut Vec<T>, from: usize, to: usize) -> bool {
    if from >= items.len() || to >= items.len() {
        return false;
    }
    let item = items.remove(from);
    items.insert(to, item);
    true
}
