//! Output mode abstraction for robot and human output.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::cli::Cli;
use crate::error::PetlinkError;
use crate::link::InterfaceInfo;
use crate::model::{MicroController, PetAssociation};
use crate::sender::BatchOutcome;

pub mod human;
pub mod robot;

pub use human::HumanOutput;
pub use robot::RobotOutput;

/// One registered controller, summarized for listings.
#[derive(Debug, Clone, Serialize)]
pub struct ControllerView {
    pub mac_source: String,
    pub mac_destiny: String,
    pub interface: String,
    pub label: String,
    pub config_count: usize,
    pub macro_count: usize,
}

impl ControllerView {
    pub fn from_mc(mc: &MicroController) -> Self {
        Self {
            mac_source: mc.mac_source.clone(),
            mac_destiny: mc.mac_destiny.clone(),
            interface: mc.interface_destiny.clone(),
            label: mc.label.clone(),
            config_count: mc.command_configs.len(),
            macro_count: mc.macros.len(),
        }
    }
}

/// One registered controller with its full configuration state.
#[derive(Debug, Clone, Serialize)]
pub struct ControllerDetail {
    pub mac_source: String,
    pub mac_destiny: String,
    pub interface: String,
    pub label: String,
    pub command_configs: BTreeMap<String, BTreeMap<String, String>>,
    pub last_state: BTreeMap<String, Value>,
    pub macros: Vec<String>,
    /// PET slots currently associated with this controller.
    pub pets: Vec<u8>,
}

impl ControllerDetail {
    pub fn from_mc(mc: &MicroController, pets: Vec<u8>) -> Self {
        Self {
            mac_source: mc.mac_source.clone(),
            mac_destiny: mc.mac_destiny.clone(),
            interface: mc.interface_destiny.clone(),
            label: mc.label.clone(),
            command_configs: mc.command_configs.clone(),
            last_state: mc.last_state.clone(),
            macros: mc.macros.keys().cloned().collect(),
            pets,
        }
    }
}

/// One PET slot row, with the associated controller's label resolved at
/// read time through the registry.
#[derive(Debug, Clone, Serialize)]
pub struct PetSlotView {
    pub pet_num: u8,
    pub mc_mac: Option<String>,
    pub label: Option<String>,
    pub enabled: bool,
}

impl PetSlotView {
    pub fn from_association(assoc: &PetAssociation, label: Option<String>) -> Self {
        Self {
            pet_num: assoc.pet_num,
            mc_mac: assoc.mc_mac.clone(),
            label,
            enabled: assoc.enabled,
        }
    }
}

/// One macro's full contents, for display.
#[derive(Debug, Clone, Serialize)]
pub struct MacroView {
    pub name: String,
    pub command_configs: BTreeMap<String, BTreeMap<String, String>>,
    pub last_state: BTreeMap<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delta_time: Option<f64>,
}

impl MacroView {
    pub fn from_macro(m: &crate::model::Macro) -> Self {
        Self {
            name: m.name.clone(),
            command_configs: m.command_configs.clone(),
            last_state: m.last_state.clone(),
            delta_time: m.delta_time,
        }
    }
}

/// Final result of a batch transmission.
#[derive(Debug, Clone, Serialize)]
pub struct SendReport {
    pub completed: bool,
    pub cancelled: bool,
    pub sent: u32,
    pub total: u32,
}

impl SendReport {
    pub fn new(outcome: BatchOutcome, sent: u32, total: u32) -> Self {
        Self {
            completed: outcome.is_completed(),
            cancelled: !outcome.is_completed(),
            sent,
            total,
        }
    }
}

/// JSON formatting options for robot mode.
#[derive(Debug, Clone, Copy)]
pub enum RobotFormat {
    /// Pretty-printed JSON (default for --robot).
    Json,
    /// Single-line JSON (--format=json-compact).
    JsonCompact,
}

/// Determines how command output is rendered.
#[derive(Debug)]
pub enum OutputMode {
    /// JSON output for AI agents and scripting.
    Robot(RobotFormat),
    /// Styled terminal output for human users.
    Human,
}

impl OutputMode {
    /// Create OutputMode from CLI arguments.
    #[must_use]
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.use_json() {
            let format = if cli.use_compact_json() {
                RobotFormat::JsonCompact
            } else {
                RobotFormat::Json
            };
            Self::Robot(format)
        } else {
            Self::Human
        }
    }

    /// Returns true if output should be JSON.
    #[must_use]
    pub const fn is_robot(&self) -> bool {
        matches!(self, Self::Robot(_))
    }

    /// Convert into the appropriate Output implementation.
    #[must_use]
    pub fn into_output(self) -> Box<dyn Output> {
        match self {
            Self::Robot(format) => Box::new(RobotOutput::new(format)),
            Self::Human => Box::new(HumanOutput::new()),
        }
    }
}

/// Trait for all output operations.
///
/// Commands call these methods without knowing the output mode.
pub trait Output {
    // Basic messages
    fn success(&self, message: &str);
    fn error(&self, error: &PetlinkError);
    fn warning(&self, message: &str);
    fn info(&self, message: &str);

    // Registry views
    fn controller_list(&self, controllers: &[ControllerView]);
    fn controller_detail(&self, detail: &ControllerDetail);
    fn pet_slots(&self, slots: &[PetSlotView]);
    fn macro_list(&self, scope: &str, names: &[String]);
    fn macro_detail(&self, view: &MacroView);
    fn interface_list(&self, interfaces: &[InterfaceInfo]);
    fn protocol_tables(&self);

    // Transmission
    fn send_report(&self, report: &SendReport);

    // Metadata
    fn version_info(&self, version: &str, git_sha: Option<&str>, build_time: Option<&str>);

    // Visual separators
    fn rule(&self, title: Option<&str>);
    fn newline(&self);
}
