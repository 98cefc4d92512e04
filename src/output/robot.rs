//! Robot mode JSON output implementation.

use serde::Serialize;
use serde_json::json;
use tracing::{debug, trace};

use crate::error::PetlinkError;
use crate::link::InterfaceInfo;
use crate::protocol;

use super::{ControllerDetail, ControllerView, MacroView, Output, PetSlotView, RobotFormat, SendReport};

/// JSON output implementation for AI agents and scripting.
pub struct RobotOutput {
    format: RobotFormat,
}

impl RobotOutput {
    pub fn new(format: RobotFormat) -> Self {
        debug!(?format, "Creating RobotOutput");
        Self { format }
    }

    /// Output any serializable data as JSON to stdout.
    fn output_json<T: Serialize + ?Sized>(&self, data: &T) {
        let json = match self.format {
            RobotFormat::Json => {
                serde_json::to_string_pretty(data).expect("serialization failed")
            }
            RobotFormat::JsonCompact => serde_json::to_string(data).expect("serialization failed"),
        };
        trace!(json_len = json.len(), "JSON serialized");
        println!("{json}");
    }

    /// Output pretty JSON to stderr (errors go to stderr in robot mode too).
    fn output_json_pretty_stderr<T: Serialize>(&self, data: &T) {
        let json = serde_json::to_string_pretty(data).expect("serialization failed");
        eprintln!("{json}");
    }
}

impl Output for RobotOutput {
    fn success(&self, message: &str) {
        self.output_json(&json!({
            "success": true,
            "message": message
        }));
    }

    fn error(&self, error: &PetlinkError) {
        debug!(error = %error, "Robot: error");
        self.output_json_pretty_stderr(&json!({
            "error": true,
            "message": error.to_string(),
            "suggestion": error.suggestion(),
            "recoverable": error.is_user_recoverable(),
        }));
    }

    fn warning(&self, message: &str) {
        self.output_json(&json!({
            "warning": true,
            "message": message
        }));
    }

    fn info(&self, message: &str) {
        self.output_json(&json!({
            "info": true,
            "message": message
        }));
    }

    fn controller_list(&self, controllers: &[ControllerView]) {
        self.output_json(controllers);
    }

    fn controller_detail(&self, detail: &ControllerDetail) {
        self.output_json(detail);
    }

    fn pet_slots(&self, slots: &[PetSlotView]) {
        self.output_json(slots);
    }

    fn macro_list(&self, scope: &str, names: &[String]) {
        self.output_json(&json!({
            "scope": scope,
            "macros": names
        }));
    }

    fn macro_detail(&self, view: &MacroView) {
        self.output_json(view);
    }

    fn interface_list(&self, interfaces: &[InterfaceInfo]) {
        self.output_json(interfaces);
    }

    fn protocol_tables(&self) {
        let commands: Vec<_> = protocol::COMMANDS
            .iter()
            .map(|&(name, byte)| json!({"name": name, "opcode": format!("0x{byte:02x}")}))
            .collect();
        let configs: Vec<_> = protocol::COMMAND_CONFIGS
            .iter()
            .map(|&(name, states)| {
                let states: serde_json::Map<String, serde_json::Value> = states
                    .iter()
                    .map(|&(label, command)| (label.to_string(), json!(command)))
                    .collect();
                json!({"name": name, "states": states})
            })
            .collect();
        self.output_json(&json!({
            "commands": commands,
            "configs": configs
        }));
    }

    fn send_report(&self, report: &SendReport) {
        self.output_json(report);
    }

    fn version_info(&self, version: &str, git_sha: Option<&str>, build_time: Option<&str>) {
        self.output_json(&json!({
            "version": version,
            "git_sha": git_sha,
            "build_time": build_time
        }));
    }

    fn rule(&self, _title: Option<&str>) {
        trace!("Robot: rule (no-op)");
    }

    fn newline(&self) {
        trace!("Robot: newline (no-op)");
    }
}
