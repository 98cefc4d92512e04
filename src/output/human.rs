//! Human-friendly output implementation using console styling.

use serde_json::Value;
use tracing::debug;

use crate::error::PetlinkError;
use crate::link::InterfaceInfo;
use crate::protocol;
use crate::theme::PetlinkTheme;

use super::{ControllerDetail, ControllerView, MacroView, Output, PetSlotView, SendReport};

/// Styled terminal output implementation for human users.
pub struct HumanOutput {
    theme: PetlinkTheme,
}

impl HumanOutput {
    pub fn new() -> Self {
        debug!("Creating HumanOutput");
        Self {
            theme: PetlinkTheme::default(),
        }
    }

    fn label(&self, name: &str) -> String {
        self.theme.label.apply_to(format!("{name:<12}")).to_string()
    }
}

impl Default for HumanOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl Output for HumanOutput {
    fn success(&self, message: &str) {
        println!("{} {message}", self.theme.success.apply_to("[OK]"));
    }

    fn error(&self, error: &PetlinkError) {
        eprintln!("{} {error}", self.theme.error.apply_to("[ERR]"));
        if let Some(suggestion) = error.suggestion() {
            eprintln!("      {}", self.theme.muted.apply_to(suggestion));
        }
    }

    fn warning(&self, message: &str) {
        println!("{} {message}", self.theme.warning.apply_to("[WARN]"));
    }

    fn info(&self, message: &str) {
        println!("{} {message}", self.theme.accent.apply_to("[INFO]"));
    }

    fn controller_list(&self, controllers: &[ControllerView]) {
        if controllers.is_empty() {
            self.warning("No registered controllers");
            return;
        }

        println!("{}", self.theme.header.apply_to("Registered controllers:"));
        for mc in controllers {
            println!(
                "  {} {} -> {} via {} ({} configs, {} macros)",
                self.theme.value.apply_to(&mc.label),
                self.theme.mac.apply_to(&mc.mac_source),
                self.theme.mac.apply_to(&mc.mac_destiny),
                mc.interface,
                mc.config_count,
                mc.macro_count,
            );
        }
    }

    fn controller_detail(&self, detail: &ControllerDetail) {
        println!("{}", self.theme.header.apply_to(&detail.label));
        println!("{}{}", self.label("Source"), self.theme.mac.apply_to(&detail.mac_source));
        println!("{}{}", self.label("Destiny"), self.theme.mac.apply_to(&detail.mac_destiny));
        println!("{}{}", self.label("Interface"), detail.interface);

        if !detail.pets.is_empty() {
            let pets: Vec<String> = detail.pets.iter().map(u8::to_string).collect();
            println!("{}{}", self.label("PET slots"), pets.join(", "));
        }

        if detail.command_configs.is_empty() {
            println!("{}{}", self.label("Configs"), self.theme.muted.apply_to("none"));
        } else {
            println!("{}", self.label("Configs"));
            for (config, states) in &detail.command_configs {
                let selected = detail
                    .last_state
                    .get(config)
                    .and_then(Value::as_str)
                    .filter(|s| !s.is_empty());
                let labels: Vec<&str> = states.keys().map(String::as_str).collect();
                let marker = selected.map_or_else(String::new, |s| format!(" [{s}]"));
                println!("    {config} ({}){marker}", labels.join("/"));
            }
        }

        if !detail.macros.is_empty() {
            println!("{}{}", self.label("Macros"), detail.macros.join(", "));
        }
    }

    fn pet_slots(&self, slots: &[PetSlotView]) {
        println!("{}", self.theme.header.apply_to("PET slots:"));
        for slot in slots {
            let state = if slot.enabled {
                self.theme.enabled.apply_to("enabled").to_string()
            } else {
                self.theme.disabled.apply_to("disabled").to_string()
            };
            match (&slot.mc_mac, &slot.label) {
                (Some(mac), Some(label)) => {
                    println!("  PET {:>2}: {} ({}) {state}", slot.pet_num, label, self.theme.mac.apply_to(mac));
                }
                (Some(mac), None) => {
                    println!("  PET {:>2}: {} {state}", slot.pet_num, self.theme.mac.apply_to(mac));
                }
                _ => {
                    println!("  PET {:>2}: {}", slot.pet_num, self.theme.muted.apply_to("unassigned"));
                }
            }
        }
    }

    fn macro_list(&self, scope: &str, names: &[String]) {
        if names.is_empty() {
            self.warning(&format!("No macros in {scope} scope"));
            return;
        }
        println!("{}", self.theme.header.apply_to(format!("Macros ({scope}):")));
        for name in names {
            println!("  {name}");
        }
    }

    fn macro_detail(&self, view: &MacroView) {
        println!("{}", self.theme.header.apply_to(&view.name));
        if let Some(delta) = view.delta_time {
            println!("{}{delta}s", self.label("Delta"));
        }
        if view.command_configs.is_empty() {
            println!("{}{}", self.label("Configs"), self.theme.muted.apply_to("none"));
            return;
        }
        for (config, states) in &view.command_configs {
            let selected = view
                .last_state
                .get(config)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty());
            let labels: Vec<&str> = states.keys().map(String::as_str).collect();
            let marker = selected.map_or_else(String::new, |s| format!(" [{s}]"));
            println!("  {config} ({}){marker}", labels.join("/"));
        }
    }

    fn interface_list(&self, interfaces: &[InterfaceInfo]) {
        if interfaces.is_empty() {
            self.warning("No usable Ethernet interfaces found");
            return;
        }
        println!("{}", self.theme.header.apply_to("Ethernet interfaces:"));
        for iface in interfaces {
            let state = if iface.up { "up" } else { "down" };
            println!(
                "  {} {} ({state})",
                self.theme.value.apply_to(&iface.name),
                self.theme.mac.apply_to(&iface.mac),
            );
        }
    }

    fn protocol_tables(&self) {
        println!("{}", self.theme.header.apply_to("Commands:"));
        for &(name, byte) in protocol::COMMANDS {
            println!("  0x{byte:02x}  {name}");
        }
        println!();
        println!("{}", self.theme.header.apply_to("Configurations:"));
        for &(name, states) in protocol::COMMAND_CONFIGS {
            let labels: Vec<&str> = states.iter().map(|&(label, _)| label).collect();
            println!("  {name} ({})", labels.join("/"));
        }
    }

    fn send_report(&self, report: &SendReport) {
        if report.completed {
            self.success(&format!("All {} sends completed", report.total));
        } else {
            self.warning(&format!(
                "Transmission cancelled after {}/{} sends",
                report.sent, report.total
            ));
        }
    }

    fn version_info(&self, version: &str, git_sha: Option<&str>, build_time: Option<&str>) {
        println!("{}{}", self.label("Version"), self.theme.value.apply_to(version));
        if let Some(sha) = git_sha {
            println!("{}{}", self.label("Git SHA"), sha);
        }
        if let Some(time) = build_time {
            println!("{}{}", self.label("Built"), self.theme.muted.apply_to(time));
        }
        if let Some(rustc) = option_env!("VERGEN_RUSTC_SEMVER") {
            println!("{}{}", self.label("Rust"), self.theme.muted.apply_to(rustc));
        }
        if let Some(target) = option_env!("VERGEN_CARGO_TARGET_TRIPLE") {
            println!("{}{}", self.label("Target"), self.theme.muted.apply_to(target));
        }
    }

    fn rule(&self, title: Option<&str>) {
        match title {
            Some(title) => println!("--- {title} ---"),
            None => println!("{}", "-".repeat(40)),
        }
    }

    fn newline(&self) {
        println!();
    }
}
