//! petlink CLI - drive PET-scanner microcontroller boards over raw Ethernet.
//!
//! Provides both human-friendly and agent-friendly (robot mode) interfaces.
#![forbid(unsafe_code)]

use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use clap::{CommandFactory, Parser};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use serde_json::json;
use tracing::debug;

use petlink::cli::{
    AssociateArgs, BackupArgs, Cli, Commands, CompletionsArgs, ConfigArgs, MacroAction, MacroArgs,
    PetSlotArgs, RegisterArgs, SendArgs, SendMacroArgs, SetStateArgs, ShowArgs, UnregisterArgs,
};
use petlink::config::AppConfig;
use petlink::error::{PetlinkError, Result};
use petlink::link::{self, open_raw_link};
use petlink::logging::init_logging;
use petlink::macros::MacroManager;
use petlink::model::{CommandInfo, Macro, MicroController};
use petlink::output::{
    ControllerDetail, ControllerView, MacroView, Output, OutputMode, PetSlotView, SendReport,
};
use petlink::protocol;
use petlink::sender::PacketSender;
use petlink::state::StateManager;
use petlink::store::JsonStore;

/// Build information embedded at compile time.
mod build_info {
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");

    pub fn git_sha() -> &'static str {
        option_env!("VERGEN_GIT_SHA").unwrap_or("unknown")
    }

    pub fn build_timestamp() -> &'static str {
        option_env!("VERGEN_BUILD_TIMESTAMP").unwrap_or("unknown")
    }
}

fn main() {
    let cli = Cli::parse();

    init_logging(cli.use_json(), cli.verbose, cli.quiet);

    // Handle no-color flag or non-TTY. NO_COLOR follows the standard
    // presence-based convention (any value disables color).
    if cli.no_color || std::env::var_os("NO_COLOR").is_some() {
        console::set_colors_enabled(false);
    }

    let output = OutputMode::from_cli(&cli).into_output();

    // The static protocol tables must be consistent before anything trusts a lookup.
    if let Err(e) = protocol::validate() {
        output.error(&e);
        std::process::exit(2);
    }

    if let Err(e) = run(&cli, output.as_ref()) {
        output.error(&e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli, output: &dyn Output) -> Result<()> {
    match &cli.command {
        None => print_quick_start(cli),
        Some(Commands::Interfaces(_)) => cmd_interfaces(output),
        Some(Commands::Register(args)) => cmd_register(cli, output, args),
        Some(Commands::Unregister(args)) => cmd_unregister(cli, output, args),
        Some(Commands::List(_)) => cmd_list(cli, output),
        Some(Commands::Show(args)) => cmd_show(cli, output, args),
        Some(Commands::Protocol) => {
            output.protocol_tables();
            Ok(())
        }
        Some(Commands::Associate(args)) => cmd_associate(cli, output, args),
        Some(Commands::Enable(args)) => cmd_set_enabled(cli, output, args, true),
        Some(Commands::Disable(args)) => cmd_set_enabled(cli, output, args, false),
        Some(Commands::Pets(_)) => cmd_pets(cli, output),
        Some(Commands::AddConfig(args)) => cmd_add_config(cli, output, args),
        Some(Commands::RemoveConfig(args)) => cmd_remove_config(cli, output, args),
        Some(Commands::SetState(args)) => cmd_set_state(cli, output, args),
        Some(Commands::Send(args)) => cmd_send(cli, output, args),
        Some(Commands::SendMacro(args)) => cmd_send_macro(cli, output, args),
        Some(Commands::Macro(args)) => cmd_macro(cli, output, args),
        Some(Commands::Backup(args)) => cmd_backup(cli, output, args),
        Some(Commands::Version) => {
            let sha = build_info::git_sha();
            let time = build_info::build_timestamp();
            output.version_info(
                build_info::VERSION,
                (sha != "unknown").then_some(sha),
                (time != "unknown").then_some(time),
            );
            Ok(())
        }
        Some(Commands::Completions(args)) => cmd_completions(args),
    }
}

// === Quick Start ===

#[derive(Serialize)]
struct RobotQuickStart {
    tool: &'static str,
    version: &'static str,
    description: &'static str,
    discovery: RobotDiscovery,
    registry: RobotRegistry,
    transmission: RobotTransmission,
    output_modes: OutputModes,
}

#[derive(Serialize)]
struct RobotDiscovery {
    list_interfaces: &'static str,
    list_boards: &'static str,
    board_detail: &'static str,
    protocol_tables: &'static str,
}

#[derive(Serialize)]
struct RobotRegistry {
    register: &'static str,
    associate_pet: &'static str,
    set_state: &'static str,
    save_macro: &'static str,
}

#[derive(Serialize)]
struct RobotTransmission {
    send_selected: &'static str,
    send_explicit: &'static str,
    replay_macro: &'static str,
}

#[derive(Serialize)]
struct OutputModes {
    human: &'static str,
    robot: &'static str,
    compact: &'static str,
}

/// Prints quick-start help optimized for both humans and scripts.
#[allow(clippy::unnecessary_wraps)] // Consistent return type with other commands
fn print_quick_start(cli: &Cli) -> Result<()> {
    if cli.use_json() {
        let help = RobotQuickStart {
            tool: "petlink",
            version: build_info::VERSION,
            description: "Register PET-scanner microcontroller boards and send them opcodes over raw Ethernet",
            discovery: RobotDiscovery {
                list_interfaces: "petlink interfaces --robot",
                list_boards: "petlink list --robot",
                board_detail: "petlink show <MAC_SOURCE> --robot",
                protocol_tables: "petlink protocol --robot",
            },
            registry: RobotRegistry {
                register: "petlink register <MAC_SOURCE> <MAC_DESTINY> --label <NAME>",
                associate_pet: "petlink associate <PET> --mc <MAC_DESTINY> --enabled",
                set_state: "petlink set-state <MAC_SOURCE> <CONFIG> <STATE>",
                save_macro: "petlink macro save <NAME> --from <MAC_SOURCE>",
            },
            transmission: RobotTransmission {
                send_selected: "petlink send <MAC_SOURCE>",
                send_explicit: "petlink send <MAC_SOURCE> -c X_FF_Reset --reps 3",
                replay_macro: "petlink send-macro <MAC_SOURCE> <NAME>",
            },
            output_modes: OutputModes {
                human: "--format=text (default)",
                robot: "--robot or --format=json",
                compact: "--format=json-compact",
            },
        };
        println!("{}", serde_json::to_string_pretty(&help).expect("serialization failed"));
    } else {
        println!(
            "{} {} - PET link control\n",
            style("petlink").bold().cyan(),
            build_info::VERSION
        );

        println!("{}", style("QUICK START").bold().underlined());
        println!();
        println!("  {}  List Ethernet interfaces", style("petlink interfaces").green());
        println!(
            "  {}  Register a board",
            style("petlink register <SRC_MAC> <DST_MAC> -l Lab1").green()
        );
        println!("  {}  List registered boards", style("petlink list").green());
        println!(
            "  {}  Bind a PET slot",
            style("petlink associate 1 --mc <DST_MAC> --enabled").green()
        );
        println!(
            "  {}  Select a state",
            style("petlink set-state <SRC_MAC> <CONFIG> ON").green()
        );
        println!("  {}  Send selected commands", style("petlink send <SRC_MAC>").green());
        println!();
        println!("{}", style("ROBOT MODE (for scripts)").bold().underlined());
        println!();
        println!("  {}  JSON output", style("petlink --robot <command>").cyan());
        println!();
    }
    Ok(())
}

// === State helpers ===

fn load_state(cli: &Cli, config: &AppConfig) -> StateManager {
    let db_path = config.resolve_db_path(cli.db.as_deref());
    debug!(db = %db_path.display(), "Opening database");
    let mut state = StateManager::with_store(JsonStore::new(db_path));
    state.load_from_store();
    state
}

fn require_mc(state: &StateManager, mac_source: &str) -> Result<MicroController> {
    state
        .get_mc(mac_source)
        .cloned()
        .ok_or_else(|| PetlinkError::ControllerNotFound {
            mac_source: mac_source.to_string(),
        })
}

// === Command handlers ===

fn cmd_interfaces(output: &dyn Output) -> Result<()> {
    let interfaces = link::all_interfaces_info();
    output.interface_list(&interfaces);
    Ok(())
}

fn cmd_register(cli: &Cli, output: &dyn Output, args: &RegisterArgs) -> Result<()> {
    let config = AppConfig::load();
    let mut state = load_state(cli, &config);

    let discovered = link::available_interfaces();
    state.update_mc_available(discovered.clone());

    let interface = args
        .interface
        .clone()
        .or_else(|| discovered.get(&args.mac_source.to_ascii_lowercase()).cloned())
        .or_else(|| config.default_interface.clone())
        .ok_or_else(|| {
            PetlinkError::Other(format!(
                "no interface found for source MAC {}; pass --interface",
                args.mac_source
            ))
        })?;

    let label = args
        .label
        .clone()
        .unwrap_or_else(|| args.mac_destiny.clone());

    let mc = MicroController::new(&args.mac_source, &args.mac_destiny, &interface, &label);
    state.register_mc(mc)?;
    output.success(&format!(
        "Registered {label} ({} -> {} via {interface})",
        args.mac_source, args.mac_destiny
    ));
    Ok(())
}

fn cmd_unregister(cli: &Cli, output: &dyn Output, args: &UnregisterArgs) -> Result<()> {
    let config = AppConfig::load();
    let mut state = load_state(cli, &config);

    if state.unregister_mc(&args.mac_source) {
        output.success(&format!("Unregistered {}", args.mac_source));
    } else {
        output.warning(&format!("No board registered under {}", args.mac_source));
    }
    Ok(())
}

fn cmd_list(cli: &Cli, output: &dyn Output) -> Result<()> {
    let config = AppConfig::load();
    let state = {
        let mut state = load_state(cli, &config);
        state.update_mc_available(link::available_interfaces());
        state
    };

    let views: Vec<ControllerView> = state
        .get_all_registered_mcs()
        .iter()
        .map(|mc| ControllerView::from_mc(mc))
        .collect();
    output.controller_list(&views);
    Ok(())
}

fn cmd_show(cli: &Cli, output: &dyn Output, args: &ShowArgs) -> Result<()> {
    let config = AppConfig::load();
    let state = load_state(cli, &config);

    let mc = require_mc(&state, &args.mac_source)?;
    let pets = state.get_pets_by_mc(&mc.mac_destiny);
    output.controller_detail(&ControllerDetail::from_mc(&mc, pets));
    Ok(())
}

fn cmd_associate(cli: &Cli, output: &dyn Output, args: &AssociateArgs) -> Result<()> {
    let config = AppConfig::load();
    let mut state = load_state(cli, &config);

    if args.clear {
        state.associate_pet(args.pet, None, false)?;
        output.success(&format!("PET {} cleared", args.pet));
        return Ok(());
    }

    let Some(mc_mac) = args.mc.clone() else {
        return Err(PetlinkError::Other(
            "specify --mc <MAC_DESTINY> or --clear".to_string(),
        ));
    };

    if state.get_mc_by_destiny(&mc_mac).is_none() {
        output.warning(&format!("No registered board has destiny MAC {mc_mac}"));
    }

    state.associate_pet(args.pet, Some(mc_mac.clone()), args.enabled)?;
    output.success(&format!(
        "PET {} associated with {mc_mac}{}",
        args.pet,
        if args.enabled { " (enabled)" } else { "" }
    ));
    Ok(())
}

fn cmd_set_enabled(cli: &Cli, output: &dyn Output, args: &PetSlotArgs, enabled: bool) -> Result<()> {
    let config = AppConfig::load();
    let mut state = load_state(cli, &config);

    state.set_pet_enabled(args.pet, enabled)?;
    output.success(&format!(
        "PET {} {}",
        args.pet,
        if enabled { "enabled" } else { "disabled" }
    ));
    Ok(())
}

fn cmd_pets(cli: &Cli, output: &dyn Output) -> Result<()> {
    let config = AppConfig::load();
    let state = load_state(cli, &config);

    let slots: Vec<PetSlotView> = state
        .pet_associations()
        .iter()
        .map(|assoc| {
            let label = assoc
                .mc_mac
                .as_deref()
                .and_then(|mac| state.get_mc_by_destiny(mac))
                .map(|mc| mc.label.clone());
            PetSlotView::from_association(assoc, label)
        })
        .collect();
    output.pet_slots(&slots);
    Ok(())
}

fn cmd_add_config(cli: &Cli, output: &dyn Output, args: &ConfigArgs) -> Result<()> {
    let config = AppConfig::load();
    let mut state = load_state(cli, &config);

    state.add_command_config(&args.mac_source, &args.config)?;
    output.success(&format!("Attached '{}' to {}", args.config, args.mac_source));
    Ok(())
}

fn cmd_remove_config(cli: &Cli, output: &dyn Output, args: &ConfigArgs) -> Result<()> {
    let config = AppConfig::load();
    let mut state = load_state(cli, &config);

    if state.remove_command_config(&args.mac_source, &args.config)? {
        output.success(&format!("Detached '{}' from {}", args.config, args.mac_source));
    } else {
        output.warning(&format!(
            "'{}' was not attached to {}",
            args.config, args.mac_source
        ));
    }
    Ok(())
}

fn cmd_set_state(cli: &Cli, output: &dyn Output, args: &SetStateArgs) -> Result<()> {
    let config = AppConfig::load();
    let mut state = load_state(cli, &config);

    state.set_last_state(&args.mac_source, &args.config, &args.state)?;
    if let Some(delay) = args.delay {
        state.set_state_delay(&args.mac_source, &args.config, delay)?;
    }

    if args.state.is_empty() {
        output.success(&format!("Cleared state of '{}'", args.config));
    } else {
        output.success(&format!("'{}' set to {}", args.config, args.state));
    }
    Ok(())
}

fn cmd_send(cli: &Cli, output: &dyn Output, args: &SendArgs) -> Result<()> {
    let config = AppConfig::load();
    let state = load_state(cli, &config);
    let mc = require_mc(&state, &args.mac_source)?;

    let mut items = if args.command.is_empty() {
        mc.selected_commands()?
    } else {
        args.command
            .iter()
            .map(|name| CommandInfo::resolve(name.clone(), name.clone()))
            .collect::<Result<Vec<_>>>()?
    };

    for item in &mut items {
        item.repetitions = args.reps.max(1);
        if let Some(delay) = args.delay_ms {
            item.delay_ms = delay;
        }
    }

    if items.is_empty() {
        output.warning("Nothing selected to send; pick states or pass --command");
        return Ok(());
    }

    if args.dry_run {
        for item in &items {
            output.info(&format!(
                "Would send {item} to {} on {}",
                mc.mac_destiny, mc.interface_destiny
            ));
        }
        return Ok(());
    }

    run_batch(cli, output, items, &mc)
}

fn cmd_send_macro(cli: &Cli, output: &dyn Output, args: &SendMacroArgs) -> Result<()> {
    let config = AppConfig::load();
    let state = load_state(cli, &config);
    let mc = require_mc(&state, &args.mac_source)?;

    let macro_def = if args.universal {
        state.load_macro(&args.name, None)
    } else {
        // Controller scope first, universal as fallback.
        state
            .load_macro(&args.name, Some(&args.mac_source))
            .or_else(|| state.load_macro(&args.name, None))
    }
    .ok_or_else(|| PetlinkError::MacroNotFound {
        name: args.name.clone(),
    })?;

    let mut items = macro_def.selected_commands()?;
    for item in &mut items {
        item.repetitions = args.reps.max(1);
    }

    if items.is_empty() {
        output.warning(&format!("Macro '{}' selects no commands", args.name));
        return Ok(());
    }

    if args.dry_run {
        for item in &items {
            output.info(&format!(
                "Would send {item} to {} on {}",
                mc.mac_destiny, mc.interface_destiny
            ));
        }
        return Ok(());
    }

    run_batch(cli, output, items, &mc)
}

/// Runs a batch on a background worker and waits for it, reporting progress
/// as a bar (human) or JSON lines (robot).
fn run_batch(cli: &Cli, output: &dyn Output, items: Vec<CommandInfo>, mc: &MicroController) -> Result<()> {
    let total: u32 = items.iter().map(|item| item.repetitions).sum();
    let sender = Arc::new(PacketSender::new(open_raw_link()));
    let sent = Arc::new(AtomicU32::new(0));

    let robot = cli.use_json();
    let bar = if robot {
        None
    } else {
        let bar = ProgressBar::new(u64::from(total));
        bar.set_style(
            ProgressStyle::with_template("{bar:30} {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        Some(bar)
    };

    let progress_sent = Arc::clone(&sent);
    let progress_bar = bar.clone();
    let on_progress = move |current: u32, total: u32, message: &str| {
        progress_sent.store(current, Ordering::SeqCst);
        if let Some(bar) = &progress_bar {
            bar.set_position(u64::from(current));
            bar.set_message(message.to_string());
        } else {
            println!(
                "{}",
                json!({"current": current, "total": total, "message": message})
            );
        }
    };

    let handle = sender.spawn_batch(
        items,
        mc.mac_source.clone(),
        mc.mac_destiny.clone(),
        mc.interface_destiny.clone(),
        on_progress,
    );

    let outcome = handle
        .join()
        .map_err(|_| PetlinkError::Other("batch worker panicked".to_string()))??;

    if let Some(bar) = bar {
        bar.finish_and_clear();
    }

    output.send_report(&SendReport::new(outcome, sent.load(Ordering::SeqCst), total));
    Ok(())
}

fn cmd_macro(cli: &Cli, output: &dyn Output, args: &MacroArgs) -> Result<()> {
    let config = AppConfig::load();
    let mut state = load_state(cli, &config);

    match &args.action {
        MacroAction::Save {
            name,
            from,
            mc_scope,
            delta,
        } => {
            let mc = require_mc(&state, from)?;
            let mut macro_def = Macro::snapshot_of(name.clone(), &mc);
            macro_def.delta_time = *delta;

            let scope = mc_scope.then_some(from.as_str());
            state.save_macro(macro_def, scope)?;
            output.success(&format!(
                "Saved macro '{name}' ({})",
                if *mc_scope { "board scope" } else { "universal" }
            ));
            Ok(())
        }
        MacroAction::List { mc } => {
            let store = state
                .store_mut()
                .ok_or_else(|| PetlinkError::Other("no database configured".to_string()))?;
            let manager = MacroManager::new(store);
            let names = manager.list(mc.as_deref());
            let scope = mc.as_deref().unwrap_or("universal");
            output.macro_list(scope, &names);
            Ok(())
        }
        MacroAction::Show { name, mc } => {
            let store = state
                .store_mut()
                .ok_or_else(|| PetlinkError::Other("no database configured".to_string()))?;
            let manager = MacroManager::new(store);
            let macro_def = manager
                .load(name, mc.as_deref())
                .ok_or_else(|| PetlinkError::MacroNotFound { name: name.clone() })?;
            output.macro_detail(&MacroView::from_macro(&macro_def));
            Ok(())
        }
        MacroAction::Delete { name, mc } => {
            let store = state
                .store_mut()
                .ok_or_else(|| PetlinkError::Other("no database configured".to_string()))?;
            let mut manager = MacroManager::new(store);
            if manager.delete(name, mc.as_deref())? {
                output.success(&format!("Deleted macro '{name}'"));
            } else {
                output.warning(&format!("Macro '{name}' not found"));
            }
            Ok(())
        }
        MacroAction::Rename { old_name, new_name, mc } => {
            let store = state
                .store_mut()
                .ok_or_else(|| PetlinkError::Other("no database configured".to_string()))?;
            let mut manager = MacroManager::new(store);
            manager.rename(old_name, new_name, mc.as_deref())?;
            output.success(&format!("Renamed macro '{old_name}' to '{new_name}'"));
            Ok(())
        }
    }
}

fn cmd_backup(cli: &Cli, output: &dyn Output, args: &BackupArgs) -> Result<()> {
    let config = AppConfig::load();
    let state = load_state(cli, &config);
    let store = state
        .store()
        .ok_or_else(|| PetlinkError::Other("no database configured".to_string()))?;

    let target: PathBuf = args.to.clone().unwrap_or_else(|| {
        let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
        let name = store
            .path()
            .file_name()
            .map_or_else(|| "db.json".to_string(), |n| n.to_string_lossy().into_owned());
        store.path().with_file_name(format!("{name}.{stamp}.backup"))
    });

    let written = store.backup(Some(&target))?;
    output.success(&format!("Database backed up to {}", written.display()));
    Ok(())
}

#[allow(clippy::unnecessary_wraps)] // Consistent return type with other commands
fn cmd_completions(args: &CompletionsArgs) -> Result<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(args.shell, &mut cmd, "petlink", &mut io::stdout());
    Ok(())
}
