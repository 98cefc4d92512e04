//! CLI argument definitions and command dispatch.

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// petlink - register PET-scanner microcontroller boards and drive them with
/// single-byte opcodes over a custom Layer-2 protocol.
///
/// Robot Mode: Use --robot or --format=json for machine-parseable output.
#[derive(Parser, Debug)]
#[command(name = "petlink", version, about, long_about = None)]
#[command(propagate_version = true)]
#[allow(clippy::struct_excessive_bools)] // CLI flags naturally use multiple bools
pub struct Cli {
    /// Output format (text for humans, json for agents/scripts)
    #[arg(
        long,
        short = 'f',
        default_value = "text",
        global = true,
        env = "PETLINK_FORMAT"
    )]
    pub format: OutputFormat,

    /// Robot mode: equivalent to --format=json (optimized for scripting)
    #[arg(long, global = true)]
    pub robot: bool,

    /// Verbose output (-v for debug, -vv for trace)
    #[arg(long, short = 'v', global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-essential output)
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Database file location (overrides config file)
    #[arg(long, global = true, env = "PETLINK_DB")]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Output format selection.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text with optional color
    #[default]
    Text,
    /// JSON output for scripts and agents
    Json,
    /// Compact JSON (single line)
    JsonCompact,
}

impl Cli {
    /// Returns true if output should be JSON (robot mode or explicit --format=json).
    pub const fn use_json(&self) -> bool {
        self.robot || matches!(self.format, OutputFormat::Json | OutputFormat::JsonCompact)
    }

    /// Returns true if output should be compact JSON.
    pub const fn use_compact_json(&self) -> bool {
        matches!(self.format, OutputFormat::JsonCompact)
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    // === Discovery & Registry ===
    /// List usable Ethernet interfaces (MAC and name)
    Interfaces(InterfacesArgs),

    /// Register a microcontroller board
    Register(RegisterArgs),

    /// Unregister a board (clears its PET associations)
    Unregister(UnregisterArgs),

    /// List registered boards
    List(ListArgs),

    /// Show one board's full configuration
    Show(ShowArgs),

    /// Show the protocol command and configuration tables
    Protocol,

    // === PET slots ===
    /// Associate a PET slot with a board (or clear it)
    Associate(AssociateArgs),

    /// Enable a PET slot
    Enable(PetSlotArgs),

    /// Disable a PET slot
    Disable(PetSlotArgs),

    /// Show all PET slot associations
    Pets(PetsArgs),

    // === Command configuration ===
    /// Attach a protocol configuration to a board
    AddConfig(ConfigArgs),

    /// Detach a configuration from a board
    RemoveConfig(ConfigArgs),

    /// Select a configuration state on a board (empty state clears)
    SetState(SetStateArgs),

    // === Transmission ===
    /// Send commands to a board (selected state, or explicit --command)
    Send(SendArgs),

    /// Replay a saved macro against a board
    SendMacro(SendMacroArgs),

    // === Macros ===
    /// Manage saved macros
    Macro(MacroArgs),

    // === Utilities ===
    /// Back up the database file
    Backup(BackupArgs),

    /// Show version and build information
    Version,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// === Argument Structs ===

#[derive(Parser, Debug)]
pub struct InterfacesArgs {}

#[derive(Parser, Debug)]
pub struct RegisterArgs {
    /// Source MAC (local interface used to reach the board)
    pub mac_source: String,

    /// Destiny MAC (the remote board)
    pub mac_destiny: String,

    /// Interface name; discovered from the source MAC when omitted
    #[arg(long, short = 'i')]
    pub interface: Option<String>,

    /// Display label; defaults to the destiny MAC
    #[arg(long, short = 'l')]
    pub label: Option<String>,
}

#[derive(Parser, Debug)]
pub struct UnregisterArgs {
    /// Source MAC of the board to remove
    pub mac_source: String,
}

#[derive(Parser, Debug)]
pub struct ListArgs {}

#[derive(Parser, Debug)]
pub struct ShowArgs {
    /// Source MAC of the board
    pub mac_source: String,
}

#[derive(Parser, Debug)]
pub struct AssociateArgs {
    /// PET slot number (1-10)
    pub pet: u8,

    /// Destiny MAC of the board to associate
    #[arg(long, conflicts_with = "clear")]
    pub mc: Option<String>,

    /// Enable the slot at the same time
    #[arg(long)]
    pub enabled: bool,

    /// Clear the slot's association instead
    #[arg(long)]
    pub clear: bool,
}

#[derive(Parser, Debug)]
pub struct PetSlotArgs {
    /// PET slot number (1-10)
    pub pet: u8,
}

#[derive(Parser, Debug)]
pub struct PetsArgs {}

#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Source MAC of the board
    pub mac_source: String,

    /// Configuration name from the protocol table
    pub config: String,
}

#[derive(Parser, Debug)]
pub struct SetStateArgs {
    /// Source MAC of the board
    pub mac_source: String,

    /// Configuration name
    pub config: String,

    /// State label (e.g. ON, OFF, HIGH); empty string clears the selection
    pub state: String,

    /// Inter-send delay in seconds stored with this configuration
    #[arg(long)]
    pub delay: Option<f64>,
}

#[derive(Parser, Debug)]
pub struct SendArgs {
    /// Source MAC of the target board
    pub mac_source: String,

    /// Explicit command names to send; omitted = currently selected states
    #[arg(long, short = 'c')]
    pub command: Vec<String>,

    /// Repetitions per command
    #[arg(long, short = 'r', default_value = "1")]
    pub reps: u32,

    /// Inter-send delay in milliseconds (overrides stored delays)
    #[arg(long)]
    pub delay_ms: Option<u64>,

    /// Show what would be sent without touching the wire
    #[arg(long, short = 'n')]
    pub dry_run: bool,
}

#[derive(Parser, Debug)]
pub struct SendMacroArgs {
    /// Source MAC of the target board
    pub mac_source: String,

    /// Macro name
    pub name: String,

    /// Look up the macro in the universal scope only
    #[arg(long)]
    pub universal: bool,

    /// Repetitions per command
    #[arg(long, short = 'r', default_value = "1")]
    pub reps: u32,

    /// Show what would be sent without touching the wire
    #[arg(long, short = 'n')]
    pub dry_run: bool,
}

#[derive(Parser, Debug)]
pub struct MacroArgs {
    #[command(subcommand)]
    pub action: MacroAction,
}

#[derive(Subcommand, Debug)]
pub enum MacroAction {
    /// Snapshot a board's current selections as a macro
    Save {
        /// Macro name
        name: String,

        /// Source MAC of the board to snapshot
        #[arg(long)]
        from: String,

        /// Store in the board's own scope instead of the universal one
        #[arg(long)]
        mc_scope: bool,

        /// Default inter-send delay in seconds for the whole macro
        #[arg(long)]
        delta: Option<f64>,
    },

    /// List macros in a scope
    List {
        /// Source MAC selecting a board's scope; omitted = universal
        #[arg(long)]
        mc: Option<String>,
    },

    /// Show one macro's contents
    Show {
        name: String,
        #[arg(long)]
        mc: Option<String>,
    },

    /// Delete a macro
    Delete {
        name: String,
        #[arg(long)]
        mc: Option<String>,
    },

    /// Rename a macro within its scope
    Rename {
        old_name: String,
        new_name: String,
        #[arg(long)]
        mc: Option<String>,
    },
}

#[derive(Parser, Debug)]
pub struct BackupArgs {
    /// Backup destination; defaults to a timestamped file next to the database
    #[arg(long)]
    pub to: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
