//! Error types for PET link-control operations.

use thiserror::Error;

/// Primary error type for petlink operations.
#[derive(Error, Debug)]
pub enum PetlinkError {
    // Addressing errors
    #[error("Invalid MAC address: {value}")]
    InvalidMacAddress { value: String },

    #[error("PET number {value} out of range: must be 1-10")]
    PetNumberOutOfRange { value: u8 },

    #[error("PET slot {pet_num} has no associated controller")]
    PetNotAssociated { pet_num: u8 },

    // Protocol errors
    #[error("Unknown command: {name}")]
    UnknownCommand { name: String },

    #[error("Unknown command configuration: {name}")]
    UnknownConfig { name: String },

    #[error("Duplicate opcode 0x{byte:02x} shared by '{first}' and '{second}'")]
    DuplicateOpcode {
        byte: u8,
        first: String,
        second: String,
    },

    #[error("Configuration '{config}' references unknown command '{command}'")]
    DanglingConfigCommand { config: String, command: String },

    // Registry errors
    #[error("Controller not registered: {mac_source}")]
    ControllerNotFound { mac_source: String },

    #[error("Macro not found: {name}")]
    MacroNotFound { name: String },

    #[error("Macro '{name}' already exists in this scope")]
    MacroNameTaken { name: String },

    // Transmission errors
    #[error("A batch transmission is already in progress")]
    TransmitterBusy,

    #[error("Failed to send frame on '{interface}': {reason}")]
    Transmission { interface: String, reason: String },

    #[error("Network interface not found or not usable: {name}")]
    InterfaceNotFound { name: String },

    // Persistence errors
    #[error("Persistence failure for '{path}': {reason}")]
    Persistence { path: String, reason: String },

    // General errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl PetlinkError {
    /// Returns true if the error is recoverable by the user.
    pub const fn is_user_recoverable(&self) -> bool {
        matches!(
            self,
            Self::InvalidMacAddress { .. }
                | Self::PetNumberOutOfRange { .. }
                | Self::PetNotAssociated { .. }
                | Self::UnknownCommand { .. }
                | Self::UnknownConfig { .. }
                | Self::ControllerNotFound { .. }
                | Self::MacroNotFound { .. }
                | Self::MacroNameTaken { .. }
                | Self::TransmitterBusy
                | Self::InterfaceNotFound { .. }
        )
    }

    /// Returns a suggestion for how to fix the error.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::InvalidMacAddress { .. } => {
                Some("Use the aa:bb:cc:dd:ee:ff form (':' or '-' separators)")
            }
            Self::PetNumberOutOfRange { .. } => Some("PET slots are numbered 1 through 10"),
            Self::PetNotAssociated { .. } => {
                Some("Associate a controller first: petlink associate <PET> --mc <MAC>")
            }
            Self::UnknownCommand { .. } | Self::UnknownConfig { .. } => {
                Some("Run: petlink protocol to list known names")
            }
            Self::ControllerNotFound { .. } => Some("Run: petlink list to see registered boards"),
            Self::MacroNotFound { .. } => Some("Run: petlink macro list"),
            Self::TransmitterBusy => Some("Wait for the running batch to finish or cancel it"),
            Self::InterfaceNotFound { .. } => Some("Run: petlink interfaces"),
            _ => None,
        }
    }
}

/// Convenience type alias for Results using PetlinkError.
pub type Result<T> = std::result::Result<T, PetlinkError>;

/// Extension trait for adding context to errors.
pub trait ResultExt<T> {
    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T, E: std::error::Error> ResultExt<T> for std::result::Result<T, E> {
    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|e| PetlinkError::Other(format!("{}: {e}", f().into())))
    }
}
