//! Static protocol tables for the microcontroller Layer-2 command set.
//!
//! One immutable registry for the whole application: command name to opcode
//! byte, and configuration name to its mutually-exclusive state labels.
//! `validate()` must pass before any table lookup is trusted; it rejects
//! duplicate opcode bytes and configurations referencing unknown commands.

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::error::{PetlinkError, Result};

/// Command name to opcode byte.
pub const COMMANDS: &[(&str, u8)] = &[
    ("X_00_CPU", 0x00),
    ("X_02_TestTrigger", 0x02),
    ("X_03_RO_Single", 0x03),
    ("X_04_RO_ON", 0x04),
    ("X_05_RO_OFF", 0x05),
    ("X_08_DIAG_", 0x08),
    ("X_09_DIAG_DIS", 0x09),
    ("X_F9_TTrig_Global", 0xf9),
    ("X_FA_TTrig_Local", 0xfa),
    ("X_FB_TTrig_Auto_EN", 0xfb),
    ("X_FC_TTrig_Auto_DIS", 0xfc),
    ("X_FF_Reset", 0xff),
    ("X_20_PwrDwnb_TOP_ON", 0x20),
    ("X_21_PwrDwnb_TOP_OFF", 0x21),
    ("X_22_PwrDwnb_BOT_ON", 0x22),
    ("X_23_PwrDwnb_BOT_OFF", 0x23),
    ("X_24_PwrEN_2V4A_ON", 0x24),
    ("X_25_PwrEN_2V4A_OFF", 0x25),
    ("X_26_PwrEN_2V4D_ON", 0x26),
    ("X_27_PwrEN_2V4D_OFF", 0x27),
    ("X_28_PwrEN_3V1_ON", 0x28),
    ("X_29_PwrEN_3V1_OFF", 0x29),
    ("X_2A_PwrEN_1V8A_ON", 0x2a),
    ("X_2B_PwrEN_1V8A_OFF", 0x2b),
    ("X_E0_FanSpeed0_Low", 0xe0),
    ("X_E1_FanSpeed0_High", 0xe1),
    ("X_E2_FanSpeed1_Low", 0xe2),
    ("X_E3_FanSpeed1_High", 0xe3),
];

/// Configuration name to (state label, command name) pairs.
///
/// State labels within one configuration are mutually exclusive; the
/// configuration name doubles as the display name in the UI layer.
pub const COMMAND_CONFIGS: &[(&str, &[(&str, &str)])] = &[
    ("X_02_TestTrigger", &[("ON", "X_02_TestTrigger")]),
    ("X_03_RO_Single", &[("ON", "X_03_RO_Single")]),
    (
        "X_04_RO_ON | X_05_RO_OFF",
        &[("ON", "X_04_RO_ON"), ("OFF", "X_05_RO_OFF")],
    ),
    (
        "X_08_DIAG_ | X_09_DIAG_DIS",
        &[("ON", "X_08_DIAG_"), ("OFF", "X_09_DIAG_DIS")],
    ),
    (
        "X_FB_TTrig_Auto_EN | X_FC_TTrig_Auto_DIS",
        &[("ON", "X_FB_TTrig_Auto_EN"), ("OFF", "X_FC_TTrig_Auto_DIS")],
    ),
    ("X_FF_Reset", &[("ON", "X_FF_Reset")]),
    (
        "X_20_PwrDwnb_TOP_ON | X_21_PwrDwnb_TOP_OFF",
        &[("ON", "X_20_PwrDwnb_TOP_ON"), ("OFF", "X_21_PwrDwnb_TOP_OFF")],
    ),
    (
        "X_22_PwrDwnb_BOT_ON | X_23_PwrDwnb_BOT_OFF",
        &[("ON", "X_22_PwrDwnb_BOT_ON"), ("OFF", "X_23_PwrDwnb_BOT_OFF")],
    ),
    (
        "X_26_PwrEN_2V4D_ON | X_27_PwrEN_2V4D_OFF",
        &[("ON", "X_26_PwrEN_2V4D_ON"), ("OFF", "X_27_PwrEN_2V4D_OFF")],
    ),
    (
        "X_28_PwrEN_3V1_ON | X_29_PwrEN_3V1_OFF",
        &[("ON", "X_28_PwrEN_3V1_ON"), ("OFF", "X_29_PwrEN_3V1_OFF")],
    ),
    (
        "X_2A_PwrEN_1V8A_ON | X_2B_PwrEN_1V8A_OFF",
        &[("ON", "X_2A_PwrEN_1V8A_ON"), ("OFF", "X_2B_PwrEN_1V8A_OFF")],
    ),
    (
        "X_E1_FanSpeed0_High | X_E0_FanSpeed0_Low",
        &[("HIGH", "X_E1_FanSpeed0_High"), ("LOW", "X_E0_FanSpeed0_Low")],
    ),
    (
        "X_F9_TTrig_Global | X_FA_TTrig_Local",
        &[("GLOBAL", "X_F9_TTrig_Global"), ("LOCAL", "X_FA_TTrig_Local")],
    ),
    (
        "X_E3_FanSpeed1_High | X_E2_FanSpeed1_Low",
        &[("HIGH", "X_E3_FanSpeed1_High"), ("LOW", "X_E2_FanSpeed1_Low")],
    ),
];

static COMMAND_INDEX: LazyLock<HashMap<&'static str, u8>> =
    LazyLock::new(|| COMMANDS.iter().copied().collect());

static CONFIG_INDEX: LazyLock<HashMap<&'static str, &'static [(&'static str, &'static str)]>> =
    LazyLock::new(|| COMMAND_CONFIGS.iter().copied().collect());

/// Self-check for the static tables. Run once at startup.
///
/// Fails if two commands share an opcode byte or a configuration references
/// a command name missing from the opcode table.
pub fn validate() -> Result<()> {
    let mut seen: HashMap<u8, &str> = HashMap::new();
    for &(name, byte) in COMMANDS {
        if let Some(first) = seen.insert(byte, name) {
            return Err(PetlinkError::DuplicateOpcode {
                byte,
                first: first.to_string(),
                second: name.to_string(),
            });
        }
    }

    for &(config, states) in COMMAND_CONFIGS {
        for &(_, command) in states {
            if !COMMAND_INDEX.contains_key(command) {
                return Err(PetlinkError::DanglingConfigCommand {
                    config: config.to_string(),
                    command: command.to_string(),
                });
            }
        }
    }

    Ok(())
}

/// Opcode byte for a command name.
pub fn command_byte(name: &str) -> Result<u8> {
    COMMAND_INDEX
        .get(name)
        .copied()
        .ok_or_else(|| PetlinkError::UnknownCommand {
            name: name.to_string(),
        })
}

/// State label to command name map for a configuration.
pub fn config_states(name: &str) -> Result<&'static [(&'static str, &'static str)]> {
    CONFIG_INDEX
        .get(name)
        .copied()
        .ok_or_else(|| PetlinkError::UnknownConfig {
            name: name.to_string(),
        })
}

/// Command name selected by a given state label of a configuration.
pub fn command_for_state(config: &str, state: &str) -> Result<&'static str> {
    let states = config_states(config)?;
    states
        .iter()
        .find(|(label, _)| *label == state)
        .map(|&(_, command)| command)
        .ok_or_else(|| PetlinkError::UnknownCommand {
            name: format!("{config}:{state}"),
        })
}

pub fn is_valid_command(name: &str) -> bool {
    COMMAND_INDEX.contains_key(name)
}

pub fn is_valid_config(name: &str) -> bool {
    CONFIG_INDEX.contains_key(name)
}

/// All command names, in table order.
pub fn all_command_names() -> Vec<&'static str> {
    COMMANDS.iter().map(|&(name, _)| name).collect()
}

/// All configuration names, in table order.
pub fn all_config_names() -> Vec<&'static str> {
    COMMAND_CONFIGS.iter().map(|&(name, _)| name).collect()
}
