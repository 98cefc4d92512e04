//! Theme system for human-mode output.
#![allow(dead_code)]

use console::Style;

/// Visual theme for petlink human-mode output.
///
/// Centralizes styles for consistent rendering.
pub struct PetlinkTheme {
    pub accent: Style,
    pub success: Style,
    pub error: Style,
    pub warning: Style,
    pub muted: Style,

    pub header: Style,
    pub label: Style,
    pub value: Style,
    pub mac: Style,
    pub enabled: Style,
    pub disabled: Style,
}

impl Default for PetlinkTheme {
    fn default() -> Self {
        Self {
            accent: Style::new().cyan(),
            success: Style::new().green().bold(),
            error: Style::new().red().bold(),
            warning: Style::new().yellow().bold(),
            muted: Style::new().dim(),
            header: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold(),
            mac: Style::new().italic(),
            enabled: Style::new().green(),
            disabled: Style::new().dim(),
        }
    }
}
