//! Layer-2 frame encoding for microcontroller commands.
//!
//! Frames carry one opcode byte (plus optional extra payload for composite
//! commands) directly after a fixed header:
//!
//! ```text
//! [dst MAC: 6][src MAC: 6][payload_len: u16 BE][00 00 00 00][02 03][opcode][extra...]
//! ```
//!
//! `payload_len` counts everything after the length field itself: 4 padding
//! bytes, the 2 marker bytes and the opcode, plus any extra payload. There is
//! no checksum and no trailer; delivery integrity is handled by repetition at
//! the batch layer.

use crate::error::{PetlinkError, Result};

/// Payload length of a frame with no extra payload (4 padding + 2 marker + opcode).
pub const PAYLOAD_BASE_LEN: u16 = 7;

/// Fixed padding after the length field.
pub const PADDING: [u8; 4] = [0x00, 0x00, 0x00, 0x00];

/// Constant marker bytes preceding the opcode.
pub const MARKER: [u8; 2] = [0x02, 0x03];

/// Total frame length with no extra payload.
pub const BASE_FRAME_LEN: usize = 6 + 6 + 2 + PAYLOAD_BASE_LEN as usize;

/// Parses a MAC address string into its 6 raw bytes.
///
/// Accepts `:` or `-` separated hex pairs, or 12 bare hex digits. Anything
/// that does not decode to exactly 6 bytes is rejected before any frame
/// assembly happens.
pub fn parse_mac(mac: &str) -> Result<[u8; 6]> {
    let cleaned: String = mac.chars().filter(|c| *c != ':' && *c != '-').collect();
    let bytes = hex::decode(&cleaned).map_err(|_| PetlinkError::InvalidMacAddress {
        value: mac.to_string(),
    })?;

    bytes
        .try_into()
        .map_err(|_| PetlinkError::InvalidMacAddress {
            value: mac.to_string(),
        })
}

/// Strict MAC format check used by registration: six hex pairs separated by
/// `:` or `-`.
pub fn validate_mac(mac: &str) -> bool {
    let parts: Vec<&str> = if mac.contains(':') {
        mac.split(':').collect()
    } else if mac.contains('-') {
        mac.split('-').collect()
    } else {
        return false;
    };

    parts.len() == 6
        && parts
            .iter()
            .all(|p| p.len() == 2 && p.chars().all(|c| c.is_ascii_hexdigit()))
}

/// Renders 6 MAC bytes in the canonical lowercase colon-separated form.
pub fn format_mac(bytes: &[u8; 6]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(":")
}

/// Builds the raw frame for one opcode.
///
/// Both MAC strings are validated first; a malformed address fails with
/// `InvalidMacAddress` and no bytes are assembled.
pub fn encode(mac_destiny: &str, mac_source: &str, opcode: u8, extra_payload: &[u8]) -> Result<Vec<u8>> {
    let destiny = parse_mac(mac_destiny)?;
    let source = parse_mac(mac_source)?;

    let payload_len = PAYLOAD_BASE_LEN + extra_payload.len() as u16;

    let mut frame = Vec::with_capacity(BASE_FRAME_LEN + extra_payload.len());
    frame.extend_from_slice(&destiny);
    frame.extend_from_slice(&source);
    frame.extend_from_slice(&payload_len.to_be_bytes());
    frame.extend_from_slice(&PADDING);
    frame.extend_from_slice(&MARKER);
    frame.push(opcode);
    frame.extend_from_slice(extra_payload);

    Ok(frame)
}
