//! Link-layer abstraction for raw Ethernet transmission.
//!
//! This module provides a trait-based seam over the real raw-socket
//! transport and a mock implementation, enabling transmitter tests without
//! network privileges or hardware on the wire.

pub mod interfaces;
pub mod mock;
mod real;

pub use interfaces::{
    all_interfaces_info, available_interfaces, interface_by_mac, is_interface_up, InterfaceInfo,
};
pub use real::RawLink;

use std::sync::Arc;

use crate::error::Result;

/// One-way raw frame transport.
///
/// Implementations write a fully-encoded Layer-2 frame on a named interface.
/// The write is synchronous and fire-and-forget: no response is awaited and
/// no retry happens at this layer.
pub trait LinkTransport: Send + Sync {
    fn send_frame(&self, interface: &str, frame: &[u8]) -> Result<()>;
}

/// Shared handle to a link transport, cloneable across batch workers.
pub type SharedLink = Arc<dyn LinkTransport>;

/// Opens the real raw-socket transport as a shared handle.
pub fn open_raw_link() -> SharedLink {
    Arc::new(RawLink::new())
}
