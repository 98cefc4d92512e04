//! Raw-socket link transport.
//!
//! Wraps `pnet_datalink` to write frames on a Layer-2 channel bound to a
//! named interface. Channels are opened lazily and cached per interface; a
//! failed write drops the cached channel so the next send reopens it.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Mutex;

use pnet_datalink::{self as datalink, Channel, DataLinkSender};
use tracing::{debug, warn};

use super::LinkTransport;
use crate::error::{PetlinkError, Result};

/// Real Layer-2 transport over raw sockets.
pub struct RawLink {
    channels: Mutex<HashMap<String, Box<dyn DataLinkSender>>>,
}

impl RawLink {
    pub fn new() -> Self {
        Self {
            channels: Mutex::new(HashMap::new()),
        }
    }

    fn open_channel(interface: &str) -> Result<Box<dyn DataLinkSender>> {
        let iface = datalink::interfaces()
            .into_iter()
            .find(|candidate| candidate.name == interface)
            .ok_or_else(|| PetlinkError::InterfaceNotFound {
                name: interface.to_string(),
            })?;

        match datalink::channel(&iface, datalink::Config::default()) {
            Ok(Channel::Ethernet(tx, _rx)) => {
                debug!(interface, "Opened raw Layer-2 channel");
                Ok(tx)
            }
            Ok(_) => Err(PetlinkError::Transmission {
                interface: interface.to_string(),
                reason: "unsupported channel type".to_string(),
            }),
            Err(e) => Err(PetlinkError::Transmission {
                interface: interface.to_string(),
                reason: e.to_string(),
            }),
        }
    }
}

impl Default for RawLink {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkTransport for RawLink {
    fn send_frame(&self, interface: &str, frame: &[u8]) -> Result<()> {
        let mut channels = self.channels.lock().expect("channel cache lock poisoned");

        let tx = match channels.entry(interface.to_string()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(Self::open_channel(interface)?),
        };

        match tx.send_to(frame, None) {
            Some(Ok(())) => Ok(()),
            Some(Err(e)) => {
                warn!(interface, error = %e, "Raw frame write failed, dropping cached channel");
                channels.remove(interface);
                Err(PetlinkError::Transmission {
                    interface: interface.to_string(),
                    reason: e.to_string(),
                })
            }
            None => {
                channels.remove(interface);
                Err(PetlinkError::Transmission {
                    interface: interface.to_string(),
                    reason: "channel did not accept the frame".to_string(),
                })
            }
        }
    }
}
