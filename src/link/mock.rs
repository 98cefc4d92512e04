//! Mock link transport for unit testing.
//!
//! Records every frame it is asked to send and supports error injection for
//! exercising the transmitter's best-effort error handling.
//!
//! # Example
//!
//! ```rust,ignore
//! use petlink::link::mock::MockLink;
//! use petlink::link::LinkTransport;
//!
//! let link = MockLink::new();
//! link.send_frame("eth0", &[0x11; 21]).unwrap();
//! assert_eq!(link.send_count(), 1);
//! ```

use std::sync::Mutex;

use tracing::trace;

use super::LinkTransport;
use crate::error::{PetlinkError, Result};

/// One recorded transmission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentFrame {
    pub interface: String,
    pub frame: Vec<u8>,
}

/// Configuration for mock failure behavior.
#[derive(Debug, Clone, Default)]
pub struct MockLinkConfig {
    /// Fail every send once this many sends have been attempted.
    pub fail_after_sends: Option<usize>,
    /// Interfaces whose sends always fail.
    pub failing_interfaces: Vec<String>,
}

/// Recording mock transport.
pub struct MockLink {
    log: Mutex<Vec<SentFrame>>,
    attempts: Mutex<usize>,
    injected_error: Mutex<Option<String>>,
    config: MockLinkConfig,
}

impl MockLink {
    pub fn new() -> Self {
        Self::with_config(MockLinkConfig::default())
    }

    pub fn with_config(config: MockLinkConfig) -> Self {
        Self {
            log: Mutex::new(Vec::new()),
            attempts: Mutex::new(0),
            injected_error: Mutex::new(None),
            config,
        }
    }

    /// Makes the next send fail once with the given reason.
    pub fn inject_error(&self, reason: impl Into<String>) {
        *self.injected_error.lock().expect("mock lock poisoned") = Some(reason.into());
    }

    /// Frames successfully "sent" so far.
    pub fn sent_frames(&self) -> Vec<SentFrame> {
        self.log.lock().expect("mock lock poisoned").clone()
    }

    /// Number of successful sends.
    pub fn send_count(&self) -> usize {
        self.log.lock().expect("mock lock poisoned").len()
    }

    /// Number of send attempts, including failed ones.
    pub fn attempt_count(&self) -> usize {
        *self.attempts.lock().expect("mock lock poisoned")
    }

    /// Opcode byte of every successfully sent frame, in order.
    pub fn sent_opcodes(&self) -> Vec<u8> {
        self.sent_frames()
            .iter()
            .filter_map(|sent| sent.frame.get(20).copied())
            .collect()
    }

    pub fn clear(&self) {
        self.log.lock().expect("mock lock poisoned").clear();
        *self.attempts.lock().expect("mock lock poisoned") = 0;
    }
}

impl Default for MockLink {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkTransport for MockLink {
    fn send_frame(&self, interface: &str, frame: &[u8]) -> Result<()> {
        let attempt = {
            let mut attempts = self.attempts.lock().expect("mock lock poisoned");
            *attempts += 1;
            *attempts
        };

        if let Some(reason) = self.injected_error.lock().expect("mock lock poisoned").take() {
            return Err(PetlinkError::Transmission {
                interface: interface.to_string(),
                reason,
            });
        }

        if self.config.failing_interfaces.iter().any(|f| f == interface) {
            return Err(PetlinkError::Transmission {
                interface: interface.to_string(),
                reason: "interface configured to fail".to_string(),
            });
        }

        if let Some(limit) = self.config.fail_after_sends {
            if attempt > limit {
                return Err(PetlinkError::Transmission {
                    interface: interface.to_string(),
                    reason: format!("send limit of {limit} reached"),
                });
            }
        }

        trace!(interface, len = frame.len(), "Mock frame recorded");
        self.log.lock().expect("mock lock poisoned").push(SentFrame {
            interface: interface.to_string(),
            frame: frame.to_vec(),
        });
        Ok(())
    }
}
