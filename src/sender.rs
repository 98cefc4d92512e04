//! Batch packet transmission.
//!
//! `PacketSender` is a two-state machine (idle / sending) in front of a
//! `LinkTransport`. Batches are single-flight: a second batch while one is
//! in flight is rejected, not queued. Cancellation is cooperative — a flag
//! polled between sends and in ~100 ms slices during delays, so cancel
//! latency is bounded regardless of the configured delay. An individual send
//! failure is reported through the progress callback and the batch carries
//! on; only cancellation stops it early.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::error::{PetlinkError, Result};
use crate::frame;
use crate::link::SharedLink;
use crate::model::CommandInfo;

/// Granularity of cancellation checks while waiting out an inter-send delay.
const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// How a batch ended. Cancellation is a normal outcome, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOutcome {
    /// Every item ran to completion (some sends may have failed).
    Completed,
    /// The batch stopped at a cancellation check point.
    Cancelled,
}

impl BatchOutcome {
    pub const fn is_completed(self) -> bool {
        matches!(self, Self::Completed)
    }
}

/// Progress callback: (sends done, total sends, message).
///
/// Totals sum repetitions across all items, so progress reads as
/// "Nth of M total sends".
pub type ProgressFn = dyn Fn(u32, u32, &str) + Send + Sync;

/// Single-flight batch transmitter over a shared link.
pub struct PacketSender {
    link: SharedLink,
    sending: Mutex<bool>,
    cancel: AtomicBool,
}

impl PacketSender {
    pub fn new(link: SharedLink) -> Self {
        Self {
            link,
            sending: Mutex::new(false),
            cancel: AtomicBool::new(false),
        }
    }

    /// Encodes and writes one frame. No response is awaited.
    pub fn send_one(
        &self,
        mac_source: &str,
        mac_destiny: &str,
        interface: &str,
        opcode: u8,
        extra_payload: &[u8],
    ) -> Result<()> {
        let frame = frame::encode(mac_destiny, mac_source, opcode, extra_payload)?;
        self.link.send_frame(interface, &frame)
    }

    /// Runs a batch to completion or cancellation on the calling thread.
    ///
    /// Fails immediately with `TransmitterBusy` when another batch holds the
    /// sending flag.
    pub fn send_batch(
        &self,
        items: &[CommandInfo],
        mac_source: &str,
        mac_destiny: &str,
        interface: &str,
        on_progress: &ProgressFn,
    ) -> Result<BatchOutcome> {
        {
            let mut sending = self.sending.lock().expect("sending flag lock poisoned");
            if *sending {
                return Err(PetlinkError::TransmitterBusy);
            }
            *sending = true;
            self.cancel.store(false, Ordering::SeqCst);
        }
        let _guard = SendingGuard(self);

        let total: u32 = items.iter().map(|item| item.repetitions).sum();
        let mut sent: u32 = 0;
        debug!(total, interface, mac_destiny, "Starting batch transmission");

        for item in items {
            for rep in 0..item.repetitions {
                if self.cancel.load(Ordering::SeqCst) {
                    info!(sent, total, "Batch cancelled between sends");
                    on_progress(sent, total, &format!("Cancelled after {sent}/{total} sends"));
                    return Ok(BatchOutcome::Cancelled);
                }

                sent += 1;
                match self.send_one(
                    mac_source,
                    mac_destiny,
                    interface,
                    item.command_byte,
                    &item.extra_payload,
                ) {
                    Ok(()) => {
                        let rep_info = if item.repetitions > 1 {
                            format!(" (rep {}/{})", rep + 1, item.repetitions)
                        } else {
                            String::new()
                        };
                        on_progress(sent, total, &format!("Sent {}{rep_info}", item.command_name));
                    }
                    Err(e) => {
                        warn!(command = %item.command_name, error = %e, "Send failed, continuing batch");
                        on_progress(sent, total, &format!("Error: {e}"));
                    }
                }

                if sent < total && item.delay_ms > 0
                    && !self.sleep_with_cancel(Duration::from_millis(item.delay_ms))
                {
                    info!(sent, total, "Batch cancelled during delay");
                    on_progress(sent, total, "Transmission cancelled");
                    return Ok(BatchOutcome::Cancelled);
                }
            }
        }

        info!(total, "Batch transmission complete");
        on_progress(total, total, "All commands sent");
        Ok(BatchOutcome::Completed)
    }

    /// Runs a batch on a background worker thread.
    ///
    /// The caller keeps its own `Arc` handle for `cancel()`/`is_sending()`.
    pub fn spawn_batch<F>(
        self: Arc<Self>,
        items: Vec<CommandInfo>,
        mac_source: String,
        mac_destiny: String,
        interface: String,
        on_progress: F,
    ) -> JoinHandle<Result<BatchOutcome>>
    where
        F: Fn(u32, u32, &str) + Send + Sync + 'static,
    {
        thread::spawn(move || {
            self.send_batch(&items, &mac_source, &mac_destiny, &interface, &on_progress)
        })
    }

    /// Requests cancellation of the in-flight batch.
    ///
    /// Takes effect at the next check point (between sends or within a delay
    /// slice), not instantaneously.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    pub fn is_sending(&self) -> bool {
        *self.sending.lock().expect("sending flag lock poisoned")
    }

    /// Sleeps out a delay in cancellation-check slices. Returns false when
    /// the delay was interrupted by cancellation.
    fn sleep_with_cancel(&self, delay: Duration) -> bool {
        let mut remaining = delay;
        while remaining > Duration::ZERO {
            if self.cancel.load(Ordering::SeqCst) {
                return false;
            }
            let slice = remaining.min(CANCEL_POLL_INTERVAL);
            thread::sleep(slice);
            remaining = remaining.saturating_sub(slice);
        }
        !self.cancel.load(Ordering::SeqCst)
    }
}

/// Resets the sending/cancel flags on every exit path of a batch.
struct SendingGuard<'a>(&'a PacketSender);

impl Drop for SendingGuard<'_> {
    fn drop(&mut self) {
        *self.0.sending.lock().expect("sending flag lock poisoned") = false;
        self.0.cancel.store(false, Ordering::SeqCst);
    }
}
