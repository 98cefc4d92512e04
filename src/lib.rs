//! petlink library - PET-scanner microcontroller control over raw Ethernet.
//!
//! This library exposes the core functionality of the `petlink` CLI for use
//! in tests and potentially other applications.
//!
//! # Modules
//!
//! - `protocol`: Static opcode and configuration tables
//! - `frame`: MAC parsing and Layer-2 frame encoding
//! - `link`: Raw-socket transport seam (real and mock) plus discovery
//! - `sender`: Cancellable single-flight batch transmitter
//! - `model`: Controller, PET association, macro and command entities
//! - `state`: Entity graph CRUD with JSON persistence
//! - `store`: Single-document JSON store
//! - `macros`: Dual-scope macro CRUD over the store
//! - `error`: Error types with user-recoverable hints
//! - `output`: Output mode abstraction (robot/human)
#![forbid(unsafe_code)]

pub mod cli;
pub mod config;
pub mod error;
pub mod frame;
pub mod link;
pub mod logging;
pub mod macros;
pub mod model;
pub mod output;
pub mod protocol;
pub mod sender;
pub mod state;
pub mod store;
pub mod theme;
