//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     trigger → accept loop stops → listener dropped → connections drain → exit
//! ```
//!
//! # Design Decisions
//! - The accept loop selects on the shutdown receiver, so a stop request
//!   never races with an accept error
//! - Draining has a deadline: stalled peers do not block exit forever

pub mod shutdown;
pub mod signals;

pub use shutdown::{Shutdown, ShutdownReceiver};
