//! Runtime events: classification, payload, and the broadcast bus.
//!
//! Everything observable about the control layer flows through here: task
//! lifecycle transitions, rejected or unknown commands, publish failures, and
//! the shutdown sequence. Subscribers (see [`crate::subscribers`]) consume
//! the bus for logging and diagnostics.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
