//! Broadcasting modules for real-time event streaming.
//!
//! Fax lifecycle events are fanned out over a broadcast channel so any
//! number of listeners can follow transmissions as they progress.

pub mod fax_events;

pub use fax_events::{FaxEvent, FaxEventBroadcaster, FaxEventKind};
