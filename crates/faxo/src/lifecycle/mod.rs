//! Fax transmission lifecycle.
//!
//! The status state machine, the outcome strategies that decide how a
//! transmission ends, and the timer scheduler that settles in-flight
//! faxes after a configurable delay.

pub mod engine;
pub mod outcome;
pub mod scheduler;
pub mod status;

pub use engine::{parse_direction, Direction, InboundFax, SubmitFax, TransmissionEngine};
pub use outcome::{
    FixedOutcome, Outcome, OutcomeContext, OutcomeStrategy, RandomOutcome, ScriptedOutcome,
};
pub use scheduler::ResolutionScheduler;
pub use status::{parse_status, FaxStatus};
