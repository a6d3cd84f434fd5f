//! Outcome strategies for the simulated transmission.
//!
//! A strategy decides how a fax attempt ends once its resolution timer
//! fires. Production uses [`RandomOutcome`]; tests swap in
//! [`FixedOutcome`] or [`ScriptedOutcome`] for deterministic runs.

use std::collections::VecDeque;
use std::sync::Mutex;

use rand::Rng;

use crate::config::DeliveryConfig;

/// Messages attached to a failed transmission.
const FAILURE_MESSAGES: &[&str] = &[
    "Recipient did not answer",
    "Transmission interrupted before completion",
    "Document rejected by receiving machine",
    "Remote fax returned a negative confirmation",
];

/// Messages attached to a line error.
const LINE_ERROR_MESSAGES: &[&str] = &[
    "Line busy or no answer",
    "No dial tone on outbound line",
    "Carrier signal lost during handshake",
];

/// What the attempt being resolved looks like to a strategy.
#[derive(Debug, Clone, Copy)]
pub struct OutcomeContext<'a> {
    pub fax_id: &'a str,
    /// 1-based attempt counter, bumped on every retry.
    pub attempt: u32,
}

/// How a transmission attempt ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Delivered,
    Failed { message: String },
    Error { message: String },
}

/// Decides the fate of a fax attempt.
pub trait OutcomeStrategy: Send + Sync {
    fn resolve(&self, ctx: &OutcomeContext<'_>) -> Outcome;
}

/// Probabilistic outcome used in production. Success odds come from the
/// delivery config and depend on whether this is a first attempt or a
/// retry. Failures split into line errors and plain failures.
pub struct RandomOutcome {
    config: DeliveryConfig,
}

impl RandomOutcome {
    pub fn new(config: DeliveryConfig) -> Self {
        Self { config }
    }
}

impl OutcomeStrategy for RandomOutcome {
    fn resolve(&self, ctx: &OutcomeContext<'_>) -> Outcome {
        let mut rng = rand::thread_rng();

        let success = self.config.success_probability(ctx.attempt).clamp(0.0, 1.0);
        if rng.gen_bool(success) {
            return Outcome::Delivered;
        }

        let line_error = self.config.line_error_ratio.clamp(0.0, 1.0);
        if rng.gen_bool(line_error) {
            let message = LINE_ERROR_MESSAGES[rng.gen_range(0..LINE_ERROR_MESSAGES.len())];
            Outcome::Error {
                message: message.to_string(),
            }
        } else {
            let message = FAILURE_MESSAGES[rng.gen_range(0..FAILURE_MESSAGES.len())];
            Outcome::Failed {
                message: message.to_string(),
            }
        }
    }
}

/// Always returns the same outcome.
pub struct FixedOutcome {
    outcome: Outcome,
}

impl FixedOutcome {
    pub fn delivered() -> Self {
        Self {
            outcome: Outcome::Delivered,
        }
    }

    pub fn failed(message: &str) -> Self {
        Self {
            outcome: Outcome::Failed {
                message: message.to_string(),
            },
        }
    }

    pub fn line_error(message: &str) -> Self {
        Self {
            outcome: Outcome::Error {
                message: message.to_string(),
            },
        }
    }
}

impl OutcomeStrategy for FixedOutcome {
    fn resolve(&self, _ctx: &OutcomeContext<'_>) -> Outcome {
        self.outcome.clone()
    }
}

/// Plays back a fixed sequence of outcomes, then keeps delivering.
pub struct ScriptedOutcome {
    script: Mutex<VecDeque<Outcome>>,
}

impl ScriptedOutcome {
    pub fn new(outcomes: Vec<Outcome>) -> Self {
        Self {
            script: Mutex::new(outcomes.into()),
        }
    }
}

impl OutcomeStrategy for ScriptedOutcome {
    fn resolve(&self, _ctx: &OutcomeContext<'_>) -> Outcome {
        let mut script = match self.script.lock() {
            Ok(g) => g,
            Err(poisoned) => {
                log::warn!("Outcome script lock was poisoned, recovering");
                poisoned.into_inner()
            }
        };
        script.pop_front().unwrap_or(Outcome::Delivered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(attempt: u32) -> OutcomeContext<'static> {
        OutcomeContext {
            fax_id: "fax-1",
            attempt,
        }
    }

    fn config_with(success: f64, line_error: f64) -> DeliveryConfig {
        DeliveryConfig {
            first_attempt_success: success,
            retry_success: success,
            line_error_ratio: line_error,
            ..Default::default()
        }
    }

    #[test]
    fn test_random_always_delivers_at_p_one() {
        let strategy = RandomOutcome::new(config_with(1.0, 0.0));
        for _ in 0..50 {
            assert_eq!(strategy.resolve(&ctx(1)), Outcome::Delivered);
        }
    }

    #[test]
    fn test_random_never_delivers_at_p_zero() {
        let strategy = RandomOutcome::new(config_with(0.0, 0.0));
        for _ in 0..50 {
            let outcome = strategy.resolve(&ctx(1));
            assert!(matches!(outcome, Outcome::Failed { .. }), "got {:?}", outcome);
        }
    }

    #[test]
    fn test_random_all_failures_are_line_errors_at_ratio_one() {
        let strategy = RandomOutcome::new(config_with(0.0, 1.0));
        for _ in 0..50 {
            let outcome = strategy.resolve(&ctx(1));
            assert!(matches!(outcome, Outcome::Error { .. }), "got {:?}", outcome);
        }
    }

    #[test]
    fn test_failure_messages_come_from_catalog() {
        let strategy = RandomOutcome::new(config_with(0.0, 0.0));
        for _ in 0..20 {
            match strategy.resolve(&ctx(1)) {
                Outcome::Failed { message } => {
                    assert!(FAILURE_MESSAGES.contains(&message.as_str()));
                }
                other => panic!("expected failure, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_fixed_outcome() {
        let strategy = FixedOutcome::failed("No answer");
        assert_eq!(
            strategy.resolve(&ctx(1)),
            Outcome::Failed {
                message: "No answer".to_string()
            }
        );
        assert_eq!(
            FixedOutcome::delivered().resolve(&ctx(2)),
            Outcome::Delivered
        );
    }

    #[test]
    fn test_scripted_outcome_plays_in_order() {
        let strategy = ScriptedOutcome::new(vec![
            Outcome::Failed {
                message: "first".to_string(),
            },
            Outcome::Error {
                message: "second".to_string(),
            },
        ]);

        assert_eq!(
            strategy.resolve(&ctx(1)),
            Outcome::Failed {
                message: "first".to_string()
            }
        );
        assert_eq!(
            strategy.resolve(&ctx(2)),
            Outcome::Error {
                message: "second".to_string()
            }
        );
        // Script exhausted: deliver from here on.
        assert_eq!(strategy.resolve(&ctx(3)), Outcome::Delivered);
        assert_eq!(strategy.resolve(&ctx(4)), Outcome::Delivered);
    }
}
