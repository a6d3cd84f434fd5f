//! Transmission engine.
//!
//! Owns the fax state machine: submissions, transitions, retries,
//! deletion and the delayed resolution that settles every outbound fax
//! on a terminal status. All writes go through a version check so a
//! stale caller can never clobber a newer state.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rand::Rng;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::broadcast::fax_events::{FaxEvent, FaxEventBroadcaster};
use crate::config::DeliveryConfig;
use crate::db::fax_repo::{self, FaxRow};
use crate::db::{format_timestamp, Database};
use crate::error::{ConfigError, TransmissionError};
use crate::lifecycle::outcome::{Outcome, OutcomeContext, OutcomeStrategy, RandomOutcome};
use crate::lifecycle::scheduler::ResolutionScheduler;
use crate::lifecycle::status::{parse_status, FaxStatus};
use crate::notification::fanout::NotificationFanout;

/// Direction of a fax relative to the owner.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Outbound,
    Inbound,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Outbound => "outbound",
            Direction::Inbound => "inbound",
        }
    }
}

/// Parses a stored direction string, defaulting to `Outbound` with a
/// warning on unknown values.
pub fn parse_direction(s: &str, fax_id: &str) -> Direction {
    match s {
        "outbound" => Direction::Outbound,
        "inbound" => Direction::Inbound,
        other => {
            log::warn!(
                "Unknown direction '{}' for fax {}, defaulting to Outbound",
                other,
                fax_id
            );
            Direction::Outbound
        }
    }
}

/// Request to submit an outbound fax.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitFax {
    pub owner_id: String,
    pub counterparty_number: String,
    #[serde(default = "default_country")]
    pub counterparty_country: String,
    /// Reference to the stored document. Required.
    pub document_ref: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
    /// Page count. Picked at random when omitted.
    #[serde(default)]
    pub pages: Option<u32>,
}

fn default_country() -> String {
    "US".to_string()
}

/// An inbound fax to record.
#[derive(Debug, Clone)]
pub struct InboundFax {
    pub owner_id: String,
    pub counterparty_number: String,
    pub counterparty_country: String,
    pub pages: u32,
}

/// Drives fax transmissions from submission to terminal status.
#[derive(Clone)]
pub struct TransmissionEngine {
    db: Database,
    config: DeliveryConfig,
    outcome: Arc<dyn OutcomeStrategy>,
    scheduler: ResolutionScheduler,
    fanout: NotificationFanout,
    events: FaxEventBroadcaster,
    number_pattern: Regex,
}

impl TransmissionEngine {
    /// Creates an engine with the probabilistic production strategy.
    pub fn from_config(db: Database, config: DeliveryConfig) -> Result<Self, ConfigError> {
        let outcome = Arc::new(RandomOutcome::new(config.clone()));
        Self::with_strategy(db, config, outcome)
    }

    /// Creates an engine with a caller-provided outcome strategy.
    pub fn with_strategy(
        db: Database,
        config: DeliveryConfig,
        outcome: Arc<dyn OutcomeStrategy>,
    ) -> Result<Self, ConfigError> {
        let number_pattern =
            Regex::new(&config.number_pattern).map_err(|e| ConfigError::Validation {
                message: format!("numberPattern is not a valid regex: {}", e),
            })?;
        let events = FaxEventBroadcaster::new(config.event_capacity);

        Ok(Self {
            fanout: NotificationFanout::new(db.clone()),
            scheduler: ResolutionScheduler::new(),
            db,
            config,
            outcome,
            events,
            number_pattern,
        })
    }

    pub fn events(&self) -> &FaxEventBroadcaster {
        &self.events
    }

    pub fn scheduler(&self) -> &ResolutionScheduler {
        &self.scheduler
    }

    pub fn config(&self) -> &DeliveryConfig {
        &self.config
    }

    /// Submits an outbound fax. The fax starts out pending and a
    /// resolution timer is armed for it.
    pub fn submit(&self, submit: SubmitFax) -> Result<FaxRow, TransmissionError> {
        let number = submit.counterparty_number.trim();
        if number.is_empty() {
            return Err(TransmissionError::Validation {
                reason: "Counterparty number is required".to_string(),
            });
        }
        if !self.number_pattern.is_match(number) {
            return Err(TransmissionError::Validation {
                reason: format!("'{}' is not a valid fax number", number),
            });
        }

        let document_ref = match submit.document_ref {
            Some(doc) if !doc.trim().is_empty() => doc,
            _ => {
                return Err(TransmissionError::Validation {
                    reason: "A document is required for outbound faxes".to_string(),
                })
            }
        };

        if submit.pages == Some(0) {
            return Err(TransmissionError::Validation {
                reason: "Page count must be at least 1".to_string(),
            });
        }
        let pages = submit
            .pages
            .unwrap_or_else(|| rand::thread_rng().gen_range(1..=5));

        let country = submit.counterparty_country.trim();
        let country = if country.is_empty() {
            default_country()
        } else {
            country.to_uppercase()
        };

        let now = format_timestamp(&Utc::now());
        let fax = FaxRow {
            id: Uuid::new_v4().to_string(),
            owner_id: submit.owner_id,
            direction: Direction::Outbound.as_str().to_string(),
            counterparty_number: number.to_string(),
            counterparty_country: country,
            pages,
            document_ref: Some(document_ref),
            file_name: submit.file_name,
            status: FaxStatus::Pending.as_str().to_string(),
            error: None,
            attempts: 1,
            version: 0,
            read: false,
            created_at: now.clone(),
            updated_at: now,
        };
        fax_repo::insert(&self.db, &fax)?;

        log::info!(
            "Fax {} submitted to {} ({} pages)",
            fax.id,
            fax.counterparty_number,
            fax.pages
        );
        self.events
            .send(FaxEvent::submitted(&fax.id, &fax.owner_id, FaxStatus::Pending));

        self.arm_resolution(&fax.id, self.config.delay_for_attempt(fax.attempts));
        Ok(fax)
    }

    /// Advances a fax one step along the transition graph.
    pub fn advance(&self, fax_id: &str, target: FaxStatus) -> Result<FaxRow, TransmissionError> {
        let fax = self.require(fax_id)?;
        self.apply_transition(fax, target, None)
    }

    /// Applies a single transition on top of the given row snapshot.
    ///
    /// The write is guarded by the snapshot's version: if the row moved
    /// underneath the caller the transition is rejected with `Conflict`
    /// and nothing is written.
    fn apply_transition(
        &self,
        mut fax: FaxRow,
        target: FaxStatus,
        error: Option<&str>,
    ) -> Result<FaxRow, TransmissionError> {
        let current = parse_status(&fax.status, &fax.id);
        if !current.can_advance_to(target) {
            return Err(TransmissionError::InvalidTransition {
                id: fax.id,
                from: current,
                to: target,
            });
        }

        let now = format_timestamp(&Utc::now());
        let applied = fax_repo::update_status_checked(
            &self.db,
            &fax.id,
            target.as_str(),
            error,
            &now,
            fax.version,
        )?;
        if !applied {
            return match fax_repo::find_by_id(&self.db, &fax.id)? {
                Some(_) => Err(TransmissionError::Conflict { id: fax.id }),
                None => Err(TransmissionError::NotFound { id: fax.id }),
            };
        }

        log::info!("Fax {} advanced {} -> {}", fax.id, current, target);

        fax.status = target.as_str().to_string();
        fax.error = error.map(|e| e.to_string());
        fax.updated_at = now;
        fax.version += 1;

        self.events.send(FaxEvent::status_changed(
            &fax.id,
            &fax.owner_id,
            current,
            target,
            error,
        ));

        if target.is_terminal() {
            if let Err(e) = self.fanout.record_terminal(&fax, target) {
                log::error!("{}", e);
            }
        }

        Ok(fax)
    }

    /// Retries a failed or errored fax: back to pending with a fresh
    /// resolution timer and a bumped attempt counter.
    pub fn retry(&self, fax_id: &str) -> Result<FaxRow, TransmissionError> {
        let mut fax = self.require(fax_id)?;
        let current = parse_status(&fax.status, &fax.id);
        if !current.is_retryable() {
            return Err(TransmissionError::NotRetryable {
                id: fax.id,
                status: current,
            });
        }

        let now = format_timestamp(&Utc::now());
        let applied = fax_repo::mark_retry(&self.db, &fax.id, &now, fax.version)?;
        if !applied {
            return match fax_repo::find_by_id(&self.db, &fax.id)? {
                Some(_) => Err(TransmissionError::Conflict { id: fax.id }),
                None => Err(TransmissionError::NotFound { id: fax.id }),
            };
        }

        fax.status = FaxStatus::Pending.as_str().to_string();
        fax.error = None;
        fax.attempts += 1;
        fax.updated_at = now;
        fax.version += 1;

        log::info!("Fax {} queued for retry (attempt {})", fax.id, fax.attempts);
        self.events.send(FaxEvent::status_changed(
            &fax.id,
            &fax.owner_id,
            current,
            FaxStatus::Pending,
            None,
        ));

        self.arm_resolution(&fax.id, self.config.delay_for_attempt(fax.attempts));
        Ok(fax)
    }

    /// Deletes a fax and cancels any pending resolution timer. Returns
    /// `false` when the fax did not exist. Notifications referring to
    /// the fax are left in place.
    pub fn delete(&self, fax_id: &str) -> Result<bool, TransmissionError> {
        self.scheduler.cancel(fax_id);

        let Some(fax) = fax_repo::find_by_id(&self.db, fax_id)? else {
            return Ok(false);
        };
        let deleted = fax_repo::delete(&self.db, fax_id)?;
        if deleted {
            log::info!("Fax {} deleted", fax_id);
            self.events.send(FaxEvent::deleted(&fax.id, &fax.owner_id));
        }
        Ok(deleted)
    }

    /// Records an inbound fax. Inbound faxes arrive already delivered,
    /// unread and without a resolution timer.
    pub fn create_inbound(&self, inbound: InboundFax) -> Result<FaxRow, TransmissionError> {
        if inbound.counterparty_number.trim().is_empty() {
            return Err(TransmissionError::Validation {
                reason: "Counterparty number is required".to_string(),
            });
        }

        let now = format_timestamp(&Utc::now());
        let fax = FaxRow {
            id: Uuid::new_v4().to_string(),
            owner_id: inbound.owner_id,
            direction: Direction::Inbound.as_str().to_string(),
            counterparty_number: inbound.counterparty_number.trim().to_string(),
            counterparty_country: inbound.counterparty_country,
            pages: inbound.pages,
            document_ref: None,
            file_name: None,
            status: FaxStatus::Delivered.as_str().to_string(),
            error: None,
            attempts: 1,
            version: 0,
            read: false,
            created_at: now.clone(),
            updated_at: now,
        };
        fax_repo::insert(&self.db, &fax)?;

        log::info!(
            "Inbound fax {} received from {}",
            fax.id,
            fax.counterparty_number
        );
        self.events.send(FaxEvent::received(&fax.id, &fax.owner_id));
        if let Err(e) = self.fanout.record_received(&fax) {
            log::error!("{}", e);
        }

        Ok(fax)
    }

    /// Marks an inbound fax as read. Repeated calls succeed; a missing
    /// fax is an error.
    pub fn mark_read(&self, fax_id: &str) -> Result<(), TransmissionError> {
        let now = format_timestamp(&Utc::now());
        let affected = fax_repo::mark_read(&self.db, fax_id, &now)?;
        if affected == 0 && fax_repo::find_by_id(&self.db, fax_id)?.is_none() {
            return Err(TransmissionError::NotFound {
                id: fax_id.to_string(),
            });
        }
        Ok(())
    }

    /// Resolves a fax now: walks it through the dispatch path and
    /// settles it on the outcome chosen by the strategy. Skips quietly
    /// when the fax is gone or already terminal.
    pub fn resolve_now(&self, fax_id: &str) -> Result<(), TransmissionError> {
        let _span = tracing::info_span!("resolve", fax_id = %fax_id).entered();

        let Some(fax) = fax_repo::find_by_id(&self.db, fax_id)? else {
            log::debug!("Fax {} no longer exists, skipping resolution", fax_id);
            return Ok(());
        };
        let mut current = parse_status(&fax.status, &fax.id);
        if current.is_terminal() {
            log::debug!("Fax {} already terminal, skipping resolution", fax_id);
            return Ok(());
        }

        let verdict = self.outcome.resolve(&OutcomeContext {
            fax_id: &fax.id,
            attempt: fax.attempts,
        });

        let mut fax = fax;
        while let Some(next) = current.next_dispatch_step() {
            fax = self.apply_transition(fax, next, None)?;
            current = next;
        }

        match verdict {
            Outcome::Delivered => {
                if current != FaxStatus::Sent {
                    fax = self.apply_transition(fax, FaxStatus::Sent, None)?;
                }
                self.apply_transition(fax, FaxStatus::Delivered, None)?;
            }
            Outcome::Failed { message } => {
                self.apply_transition(fax, FaxStatus::Failed, Some(&message))?;
            }
            Outcome::Error { message } => {
                self.apply_transition(fax, FaxStatus::Error, Some(&message))?;
            }
        }

        Ok(())
    }

    fn require(&self, fax_id: &str) -> Result<FaxRow, TransmissionError> {
        fax_repo::find_by_id(&self.db, fax_id)?.ok_or_else(|| TransmissionError::NotFound {
            id: fax_id.to_string(),
        })
    }

    fn arm_resolution(&self, fax_id: &str, delay: Duration) {
        let engine = self.clone();
        let id = fax_id.to_string();
        self.scheduler.arm(fax_id, delay, async move {
            if let Err(e) = engine.resolve_now(&id) {
                log::error!("Resolution of fax {} failed: {}", id, e);
            }
        });
    }
}
