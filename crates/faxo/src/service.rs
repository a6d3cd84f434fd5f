//! High-level fax service.
//!
//! Ties the transmission engine, document storage, analysis, identity
//! and the notification feed together behind one facade. DTOs returned
//! from here carry parsed enums and timestamps instead of the raw
//! database strings.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::analysis::analyzer::{analyze_best_effort, DocumentAnalyzer};
use crate::broadcast::fax_events::FaxEvent;
use crate::config::DeliveryConfig;
use crate::countries;
use crate::db::fax_repo::{self, FaxRow};
use crate::db::number_repo::{self, FaxNumberRow};
use crate::db::{format_timestamp, parse_timestamp, Database};
use crate::error::{ConfigError, FaxoError, TransmissionError};
use crate::identity::{CachedIdentityProvider, IdentityProvider, UserAccount};
use crate::lifecycle::engine::{
    parse_direction, Direction, InboundFax, SubmitFax, TransmissionEngine,
};
use crate::lifecycle::outcome::{OutcomeStrategy, RandomOutcome};
use crate::lifecycle::status::{parse_status, FaxStatus};
use crate::notification::feed::{NotificationFeed, NotificationRecord};
use crate::storage::filesystem::DocumentStore;

/// A fax as presented to callers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FaxRecord {
    pub id: String,
    pub owner_id: String,
    pub direction: Direction,
    pub counterparty_number: String,
    pub counterparty_country: String,
    /// Number prefixed with the country dial code, for display.
    pub counterparty_display: String,
    pub pages: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    pub status: FaxStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub attempts: u32,
    pub version: i64,
    pub read: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FaxRecord {
    fn from_row(row: FaxRow) -> Self {
        let status = parse_status(&row.status, &row.id);
        let direction = parse_direction(&row.direction, &row.id);
        let created_at = parse_timestamp(&row.created_at);
        let updated_at = parse_timestamp(&row.updated_at);
        let counterparty_display =
            countries::format_number(&row.counterparty_country, &row.counterparty_number);

        Self {
            id: row.id,
            owner_id: row.owner_id,
            direction,
            counterparty_number: row.counterparty_number,
            counterparty_country: row.counterparty_country,
            counterparty_display,
            pages: row.pages,
            document_ref: row.document_ref,
            file_name: row.file_name,
            status,
            error: row.error,
            attempts: row.attempts,
            version: row.version,
            read: row.read,
            created_at,
            updated_at,
        }
    }
}

/// An owner's current fax number.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NumberAssignment {
    pub number: String,
    pub country_code: String,
    pub assigned_at: DateTime<Utc>,
}

impl NumberAssignment {
    fn from_row(row: FaxNumberRow) -> Self {
        let assigned_at = parse_timestamp(&row.assigned_at);
        Self {
            number: row.number,
            country_code: row.country_code,
            assigned_at,
        }
    }
}

/// Snapshot of everything a dashboard needs for one owner.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerOverview {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<UserAccount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fax_number: Option<NumberAssignment>,
    pub unread_faxes: u64,
    pub recent_notifications: u64,
}

#[derive(Clone)]
pub struct FaxService {
    db: Database,
    engine: TransmissionEngine,
    feed: NotificationFeed,
    documents: Arc<dyn DocumentStore>,
    analyzer: Arc<dyn DocumentAnalyzer>,
    identity: Arc<CachedIdentityProvider>,
}

impl FaxService {
    /// Creates a service resolving outcomes with the probabilistic
    /// production strategy.
    pub fn new(
        db: Database,
        config: DeliveryConfig,
        documents: Arc<dyn DocumentStore>,
        analyzer: Arc<dyn DocumentAnalyzer>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Result<Self, ConfigError> {
        let outcome: Arc<dyn OutcomeStrategy> = Arc::new(RandomOutcome::new(config.clone()));
        Self::with_strategy(db, config, outcome, documents, analyzer, identity)
    }

    /// Creates a service with a caller-provided outcome strategy.
    pub fn with_strategy(
        db: Database,
        config: DeliveryConfig,
        outcome: Arc<dyn OutcomeStrategy>,
        documents: Arc<dyn DocumentStore>,
        analyzer: Arc<dyn DocumentAnalyzer>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Result<Self, ConfigError> {
        let identity = Arc::new(CachedIdentityProvider::new(
            identity,
            Duration::from_secs(config.identity_ttl_secs),
        ));
        let feed = NotificationFeed::new(db.clone(), &config);
        let engine = TransmissionEngine::with_strategy(db.clone(), config, outcome)?;

        Ok(Self {
            db,
            engine,
            feed,
            documents,
            analyzer,
            identity,
        })
    }

    pub fn engine(&self) -> &TransmissionEngine {
        &self.engine
    }

    /// Subscribes to the fax event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<FaxEvent> {
        self.engine.events().subscribe()
    }

    // ─── Transmissions ───────────────────────────────────────────────

    /// Submits an outbound fax for a document that is already stored.
    pub fn submit_fax(&self, submit: SubmitFax) -> Result<FaxRecord, TransmissionError> {
        let fax = self.engine.submit(submit)?;
        Ok(FaxRecord::from_row(fax))
    }

    /// Stores a document and submits it as an outbound fax in one go.
    /// Document analysis runs in the background and surfaces on the
    /// event stream when it completes.
    pub async fn send_document(
        &self,
        owner_id: &str,
        counterparty_number: &str,
        counterparty_country: &str,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<FaxRecord, FaxoError> {
        let doc = self.documents.store(owner_id, file_name, bytes).await?;

        let submit = SubmitFax {
            owner_id: owner_id.to_string(),
            counterparty_number: counterparty_number.to_string(),
            counterparty_country: counterparty_country.to_string(),
            document_ref: Some(doc.path.clone()),
            file_name: Some(file_name.to_string()),
            pages: None,
        };
        let fax = match self.engine.submit(submit) {
            Ok(fax) => fax,
            Err(e) => {
                // The submission never happened, so the stored file has
                // no owner row pointing at it.
                if let Err(remove_err) = tokio::fs::remove_file(&doc.path).await {
                    log::warn!(
                        "Failed to remove document {} after rejected submission: {}",
                        doc.path,
                        remove_err
                    );
                }
                return Err(e.into());
            }
        };

        self.spawn_analysis(&fax, file_name, bytes.to_vec());
        Ok(FaxRecord::from_row(fax))
    }

    /// Retries a failed or errored fax.
    pub fn retry_fax(&self, fax_id: &str) -> Result<FaxRecord, TransmissionError> {
        let fax = self.engine.retry(fax_id)?;
        Ok(FaxRecord::from_row(fax))
    }

    /// Deletes a fax. Returns `false` when it did not exist.
    pub fn delete_fax(&self, fax_id: &str) -> Result<bool, TransmissionError> {
        self.engine.delete(fax_id)
    }

    /// Marks an inbound fax as read.
    pub fn mark_fax_read(&self, fax_id: &str) -> Result<(), TransmissionError> {
        self.engine.mark_read(fax_id)
    }

    /// Lists an owner's faxes, newest first, optionally filtered by
    /// direction.
    pub fn list_faxes(
        &self,
        owner_id: &str,
        direction: Option<Direction>,
    ) -> Result<Vec<FaxRecord>, TransmissionError> {
        let rows = fax_repo::list_by_owner(&self.db, owner_id, direction.map(|d| d.as_str()))?;
        Ok(rows.into_iter().map(FaxRecord::from_row).collect())
    }

    /// Fetches a single fax.
    pub fn fax(&self, fax_id: &str) -> Result<Option<FaxRecord>, TransmissionError> {
        Ok(fax_repo::find_by_id(&self.db, fax_id)?.map(FaxRecord::from_row))
    }

    /// Resolves the stored document of a fax to a URL. `None` when the
    /// fax does not exist or carries no document.
    pub async fn document_url(&self, fax_id: &str) -> Result<Option<String>, FaxoError> {
        let Some(fax) = fax_repo::find_by_id(&self.db, fax_id)? else {
            return Ok(None);
        };
        let Some(document_ref) = fax.document_ref else {
            return Ok(None);
        };
        let url = self.documents.resolve(&document_ref).await?;
        Ok(Some(url))
    }

    // ─── Notifications ───────────────────────────────────────────────

    /// Lists an owner's notifications, newest first.
    pub fn list_notifications(
        &self,
        owner_id: &str,
    ) -> Result<Vec<NotificationRecord>, TransmissionError> {
        Ok(self.feed.list(owner_id)?)
    }

    /// Notifications recorded within the rolling recent window.
    pub fn recent_notification_count(&self, owner_id: &str) -> Result<u64, TransmissionError> {
        Ok(self.feed.recent_count(owner_id)?)
    }

    /// Unread inbound faxes for an owner.
    pub fn unread_fax_count(&self, owner_id: &str) -> Result<u64, TransmissionError> {
        Ok(self.feed.unread_fax_count(owner_id)?)
    }

    // ─── Numbers and identity ────────────────────────────────────────

    /// The owner's currently active fax number, if any.
    pub fn fax_number(
        &self,
        owner_id: &str,
    ) -> Result<Option<NumberAssignment>, TransmissionError> {
        Ok(number_repo::find_active(&self.db, owner_id)?.map(NumberAssignment::from_row))
    }

    /// Assigns a fresh fax number in the given country to the owner,
    /// replacing any previously active number.
    pub fn assign_fax_number(
        &self,
        owner_id: &str,
        country_code: &str,
    ) -> Result<NumberAssignment, TransmissionError> {
        let Some(country) = countries::find(country_code) else {
            return Err(TransmissionError::Validation {
                reason: format!("Unknown country code '{}'", country_code),
            });
        };

        let local = {
            let mut rng = rand::thread_rng();
            if country.dial_code == "+1" {
                // NANP: area code, exchange, line number.
                format!(
                    "{}{:03}{:04}",
                    rng.gen_range(200..=999),
                    rng.gen_range(0..=999),
                    rng.gen_range(0..=9999)
                )
            } else {
                format!("{}", rng.gen_range(10_000_000..=99_999_999))
            }
        };
        let number = countries::format_number(country.code, &local);

        let row = FaxNumberRow {
            id: Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
            number,
            country_code: country.code.to_string(),
            active: true,
            assigned_at: format_timestamp(&Utc::now()),
        };
        number_repo::assign(&self.db, &row)?;

        log::info!("Assigned fax number {} to owner {}", row.number, owner_id);
        Ok(NumberAssignment::from_row(row))
    }

    /// Fabricates an inbound fax addressed to the owner's active
    /// number. Fails when the owner has no number assigned.
    pub fn receive_demo_fax(&self, owner_id: &str) -> Result<FaxRecord, TransmissionError> {
        let Some(active) = number_repo::find_active(&self.db, owner_id)? else {
            return Err(TransmissionError::NoActiveNumber {
                owner: owner_id.to_string(),
            });
        };

        let (counterparty_number, pages) = {
            let mut rng = rand::thread_rng();
            let dial = countries::find(&active.country_code)
                .map(|c| c.dial_code)
                .unwrap_or("+1");
            let number = format!("{} 555{:04}", dial, rng.gen_range(0..=9999));
            (number, rng.gen_range(1..=4))
        };

        let fax = self.engine.create_inbound(InboundFax {
            owner_id: owner_id.to_string(),
            counterparty_number,
            counterparty_country: active.country_code,
            pages,
        })?;
        Ok(FaxRecord::from_row(fax))
    }

    /// Aggregates the owner's account, fax number and counters.
    pub async fn overview(&self, owner_id: &str) -> Result<OwnerOverview, TransmissionError> {
        let account = self.identity.account(owner_id).await;
        let fax_number = self.fax_number(owner_id)?;
        let unread_faxes = self.feed.unread_fax_count(owner_id)?;
        let recent_notifications = self.feed.recent_count(owner_id)?;

        Ok(OwnerOverview {
            account,
            fax_number,
            unread_faxes,
            recent_notifications,
        })
    }

    fn spawn_analysis(&self, fax: &FaxRow, file_name: &str, bytes: Vec<u8>) {
        let analyzer = self.analyzer.clone();
        let events = self.engine.events().clone();
        let fax_id = fax.id.clone();
        let owner_id = fax.owner_id.clone();
        let file_name = file_name.to_string();

        tokio::spawn(async move {
            if let Some(insights) =
                analyze_best_effort(analyzer.as_ref(), &file_name, &bytes).await
            {
                events.send(FaxEvent::analysis_ready(&fax_id, &owner_id, insights));
            }
        });
    }
}
