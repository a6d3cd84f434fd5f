//! Notification fan-out on fax state changes.
//!
//! Writes one notification row per noteworthy event. Failures here are
//! reported to the caller but must never undo the state change that
//! triggered them.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::fax_repo::FaxRow;
use crate::db::notification_repo::{self, NotificationRow};
use crate::db::{format_timestamp, Database};
use crate::error::NotificationWriteError;
use crate::lifecycle::status::FaxStatus;

/// Kind of notification shown to the owner.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// An outbound fax reached the recipient.
    Sent,
    /// An inbound fax arrived.
    Received,
    /// An outbound fax failed or errored out.
    Failed,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Sent => "sent",
            NotificationKind::Received => "received",
            NotificationKind::Failed => "failed",
        }
    }
}

/// Parses a stored notification kind, defaulting to `Sent` with a warning
/// on unknown values.
pub fn parse_kind(s: &str, notification_id: &str) -> NotificationKind {
    match s {
        "sent" => NotificationKind::Sent,
        "received" => NotificationKind::Received,
        "failed" => NotificationKind::Failed,
        other => {
            log::warn!(
                "Unknown notification kind '{}' for notification {}, defaulting to Sent",
                other,
                notification_id
            );
            NotificationKind::Sent
        }
    }
}

/// Notification kind for a terminal status, if that status is
/// notification-worthy. Only successful delivery and the two failure
/// terminals produce a row.
pub fn kind_for_terminal(status: FaxStatus) -> Option<NotificationKind> {
    match status {
        FaxStatus::Delivered => Some(NotificationKind::Sent),
        FaxStatus::Failed | FaxStatus::Error => Some(NotificationKind::Failed),
        _ => None,
    }
}

/// Writes notification rows for fax events.
#[derive(Clone)]
pub struct NotificationFanout {
    db: Database,
}

impl NotificationFanout {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Records the notification for a fax that just reached a terminal
    /// status. No-op when the status does not warrant one.
    pub fn record_terminal(
        &self,
        fax: &FaxRow,
        status: FaxStatus,
    ) -> Result<(), NotificationWriteError> {
        match kind_for_terminal(status) {
            Some(kind) => self.record(fax, kind),
            None => Ok(()),
        }
    }

    /// Records the notification for a freshly received inbound fax.
    pub fn record_received(&self, fax: &FaxRow) -> Result<(), NotificationWriteError> {
        self.record(fax, NotificationKind::Received)
    }

    fn record(&self, fax: &FaxRow, kind: NotificationKind) -> Result<(), NotificationWriteError> {
        let row = NotificationRow {
            id: Uuid::new_v4().to_string(),
            owner_id: fax.owner_id.clone(),
            fax_id: fax.id.clone(),
            kind: kind.as_str().to_string(),
            read: false,
            created_at: format_timestamp(&Utc::now()),
        };

        notification_repo::insert(&self.db, &row).map_err(|source| NotificationWriteError {
            fax_id: fax.id.clone(),
            kind: kind.as_str().to_string(),
            source,
        })?;

        log::info!("Recorded '{}' notification for fax {}", kind.as_str(), fax.id);
        Ok(())
    }
}
