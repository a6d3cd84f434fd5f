//! Read side of the notification store.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::config::DeliveryConfig;
use crate::db::notification_repo::{self, NotificationRow};
use crate::db::{fax_repo, format_timestamp, parse_timestamp, Database, DatabaseError};
use crate::notification::fanout::{parse_kind, NotificationKind};

/// A notification as handed to callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRecord {
    pub id: String,
    /// Fax this notification refers to. The fax may have been deleted
    /// since; the record stays either way.
    pub fax_id: String,
    pub kind: NotificationKind,
    pub created_at: DateTime<Utc>,
}

impl NotificationRecord {
    fn from_row(row: NotificationRow) -> Self {
        let kind = parse_kind(&row.kind, &row.id);
        Self {
            id: row.id,
            fax_id: row.fax_id,
            kind,
            created_at: parse_timestamp(&row.created_at),
        }
    }
}

/// Query surface for notifications and unread counters.
#[derive(Clone)]
pub struct NotificationFeed {
    db: Database,
    recent_window: Duration,
}

impl NotificationFeed {
    pub fn new(db: Database, config: &DeliveryConfig) -> Self {
        Self {
            db,
            recent_window: Duration::hours(config.recent_window_hours),
        }
    }

    /// All notifications for an owner, newest first.
    pub fn list(&self, owner_id: &str) -> Result<Vec<NotificationRecord>, DatabaseError> {
        let rows = notification_repo::list_by_owner(&self.db, owner_id)?;
        Ok(rows.into_iter().map(NotificationRecord::from_row).collect())
    }

    /// Number of notifications inside the rolling recent window. The
    /// cutoff is computed per query; nothing about the window is stored.
    pub fn recent_count(&self, owner_id: &str) -> Result<u64, DatabaseError> {
        let cutoff = Utc::now() - self.recent_window;
        notification_repo::count_since(&self.db, owner_id, &format_timestamp(&cutoff))
    }

    /// Number of unread inbound faxes for an owner.
    pub fn unread_fax_count(&self, owner_id: &str) -> Result<u64, DatabaseError> {
        fax_repo::count_unread_inbound(&self.db, owner_id)
    }
}
