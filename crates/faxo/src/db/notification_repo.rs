//! Notification repository — rows backing the notification feed.

use rusqlite::{params, Row};

use super::{Database, DatabaseError};

/// A raw notification row from the database.
#[derive(Debug, Clone)]
pub struct NotificationRow {
    pub id: String,
    pub owner_id: String,
    pub fax_id: String,
    pub kind: String,
    pub read: bool,
    pub created_at: String,
}

impl NotificationRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            owner_id: row.get("owner_id")?,
            fax_id: row.get("fax_id")?,
            kind: row.get("kind")?,
            read: row.get("read")?,
            created_at: row.get("created_at")?,
        })
    }
}

/// Inserts a new notification row.
pub fn insert(db: &Database, notification: &NotificationRow) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO notifications (id, owner_id, fax_id, kind, read, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                notification.id,
                notification.owner_id,
                notification.fax_id,
                notification.kind,
                notification.read,
                notification.created_at,
            ],
        )?;
        Ok(())
    })
}

/// Lists notifications for an owner, newest first.
pub fn list_by_owner(db: &Database, owner_id: &str) -> Result<Vec<NotificationRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT * FROM notifications WHERE owner_id = ?1 ORDER BY created_at DESC",
        )?;
        let rows: Vec<NotificationRow> = stmt
            .query_map(params![owner_id], NotificationRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Counts an owner's notifications created at or after the cutoff.
/// Timestamps are stored as RFC3339 UTC text, so string comparison
/// matches chronological order.
pub fn count_since(db: &Database, owner_id: &str, cutoff: &str) -> Result<u64, DatabaseError> {
    db.with_conn(|conn| {
        let count: u64 = conn.query_row(
            "SELECT COUNT(*) FROM notifications WHERE owner_id = ?1 AND created_at >= ?2",
            params![owner_id, cutoff],
            |r| r.get(0),
        )?;
        Ok(count)
    })
}
