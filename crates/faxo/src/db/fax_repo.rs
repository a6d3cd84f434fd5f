//! Fax repository — CRUD and state operations for the `faxes` table.

use rusqlite::{params, Row};

use super::{Database, DatabaseError};

/// A raw fax row from the database.
#[derive(Debug, Clone)]
pub struct FaxRow {
    pub id: String,
    pub owner_id: String,
    pub direction: String,
    pub counterparty_number: String,
    pub counterparty_country: String,
    pub pages: u32,
    pub document_ref: Option<String>,
    pub file_name: Option<String>,
    pub status: String,
    pub error: Option<String>,
    pub attempts: u32,
    pub version: i64,
    pub read: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl FaxRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            owner_id: row.get("owner_id")?,
            direction: row.get("direction")?,
            counterparty_number: row.get("counterparty_number")?,
            counterparty_country: row.get("counterparty_country")?,
            pages: row.get("pages")?,
            document_ref: row.get("document_ref")?,
            file_name: row.get("file_name")?,
            status: row.get("status")?,
            error: row.get("error")?,
            attempts: row.get("attempts")?,
            version: row.get("version")?,
            read: row.get("read")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

/// Inserts a new fax row.
pub fn insert(db: &Database, fax: &FaxRow) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO faxes (id, owner_id, direction, counterparty_number,
             counterparty_country, pages, document_ref, file_name, status, error,
             attempts, version, read, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
            params![
                fax.id,
                fax.owner_id,
                fax.direction,
                fax.counterparty_number,
                fax.counterparty_country,
                fax.pages,
                fax.document_ref,
                fax.file_name,
                fax.status,
                fax.error,
                fax.attempts,
                fax.version,
                fax.read,
                fax.created_at,
                fax.updated_at,
            ],
        )?;
        Ok(())
    })
}

/// Finds a fax by its ID.
pub fn find_by_id(db: &Database, id: &str) -> Result<Option<FaxRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM faxes WHERE id = ?1")?;
        let mut rows = stmt.query_map(params![id], FaxRow::from_row)?;
        match rows.next() {
            Some(Ok(row)) => Ok(Some(row)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })
}

/// Lists faxes for an owner, newest first, optionally filtered by direction.
pub fn list_by_owner(
    db: &Database,
    owner_id: &str,
    direction: Option<&str>,
) -> Result<Vec<FaxRow>, DatabaseError> {
    db.with_conn(|conn| {
        let rows = match direction {
            Some(dir) => {
                let mut stmt = conn.prepare(
                    "SELECT * FROM faxes WHERE owner_id = ?1 AND direction = ?2
                     ORDER BY created_at DESC",
                )?;
                let rows: Vec<FaxRow> = stmt
                    .query_map(params![owner_id, dir], FaxRow::from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                rows
            }
            None => {
                let mut stmt = conn
                    .prepare("SELECT * FROM faxes WHERE owner_id = ?1 ORDER BY created_at DESC")?;
                let rows: Vec<FaxRow> = stmt
                    .query_map(params![owner_id], FaxRow::from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                rows
            }
        };
        Ok(rows)
    })
}

/// Writes a status change guarded by the row version. Returns `false` when
/// the version no longer matches (or the row is gone), in which case
/// nothing was written.
pub fn update_status_checked(
    db: &Database,
    id: &str,
    status: &str,
    error: Option<&str>,
    updated_at: &str,
    expected_version: i64,
) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let affected = conn.execute(
            "UPDATE faxes SET status = ?2, error = ?3, updated_at = ?4, version = version + 1
             WHERE id = ?1 AND version = ?5",
            params![id, status, error, updated_at, expected_version],
        )?;
        Ok(affected == 1)
    })
}

/// Resets a fax for another attempt, guarded by the row version. Clears
/// the error, bumps the attempt counter and moves the row back to pending.
pub fn mark_retry(
    db: &Database,
    id: &str,
    updated_at: &str,
    expected_version: i64,
) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let affected = conn.execute(
            "UPDATE faxes SET status = 'pending', error = NULL, attempts = attempts + 1,
             updated_at = ?2, version = version + 1
             WHERE id = ?1 AND version = ?3",
            params![id, updated_at, expected_version],
        )?;
        Ok(affected == 1)
    })
}

/// Marks an inbound fax as read. Returns the number of affected rows;
/// outbound faxes are never matched.
pub fn mark_read(db: &Database, id: &str, updated_at: &str) -> Result<usize, DatabaseError> {
    db.with_conn(|conn| {
        let affected = conn.execute(
            "UPDATE faxes SET read = 1, updated_at = ?2
             WHERE id = ?1 AND direction = 'inbound'",
            params![id, updated_at],
        )?;
        Ok(affected)
    })
}

/// Deletes a fax row. Returns `true` if a row was removed.
pub fn delete(db: &Database, id: &str) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let affected = conn.execute("DELETE FROM faxes WHERE id = ?1", params![id])?;
        Ok(affected == 1)
    })
}

/// Counts unread inbound faxes for an owner.
pub fn count_unread_inbound(db: &Database, owner_id: &str) -> Result<u64, DatabaseError> {
    db.with_conn(|conn| {
        let count: u64 = conn.query_row(
            "SELECT COUNT(*) FROM faxes
             WHERE owner_id = ?1 AND direction = 'inbound' AND read = 0",
            params![owner_id],
            |r| r.get(0),
        )?;
        Ok(count)
    })
}
