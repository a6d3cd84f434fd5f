//! Fax number repository — the `fax_numbers` table.
//!
//! An owner has at most one active number. Assigning a new one
//! deactivates any previous numbers in the same transaction scope.

use rusqlite::{params, Row};

use super::{Database, DatabaseError};

/// A raw fax number row from the database.
#[derive(Debug, Clone)]
pub struct FaxNumberRow {
    pub id: String,
    pub owner_id: String,
    pub number: String,
    pub country_code: String,
    pub active: bool,
    pub assigned_at: String,
}

impl FaxNumberRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            owner_id: row.get("owner_id")?,
            number: row.get("number")?,
            country_code: row.get("country_code")?,
            active: row.get("active")?,
            assigned_at: row.get("assigned_at")?,
        })
    }
}

/// Finds the owner's active number, if any.
pub fn find_active(db: &Database, owner_id: &str) -> Result<Option<FaxNumberRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT * FROM fax_numbers WHERE owner_id = ?1 AND active = 1
             ORDER BY assigned_at DESC LIMIT 1",
        )?;
        let mut rows = stmt.query_map(params![owner_id], FaxNumberRow::from_row)?;
        match rows.next() {
            Some(Ok(row)) => Ok(Some(row)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })
}

/// Deactivates the owner's previous numbers and inserts the new one as
/// active, under a single connection lock.
pub fn assign(db: &Database, number: &FaxNumberRow) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE fax_numbers SET active = 0 WHERE owner_id = ?1 AND active = 1",
            params![number.owner_id],
        )?;
        conn.execute(
            "INSERT INTO fax_numbers (id, owner_id, number, country_code, active, assigned_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                number.id,
                number.owner_id,
                number.number,
                number.country_code,
                number.active,
                number.assigned_at,
            ],
        )?;
        Ok(())
    })
}
