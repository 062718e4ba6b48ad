use crate::types::PlateRecord;
use failure::Fail;
use rusqlite::{params, Connection, OpenFlags};
use std::path::Path;

#[derive(Debug, Fail)]
pub enum LookupError {
    #[fail(display = "Unable to open plate database: {}", _0)]
    Connection(#[cause] rusqlite::Error),
    #[fail(display = "Plate query failed: {}", _0)]
    Query(#[cause] rusqlite::Error),
}

/// Opens the plate database read-only; the handler never writes.
pub fn open(path: &Path) -> Result<Connection, LookupError> {
    Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .map_err(LookupError::Connection)
}

/// Returns every record whose plate number contains `plate` as a literal
/// substring, in the order the database yields them.
///
/// `table` must already be a validated identifier.
pub fn find_plates(
    conn: &Connection,
    table: &str,
    plate: &str,
) -> Result<Vec<PlateRecord>, LookupError> {
    find_plates_impl(conn, table, plate).map_err(LookupError::Query)
}

fn find_plates_impl(
    conn: &Connection,
    table: &str,
    plate: &str,
) -> rusqlite::Result<Vec<PlateRecord>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT plate_number, owner_name, province FROM {} WHERE plate_number LIKE ?1 ESCAPE '\\'",
        table
    ))?;
    let pattern = format!("%{}%", escape_like(plate));
    let rows = stmt.query_map(params![pattern], |row| {
        Ok(PlateRecord {
            plate_number: row.get(0)?,
            owner_name: row.get(1)?,
            province: row.get(2)?,
        })
    })?;
    rows.collect()
}

fn escape_like(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
