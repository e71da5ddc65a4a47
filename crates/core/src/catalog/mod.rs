pub mod schema;

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension, Row};

use crate::domain::*;
use crate::error::{Error, Result};

const IMAGE_COLUMNS: &str = "id, collection, name, extension, mime, size, hash, width, height, \
                             aspect, status, created, updated";

/// SQLite-backed metadata catalog for one collection (`collection.db`).
pub struct Catalog {
    conn: Connection,
}

impl Catalog {
    /// Create a brand-new catalog file. Fails if `path` already exists.
    pub fn create(path: &Path) -> Result<Self> {
        if path.exists() {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                format!("{} already exists", path.display()),
            )));
        }
        let conn = Connection::open(path)?;
        use_rollback_journal(&conn)?;
        schema::create(&conn)?;
        Ok(Self { conn })
    }

    /// Open an existing catalog. A missing file is an error, never created.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        schema::migrate(&conn)?;
        use_rollback_journal(&conn)?;
        Ok(Self { conn })
    }

    /// Open an in-memory catalog (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::create(&conn)?;
        Ok(Self { conn })
    }

    /// Close the connection, surfacing any error SQLite reports on close.
    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| Error::Database(e))
    }

    // ── Lookups ──────────────────────────────────────────────────────

    /// Id of the image whose content hash is `hash`, if any.
    pub fn find_by_hash(&self, hash: &str) -> Result<Option<String>> {
        let id = self
            .conn
            .query_row(
                "SELECT id FROM images WHERE hash = ?1",
                params![hash],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }

    pub fn get_image(&self, id: &str) -> Result<Option<ImageRecord>> {
        let record = self
            .conn
            .query_row(
                &format!("SELECT {IMAGE_COLUMNS} FROM images WHERE id = ?1"),
                params![id],
                map_image_row,
            )
            .optional()?;
        Ok(record)
    }

    pub fn list_images(&self, query: &ImageQuery) -> Result<Vec<ImageRecord>> {
        // rowid breaks ties between rows stamped within the same millisecond.
        let order = format!(
            "ORDER BY {col} {dir}, rowid {dir}",
            col = query.order_by.column(),
            dir = query.direction.keyword()
        );
        let images = match query.status {
            Some(status) => {
                let mut stmt = self.conn.prepare(&format!(
                    "SELECT {IMAGE_COLUMNS} FROM images WHERE status = ?1 {order}"
                ))?;
                let rows = stmt
                    .query_map(params![status.as_str()], map_image_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                rows
            }
            None => {
                let mut stmt = self
                    .conn
                    .prepare(&format!("SELECT {IMAGE_COLUMNS} FROM images {order}"))?;
                let rows = stmt
                    .query_map([], map_image_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                rows
            }
        };
        Ok(images)
    }

    #[cfg(test)]
    fn count_images(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM images", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Per-status counts and total stored bytes in a single query.
    pub fn summary(&self) -> Result<CollectionSummary> {
        let summary = self.conn.query_row(
            "SELECT
                COUNT(*),
                COALESCE(SUM(status = 'INBOX'), 0),
                COALESCE(SUM(status = 'COLLECTION'), 0),
                COALESCE(SUM(status = 'ARCHIVE'), 0),
                COALESCE(SUM(size), 0)
             FROM images",
            [],
            |row| {
                Ok(CollectionSummary {
                    total: row.get::<_, i64>(0)? as usize,
                    inbox: row.get::<_, i64>(1)? as usize,
                    collection: row.get::<_, i64>(2)? as usize,
                    archive: row.get::<_, i64>(3)? as usize,
                    total_bytes: row.get::<_, i64>(4)? as u64,
                })
            },
        )?;
        Ok(summary)
    }

    // ── Mutations ────────────────────────────────────────────────────

    pub fn insert_image(&mut self, record: &ImageRecord) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute(
            &format!(
                "INSERT INTO images ({IMAGE_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)"
            ),
            params![
                record.id,
                record.collection_id,
                record.original_name,
                record.format.extension(),
                record.format.mime_type(),
                record.size_bytes as i64,
                record.content_hash,
                record.width,
                record.height,
                record.aspect_ratio,
                record.status.as_str(),
                format_timestamp(&record.created_at),
                format_timestamp(&record.updated_at),
            ],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Set `status` and bump `updated` in one transaction, returning the
    /// refreshed row, or `None` if no image has that id.
    pub fn update_status(
        &mut self,
        id: &str,
        status: ImageStatus,
        now: DateTime<Utc>,
    ) -> Result<Option<ImageRecord>> {
        let tx = self.conn.transaction()?;
        let changed = tx.execute(
            "UPDATE images SET status = ?1, updated = ?2 WHERE id = ?3",
            params![status.as_str(), format_timestamp(&now), id],
        )?;
        if changed == 0 {
            return Ok(None);
        }
        let record = tx.query_row(
            &format!("SELECT {IMAGE_COLUMNS} FROM images WHERE id = ?1"),
            params![id],
            map_image_row,
        )?;
        tx.commit()?;
        Ok(Some(record))
    }

    /// Delete the row for `id`. Returns `false` if there was none.
    pub fn delete_image(&mut self, id: &str) -> Result<bool> {
        let tx = self.conn.transaction()?;
        let removed = tx.execute("DELETE FROM images WHERE id = ?1", params![id])?;
        tx.commit()?;
        Ok(removed > 0)
    }
}

/// A closed catalog is a single file: no `-wal`/`-shm` sidecars next to it.
fn use_rollback_journal(conn: &Connection) -> Result<()> {
    conn.pragma_update(None, "journal_mode", "DELETE")?;
    Ok(())
}

/// Timestamps are stored as RFC 3339 UTC with millisecond precision, which
/// sorts lexicographically in time order.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn conversion_error(
    idx: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn parse_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, e))
}

fn map_image_row(row: &Row<'_>) -> rusqlite::Result<ImageRecord> {
    let extension: String = row.get(3)?;
    let format = ImageFormat::from_extension(&extension).ok_or_else(|| {
        conversion_error(
            3,
            Error::CorruptCatalog(format!("unknown extension {extension}")),
        )
    })?;
    let status: ImageStatus = row
        .get::<_, String>(10)?
        .parse()
        .map_err(|e: Error| conversion_error(10, e))?;

    Ok(ImageRecord {
        id: row.get(0)?,
        collection_id: row.get(1)?,
        original_name: row.get(2)?,
        format,
        size_bytes: row.get::<_, i64>(5)? as u64,
        content_hash: row.get(6)?,
        width: row.get(7)?,
        height: row.get(8)?,
        aspect_ratio: row.get(9)?,
        status,
        created_at: parse_timestamp(row, 11)?,
        updated_at: parse_timestamp(row, 12)?,
    })
}

/// True when `err` is SQLite rejecting a write on a UNIQUE constraint.
pub fn is_unique_violation(err: &Error) -> bool {
    matches!(
        err,
        Error::Database(rusqlite::Error::SqliteFailure(e, _))
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}
