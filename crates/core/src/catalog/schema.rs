use rusqlite::Connection;

use crate::error::{Error, Result};

/// Current catalog schema version, stored in the SQLite header
/// (`PRAGMA user_version`) so the table layout itself stays untouched.
pub const SCHEMA_VERSION: i64 = 1;

pub fn initialize(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS images (
            id          TEXT PRIMARY KEY,
            collection  TEXT NOT NULL,
            name        TEXT NOT NULL,
            extension   TEXT NOT NULL,
            mime        TEXT NOT NULL,
            size        INTEGER NOT NULL,
            hash        TEXT NOT NULL UNIQUE,
            width       INTEGER NOT NULL,
            height      INTEGER NOT NULL,
            aspect      REAL NOT NULL,
            status      TEXT NOT NULL DEFAULT 'INBOX',
            created     TEXT NOT NULL,
            updated     TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_images_status ON images(status);
        CREATE INDEX IF NOT EXISTS idx_images_hash ON images(hash);
        ",
    )?;
    Ok(())
}

fn user_version(conn: &Connection) -> Result<i64> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get(0))?)
}

/// Install the schema on a fresh database and stamp its version.
pub fn create(conn: &Connection) -> Result<()> {
    initialize(conn)?;
    conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    Ok(())
}

fn has_images_table(conn: &Connection) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'images'",
        [],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Bring an existing catalog up to [`SCHEMA_VERSION`].
///
/// Catalogs written before versioning (version 0) that already carry the
/// `images` table are stamped in place. A database without that table is not
/// a collection catalog. Catalogs from a newer build are refused.
pub fn migrate(conn: &Connection) -> Result<()> {
    let version = user_version(conn)?;
    if version > SCHEMA_VERSION {
        return Err(Error::SchemaTooNew {
            db: version,
            code: SCHEMA_VERSION,
        });
    }
    if !has_images_table(conn)? {
        return Err(Error::CorruptCatalog(
            "images table is missing".to_string(),
        ));
    }
    if version < SCHEMA_VERSION {
        initialize(conn)?;
        conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    }
    Ok(())
}
