//! # Store
//!
//! The durable, transactional substrate underneath everything else in the
//! engine: three SQLite tables (`snapshots`, `contents`, `files`) plus a
//! `schema_version` row, opened with foreign keys enforced so the
//! `files.hash → contents.hash` and `files.snapshot_id → snapshots.id`
//! references are checked by the database itself rather than by hand.
//!
//! Every write goes through [`Store::transaction`], which commits on `Ok`
//! and rolls back on `Err` — callers never manage a transaction handle
//! directly, mirroring the scoped-acquisition discipline the rest of the
//! engine uses for file handles.

use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension, Transaction};

use crate::error::{Error, Result};

/// Schema version this binary knows how to read and write.
const SCHEMA_VERSION: i64 = 1;

/// A single file reference row: a path and the hash it resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRow {
    pub path: String,
    pub hash: String,
}

/// A snapshot row as stored (without its files).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotRow {
    pub id: i64,
    pub taken_at: String,
}

/// The content-addressed backup store.
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Opens (or creates) a database at `path`, installing the schema on
    /// first creation. Idempotent: opening an already-initialized database
    /// is a no-op beyond the version check.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref())?;
        conn.pragma_update(None, "foreign_keys", true)?;
        Self::install_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Opens an in-memory database. Used by tests so store and operation
    /// behavior can be exercised without touching disk.
    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", true)?;
        Self::install_schema(&conn)?;
        Ok(Self { conn })
    }

    fn install_schema(conn: &Connection) -> Result<()> {
        let tx = conn.unchecked_transaction()?;

        tx.execute_batch(
            "CREATE TABLE IF NOT EXISTS schema_version (
                 version INTEGER NOT NULL
             );
             CREATE TABLE IF NOT EXISTS snapshots (
                 id INTEGER PRIMARY KEY AUTOINCREMENT,
                 taken_at TEXT NOT NULL
             );
             CREATE TABLE IF NOT EXISTS contents (
                 hash TEXT PRIMARY KEY,
                 blob BLOB NOT NULL
             );
             CREATE TABLE IF NOT EXISTS files (
                 snapshot_id INTEGER NOT NULL REFERENCES snapshots(id),
                 path TEXT NOT NULL,
                 hash TEXT NOT NULL REFERENCES contents(hash),
                 PRIMARY KEY (snapshot_id, path)
             );
             CREATE INDEX IF NOT EXISTS files_by_hash ON files(hash);",
        )?;

        let existing: Option<i64> = tx
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |r| r.get(0))
            .optional()?;

        match existing {
            None => {
                tx.execute(
                    "INSERT INTO schema_version (version) VALUES (?1)",
                    params![SCHEMA_VERSION],
                )?;
            }
            Some(v) if v == SCHEMA_VERSION => {}
            Some(v) => {
                return Err(Error::Schema(format!(
                    "database schema version {v} is newer than this binary understands ({SCHEMA_VERSION})"
                )));
            }
        }

        tx.commit()?;
        Ok(())
    }

    /// Runs `f` inside a write transaction. Commits if `f` returns `Ok`,
    /// rolls back if it returns `Err` or panics while unwinding.
    pub fn transaction<T>(&mut self, f: impl FnOnce(&Transaction) -> Result<T>) -> Result<T> {
        let tx = self.conn.transaction()?;
        let result = f(&tx)?;
        tx.commit()?;
        Ok(result)
    }

    /// Runs SQLite's own structural integrity check (page-level / index-level),
    /// distinct from the semantic digest verification in [`crate::check`].
    pub fn integrity_check(&self) -> Result<()> {
        let report: String = self
            .conn
            .query_row("PRAGMA integrity_check", [], |r| r.get(0))?;
        if report == "ok" {
            Ok(())
        } else {
            Err(Error::Constraint(format!("integrity_check reported: {report}")))
        }
    }

    /// Read-only access to the underlying connection, for operations (like
    /// `list`) that only ever need to read.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

// ─── Row-level operations ───────────────────────────────────────────────────
//
// These take a `&Connection` so they work uniformly against either the live
// connection (read-only paths) or an open `Transaction` (write paths), since
// `Transaction` derefs to `Connection`.

/// Inserts a new snapshot row with the given timestamp, returning its id.
pub fn insert_snapshot(conn: &Connection, taken_at: &str) -> Result<i64> {
    conn.execute(
        "INSERT INTO snapshots (taken_at) VALUES (?1)",
        params![taken_at],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Inserts a content row if no row with this hash exists yet. Returns
/// whether a new row was created.
pub fn insert_content_if_absent(conn: &Connection, hash: &str, blob: &[u8]) -> Result<bool> {
    let changed = conn.execute(
        "INSERT OR IGNORE INTO contents (hash, blob) VALUES (?1, ?2)",
        params![hash, blob],
    )?;
    Ok(changed == 1)
}

/// Inserts a file reference. Fails with a foreign-key constraint error if
/// `hash` has no corresponding content row or `snapshot_id` doesn't exist.
pub fn insert_file(conn: &Connection, snapshot_id: i64, path: &str, hash: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO files (snapshot_id, path, hash) VALUES (?1, ?2, ?3)",
        params![snapshot_id, path, hash],
    )?;
    Ok(())
}

/// Enumerates all snapshots in ascending id order.
pub fn list_snapshots(conn: &Connection) -> Result<Vec<SnapshotRow>> {
    let mut stmt = conn.prepare("SELECT id, taken_at FROM snapshots ORDER BY id ASC")?;
    let rows = stmt
        .query_map([], |r| {
            Ok(SnapshotRow {
                id: r.get(0)?,
                taken_at: r.get(1)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Returns `true` if a snapshot with this id exists.
pub fn snapshot_exists(conn: &Connection, id: i64) -> Result<bool> {
    let exists: Option<i64> = conn
        .query_row("SELECT 1 FROM snapshots WHERE id = ?1", params![id], |r| r.get(0))
        .optional()?;
    Ok(exists.is_some())
}

/// Streams the files of a snapshot, in unspecified order, invoking `f` for
/// each one. Streaming keeps memory bounded regardless of snapshot size.
pub fn for_each_file(
    conn: &Connection,
    snapshot_id: i64,
    mut f: impl FnMut(FileRow) -> Result<()>,
) -> Result<()> {
    let mut stmt = conn.prepare("SELECT path, hash FROM files WHERE snapshot_id = ?1")?;
    let mut rows = stmt.query(params![snapshot_id])?;
    while let Some(row) = rows.next()? {
        f(FileRow {
            path: row.get(0)?,
            hash: row.get(1)?,
        })?;
    }
    Ok(())
}

/// Fetches a content blob by hash.
pub fn get_content(conn: &Connection, hash: &str) -> Result<Vec<u8>> {
    conn.query_row(
        "SELECT blob FROM contents WHERE hash = ?1",
        params![hash],
        |r| r.get(0),
    )
    .optional()?
    .ok_or_else(|| Error::MissingContent(hash.to_string()))
}

/// Returns the byte length of a stored blob, without reading its contents.
pub fn content_size(conn: &Connection, hash: &str) -> Result<Option<u64>> {
    conn.query_row(
        "SELECT length(blob) FROM contents WHERE hash = ?1",
        params![hash],
        |r| r.get::<_, i64>(0),
    )
    .optional()
    .map(|opt| opt.map(|n| n as u64))
    .map_err(Error::from)
}

/// Streams every content row, invoking `f` with `(hash, blob)`. Used by
/// `check` so corruption scanning never holds every blob in memory at once.
pub fn for_each_content(
    conn: &Connection,
    mut f: impl FnMut(String, Vec<u8>) -> Result<()>,
) -> Result<()> {
    let mut stmt = conn.prepare("SELECT hash, blob FROM contents")?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        f(row.get(0)?, row.get(1)?)?;
    }
    Ok(())
}

/// Deletes all file references belonging to a snapshot.
pub fn delete_files_by_snapshot(conn: &Connection, snapshot_id: i64) -> Result<()> {
    conn.execute("DELETE FROM files WHERE snapshot_id = ?1", params![snapshot_id])?;
    Ok(())
}

/// Deletes a snapshot row.
pub fn delete_snapshot_row(conn: &Connection, snapshot_id: i64) -> Result<()> {
    conn.execute("DELETE FROM snapshots WHERE id = ?1", params![snapshot_id])?;
    Ok(())
}

/// Deletes every content row no longer referenced by any file, returning the
/// number of bytes freed. Implemented as a single anti-join so the orphan
/// scan is atomic with the file/snapshot deletes in the same transaction.
pub fn delete_orphan_contents(conn: &Connection) -> Result<u64> {
    let freed: i64 = conn
        .query_row(
            "SELECT COALESCE(SUM(length(blob)), 0) FROM contents
             WHERE hash NOT IN (SELECT DISTINCT hash FROM files)",
            [],
            |r| r.get(0),
        )
        .unwrap_or(0);

    conn.execute(
        "DELETE FROM contents WHERE hash NOT IN (SELECT DISTINCT hash FROM files)",
        [],
    )?;

    Ok(freed as u64)
}
