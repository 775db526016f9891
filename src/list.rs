//! # List
//!
//! Implements the read-only `list` operation (§4.4): one row per snapshot
//! with its total referenced size and the size that would be reclaimed if it
//! alone were pruned, plus the store's overall on-disk footprint.
//!
//! `size` and `distinct_size` are computed against the *set* of distinct
//! content hashes a snapshot references — a file referenced twice within the
//! same snapshot (two paths, one hash) contributes its blob length once, not
//! twice, matching the spec's worked example where two snapshots sharing a
//! single-byte file report `distinct_size = 0` for both until one is pruned.

use rusqlite::{params, Connection};

use crate::error::Result;

/// One row of the `list` report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRow {
    pub id: i64,
    pub taken_at: String,
    /// Bytes of content this snapshot references (shared content counted
    /// once per snapshot, regardless of how many other snapshots share it).
    pub size: u64,
    /// Bytes that would be reclaimed if this snapshot alone were pruned —
    /// content referenced by no other snapshot.
    pub distinct_size: u64,
}

/// Full `list` report: per-snapshot rows plus the store's total on-disk
/// footprint (sum of every distinct content blob's length, once).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListReport {
    pub rows: Vec<ListRow>,
    pub total_size: u64,
}

/// Produces the `list` report. Read-only; takes no lock beyond what SQLite's
/// normal read path requires.
pub fn list(conn: &Connection) -> Result<ListReport> {
    let mut stmt = conn.prepare("SELECT id, taken_at FROM snapshots ORDER BY id ASC")?;
    let snapshots: Vec<(i64, String)> = stmt
        .query_map([], |r| Ok((r.get(0)?, r.get(1)?)))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    drop(stmt);

    let mut rows = Vec::with_capacity(snapshots.len());
    for (id, taken_at) in snapshots {
        let size = snapshot_size(conn, id)?;
        let distinct_size = snapshot_distinct_size(conn, id)?;
        rows.push(ListRow {
            id,
            taken_at,
            size,
            distinct_size,
        });
    }

    let total_size: i64 = conn.query_row(
        "SELECT COALESCE(SUM(length(blob)), 0) FROM contents",
        [],
        |r| r.get(0),
    )?;

    Ok(ListReport {
        rows,
        total_size: total_size as u64,
    })
}

fn snapshot_size(conn: &Connection, snapshot_id: i64) -> Result<u64> {
    let size: i64 = conn.query_row(
        "SELECT COALESCE(SUM(length(c.blob)), 0)
         FROM (SELECT DISTINCT hash FROM files WHERE snapshot_id = ?1) f
         JOIN contents c ON c.hash = f.hash",
        params![snapshot_id],
        |r| r.get(0),
    )?;
    Ok(size as u64)
}

fn snapshot_distinct_size(conn: &Connection, snapshot_id: i64) -> Result<u64> {
    let size: i64 = conn.query_row(
        "SELECT COALESCE(SUM(length(c.blob)), 0)
         FROM (SELECT DISTINCT hash FROM files WHERE snapshot_id = ?1) f
         JOIN contents c ON c.hash = f.hash
         WHERE NOT EXISTS (
             SELECT 1 FROM files f2
             WHERE f2.hash = f.hash AND f2.snapshot_id != ?1
         )",
        params![snapshot_id],
        |r| r.get(0),
    )?;
    Ok(size as u64)
}
