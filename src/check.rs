//! # Check
//!
//! Implements the `check` operation (§4.7): a read-only semantic scan for
//! corruption. Distinct from [`crate::store::Store::integrity_check`], which
//! checks SQLite's own page/index structure — this recomputes every stored
//! blob's digest and compares it to its key (I2), and looks for file
//! references whose hash has no content row at all (I1 violated, implying
//! prior corruption).

use rusqlite::Connection;

use crate::content;
use crate::error::Result;
use crate::store;

/// Report produced by `check`. An empty report (`is_healthy()`) means every
/// content row's bytes match its hash and every file reference resolves.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CheckReport {
    pub corrupt_hashes: Vec<String>,
    pub missing_hashes: Vec<String>,
}

impl CheckReport {
    pub fn is_healthy(&self) -> bool {
        self.corrupt_hashes.is_empty() && self.missing_hashes.is_empty()
    }
}

/// Scans the whole store for corruption. Never returns an error on content
/// damage — damage is reported, not raised.
pub fn check(conn: &Connection) -> Result<CheckReport> {
    let mut corrupt_hashes = Vec::new();
    store::for_each_content(conn, |hash, blob| {
        let actual = content::hash_bytes(&blob);
        if actual != hash {
            corrupt_hashes.push(hash);
        }
        Ok(())
    })?;

    let mut stmt = conn.prepare(
        "SELECT DISTINCT hash FROM files WHERE hash NOT IN (SELECT hash FROM contents)",
    )?;
    let missing_hashes = stmt
        .query_map([], |r| r.get(0))?
        .collect::<std::result::Result<Vec<String>, _>>()?;

    Ok(CheckReport {
        corrupt_hashes,
        missing_hashes,
    })
}
