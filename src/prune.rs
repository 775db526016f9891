//! # Prune
//!
//! Implements the `prune` operation (§4.6): delete one snapshot's file
//! references, delete its snapshot row, then reclaim every content row no
//! longer referenced by any remaining snapshot — all in one transaction, so
//! pruning can never leave a snapshot half-deleted or a content row
//! half-orphaned (I5).

use crate::error::{Error, Result};
use crate::store::{self, Store};

/// Outcome of a successful `prune` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PruneReport {
    pub bytes_freed: u64,
}

/// Deletes the snapshot identified by `snapshot_id` and reclaims any content
/// that becomes unreferenced as a result. Fails with
/// [`Error::UnknownSnapshot`] if no such snapshot exists, leaving the store
/// untouched.
pub fn prune(store: &mut Store, snapshot_id: i64) -> Result<PruneReport> {
    if !store::snapshot_exists(store.connection(), snapshot_id)? {
        return Err(Error::UnknownSnapshot(snapshot_id));
    }

    let bytes_freed = store.transaction(|tx| {
        store::delete_files_by_snapshot(tx, snapshot_id)?;
        store::delete_snapshot_row(tx, snapshot_id)?;
        store::delete_orphan_contents(tx)
    })?;

    Ok(PruneReport { bytes_freed })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content;
    use crate::list;

    #[test]
    fn unknown_snapshot_is_rejected() {
        let mut store = Store::open_in_memory().unwrap();
        let result = prune(&mut store, 999);
        assert!(matches!(result, Err(Error::UnknownSnapshot(999))));
    }

    #[test]
    fn prune_isolation_other_snapshots_remain_intact() {
        let mut store = Store::open_in_memory().unwrap();

        let s1 = store
            .transaction(|tx| {
                let id = store::insert_snapshot(tx, "2024-01-01 00:00:00")?;
                let a = content::put(tx, b"only-in-one")?;
                store::insert_file(tx, id, "a.txt", &a.hash)?;
                Ok(id)
            })
            .unwrap();

        let s2 = store
            .transaction(|tx| {
                let id = store::insert_snapshot(tx, "2024-01-01 00:00:01")?;
                let b = content::put(tx, b"shared")?;
                store::insert_file(tx, id, "b.txt", &b.hash)?;
                Ok(id)
            })
            .unwrap();

        let report = prune(&mut store, s1).unwrap();
        assert_eq!(report.bytes_freed, "only-in-one".len() as u64);

        let listing = list::list(store.connection()).unwrap();
        assert_eq!(listing.rows.len(), 1);
        assert_eq!(listing.rows[0].id, s2);

        let mut remaining_paths = Vec::new();
        store::for_each_file(store.connection(), s2, |row| {
            remaining_paths.push(row.path);
            Ok(())
        })
        .unwrap();
        assert_eq!(remaining_paths, vec!["b.txt"]);
    }

    #[test]
    fn no_orphans_remain_after_prune() {
        let mut store = Store::open_in_memory().unwrap();
        let s1 = store
            .transaction(|tx| {
                let id = store::insert_snapshot(tx, "2024-01-01 00:00:00")?;
                let a = content::put(tx, b"gone-soon")?;
                store::insert_file(tx, id, "a.txt", &a.hash)?;
                Ok(id)
            })
            .unwrap();

        prune(&mut store, s1).unwrap();

        let total: u64 = list::list(store.connection()).unwrap().total_size;
        assert_eq!(total, 0);
    }
}
