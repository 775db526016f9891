//! # Restore
//!
//! Implements the `restore` operation (§4.5): reconstruct a snapshot's files
//! on disk by reading each referenced blob out of the content store and
//! writing it to `output_dir/relative_path`, creating intermediate
//! directories as needed and overwriting anything already there.
//!
//! This is a read-only operation against the store (no transaction is
//! opened) but a side-effecting one against the filesystem: per §4.5, a
//! failure partway through is surfaced to the caller as-is and whatever was
//! already written stays written — there is no filesystem transaction to
//! roll back.

use std::path::Path;

use crate::content;
use crate::error::{Error, Result};
use crate::store::{self, Store};

/// Outcome of a successful `restore` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RestoreReport {
    pub files_written: u64,
    pub bytes_written: u64,
}

/// Restores every file of `snapshot_id` into `output_dir`. Fails with
/// [`Error::UnknownSnapshot`] if the snapshot doesn't exist. Writing order is
/// unspecified; the only guarantee on success is that `output_dir` contains
/// exactly the snapshot's files with bit-identical contents.
pub fn restore(store: &Store, snapshot_id: i64, output_dir: &Path) -> Result<RestoreReport> {
    if !store::snapshot_exists(store.connection(), snapshot_id)? {
        return Err(Error::UnknownSnapshot(snapshot_id));
    }

    std::fs::create_dir_all(output_dir).map_err(|e| Error::FileIo {
        path: output_dir.to_path_buf(),
        source: e,
    })?;

    let mut report = RestoreReport::default();

    store::for_each_file(store.connection(), snapshot_id, |row| {
        let target_path = output_dir.join(&row.path);

        if let Some(parent) = target_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| Error::FileIo {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let data = content::get(store.connection(), &row.hash)?;

        std::fs::write(&target_path, &data).map_err(|e| Error::FileIo {
            path: target_path.clone(),
            source: e,
        })?;

        report.files_written += 1;
        report.bytes_written += data.len() as u64;
        Ok(())
    })?;

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{snapshot, SnapshotOptions};
    use std::fs;

    #[test]
    fn unknown_snapshot_is_rejected() {
        let store = Store::open_in_memory().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let result = restore(&store, 42, dir.path());
        assert!(matches!(result, Err(Error::UnknownSnapshot(42))));
    }

    #[test]
    fn round_trip_preserves_bytes_and_nested_paths() {
        let source = tempfile::tempdir().unwrap();
        fs::create_dir_all(source.path().join("dir/sub")).unwrap();
        fs::write(source.path().join("dir/sub/nested.bin"), vec![9u8; 1024]).unwrap();

        let mut store = Store::open_in_memory().unwrap();
        let report = snapshot(&mut store, source.path(), &SnapshotOptions::default(), |_| {}).unwrap();

        let dest = tempfile::tempdir().unwrap();
        let restore_report = restore(&store, report.id, dest.path()).unwrap();
        assert_eq!(restore_report.files_written, 1);

        let restored = fs::read(dest.path().join("dir/sub/nested.bin")).unwrap();
        assert_eq!(restored, vec![9u8; 1024]);
    }

    #[test]
    fn weird_filename_is_preserved_exactly() {
        let source = tempfile::tempdir().unwrap();
        fs::write(source.path().join("weird name!@#.txt"), b"z").unwrap();

        let mut store = Store::open_in_memory().unwrap();
        let report = snapshot(&mut store, source.path(), &SnapshotOptions::default(), |_| {}).unwrap();

        let dest = tempfile::tempdir().unwrap();
        restore(&store, report.id, dest.path()).unwrap();

        let restored = fs::read(dest.path().join("weird name!@#.txt")).unwrap();
        assert_eq!(restored, b"z");
    }

    #[test]
    fn restore_overwrites_existing_files() {
        let source = tempfile::tempdir().unwrap();
        fs::write(source.path().join("a.txt"), b"new-content").unwrap();

        let mut store = Store::open_in_memory().unwrap();
        let report = snapshot(&mut store, source.path(), &SnapshotOptions::default(), |_| {}).unwrap();

        let dest = tempfile::tempdir().unwrap();
        fs::write(dest.path().join("a.txt"), b"stale-content-that-is-much-longer").unwrap();

        restore(&store, report.id, dest.path()).unwrap();
        assert_eq!(fs::read(dest.path().join("a.txt")).unwrap(), b"new-content");
    }

    #[test]
    fn prune_isolation_restore_still_works_for_surviving_snapshot() {
        let source = tempfile::tempdir().unwrap();
        fs::write(source.path().join("a.txt"), b"alpha").unwrap();

        let mut store = Store::open_in_memory().unwrap();
        let first = snapshot(&mut store, source.path(), &SnapshotOptions::default(), |_| {}).unwrap();

        fs::write(source.path().join("b.txt"), b"beta").unwrap();
        let second = snapshot(&mut store, source.path(), &SnapshotOptions::default(), |_| {}).unwrap();

        crate::prune::prune(&mut store, first.id).unwrap();

        let dest = tempfile::tempdir().unwrap();
        let report = restore(&store, second.id, dest.path()).unwrap();
        assert_eq!(report.files_written, 2);
        assert_eq!(fs::read(dest.path().join("a.txt")).unwrap(), b"alpha");
        assert_eq!(fs::read(dest.path().join("b.txt")).unwrap(), b"beta");
    }
}
