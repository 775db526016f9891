//! # Snapshot
//!
//! Implements the `snapshot` operation (§4.3): walk a target directory,
//! content-address every regular file into the store, and record the whole
//! set as one immutable `Snapshot` row. The walk and all file inserts run
//! inside a single write transaction, so a snapshot that fails partway
//! through — a file vanishes mid-walk, a read fails, a constraint is
//! violated — leaves the database exactly as it was before the call (the
//! `Building → Aborted` transition in §4.8).

use std::path::{Path, PathBuf};

use chrono::Local;

use crate::content;
use crate::error::{Error, Result};
use crate::store::{self, Store};
use crate::walk::{self, WalkOptions};

/// Default cap on a single file's size before `snapshot` skips it with a
/// warning rather than storing it (1 GiB, per §4.2's policy).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 1024 * 1024 * 1024;

/// Options controlling a single `snapshot` call.
#[derive(Debug, Clone, Copy)]
pub struct SnapshotOptions {
    /// Files larger than this are skipped and reported as a warning.
    pub max_file_size: u64,
    /// When `true`, unreadable source entries are skipped with a warning
    /// instead of aborting the snapshot. Default `false` (fatal).
    pub skip_unreadable: bool,
}

impl Default for SnapshotOptions {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            skip_unreadable: false,
        }
    }
}

/// A non-fatal diagnostic produced while building a snapshot.
#[derive(Debug)]
pub enum Warning {
    /// A file exceeded `max_file_size` and was skipped.
    TooLarge { path: PathBuf, size: u64 },
    /// A file could not be read but `skip_unreadable` was set.
    PermissionDenied { path: PathBuf },
}

/// Outcome of a successful `snapshot` call.
#[derive(Debug)]
pub struct SnapshotReport {
    pub id: i64,
    pub total_files: u64,
    pub new_files: u64,
    pub deduplicated_files: u64,
    pub warnings: Vec<Warning>,
}

/// Captures a snapshot of `target_dir` into `store`, returning the assigned
/// snapshot id and a summary. `progress` is invoked with each file's relative
/// path as it is processed; pass a no-op closure if progress isn't needed.
pub fn snapshot(
    store: &mut Store,
    target_dir: &Path,
    opts: &SnapshotOptions,
    mut progress: impl FnMut(&str),
) -> Result<SnapshotReport> {
    if !target_dir.is_dir() {
        return Err(Error::FileIo {
            path: target_dir.to_path_buf(),
            source: std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "target directory does not exist",
            ),
        });
    }

    let walk_opts = WalkOptions {
        skip_unreadable: opts.skip_unreadable,
    };
    let (entries, skipped) = walk::walk(target_dir, walk_opts)?;

    let mut warnings: Vec<Warning> = skipped
        .into_iter()
        .map(|s| Warning::PermissionDenied { path: s.path })
        .collect();

    let taken_at = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();

    let mut total_files = 0u64;
    let mut new_files = 0u64;
    let mut deduplicated_files = 0u64;

    let id = store.transaction(|tx| {
        let snapshot_id = store::insert_snapshot(tx, &taken_at)?;

        for entry in &entries {
            progress(&entry.relative_path);

            if entry.len > opts.max_file_size {
                warnings.push(Warning::TooLarge {
                    path: entry.absolute_path.clone(),
                    size: entry.len,
                });
                continue;
            }

            let data = std::fs::read(&entry.absolute_path).map_err(|e| Error::FileIo {
                path: entry.absolute_path.clone(),
                source: e,
            })?;

            let outcome = content::put(tx, &data)?;
            store::insert_file(tx, snapshot_id, &entry.relative_path, &outcome.hash)?;

            total_files += 1;
            if outcome.was_new {
                new_files += 1;
            } else {
                deduplicated_files += 1;
            }
        }

        Ok(snapshot_id)
    })?;

    Ok(SnapshotReport {
        id,
        total_files,
        new_files,
        deduplicated_files,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::for_each_file;
    use std::fs;

    fn noop(_: &str) {}

    #[test]
    fn two_identical_files_dedup_to_one_content_row() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), b"hello").unwrap();
        fs::write(dir.path().join("b.txt"), b"hello").unwrap();

        let mut store = Store::open_in_memory().unwrap();
        let report = snapshot(&mut store, dir.path(), &SnapshotOptions::default(), noop).unwrap();

        assert_eq!(report.total_files, 2);
        assert_eq!(report.new_files, 1);
        assert_eq!(report.deduplicated_files, 1);

        let mut paths = Vec::new();
        for_each_file(store.connection(), report.id, |row| {
            paths.push(row.path);
            Ok(())
        })
        .unwrap();
        paths.sort();
        assert_eq!(paths, vec!["a.txt", "b.txt"]);
    }

    #[test]
    fn snapshot_ids_are_strictly_increasing() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("x"), b"1").unwrap();

        let mut store = Store::open_in_memory().unwrap();
        let first = snapshot(&mut store, dir.path(), &SnapshotOptions::default(), noop).unwrap();
        let second = snapshot(&mut store, dir.path(), &SnapshotOptions::default(), noop).unwrap();

        assert!(second.id > first.id);
    }

    #[test]
    fn oversized_file_is_skipped_with_warning_not_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("big.bin"), vec![0u8; 1024]).unwrap();

        let opts = SnapshotOptions {
            max_file_size: 10,
            ..Default::default()
        };
        let mut store = Store::open_in_memory().unwrap();
        let report = snapshot(&mut store, dir.path(), &opts, noop).unwrap();

        assert_eq!(report.total_files, 0);
        assert_eq!(report.warnings.len(), 1);
        assert!(matches!(report.warnings[0], Warning::TooLarge { .. }));
    }

    #[test]
    fn nested_directories_preserve_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("dir/sub")).unwrap();
        fs::write(dir.path().join("dir/sub/nested.bin"), vec![7u8; 1024]).unwrap();

        let mut store = Store::open_in_memory().unwrap();
        let report = snapshot(&mut store, dir.path(), &SnapshotOptions::default(), noop).unwrap();

        let mut paths = Vec::new();
        for_each_file(store.connection(), report.id, |row| {
            paths.push(row.path);
            Ok(())
        })
        .unwrap();
        assert_eq!(paths, vec!["dir/sub/nested.bin"]);
    }

    #[test]
    fn missing_target_directory_is_fatal() {
        let mut store = Store::open_in_memory().unwrap();
        let result = snapshot(
            &mut store,
            Path::new("/nonexistent/does/not/exist"),
            &SnapshotOptions::default(),
            noop,
        );
        assert!(result.is_err());
    }
}
