//! # Filesystem Walk
//!
//! Directory walking is named out of scope as a general-purpose collaborator
//! (argument parsing, glob exclusion, and the like belong to a caller), but
//! the walk *contract* is in scope: every entry handed to [`crate::snapshot`]
//! must already carry a canonical relative path, exclude symlinks and
//! special files, and surface unreadable entries as a policy decision rather
//! than silently skipping them.
//!
//! Grounded in the teacher's `backup.rs`, which already drives `walkdir`
//! over the source tree; this module narrows that usage down to the
//! contract's exact shape.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{Error, Result};

/// One regular file discovered under a walked root.
pub struct WalkEntry {
    /// Canonical relative path: `/`-separated, no leading slash, no `.`/`..`
    /// components (I4).
    pub relative_path: String,
    /// Absolute path on disk, for opening the file.
    pub absolute_path: PathBuf,
    /// File size in bytes, as reported by `stat` before the file is read.
    pub len: u64,
}

/// Controls how the walk reacts to entries it cannot read.
#[derive(Debug, Clone, Copy, Default)]
pub struct WalkOptions {
    /// When `true`, a permission-denied entry is dropped with a warning
    /// instead of aborting the walk. Default `false`: per the storage
    /// contract, the caller decides, and the default is fatal.
    pub skip_unreadable: bool,
}

/// A permission-denied entry that was skipped because [`WalkOptions::skip_unreadable`]
/// was set.
pub struct SkippedEntry {
    pub path: PathBuf,
}

/// Walks `root`, returning every regular file as a [`WalkEntry`] plus any
/// entries skipped under [`WalkOptions::skip_unreadable`].
///
/// Symbolic links are never followed and never yielded (neither as files nor
/// traversed as directories). Non-regular entries (fifos, sockets, device
/// files) are excluded. Entries removed between being listed and being
/// `stat`ed again abort the walk with [`Error::FileIo`] — the spec's open
/// question on mid-walk removal is resolved that way (§9).
pub fn walk(root: &Path, opts: WalkOptions) -> Result<(Vec<WalkEntry>, Vec<SkippedEntry>)> {
    let mut entries = Vec::new();
    let mut skipped = Vec::new();

    for dir_entry in WalkDir::new(root).follow_links(false) {
        let dir_entry = match dir_entry {
            Ok(e) => e,
            Err(e) => {
                let path = e.path().map(Path::to_path_buf).unwrap_or_default();
                if is_permission_denied(&e) && opts.skip_unreadable {
                    skipped.push(SkippedEntry { path });
                    continue;
                }
                return Err(io_error_for_walkdir(path, e));
            }
        };

        let file_type = dir_entry.file_type();
        if file_type.is_symlink() || !file_type.is_file() {
            continue;
        }

        let absolute_path = dir_entry.path().to_path_buf();
        let metadata = match std::fs::symlink_metadata(&absolute_path) {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied && opts.skip_unreadable => {
                skipped.push(SkippedEntry {
                    path: absolute_path,
                });
                continue;
            }
            Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                return Err(Error::PermissionDenied(absolute_path));
            }
            Err(e) => {
                return Err(Error::FileIo {
                    path: absolute_path,
                    source: e,
                })
            }
        };

        let relative_path = canonical_relative_path(root, &absolute_path);

        entries.push(WalkEntry {
            relative_path,
            absolute_path,
            len: metadata.len(),
        });
    }

    Ok((entries, skipped))
}

fn is_permission_denied(err: &walkdir::Error) -> bool {
    err.io_error()
        .map(|e| e.kind() == std::io::ErrorKind::PermissionDenied)
        .unwrap_or(false)
}

fn io_error_for_walkdir(path: PathBuf, err: walkdir::Error) -> Error {
    match err.io_error() {
        Some(io) if io.kind() == std::io::ErrorKind::PermissionDenied => {
            Error::PermissionDenied(path)
        }
        Some(io) => Error::FileIo {
            path,
            source: std::io::Error::new(io.kind(), io.to_string()),
        },
        None => Error::FileIo {
            path,
            source: std::io::Error::new(std::io::ErrorKind::Other, err.to_string()),
        },
    }
}

/// Produces the I4-canonical relative path: `/`-separated, relative to
/// `root`, with no leading slash and no `.`/`..` components (guaranteed by
/// construction since we only ever strip a literal ancestor prefix).
fn canonical_relative_path(root: &Path, absolute: &Path) -> String {
    let relative = absolute.strip_prefix(root).unwrap_or(absolute);
    let mut parts = Vec::new();
    for component in relative.components() {
        if let std::path::Component::Normal(part) = component {
            parts.push(part.to_string_lossy().into_owned());
        }
    }
    parts.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn walks_regular_files_with_canonical_paths() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("a.txt"), b"a").unwrap();
        fs::write(dir.path().join("sub/b.txt"), b"b").unwrap();

        let (entries, skipped) = walk(dir.path(), WalkOptions::default()).unwrap();
        assert!(skipped.is_empty());

        let mut paths: Vec<_> = entries.iter().map(|e| e.relative_path.clone()).collect();
        paths.sort();
        assert_eq!(paths, vec!["a.txt", "sub/b.txt"]);
    }

    #[test]
    fn excludes_symlinks() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("real.txt"), b"real").unwrap();

        #[cfg(unix)]
        {
            std::os::unix::fs::symlink(dir.path().join("real.txt"), dir.path().join("link.txt"))
                .unwrap();
            let (entries, _) = walk(dir.path(), WalkOptions::default()).unwrap();
            assert_eq!(entries.len(), 1);
            assert_eq!(entries[0].relative_path, "real.txt");
        }
    }

    #[test]
    fn reports_file_length() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), b"hello").unwrap();

        let (entries, _) = walk(dir.path(), WalkOptions::default()).unwrap();
        assert_eq!(entries[0].len, 5);
    }
}
