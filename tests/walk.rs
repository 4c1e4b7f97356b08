// ABOUTME: Integration tests for the concurrent directory walker.
// ABOUTME: Checks the reachable-files property, strict and lenient failure modes.

mod support;

use fastack::walk::{WalkError, WalkMode, WalkOptions, walk, walk_with};
use proptest::prelude::*;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use tokio_util::sync::CancellationToken;

fn names(entries: &[fastack::walk::FileSystemEntry]) -> Vec<String> {
    let mut names: Vec<String> = entries.iter().map(|e| e.archive_name()).collect();
    names.sort();
    names
}

/// Relative file paths built from short segments, e.g. `ab/c/d.txt`.
fn tree_strategy() -> impl Strategy<Value = BTreeSet<String>> {
    let segment = "[a-z]{1,3}";
    let file = (prop::collection::vec(segment, 0..4), segment).prop_map(|(dirs, name)| {
        let mut parts = dirs;
        parts.push(format!("{name}.f"));
        parts.join("/")
    });
    prop::collection::btree_set(file, 0..24)
}

/// Directory segments never contain a dot and file names always do, so
/// generated paths cannot collide.
fn materialize(root: &Path, files: &BTreeSet<String>) -> BTreeSet<String> {
    for relative in files {
        support::write_file(root, relative, relative.as_bytes());
    }
    files.clone()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Test: The walker returns exactly the reachable files, once each.
    #[test]
    fn walker_returns_every_reachable_file(files in tree_strategy(), limit in 1usize..8) {
        let dir = tempfile::tempdir().unwrap();
        let expected = materialize(dir.path(), &files);

        let runtime = tokio::runtime::Runtime::new().unwrap();
        let options = WalkOptions::default().max_concurrency(limit);
        let output = runtime
            .block_on(walk_with(dir.path(), &options, &CancellationToken::new()))
            .unwrap();

        let returned = names(&output.entries);
        let unique: BTreeSet<String> = returned.iter().cloned().collect();
        prop_assert_eq!(returned.len(), unique.len(), "duplicates returned");
        prop_assert_eq!(unique, expected);
    }
}

// =============================================================================
// Basic Traversal
// =============================================================================

/// Test: Directories are descended but never returned.
#[tokio::test]
async fn directories_are_not_entries() {
    support::init_tracing();
    let dir = tempfile::tempdir().unwrap();
    support::write_file(dir.path(), "a/b/c.txt", b"c");
    fs::create_dir_all(dir.path().join("empty/nested")).unwrap();

    let entries = walk(dir.path()).await.unwrap();

    assert_eq!(names(&entries), vec!["a/b/c.txt".to_string()]);
    assert!(entries.iter().all(|e| e.is_file()));
    assert!(entries.iter().all(|e| e.path().starts_with(dir.path())));
}

/// Test: A missing root fails with DirectoryRead naming the path.
#[tokio::test]
async fn missing_root_is_directory_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope");

    let err = walk(&missing).await.unwrap_err();

    match err {
        WalkError::DirectoryRead { path, .. } => assert_eq!(path, missing),
        other => panic!("expected DirectoryRead, got {other:?}"),
    }
}

// =============================================================================
// Failure Modes (unix: needs symlinks)
// =============================================================================

#[cfg(unix)]
mod unix {
    use super::*;
    use std::os::unix::fs::symlink;

    /// Test: A dangling symlink fails a strict walk.
    #[tokio::test]
    async fn strict_walk_reports_unreadable_entry() {
        let dir = tempfile::tempdir().unwrap();
        support::write_file(dir.path(), "ok.txt", b"ok");
        symlink(dir.path().join("gone"), dir.path().join("dangling")).unwrap();

        let err = walk(dir.path()).await.unwrap_err();

        assert!(matches!(err, WalkError::Entry { ref path, .. } if path.ends_with("dangling")));
    }

    /// Test: Lenient mode skips and records the same entry.
    #[tokio::test]
    async fn lenient_walk_records_skipped_entry() {
        let dir = tempfile::tempdir().unwrap();
        support::write_file(dir.path(), "ok.txt", b"ok");
        symlink(dir.path().join("gone"), dir.path().join("dangling")).unwrap();

        let options = WalkOptions::default().mode(WalkMode::Lenient);
        let output = walk_with(dir.path(), &options, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(names(&output.entries), vec!["ok.txt".to_string()]);
        assert_eq!(output.skipped.len(), 1);
        assert!(output.skipped[0].path.ends_with("dangling"));
    }

    /// Test: Symlinks to files are recorded; symlinked directories are not followed.
    #[tokio::test]
    async fn symlinks_to_files_only() {
        let dir = tempfile::tempdir().unwrap();
        support::write_file(dir.path(), "real/file.txt", b"x");
        symlink(dir.path().join("real/file.txt"), dir.path().join("link.txt")).unwrap();
        symlink(dir.path().join("real"), dir.path().join("loop")).unwrap();

        let entries = walk(dir.path()).await.unwrap();

        assert_eq!(
            names(&entries),
            vec!["link.txt".to_string(), "real/file.txt".to_string()]
        );
    }
}
