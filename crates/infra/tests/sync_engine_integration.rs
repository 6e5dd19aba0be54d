//! Filesystem sync engine behaviour against real temporary trees.

mod support;

use std::fs;

use arkive_core::SyncEngine;
use arkive_domain::{ExclusionPattern, LogLevel, OperationType, OverwriteBehavior, SyncMode, SyncOptions};
use arkive_infra::sync::{preview_job, FileSystemSyncEngine};
use filetime::FileTime;
use support::{job_for, set_mtime, TestTree};
use tokio_util::sync::CancellationToken;

#[tokio::test(flavor = "multi_thread")]
async fn first_run_copies_everything_and_preserves_mtime() {
    let tree = TestTree::new();
    let a = tree.write_source("a.txt", "alpha");
    tree.write_source("nested/b.txt", "bravo!");
    set_mtime(&a, 1_650_000_000);

    let result = FileSystemSyncEngine::new()
        .execute(&tree.job(), CancellationToken::new())
        .await
        .expect("sync should succeed");

    assert_eq!(result.counters.files_scanned, 2);
    assert_eq!(result.counters.files_copied, 2);
    assert_eq!(result.counters.bytes_transferred, 11);
    assert!(result.counters.is_clean());
    assert_eq!(tree.read_destination("nested/b.txt"), "bravo!");

    let meta = fs::metadata(tree.destination_file("a.txt")).expect("copied file metadata");
    assert_eq!(FileTime::from_last_modification_time(&meta), FileTime::from_unix_time(1_650_000_000, 0));
}

#[tokio::test(flavor = "multi_thread")]
async fn rerun_on_unchanged_tree_skips_every_file() {
    let tree = TestTree::new();
    tree.write_source("a.txt", "alpha");
    tree.write_source("nested/b.txt", "bravo");
    let engine = FileSystemSyncEngine::new();
    let job = tree.job();

    engine.execute(&job, CancellationToken::new()).await.expect("first pass");
    let second = engine.execute(&job, CancellationToken::new()).await.expect("second pass");

    assert_eq!(second.counters.files_copied, 0);
    assert_eq!(second.counters.files_updated, 0);
    assert_eq!(second.counters.files_skipped, 2);
    assert_eq!(second.counters.bytes_transferred, 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn changed_file_is_updated() {
    let tree = TestTree::new();
    let source = tree.write_source("report.txt", "version two");
    let destination = tree.write_destination("report.txt", "version one");
    set_mtime(&source, 1_700_000_100);
    set_mtime(&destination, 1_700_000_000);

    let result = FileSystemSyncEngine::new()
        .execute(&tree.job(), CancellationToken::new())
        .await
        .expect("sync should succeed");

    assert_eq!(result.counters.files_updated, 1);
    assert_eq!(tree.read_destination("report.txt"), "version two");
}

#[tokio::test(flavor = "multi_thread")]
async fn mirror_deletes_orphans_but_incremental_keeps_them() {
    let tree = TestTree::new();
    tree.write_source("keep.txt", "keep");
    tree.write_destination("orphan.txt", "stale");
    tree.write_destination("old/nested-orphan.txt", "stale");

    let mut job = tree.job();
    let incremental = FileSystemSyncEngine::new()
        .execute(&job, CancellationToken::new())
        .await
        .expect("incremental pass");
    assert_eq!(incremental.counters.files_deleted, 0);
    assert!(tree.destination_file("orphan.txt").exists());

    job.sync_mode = SyncMode::Mirror;
    let mirror = FileSystemSyncEngine::new().execute(&job, CancellationToken::new()).await.expect("mirror pass");

    assert_eq!(mirror.counters.files_deleted, 2);
    assert!(!tree.destination_file("orphan.txt").exists());
    assert!(!tree.destination_file("old/nested-orphan.txt").exists());
    assert!(tree.destination_file("keep.txt").exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn delete_orphaned_option_applies_to_incremental() {
    let tree = TestTree::new();
    tree.write_source("keep.txt", "keep");
    tree.write_destination("orphan.txt", "stale");

    let mut job = tree.job();
    job.sync_options = Some(SyncOptions { delete_orphaned: true, ..SyncOptions::default() });

    let result = FileSystemSyncEngine::new().execute(&job, CancellationToken::new()).await.expect("sync");
    assert_eq!(result.counters.files_deleted, 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn exclusions_and_hidden_files_are_skipped_and_excluded_orphans_survive() {
    let tree = TestTree::new();
    tree.write_source("doc.txt", "doc");
    tree.write_source("build/out.tmp", "tmp");
    tree.write_source(".secret", "hidden");
    tree.write_destination("cache.TMP", "excluded orphan");

    let mut job = tree.job();
    job.sync_mode = SyncMode::Mirror;
    job.exclusion_patterns = vec![ExclusionPattern::new("temp files", "*.tmp", true)];

    let result = FileSystemSyncEngine::new().execute(&job, CancellationToken::new()).await.expect("sync");

    assert_eq!(result.counters.files_scanned, 1);
    assert_eq!(result.counters.files_copied, 1);
    assert_eq!(result.counters.files_skipped, 2);
    assert!(!tree.destination_file("build/out.tmp").exists());
    assert!(!tree.destination_file(".secret").exists());
    assert!(tree.destination_file("cache.TMP").exists(), "excluded destination files are left alone");
}

#[tokio::test(flavor = "multi_thread")]
async fn non_recursive_jobs_stay_at_top_level() {
    let tree = TestTree::new();
    tree.write_source("top.txt", "top");
    tree.write_source("deep/inner.txt", "inner");

    let mut job = tree.job();
    job.sync_options = Some(SyncOptions { recursive: false, ..SyncOptions::default() });

    let result = FileSystemSyncEngine::new().execute(&job, CancellationToken::new()).await.expect("sync");
    assert_eq!(result.counters.files_scanned, 1);
    assert!(!tree.destination_file("deep/inner.txt").exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn keep_both_writes_timestamped_sibling() {
    let tree = TestTree::new();
    let source = tree.write_source("notes.md", "new notes");
    let destination = tree.write_destination("notes.md", "old notes");
    set_mtime(&source, 1_700_000_500);
    set_mtime(&destination, 1_700_000_000);

    let mut job = tree.job();
    job.overwrite_behavior = OverwriteBehavior::KeepBoth;

    let result = FileSystemSyncEngine::new().execute(&job, CancellationToken::new()).await.expect("sync");

    assert_eq!(result.counters.files_updated, 1);
    assert_eq!(tree.read_destination("notes.md"), "old notes");
    let names = tree.destination_names("");
    assert_eq!(names.len(), 2);
    let sibling = names.iter().find(|name| name.as_str() != "notes.md").expect("timestamped sibling");
    assert!(sibling.starts_with("notes_") && sibling.ends_with(".md"), "unexpected sibling {sibling}");
}

#[tokio::test(flavor = "multi_thread")]
async fn verification_passes_for_good_copies() {
    let tree = TestTree::new();
    tree.write_source("data.bin", "0123456789");

    let mut job = tree.job();
    job.sync_options = Some(SyncOptions { verify_after_copy: true, ..SyncOptions::default() });

    let result = FileSystemSyncEngine::new().execute(&job, CancellationToken::new()).await.expect("sync");
    assert_eq!(result.counters.files_copied, 1);
    assert!(result.counters.is_clean());
}

#[tokio::test(flavor = "multi_thread")]
async fn single_file_source_lands_in_destination_directory() {
    let tree = TestTree::new();
    let file = tree.write_source("solo.txt", "solo");

    let job = job_for(&file, &tree.destination);
    let result = FileSystemSyncEngine::new().execute(&job, CancellationToken::new()).await.expect("sync");

    assert_eq!(result.counters.files_scanned, 1);
    assert_eq!(result.counters.files_copied, 1);
    assert_eq!(tree.read_destination("solo.txt"), "solo");
}

#[tokio::test(flavor = "multi_thread")]
async fn missing_source_is_fatal_before_any_file_work() {
    let tree = TestTree::new();
    let job = job_for(&tree.source.join("does-not-exist"), &tree.destination);

    let err = FileSystemSyncEngine::new()
        .execute(&job, CancellationToken::new())
        .await
        .expect_err("missing source should fail");

    assert!(err.to_string().contains("Source path not found"));
    assert!(!tree.destination.exists(), "destination is not created for a failed run");
}

#[tokio::test(flavor = "multi_thread")]
async fn cancelled_token_stops_between_files() {
    let tree = TestTree::new();
    tree.write_source("a.txt", "a");
    tree.write_source("b.txt", "b");

    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = FileSystemSyncEngine::new().execute(&tree.job(), cancel).await.expect_err("cancelled");
    assert!(err.is_cancelled());
    assert!(!tree.destination_file("a.txt").exists());
}

#[cfg(unix)]
#[tokio::test(flavor = "multi_thread")]
async fn failed_copy_is_isolated_and_logged() {
    let tree = TestTree::new();
    tree.write_source("ok.txt", "fine");
    tree.write_source("blocked/file.txt", "blocked");
    // A plain file where the destination needs a directory
    tree.write_destination("blocked", "not a directory");

    let result = FileSystemSyncEngine::new()
        .execute(&tree.job(), CancellationToken::new())
        .await
        .expect("per-file failures do not fail the run");

    assert_eq!(result.counters.files_copied, 1);
    assert_eq!(result.counters.files_failed, 1);
    assert_eq!(result.counters.error_count, 1);
    let error = result.entries.iter().find(|e| e.level == LogLevel::Error).expect("error entry");
    assert_eq!(error.operation, Some(OperationType::Copy));
    assert_eq!(error.file_path.as_deref(), Some("blocked/file.txt"));
    assert!(error.exception.is_some());
    assert_eq!(tree.read_destination("ok.txt"), "fine");
}

#[cfg(unix)]
#[tokio::test(flavor = "multi_thread")]
async fn failed_orphan_delete_is_isolated_and_logged() {
    use std::os::unix::fs::PermissionsExt;

    let tree = TestTree::new();
    tree.write_source("keep.txt", "keep");
    tree.write_destination("locked/orphan.txt", "stale");
    tree.write_destination("loose.txt", "stale");
    let locked = tree.destination_file("locked");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o555)).expect("lock directory");

    // Privileged users ignore directory permissions
    if fs::write(locked.join("writable-check"), "").is_ok() {
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).expect("unlock directory");
        return;
    }

    let mut job = tree.job();
    job.sync_mode = SyncMode::Mirror;
    let result = FileSystemSyncEngine::new().execute(&job, CancellationToken::new()).await;
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).expect("unlock directory");
    let result = result.expect("a failed delete does not fail the run");

    assert_eq!(result.counters.files_copied, 1);
    assert_eq!(result.counters.files_deleted, 1);
    assert_eq!(result.counters.files_failed, 1);
    assert_eq!(result.counters.error_count, 1);
    let error = result.entries.iter().find(|e| e.level == LogLevel::Error).expect("error entry");
    assert_eq!(error.operation, Some(OperationType::Delete));
    assert_eq!(error.file_path.as_deref(), Some("locked/orphan.txt"));
    assert!(tree.destination_file("locked/orphan.txt").exists());
    assert!(!tree.destination_file("loose.txt").exists());
    assert_eq!(tree.read_destination("keep.txt"), "keep");
}

#[tokio::test(flavor = "multi_thread")]
async fn preview_counts_without_touching_destination() {
    let tree = TestTree::new();
    tree.write_source("new.txt", "new-file");
    let same_source = tree.write_source("same.txt", "same-content");
    let changed = tree.write_source("changed.txt", "changed-source");
    let same_destination = tree.write_destination("same.txt", "same-content");
    tree.write_destination("changed.txt", "changed-destination");
    tree.write_destination("orphan.txt", "orphan");
    set_mtime(&same_source, 1_690_000_000);
    set_mtime(&same_destination, 1_690_000_000);
    set_mtime(&changed, 1_690_000_100);

    let mut job = tree.job();
    job.sync_mode = SyncMode::Mirror;

    let preview = preview_job(&job).await.expect("preview should succeed");

    assert_eq!(preview.files_to_add, 1);
    assert_eq!(preview.files_to_update, 1);
    assert_eq!(preview.files_to_delete, 1);
    assert_eq!(preview.files_unchanged, 1);
    assert_eq!(preview.bytes_to_transfer, 22);
    assert!(!tree.destination_file("new.txt").exists());
    assert!(tree.destination_file("orphan.txt").exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn preview_of_missing_source_fails() {
    let tree = TestTree::new();
    let job = job_for(&tree.source.join("gone"), &tree.destination);

    assert!(preview_job(&job).await.is_err());
}
