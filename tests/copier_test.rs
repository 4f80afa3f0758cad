//! End-to-end scenarios for the copy/verify pipeline

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

use copyr::config::CopyOptions;
use copyr::copier::Copier;
use copyr::db::SyncDb;
use copyr::error::CopyError;
use copyr::filter::FileFilter;
use copyr::hasher::{FileHasher, HashAlgorithm};
use copyr::types::{CopyMode, FileStatus, SyncMode};

// Helper function to create test files, creating parent directories as needed
fn create_test_file(dir: &TempDir, name: &str, content: &[u8]) -> PathBuf {
	let file_path = dir.path().join(name);
	if let Some(parent) = file_path.parent() {
		fs::create_dir_all(parent).unwrap();
	}
	fs::write(&file_path, content).unwrap();
	file_path
}

fn quick_options() -> CopyOptions {
	CopyOptions {
		buffer_size: 64 * 1024,
		retry_delay_ms: 10,
		progress_interval_ms: 50,
		..Default::default()
	}
}

fn open_db(dir: &TempDir, mode: SyncMode) -> Arc<SyncDb> {
	Arc::new(SyncDb::open(&dir.path().join("sync.db"), mode).unwrap())
}

#[tokio::test]
async fn test_basic_tree_copy() {
	let src = TempDir::new().unwrap();
	let dst = TempDir::new().unwrap();
	let state = TempDir::new().unwrap();

	create_test_file(&src, "a.txt", &vec![b'a'; 1024]);
	create_test_file(&src, "b.txt", &vec![b'b'; 2048]);
	create_test_file(&src, "sub/c.txt", &vec![b'c'; 512]);

	let db = open_db(&state, SyncMode::Normal);
	let copier = Copier::new(
		src.path(),
		dst.path(),
		quick_options(),
		FileFilter::allow_all(),
		Some(Arc::clone(&db)),
	)
	.unwrap();

	copier.copy_files().await.unwrap();

	let stats = copier.stats();
	assert_eq!(stats.files_copied(), 3);
	assert_eq!(stats.files_skipped(), 0);
	assert_eq!(stats.files_failed(), 0);
	assert_eq!(stats.bytes_copied(), 3584);

	assert_eq!(fs::read(dst.path().join("a.txt")).unwrap(), vec![b'a'; 1024]);
	assert_eq!(fs::read(dst.path().join("b.txt")).unwrap(), vec![b'b'; 2048]);
	assert_eq!(fs::read(dst.path().join("sub/c.txt")).unwrap(), vec![b'c'; 512]);

	assert_eq!(db.get_file("a.txt").unwrap().status, FileStatus::Success);
	assert_eq!(db.get_file("sub/c.txt").unwrap().status, FileStatus::Success);
}

#[tokio::test]
async fn test_filtered_copy() {
	let src = TempDir::new().unwrap();
	let dst = TempDir::new().unwrap();

	for &name in &[
		"include.txt",
		"include.doc",
		"exclude.tmp",
		"exclude.bak",
		"sub/include.txt",
		"sub/exclude.tmp",
	] {
		create_test_file(&src, name, &vec![0u8; 1024]);
	}

	let filter = FileFilter::new("*.txt,*.doc", "*.tmp,*.bak");
	let copier =
		Copier::new(src.path(), dst.path(), quick_options(), filter, None).unwrap();
	copier.copy_files().await.unwrap();

	let stats = copier.stats();
	assert_eq!(stats.files_copied(), 3);
	assert_eq!(stats.files_skipped(), 3);
	assert_eq!(stats.files_failed(), 0);

	assert!(dst.path().join("include.txt").exists());
	assert!(dst.path().join("include.doc").exists());
	assert!(dst.path().join("sub/include.txt").exists());
	assert!(!dst.path().join("exclude.tmp").exists());
	assert!(!dst.path().join("exclude.bak").exists());
	assert!(!dst.path().join("sub/exclude.tmp").exists());
}

#[tokio::test]
async fn test_verify_mode_hash_mismatch() {
	let src = TempDir::new().unwrap();
	let dst = TempDir::new().unwrap();
	let state = TempDir::new().unwrap();

	create_test_file(&src, "x.txt", b"contents as the source sees them");
	create_test_file(&dst, "x.txt", b"different contents on the destination");

	let db = open_db(&state, SyncMode::Normal);
	let options = CopyOptions { mode: CopyMode::Verify, ..quick_options() };
	let copier = Copier::new(
		src.path(),
		dst.path(),
		options,
		FileFilter::allow_all(),
		Some(Arc::clone(&db)),
	)
	.unwrap();

	match copier.copy_files().await {
		Err(CopyError::PartialFailure { failed }) => assert_eq!(failed, 1),
		other => panic!("expected PartialFailure, got {:?}", other),
	}

	let hasher = FileHasher::new(HashAlgorithm::Sha256, 0);
	let record = db.get_file("x.txt").unwrap();
	assert_eq!(record.status, FileStatus::Mismatch);
	assert_eq!(record.source_hash, hasher.hash_file(&src.path().join("x.txt")).unwrap());
	assert_eq!(record.dest_hash, hasher.hash_file(&dst.path().join("x.txt")).unwrap());
	assert_eq!(copier.stats().files_failed(), 1);
}

#[tokio::test]
async fn test_verify_mode_destination_missing() {
	let src = TempDir::new().unwrap();
	let dst = TempDir::new().unwrap();
	let state = TempDir::new().unwrap();

	create_test_file(&src, "only-here.txt", b"data");

	let db = open_db(&state, SyncMode::Normal);
	let options = CopyOptions { mode: CopyMode::Verify, ..quick_options() };
	let copier = Copier::new(
		src.path(),
		dst.path(),
		options,
		FileFilter::allow_all(),
		Some(Arc::clone(&db)),
	)
	.unwrap();

	assert!(matches!(
		copier.copy_files().await,
		Err(CopyError::PartialFailure { failed: 1 })
	));
	let record = db.get_file("only-here.txt").unwrap();
	assert_eq!(record.status, FileStatus::Mismatch);
	assert_eq!(record.last_error, "destination missing");
}

#[tokio::test]
async fn test_idempotent_rerun_skips_everything() {
	let src = TempDir::new().unwrap();
	let dst = TempDir::new().unwrap();
	let state = TempDir::new().unwrap();

	create_test_file(&src, "a.txt", &vec![b'a'; 1024]);
	create_test_file(&src, "b.txt", &vec![b'b'; 2048]);
	create_test_file(&src, "sub/c.txt", &vec![b'c'; 512]);

	let db = open_db(&state, SyncMode::Normal);
	let first = Copier::new(
		src.path(),
		dst.path(),
		quick_options(),
		FileFilter::allow_all(),
		Some(Arc::clone(&db)),
	)
	.unwrap();
	first.copy_files().await.unwrap();
	assert_eq!(first.stats().files_copied(), 3);

	let mtime_before = fs::metadata(dst.path().join("a.txt")).unwrap().modified().unwrap();

	let second = Copier::new(
		src.path(),
		dst.path(),
		quick_options(),
		FileFilter::allow_all(),
		Some(Arc::clone(&db)),
	)
	.unwrap();
	second.copy_files().await.unwrap();

	let stats = second.stats();
	assert_eq!(stats.files_copied(), 0);
	assert_eq!(stats.files_skipped(), 3);
	assert_eq!(stats.files_failed(), 0);
	assert_eq!(stats.bytes_copied(), 0);

	let mtime_after = fs::metadata(dst.path().join("a.txt")).unwrap().modified().unwrap();
	assert_eq!(mtime_before, mtime_after);
}

#[tokio::test]
async fn test_modified_file_is_recopied() {
	let src = TempDir::new().unwrap();
	let dst = TempDir::new().unwrap();

	create_test_file(&src, "stable.txt", &vec![1u8; 100]);
	create_test_file(&src, "changing.txt", &vec![2u8; 100]);

	let first =
		Copier::new(src.path(), dst.path(), quick_options(), FileFilter::allow_all(), None)
			.unwrap();
	first.copy_files().await.unwrap();
	assert_eq!(first.stats().files_copied(), 2);

	// Grow one file; the size difference alone must trigger the re-copy
	create_test_file(&src, "changing.txt", &vec![3u8; 200]);

	let second =
		Copier::new(src.path(), dst.path(), quick_options(), FileFilter::allow_all(), None)
			.unwrap();
	second.copy_files().await.unwrap();

	assert_eq!(second.stats().files_copied(), 1);
	assert_eq!(second.stats().files_skipped(), 1);
	assert_eq!(fs::read(dst.path().join("changing.txt")).unwrap(), vec![3u8; 200]);
}

#[tokio::test]
async fn test_touched_file_is_recopied() {
	let src = TempDir::new().unwrap();
	let dst = TempDir::new().unwrap();

	let touched = create_test_file(&src, "touched.txt", &vec![9u8; 100]);
	create_test_file(&src, "untouched.txt", &vec![9u8; 100]);

	let first =
		Copier::new(src.path(), dst.path(), quick_options(), FileFilter::allow_all(), None)
			.unwrap();
	first.copy_files().await.unwrap();

	// Same size, newer mtime: the timestamp alone must trigger the re-copy
	let old_mtime = fs::metadata(&touched).unwrap().modified().unwrap();
	let bumped = filetime::FileTime::from_system_time(old_mtime + Duration::from_secs(10));
	filetime::set_file_mtime(&touched, bumped).unwrap();

	let second =
		Copier::new(src.path(), dst.path(), quick_options(), FileFilter::allow_all(), None)
			.unwrap();
	second.copy_files().await.unwrap();

	assert_eq!(second.stats().files_copied(), 1);
	assert_eq!(second.stats().files_skipped(), 1);
}

#[tokio::test]
async fn test_retry_then_succeed() {
	let src = TempDir::new().unwrap();
	let dst = TempDir::new().unwrap();
	let state = TempDir::new().unwrap();

	create_test_file(&src, "wanted.bin", &vec![0xAB; 1024 * 1024]);

	// A directory squatting on the destination path makes the first
	// attempt(s) fail; removing it lets a retry succeed.
	let obstruction = dst.path().join("wanted.bin");
	fs::create_dir_all(&obstruction).unwrap();
	let unblock = tokio::spawn(async move {
		tokio::time::sleep(Duration::from_millis(30)).await;
		let _ = fs::remove_dir(&obstruction);
	});

	let db = open_db(&state, SyncMode::Normal);
	let options = CopyOptions { max_retries: 10, retry_delay_ms: 20, ..quick_options() };
	let copier = Copier::new(
		src.path(),
		dst.path(),
		options,
		FileFilter::allow_all(),
		Some(Arc::clone(&db)),
	)
	.unwrap();

	copier.copy_files().await.unwrap();
	unblock.await.unwrap();

	let record = db.get_file("wanted.bin").unwrap();
	assert_eq!(record.status, FileStatus::Success);
	assert_eq!(record.fail_count, 0);
	assert_eq!(copier.stats().files_copied(), 1);
	assert_eq!(fs::read(dst.path().join("wanted.bin")).unwrap(), vec![0xAB; 1024 * 1024]);
}

#[tokio::test]
async fn test_exhausted_retries_accumulate_fail_count() {
	let src = TempDir::new().unwrap();
	let dst = TempDir::new().unwrap();
	let state = TempDir::new().unwrap();

	create_test_file(&src, "doomed.txt", b"never arrives");
	// Permanent obstruction: a non-empty directory under the target name
	create_test_file(&dst, "doomed.txt/occupied", b"x");

	let db = open_db(&state, SyncMode::Normal);

	for expected_fail_count in 1..=2u32 {
		let options = CopyOptions { max_retries: 2, retry_delay_ms: 5, ..quick_options() };
		let copier = Copier::new(
			src.path(),
			dst.path(),
			options,
			FileFilter::allow_all(),
			Some(Arc::clone(&db)),
		)
		.unwrap();

		assert!(matches!(
			copier.copy_files().await,
			Err(CopyError::PartialFailure { failed: 1 })
		));

		let record = db.get_file("doomed.txt").unwrap();
		assert_eq!(record.status, FileStatus::Failed);
		assert_eq!(record.fail_count, expected_fail_count);
		assert!(!record.last_error.is_empty());
	}
}

#[tokio::test]
async fn test_cancel_before_run_copies_nothing() {
	let src = TempDir::new().unwrap();
	let dst = TempDir::new().unwrap();

	create_test_file(&src, "a.txt", b"aaa");
	create_test_file(&src, "b.txt", b"bbb");

	let copier =
		Copier::new(src.path(), dst.path(), quick_options(), FileFilter::allow_all(), None)
			.unwrap();
	copier.cancel();

	assert!(matches!(copier.copy_files().await, Err(CopyError::Cancelled)));
	assert_eq!(copier.stats().files_copied(), 0);
	assert!(!dst.path().join("a.txt").exists());
	assert!(!dst.path().join("b.txt").exists());
}

#[tokio::test]
async fn test_cancellation_during_large_copy() {
	let src = TempDir::new().unwrap();
	let dst = TempDir::new().unwrap();
	let state = TempDir::new().unwrap();

	// A small buffer exaggerates the number of cancellation checkpoints
	create_test_file(&src, "large.bin", &vec![0x42; 64 * 1024 * 1024]);

	let db = open_db(&state, SyncMode::Normal);
	let options = CopyOptions { buffer_size: 1024, ..quick_options() };
	let copier = Copier::new(
		src.path(),
		dst.path(),
		options,
		FileFilter::allow_all(),
		Some(Arc::clone(&db)),
	)
	.unwrap();
	copier.set_timeout(Duration::from_millis(50));

	assert!(matches!(copier.copy_files().await, Err(CopyError::Cancelled)));

	// The interrupted file must never be recorded as a success
	if let Ok(record) = db.get_file("large.bin") {
		assert_ne!(record.status, FileStatus::Success);
		assert_ne!(record.status, FileStatus::Verified);
	}
	let session = db.get_session(1).unwrap();
	assert_eq!(session.copied_count, 0);
}

#[tokio::test]
async fn test_copy_and_verify_records_hashes() {
	let src = TempDir::new().unwrap();
	let dst = TempDir::new().unwrap();
	let state = TempDir::new().unwrap();

	create_test_file(&src, "data.bin", &vec![7u8; 4096]);

	let db = open_db(&state, SyncMode::Normal);
	let options = CopyOptions {
		mode: CopyMode::CopyAndVerify,
		hash_algorithm: "md5".to_string(),
		..quick_options()
	};
	let copier = Copier::new(
		src.path(),
		dst.path(),
		options,
		FileFilter::allow_all(),
		Some(Arc::clone(&db)),
	)
	.unwrap();

	copier.copy_files().await.unwrap();

	let record = db.get_file("data.bin").unwrap();
	assert_eq!(record.status, FileStatus::Verified);
	assert!(!record.source_hash.is_empty());
	assert_eq!(record.source_hash, record.dest_hash);

	let hasher = FileHasher::new(HashAlgorithm::Md5, 0);
	assert_eq!(record.source_hash, hasher.hash_file(&src.path().join("data.bin")).unwrap());
}

#[tokio::test]
async fn test_no_overwrite_skips_existing() {
	let src = TempDir::new().unwrap();
	let dst = TempDir::new().unwrap();
	let state = TempDir::new().unwrap();

	create_test_file(&src, "keep.txt", b"new content");
	create_test_file(&dst, "keep.txt", b"old content, longer than source");

	let db = open_db(&state, SyncMode::Normal);
	let options = CopyOptions { overwrite_existing: false, ..quick_options() };
	let copier = Copier::new(
		src.path(),
		dst.path(),
		options,
		FileFilter::allow_all(),
		Some(Arc::clone(&db)),
	)
	.unwrap();

	copier.copy_files().await.unwrap();

	assert_eq!(copier.stats().files_skipped(), 1);
	assert_eq!(fs::read(dst.path().join("keep.txt")).unwrap(), b"old content, longer than source");
	let record = db.get_file("keep.txt").unwrap();
	assert_eq!(record.status, FileStatus::Skipped);
	assert_eq!(record.last_error, "destination exists");
}

#[tokio::test]
async fn test_incremental_mode_revisits_mismatch() {
	let src = TempDir::new().unwrap();
	let dst = TempDir::new().unwrap();
	let state = TempDir::new().unwrap();
	let db_path = state.path().join("sync.db");

	create_test_file(&src, "flaky.txt", b"good content");

	{
		let db = Arc::new(SyncDb::open(&db_path, SyncMode::Normal).unwrap());
		let copier = Copier::new(
			src.path(),
			dst.path(),
			quick_options(),
			FileFilter::allow_all(),
			Some(Arc::clone(&db)),
		)
		.unwrap();
		copier.copy_files().await.unwrap();

		// Pretend an earlier verification flagged the file
		db.update_status("flaky.txt", FileStatus::Mismatch, Some("hash mismatch")).unwrap();
	}

	// A Normal rerun would skip on identical metadata; Incremental re-copies
	let db = Arc::new(SyncDb::open(&db_path, SyncMode::Incremental).unwrap());
	let copier = Copier::new(
		src.path(),
		dst.path(),
		quick_options(),
		FileFilter::allow_all(),
		Some(Arc::clone(&db)),
	)
	.unwrap();
	copier.copy_files().await.unwrap();

	assert_eq!(copier.stats().files_copied(), 1);
	assert_eq!(db.get_file("flaky.txt").unwrap().status, FileStatus::Success);
}

#[tokio::test]
async fn test_session_bookkeeping_matches_stats() {
	let src = TempDir::new().unwrap();
	let dst = TempDir::new().unwrap();
	let state = TempDir::new().unwrap();

	create_test_file(&src, "one.txt", &vec![1u8; 300]);
	create_test_file(&src, "two.txt", &vec![2u8; 700]);
	create_test_file(&src, "skip.tmp", &vec![3u8; 100]);

	let db = open_db(&state, SyncMode::Normal);
	let copier = Copier::new(
		src.path(),
		dst.path(),
		quick_options(),
		FileFilter::new("", "*.tmp"),
		Some(Arc::clone(&db)),
	)
	.unwrap();
	copier.copy_files().await.unwrap();

	let stats = copier.stats();
	let session = db.get_session(1).unwrap();
	assert_eq!(session.copied_count, stats.files_copied());
	assert_eq!(session.skipped_count, stats.files_skipped());
	assert_eq!(session.failed_count, stats.files_failed());
	assert_eq!(session.bytes_copied, stats.bytes_copied());
	assert_eq!(session.bytes_copied, 1000);
	assert!(session.ended_at >= session.started_at);
}

#[tokio::test]
async fn test_single_file_source() {
	let src = TempDir::new().unwrap();
	let dst = TempDir::new().unwrap();

	let file = create_test_file(&src, "lonely.txt", b"just me");
	let dst_root = dst.path().join("target");

	let copier =
		Copier::new(&file, &dst_root, quick_options(), FileFilter::allow_all(), None).unwrap();
	copier.copy_files().await.unwrap();

	assert_eq!(copier.stats().files_copied(), 1);
	assert_eq!(fs::read(dst_root.join("lonely.txt")).unwrap(), b"just me");
}

#[tokio::test]
async fn test_missing_source_is_fatal() {
	let dst = TempDir::new().unwrap();
	let copier = Copier::new(
		"/nonexistent/source/tree",
		dst.path(),
		quick_options(),
		FileFilter::allow_all(),
		None,
	)
	.unwrap();

	assert!(matches!(copier.copy_files().await, Err(CopyError::SourceMissing { .. })));
}

#[tokio::test]
async fn test_empty_file_round_trip() {
	let src = TempDir::new().unwrap();
	let dst = TempDir::new().unwrap();

	create_test_file(&src, "empty.dat", b"");

	let copier =
		Copier::new(src.path(), dst.path(), quick_options(), FileFilter::allow_all(), None)
			.unwrap();
	copier.copy_files().await.unwrap();

	let out = dst.path().join("empty.dat");
	assert!(out.exists());
	assert_eq!(fs::metadata(&out).unwrap().len(), 0);

	let hasher = FileHasher::new(HashAlgorithm::Sha256, 0);
	assert_eq!(
		hasher.hash_file(&out).unwrap(),
		"e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
	);

	assert_eq!(copier.stats().files_copied(), 1);
	assert_eq!(copier.stats().bytes_copied(), 0);
}

#[tokio::test]
async fn test_progress_callback_fires() {
	use std::sync::atomic::{AtomicU64, Ordering};

	let src = TempDir::new().unwrap();
	let dst = TempDir::new().unwrap();

	for i in 0..20 {
		create_test_file(&src, &format!("file-{}.txt", i), &vec![0u8; 10_000]);
	}

	let options = CopyOptions { progress_interval_ms: 10, ..quick_options() };
	let copier =
		Copier::new(src.path(), dst.path(), options, FileFilter::allow_all(), None).unwrap();

	let calls = Arc::new(AtomicU64::new(0));
	let last_current = Arc::new(AtomicU64::new(0));
	let last_total = Arc::new(AtomicU64::new(0));
	let (calls2, current2, total2) =
		(Arc::clone(&calls), Arc::clone(&last_current), Arc::clone(&last_total));
	copier.set_progress_callback(Box::new(move |current: u64, total: u64, _path: &str| {
		calls2.fetch_add(1, Ordering::SeqCst);
		current2.store(current, Ordering::SeqCst);
		total2.store(total, Ordering::SeqCst);
	}));

	copier.copy_files().await.unwrap();

	assert!(calls.load(Ordering::SeqCst) > 0);
	// The final callback after the drain reports a finished run
	assert_eq!(last_current.load(Ordering::SeqCst), 20);
	assert_eq!(last_total.load(Ordering::SeqCst), 20);
}

#[tokio::test]
async fn test_progress_counts_filtered_files_in_total() {
	use std::sync::Mutex;

	let src = TempDir::new().unwrap();
	let dst = TempDir::new().unwrap();

	// Half the tree is rejected by the filter; the rejected files must
	// still appear in the progress denominator
	for i in 0..10 {
		create_test_file(&src, &format!("keep-{}.txt", i), &vec![0u8; 20_000]);
		create_test_file(&src, &format!("drop-{}.tmp", i), &vec![0u8; 20_000]);
	}

	let options = CopyOptions { progress_interval_ms: 10, ..quick_options() };
	let copier = Copier::new(
		src.path(),
		dst.path(),
		options,
		FileFilter::new("", "*.tmp"),
		None,
	)
	.unwrap();

	let seen = Arc::new(Mutex::new(Vec::<(u64, u64)>::new()));
	let seen2 = Arc::clone(&seen);
	copier.set_progress_callback(Box::new(move |current: u64, total: u64, _path: &str| {
		seen2.lock().unwrap().push((current, total));
	}));

	copier.copy_files().await.unwrap();

	assert_eq!(copier.stats().files_copied(), 10);
	assert_eq!(copier.stats().files_skipped(), 10);

	let seen = seen.lock().unwrap();
	assert!(!seen.is_empty());
	for &(current, total) in seen.iter() {
		assert!(current <= total, "progress overran its total: {}/{}", current, total);
	}
	// The final callback after the drain reports a finished run
	assert_eq!(*seen.last().unwrap(), (20, 20));
}

#[tokio::test]
async fn test_recursive_disabled_stays_flat() {
	let src = TempDir::new().unwrap();
	let dst = TempDir::new().unwrap();

	create_test_file(&src, "top.txt", b"top");
	create_test_file(&src, "sub/nested.txt", b"nested");

	let options = CopyOptions { recursive: false, ..quick_options() };
	let copier =
		Copier::new(src.path(), dst.path(), options, FileFilter::allow_all(), None).unwrap();
	copier.copy_files().await.unwrap();

	assert_eq!(copier.stats().files_copied(), 1);
	assert!(dst.path().join("top.txt").exists());
	assert!(!dst.path().join("sub").exists());
}

// vim: ts=4
