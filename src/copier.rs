//! The copy/verify pipeline
//!
//! One traversal task walks the source tree and hands every included file to
//! a semaphore-bounded worker pool. Workers decide per file whether to copy,
//! skip or verify, retry transient I/O failures, keep the shared counters and
//! the sync database current, and publish the file they are working on to the
//! progress reporter. A single shared cancellation flag is observed at every
//! worker entry and at every buffer boundary of the byte copy.

use futures::future::join_all;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::fs as afs;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::config::CopyOptions;
use crate::db::SyncDb;
use crate::error::CopyError;
use crate::filter::FileFilter;
use crate::hasher::FileHasher;
use crate::logging::*;
use crate::progress::ProgressCallback;
use crate::stats::CopyStats;
use crate::types::{mtime_unix, now_unix, CopyMode, FileRecord, FileStatus, SyncMode};

/// Shared cooperative cancellation flag
///
/// `cancel()` is idempotent. Once set, every checkpoint returns a
/// `Cancelled` error without starting further I/O.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
	pub fn new() -> Self {
		CancelFlag::default()
	}

	pub fn cancel(&self) {
		self.0.store(true, Ordering::SeqCst);
	}

	pub fn is_cancelled(&self) -> bool {
		self.0.load(Ordering::SeqCst)
	}

	fn check(&self) -> Result<(), CopyError> {
		if self.is_cancelled() {
			Err(CopyError::Cancelled)
		} else {
			Ok(())
		}
	}
}

/// One unit of worker work
#[derive(Debug, Clone)]
struct Job {
	/// Forward-slash path relative to the source root
	rel: String,
	src: PathBuf,
	dst: PathBuf,
	size: u64,
	mtime: i64,
}

/// Everything a worker needs, shared across the pool
struct WorkerCtx {
	options: CopyOptions,
	hasher: FileHasher,
	stats: Arc<CopyStats>,
	db: Option<Arc<SyncDb>>,
	cancel: CancelFlag,
	current_tx: mpsc::Sender<String>,
}

/// Directory synchronization engine
pub struct Copier {
	src_root: PathBuf,
	dst_root: PathBuf,
	options: CopyOptions,
	filter: FileFilter,
	hasher: FileHasher,
	stats: Arc<CopyStats>,
	db: Option<Arc<SyncDb>>,
	cancel: CancelFlag,
	timeout: Mutex<Option<Duration>>,
	progress: Mutex<Option<Arc<dyn ProgressCallback>>>,
}

impl Copier {
	/// Build a copier; options are validated here
	pub fn new(
		src_root: impl Into<PathBuf>,
		dst_root: impl Into<PathBuf>,
		options: CopyOptions,
		filter: FileFilter,
		db: Option<Arc<SyncDb>>,
	) -> Result<Self, CopyError> {
		options.validate()?;
		let hasher = FileHasher::new(options.algorithm()?, options.buffer_size);

		Ok(Copier {
			src_root: src_root.into(),
			dst_root: dst_root.into(),
			options,
			filter,
			hasher,
			stats: Arc::new(CopyStats::new()),
			db,
			cancel: CancelFlag::new(),
			timeout: Mutex::new(None),
			progress: Mutex::new(None),
		})
	}

	/// Shared counters for this run
	pub fn stats(&self) -> Arc<CopyStats> {
		Arc::clone(&self.stats)
	}

	/// Signal all in-flight work to abort at its next checkpoint
	pub fn cancel(&self) {
		self.cancel.cancel();
	}

	/// Handle to the cancellation flag, for signal handlers and timers
	pub fn cancel_token(&self) -> CancelFlag {
		self.cancel.clone()
	}

	/// Arm a deadline after which cancellation fires
	pub fn set_timeout(&self, dur: Duration) {
		*self.timeout.lock().unwrap_or_else(|e| e.into_inner()) = Some(dur);
	}

	/// Register a progress sink, invoked no more often than the configured
	/// progress interval
	pub fn set_progress_callback(&self, cb: Box<dyn ProgressCallback>) {
		*self.progress.lock().unwrap_or_else(|e| e.into_inner()) = Some(Arc::from(cb));
	}

	/// Run the pipeline to completion or first fatal error
	pub async fn copy_files(&self) -> Result<(), CopyError> {
		let src_meta = afs::metadata(&self.src_root)
			.await
			.map_err(|_| CopyError::SourceMissing { path: self.src_root.clone() })?;

		let timeout_task = self.arm_timeout();

		let session = match &self.db {
			Some(db) => Some(db.start_session()?),
			None => None,
		};

		let (current_tx, current_rx) = mpsc::channel::<String>(16);
		let discovered = Arc::new(AtomicU64::new(0));
		let reporter = self.spawn_reporter(current_rx, &discovered);

		let ctx = Arc::new(WorkerCtx {
			options: self.options.clone(),
			hasher: self.hasher.clone(),
			stats: Arc::clone(&self.stats),
			db: self.db.clone(),
			cancel: self.cancel.clone(),
			current_tx,
		});

		let semaphore = Arc::new(Semaphore::new(self.options.max_concurrent));
		let mut handles: Vec<JoinHandle<()>> = Vec::new();

		let walk_result = if src_meta.is_file() {
			self.submit_single_file(&src_meta, &ctx, &semaphore, &discovered, &mut handles).await
		} else {
			let prepared = self.prepare_dest_root().await;
			match prepared {
				Ok(()) => {
					self.walk_dir(&self.src_root, &ctx, &semaphore, &discovered, &mut handles)
						.await
				}
				Err(e) => Err(e),
			}
		};

		if let Err(ref e) = walk_result {
			// A fatal walk error stops the whole run; workers notice the flag
			if !matches!(e, CopyError::Cancelled) {
				error!("Walk aborted: {}", e);
			}
			self.cancel.cancel();
		}

		// Wait for every dispatched worker
		for joined in join_all(handles).await {
			if let Err(e) = joined {
				error!("Worker task failed: {}", e);
				self.stats.add_failed();
			}
		}

		if let Some(reporter) = reporter {
			reporter.abort();
		}
		if let Some(timeout_task) = timeout_task {
			timeout_task.abort();
		}
		self.final_progress(&discovered);

		if let (Some(db), Some(id)) = (&self.db, session) {
			if let Err(e) = db.end_session(
				id,
				self.stats.files_copied(),
				self.stats.files_skipped(),
				self.stats.files_failed(),
				self.stats.bytes_copied(),
			) {
				error!("Failed to close session {}: {}", id, e);
			}
		}

		self.finish(walk_result)
	}

	/// Translate the end-of-run state into the public result
	fn finish(&self, walk_result: Result<(), CopyError>) -> Result<(), CopyError> {
		let copied = self.stats.files_copied();
		let skipped = self.stats.files_skipped();
		let failed = self.stats.files_failed();
		let bytes = self.stats.bytes_copied();

		if self.cancel.is_cancelled() {
			info!(
				"copied={} skipped={} failed={} bytes={} cancelled",
				copied, skipped, failed, bytes
			);
			// A fatal error that triggered the cancellation wins over it
			match walk_result {
				Err(e) if !matches!(e, CopyError::Cancelled) => return Err(e),
				_ => return Err(CopyError::Cancelled),
			}
		}

		walk_result?;
		info!("copied={} skipped={} failed={} bytes={}", copied, skipped, failed, bytes);

		if failed > 0 {
			Err(CopyError::PartialFailure { failed })
		} else {
			Ok(())
		}
	}

	fn arm_timeout(&self) -> Option<JoinHandle<()>> {
		let dur = (*self.timeout.lock().unwrap_or_else(|e| e.into_inner()))?;
		let cancel = self.cancel.clone();
		Some(tokio::spawn(async move {
			tokio::time::sleep(dur).await;
			warn!("Timeout after {:?}, cancelling", dur);
			cancel.cancel();
		}))
	}

	fn spawn_reporter(
		&self,
		mut current_rx: mpsc::Receiver<String>,
		discovered: &Arc<AtomicU64>,
	) -> Option<JoinHandle<()>> {
		let cb = self.progress.lock().unwrap_or_else(|e| e.into_inner()).clone()?;
		let stats = Arc::clone(&self.stats);
		let discovered = Arc::clone(discovered);
		let interval = self.options.progress_interval();

		Some(tokio::spawn(async move {
			let mut ticker = tokio::time::interval(interval);
			ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
			let mut current_path = String::new();
			loop {
				ticker.tick().await;
				// Keep only the most recent published file name
				while let Ok(path) = current_rx.try_recv() {
					current_path = path;
				}
				cb.on_progress(
					stats.files_copied() + stats.files_skipped(),
					discovered.load(Ordering::Relaxed),
					&current_path,
				);
			}
		}))
	}

	/// One last callback after the drain so clean runs end at current == total
	fn final_progress(&self, discovered: &Arc<AtomicU64>) {
		if let Some(cb) = self.progress.lock().unwrap_or_else(|e| e.into_inner()).clone() {
			cb.on_progress(
				self.stats.files_copied() + self.stats.files_skipped(),
				discovered.load(Ordering::Relaxed),
				"",
			);
		}
	}

	async fn prepare_dest_root(&self) -> Result<(), CopyError> {
		if self.options.mode == CopyMode::Verify {
			return Ok(());
		}
		if self.options.create_dirs {
			afs::create_dir_all(&self.dst_root).await.map_err(|e| CopyError::DestUncreatable {
				path: self.dst_root.clone(),
				source: e,
			})?;
		}
		Ok(())
	}

	async fn submit_single_file(
		&self,
		meta: &std::fs::Metadata,
		ctx: &Arc<WorkerCtx>,
		semaphore: &Arc<Semaphore>,
		discovered: &Arc<AtomicU64>,
		handles: &mut Vec<JoinHandle<()>>,
	) -> Result<(), CopyError> {
		let name = self
			.src_root
			.file_name()
			.ok_or_else(|| CopyError::PathTranslation { path: self.src_root.clone() })?;

		self.prepare_dest_root().await?;
		discovered.fetch_add(1, Ordering::Relaxed);

		let job = Job {
			rel: name.to_string_lossy().into_owned(),
			src: self.src_root.clone(),
			dst: self.dst_root.join(name),
			size: meta.len(),
			mtime: mtime_unix(meta),
		};
		self.dispatch(job, ctx, semaphore, handles).await
	}

	/// Depth-first traversal feeding the worker pool
	///
	/// Per-entry failures are logged and skipped; only an uncreatable mirror
	/// directory or cancellation aborts the walk.
	fn walk_dir<'a>(
		&'a self,
		dir: &'a Path,
		ctx: &'a Arc<WorkerCtx>,
		semaphore: &'a Arc<Semaphore>,
		discovered: &'a Arc<AtomicU64>,
		handles: &'a mut Vec<JoinHandle<()>>,
	) -> Pin<Box<dyn std::future::Future<Output = Result<(), CopyError>> + 'a>> {
		Box::pin(async move {
			self.cancel.check()?;

			let mut entries = match afs::read_dir(dir).await {
				Ok(e) => e,
				Err(e) => {
					warn!("Cannot read directory {}: {}", dir.display(), e);
					return Ok(());
				}
			};

			loop {
				self.cancel.check()?;

				let entry = match entries.next_entry().await {
					Ok(Some(e)) => e,
					Ok(None) => break,
					Err(e) => {
						warn!("Error reading entry in {}: {}", dir.display(), e);
						break;
					}
				};

				let path = entry.path();
				let rel = match path.strip_prefix(&self.src_root) {
					Ok(r) => r.to_path_buf(),
					Err(_) => return Err(CopyError::PathTranslation { path }),
				};

				// Follows symlinks, so a link to a file copies its target bytes
				let meta = match afs::metadata(&path).await {
					Ok(m) => m,
					Err(e) => {
						warn!("Cannot access {}: {}", path.display(), e);
						continue;
					}
				};

				if meta.is_dir() {
					if !self.options.recursive {
						continue;
					}
					if self.options.create_dirs && self.options.mode != CopyMode::Verify {
						let mirror = self.dst_root.join(&rel);
						afs::create_dir_all(&mirror).await.map_err(|e| {
							CopyError::DestUncreatable { path: mirror.clone(), source: e }
						})?;
					}
					self.walk_dir(&path, ctx, semaphore, discovered, handles).await?;
				} else if meta.is_file() {
					let rel_key = rel_string(&rel);
					// Every walked file counts toward the progress total,
					// including the ones the filter is about to reject
					discovered.fetch_add(1, Ordering::Relaxed);

					if !self.filter.should_include(&path) {
						debug!("Filtered out {}", rel_key);
						self.stats.add_skipped(meta.len());
						if let Some(db) = &ctx.db {
							if let Err(e) =
								db.update_status(&rel_key, FileStatus::Skipped, Some("filter"))
							{
								warn!("Failed to record skip for {}: {}", rel_key, e);
							}
						}
						continue;
					}

					let job = Job {
						rel: rel_key,
						src: path,
						dst: self.dst_root.join(&rel),
						size: meta.len(),
						mtime: mtime_unix(&meta),
					};
					self.dispatch(job, ctx, semaphore, handles).await?;
				}
			}

			Ok(())
		})
	}

	/// Acquire a pool slot (blocking the walk when the pool is full) and
	/// spawn the per-file worker
	async fn dispatch(
		&self,
		job: Job,
		ctx: &Arc<WorkerCtx>,
		semaphore: &Arc<Semaphore>,
		handles: &mut Vec<JoinHandle<()>>,
	) -> Result<(), CopyError> {
		let permit = match Arc::clone(semaphore).acquire_owned().await {
			Ok(p) => p,
			Err(_) => return Err(CopyError::Cancelled),
		};

		let ctx = Arc::clone(ctx);
		handles.push(tokio::spawn(async move {
			let _permit = permit;
			process_file(ctx, job).await;
		}));
		Ok(())
	}
}

/// Worker entry point. Every outcome is absorbed into stats and the database;
/// nothing propagates out of the task.
async fn process_file(ctx: Arc<WorkerCtx>, job: Job) {
	// Once cancellation is set no file newly begins processing
	if ctx.cancel.is_cancelled() {
		return;
	}

	// Non-blocking publish; a full channel just means a stale progress line
	let _ = ctx.current_tx.try_send(job.rel.clone());

	let result = match ctx.options.mode {
		CopyMode::Verify => verify_action(&ctx, &job).await,
		CopyMode::Copy | CopyMode::CopyAndVerify => copy_action(&ctx, &job).await,
	};

	match result {
		Ok(()) => {}
		Err(CopyError::Cancelled) => {
			debug!("Cancelled while processing {}", job.rel);
		}
		Err(e) => {
			// Unexpected internal error: one Failed record, counted once
			error!("Internal error processing {}: {}", job.rel, e);
			ctx.stats.add_failed();
			write_record(&ctx, &job, FileStatus::Failed, &e.to_string(), None, None);
		}
	}
}

/// Hash-compare source against destination without writing anything
async fn verify_action(ctx: &WorkerCtx, job: &Job) -> Result<(), CopyError> {
	ctx.cancel.check()?;

	if afs::metadata(&job.dst).await.is_err() {
		warn!("{}: destination missing", job.rel);
		ctx.stats.add_failed();
		write_record(ctx, job, FileStatus::Mismatch, "destination missing", None, None);
		return Ok(());
	}

	match hash_pair(ctx, job) {
		Ok((src_hash, dst_hash)) => {
			if src_hash == dst_hash {
				debug!("{}: verified", job.rel);
				ctx.stats.add_skipped(job.size);
				write_record(ctx, job, FileStatus::Verified, "", Some(&src_hash), Some(&dst_hash));
			} else {
				warn!("{}: hash mismatch", job.rel);
				ctx.stats.add_failed();
				write_record(
					ctx,
					job,
					FileStatus::Mismatch,
					"hash mismatch",
					Some(&src_hash),
					Some(&dst_hash),
				);
			}
		}
		Err(e) => {
			warn!("{}: {}", job.rel, e);
			ctx.stats.add_failed();
			write_record(ctx, job, FileStatus::Failed, &e.to_string(), None, None);
		}
	}

	Ok(())
}

/// Copy/skip decision and execution for one file
async fn copy_action(ctx: &WorkerCtx, job: &Job) -> Result<(), CopyError> {
	ctx.cancel.check()?;

	let dst_meta = afs::metadata(&job.dst).await.ok();

	if let Some(dst_meta) = &dst_meta {
		if !ctx.options.overwrite_existing {
			debug!("{}: destination exists, not overwriting", job.rel);
			ctx.stats.add_skipped(job.size);
			write_record(ctx, job, FileStatus::Skipped, "destination exists", None, None);
			return Ok(());
		}

		let identical = dst_meta.len() == job.size && mtime_unix(dst_meta) == job.mtime;
		if identical && !wants_revisit(ctx, job) {
			return skip_identical(ctx, job).await;
		}
	}

	copy_with_retries(ctx, job).await
}

/// Incremental runs re-copy paths whose record failed within the bound even
/// when the destination metadata looks current
fn wants_revisit(ctx: &WorkerCtx, job: &Job) -> bool {
	let db = match &ctx.db {
		Some(db) => db,
		None => return false,
	};
	if db.mode() != SyncMode::Incremental {
		return false;
	}
	match db.get_file(&job.rel) {
		Ok(record) => {
			matches!(record.status, FileStatus::Failed | FileStatus::Mismatch)
				&& record.fail_count <= ctx.options.max_fail_count
		}
		Err(_) => false,
	}
}

/// Destination metadata matches the source; no bytes move
async fn skip_identical(ctx: &WorkerCtx, job: &Job) -> Result<(), CopyError> {
	if ctx.options.mode == CopyMode::CopyAndVerify {
		ctx.cancel.check()?;
		match hash_pair(ctx, job) {
			Ok((src_hash, dst_hash)) => {
				if src_hash == dst_hash {
					debug!("{}: identical metadata, verified", job.rel);
					ctx.stats.add_skipped(job.size);
					write_record(
						ctx,
						job,
						FileStatus::Verified,
						"identical metadata",
						Some(&src_hash),
						Some(&dst_hash),
					);
				} else {
					warn!("{}: metadata identical but content differs", job.rel);
					ctx.stats.add_failed();
					write_record(
						ctx,
						job,
						FileStatus::Mismatch,
						"hash mismatch",
						Some(&src_hash),
						Some(&dst_hash),
					);
				}
				return Ok(());
			}
			Err(e) => {
				warn!("{}: {}", job.rel, e);
				ctx.stats.add_failed();
				write_record(ctx, job, FileStatus::Failed, &e.to_string(), None, None);
				return Ok(());
			}
		}
	}

	debug!("{}: identical metadata, skipping", job.rel);
	ctx.stats.add_skipped(job.size);
	write_record(ctx, job, FileStatus::Skipped, "identical metadata", None, None);
	Ok(())
}

/// Copy with the retry loop, then post-copy verification when configured
async fn copy_with_retries(ctx: &WorkerCtx, job: &Job) -> Result<(), CopyError> {
	let attempts = ctx.options.max_retries + 1;
	let mut last_err = String::new();

	for attempt in 1..=attempts {
		ctx.cancel.check()?;

		match copy_bytes(ctx, job).await {
			Ok(()) => return finish_copy(ctx, job).await,
			Err(CopyError::Cancelled) => return Err(CopyError::Cancelled),
			Err(e) => {
				warn!("Attempt {}/{} failed for {}: {}", attempt, attempts, job.rel, e);
				last_err = e.to_string();
				if attempt < attempts {
					tokio::time::sleep(ctx.options.retry_delay()).await;
				}
			}
		}
	}

	ctx.stats.add_failed();
	write_record(ctx, job, FileStatus::Failed, &last_err, None, None);
	Ok(())
}

/// Stream the file contents, checking the cancellation flag at every buffer
/// boundary. On cancellation the partial destination file stays in place.
async fn copy_bytes(ctx: &WorkerCtx, job: &Job) -> Result<(), CopyError> {
	let mut src = afs::File::open(&job.src).await.map_err(CopyError::Io)?;
	let mut dst = afs::File::create(&job.dst).await.map_err(CopyError::Io)?;

	let mut buffer = vec![0u8; ctx.options.effective_buffer_size()];
	loop {
		ctx.cancel.check()?;
		let n = src.read(&mut buffer).await.map_err(CopyError::Io)?;
		if n == 0 {
			break;
		}
		dst.write_all(&buffer[..n]).await.map_err(CopyError::Io)?;
	}
	dst.flush().await.map_err(CopyError::Io)?;

	Ok(())
}

/// Bytes are on disk; preserve the mtime, then verify or record success
async fn finish_copy(ctx: &WorkerCtx, job: &Job) -> Result<(), CopyError> {
	if ctx.options.preserve_mod_time {
		let mtime = filetime::FileTime::from_unix_time(job.mtime, 0);
		if let Err(e) = filetime::set_file_mtime(&job.dst, mtime) {
			warn!("Cannot set mtime on {}: {}", job.dst.display(), e);
		}
	}

	let verify = ctx.options.mode == CopyMode::CopyAndVerify || ctx.options.verify_hash;
	if !verify {
		debug!("{}: copied {} bytes", job.rel, job.size);
		ctx.stats.add_copied(job.size);
		write_record(ctx, job, FileStatus::Success, "", None, None);
		return Ok(());
	}

	ctx.cancel.check()?;
	match hash_pair(ctx, job) {
		Ok((src_hash, dst_hash)) => {
			if src_hash == dst_hash {
				debug!("{}: copied and verified {} bytes", job.rel, job.size);
				ctx.stats.add_copied(job.size);
				write_record(ctx, job, FileStatus::Verified, "", Some(&src_hash), Some(&dst_hash));
			} else {
				warn!("{}: verification failed after copy", job.rel);
				ctx.stats.add_failed();
				write_record(
					ctx,
					job,
					FileStatus::Mismatch,
					"hash mismatch after copy",
					Some(&src_hash),
					Some(&dst_hash),
				);
			}
		}
		Err(e) => {
			warn!("{}: {}", job.rel, e);
			ctx.stats.add_failed();
			write_record(ctx, job, FileStatus::Failed, &e.to_string(), None, None);
		}
	}

	Ok(())
}

fn hash_pair(ctx: &WorkerCtx, job: &Job) -> Result<(String, String), crate::error::HashError> {
	let src_hash = ctx.hasher.hash_file(&job.src)?;
	let dst_hash = ctx.hasher.hash_file(&job.dst)?;
	Ok((src_hash, dst_hash))
}

/// Upsert the file's record with this session's outcome
///
/// Database write failures are logged; the copy outcome already stands and a
/// broken record must not fail the file a second time.
fn write_record(
	ctx: &WorkerCtx,
	job: &Job,
	status: FileStatus,
	err: &str,
	src_hash: Option<&str>,
	dst_hash: Option<&str>,
) {
	let db = match &ctx.db {
		Some(db) => db,
		None => return,
	};

	let mut record = match db.get_file(&job.rel) {
		Ok(r) => r,
		Err(_) => FileRecord::new(job.rel.clone(), job.size, job.mtime, status),
	};

	record.size = job.size;
	record.mod_time = job.mtime;
	record.status = status;
	record.last_error = err.to_string();
	record.last_sync_time = now_unix();
	if !matches!(status, FileStatus::Failed | FileStatus::Mismatch) {
		record.fail_count = 0;
	}
	if let Some(h) = src_hash {
		record.source_hash = h.to_string();
	}
	if let Some(h) = dst_hash {
		record.dest_hash = h.to_string();
	}

	if let Err(e) = db.add_file(&record) {
		warn!("Failed to record state for {}: {}", job.rel, e);
		return;
	}

	if matches!(status, FileStatus::Failed | FileStatus::Mismatch) {
		if let Err(e) = db.increment_fail_count(&job.rel) {
			warn!("Failed to bump fail count for {}: {}", job.rel, e);
		}
	}
}

/// Forward-slash form of a relative path
fn rel_string(rel: &Path) -> String {
	let parts: Vec<String> =
		rel.components().map(|c| c.as_os_str().to_string_lossy().into_owned()).collect();
	parts.join("/")
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_cancel_flag_is_idempotent_and_shared() {
		let flag = CancelFlag::new();
		let clone = flag.clone();
		assert!(!flag.is_cancelled());
		clone.cancel();
		clone.cancel();
		assert!(flag.is_cancelled());
		assert!(matches!(flag.check(), Err(CopyError::Cancelled)));
	}

	#[test]
	fn test_rel_string_is_forward_slash() {
		let rel = Path::new("a").join("b").join("c.txt");
		assert_eq!(rel_string(&rel), "a/b/c.txt");
	}
}

// vim: ts=4
