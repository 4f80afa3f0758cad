//! Atomic run counters shared by the copier workers

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Counters for one copy/verify run
///
/// Increments are atomic; reads are snapshots and not guaranteed consistent
/// across fields while workers are running.
#[derive(Debug, Default)]
pub struct CopyStats {
	files_copied: AtomicU64,
	files_skipped: AtomicU64,
	files_failed: AtomicU64,
	bytes_copied: AtomicU64,
	bytes_skipped: AtomicU64,

	// Held only by reset(), so a zeroing pass is not interleaved with
	// another reset. Workers must be quiesced before calling reset().
	reset_lock: Mutex<()>,
}

impl CopyStats {
	pub fn new() -> Self {
		CopyStats::default()
	}

	pub fn add_copied(&self, bytes: u64) {
		self.files_copied.fetch_add(1, Ordering::Relaxed);
		self.bytes_copied.fetch_add(bytes, Ordering::Relaxed);
	}

	pub fn add_skipped(&self, bytes: u64) {
		self.files_skipped.fetch_add(1, Ordering::Relaxed);
		self.bytes_skipped.fetch_add(bytes, Ordering::Relaxed);
	}

	pub fn add_failed(&self) {
		self.files_failed.fetch_add(1, Ordering::Relaxed);
	}

	pub fn files_copied(&self) -> u64 {
		self.files_copied.load(Ordering::Relaxed)
	}

	pub fn files_skipped(&self) -> u64 {
		self.files_skipped.load(Ordering::Relaxed)
	}

	pub fn files_failed(&self) -> u64 {
		self.files_failed.load(Ordering::Relaxed)
	}

	pub fn bytes_copied(&self) -> u64 {
		self.bytes_copied.load(Ordering::Relaxed)
	}

	pub fn bytes_skipped(&self) -> u64 {
		self.bytes_skipped.load(Ordering::Relaxed)
	}

	/// Files seen so far, regardless of outcome
	pub fn total_files(&self) -> u64 {
		self.files_copied() + self.files_skipped() + self.files_failed()
	}

	pub fn total_bytes(&self) -> u64 {
		self.bytes_copied() + self.bytes_skipped()
	}

	/// Fraction of seen files that did not fail, 0.0 when nothing seen yet
	pub fn progress_ratio(&self) -> f64 {
		let total = self.total_files();
		if total == 0 {
			return 0.0;
		}
		(self.files_copied() + self.files_skipped()) as f64 / total as f64
	}

	/// Zero all counters. Increments racing a reset may be lost.
	pub fn reset(&self) {
		let _guard = self.reset_lock.lock().unwrap_or_else(|e| e.into_inner());
		self.files_copied.store(0, Ordering::Relaxed);
		self.files_skipped.store(0, Ordering::Relaxed);
		self.files_failed.store(0, Ordering::Relaxed);
		self.bytes_copied.store(0, Ordering::Relaxed);
		self.bytes_skipped.store(0, Ordering::Relaxed);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::Arc;

	#[test]
	fn test_counters_accumulate() {
		let stats = CopyStats::new();
		stats.add_copied(100);
		stats.add_copied(50);
		stats.add_skipped(10);
		stats.add_failed();

		assert_eq!(stats.files_copied(), 2);
		assert_eq!(stats.files_skipped(), 1);
		assert_eq!(stats.files_failed(), 1);
		assert_eq!(stats.bytes_copied(), 150);
		assert_eq!(stats.bytes_skipped(), 10);
		assert_eq!(stats.total_files(), 4);
		assert_eq!(stats.total_bytes(), 160);
	}

	#[test]
	fn test_progress_ratio_empty() {
		let stats = CopyStats::new();
		assert_eq!(stats.progress_ratio(), 0.0);
	}

	#[test]
	fn test_progress_ratio() {
		let stats = CopyStats::new();
		stats.add_copied(1);
		stats.add_skipped(1);
		stats.add_failed();
		stats.add_failed();
		assert!((stats.progress_ratio() - 0.5).abs() < f64::EPSILON);
	}

	#[test]
	fn test_reset_zeroes_everything() {
		let stats = CopyStats::new();
		stats.add_copied(123);
		stats.add_failed();
		stats.reset();
		assert_eq!(stats.total_files(), 0);
		assert_eq!(stats.total_bytes(), 0);
	}

	#[test]
	fn test_concurrent_increments() {
		let stats = Arc::new(CopyStats::new());
		let mut handles = Vec::new();
		for _ in 0..8 {
			let stats = Arc::clone(&stats);
			handles.push(std::thread::spawn(move || {
				for _ in 0..1000 {
					stats.add_copied(1);
				}
			}));
		}
		for h in handles {
			h.join().unwrap();
		}
		assert_eq!(stats.files_copied(), 8000);
		assert_eq!(stats.bytes_copied(), 8000);
	}
}

// vim: ts=4
