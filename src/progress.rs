//! Progress reporting contract between the copier and its callers

use std::io::Write;
use std::sync::Mutex;
use std::time::Instant;

/// Sink for throttled progress updates
///
/// `current` counts files copied or skipped so far, `total` is the running
/// count of discovered files and grows while the walk is still finding work.
/// The copier invokes the sink from its reporter task, never more often than
/// the configured progress interval.
pub trait ProgressCallback: Send + Sync {
	fn on_progress(&self, current: u64, total: u64, current_path: &str);
}

/// Closures work directly as callbacks
impl<T: Fn(u64, u64, &str) + Send + Sync> ProgressCallback for T {
	fn on_progress(&self, current: u64, total: u64, current_path: &str) {
		self(current, total, current_path)
	}
}

const PROGRESS_BAR_WIDTH: usize = 30;

/// Stderr progress line for interactive runs
pub struct CliProgress {
	last_update: Mutex<Instant>,
}

impl CliProgress {
	pub fn new() -> Self {
		CliProgress { last_update: Mutex::new(Instant::now()) }
	}
}

impl Default for CliProgress {
	fn default() -> Self {
		CliProgress::new()
	}
}

impl ProgressCallback for CliProgress {
	fn on_progress(&self, current: u64, total: u64, current_path: &str) {
		// Extra throttle so a short progress interval cannot spam the tty
		{
			let mut last = self.last_update.lock().unwrap_or_else(|e| e.into_inner());
			if last.elapsed().as_millis() < 100 {
				return;
			}
			*last = Instant::now();
		}

		let ratio = if total > 0 { (current as f64 / total as f64).clamp(0.0, 1.0) } else { 0.0 };
		let filled = (ratio * PROGRESS_BAR_WIDTH as f64) as usize;
		let bar =
			format!("[{}{}]", "=".repeat(filled), " ".repeat(PROGRESS_BAR_WIDTH - filled));

		let _ = write!(
			std::io::stderr(),
			"\r  {} {}/{} {}",
			bar,
			current,
			total,
			truncate_path(current_path, 48)
		);
		let _ = std::io::stderr().flush();
	}
}

/// Keep the tail of a long path so the filename stays visible
fn truncate_path(path: &str, max: usize) -> String {
	if path.len() <= max {
		return path.to_string();
	}
	let tail: String = path.chars().skip(path.chars().count().saturating_sub(max - 1)).collect();
	format!("…{}", tail)
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::atomic::{AtomicU64, Ordering};
	use std::sync::Arc;

	#[test]
	fn test_closure_as_callback() {
		let seen = Arc::new(AtomicU64::new(0));
		let seen2 = Arc::clone(&seen);
		let cb = move |current: u64, _total: u64, _path: &str| {
			seen2.store(current, Ordering::SeqCst);
		};
		let sink: &dyn ProgressCallback = &cb;
		sink.on_progress(7, 10, "x.txt");
		assert_eq!(seen.load(Ordering::SeqCst), 7);
	}

	#[test]
	fn test_truncate_path() {
		assert_eq!(truncate_path("short", 10), "short");
		let long = "a/very/long/path/to/some/file.txt";
		let cut = truncate_path(long, 12);
		assert!(cut.starts_with('…'));
		assert!(cut.ends_with("file.txt"));
	}
}

// vim: ts=4
