//! Include/exclude file filtering with shell-style glob patterns

use glob::Pattern;
use std::path::Path;

use crate::logging::*;

/// Basename filter built from comma-separated include and exclude lists
///
/// Exclusion always wins. An empty include list admits everything that is not
/// excluded. Patterns use the usual shell syntax (`*`, `?`, `[...]`) and match
/// against the final path component only, so `*.txt` matches `a/b/c.txt`.
#[derive(Debug, Clone, Default)]
pub struct FileFilter {
	include: Vec<Pattern>,
	exclude: Vec<Pattern>,
}

impl FileFilter {
	/// Build a filter from comma-separated pattern lists
	///
	/// Whitespace around each pattern is trimmed and empty entries are
	/// dropped. A pattern that fails to compile is logged and ignored, so a
	/// typo never aborts a run.
	pub fn new(include: &str, exclude: &str) -> Self {
		FileFilter { include: compile_list(include), exclude: compile_list(exclude) }
	}

	/// Filter that admits every path
	pub fn allow_all() -> Self {
		FileFilter::default()
	}

	/// Decide whether a path passes the filter
	pub fn should_include(&self, path: &Path) -> bool {
		let name = match path.file_name() {
			Some(n) => n.to_string_lossy(),
			None => return false,
		};

		for pattern in &self.exclude {
			if pattern.matches(&name) {
				return false;
			}
		}

		if self.include.is_empty() {
			return true;
		}

		for pattern in &self.include {
			if pattern.matches(&name) {
				return true;
			}
		}

		false
	}

	pub fn is_empty(&self) -> bool {
		self.include.is_empty() && self.exclude.is_empty()
	}
}

fn compile_list(list: &str) -> Vec<Pattern> {
	let mut patterns = Vec::new();
	for part in list.split(',') {
		let part = part.trim();
		if part.is_empty() {
			continue;
		}
		match Pattern::new(part) {
			Ok(p) => patterns.push(p),
			Err(e) => warn!("Ignoring malformed pattern {:?}: {}", part, e),
		}
	}
	patterns
}


// vim: ts=4
