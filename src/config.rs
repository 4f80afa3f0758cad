//! Options and configuration loading for CopyR
//!
//! Runtime behavior is controlled by a single `CopyOptions` struct. A run can
//! additionally be described by a config file (TOML or JSON5) carrying the
//! roots, filter patterns, database location and mode; CLI flags override
//! file values.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;
use crate::hasher::{HashAlgorithm, DEFAULT_HASH_BUFFER};
use crate::types::{CopyMode, SyncMode};

/// Tuning knobs for one copy/verify run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CopyOptions {
	/// Bytes per I/O read; values of zero or below fall back to 32 MiB
	pub buffer_size: i64,

	/// Descend into subdirectories
	pub recursive: bool,

	/// Carry the source mtime over to the destination after writing
	pub preserve_mod_time: bool,

	/// Compute digests while copying or verifying
	pub verify_hash: bool,

	/// One of md5, sha1, sha256
	pub hash_algorithm: String,

	/// Permit replacing a destination file that differs from the source
	pub overwrite_existing: bool,

	/// Create missing destination directories while walking
	pub create_dirs: bool,

	/// Additional copy attempts after the first failure
	pub max_retries: u32,

	/// Pause between attempts, milliseconds
	pub retry_delay_ms: u64,

	/// Minimum spacing of progress callbacks, milliseconds
	pub progress_interval_ms: u64,

	/// Worker pool size
	pub max_concurrent: usize,

	/// Copy, Verify or CopyAndVerify
	pub mode: CopyMode,

	/// Incremental runs revisit Failed/Mismatch records up to this bound
	pub max_fail_count: u32,
}

impl Default for CopyOptions {
	fn default() -> Self {
		CopyOptions {
			buffer_size: DEFAULT_HASH_BUFFER as i64,
			recursive: true,
			preserve_mod_time: true,
			verify_hash: false,
			hash_algorithm: "sha256".to_string(),
			overwrite_existing: true,
			create_dirs: true,
			max_retries: 3,
			retry_delay_ms: 1000,
			progress_interval_ms: 1000,
			max_concurrent: 4,
			mode: CopyMode::Copy,
			max_fail_count: 5,
		}
	}
}

impl CopyOptions {
	/// Reject unusable option combinations
	pub fn validate(&self) -> Result<(), ConfigError> {
		self.algorithm()?;

		if self.max_concurrent == 0 {
			return Err(ConfigError::InvalidValue {
				key: "max_concurrent".to_string(),
				message: "worker pool size must be at least 1".to_string(),
			});
		}

		if self.progress_interval_ms == 0 {
			return Err(ConfigError::InvalidValue {
				key: "progress_interval_ms".to_string(),
				message: "progress interval must be positive".to_string(),
			});
		}

		Ok(())
	}

	/// Parsed hash algorithm
	pub fn algorithm(&self) -> Result<HashAlgorithm, ConfigError> {
		self.hash_algorithm
			.parse()
			.map_err(|_| ConfigError::UnknownAlgorithm { algorithm: self.hash_algorithm.clone() })
	}

	/// Buffer size with the fallback applied
	pub fn effective_buffer_size(&self) -> usize {
		if self.buffer_size <= 0 {
			DEFAULT_HASH_BUFFER
		} else {
			self.buffer_size as usize
		}
	}

	pub fn retry_delay(&self) -> Duration {
		Duration::from_millis(self.retry_delay_ms)
	}

	pub fn progress_interval(&self) -> Duration {
		Duration::from_millis(self.progress_interval_ms)
	}
}

/// A run description loaded from a config file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
	/// Source root
	pub source: Option<PathBuf>,

	/// Destination root
	pub dest: Option<PathBuf>,

	/// Comma-separated include patterns
	pub include: String,

	/// Comma-separated exclude patterns
	pub exclude: String,

	/// Sync database location; no database is attached when unset
	pub sync_db: Option<PathBuf>,

	/// normal, initial or incremental
	pub sync_mode: String,

	pub options: CopyOptions,
}

impl FileConfig {
	pub fn sync_mode(&self) -> Result<SyncMode, ConfigError> {
		if self.sync_mode.is_empty() {
			return Ok(SyncMode::Normal);
		}
		self.sync_mode.parse()
	}
}

/// Load a config file, picking the parser from the extension
///
/// `.toml` files go through the TOML parser, everything else through JSON5
/// (which accepts plain JSON as well).
pub fn load_file(path: &Path) -> Result<FileConfig, ConfigError> {
	let contents = std::fs::read_to_string(path)
		.map_err(|e| ConfigError::Read { path: path.to_path_buf(), source: e })?;

	let is_toml = path.extension().map(|e| e == "toml").unwrap_or(false);

	let config: FileConfig = if is_toml {
		toml::from_str(&contents)
			.map_err(|e| ConfigError::Parse { path: path.to_path_buf(), message: e.to_string() })?
	} else {
		json5::from_str(&contents)
			.map_err(|e| ConfigError::Parse { path: path.to_path_buf(), message: e.to_string() })?
	};

	config.options.validate()?;
	config.sync_mode()?;
	Ok(config)
}


// vim: ts=4
