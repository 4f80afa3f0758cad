//! Core data types for CopyR

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::ConfigError;

/// Terminal state of a file within a sync session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileStatus {
	/// Copied to the destination
	Success,

	/// All copy attempts exhausted
	Failed,

	/// Not copied (filtered out, or destination already up to date)
	Skipped,

	/// Destination content does not match the source
	Mismatch,

	/// Hash comparison confirmed byte equality
	Verified,
}

impl fmt::Display for FileStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			FileStatus::Success => write!(f, "Success"),
			FileStatus::Failed => write!(f, "Failed"),
			FileStatus::Skipped => write!(f, "Skipped"),
			FileStatus::Mismatch => write!(f, "Mismatch"),
			FileStatus::Verified => write!(f, "Verified"),
		}
	}
}

impl FromStr for FileStatus {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_lowercase().as_str() {
			"success" => Ok(FileStatus::Success),
			"failed" => Ok(FileStatus::Failed),
			"skipped" => Ok(FileStatus::Skipped),
			"mismatch" => Ok(FileStatus::Mismatch),
			"verified" => Ok(FileStatus::Verified),
			_ => Err(ConfigError::InvalidValue {
				key: "status".to_string(),
				message: format!("unknown file status: {}", s),
			}),
		}
	}
}

/// Database mode selected when a sync database is opened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncMode {
	/// Existing records drive skip decisions
	Normal,

	/// The file table is reset once right after open, then as Normal
	Initial,

	/// Prior Failed/Mismatch records are revisited up to the fail bound
	Incremental,
}

impl fmt::Display for SyncMode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			SyncMode::Normal => write!(f, "Normal"),
			SyncMode::Initial => write!(f, "Initial"),
			SyncMode::Incremental => write!(f, "Incremental"),
		}
	}
}

impl FromStr for SyncMode {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_lowercase().as_str() {
			"normal" => Ok(SyncMode::Normal),
			"initial" => Ok(SyncMode::Initial),
			"incremental" => Ok(SyncMode::Incremental),
			_ => Err(ConfigError::InvalidValue {
				key: "sync_mode".to_string(),
				message: format!("unknown sync mode: {}", s),
			}),
		}
	}
}

/// What the copier does with each included file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CopyMode {
	/// Copy files that need copying
	Copy,

	/// Compare hashes only, write nothing
	Verify,

	/// Copy, then hash-verify the result
	CopyAndVerify,
}

impl fmt::Display for CopyMode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			CopyMode::Copy => write!(f, "Copy"),
			CopyMode::Verify => write!(f, "Verify"),
			CopyMode::CopyAndVerify => write!(f, "CopyAndVerify"),
		}
	}
}

impl FromStr for CopyMode {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_lowercase().as_str() {
			"copy" => Ok(CopyMode::Copy),
			"verify" => Ok(CopyMode::Verify),
			"copyandverify" | "copy-and-verify" | "copy_and_verify" => Ok(CopyMode::CopyAndVerify),
			_ => Err(ConfigError::InvalidValue {
				key: "mode".to_string(),
				message: format!("unknown copy mode: {}", s),
			}),
		}
	}
}

/// Sync-state record for a single relative path
///
/// The `extra` map captures fields written by newer versions of the tool so
/// they survive a read-modify-write cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
	/// Path relative to the source root, forward-slash form
	pub path: String,

	/// Source size in bytes as seen at last sync
	pub size: u64,

	/// Source modification time (unix seconds) as seen at last sync
	pub mod_time: i64,

	/// Hex digest of the source, empty when not hashed
	#[serde(default)]
	pub source_hash: String,

	/// Hex digest of the destination, empty when not hashed
	#[serde(default)]
	pub dest_hash: String,

	pub status: FileStatus,

	/// Consecutive failure count
	#[serde(default)]
	pub fail_count: u32,

	/// Unix seconds of the last status transition
	#[serde(default)]
	pub last_sync_time: i64,

	#[serde(default)]
	pub last_error: String,

	#[serde(flatten)]
	pub extra: serde_json::Map<String, serde_json::Value>,
}

impl FileRecord {
	/// Create a record for a freshly seen source file
	pub fn new(path: impl Into<String>, size: u64, mod_time: i64, status: FileStatus) -> Self {
		FileRecord {
			path: path.into(),
			size,
			mod_time,
			source_hash: String::new(),
			dest_hash: String::new(),
			status,
			fail_count: 0,
			last_sync_time: now_unix(),
			last_error: String::new(),
			extra: serde_json::Map::new(),
		}
	}

	/// Create a record for a path with nothing known but its status
	pub fn minimal(path: impl Into<String>, status: FileStatus) -> Self {
		FileRecord::new(path, 0, 0, status)
	}
}

/// Record of one copier invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncSession {
	pub id: u64,

	/// Unix seconds when the session opened
	pub started_at: i64,

	/// Unix seconds when the session closed, 0 while open
	#[serde(default)]
	pub ended_at: i64,

	#[serde(default)]
	pub copied_count: u64,

	#[serde(default)]
	pub skipped_count: u64,

	#[serde(default)]
	pub failed_count: u64,

	#[serde(default)]
	pub bytes_copied: u64,

	pub mode: SyncMode,

	#[serde(flatten)]
	pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Current time as unix seconds
pub fn now_unix() -> i64 {
	match SystemTime::now().duration_since(UNIX_EPOCH) {
		Ok(d) => d.as_secs() as i64,
		Err(_) => 0,
	}
}

/// Modification time of a metadata entry as unix seconds
pub fn mtime_unix(meta: &std::fs::Metadata) -> i64 {
	match meta.modified() {
		Ok(t) => match t.duration_since(UNIX_EPOCH) {
			Ok(d) => d.as_secs() as i64,
			Err(_) => 0,
		},
		Err(_) => 0,
	}
}


// vim: ts=4
