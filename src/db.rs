//! Persistent sync-state store
//!
//! One redb database file holds three tables: per-path file records, session
//! records and a small meta table (session id counter, open mode). Values are
//! JSON so records written by newer versions keep their unknown fields across
//! a read-modify-write cycle.

use redb::{ReadableDatabase, ReadableTable, TableDefinition};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::error::{boxed_error, DbError};
use crate::logging::*;
use crate::types::{now_unix, FileRecord, FileStatus, SyncMode, SyncSession};

/// Key: relative file path. Value: JSON FileRecord.
const FILES_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("files");

/// Key: session id. Value: JSON SyncSession.
const SESSIONS_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("sessions");

/// Singleton keys, raw bytes.
const META_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("meta");

const META_NEXT_SESSION_ID: &str = "next_session_id";
const META_MODE: &str = "mode";

/// Export encoding for `export_report`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
	Csv,
	Json,
}

impl std::str::FromStr for ReportFormat {
	type Err = crate::error::ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_lowercase().as_str() {
			"csv" => Ok(ReportFormat::Csv),
			"json" => Ok(ReportFormat::Json),
			_ => Err(crate::error::ConfigError::InvalidValue {
				key: "format".to_string(),
				message: format!("unknown export format: {}", s),
			}),
		}
	}
}

/// Aggregate view over the store, backing the `db stats` command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DbStats {
	pub total_files: u64,
	pub success: u64,
	pub failed: u64,
	pub skipped: u64,
	pub mismatch: u64,
	pub verified: u64,
	pub total_sessions: u64,
	pub total_bytes_copied: u64,
}

/// Sync-state database backed by redb
///
/// Writes are serialized by redb's single-writer transaction model and are
/// durable once the commit returns. Reads run concurrently with writes.
pub struct SyncDb {
	db: redb::Database,
	path: PathBuf,
	mode: SyncMode,
}

impl SyncDb {
	/// Open or create a database file and persist the requested mode
	pub fn open(path: &Path, mode: SyncMode) -> Result<Self, DbError> {
		let db = redb::Database::create(path)
			.map_err(|e| DbError::Open { path: path.to_path_buf(), source: boxed_error(e) })?;

		// Ensure all tables exist and record the mode
		{
			let write_txn = db.begin_write()?;
			{
				let _ = write_txn.open_table(FILES_TABLE)?;
				let _ = write_txn.open_table(SESSIONS_TABLE)?;
				let mut meta = write_txn.open_table(META_TABLE)?;
				meta.insert(META_MODE, mode.to_string().as_bytes())?;
			}
			write_txn.commit()?;
		}

		Ok(SyncDb { db, path: path.to_path_buf(), mode })
	}

	/// Flush and release the file. Commits are already durable, so this is
	/// a plain release; dropping the handle is equivalent.
	pub fn close(self) {}

	pub fn path(&self) -> &Path {
		&self.path
	}

	pub fn mode(&self) -> SyncMode {
		self.mode
	}

	//////////
	// File records //
	//////////

	/// Insert or replace the record for `record.path`
	pub fn add_file(&self, record: &FileRecord) -> Result<(), DbError> {
		let bytes = encode(record)?;
		let write_txn = self.db.begin_write()?;
		{
			let mut table = write_txn.open_table(FILES_TABLE)?;
			table.insert(record.path.as_str(), bytes.as_slice())?;
		}
		write_txn.commit()?;
		Ok(())
	}

	/// Fetch one record, `NotFound` when the path is unknown
	pub fn get_file(&self, path: &str) -> Result<FileRecord, DbError> {
		let read_txn = self.db.begin_read()?;
		let table = read_txn.open_table(FILES_TABLE)?;
		match table.get(path)? {
			Some(entry) => decode(path, entry.value()),
			None => Err(DbError::NotFound { key: path.to_string() }),
		}
	}

	/// Update status, error text and sync time for a path
	///
	/// Unknown paths get a minimal record created on the fly. A transition to
	/// Success, Verified or Skipped clears the consecutive failure counter.
	pub fn update_status(
		&self,
		path: &str,
		status: FileStatus,
		err: Option<&str>,
	) -> Result<(), DbError> {
		let write_txn = self.db.begin_write()?;
		{
			let mut table = write_txn.open_table(FILES_TABLE)?;
			let mut record = {
				match table.get(path)? {
					Some(entry) => decode(path, entry.value())?,
					None => FileRecord::minimal(path, status),
				}
			};

			record.status = status;
			record.last_error = err.unwrap_or("").to_string();
			record.last_sync_time = now_unix();
			// Mismatch keeps the counter so incremental runs can bound revisits
			if !matches!(status, FileStatus::Failed | FileStatus::Mismatch) {
				record.fail_count = 0;
			}

			let bytes = encode(&record)?;
			table.insert(path, bytes.as_slice())?;
		}
		write_txn.commit()?;
		Ok(())
	}

	/// Record the digests observed for a path
	///
	/// Unlike `update_status` this never creates a record; hashing something
	/// the store has not seen is a caller bug surfaced as `NotFound`.
	pub fn update_hash(&self, path: &str, src_hex: &str, dst_hex: &str) -> Result<(), DbError> {
		let write_txn = self.db.begin_write()?;
		{
			let mut table = write_txn.open_table(FILES_TABLE)?;
			let mut record: FileRecord = {
				match table.get(path)? {
					Some(entry) => decode(path, entry.value())?,
					None => return Err(DbError::NotFound { key: path.to_string() }),
				}
			};

			record.source_hash = src_hex.to_string();
			record.dest_hash = dst_hex.to_string();

			let bytes = encode(&record)?;
			table.insert(path, bytes.as_slice())?;
		}
		write_txn.commit()?;
		Ok(())
	}

	/// Bump the consecutive failure counter, returning the new value
	pub fn increment_fail_count(&self, path: &str) -> Result<u32, DbError> {
		let write_txn = self.db.begin_write()?;
		let count;
		{
			let mut table = write_txn.open_table(FILES_TABLE)?;
			let mut record: FileRecord = {
				match table.get(path)? {
					Some(entry) => decode(path, entry.value())?,
					None => return Err(DbError::NotFound { key: path.to_string() }),
				}
			};

			record.fail_count += 1;
			count = record.fail_count;

			let bytes = encode(&record)?;
			table.insert(path, bytes.as_slice())?;
		}
		write_txn.commit()?;
		Ok(count)
	}

	/// Failed records still within the retry bound
	pub fn get_failed_files(&self, max_fail_count: u32) -> Result<Vec<FileRecord>, DbError> {
		let all = self.get_all_files()?;
		Ok(all
			.into_iter()
			.filter(|r| r.status == FileStatus::Failed && r.fail_count <= max_fail_count)
			.collect())
	}

	pub fn get_files_by_status(&self, status: FileStatus) -> Result<Vec<FileRecord>, DbError> {
		let all = self.get_all_files()?;
		Ok(all.into_iter().filter(|r| r.status == status).collect())
	}

	/// Every file record; order unspecified. Corrupt entries are logged and
	/// skipped so one bad value cannot take down a listing.
	pub fn get_all_files(&self) -> Result<Vec<FileRecord>, DbError> {
		let read_txn = self.db.begin_read()?;
		let table = read_txn.open_table(FILES_TABLE)?;

		let mut records = Vec::new();
		for item in table.iter()? {
			let (key, value) = item?;
			match decode::<FileRecord>(key.value(), value.value()) {
				Ok(record) => records.push(record),
				Err(e) => warn!("Skipping corrupt file record: {}", e),
			}
		}
		Ok(records)
	}

	//////////
	// Sessions //
	//////////

	/// Allocate the next session id and write an open session record
	pub fn start_session(&self) -> Result<u64, DbError> {
		let write_txn = self.db.begin_write()?;
		let id;
		{
			let mut meta = write_txn.open_table(META_TABLE)?;
			id = {
				match meta.get(META_NEXT_SESSION_ID)? {
					Some(entry) => decode_u64(entry.value()),
					None => 1,
				}
			};
			meta.insert(META_NEXT_SESSION_ID, (id + 1).to_be_bytes().as_slice())?;

			let session = SyncSession {
				id,
				started_at: now_unix(),
				ended_at: 0,
				copied_count: 0,
				skipped_count: 0,
				failed_count: 0,
				bytes_copied: 0,
				mode: self.mode,
				extra: serde_json::Map::new(),
			};
			let bytes = encode(&session)?;
			let mut sessions = write_txn.open_table(SESSIONS_TABLE)?;
			sessions.insert(id, bytes.as_slice())?;
		}
		write_txn.commit()?;
		Ok(id)
	}

	/// Close a session with its final counters
	pub fn end_session(
		&self,
		id: u64,
		copied: u64,
		skipped: u64,
		failed: u64,
		bytes: u64,
	) -> Result<(), DbError> {
		let write_txn = self.db.begin_write()?;
		{
			let mut sessions = write_txn.open_table(SESSIONS_TABLE)?;
			let mut session = {
				match sessions.get(id)? {
					Some(entry) => decode::<SyncSession>(&format!("session {}", id), entry.value())?,
					None => return Err(DbError::NotFound { key: format!("session {}", id) }),
				}
			};

			session.ended_at = now_unix();
			session.copied_count = copied;
			session.skipped_count = skipped;
			session.failed_count = failed;
			session.bytes_copied = bytes;

			let encoded = encode(&session)?;
			sessions.insert(id, encoded.as_slice())?;
		}
		write_txn.commit()?;
		Ok(())
	}

	pub fn get_session(&self, id: u64) -> Result<SyncSession, DbError> {
		let read_txn = self.db.begin_read()?;
		let table = read_txn.open_table(SESSIONS_TABLE)?;
		match table.get(id)? {
			Some(entry) => decode(&format!("session {}", id), entry.value()),
			None => Err(DbError::NotFound { key: format!("session {}", id) }),
		}
	}

	/// Every session record, ordered by id
	pub fn get_all_sessions(&self) -> Result<Vec<SyncSession>, DbError> {
		let read_txn = self.db.begin_read()?;
		let table = read_txn.open_table(SESSIONS_TABLE)?;

		let mut sessions = Vec::new();
		for item in table.iter()? {
			let (key, value) = item?;
			match decode::<SyncSession>(&format!("session {}", key.value()), value.value()) {
				Ok(session) => sessions.push(session),
				Err(e) => warn!("Skipping corrupt session record: {}", e),
			}
		}
		Ok(sessions)
	}

	//////////
	// Aggregates and maintenance //
	//////////

	pub fn get_sync_stats(&self) -> Result<DbStats, DbError> {
		let mut stats = DbStats::default();

		for record in self.get_all_files()? {
			stats.total_files += 1;
			match record.status {
				FileStatus::Success => stats.success += 1,
				FileStatus::Failed => stats.failed += 1,
				FileStatus::Skipped => stats.skipped += 1,
				FileStatus::Mismatch => stats.mismatch += 1,
				FileStatus::Verified => stats.verified += 1,
			}
		}

		for session in self.get_all_sessions()? {
			stats.total_sessions += 1;
			stats.total_bytes_copied += session.bytes_copied;
		}

		Ok(stats)
	}

	/// Truncate the file table, keeping meta and session history
	///
	/// Permitted only when the database was opened in Initial mode.
	pub fn reset(&self) -> Result<(), DbError> {
		if self.mode != SyncMode::Initial {
			return Err(DbError::InvalidMode {
				operation: "reset".to_string(),
				mode: self.mode.to_string(),
			});
		}

		let write_txn = self.db.begin_write()?;
		{
			let mut table = write_txn.open_table(FILES_TABLE)?;
			let keys: Vec<String> = {
				let mut keys = Vec::new();
				for item in table.iter()? {
					let (key, _) = item?;
					keys.push(key.value().to_string());
				}
				keys
			};
			for key in keys {
				table.remove(key.as_str())?;
			}
		}
		write_txn.commit()?;
		Ok(())
	}

	/// Delete records whose last sync is older than `days` days
	pub fn remove_files_older_than(&self, days: u64) -> Result<u64, DbError> {
		let cutoff = now_unix() - (days as i64) * 86_400;

		let write_txn = self.db.begin_write()?;
		let mut removed = 0u64;
		{
			let mut table = write_txn.open_table(FILES_TABLE)?;
			let stale: Vec<String> = {
				let mut stale = Vec::new();
				for item in table.iter()? {
					let (key, value) = item?;
					match decode::<FileRecord>(key.value(), value.value()) {
						Ok(record) => {
							if record.last_sync_time < cutoff {
								stale.push(record.path);
							}
						}
						// A record nobody can read any more counts as stale
						Err(_) => stale.push(key.value().to_string()),
					}
				}
				stale
			};
			for key in stale {
				table.remove(key.as_str())?;
				removed += 1;
			}
		}
		write_txn.commit()?;
		Ok(removed)
	}

	/// Write every file record to `path` as CSV or JSON
	pub fn export_report(&self, path: &Path, format: ReportFormat) -> Result<(), DbError> {
		let mut records = self.get_all_files()?;
		records.sort_by(|a, b| a.path.cmp(&b.path));

		let contents = match format {
			ReportFormat::Csv => {
				let mut out = String::from(
					"path,size,mod_time,source_hash,dest_hash,status,fail_count,last_sync_time,last_error\n",
				);
				for r in &records {
					out.push_str(&format!(
						"{},{},{},{},{},{},{},{},{}\n",
						csv_field(&r.path),
						r.size,
						r.mod_time,
						r.source_hash,
						r.dest_hash,
						r.status,
						r.fail_count,
						r.last_sync_time,
						csv_field(&r.last_error)
					));
				}
				out
			}
			ReportFormat::Json => serde_json::to_string_pretty(&records)
				.map_err(|e| DbError::Storage { source: boxed_error(e) })?,
		};

		std::fs::write(path, contents)?;
		Ok(())
	}
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, DbError> {
	serde_json::to_vec(value).map_err(|e| DbError::Storage { source: boxed_error(e) })
}

fn decode<T: DeserializeOwned>(key: &str, bytes: &[u8]) -> Result<T, DbError> {
	serde_json::from_slice(bytes)
		.map_err(|e| DbError::Deserialization { key: key.to_string(), message: e.to_string() })
}

fn decode_u64(bytes: &[u8]) -> u64 {
	let mut buf = [0u8; 8];
	let n = bytes.len().min(8);
	buf[8 - n..].copy_from_slice(&bytes[..n]);
	u64::from_be_bytes(buf)
}

/// Quote a CSV field when it contains a delimiter, quote or newline
fn csv_field(s: &str) -> String {
	if s.contains(',') || s.contains('"') || s.contains('\n') {
		format!("\"{}\"", s.replace('"', "\"\""))
	} else {
		s.to_string()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::TempDir;

	fn open_db(tmp: &TempDir, mode: SyncMode) -> SyncDb {
		SyncDb::open(&tmp.path().join("sync.db"), mode).unwrap()
	}

	#[test]
	fn test_add_and_get_round_trip() {
		let tmp = TempDir::new().unwrap();
		let db = open_db(&tmp, SyncMode::Normal);

		let record = FileRecord::new("a/b.txt", 42, 1234, FileStatus::Success);
		db.add_file(&record).unwrap();

		let loaded = db.get_file("a/b.txt").unwrap();
		assert_eq!(loaded, record);
	}

	#[test]
	fn test_get_missing_is_not_found() {
		let tmp = TempDir::new().unwrap();
		let db = open_db(&tmp, SyncMode::Normal);
		assert!(matches!(db.get_file("nope"), Err(DbError::NotFound { .. })));
	}

	#[test]
	fn test_upsert_last_writer_wins() {
		let tmp = TempDir::new().unwrap();
		let db = open_db(&tmp, SyncMode::Normal);

		db.add_file(&FileRecord::new("p", 1, 1, FileStatus::Failed)).unwrap();
		db.add_file(&FileRecord::new("p", 2, 2, FileStatus::Success)).unwrap();

		let loaded = db.get_file("p").unwrap();
		assert_eq!(loaded.size, 2);
		assert_eq!(loaded.status, FileStatus::Success);
		assert_eq!(db.get_all_files().unwrap().len(), 1);
	}

	#[test]
	fn test_fail_count_reset_on_non_failure() {
		let tmp = TempDir::new().unwrap();
		let db = open_db(&tmp, SyncMode::Normal);

		db.add_file(&FileRecord::new("p", 1, 1, FileStatus::Failed)).unwrap();
		assert_eq!(db.increment_fail_count("p").unwrap(), 1);
		assert_eq!(db.increment_fail_count("p").unwrap(), 2);

		db.update_status("p", FileStatus::Success, None).unwrap();
		assert_eq!(db.get_file("p").unwrap().fail_count, 0);
	}

	#[test]
	fn test_session_lifecycle() {
		let tmp = TempDir::new().unwrap();
		let db = open_db(&tmp, SyncMode::Normal);

		let first = db.start_session().unwrap();
		let second = db.start_session().unwrap();
		assert_eq!(second, first + 1);

		db.end_session(first, 3, 1, 0, 4096).unwrap();
		let session = db.get_session(first).unwrap();
		assert_eq!(session.copied_count, 3);
		assert_eq!(session.skipped_count, 1);
		assert_eq!(session.bytes_copied, 4096);
		assert!(session.ended_at >= session.started_at);

		assert!(matches!(db.end_session(999, 0, 0, 0, 0), Err(DbError::NotFound { .. })));
	}

	#[test]
	fn test_reset_requires_initial_mode() {
		let tmp = TempDir::new().unwrap();
		let db = open_db(&tmp, SyncMode::Normal);
		db.add_file(&FileRecord::new("p", 1, 1, FileStatus::Success)).unwrap();
		assert!(matches!(db.reset(), Err(DbError::InvalidMode { .. })));

		let tmp = TempDir::new().unwrap();
		let db = open_db(&tmp, SyncMode::Initial);
		db.add_file(&FileRecord::new("p", 1, 1, FileStatus::Success)).unwrap();
		let session = db.start_session().unwrap();
		db.reset().unwrap();
		assert!(db.get_all_files().unwrap().is_empty());
		// Sessions and the id counter survive a reset
		assert!(db.get_session(session).is_ok());
		assert_eq!(db.start_session().unwrap(), session + 1);
	}

	#[test]
	fn test_corrupt_record_surfaces_as_deserialization_error() {
		let tmp = TempDir::new().unwrap();
		let db = open_db(&tmp, SyncMode::Normal);

		// Plant garbage bytes straight into the files table
		{
			let write_txn = db.db.begin_write().unwrap();
			{
				let mut table = write_txn.open_table(FILES_TABLE).unwrap();
				table.insert("bad", b"not json".as_slice()).unwrap();
			}
			write_txn.commit().unwrap();
		}

		assert!(matches!(db.get_file("bad"), Err(DbError::Deserialization { .. })));
		// Bulk scans skip the bad entry instead of failing
		assert!(db.get_all_files().unwrap().is_empty());
	}
}

// vim: ts=4
