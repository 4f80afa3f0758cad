//! Maintenance commands over the sync database
//!
//! These back the `db` subcommand: read-only listings and aggregates plus the
//! destructive `clean` and `reset` operations.

use std::collections::BTreeMap;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::str::FromStr;

use crate::db::{ReportFormat, SyncDb};
use crate::error::{ConfigError, DbError};
use crate::logging::*;
use crate::types::{FileRecord, FileStatus, SyncMode};

/// Sort order for `db list`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
	Path,
	Size,
	ModTime,
	Status,
	LastSyncTime,
}

impl FromStr for SortKey {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_lowercase().as_str() {
			"path" => Ok(SortKey::Path),
			"size" => Ok(SortKey::Size),
			"mod_time" | "modtime" => Ok(SortKey::ModTime),
			"status" => Ok(SortKey::Status),
			"last_sync_time" | "lastsync" => Ok(SortKey::LastSyncTime),
			_ => Err(ConfigError::InvalidValue {
				key: "sort".to_string(),
				message: format!("unknown sort key: {}", s),
			}),
		}
	}
}

fn sort_records(records: &mut [FileRecord], key: SortKey) {
	match key {
		SortKey::Path => records.sort_by(|a, b| a.path.cmp(&b.path)),
		SortKey::Size => records.sort_by(|a, b| b.size.cmp(&a.size)),
		SortKey::ModTime => records.sort_by(|a, b| b.mod_time.cmp(&a.mod_time)),
		SortKey::Status => records.sort_by(|a, b| {
			a.status.to_string().cmp(&b.status.to_string()).then(a.path.cmp(&b.path))
		}),
		SortKey::LastSyncTime => records.sort_by(|a, b| b.last_sync_time.cmp(&a.last_sync_time)),
	}
}

/// Enumerate records as a plain text table
pub fn list(
	db: &SyncDb,
	sort: SortKey,
	status: Option<FileStatus>,
	limit: Option<usize>,
) -> Result<(), DbError> {
	let mut records = match status {
		Some(s) => db.get_files_by_status(s)?,
		None => db.get_all_files()?,
	};
	sort_records(&mut records, sort);
	let total = records.len();
	if let Some(limit) = limit {
		records.truncate(limit);
	}

	println!("{:<48} {:>12} {:>12} {:<10} {:>5}  {}", "PATH", "SIZE", "MOD_TIME", "STATUS", "FAIL", "LAST_ERROR");
	for r in &records {
		println!(
			"{:<48} {:>12} {:>12} {:<10} {:>5}  {}",
			r.path, r.size, r.mod_time, r.status.to_string(), r.fail_count, r.last_error
		);
	}
	if records.len() < total {
		println!("... {} of {} records shown", records.len(), total);
	}

	Ok(())
}

/// Aggregate counts by status, fail-count distribution and session history
pub fn stats(db: &SyncDb) -> Result<(), DbError> {
	let stats = db.get_sync_stats()?;

	println!("Files: {}", stats.total_files);
	println!("  Success:  {}", stats.success);
	println!("  Verified: {}", stats.verified);
	println!("  Skipped:  {}", stats.skipped);
	println!("  Failed:   {}", stats.failed);
	println!("  Mismatch: {}", stats.mismatch);

	let mut by_fail_count: BTreeMap<u32, u64> = BTreeMap::new();
	for record in db.get_all_files()? {
		if record.fail_count > 0 {
			*by_fail_count.entry(record.fail_count).or_insert(0) += 1;
		}
	}
	if !by_fail_count.is_empty() {
		println!("Fail counts:");
		for (count, files) in &by_fail_count {
			println!("  {} failure(s): {} file(s)", count, files);
		}
	}

	println!("Sessions: {} ({} bytes copied in total)", stats.total_sessions, stats.total_bytes_copied);
	for session in db.get_all_sessions()? {
		println!(
			"  #{} mode={} copied={} skipped={} failed={} bytes={} started_at={} ended_at={}",
			session.id,
			session.mode,
			session.copied_count,
			session.skipped_count,
			session.failed_count,
			session.bytes_copied,
			session.started_at,
			session.ended_at
		);
	}

	Ok(())
}

/// Export all records to `path`
pub fn export(db: &SyncDb, path: &Path, format: ReportFormat) -> Result<(), DbError> {
	let count = db.get_all_files()?.len();
	db.export_report(path, format)?;
	info!("Exported {} record(s) to {}", count, path.display());
	Ok(())
}

/// Delete records older than `days` days, returning the number removed
pub fn clean(db: &SyncDb, days: u64) -> Result<u64, DbError> {
	let removed = db.remove_files_older_than(days)?;
	info!("Removed {} record(s) older than {} day(s)", removed, days);
	Ok(removed)
}

/// Truncate the file table after confirmation
///
/// Returns false when the user declined. Only valid for a database opened in
/// Initial mode; other modes surface `InvalidMode`.
pub fn reset(db: &SyncDb, assume_yes: bool) -> Result<bool, DbError> {
	if db.mode() != SyncMode::Initial {
		return Err(DbError::InvalidMode {
			operation: "reset".to_string(),
			mode: db.mode().to_string(),
		});
	}

	if !assume_yes && !confirm("Reset the sync database? All file records will be lost. [y/N] ") {
		info!("Reset aborted");
		return Ok(false);
	}

	db.reset()?;
	info!("Sync database reset");
	Ok(true)
}

fn confirm(prompt: &str) -> bool {
	print!("{}", prompt);
	let _ = io::stdout().flush();

	let mut line = String::new();
	match io::stdin().lock().read_line(&mut line) {
		Ok(0) | Err(_) => false,
		Ok(_) => matches!(line.trim().to_lowercase().as_str(), "y" | "yes"),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_sort_key_parsing() {
		assert_eq!("path".parse::<SortKey>().unwrap(), SortKey::Path);
		assert_eq!("MOD_TIME".parse::<SortKey>().unwrap(), SortKey::ModTime);
		assert_eq!("lastsync".parse::<SortKey>().unwrap(), SortKey::LastSyncTime);
		assert!("color".parse::<SortKey>().is_err());
	}

	#[test]
	fn test_sort_records_by_size_descending() {
		let mut records = vec![
			FileRecord::new("a", 10, 0, FileStatus::Success),
			FileRecord::new("b", 30, 0, FileStatus::Success),
			FileRecord::new("c", 20, 0, FileStatus::Success),
		];
		sort_records(&mut records, SortKey::Size);
		let sizes: Vec<u64> = records.iter().map(|r| r.size).collect();
		assert_eq!(sizes, vec![30, 20, 10]);
	}

	#[test]
	fn test_report_format_parsing() {
		assert_eq!("csv".parse::<ReportFormat>().unwrap(), ReportFormat::Csv);
		assert_eq!("JSON".parse::<ReportFormat>().unwrap(), ReportFormat::Json);
		assert!("xml".parse::<ReportFormat>().is_err());
	}
}

// vim: ts=4
