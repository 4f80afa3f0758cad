//! Error types for CopyR operations

use std::error::Error;
use std::fmt;
use std::io;
use std::path::PathBuf;

/// Helper to reduce Box::new() boilerplate when wrapping errors
#[inline]
pub fn boxed_error<E: Error + Send + Sync + 'static>(e: E) -> Box<dyn Error + Send + Sync> {
	Box::new(e)
}

/// Configuration and option validation errors
#[derive(Debug)]
pub enum ConfigError {
	/// Hash algorithm name not in the supported set
	UnknownAlgorithm { algorithm: String },

	/// A recognized key carries an unusable value
	InvalidValue { key: String, message: String },

	/// Config file could not be read
	Read { path: PathBuf, source: io::Error },

	/// Config file could not be parsed
	Parse { path: PathBuf, message: String },
}

impl fmt::Display for ConfigError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ConfigError::UnknownAlgorithm { algorithm } => {
				write!(f, "Unknown hash algorithm: {}", algorithm)
			}
			ConfigError::InvalidValue { key, message } => {
				write!(f, "Invalid value for {}: {}", key, message)
			}
			ConfigError::Read { path, source } => {
				write!(f, "Failed to read config {}: {}", path.display(), source)
			}
			ConfigError::Parse { path, message } => {
				write!(f, "Failed to parse config {}: {}", path.display(), message)
			}
		}
	}
}

impl Error for ConfigError {}

/// Sync database errors
#[derive(Debug)]
pub enum DbError {
	/// Database file could not be created or opened
	Open { path: PathBuf, source: Box<dyn Error + Send + Sync> },

	/// No record under the requested key
	NotFound { key: String },

	/// Stored value bytes do not decode as a record
	Deserialization { key: String, message: String },

	/// Underlying storage failure (transaction, table or commit)
	Storage { source: Box<dyn Error + Send + Sync> },

	/// Operation not permitted in the mode the database was opened with
	InvalidMode { operation: String, mode: String },

	/// Report file I/O failure
	Io(io::Error),
}

impl fmt::Display for DbError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			DbError::Open { path, source } => {
				write!(f, "Failed to open sync database {}: {}", path.display(), source)
			}
			DbError::NotFound { key } => write!(f, "Record not found: {}", key),
			DbError::Deserialization { key, message } => {
				write!(f, "Corrupt record for {}: {}", key, message)
			}
			DbError::Storage { source } => write!(f, "Database storage error: {}", source),
			DbError::InvalidMode { operation, mode } => {
				write!(f, "Operation {} not permitted in {} mode", operation, mode)
			}
			DbError::Io(e) => write!(f, "I/O error: {}", e),
		}
	}
}

impl Error for DbError {}

impl From<io::Error> for DbError {
	fn from(e: io::Error) -> Self {
		DbError::Io(e)
	}
}

impl From<redb::TransactionError> for DbError {
	fn from(e: redb::TransactionError) -> Self {
		DbError::Storage { source: boxed_error(e) }
	}
}

impl From<redb::TableError> for DbError {
	fn from(e: redb::TableError) -> Self {
		DbError::Storage { source: boxed_error(e) }
	}
}

impl From<redb::StorageError> for DbError {
	fn from(e: redb::StorageError) -> Self {
		DbError::Storage { source: boxed_error(e) }
	}
}

impl From<redb::CommitError> for DbError {
	fn from(e: redb::CommitError) -> Self {
		DbError::Storage { source: boxed_error(e) }
	}
}

/// Digest computation errors
#[derive(Debug)]
pub enum HashError {
	/// Algorithm name not in the supported set
	UnsupportedAlgorithm { algorithm: String },

	/// Read failure while streaming a file
	Io { path: PathBuf, source: io::Error },

	/// Directory-wide operation pointed at a non-directory
	NotADirectory { path: PathBuf },
}

impl fmt::Display for HashError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			HashError::UnsupportedAlgorithm { algorithm } => {
				write!(f, "Unsupported hash algorithm: {}", algorithm)
			}
			HashError::Io { path, source } => {
				write!(f, "Failed to hash {}: {}", path.display(), source)
			}
			HashError::NotADirectory { path } => {
				write!(f, "Not a directory: {}", path.display())
			}
		}
	}
}

impl Error for HashError {}

/// Main error type for copy/verify runs
#[derive(Debug)]
pub enum CopyError {
	/// Source root does not exist or is not readable
	SourceMissing { path: PathBuf },

	/// Destination root could not be created
	DestUncreatable { path: PathBuf, source: io::Error },

	/// A path could not be expressed relative to the source root
	PathTranslation { path: PathBuf },

	/// Cooperative early stop was observed
	Cancelled,

	/// The walk completed but some files ended Failed or Mismatch
	PartialFailure { failed: u64 },

	/// Invalid options
	Config(ConfigError),

	/// Sync database failure
	Db(DbError),

	/// Digest failure outside the per-file retry path
	Hash(HashError),

	/// I/O failure outside the per-file retry path
	Io(io::Error),
}

impl fmt::Display for CopyError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			CopyError::SourceMissing { path } => {
				write!(f, "Source does not exist: {}", path.display())
			}
			CopyError::DestUncreatable { path, source } => {
				write!(f, "Cannot create destination {}: {}", path.display(), source)
			}
			CopyError::PathTranslation { path } => {
				write!(f, "Cannot relativize path: {}", path.display())
			}
			CopyError::Cancelled => write!(f, "Operation cancelled"),
			CopyError::PartialFailure { failed } => {
				write!(f, "Completed with {} failed file(s)", failed)
			}
			CopyError::Config(e) => write!(f, "Configuration error: {}", e),
			CopyError::Db(e) => write!(f, "Database error: {}", e),
			CopyError::Hash(e) => write!(f, "Hash error: {}", e),
			CopyError::Io(e) => write!(f, "I/O error: {}", e),
		}
	}
}

impl Error for CopyError {}

impl From<ConfigError> for CopyError {
	fn from(e: ConfigError) -> Self {
		CopyError::Config(e)
	}
}

impl From<DbError> for CopyError {
	fn from(e: DbError) -> Self {
		CopyError::Db(e)
	}
}

impl From<HashError> for CopyError {
	fn from(e: HashError) -> Self {
		CopyError::Hash(e)
	}
}

impl From<io::Error> for CopyError {
	fn from(e: io::Error) -> Self {
		CopyError::Io(e)
	}
}

impl CopyError {
	/// Process exit code for this error
	pub fn exit_code(&self) -> i32 {
		match self {
			CopyError::PartialFailure { .. } => 1,
			CopyError::Cancelled => 2,
			CopyError::Config(_) => 3,
			CopyError::SourceMissing { .. } | CopyError::DestUncreatable { .. } => 3,
			CopyError::Db(DbError::Open { .. }) | CopyError::Db(DbError::InvalidMode { .. }) => 3,
			_ => 4,
		}
	}
}

// vim: ts=4
