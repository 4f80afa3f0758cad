//! # CopyR - Directory Synchronization Engine
//!
//! CopyR mirrors a source tree into a destination tree through a parallel
//! copy/verify pipeline, records per-file state in an embedded key-value
//! database across runs, and can confirm byte-equality with cryptographic
//! hashes.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use copyr::config::CopyOptions;
//! use copyr::copier::Copier;
//! use copyr::filter::FileFilter;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), copyr::error::CopyError> {
//!     let copier = Copier::new(
//!         "./source",
//!         "./backup",
//!         CopyOptions::default(),
//!         FileFilter::new("*.txt", "*.tmp"),
//!         None,
//!     )?;
//!     copier.copy_files().await
//! }
//! ```
//!
//! Attach a [`db::SyncDb`] to make reruns incremental: unchanged files are
//! skipped by size and mtime, and failed files can be retried across runs.

#![deny(unsafe_code)]

pub mod config;
pub mod copier;
pub mod db;
pub mod dbcli;
pub mod error;
pub mod filter;
pub mod hasher;
pub mod logging;
pub mod progress;
pub mod stats;
pub mod types;

// Re-export commonly used types and functions
pub use config::{CopyOptions, FileConfig};
pub use copier::{CancelFlag, Copier};
pub use db::{DbStats, ReportFormat, SyncDb};
pub use error::{ConfigError, CopyError, DbError, HashError};
pub use filter::FileFilter;
pub use hasher::{DirDiff, FileHasher, HashAlgorithm};
pub use progress::{CliProgress, ProgressCallback};
pub use stats::CopyStats;
pub use types::{CopyMode, FileRecord, FileStatus, SyncMode, SyncSession};

// vim: ts=4
