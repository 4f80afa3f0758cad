//! Streaming file digests and directory-wide hash comparison

use md5::Md5;
use sha1::Sha1;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use crate::error::HashError;

/// Buffer size used when the configured value is unusable
pub const DEFAULT_HASH_BUFFER: usize = 32 * 1024 * 1024;

/// The supported digest algorithms
///
/// The set is closed, so dispatch is a plain enum rather than a trait object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlgorithm {
	Md5,
	Sha1,
	Sha256,
}

impl fmt::Display for HashAlgorithm {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			HashAlgorithm::Md5 => write!(f, "md5"),
			HashAlgorithm::Sha1 => write!(f, "sha1"),
			HashAlgorithm::Sha256 => write!(f, "sha256"),
		}
	}
}

impl FromStr for HashAlgorithm {
	type Err = HashError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_lowercase().as_str() {
			"md5" => Ok(HashAlgorithm::Md5),
			"sha1" => Ok(HashAlgorithm::Sha1),
			"sha256" => Ok(HashAlgorithm::Sha256),
			_ => Err(HashError::UnsupportedAlgorithm { algorithm: s.to_string() }),
		}
	}
}

/// In-flight digest state for one file
enum DigestState {
	Md5(Md5),
	Sha1(Sha1),
	Sha256(Sha256),
}

impl DigestState {
	fn new(algorithm: HashAlgorithm) -> Self {
		match algorithm {
			HashAlgorithm::Md5 => DigestState::Md5(Md5::new()),
			HashAlgorithm::Sha1 => DigestState::Sha1(Sha1::new()),
			HashAlgorithm::Sha256 => DigestState::Sha256(Sha256::new()),
		}
	}

	fn update(&mut self, data: &[u8]) {
		match self {
			DigestState::Md5(h) => h.update(data),
			DigestState::Sha1(h) => h.update(data),
			DigestState::Sha256(h) => h.update(data),
		}
	}

	fn finalize_hex(self) -> String {
		match self {
			DigestState::Md5(h) => hex::encode(h.finalize()),
			DigestState::Sha1(h) => hex::encode(h.finalize()),
			DigestState::Sha256(h) => hex::encode(h.finalize()),
		}
	}
}

/// One difference found while comparing two trees
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirDiff {
	/// Present under the source root only
	SourceOnly { path: String },

	/// Present under the destination root only
	DestOnly { path: String },

	/// Present on both sides with different content
	HashMismatch { path: String, source_hash: String, dest_hash: String },
}

impl DirDiff {
	pub fn path(&self) -> &str {
		match self {
			DirDiff::SourceOnly { path } => path,
			DirDiff::DestOnly { path } => path,
			DirDiff::HashMismatch { path, .. } => path,
		}
	}
}

impl fmt::Display for DirDiff {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			DirDiff::SourceOnly { path } => write!(f, "{}: only in source", path),
			DirDiff::DestOnly { path } => write!(f, "{}: only in destination", path),
			DirDiff::HashMismatch { path, source_hash, dest_hash } => {
				write!(f, "{}: hash mismatch ({} != {})", path, source_hash, dest_hash)
			}
		}
	}
}

/// File and directory hashing with a fixed algorithm and buffer size
#[derive(Debug, Clone)]
pub struct FileHasher {
	algorithm: HashAlgorithm,
	buffer_size: usize,
}

impl FileHasher {
	/// Create a hasher. A `buffer_size` of zero or below falls back to the
	/// 32 MiB default.
	pub fn new(algorithm: HashAlgorithm, buffer_size: i64) -> Self {
		let buffer_size =
			if buffer_size <= 0 { DEFAULT_HASH_BUFFER } else { buffer_size as usize };
		FileHasher { algorithm, buffer_size }
	}

	pub fn algorithm(&self) -> HashAlgorithm {
		self.algorithm
	}

	/// Digest of an in-memory byte slice
	pub fn hash_bytes(&self, data: &[u8]) -> String {
		let mut state = DigestState::new(self.algorithm);
		state.update(data);
		state.finalize_hex()
	}

	/// Stream a file and return its lowercase hex digest
	///
	/// Symlinks are followed; the digest covers the target's bytes. An empty
	/// file yields the algorithm's empty-input digest.
	pub fn hash_file(&self, path: &Path) -> Result<String, HashError> {
		let mut file = File::open(path)
			.map_err(|e| HashError::Io { path: path.to_path_buf(), source: e })?;

		let mut state = DigestState::new(self.algorithm);
		let mut buffer = vec![0u8; self.buffer_size];

		loop {
			let n = file
				.read(&mut buffer)
				.map_err(|e| HashError::Io { path: path.to_path_buf(), source: e })?;
			if n == 0 {
				break;
			}
			state.update(&buffer[..n]);
		}

		Ok(state.finalize_hex())
	}

	/// Hash a file and compare against an expected hex digest
	pub fn verify_file(&self, path: &Path, expected_hex: &str) -> Result<bool, HashError> {
		let actual = self.hash_file(path)?;
		Ok(actual.eq_ignore_ascii_case(expected_hex.trim()))
	}

	/// Hash every file under `root`, keyed by forward-slash relative path
	///
	/// When `recursive` is false only files directly under `root` are
	/// reported and subdirectories are skipped.
	pub fn hash_directory(
		&self,
		root: &Path,
		recursive: bool,
	) -> Result<BTreeMap<String, String>, HashError> {
		let meta = std::fs::metadata(root)
			.map_err(|e| HashError::Io { path: root.to_path_buf(), source: e })?;
		if !meta.is_dir() {
			return Err(HashError::NotADirectory { path: root.to_path_buf() });
		}

		let mut out = BTreeMap::new();
		self.hash_dir_entries(root, root, recursive, &mut out)?;
		Ok(out)
	}

	fn hash_dir_entries(
		&self,
		root: &Path,
		dir: &Path,
		recursive: bool,
		out: &mut BTreeMap<String, String>,
	) -> Result<(), HashError> {
		let entries = std::fs::read_dir(dir)
			.map_err(|e| HashError::Io { path: dir.to_path_buf(), source: e })?;

		for entry in entries {
			let entry =
				entry.map_err(|e| HashError::Io { path: dir.to_path_buf(), source: e })?;
			let path = entry.path();
			let meta = std::fs::metadata(&path)
				.map_err(|e| HashError::Io { path: path.clone(), source: e })?;

			if meta.is_dir() {
				if recursive {
					self.hash_dir_entries(root, &path, recursive, out)?;
				}
			} else if meta.is_file() {
				let rel = relative_key(root, &path);
				let digest = self.hash_file(&path)?;
				out.insert(rel, digest);
			}
		}

		Ok(())
	}

	/// Hash both trees and report every per-path difference
	pub fn compare_directories(
		&self,
		src: &Path,
		dst: &Path,
		recursive: bool,
	) -> Result<Vec<DirDiff>, HashError> {
		let src_hashes = self.hash_directory(src, recursive)?;
		let mut dst_hashes = self.hash_directory(dst, recursive)?;

		let mut diffs = Vec::new();
		for (path, src_hash) in src_hashes {
			match dst_hashes.remove(&path) {
				Some(dst_hash) => {
					if src_hash != dst_hash {
						diffs.push(DirDiff::HashMismatch {
							path,
							source_hash: src_hash,
							dest_hash: dst_hash,
						});
					}
				}
				None => diffs.push(DirDiff::SourceOnly { path }),
			}
		}
		for (path, _) in dst_hashes {
			diffs.push(DirDiff::DestOnly { path });
		}

		Ok(diffs)
	}
}

/// Forward-slash relative path of `path` under `root`
fn relative_key(root: &Path, path: &Path) -> String {
	let rel = path.strip_prefix(root).unwrap_or(path);
	let parts: Vec<String> =
		rel.components().map(|c| c.as_os_str().to_string_lossy().into_owned()).collect();
	parts.join("/")
}


// vim: ts=4
