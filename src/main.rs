use clap::{Arg, ArgAction, ArgMatches, Command};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use copyr::config::{self, FileConfig};
use copyr::copier::Copier;
use copyr::db::{ReportFormat, SyncDb};
use copyr::dbcli::{self, SortKey};
use copyr::error::{ConfigError, CopyError};
use copyr::filter::FileFilter;
use copyr::hasher::{FileHasher, HashAlgorithm};
use copyr::logging::{self, *};
use copyr::progress::CliProgress;
use copyr::types::{CopyMode, FileStatus, SyncMode};

fn build_cli() -> Command {
	Command::new("copyr")
		.version("0.1.0")
		.about("Directory synchronization with a persistent sync-state database")
		.subcommand_required(true)
		.arg(
			Arg::new("verbose")
				.short('v')
				.long("verbose")
				.action(ArgAction::SetTrue)
				.global(true)
				.help("Per-file log messages"),
		)
		.arg(
			Arg::new("config")
				.short('c')
				.long("config")
				.value_name("FILE")
				.global(true)
				.help("Run description file (TOML or JSON5)"),
		)
		.subcommand(copy_like_command(
			Command::new("copy").about("Copy a source tree into a destination"),
		))
		.subcommand(copy_like_command(
			Command::new("verify")
				.about("Hash-compare a source tree against an existing destination"),
		))
		.subcommand(
			Command::new("hash")
				.about("Print digests of a file or directory tree")
				.arg(Arg::new("path").required(true).value_name("PATH"))
				.arg(
					Arg::new("algorithm")
						.short('a')
						.long("algorithm")
						.value_name("ALG")
						.default_value("sha256")
						.help("md5, sha1 or sha256"),
				)
				.arg(
					Arg::new("no-recursive")
						.long("no-recursive")
						.action(ArgAction::SetTrue)
						.help("Do not descend into subdirectories"),
				),
		)
		.subcommand(
			Command::new("compare")
				.about("Hash both trees and report every difference")
				.arg(Arg::new("src").required(true).value_name("SRC"))
				.arg(Arg::new("dst").required(true).value_name("DST"))
				.arg(
					Arg::new("algorithm")
						.short('a')
						.long("algorithm")
						.value_name("ALG")
						.default_value("sha256"),
				)
				.arg(
					Arg::new("no-recursive")
						.long("no-recursive")
						.action(ArgAction::SetTrue),
				),
		)
		.subcommand(
			Command::new("db")
				.about("Inspect and maintain the sync-state database")
				.subcommand_required(true)
				.arg(
					Arg::new("db")
						.long("db")
						.value_name("FILE")
						.help("Database location (defaults to the config file value)"),
				)
				.arg(
					Arg::new("sync-mode")
						.long("sync-mode")
						.value_name("MODE")
						.help("normal, initial or incremental"),
				)
				.subcommand(
					Command::new("list")
						.about("Enumerate file records")
						.arg(
							Arg::new("sort")
								.long("sort")
								.value_name("KEY")
								.default_value("path")
								.help("path, size, mod_time, status or last_sync_time"),
						)
						.arg(
							Arg::new("status")
								.long("status")
								.value_name("STATUS")
								.help("Only records with this status"),
						)
						.arg(Arg::new("limit").long("limit").value_name("N")),
				)
				.subcommand(Command::new("stats").about("Aggregate counts and session history"))
				.subcommand(
					Command::new("export")
						.about("Write all records to a file")
						.arg(Arg::new("out").required(true).value_name("OUT"))
						.arg(
							Arg::new("format")
								.long("format")
								.value_name("FORMAT")
								.default_value("csv")
								.help("csv or json"),
						),
				)
				.subcommand(
					Command::new("clean")
						.about("Remove records older than N days")
						.arg(
							Arg::new("days")
								.long("days")
								.value_name("N")
								.default_value("30"),
						),
				)
				.subcommand(
					Command::new("reset")
						.about("Truncate the file table (Initial mode only)")
						.arg(
							Arg::new("yes")
								.short('y')
								.long("yes")
								.action(ArgAction::SetTrue)
								.help("Skip the confirmation prompt"),
						),
				),
		)
}

/// Flags shared by `copy` and `verify`
fn copy_like_command(cmd: Command) -> Command {
	cmd.arg(Arg::new("src").value_name("SRC"))
		.arg(Arg::new("dst").value_name("DST"))
		.arg(Arg::new("include").long("include").value_name("PATTERNS").help("Comma-separated include globs"))
		.arg(Arg::new("exclude").long("exclude").value_name("PATTERNS").help("Comma-separated exclude globs"))
		.arg(Arg::new("db").long("db").value_name("FILE").help("Attach a sync-state database"))
		.arg(Arg::new("sync-mode").long("sync-mode").value_name("MODE").help("normal, initial or incremental"))
		.arg(Arg::new("mode").long("mode").value_name("MODE").help("copy, verify or copy-and-verify"))
		.arg(Arg::new("algorithm").short('a').long("algorithm").value_name("ALG").help("md5, sha1 or sha256"))
		.arg(Arg::new("retries").long("retries").value_name("N").help("Additional attempts per file"))
		.arg(Arg::new("retry-delay-ms").long("retry-delay-ms").value_name("MS"))
		.arg(Arg::new("max-concurrent").long("max-concurrent").value_name("N").help("Worker pool size"))
		.arg(Arg::new("buffer-size").long("buffer-size").value_name("BYTES"))
		.arg(Arg::new("timeout").long("timeout").value_name("SECS").help("Cancel the run after this many seconds"))
		.arg(
			Arg::new("verify-hash")
				.long("verify-hash")
				.action(ArgAction::SetTrue)
				.help("Hash-verify every copied file"),
		)
		.arg(
			Arg::new("no-overwrite")
				.long("no-overwrite")
				.action(ArgAction::SetTrue)
				.help("Never replace an existing destination file"),
		)
		.arg(
			Arg::new("no-recursive")
				.long("no-recursive")
				.action(ArgAction::SetTrue)
				.help("Do not descend into subdirectories"),
		)
		.arg(
			Arg::new("progress")
				.long("progress")
				.action(ArgAction::SetTrue)
				.help("Show a progress bar on stderr"),
		)
}

#[tokio::main]
async fn main() {
	let matches = build_cli().get_matches();
	logging::init_tracing(matches.get_flag("verbose"));

	let code = match run(&matches).await {
		Ok(code) => code,
		Err(e) => {
			error!("{}", e);
			e.exit_code()
		}
	};
	std::process::exit(code);
}

async fn run(matches: &ArgMatches) -> Result<i32, CopyError> {
	let config = match matches.get_one::<String>("config") {
		Some(path) => config::load_file(Path::new(path))?,
		None => FileConfig::default(),
	};

	match matches.subcommand() {
		Some(("copy", sub)) => run_copy(sub, config, None).await,
		Some(("verify", sub)) => run_copy(sub, config, Some(CopyMode::Verify)).await,
		Some(("hash", sub)) => run_hash(sub),
		Some(("compare", sub)) => run_compare(sub),
		Some(("db", sub)) => run_db(sub, config),
		_ => Ok(0),
	}
}

async fn run_copy(
	sub: &ArgMatches,
	mut config: FileConfig,
	forced_mode: Option<CopyMode>,
) -> Result<i32, CopyError> {
	apply_copy_flags(sub, &mut config)?;
	if let Some(mode) = forced_mode {
		config.options.mode = mode;
	}

	let src = sub
		.get_one::<String>("src")
		.map(PathBuf::from)
		.or_else(|| config.source.clone())
		.ok_or_else(|| missing("source"))?;
	let dst = sub
		.get_one::<String>("dst")
		.map(PathBuf::from)
		.or_else(|| config.dest.clone())
		.ok_or_else(|| missing("destination"))?;

	let db = open_sync_db(
		sub.get_one::<String>("db").map(PathBuf::from).or_else(|| config.sync_db.clone()),
		resolve_sync_mode(sub, &config)?,
	)?;

	let filter = FileFilter::new(&config.include, &config.exclude);
	let copier = Copier::new(src, dst, config.options, filter, db)?;

	if let Some(secs) = parse_num::<u64>(sub, "timeout")? {
		copier.set_timeout(Duration::from_secs(secs));
	}
	if sub.get_flag("progress") {
		copier.set_progress_callback(Box::new(CliProgress::new()));
	}

	// Ctrl-C follows the same path as cancel()/timeout
	let token = copier.cancel_token();
	tokio::spawn(async move {
		if tokio::signal::ctrl_c().await.is_ok() {
			warn!("Interrupt received, cancelling");
			token.cancel();
		}
	});

	copier.copy_files().await?;
	Ok(0)
}

fn apply_copy_flags(sub: &ArgMatches, config: &mut FileConfig) -> Result<(), CopyError> {
	if let Some(include) = sub.get_one::<String>("include") {
		config.include = include.clone();
	}
	if let Some(exclude) = sub.get_one::<String>("exclude") {
		config.exclude = exclude.clone();
	}
	if let Some(mode) = sub.get_one::<String>("mode") {
		config.options.mode = mode.parse()?;
	}
	if let Some(algorithm) = sub.get_one::<String>("algorithm") {
		config.options.hash_algorithm = algorithm.clone();
	}
	if let Some(n) = parse_num::<u32>(sub, "retries")? {
		config.options.max_retries = n;
	}
	if let Some(ms) = parse_num::<u64>(sub, "retry-delay-ms")? {
		config.options.retry_delay_ms = ms;
	}
	if let Some(n) = parse_num::<usize>(sub, "max-concurrent")? {
		config.options.max_concurrent = n;
	}
	if let Some(bytes) = parse_num::<i64>(sub, "buffer-size")? {
		config.options.buffer_size = bytes;
	}
	if sub.get_flag("verify-hash") {
		config.options.verify_hash = true;
	}
	if sub.get_flag("no-overwrite") {
		config.options.overwrite_existing = false;
	}
	if sub.get_flag("no-recursive") {
		config.options.recursive = false;
	}
	Ok(())
}

fn resolve_sync_mode(sub: &ArgMatches, config: &FileConfig) -> Result<SyncMode, CopyError> {
	match sub.get_one::<String>("sync-mode") {
		Some(mode) => Ok(mode.parse::<SyncMode>()?),
		None => Ok(config.sync_mode()?),
	}
}

/// Open the database when a location is known. Initial mode resets the file
/// table right away, then behaves like Normal for the rest of the run.
fn open_sync_db(
	path: Option<PathBuf>,
	mode: SyncMode,
) -> Result<Option<Arc<SyncDb>>, CopyError> {
	let path = match path {
		Some(p) => p,
		None => return Ok(None),
	};
	let db = SyncDb::open(&path, mode)?;
	if mode == SyncMode::Initial {
		db.reset()?;
	}
	Ok(Some(Arc::new(db)))
}

fn run_hash(sub: &ArgMatches) -> Result<i32, CopyError> {
	let path = PathBuf::from(required(sub, "path")?);
	let hasher = FileHasher::new(parse_algorithm(sub)?, 0);

	let meta = std::fs::metadata(&path)
		.map_err(|_| CopyError::SourceMissing { path: path.clone() })?;

	if meta.is_dir() {
		let hashes = hasher.hash_directory(&path, !sub.get_flag("no-recursive"))?;
		for (rel, digest) in &hashes {
			println!("{}  {}", digest, rel);
		}
	} else {
		println!("{}  {}", hasher.hash_file(&path)?, path.display());
	}
	Ok(0)
}

fn run_compare(sub: &ArgMatches) -> Result<i32, CopyError> {
	let src = PathBuf::from(required(sub, "src")?);
	let dst = PathBuf::from(required(sub, "dst")?);
	let hasher = FileHasher::new(parse_algorithm(sub)?, 0);

	let diffs = hasher.compare_directories(&src, &dst, !sub.get_flag("no-recursive"))?;
	for diff in &diffs {
		println!("{}", diff);
	}

	if diffs.is_empty() {
		info!("Trees are identical");
		Ok(0)
	} else {
		info!("{} difference(s) found", diffs.len());
		Ok(1)
	}
}

fn run_db(sub: &ArgMatches, config: FileConfig) -> Result<i32, CopyError> {
	let path = sub
		.get_one::<String>("db")
		.map(PathBuf::from)
		.or_else(|| config.sync_db.clone())
		.ok_or_else(|| missing("database location"))?;
	let mode = match sub.get_one::<String>("sync-mode") {
		Some(mode) => mode.parse::<SyncMode>()?,
		None => config.sync_mode()?,
	};
	let db = SyncDb::open(&path, mode)?;

	match sub.subcommand() {
		Some(("list", sub)) => {
			let sort: SortKey = required(sub, "sort")?.parse()?;
			let status = match sub.get_one::<String>("status") {
				Some(s) => Some(s.parse::<FileStatus>()?),
				None => None,
			};
			let limit = parse_num::<usize>(sub, "limit")?;
			dbcli::list(&db, sort, status, limit)?;
		}
		Some(("stats", _)) => dbcli::stats(&db)?,
		Some(("export", sub)) => {
			let out = PathBuf::from(required(sub, "out")?);
			let format: ReportFormat = required(sub, "format")?.parse()?;
			dbcli::export(&db, &out, format)?;
		}
		Some(("clean", sub)) => {
			let days = parse_num::<u64>(sub, "days")?.unwrap_or(30);
			dbcli::clean(&db, days)?;
		}
		Some(("reset", sub)) => {
			dbcli::reset(&db, sub.get_flag("yes"))?;
		}
		_ => {}
	}

	Ok(0)
}

fn parse_algorithm(sub: &ArgMatches) -> Result<HashAlgorithm, CopyError> {
	let name = required(sub, "algorithm")?;
	name.parse::<HashAlgorithm>().map_err(|_| {
		CopyError::Config(ConfigError::UnknownAlgorithm { algorithm: name.to_string() })
	})
}

fn required<'a>(sub: &'a ArgMatches, name: &str) -> Result<&'a String, CopyError> {
	sub.get_one::<String>(name).ok_or_else(|| missing(name))
}

fn missing(what: &str) -> CopyError {
	CopyError::Config(ConfigError::InvalidValue {
		key: what.to_string(),
		message: "required but not given on the command line or in the config file".to_string(),
	})
}

fn parse_num<T: std::str::FromStr>(sub: &ArgMatches, name: &str) -> Result<Option<T>, CopyError> {
	match sub.get_one::<String>(name) {
		Some(raw) => raw.parse::<T>().map(Some).map_err(|_| {
			CopyError::Config(ConfigError::InvalidValue {
				key: name.to_string(),
				message: format!("not a valid number: {}", raw),
			})
		}),
		None => Ok(None),
	}
}

// vim: ts=4
