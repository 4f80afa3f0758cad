//! Logging prelude module for convenient access to tracing macros.
//!
//! # Usage
//!
//! ```ignore
//! use crate::logging::*;
//!
//! info!("This is an info message");
//! warn!("This is a warning");
//! ```

pub use tracing::{debug, error, info, trace, warn};

/// Initialize the tracing subscriber with environment filter support.
///
/// By default, logs at INFO level and above are displayed. With `verbose`,
/// per-file messages from the copier become visible. The `RUST_LOG`
/// environment variable overrides both:
///
/// ```bash
/// RUST_LOG=debug copyr copy src dst
/// RUST_LOG=copyr::copier=trace copyr copy src dst
/// ```
pub fn init_tracing(verbose: bool) {
	let fallback = if verbose { "copyr=debug" } else { "info" };
	tracing_subscriber::fmt()
		.with_env_filter(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(fallback)),
		)
		.with_writer(std::io::stderr)
		.init();
}

// vim: ts=4
