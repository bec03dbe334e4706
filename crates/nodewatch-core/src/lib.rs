//! nodewatch-core: shared library for the nodewatch host monitor.
//!
//! Provides:
//! - `collector`: parsers for `/proc`, `/sys` and command output, plus the
//!   `Collector` that binds them to real or mocked sources
//! - `registry`: the immutable category → collector table
//! - `storage`: observation stores (in-memory and append log) and retention
//! - `util`: helper utilities (datetime parsing)

pub mod collector;
pub mod registry;
pub mod storage;
pub mod util;

/// Crate version, shared by every binary in the workspace.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
