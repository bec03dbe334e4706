//! Parsers for the output of external commands (`df`, `hostnamectl`, `journalctl`).

pub mod parser;

pub use parser::{DiskUsage, parse_boot_list, parse_df, parse_hostnamectl};
