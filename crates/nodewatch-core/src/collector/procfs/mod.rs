//! Parsers for the Linux `/proc` filesystem.
//!
//! Everything here is a pure `&str -> Result<_, ParseError>` function; the
//! [`Collector`](crate::collector::Collector) decides which file feeds which parser.

pub mod parser;

pub use parser::{
    CpuTimes, LoadAvg, MountEntry, ParseError, Route, Uptime, hex_to_ipv4, ipv4_to_str,
    parse_cpu_stat, parse_loadavg, parse_meminfo, parse_mounts, parse_routes, parse_uptime,
    unit_multiplier,
};
