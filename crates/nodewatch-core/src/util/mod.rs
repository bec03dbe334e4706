//! Utility modules for nodewatch.

mod time_parser;

pub use time_parser::{TimeParseError, parse_datetime, parse_datetime_with_base};
