//! Parsers for command output.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::collector::procfs::ParseError;

/// One row of `df -H`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiskUsage {
    pub filesystem: String,
    pub size: String,
    pub used: String,
    pub avail: String,
    #[serde(rename = "use%")]
    pub use_percent: String,
    pub mount: String,
}

/// Parses `df -H` output, skipping the header row.
///
/// Sizes are kept as the human-readable strings `df` prints. Mount points with
/// embedded spaces span several trailing columns and are joined back together.
pub fn parse_df(content: &str) -> Result<Vec<DiskUsage>, ParseError> {
    let mut rows = Vec::new();

    for line in content.trim().lines().skip(1) {
        let cols: Vec<&str> = line.split_whitespace().collect();
        if cols.len() < 6 {
            return Err(ParseError::new(format!(
                "not enough columns in df row: expected 6+, got {}",
                cols.len()
            )));
        }

        rows.push(DiskUsage {
            filesystem: cols[0].to_string(),
            size: cols[1].to_string(),
            used: cols[2].to_string(),
            avail: cols[3].to_string(),
            use_percent: cols[4].to_string(),
            mount: cols[5..].join(" "),
        });
    }

    Ok(rows)
}

/// Parses `hostnamectl` output into trimmed `key → value` pairs.
///
/// A value that itself contains a colon is cut at that colon, so
/// `Firmware Date: Mon 2023-01-02` survives but `Hardware Vendor: a:b`
/// is stored as `a`.
pub fn parse_hostnamectl(content: &str) -> Result<BTreeMap<String, String>, ParseError> {
    let mut result = BTreeMap::new();

    for line in content.lines() {
        if line.is_empty() {
            continue;
        }
        let mut parts = line.split(':');
        let key = parts.next().unwrap_or_default();
        let value = parts
            .next()
            .ok_or_else(|| ParseError::new(format!("missing ':' in hostnamectl line {line:?}")))?;

        result.insert(key.trim().to_string(), value.trim().to_string());
    }

    Ok(result)
}

/// Splits `journalctl --list-boots` output into one string per boot.
pub fn parse_boot_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
