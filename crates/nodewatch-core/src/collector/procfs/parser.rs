//! Parsers for `/proc` filesystem files.
//!
//! These are pure functions that parse the content of various `/proc` files
//! into structured data. They are designed to be easily testable with string inputs.

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

/// Error type for parsing failures.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("parse error: {message}")]
pub struct ParseError {
    pub message: String,
}

impl ParseError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
        }
    }
}

fn parse_num<T: std::str::FromStr>(value: &str, name: &str) -> Result<T, ParseError> {
    value
        .parse()
        .map_err(|_| ParseError::new(format!("invalid {name}: {value:?}")))
}

// ============ Load Average ============

/// Parsed data from `/proc/loadavg`.
///
/// The third key is spelled `loadavg10` on the wire even though the kernel
/// reports a 15-minute average; stored observations depend on that name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoadAvg {
    pub loadavg1: f64,
    pub loadavg5: f64,
    pub loadavg10: f64,
}

/// Parses `/proc/loadavg` content. Only the first line is considered.
pub fn parse_loadavg(content: &str) -> Result<LoadAvg, ParseError> {
    let line = content.lines().next().unwrap_or("");
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 3 {
        return Err(ParseError::new(format!(
            "not enough fields in loadavg: expected 3+, got {}",
            parts.len()
        )));
    }

    Ok(LoadAvg {
        loadavg1: parse_num(parts[0], "load1")?,
        loadavg5: parse_num(parts[1], "load5")?,
        loadavg10: parse_num(parts[2], "load15")?,
    })
}

// ============ CPU Stats ============

/// Tick counters of a single `cpu*` line from `/proc/stat`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CpuTimes {
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
    pub iowait: u64,
    pub softirq: u64,
}

/// Parses the `cpu*` lines of `/proc/stat`, keyed by the cpu token
/// (`"cpu"` for the aggregate line, `"cpu0"`, `"cpu1"`, ...).
///
/// The sixth counter is taken from column 6, which on current kernels is the
/// `irq` column; it is reported under the `softirq` key as the stored history
/// always has.
pub fn parse_cpu_stat(content: &str) -> Result<BTreeMap<String, CpuTimes>, ParseError> {
    let mut cpus = BTreeMap::new();

    for line in content.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let Some(&name) = parts.first() else {
            continue;
        };
        if !name.starts_with("cpu") {
            continue;
        }
        if parts.len() < 7 {
            return Err(ParseError::new(format!(
                "not enough fields for {name}: expected 7+, got {}",
                parts.len()
            )));
        }

        cpus.insert(
            name.to_string(),
            CpuTimes {
                user: parse_num(parts[1], "user")?,
                nice: parse_num(parts[2], "nice")?,
                system: parse_num(parts[3], "system")?,
                idle: parse_num(parts[4], "idle")?,
                iowait: parse_num(parts[5], "iowait")?,
                softirq: parse_num(parts[6], "softirq")?,
            },
        );
    }

    Ok(cpus)
}

// ============ Memory ============

/// Byte multiplier for a `/proc/meminfo` unit suffix.
pub fn unit_multiplier(unit: Option<&str>) -> Result<u64, ParseError> {
    match unit {
        None => Ok(1),
        Some("kB") => Ok(1024),
        Some("mB") => Ok(1024 * 1024),
        Some("gB") => Ok(1024 * 1024 * 1024),
        Some(other) => Err(ParseError::new(format!("unknown unit {other:?}"))),
    }
}

/// Parses `/proc/meminfo` into a map of key → byte count.
///
/// Values without a unit (e.g. `HugePages_Total`) are kept as raw integers.
/// Duplicate keys: the last occurrence wins.
pub fn parse_meminfo(content: &str) -> Result<BTreeMap<String, u64>, ParseError> {
    let mut info = BTreeMap::new();

    for line in content.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let (key, rhs) = line
            .split_once(':')
            .ok_or_else(|| ParseError::new(format!("missing ':' in meminfo line {line:?}")))?;
        let key = key.trim();

        let value = match rhs.split_whitespace().collect::<Vec<_>>().as_slice() {
            [n] => parse_num::<u64>(n, key)?,
            [n, unit] => {
                let n: u64 = parse_num(n, key)?;
                n.checked_mul(unit_multiplier(Some(*unit))?)
                    .ok_or_else(|| ParseError::new(format!("{key} overflows u64")))?
            }
            other => {
                return Err(ParseError::new(format!(
                    "expected 'value [unit]' for {key}, got {} tokens",
                    other.len()
                )));
            }
        };

        info.insert(key.to_string(), value);
    }

    Ok(info)
}

// ============ Mounts ============

/// One entry of `/proc/mounts`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MountEntry {
    pub dev: String,
    #[serde(rename = "type")]
    pub fs_type: String,
    pub attr: String,
}

/// Parses `/proc/mounts` into a map of mount point → entry.
///
/// Format: `device mountpoint type options dump pass`. Stacked mounts on the
/// same mount point collapse to the last one listed.
pub fn parse_mounts(content: &str) -> Result<BTreeMap<String, MountEntry>, ParseError> {
    let mut mounts = BTreeMap::new();

    for line in content.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.is_empty() {
            continue;
        }
        if parts.len() < 4 {
            return Err(ParseError::new(format!(
                "not enough fields in mounts line: expected 4+, got {}",
                parts.len()
            )));
        }

        mounts.insert(
            parts[1].to_string(),
            MountEntry {
                dev: parts[0].to_string(),
                fs_type: parts[2].to_string(),
                attr: parts[3].to_string(),
            },
        );
    }

    Ok(mounts)
}

// ============ Routes ============

/// Decodes an IPv4 address stored as little-endian hex, as in `/proc/net/route`.
///
/// `"0100007F"` → `[127, 0, 0, 1]`.
pub fn hex_to_ipv4(hex: &str) -> Result<[u8; 4], ParseError> {
    if hex.is_empty() || hex.len() > 8 {
        return Err(ParseError::new(format!("invalid address hex {hex:?}")));
    }
    let raw = u32::from_str_radix(hex, 16)
        .map_err(|_| ParseError::new(format!("invalid address hex {hex:?}")))?;
    Ok(raw.to_le_bytes())
}

/// Renders an address as dotted decimal.
pub fn ipv4_to_str(ip: [u8; 4]) -> String {
    format!("{}.{}.{}.{}", ip[0], ip[1], ip[2], ip[3])
}

/// One row of the kernel routing table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Route {
    pub iface: String,
    pub dest: String,
    pub gateway: String,
    pub mask: String,
}

/// Parses `/proc/net/route`.
///
/// Columns are located through the header row, so a kernel that reorders or
/// adds columns is still read correctly.
/// Format:
/// Iface   Destination Gateway  Flags RefCnt Use Metric Mask     MTU Window IRTT
/// eth0    00000000    0102A8C0 0003  0      0   100    00000000 0   0      0
pub fn parse_routes(content: &str) -> Result<Vec<Route>, ParseError> {
    let mut lines = content.lines();
    let header: Vec<&str> = lines
        .next()
        .ok_or_else(|| ParseError::new("missing route header"))?
        .split_whitespace()
        .collect();

    let column = |name: &str| -> Result<usize, ParseError> {
        header
            .iter()
            .position(|h| *h == name)
            .ok_or_else(|| ParseError::new(format!("route header lacks {name} column")))
    };
    let iface_col = column("Iface")?;
    let dest_col = column("Destination")?;
    let gateway_col = column("Gateway")?;
    let mask_col = column("Mask")?;

    let mut routes = Vec::new();
    for line in lines {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.is_empty() {
            continue;
        }
        let field = |idx: usize| -> Result<&str, ParseError> {
            fields.get(idx).copied().ok_or_else(|| {
                ParseError::new(format!(
                    "route row has {} fields, need column {}",
                    fields.len(),
                    idx + 1
                ))
            })
        };

        routes.push(Route {
            iface: field(iface_col)?.to_string(),
            dest: ipv4_to_str(hex_to_ipv4(field(dest_col)?)?),
            gateway: ipv4_to_str(hex_to_ipv4(field(gateway_col)?)?),
            mask: ipv4_to_str(hex_to_ipv4(field(mask_col)?)?),
        });
    }

    Ok(routes)
}

// ============ Uptime ============

/// Parsed data from `/proc/uptime`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Uptime {
    pub uptime: f64,
    pub idle: f64,
}

/// Parses `/proc/uptime`: seconds since boot and aggregate idle seconds.
pub fn parse_uptime(content: &str) -> Result<Uptime, ParseError> {
    let line = content.lines().next().unwrap_or("");
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 2 {
        return Err(ParseError::new(format!(
            "not enough fields in uptime: expected 2, got {}",
            parts.len()
        )));
    }

    Ok(Uptime {
        uptime: parse_num(parts[0], "uptime")?,
        idle: parse_num(parts[1], "idle")?,
    })
}
