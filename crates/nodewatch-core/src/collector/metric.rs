//! The transient result of one collection.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::collector::collector::UptimeReport;
use crate::collector::command::DiskUsage;
use crate::collector::procfs::{CpuTimes, LoadAvg, MountEntry, Route};
use crate::collector::sysfs::UsbDevice;

/// Parsed output of one category's collector.
///
/// Serializes untagged: the JSON is exactly the record's own shape, which is
/// what gets stored as an observation's `data`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParsedMetric {
    LoadAvg(LoadAvg),
    Cpu(BTreeMap<String, CpuTimes>),
    Memory(BTreeMap<String, u64>),
    Mounts(BTreeMap<String, MountEntry>),
    Routes(Vec<Route>),
    Uptime(UptimeReport),
    Devices(Vec<UsbDevice>),
    DiskUsage(Vec<DiskUsage>),
    HostInfo(BTreeMap<String, String>),
}

impl ParsedMetric {
    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_untagged_json_shape() {
        let metric = ParsedMetric::LoadAvg(LoadAvg {
            loadavg1: 1.0,
            loadavg5: 0.5,
            loadavg10: 0.25,
        });
        assert_eq!(
            metric.to_json().unwrap(),
            json!({"loadavg1": 1.0, "loadavg5": 0.5, "loadavg10": 0.25})
        );
    }

    #[test]
    fn test_uptime_json_shape() {
        let metric = ParsedMetric::Uptime(UptimeReport {
            uptime: 10.5,
            idle: 3.0,
            boot_times: vec![],
        });
        assert_eq!(
            metric.to_json().unwrap(),
            json!({"uptime": 10.5, "idle": 3.0, "boot_times": []})
        );
    }
}
