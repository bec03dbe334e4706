//! Binds the text sources of a host to the parsers.
//!
//! Each public method performs one blocking read (file or command), hands the
//! text to the matching parser and returns a typed record. Nothing is cached
//! between calls.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;
use tracing::{debug, warn};

use crate::collector::command::{self, DiskUsage};
use crate::collector::error::CollectError;
use crate::collector::procfs::{self, CpuTimes, LoadAvg, MountEntry, Route};
use crate::collector::sysfs::{self, UsbDevice};
use crate::collector::traits::{CommandRunner, FileSystem};

/// Where the collector finds the kernel's virtual filesystems.
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// Mount point of procfs.
    pub proc_path: PathBuf,
    /// Mount point of sysfs.
    pub sys_path: PathBuf,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            proc_path: PathBuf::from("/proc"),
            sys_path: PathBuf::from("/sys"),
        }
    }
}

/// `/proc/uptime` plus the boot history reported by journald.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UptimeReport {
    pub uptime: f64,
    pub idle: f64,
    pub boot_times: Vec<String>,
}

/// Host metrics collector.
pub struct Collector {
    fs: Box<dyn FileSystem>,
    commands: Box<dyn CommandRunner>,
    config: CollectorConfig,
}

impl Collector {
    pub fn new(
        fs: impl FileSystem + 'static,
        commands: impl CommandRunner + 'static,
        config: CollectorConfig,
    ) -> Self {
        Self {
            fs: Box::new(fs),
            commands: Box::new(commands),
            config,
        }
    }

    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    fn read_proc(&self, relative: &str) -> Result<(String, String), CollectError> {
        let path = self.config.proc_path.join(relative);
        let name = path.display().to_string();
        let content = self
            .fs
            .read_to_string(&path)
            .map_err(|e| CollectError::unavailable(&name, e))?;
        Ok((name, content))
    }

    fn run(&self, program: &str, args: &[&str]) -> Result<(String, String), CollectError> {
        let name = if args.is_empty() {
            program.to_string()
        } else {
            format!("{program} {}", args.join(" "))
        };
        let output = self
            .commands
            .run(program, args)
            .map_err(|e| CollectError::unavailable(&name, e))?;
        Ok((name, output))
    }

    /// Reads `/proc/loadavg`.
    pub fn loadavg(&self) -> Result<LoadAvg, CollectError> {
        let (name, content) = self.read_proc("loadavg")?;
        procfs::parse_loadavg(&content).map_err(|e| CollectError::parse(name, e))
    }

    /// Reads the per-CPU tick counters from `/proc/stat`.
    pub fn cpu_stats(&self) -> Result<BTreeMap<String, CpuTimes>, CollectError> {
        let (name, content) = self.read_proc("stat")?;
        procfs::parse_cpu_stat(&content).map_err(|e| CollectError::parse(name, e))
    }

    /// Reads `/proc/meminfo`, values in bytes.
    pub fn meminfo(&self) -> Result<BTreeMap<String, u64>, CollectError> {
        let (name, content) = self.read_proc("meminfo")?;
        procfs::parse_meminfo(&content).map_err(|e| CollectError::parse(name, e))
    }

    /// Reads `/proc/mounts`.
    pub fn mounts(&self) -> Result<BTreeMap<String, MountEntry>, CollectError> {
        let (name, content) = self.read_proc("mounts")?;
        procfs::parse_mounts(&content).map_err(|e| CollectError::parse(name, e))
    }

    /// Reads the IPv4 routing table from `/proc/net/route`.
    pub fn routes(&self) -> Result<Vec<Route>, CollectError> {
        let (name, content) = self.read_proc("net/route")?;
        procfs::parse_routes(&content).map_err(|e| CollectError::parse(name, e))
    }

    /// Lists previous boots via `journalctl --list-boots`.
    pub fn boot_times(&self) -> Result<Vec<String>, CollectError> {
        let (_, output) = self.run("journalctl", &["--list-boots"])?;
        Ok(command::parse_boot_list(&output))
    }

    /// Reads `/proc/uptime` and the boot history.
    ///
    /// Boot history is optional: when journald cannot be queried the report
    /// carries an empty `boot_times`.
    pub fn uptime(&self) -> Result<UptimeReport, CollectError> {
        let (name, content) = self.read_proc("uptime")?;
        let up = procfs::parse_uptime(&content).map_err(|e| CollectError::parse(name, e))?;

        let boot_times = match self.boot_times() {
            Ok(boots) => boots,
            Err(e) => {
                warn!(error = %e, "boot history unavailable");
                Vec::new()
            }
        };

        Ok(UptimeReport {
            uptime: up.uptime,
            idle: up.idle,
            boot_times,
        })
    }

    /// Enumerates USB devices under `<sys>/bus/usb/devices`.
    pub fn devices(&self) -> Result<Vec<UsbDevice>, CollectError> {
        let root = self.config.sys_path.join("bus/usb/devices");
        let scan = sysfs::scan_usb_devices(self.fs.as_ref(), &root)
            .map_err(|e| CollectError::unavailable(root.display().to_string(), e))?;
        if scan.skipped > 0 {
            debug!(
                skipped = scan.skipped,
                "usb entries without identity attributes skipped"
            );
        }
        Ok(scan.devices)
    }

    /// Runs `df -H`.
    pub fn disk_usage(&self) -> Result<Vec<DiskUsage>, CollectError> {
        let (name, output) = self.run("df", &["-H"])?;
        command::parse_df(&output).map_err(|e| CollectError::parse(name, e))
    }

    /// Runs `hostnamectl`.
    pub fn hostnamectl(&self) -> Result<BTreeMap<String, String>, CollectError> {
        let (name, output) = self.run("hostnamectl", &[])?;
        command::parse_hostnamectl(&output).map_err(|e| CollectError::parse(name, e))
    }

    /// Whether procfs is mounted where the collector expects it.
    pub fn proc_available(&self) -> bool {
        self.fs.exists(&self.config.proc_path)
    }
}
