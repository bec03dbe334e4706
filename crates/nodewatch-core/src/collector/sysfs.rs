//! USB device enumeration from `/sys/bus/usb/devices`.

use std::io;
use std::path::Path;

use serde::Serialize;
use tracing::{debug, trace};

use crate::collector::traits::FileSystem;

/// Identity attributes of one USB device.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsbDevice {
    pub manufacturer: String,
    pub product: String,
    pub version: String,
    #[serde(rename = "idProduct")]
    pub id_product: String,
    #[serde(rename = "idVendor")]
    pub id_vendor: String,
}

/// Result of scanning the USB device tree.
#[derive(Debug, Clone, Default)]
pub struct UsbScan {
    pub devices: Vec<UsbDevice>,
    /// Entries dropped because at least one attribute file was unreadable.
    pub skipped: usize,
}

/// First line of an attribute file, trimmed.
fn read_attr(fs: &dyn FileSystem, dir: &Path, name: &str) -> io::Result<String> {
    let content = fs.read_to_string(&dir.join(name))?;
    Ok(content.lines().next().unwrap_or("").trim().to_string())
}

fn read_device(fs: &dyn FileSystem, dir: &Path) -> io::Result<UsbDevice> {
    Ok(UsbDevice {
        manufacturer: read_attr(fs, dir, "manufacturer")?,
        product: read_attr(fs, dir, "product")?,
        version: read_attr(fs, dir, "version")?,
        id_product: read_attr(fs, dir, "idProduct")?,
        id_vendor: read_attr(fs, dir, "idVendor")?,
    })
}

/// Scans every entry under `root` (usually `/sys/bus/usb/devices`).
///
/// Interfaces and hubs without a full attribute set are skipped, never
/// reported as partial records. Failing to list `root` itself is an error.
pub fn scan_usb_devices(fs: &dyn FileSystem, root: &Path) -> io::Result<UsbScan> {
    let mut entries = fs.read_dir(root)?;
    entries.sort();

    let mut scan = UsbScan::default();
    for dir in entries {
        match read_device(fs, &dir) {
            Ok(device) => scan.devices.push(device),
            Err(e) => {
                trace!(path = %dir.display(), error = %e, "skipping usb entry");
                scan.skipped += 1;
            }
        }
    }

    debug!(
        found = scan.devices.len(),
        skipped = scan.skipped,
        "usb device scan finished"
    );
    Ok(scan)
}
