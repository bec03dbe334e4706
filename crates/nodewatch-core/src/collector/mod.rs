//! Host metrics collection for Linux.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                          Collector                            │
//! │  ┌──────────────────────┐  ┌───────────────┐  ┌────────────┐  │
//! │  │  procfs parsers      │  │ sysfs (USB)   │  │  command   │  │
//! │  │  - /proc/loadavg     │  │ - /sys/bus/   │  │  parsers   │  │
//! │  │  - /proc/stat        │  │   usb/devices │  │  - df -H   │  │
//! │  │  - /proc/meminfo     │  └───────┬───────┘  │  - hostna- │  │
//! │  │  - /proc/mounts      │          │          │    mectl   │  │
//! │  │  - /proc/net/route   │          │          │  - journal-│  │
//! │  │  - /proc/uptime      │          │          │    ctl     │  │
//! │  └──────────┬───────────┘          │          └─────┬──────┘  │
//! │             └────────────┬─────────┘                │         │
//! │                   ┌──────▼──────┐          ┌────────▼──────┐  │
//! │                   │  FileSystem │ (trait)  │ CommandRunner │  │
//! │                   └──────┬──────┘          └────────┬──────┘  │
//! └──────────────────────────┼──────────────────────────┼─────────┘
//!                  ┌─────────┴───────┐        ┌─────────┴──────────┐
//!           ┌──────▼─────┐     ┌─────▼────┐ ┌─▼─────────────┐ ┌────▼─────────┐
//!           │   RealFs   │     │  MockFs  │ │SystemCommands │ │ MockCommands │
//!           └────────────┘     └──────────┘ └───────────────┘ └──────────────┘
//! ```
//!
//! # Usage
//!
//! ```
//! use nodewatch_core::collector::{Collector, CollectorConfig};
//! use nodewatch_core::collector::mock::{MockCommands, MockFs};
//!
//! let collector = Collector::new(
//!     MockFs::typical_system(),
//!     MockCommands::typical_system(),
//!     CollectorConfig::default(),
//! );
//! let load = collector.loadavg().unwrap();
//! assert!(load.loadavg1 > 0.0);
//! ```

#[allow(clippy::module_inception)]
mod collector;
pub mod command;
mod error;
mod metric;
pub mod mock;
pub mod procfs;
pub mod sysfs;
pub mod traits;

pub use collector::{Collector, CollectorConfig, UptimeReport};
pub use error::CollectError;
pub use metric::ParsedMetric;
pub use procfs::ParseError;
pub use traits::{CommandRunner, FileSystem, RealFs, SystemCommands};
