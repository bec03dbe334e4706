//! Category registry: the fixed table of category name → collector.
//!
//! Built once at startup and handed to the request layer. It is never
//! mutated afterwards, so concurrent lookups need no locking.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::collector::{CollectError, Collector, ParsedMetric};

/// A function that collects one category from a [`Collector`].
pub type CollectFn = fn(&Collector) -> Result<ParsedMetric, CollectError>;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("unknown category: {0}")]
    UnknownCategory(String),

    #[error(transparent)]
    Collect(#[from] CollectError),
}

fn collect_loadavg(c: &Collector) -> Result<ParsedMetric, CollectError> {
    c.loadavg().map(ParsedMetric::LoadAvg)
}

fn collect_cpu(c: &Collector) -> Result<ParsedMetric, CollectError> {
    c.cpu_stats().map(ParsedMetric::Cpu)
}

fn collect_mem(c: &Collector) -> Result<ParsedMetric, CollectError> {
    c.meminfo().map(ParsedMetric::Memory)
}

fn collect_mounts(c: &Collector) -> Result<ParsedMetric, CollectError> {
    c.mounts().map(ParsedMetric::Mounts)
}

fn collect_routes(c: &Collector) -> Result<ParsedMetric, CollectError> {
    c.routes().map(ParsedMetric::Routes)
}

fn collect_uptime(c: &Collector) -> Result<ParsedMetric, CollectError> {
    c.uptime().map(ParsedMetric::Uptime)
}

fn collect_devices(c: &Collector) -> Result<ParsedMetric, CollectError> {
    c.devices().map(ParsedMetric::Devices)
}

fn collect_hostnamectl(c: &Collector) -> Result<ParsedMetric, CollectError> {
    c.hostnamectl().map(ParsedMetric::HostInfo)
}

fn collect_df(c: &Collector) -> Result<ParsedMetric, CollectError> {
    c.disk_usage().map(ParsedMetric::DiskUsage)
}

const STANDARD: [(&str, CollectFn); 9] = [
    ("loadavg", collect_loadavg),
    ("cpu", collect_cpu),
    ("mem", collect_mem),
    ("mounts", collect_mounts),
    ("routes", collect_routes),
    ("uptime", collect_uptime),
    ("devices", collect_devices),
    ("hostnamectl", collect_hostnamectl),
    ("df", collect_df),
];

/// Immutable category table.
#[derive(Debug, Clone)]
pub struct Registry {
    entries: BTreeMap<&'static str, CollectFn>,
}

impl Registry {
    /// The nine categories served by nodewatch.
    pub fn standard() -> Self {
        Self {
            entries: STANDARD.into_iter().collect(),
        }
    }

    /// Registered category names, sorted.
    pub fn categories(&self) -> Vec<&'static str> {
        self.entries.keys().copied().collect()
    }

    pub fn contains(&self, category: &str) -> bool {
        self.entries.contains_key(category)
    }

    /// Looks up the collector for `category`.
    pub fn resolve(&self, category: &str) -> Result<CollectFn, RegistryError> {
        self.entries
            .get(category)
            .copied()
            .ok_or_else(|| RegistryError::UnknownCategory(category.to_string()))
    }

    /// Resolves `category` and runs its collector once.
    pub fn collect(
        &self,
        category: &str,
        collector: &Collector,
    ) -> Result<ParsedMetric, RegistryError> {
        let collect = self.resolve(category)?;
        Ok(collect(collector)?)
    }
}
