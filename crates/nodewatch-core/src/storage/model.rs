use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A timestamped, categorized snapshot of one metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "api", derive(utoipa::ToSchema))]
pub struct Observation {
    pub id: u64,
    pub category: String,
    /// Collection time, UTC, microsecond precision.
    pub datetime: DateTime<Utc>,
    #[cfg_attr(feature = "api", schema(value_type = Object))]
    pub data: serde_json::Value,
}

/// Drops sub-microsecond precision so every store round-trips timestamps identically.
pub fn truncate_to_micros(dt: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp_micros(dt.timestamp_micros()).unwrap_or(dt)
}
