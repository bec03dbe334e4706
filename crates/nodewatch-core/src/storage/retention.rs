//! Retention policy: how much observation history a store keeps.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use super::{ObservationStore, StoreError};
use crate::util::{TimeParseError, parse_datetime_with_base};

#[derive(Debug, Error)]
pub enum RetentionError {
    #[error("invalid datetime: {0}")]
    InvalidDatetime(#[from] TimeParseError),

    #[error("retention window of {days} days reaches before the earliest representable time")]
    WindowOutOfRange { days: i64 },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Time window of observations kept by a truncation without an explicit cutoff.
#[derive(Debug, Clone, Copy)]
pub struct RetentionPolicy {
    pub window: Duration,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            window: Duration::days(7),
        }
    }
}

/// Outcome of one truncation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TruncateReport {
    pub cutoff: DateTime<Utc>,
    pub deleted: usize,
    pub remaining: usize,
}

impl RetentionPolicy {
    pub fn new(days: u32) -> Self {
        Self {
            window: Duration::days(i64::from(days)),
        }
    }

    pub fn default_cutoff(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>, RetentionError> {
        now.checked_sub_signed(self.window)
            .ok_or(RetentionError::WindowOutOfRange {
                days: self.window.num_days(),
            })
    }

    /// Parses a user-supplied cutoff, falling back to the policy window when absent.
    ///
    /// Relative inputs such as `-3d` are resolved against `now`.
    pub fn resolve_cutoff(
        &self,
        raw: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<DateTime<Utc>, RetentionError> {
        match raw {
            Some(input) => Ok(parse_datetime_with_base(input, now)?),
            None => self.default_cutoff(now),
        }
    }

    /// Deletes every observation older than `cutoff` and counts what is left.
    ///
    /// The caller must hold exclusive access to `store` for the whole call so
    /// the reported count reflects this deletion only.
    pub fn truncate(
        &self,
        store: &mut dyn ObservationStore,
        cutoff: Option<DateTime<Utc>>,
    ) -> Result<TruncateReport, RetentionError> {
        let cutoff = match cutoff {
            Some(cutoff) => cutoff,
            None => self.default_cutoff(Utc::now())?,
        };
        let deleted = store.delete_before(cutoff)?;
        let remaining = store.count()?;

        info!(%cutoff, deleted, remaining, "observations truncated");
        Ok(TruncateReport {
            cutoff,
            deleted,
            remaining,
        })
    }
}
