use thiserror::Error;

use crate::collector::procfs::ParseError;

/// Failure of a single collection.
#[derive(Debug, Error)]
pub enum CollectError {
    /// The source was read but its content is malformed.
    #[error("failed to parse {source_name}: {error}")]
    Parse {
        source_name: String,
        #[source]
        error: ParseError,
    },

    /// The source could not be read at all (missing file, failed or hung command).
    #[error("{source_name} unavailable: {reason}")]
    SourceUnavailable { source_name: String, reason: String },
}

impl CollectError {
    pub fn parse(source_name: impl Into<String>, error: ParseError) -> Self {
        Self::Parse {
            source_name: source_name.into(),
            error,
        }
    }

    pub fn unavailable(source_name: impl Into<String>, reason: impl ToString) -> Self {
        Self::SourceUnavailable {
            source_name: source_name.into(),
            reason: reason.to_string(),
        }
    }
}
