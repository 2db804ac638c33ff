use thiserror::Error;
use waypoint_core::{RuleError, StorageError};

#[derive(Debug, Error)]
pub enum RedirectorError {
    /// The backing store failed while an index was being rebuilt.
    #[error("failed to rebuild {kind} index: {source}")]
    Rebuild {
        kind: &'static str,
        #[source]
        source: StorageError,
    },
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("invalid rule: {0}")]
    InvalidRule(#[from] RuleError),
}

impl RedirectorError {
    /// Whether the failure came from an unreachable backend rather than
    /// from bad input or bad data.
    pub fn is_unavailable(&self) -> bool {
        match self {
            RedirectorError::Rebuild { source, .. } | RedirectorError::Storage(source) => {
                source.is_unavailable()
            }
            RedirectorError::InvalidRule(_) => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, RedirectorError>;
