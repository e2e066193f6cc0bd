//! Error types for promisification

use std::fmt;

use promisify_runtime::{ObjectId, RuntimeError};

/// Result type for promisification
pub type PromisifyResult<T> = Result<T, PromisifyError>;

/// Why a wrapper name could not be used
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictReason {
    /// The origin name already ends with the wrapper suffix
    SuffixedOrigin,
    /// An unrelated own member already occupies the wrapper name
    Occupied,
}

/// A rejected (origin, wrapper name) pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictRecord {
    /// Name of the callback-style member
    pub origin: String,
    /// Proposed wrapper name
    pub wrapper: String,
    /// Object the wrapper would have been installed on
    pub owner: ObjectId,
    /// Why the name was rejected
    pub reason: ConflictReason,
}

impl fmt::Display for ConflictRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.reason {
            ConflictReason::SuffixedOrigin => write!(
                f,
                "cannot promisify '{}' on object {}: the name already carries the wrapper suffix and would produce '{}'",
                self.origin, self.owner, self.wrapper
            ),
            ConflictReason::Occupied => write!(
                f,
                "cannot promisify '{}' on object {}: '{}' is already defined by an unrelated member",
                self.origin, self.owner, self.wrapper
            ),
        }
    }
}

/// Promisification errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PromisifyError {
    /// Wrapper name collides with an existing member or the origin is suffixed
    #[error("Naming conflict: {0}")]
    NamingConflict(ConflictRecord),

    /// The configured suffix cannot form member names
    #[error("Invalid wrapper suffix: {0:?}")]
    InvalidSuffix(String),

    /// Object model failure (non-extensible target, read-only slot, ...)
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

impl PromisifyError {
    /// The conflict record, if this is a naming conflict
    pub fn conflict(&self) -> Option<&ConflictRecord> {
        match self {
            PromisifyError::NamingConflict(record) => Some(record),
            _ => None,
        }
    }
}
