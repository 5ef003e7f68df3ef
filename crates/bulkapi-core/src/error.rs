//! Error types for the bulk API client.

use std::fmt;

/// The main error type for bulk API client operations.
///
/// The first group of variants are local validation failures raised while a
/// query is being built or compiled; they never reach the network and are
/// never worth retrying.
#[derive(Debug)]
pub enum Error {
    /// A field list could not be normalized
    InvalidFieldSpec(String),

    /// A lookup named an operator outside the recognized set
    InvalidFilterOperator {
        /// The lookup key or field path the operator was attached to
        key: String,
        /// The rejected operator name
        operator: String,
    },

    /// An `and`/`or`/`not` group had the wrong shape
    InvalidFilterGroup {
        /// The group keyword
        group: String,
        /// What was wrong with it
        reason: String,
    },

    /// Two AND-ed lookups compiled to the same wire parameter
    FilterConflict {
        /// The colliding parameter key
        key: String,
    },

    /// Requested page size is above the remote API's maximum
    PageSizeExceeded {
        /// Requested page size
        requested: usize,
        /// Largest accepted page size
        max: usize,
    },

    /// Malformed lookup key or a value that does not fit its operator
    InvalidLookup {
        /// The lookup key as written by the caller
        key: String,
        /// What was wrong with it
        reason: String,
    },

    /// `page` or `page_size` was not a positive integer
    InvalidPagination {
        /// Parameter name
        name: &'static str,
        /// Rejected value
        value: usize,
    },

    /// An ordering entry was empty
    InvalidOrder(String),

    /// A structured-text document could not be parsed
    StructuredText(String),

    /// Serialization/deserialization error
    Serialization(String),

    /// Error reported by the HTTP transport collaborator
    Transport(String),

    /// The remote API answered with a non-success status
    Api {
        /// HTTP status code
        status: u16,
        /// Response body, lossily decoded
        body: String,
    },

    /// Unknown app or model
    NotFound(String),

    /// Attempt to write a read-only model property
    ReadOnlyField(String),

    /// Invalid operation
    InvalidOperation(String),

    /// Lock poisoned (concurrent access error)
    LockPoisoned,

    /// I/O error
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidFieldSpec(msg) => write!(f, "Invalid field spec: {}", msg),
            Error::InvalidFilterOperator { key, operator } => write!(
                f,
                "Invalid filter operator '{}' in lookup '{}'",
                operator, key
            ),
            Error::InvalidFilterGroup { group, reason } => {
                write!(f, "Invalid filter group '{}': {}", group, reason)
            }
            Error::FilterConflict { key } => write!(
                f,
                "Filter conflict: parameter '{}' is set more than once in the same AND group",
                key
            ),
            Error::PageSizeExceeded { requested, max } => write!(
                f,
                "Page size {} exceeds maximum {}",
                requested, max
            ),
            Error::InvalidLookup { key, reason } => {
                write!(f, "Invalid lookup '{}': {}", key, reason)
            }
            Error::InvalidPagination { name, value } => write!(
                f,
                "Invalid pagination: {} must be a positive integer, got {}",
                name, value
            ),
            Error::InvalidOrder(msg) => write!(f, "Invalid order: {}", msg),
            Error::StructuredText(msg) => write!(f, "Structured text error: {}", msg),
            Error::Serialization(msg) => write!(f, "Serialization error: {}", msg),
            Error::Transport(msg) => write!(f, "Transport error: {}", msg),
            Error::Api { status, body } => write!(f, "API error {}: {}", status, body),
            Error::NotFound(msg) => write!(f, "Not found: {}", msg),
            Error::ReadOnlyField(field) => {
                write!(f, "Cannot set read only property '{}'", field)
            }
            Error::InvalidOperation(msg) => write!(f, "Invalid operation: {}", msg),
            Error::LockPoisoned => write!(f, "Lock poisoned"),
            Error::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::StructuredText(err.to_string())
    }
}

impl Error {
    /// Returns `true` for the local validation failures that are raised
    /// before any request is sent.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::InvalidFieldSpec(_)
                | Error::InvalidFilterOperator { .. }
                | Error::InvalidFilterGroup { .. }
                | Error::FilterConflict { .. }
                | Error::PageSizeExceeded { .. }
                | Error::InvalidLookup { .. }
                | Error::InvalidPagination { .. }
                | Error::InvalidOrder(_)
                | Error::StructuredText(_)
        )
    }
}

/// A specialized `Result` type for bulk API client operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_offender() {
        let err = Error::InvalidFilterOperator {
            key: "id__gtee".to_string(),
            operator: "gtee".to_string(),
        };
        assert!(err.to_string().contains("gtee"));
        assert!(err.to_string().contains("id__gtee"));

        let err = Error::PageSizeExceeded {
            requested: 500,
            max: 100,
        };
        assert_eq!(err.to_string(), "Page size 500 exceeds maximum 100");
    }

    #[test]
    fn test_validation_classification() {
        assert!(Error::FilterConflict {
            key: "id__gte".to_string()
        }
        .is_validation());
        assert!(!Error::Transport("timed out".to_string()).is_validation());
        assert!(!Error::Api {
            status: 500,
            body: String::new()
        }
        .is_validation());
    }
}
