//! Top-level error taxonomy for a mapping run.
//!
//! Only `Connection` and `NotReady` are fatal to a run. The two service
//! variants are recovered per column: the engine downgrades the column to
//! unmapped and logs the error instead of returning it.

use thiserror::Error;

use crate::db::DatabaseError;
use crate::index::IndexError;
use crate::resolve::ServiceError;

#[derive(Debug, Error)]
pub enum MapperError {
    /// The source schema could not be opened or read.
    #[error("connection error: {0}")]
    Connection(#[from] DatabaseError),

    /// A candidate query was issued before the index was built.
    #[error("candidate index is not ready: {0}")]
    NotReady(String),

    /// The reasoning service returned something other than the expected JSON object.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Network failure or timeout that outlived the retry budget.
    #[error("transient service error: {0}")]
    TransientService(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

impl From<IndexError> for MapperError {
    fn from(err: IndexError) -> Self {
        match err {
            IndexError::NotReady(collection) => Self::NotReady(collection),
            IndexError::Embedding(inner) => inner.into(),
        }
    }
}

impl From<ServiceError> for MapperError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::MalformedResponse(msg) => Self::MalformedResponse(msg),
            ServiceError::Transient(msg) | ServiceError::Rejected { message: msg, .. } => {
                Self::TransientService(msg)
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, MapperError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_errors_map_to_taxonomy() {
        let err: MapperError = IndexError::NotReady("modern_schema".to_string()).into();
        assert!(matches!(err, MapperError::NotReady(ref c) if c == "modern_schema"));

        let err: MapperError =
            IndexError::Embedding(ServiceError::Transient("timeout".to_string())).into();
        assert!(matches!(err, MapperError::TransientService(_)));
    }

    #[test]
    fn test_service_errors_map_to_taxonomy() {
        let err: MapperError = ServiceError::MalformedResponse("not json".to_string()).into();
        assert!(matches!(err, MapperError::MalformedResponse(_)));
        assert!(err.to_string().contains("not json"));
    }
}
