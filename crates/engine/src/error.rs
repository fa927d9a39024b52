use query::bootstrap::OptionalFeature;
use runtime::generation::Generation;
use thiserror::Error;

use crate::result::ColumnType;

/// A result set does not have the shape a consumer needs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    #[error("missing column `{0}`")]
    MissingColumn(String),
    #[error("column `{name}` is {found:?}, expected {expected:?}")]
    WrongType {
        name: String,
        expected: ColumnType,
        found: ColumnType,
    },
    #[error("column `{name}` has {found} rows, expected {expected}")]
    LengthMismatch {
        name: String,
        expected: usize,
        found: usize,
    },
    #[error("column `{name}` holds an invalid value: {reason}")]
    InvalidValue { name: String, reason: String },
}

/// Failure reported by the analytical engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("analytical engine unavailable: {0}")]
    Unavailable(String),
    #[error("query failed: {0}")]
    Query(String),
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// User-facing error taxonomy of a browsing session.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    /// Startup failed; nothing can be browsed until a retry succeeds.
    #[error("engine unavailable")]
    EngineUnavailable(#[source] EngineError),
    /// One query generation failed; the previous results stay published.
    #[error("query {generation} failed")]
    QueryFailed {
        generation: Generation,
        #[source]
        source: EngineError,
    },
    /// An optional capability could not be built; browsing continues degraded.
    #[error("{feature} unavailable")]
    OptionalFeatureUnavailable {
        feature: OptionalFeature,
        #[source]
        source: EngineError,
    },
}

impl SessionError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, SessionError::EngineUnavailable(_))
    }
}
