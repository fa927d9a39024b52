//! Boundary to the embedded analytical engine.
//!
//! The engine accepts SQL text and answers with a [`ColumnarResultSet`].
//! Everything runs on one cooperative event loop, so futures are local
//! (`!Send`) and boxed for dyn-compatibility.

use futures_util::future::LocalBoxFuture;

use crate::error::EngineError;
use crate::result::ColumnarResultSet;

pub trait AnalyticsEngine {
    /// Runs one read-only statement.
    ///
    /// Calls are idempotent, so a superseded caller may simply drop the
    /// answer when it arrives.
    fn query<'a>(&'a self, sql: &'a str) -> LocalBoxFuture<'a, Result<ColumnarResultSet, EngineError>>;
}
