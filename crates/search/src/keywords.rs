use std::rc::Rc;

use engine::engine::AnalyticsEngine;
use engine::error::{EngineError, SchemaError};
use engine::result::ColumnarResultSet;
use futures_util::FutureExt;
use futures_util::future::LocalBoxFuture;
use query::keywords::suggestion_sql;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const SUGGESTION_LIMIT: usize = 10;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionKind {
    Actor,
    Location,
    City,
}

impl SuggestionKind {
    /// Unknown kinds are shown as actors.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "location" => SuggestionKind::Location,
            "city" => SuggestionKind::City,
            "actor" => SuggestionKind::Actor,
            other => {
                debug!(kind = other, "unknown keyword kind");
                SuggestionKind::Actor
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub term: String,
    #[serde(rename = "type")]
    pub kind: SuggestionKind,
    pub frequency: i64,
}

/// Read-only prefix lookups against the precomputed keyword table.
#[derive(Clone)]
pub struct KeywordIndex {
    engine: Rc<dyn AnalyticsEngine>,
    available: bool,
    limit: usize,
}

impl KeywordIndex {
    /// `available` is false when the keyword table failed to build.
    pub fn new(engine: Rc<dyn AnalyticsEngine>, available: bool) -> Self {
        Self {
            engine,
            available,
            limit: SUGGESTION_LIMIT,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Most frequent terms starting with `prefix`.
    pub fn lookup(&self, prefix: &str) -> LocalBoxFuture<'static, Result<Vec<Suggestion>, EngineError>> {
        let engine = Rc::clone(&self.engine);
        let sql = suggestion_sql(prefix, self.limit);
        async move {
            let rs = engine.query(&sql).await?;
            Ok(parse_suggestions(&rs)?)
        }
        .boxed_local()
    }
}

/// Reads `(term, type, frequency)` rows; rows with a NULL term are skipped.
pub fn parse_suggestions(rs: &ColumnarResultSet) -> Result<Vec<Suggestion>, SchemaError> {
    if rs.num_rows() == 0 {
        return Ok(Vec::new());
    }
    let terms = rs.utf8("term")?;
    let kinds = rs.utf8("type")?;
    let freqs = rs.int64("frequency")?;
    Ok(terms
        .iter()
        .zip(kinds)
        .zip(freqs)
        .filter_map(|((term, kind), freq)| {
            Some(Suggestion {
                term: term.clone()?,
                kind: SuggestionKind::parse(kind.as_deref().unwrap_or("")),
                frequency: freq.unwrap_or(0),
            })
        })
        .collect())
}
