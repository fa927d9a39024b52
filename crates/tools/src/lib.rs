//! Offline helpers behind the `eventmap` binary: everything here is pure
//! text in, text out, so it can run without an engine.

use filters::state::FilterState;
use foundation::date::{DateError, SqlDate};
use foundation::ids::EventId;
use query::bootstrap::{bootstrap_plan, DATE_RANGE_SQL};
use query::compiler::{QueryCompiler, QueryLimits};
use query::keywords::suggestion_sql;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("invalid filter JSON: {0}")]
    Filters(#[from] serde_json::Error),
    #[error(transparent)]
    Date(#[from] DateError),
}

/// Compiles a JSON `FilterState` (missing fields take their defaults).
pub fn compile_filters(
    filters_json: &str,
    selected: Option<&str>,
    fts_available: bool,
    limits: QueryLimits,
) -> Result<String, ToolError> {
    let filters: FilterState = serde_json::from_str(filters_json)?;
    let selected = selected.map(EventId::from);
    let text = QueryCompiler::new(limits).compile(&filters, selected.as_ref(), fts_available);
    debug!(strategy = ?text.strategy(), "compiled");
    Ok(text.into_string())
}

/// The startup script as it would be issued, one statement per line,
/// each stage introduced by a comment naming it.
pub fn bootstrap_script(dataset_path: &str) -> String {
    let mut out = String::new();
    for step in bootstrap_plan(dataset_path) {
        let kind = match step.feature {
            Some(feature) => format!("optional: {feature}"),
            None => "required".to_string(),
        };
        out.push_str(&format!("-- {} ({kind})\n", step.name));
        for statement in &step.statements {
            out.push_str(statement);
            out.push_str(";\n");
        }
    }
    out.push_str("-- date-range probe\n");
    out.push_str(DATE_RANGE_SQL);
    out.push_str(";\n");
    out
}

pub fn suggest_sql(prefix: &str, limit: usize) -> String {
    suggestion_sql(prefix.trim(), limit)
}

pub fn day_index(date: &str, epoch: &str) -> Result<i64, ToolError> {
    let date = parse_date(date)?;
    Ok(date.day_index(parse_date(epoch)?)?)
}

pub fn from_day_index(index: i64, epoch: &str) -> Result<SqlDate, ToolError> {
    Ok(SqlDate::from_day_index(index, parse_date(epoch)?)?)
}

fn parse_date(raw: &str) -> Result<SqlDate, DateError> {
    raw.parse()
}
