use foundation::date::{SqlDate, TimeRange};
use query::bootstrap::{bootstrap_plan, OptionalFeature, DATE_RANGE_SQL};
use tracing::{info, warn};

use crate::engine::AnalyticsEngine;
use crate::error::{EngineError, SchemaError, SessionError};

/// Optional capabilities that came up during startup.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub full_text_search: bool,
    pub keyword_index: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BootstrapReport {
    pub capabilities: Capabilities,
    /// One `OptionalFeatureUnavailable` per optional stage that failed.
    pub degraded: Vec<SessionError>,
}

/// Prepares the engine for browsing the dataset at `dataset_path`.
///
/// A failing required stage aborts with `EngineUnavailable`; a failing
/// optional stage is logged, reported in `degraded`, and startup continues.
pub async fn bootstrap(
    engine: &dyn AnalyticsEngine,
    dataset_path: &str,
) -> Result<BootstrapReport, SessionError> {
    let mut report = BootstrapReport {
        capabilities: Capabilities::default(),
        degraded: Vec::new(),
    };
    for step in bootstrap_plan(dataset_path) {
        let mut outcome = Ok(());
        for statement in &step.statements {
            if let Err(e) = engine.query(statement).await {
                outcome = Err(e);
                break;
            }
        }
        match (outcome, step.feature) {
            (Ok(()), feature) => {
                info!(stage = step.name, "bootstrap stage ready");
                match feature {
                    Some(OptionalFeature::FullTextSearch) => report.capabilities.full_text_search = true,
                    Some(OptionalFeature::KeywordIndex) => report.capabilities.keyword_index = true,
                    _ => {}
                }
            }
            (Err(e), None) => {
                warn!(stage = step.name, error = %e, "required bootstrap stage failed");
                return Err(SessionError::EngineUnavailable(e));
            }
            (Err(e), Some(feature)) => {
                warn!(stage = step.name, %feature, error = %e, "optional feature unavailable");
                report
                    .degraded
                    .push(SessionError::OptionalFeatureUnavailable { feature, source: e });
            }
        }
    }
    info!(capabilities = ?report.capabilities, "engine ready");
    Ok(report)
}

/// Reads the dataset's min/max dates; `Ok(None)` for an empty dataset.
pub async fn probe_date_range(engine: &dyn AnalyticsEngine) -> Result<Option<TimeRange>, EngineError> {
    let rs = engine.query(DATE_RANGE_SQL).await?;
    if rs.num_rows() == 0 {
        return Ok(None);
    }
    let min = rs.int64("min_date")?.first().copied().flatten();
    let max = rs.int64("max_date")?.first().copied().flatten();
    let (Some(min), Some(max)) = (min, max) else {
        return Ok(None);
    };
    Ok(Some(TimeRange::new(to_date("min_date", min)?, to_date("max_date", max)?)))
}

fn to_date(name: &str, raw: i64) -> Result<SqlDate, SchemaError> {
    let invalid = |reason: String| SchemaError::InvalidValue {
        name: name.to_string(),
        reason,
    };
    let raw = u32::try_from(raw).map_err(|e| invalid(e.to_string()))?;
    let date = SqlDate(raw);
    date.to_date().map_err(|e| invalid(e.to_string()))?;
    Ok(date)
}
