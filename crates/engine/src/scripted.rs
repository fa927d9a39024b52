//! In-process engine double with scripted answers, delays and failures.

use std::cell::RefCell;
use std::time::Duration;

use futures_util::FutureExt;
use futures_util::future::LocalBoxFuture;

use crate::engine::AnalyticsEngine;
use crate::error::EngineError;
use crate::result::ColumnarResultSet;

#[derive(Debug, Clone)]
struct Rule {
    needle: String,
    delay: Duration,
    answer: Result<ColumnarResultSet, EngineError>,
    remaining: Option<usize>,
}

/// Answers each statement with the first rule whose needle the SQL contains.
///
/// Unmatched statements succeed with an empty result set. Every statement is
/// recorded, in call order, so tests can assert what was dispatched.
#[derive(Debug, Default)]
pub struct ScriptedEngine {
    rules: RefCell<Vec<Rule>>,
    log: RefCell<Vec<String>>,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, needle: &str, delay: Duration, answer: Result<ColumnarResultSet, EngineError>, remaining: Option<usize>) {
        self.rules.borrow_mut().push(Rule {
            needle: needle.to_string(),
            delay,
            answer,
            remaining,
        });
    }

    pub fn respond(&self, needle: &str, result: ColumnarResultSet) -> &Self {
        self.push(needle, Duration::ZERO, Ok(result), None);
        self
    }

    pub fn respond_after(&self, needle: &str, delay: Duration, result: ColumnarResultSet) -> &Self {
        self.push(needle, delay, Ok(result), None);
        self
    }

    pub fn fail(&self, needle: &str, error: EngineError) -> &Self {
        self.push(needle, Duration::ZERO, Err(error), None);
        self
    }

    pub fn fail_after(&self, needle: &str, delay: Duration, error: EngineError) -> &Self {
        self.push(needle, delay, Err(error), None);
        self
    }

    /// Like [`ScriptedEngine::fail`] but only for the next matching statement.
    pub fn fail_once(&self, needle: &str, error: EngineError) -> &Self {
        self.push(needle, Duration::ZERO, Err(error), Some(1));
        self
    }

    pub fn log(&self) -> Vec<String> {
        self.log.borrow().clone()
    }

    pub fn count_matching(&self, needle: &str) -> usize {
        self.log.borrow().iter().filter(|s| s.contains(needle)).count()
    }

    fn answer(&self, sql: &str) -> (Duration, Result<ColumnarResultSet, EngineError>) {
        self.log.borrow_mut().push(sql.to_string());
        let mut rules = self.rules.borrow_mut();
        let Some(idx) = rules
            .iter()
            .position(|r| r.remaining != Some(0) && sql.contains(&r.needle))
        else {
            return (Duration::ZERO, Ok(ColumnarResultSet::empty()));
        };
        let rule = &mut rules[idx];
        if let Some(n) = rule.remaining.as_mut() {
            *n -= 1;
        }
        (rule.delay, rule.answer.clone())
    }
}

impl AnalyticsEngine for ScriptedEngine {
    fn query<'a>(&'a self, sql: &'a str) -> LocalBoxFuture<'a, Result<ColumnarResultSet, EngineError>> {
        let (delay, answer) = self.answer(sql);
        async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            answer
        }
        .boxed_local()
    }
}
