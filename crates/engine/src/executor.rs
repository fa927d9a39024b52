use std::cell::RefCell;
use std::rc::Rc;

use filters::state::FilterState;
use futures_util::FutureExt;
use futures_util::future::LocalBoxFuture;
use query::compiler::QueryText;
use runtime::generation::{Generation, GenerationGate};
use tracing::{debug, warn};

use crate::engine::AnalyticsEngine;
use crate::error::{EngineError, SchemaError, SessionError};
use crate::result::{ColumnarResultSet, EventColumns};

/// The result set of one generation together with what produced it.
#[derive(Debug)]
pub struct Published {
    pub generation: Generation,
    pub filters: Rc<FilterState>,
    pub query: QueryText,
    pub result: ColumnarResultSet,
}

impl Published {
    /// Typed column view; the schema was validated before publishing.
    pub fn events(&self) -> Result<EventColumns<'_>, SchemaError> {
        EventColumns::bind(&self.result)
    }

    pub fn num_rows(&self) -> usize {
        self.result.num_rows()
    }
}

/// How one submission ended.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    Published(Generation),
    /// A newer submission exists; the answer was dropped without side effects.
    Superseded(Generation),
    Failed {
        generation: Generation,
        error: EngineError,
    },
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct ExecutorStats {
    pub submitted: u64,
    pub published: u64,
    pub superseded: u64,
    pub failed: u64,
    /// Futures dropped before their answer arrived.
    pub abandoned: u64,
}

#[derive(Debug, Default)]
struct ExecutorState {
    gate: GenerationGate,
    published: Option<Rc<Published>>,
    /// Query of the latest generation while it is in flight or published.
    current: Option<QueryText>,
    last_error: Option<SessionError>,
    stats: ExecutorStats,
}

/// Issues event queries and publishes only the latest generation.
///
/// Ordering contract: generations are assigned at `submit` time, and the
/// published generation only ever increases. An answer for any generation
/// other than the latest is discarded on arrival, whether it succeeded or
/// failed. A failure of the latest generation is recorded in `last_error`
/// and leaves the previously published result in place. Dropping the
/// future of the latest generation before it answers settles that
/// generation, so `is_loading` never sticks.
#[derive(Clone)]
pub struct QueryExecutor {
    engine: Rc<dyn AnalyticsEngine>,
    state: Rc<RefCell<ExecutorState>>,
}

impl QueryExecutor {
    pub fn new(engine: Rc<dyn AnalyticsEngine>) -> Self {
        Self {
            engine,
            state: Rc::new(RefCell::new(ExecutorState::default())),
        }
    }

    pub fn engine(&self) -> Rc<dyn AnalyticsEngine> {
        Rc::clone(&self.engine)
    }

    /// Tags `query` with the next generation and returns the future that
    /// dispatches it. The returned future owns everything it touches.
    pub fn submit(
        &self,
        query: QueryText,
        filters: Rc<FilterState>,
    ) -> LocalBoxFuture<'static, QueryOutcome> {
        let generation = {
            let mut st = self.state.borrow_mut();
            st.stats.submitted += 1;
            st.last_error = None;
            st.current = Some(query.clone());
            st.gate.issue()
        };
        debug!(%generation, "query submitted");
        let engine = Rc::clone(&self.engine);
        let state = Rc::clone(&self.state);
        let mut in_flight = InFlight {
            state: Rc::clone(&state),
            generation,
            answered: false,
        };

        async move {
            let answer = engine.query(query.as_str()).await;
            in_flight.answered = true;
            let answer = answer.and_then(|rs| match EventColumns::bind(&rs) {
                Ok(_) => Ok(rs),
                Err(e) => Err(EngineError::from(e)),
            });
            let mut st = state.borrow_mut();
            match answer {
                Ok(result) => {
                    if !st.gate.try_publish(generation) {
                        st.stats.superseded += 1;
                        debug!(%generation, latest = %st.gate.latest(), "stale result dropped");
                        return QueryOutcome::Superseded(generation);
                    }
                    debug!(%generation, rows = result.num_rows(), "result published");
                    st.stats.published += 1;
                    st.published = Some(Rc::new(Published {
                        generation,
                        filters,
                        query,
                        result,
                    }));
                    QueryOutcome::Published(generation)
                }
                Err(error) => {
                    if !st.gate.settle_failed(generation) {
                        st.stats.superseded += 1;
                        debug!(%generation, "stale failure dropped");
                        return QueryOutcome::Superseded(generation);
                    }
                    warn!(%generation, %error, "query failed; keeping previous result");
                    st.stats.failed += 1;
                    st.current = None;
                    st.last_error = Some(SessionError::QueryFailed {
                        generation,
                        source: error.clone(),
                    });
                    QueryOutcome::Failed { generation, error }
                }
            }
        }
        .boxed_local()
    }

    /// Currently published generation, shared read-only.
    pub fn published(&self) -> Option<Rc<Published>> {
        self.state.borrow().published.clone()
    }

    /// True while the latest submitted generation has not settled.
    pub fn is_loading(&self) -> bool {
        self.state.borrow().gate.is_pending()
    }

    /// Query text of the latest generation, unless it failed or was abandoned.
    pub fn current_query(&self) -> Option<QueryText> {
        self.state.borrow().current.clone()
    }

    pub fn last_error(&self) -> Option<SessionError> {
        self.state.borrow().last_error.clone()
    }

    pub fn latest_generation(&self) -> Generation {
        self.state.borrow().gate.latest()
    }

    pub fn stats(&self) -> ExecutorStats {
        self.state.borrow().stats
    }
}

/// Settles a generation whose future is dropped before the engine answers.
struct InFlight {
    state: Rc<RefCell<ExecutorState>>,
    generation: Generation,
    answered: bool,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        if self.answered {
            return;
        }
        let mut st = self.state.borrow_mut();
        st.stats.abandoned += 1;
        if st.gate.abandon(self.generation) {
            debug!(generation = %self.generation, "query abandoned");
            st.current = None;
        }
    }
}
