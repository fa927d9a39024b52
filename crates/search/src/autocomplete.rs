use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use futures_util::FutureExt;
use futures_util::future::{self, LocalBoxFuture};
use runtime::clock::Clock;
use runtime::debounce::Debouncer;
use runtime::generation::{Generation, GenerationGate};
use tracing::{debug, warn};

use crate::keywords::{KeywordIndex, Suggestion};

pub const AUTOCOMPLETE_DEBOUNCE: Duration = Duration::from_millis(150);
pub const MIN_PREFIX_CHARS: usize = 2;

#[derive(Debug, Clone, PartialEq)]
pub enum SuggestOutcome {
    Published(Generation),
    /// A later keystroke or a commit replaced this request.
    Superseded,
    /// Prefix too short or no keyword index; nothing was dispatched.
    Skipped,
    /// Lookup failed; the previous suggestions stay.
    Failed(Generation),
}

#[derive(Debug)]
struct State {
    timer: Debouncer,
    gate: GenerationGate,
    suggestions: Vec<Suggestion>,
}

/// Debounced autocomplete over a [`KeywordIndex`].
///
/// Each keystroke re-arms a 150 ms timer and takes a fresh generation from
/// an independent counter; only the latest generation's answer is shown.
#[derive(Clone)]
pub struct AutocompleteDebouncer {
    index: KeywordIndex,
    clock: Clock,
    min_prefix: usize,
    state: Rc<RefCell<State>>,
}

impl AutocompleteDebouncer {
    pub fn new(index: KeywordIndex, clock: Clock, delay: Duration) -> Self {
        Self {
            index,
            clock,
            min_prefix: MIN_PREFIX_CHARS,
            state: Rc::new(RefCell::new(State {
                timer: Debouncer::new(delay),
                gate: GenerationGate::new(),
                suggestions: Vec::new(),
            })),
        }
    }

    pub fn with_min_prefix(mut self, chars: usize) -> Self {
        self.min_prefix = chars;
        self
    }

    pub fn suggestions(&self) -> Vec<Suggestion> {
        self.state.borrow().suggestions.clone()
    }

    pub fn is_loading(&self) -> bool {
        let st = self.state.borrow();
        st.timer.is_armed() || st.gate.is_pending()
    }

    /// Restarts the debounce for `prefix`; the future resolves once this
    /// request is published, superseded, skipped or failed.
    pub fn suggest(&self, prefix: &str) -> LocalBoxFuture<'static, SuggestOutcome> {
        let prefix = prefix.trim().to_string();
        if prefix.chars().count() < self.min_prefix || !self.index.is_available() {
            self.reset();
            return future::ready(SuggestOutcome::Skipped).boxed_local();
        }

        let (timer, generation, deadline) = {
            let mut st = self.state.borrow_mut();
            let now = self.clock.now();
            let timer = st.timer.schedule(now);
            (timer, st.gate.issue(), now.saturating_add(st.timer.delay()))
        };
        let this = self.clone();
        async move {
            tokio::time::sleep_until(this.clock.instant(deadline)).await;
            if !this.state.borrow_mut().timer.fire(timer, this.clock.now()) {
                return SuggestOutcome::Superseded;
            }
            debug!(%generation, prefix = %prefix, "autocomplete dispatched");
            let answer = this.index.lookup(&prefix).await;
            let mut st = this.state.borrow_mut();
            match answer {
                Ok(suggestions) if st.gate.try_publish(generation) => {
                    st.suggestions = suggestions;
                    SuggestOutcome::Published(generation)
                }
                Err(error) if st.gate.settle_failed(generation) => {
                    warn!(%generation, %error, "autocomplete failed");
                    SuggestOutcome::Failed(generation)
                }
                _ => SuggestOutcome::Superseded,
            }
        }
        .boxed_local()
    }

    /// A suggestion was picked: drop pending work and hide the list.
    pub fn commit(&self) {
        self.reset();
    }

    fn reset(&self) {
        let mut st = self.state.borrow_mut();
        st.timer.cancel();
        st.gate.invalidate();
        st.suggestions.clear();
    }
}
