use tracing::debug;

use crate::generation::Generation;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum NoticeKind {
    /// A single query generation failed; the previous results stay visible.
    QueryFailed,
    /// An optional engine feature could not be built and was disabled.
    FeatureUnavailable,
    /// The dataset date range could not be read; defaults are in use.
    DateRangeFallback,
}

/// Transient, user-facing notice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub generation: Option<Generation>,
    pub kind: NoticeKind,
    pub message: String,
}

/// Append-only notice queue drained by the UI.
#[derive(Debug, Default)]
pub struct NoticeBus {
    notices: Vec<Notice>,
}

impl NoticeBus {
    pub fn new() -> Self {
        Self {
            notices: Vec::new(),
        }
    }

    pub fn emit(&mut self, kind: NoticeKind, message: impl Into<String>) {
        let message = message.into();
        debug!(?kind, %message, "notice");
        self.notices.push(Notice {
            generation: None,
            kind,
            message,
        });
    }

    pub fn emit_for(
        &mut self,
        generation: Generation,
        kind: NoticeKind,
        message: impl Into<String>,
    ) {
        let message = message.into();
        debug!(%generation, ?kind, %message, "notice");
        self.notices.push(Notice {
            generation: Some(generation),
            kind,
            message,
        });
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn drain(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }
}
