use std::fmt;

use filters::event_type::EventTypeSet;
use filters::sentiment::{Sentiment, SentimentSet, NEGATIVE_BELOW, POSITIVE_ABOVE};
use filters::state::FilterState;
use foundation::bounds::GeoBounds;
use foundation::ids::EventId;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::predicate::{CmpOp, Predicate, Scalar};
use crate::record::{Column, EVENT_COLUMNS};
use crate::sql::{contains_pattern, LIKE_ESCAPE};

/// Name of the narrow `(id, title)` table used by the full-text path.
pub const SEARCH_INDEX_TABLE: &str = "search_index";
pub const EVENTS_RELATION: &str = "events";

/// Row caps that bound the cardinality of every compiled query.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryLimits {
    /// Browse and substring-search queries.
    pub browse: usize,
    /// Full-text path, already narrowed by the index.
    pub search: usize,
}

impl Default for QueryLimits {
    fn default() -> Self {
        Self {
            browse: 500_000,
            search: 1000,
        }
    }
}

/// How the free-text dimension was compiled.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SearchStrategy {
    None,
    Substring,
    FullText,
}

/// A compiled query ready for the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryText {
    sql: String,
    strategy: SearchStrategy,
}

impl QueryText {
    pub fn as_str(&self) -> &str {
        &self.sql
    }

    pub fn strategy(&self) -> SearchStrategy {
        self.strategy
    }

    pub fn into_string(self) -> String {
        self.sql
    }
}

impl fmt::Display for QueryText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

/// Pure `FilterState -> QueryText` compiler.
///
/// Ordering contract: WHERE clauses always appear as date, sentiment, bbox,
/// event types, countries, search; set-valued dimensions render in their
/// canonical order. Equal inputs therefore compile to byte-identical text.
#[derive(Debug, Clone, Default)]
pub struct QueryCompiler {
    limits: QueryLimits,
}

impl QueryCompiler {
    pub fn new(limits: QueryLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> QueryLimits {
        self.limits
    }

    pub fn compile(
        &self,
        filters: &FilterState,
        selected: Option<&EventId>,
        fts_available: bool,
    ) -> QueryText {
        let mut clauses = base_clauses(filters, selected);
        let term = filters.search_term();
        let strategy = match term {
            None => SearchStrategy::None,
            Some(_) if fts_available => SearchStrategy::FullText,
            Some(_) => SearchStrategy::Substring,
        };

        let sql = match (strategy, term) {
            (SearchStrategy::FullText, Some(term)) => self.full_text_sql(&clauses, term),
            (_, term) => {
                if let Some(term) = term {
                    clauses.push(substring_predicate(term));
                }
                self.browse_sql(&clauses)
            }
        };
        debug!(clauses = clauses.len(), ?strategy, "compiled filter state");
        QueryText { sql, strategy }
    }

    fn browse_sql(&self, clauses: &[Predicate]) -> String {
        let mut sql = String::new();
        sql.push_str("SELECT ");
        sql.push_str(&projection(None));
        sql.push_str("\nFROM ");
        sql.push_str(EVENTS_RELATION);
        push_where(&mut sql, clauses, None);
        sql.push_str("\nORDER BY date DESC, sentiment DESC");
        sql.push_str(&format!("\nLIMIT {}", self.limits.browse));
        sql
    }

    fn full_text_sql(&self, clauses: &[Predicate], term: &str) -> String {
        let q = Some(EVENTS_RELATION);
        let mut sql = format!(
            "WITH search_matches AS (SELECT id FROM {SEARCH_INDEX_TABLE} WHERE title ILIKE {} ESCAPE '{LIKE_ESCAPE}')\n",
            contains_pattern(term)
        );
        sql.push_str("SELECT ");
        sql.push_str(&projection(q));
        sql.push_str("\nFROM ");
        sql.push_str(EVENTS_RELATION);
        sql.push_str("\nJOIN search_matches ON events.id = search_matches.id");
        push_where(&mut sql, clauses, q);
        sql.push_str("\nORDER BY events.date DESC");
        sql.push_str(&format!("\nLIMIT {}", self.limits.search));
        sql
    }
}

/// Compiles with the default row limits.
pub fn compile(filters: &FilterState, selected: Option<&EventId>, fts_available: bool) -> QueryText {
    QueryCompiler::default().compile(filters, selected, fts_available)
}

/// The complete row filter a compiled query applies, search included.
///
/// On the full-text path the search becomes a title-only match, which is
/// what the join against the index table selects.
pub fn filter_predicate(
    filters: &FilterState,
    selected: Option<&EventId>,
    fts_available: bool,
) -> Predicate {
    let mut clauses = base_clauses(filters, selected);
    if let Some(term) = filters.search_term() {
        if fts_available {
            clauses.push(Predicate::ContainsCi {
                column: Column::Title,
                needle: term.to_string(),
            });
        } else {
            clauses.push(substring_predicate(term));
        }
    }
    Predicate::And(clauses)
}

fn base_clauses(filters: &FilterState, selected: Option<&EventId>) -> Vec<Predicate> {
    let mut clauses = Vec::with_capacity(5);
    clauses.push(Predicate::Between {
        column: Column::Date,
        low: Scalar::Int(i64::from(filters.time_range.start.get())),
        high: Scalar::Int(i64::from(filters.time_range.end.get())),
    });
    if let Some(p) = sentiment_predicate(filters.sentiment) {
        clauses.push(p);
    }
    if let Some(bbox) = &filters.bbox {
        clauses.push(bbox_predicate(bbox, selected));
    }
    if let Some(p) = event_type_predicate(filters.event_types) {
        clauses.push(p);
    }
    if !filters.countries.is_empty() {
        clauses.push(Predicate::InTexts {
            column: Column::Country,
            values: filters.countries.iter().map(|c| c.as_str().to_string()).collect(),
        });
    }
    clauses
}

/// `None` when every band is selected; an empty set excludes all rows.
pub fn sentiment_predicate(set: SentimentSet) -> Option<Predicate> {
    if set.is_all() {
        return None;
    }
    if set.is_empty() {
        return Some(Predicate::False);
    }
    let band = |s: Sentiment| match s {
        Sentiment::Positive => Predicate::Compare {
            column: Column::Sentiment,
            op: CmpOp::Gt,
            value: Scalar::Float(POSITIVE_ABOVE),
        },
        Sentiment::Neutral => Predicate::And(vec![
            Predicate::Compare {
                column: Column::Sentiment,
                op: CmpOp::Ge,
                value: Scalar::Float(NEGATIVE_BELOW),
            },
            Predicate::Compare {
                column: Column::Sentiment,
                op: CmpOp::Le,
                value: Scalar::Float(POSITIVE_ABOVE),
            },
        ]),
        Sentiment::Negative => Predicate::Compare {
            column: Column::Sentiment,
            op: CmpOp::Lt,
            value: Scalar::Float(NEGATIVE_BELOW),
        },
    };
    Some(Predicate::Or(set.iter().map(band).collect()))
}

pub fn event_type_predicate(set: EventTypeSet) -> Option<Predicate> {
    set.is_restrictive().then(|| Predicate::InInts {
        column: Column::EventType,
        values: set.iter().map(|t| i64::from(t.code())).collect(),
    })
}

/// Keeps a row if any of its three anchors is in view, or if it is the
/// selected event.
pub fn bbox_predicate(bbox: &GeoBounds, selected: Option<&EventId>) -> Predicate {
    let inside = |lat: Column, lon: Column| {
        Predicate::And(vec![
            Predicate::Between {
                column: lat,
                low: Scalar::Float(bbox.south),
                high: Scalar::Float(bbox.north),
            },
            Predicate::Between {
                column: lon,
                low: Scalar::Float(bbox.west),
                high: Scalar::Float(bbox.east),
            },
        ])
    };
    let mut anchors = vec![
        inside(Column::Lat, Column::Lon),
        inside(Column::Actor1Lat, Column::Actor1Lon),
        inside(Column::Actor2Lat, Column::Actor2Lon),
    ];
    if let Some(id) = selected {
        anchors.push(Predicate::TextEq {
            column: Column::Id,
            value: id.as_str().to_string(),
        });
    }
    Predicate::Or(anchors)
}

fn substring_predicate(term: &str) -> Predicate {
    Predicate::Or(vec![
        Predicate::ContainsCi {
            column: Column::Title,
            needle: term.to_string(),
        },
        Predicate::ContainsCi {
            column: Column::Content,
            needle: term.to_string(),
        },
    ])
}

fn projection(qualifier: Option<&str>) -> String {
    EVENT_COLUMNS
        .iter()
        .map(|c| match qualifier {
            Some(q) => format!("{q}.{}", c.name()),
            None => c.name().to_string(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn push_where(sql: &mut String, clauses: &[Predicate], qualifier: Option<&str>) {
    for (i, clause) in clauses.iter().enumerate() {
        sql.push_str(if i == 0 { "\nWHERE " } else { " AND " });
        sql.push_str(&clause.to_sql(qualifier));
    }
}
