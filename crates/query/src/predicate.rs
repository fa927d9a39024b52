use std::fmt::Write as _;

use crate::record::{Column, EventRecord};
use crate::sql::{contains_pattern, quote_literal, LIKE_ESCAPE};

/// Numeric literal inside a predicate.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Scalar {
    Int(i64),
    Float(f64),
}

impl Scalar {
    fn as_f64(self) -> f64 {
        match self {
            Scalar::Int(v) => v as f64,
            Scalar::Float(v) => v,
        }
    }

    fn render(self, out: &mut String) {
        // f64 Display never uses exponent notation, so the text is valid SQL.
        let _ = match self {
            Scalar::Int(v) => write!(out, "{v}"),
            Scalar::Float(v) => write!(out, "{v}"),
        };
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CmpOp {
    Lt,
    Le,
    Gt,
    Ge,
}

impl CmpOp {
    fn symbol(self) -> &'static str {
        match self {
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
        }
    }

    fn holds(self, lhs: f64, rhs: f64) -> bool {
        match self {
            CmpOp::Lt => lhs < rhs,
            CmpOp::Le => lhs <= rhs,
            CmpOp::Gt => lhs > rhs,
            CmpOp::Ge => lhs >= rhs,
        }
    }
}

/// Boolean filter expression over [`EventRecord`] columns.
///
/// The same tree renders to SQL text and evaluates in memory, so the
/// semantics of a compiled query can be checked against concrete rows.
/// Evaluation follows SQL's treatment of NULL inside WHERE: a comparison
/// against NULL never holds.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Matches nothing.
    False,
    Between {
        column: Column,
        low: Scalar,
        high: Scalar,
    },
    Compare {
        column: Column,
        op: CmpOp,
        value: Scalar,
    },
    InInts {
        column: Column,
        values: Vec<i64>,
    },
    InTexts {
        column: Column,
        values: Vec<String>,
    },
    TextEq {
        column: Column,
        value: String,
    },
    /// Case-insensitive substring match, wildcards in `needle` are literal.
    ContainsCi {
        column: Column,
        needle: String,
    },
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
}

impl Predicate {
    /// Renders the predicate; `qualifier` (e.g. `"events"`) prefixes every
    /// column reference.
    pub fn to_sql(&self, qualifier: Option<&str>) -> String {
        let mut out = String::new();
        self.render(qualifier, &mut out);
        out
    }

    fn render(&self, q: Option<&str>, out: &mut String) {
        match self {
            Predicate::False => out.push_str("FALSE"),
            Predicate::Between { column, low, high } => {
                push_column(out, q, *column);
                out.push_str(" BETWEEN ");
                low.render(out);
                out.push_str(" AND ");
                high.render(out);
            }
            Predicate::Compare { column, op, value } => {
                push_column(out, q, *column);
                let _ = write!(out, " {} ", op.symbol());
                value.render(out);
            }
            Predicate::InInts { column, values } => {
                push_column(out, q, *column);
                out.push_str(" IN (");
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    let _ = write!(out, "{v}");
                }
                out.push(')');
            }
            Predicate::InTexts { column, values } => {
                push_column(out, q, *column);
                out.push_str(" IN (");
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    out.push_str(&quote_literal(v));
                }
                out.push(')');
            }
            Predicate::TextEq { column, value } => {
                push_column(out, q, *column);
                out.push_str(" = ");
                out.push_str(&quote_literal(value));
            }
            Predicate::ContainsCi { column, needle } => {
                push_column(out, q, *column);
                out.push_str(" ILIKE ");
                out.push_str(&contains_pattern(needle));
                let _ = write!(out, " ESCAPE '{LIKE_ESCAPE}'");
            }
            Predicate::And(parts) => render_group(parts, " AND ", "TRUE", q, out),
            Predicate::Or(parts) => render_group(parts, " OR ", "FALSE", q, out),
        }
    }

    pub fn eval(&self, row: &EventRecord) -> bool {
        match self {
            Predicate::False => false,
            Predicate::Between { column, low, high } => row
                .field(*column)
                .as_f64()
                .is_some_and(|v| v >= low.as_f64() && v <= high.as_f64()),
            Predicate::Compare { column, op, value } => row
                .field(*column)
                .as_f64()
                .is_some_and(|v| op.holds(v, value.as_f64())),
            Predicate::InInts { column, values } => row
                .field(*column)
                .as_f64()
                .is_some_and(|v| values.iter().any(|x| *x as f64 == v)),
            Predicate::InTexts { column, values } => row
                .field(*column)
                .as_text()
                .is_some_and(|v| values.iter().any(|x| x == v)),
            Predicate::TextEq { column, value } => {
                row.field(*column).as_text().is_some_and(|v| v == value)
            }
            Predicate::ContainsCi { column, needle } => {
                let needle = needle.replace('\0', "").to_lowercase();
                row.field(*column)
                    .as_text()
                    .is_some_and(|v| v.to_lowercase().contains(&needle))
            }
            Predicate::And(parts) => parts.iter().all(|p| p.eval(row)),
            Predicate::Or(parts) => parts.iter().any(|p| p.eval(row)),
        }
    }
}

fn push_column(out: &mut String, qualifier: Option<&str>, column: Column) {
    if let Some(q) = qualifier {
        out.push_str(q);
        out.push('.');
    }
    out.push_str(column.name());
}

fn render_group(parts: &[Predicate], sep: &str, empty: &str, q: Option<&str>, out: &mut String) {
    if parts.is_empty() {
        out.push_str(empty);
        return;
    }
    out.push('(');
    for (i, p) in parts.iter().enumerate() {
        if i > 0 {
            out.push_str(sep);
        }
        p.render(q, out);
    }
    out.push(')');
}

#[cfg(test)]
mod tests {
    use super::{CmpOp, Predicate, Scalar};
    use crate::record::{Column, EventRecord};
    use foundation::date::SqlDate;
    use pretty_assertions::assert_eq;

    fn row() -> EventRecord {
        let mut r = EventRecord::at("7", SqlDate(20250105), 13.4, 52.5);
        r.title = Some("Protest in BERLIN".into());
        r.sentiment = -3.5;
        r
    }

    #[test]
    fn renders_nested_groups() {
        let p = Predicate::Or(vec![
            Predicate::Compare {
                column: Column::Sentiment,
                op: CmpOp::Gt,
                value: Scalar::Float(2.0),
            },
            Predicate::And(vec![
                Predicate::Compare {
                    column: Column::Sentiment,
                    op: CmpOp::Ge,
                    value: Scalar::Float(-2.0),
                },
                Predicate::Compare {
                    column: Column::Sentiment,
                    op: CmpOp::Le,
                    value: Scalar::Float(2.0),
                },
            ]),
        ]);
        assert_eq!(
            p.to_sql(None),
            "(sentiment > 2 OR (sentiment >= -2 AND sentiment <= 2))"
        );
        assert!(!p.eval(&row()));
    }

    #[test]
    fn qualifier_prefixes_columns() {
        let p = Predicate::Between {
            column: Column::Date,
            low: Scalar::Int(20250101),
            high: Scalar::Int(20250131),
        };
        assert_eq!(p.to_sql(Some("events")), "events.date BETWEEN 20250101 AND 20250131");
        assert!(p.eval(&row()));
    }

    #[test]
    fn null_never_matches() {
        let p = Predicate::InTexts {
            column: Column::Country,
            values: vec!["GM".into()],
        };
        assert!(!p.eval(&row()));
        let p = Predicate::Between {
            column: Column::Actor1Lat,
            low: Scalar::Float(-90.0),
            high: Scalar::Float(90.0),
        };
        assert!(!p.eval(&row()));
    }

    #[test]
    fn contains_is_case_insensitive_and_escaped() {
        let p = Predicate::ContainsCi {
            column: Column::Title,
            needle: "berlin".into(),
        };
        assert_eq!(p.to_sql(None), "title ILIKE '%berlin%' ESCAPE '\\'");
        assert!(p.eval(&row()));
        let p = Predicate::ContainsCi {
            column: Column::Title,
            needle: "in_BER".into(),
        };
        assert_eq!(p.to_sql(None), "title ILIKE '%in\\_BER%' ESCAPE '\\'");
        assert!(!p.eval(&row()));
    }

    #[test]
    fn empty_groups_have_identity_values() {
        assert_eq!(Predicate::Or(vec![]).to_sql(None), "FALSE");
        assert!(!Predicate::Or(vec![]).eval(&row()));
        assert!(Predicate::And(vec![]).eval(&row()));
    }
}
