use foundation::date::SqlDate;
use foundation::ids::EventId;
use query::record::{Column, EventRecord, EVENT_COLUMNS};

use crate::error::SchemaError;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ColumnType {
    Utf8,
    Int64,
    Float64,
}

/// One typed, nullable column.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Utf8(Vec<Option<String>>),
    Int64(Vec<Option<i64>>),
    Float64(Vec<Option<f64>>),
}

impl ColumnData {
    pub fn column_type(&self) -> ColumnType {
        match self {
            ColumnData::Utf8(_) => ColumnType::Utf8,
            ColumnData::Int64(_) => ColumnType::Int64,
            ColumnData::Float64(_) => ColumnType::Float64,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ColumnData::Utf8(v) => v.len(),
            ColumnData::Int64(v) => v.len(),
            ColumnData::Float64(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Read-only result of one query, stored by column.
///
/// Never mutated after construction; consumers share it behind an `Rc` and
/// borrow typed slices instead of copying rows.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ColumnarResultSet {
    names: Vec<String>,
    columns: Vec<ColumnData>,
    rows: usize,
}

impl ColumnarResultSet {
    /// Builds a result set; every column must have the same length.
    pub fn new(columns: Vec<(String, ColumnData)>) -> Result<Self, SchemaError> {
        let rows = columns.first().map_or(0, |(_, c)| c.len());
        let mut names = Vec::with_capacity(columns.len());
        let mut data = Vec::with_capacity(columns.len());
        for (name, column) in columns {
            if column.len() != rows {
                return Err(SchemaError::LengthMismatch {
                    name,
                    expected: rows,
                    found: column.len(),
                });
            }
            names.push(name);
            data.push(column);
        }
        Ok(Self {
            names,
            columns: data,
            rows,
        })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn num_rows(&self) -> usize {
        self.rows
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    pub fn column(&self, name: &str) -> Option<&ColumnData> {
        let idx = self.names.iter().position(|n| n == name)?;
        self.columns.get(idx)
    }

    fn lookup(&self, name: &str) -> Result<&ColumnData, SchemaError> {
        self.column(name)
            .ok_or_else(|| SchemaError::MissingColumn(name.to_string()))
    }

    pub fn utf8(&self, name: &str) -> Result<&[Option<String>], SchemaError> {
        match self.lookup(name)? {
            ColumnData::Utf8(v) => Ok(v),
            other => Err(wrong_type(name, ColumnType::Utf8, other)),
        }
    }

    pub fn int64(&self, name: &str) -> Result<&[Option<i64>], SchemaError> {
        match self.lookup(name)? {
            ColumnData::Int64(v) => Ok(v),
            other => Err(wrong_type(name, ColumnType::Int64, other)),
        }
    }

    pub fn float64(&self, name: &str) -> Result<&[Option<f64>], SchemaError> {
        match self.lookup(name)? {
            ColumnData::Float64(v) => Ok(v),
            other => Err(wrong_type(name, ColumnType::Float64, other)),
        }
    }
}

fn wrong_type(name: &str, expected: ColumnType, found: &ColumnData) -> SchemaError {
    SchemaError::WrongType {
        name: name.to_string(),
        expected,
        found: found.column_type(),
    }
}

/// Expected type of each projected event column.
pub fn event_column_type(column: Column) -> ColumnType {
    match column {
        Column::Date | Column::EventType => ColumnType::Int64,
        Column::Sentiment
        | Column::Lat
        | Column::Lon
        | Column::Goldstein
        | Column::Actor1Lat
        | Column::Actor1Lon
        | Column::Actor2Lat
        | Column::Actor2Lon => ColumnType::Float64,
        _ => ColumnType::Utf8,
    }
}

/// Typed column slices of an event result set, borrowed for its lifetime.
#[derive(Debug, Clone, Copy)]
pub struct EventColumns<'a> {
    pub id: &'a [Option<String>],
    pub date: &'a [Option<i64>],
    pub title: &'a [Option<String>],
    pub content: &'a [Option<String>],
    pub author: &'a [Option<String>],
    pub url: &'a [Option<String>],
    pub sentiment: &'a [Option<f64>],
    pub event_type: &'a [Option<i64>],
    pub lat: &'a [Option<f64>],
    pub lon: &'a [Option<f64>],
    pub country: &'a [Option<String>],
    pub location: &'a [Option<String>],
    pub actor1: &'a [Option<String>],
    pub actor2: &'a [Option<String>],
    pub goldstein: &'a [Option<f64>],
    pub actor1_lat: &'a [Option<f64>],
    pub actor1_lon: &'a [Option<f64>],
    pub actor1_location: &'a [Option<String>],
    pub actor2_lat: &'a [Option<f64>],
    pub actor2_lon: &'a [Option<f64>],
    pub actor2_location: &'a [Option<String>],
}

impl<'a> EventColumns<'a> {
    /// Checks every projected column is present with the expected type.
    pub fn bind(rs: &'a ColumnarResultSet) -> Result<Self, SchemaError> {
        let text = |c: Column| rs.utf8(c.name());
        let int = |c: Column| rs.int64(c.name());
        let float = |c: Column| rs.float64(c.name());
        Ok(EventColumns {
            id: text(Column::Id)?,
            date: int(Column::Date)?,
            title: text(Column::Title)?,
            content: text(Column::Content)?,
            author: text(Column::Author)?,
            url: text(Column::Url)?,
            sentiment: float(Column::Sentiment)?,
            event_type: int(Column::EventType)?,
            lat: float(Column::Lat)?,
            lon: float(Column::Lon)?,
            country: text(Column::Country)?,
            location: text(Column::Location)?,
            actor1: text(Column::Actor1)?,
            actor2: text(Column::Actor2)?,
            goldstein: float(Column::Goldstein)?,
            actor1_lat: float(Column::Actor1Lat)?,
            actor1_lon: float(Column::Actor1Lon)?,
            actor1_location: text(Column::Actor1Location)?,
            actor2_lat: float(Column::Actor2Lat)?,
            actor2_lon: float(Column::Actor2Lon)?,
            actor2_location: text(Column::Actor2Location)?,
        })
    }

    pub fn len(&self) -> usize {
        self.id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id.is_empty()
    }

    pub fn id_at(&self, row: usize) -> Option<EventId> {
        self.id.get(row)?.as_deref().map(EventId::from)
    }

    pub fn row_index_of(&self, id: &EventId) -> Option<usize> {
        self.id
            .iter()
            .position(|v| v.as_deref() == Some(id.as_str()))
    }

    /// Materializes one row. Rows lacking an id, a valid date, a location or
    /// a tone cannot come out of the `events` view and yield `None`.
    pub fn record(&self, row: usize) -> Option<EventRecord> {
        let text = |col: &[Option<String>]| col.get(row).cloned().flatten();
        let float = |col: &[Option<f64>]| col.get(row).copied().flatten();
        let date = u32::try_from(self.date.get(row).copied().flatten()?).ok()?;
        Some(EventRecord {
            id: self.id_at(row)?,
            date: SqlDate(date),
            title: text(self.title),
            content: text(self.content),
            author: text(self.author),
            url: text(self.url),
            sentiment: float(self.sentiment)?,
            event_type: self.event_type.get(row).copied().flatten(),
            lat: float(self.lat)?,
            lon: float(self.lon)?,
            country: text(self.country),
            location: text(self.location),
            actor1: text(self.actor1),
            actor2: text(self.actor2),
            goldstein: float(self.goldstein),
            actor1_lat: float(self.actor1_lat),
            actor1_lon: float(self.actor1_lon),
            actor1_location: text(self.actor1_location),
            actor2_lat: float(self.actor2_lat),
            actor2_lon: float(self.actor2_lon),
            actor2_location: text(self.actor2_location),
        })
    }
}

/// Builds an event result set from materialized records, in row order.
pub fn events_result_set(records: &[EventRecord]) -> ColumnarResultSet {
    let mut names = Vec::with_capacity(EVENT_COLUMNS.len());
    let mut columns = Vec::with_capacity(EVENT_COLUMNS.len());
    for column in EVENT_COLUMNS {
        let values = records.iter().map(|r| r.field(column));
        let data = match event_column_type(column) {
            ColumnType::Utf8 => {
                ColumnData::Utf8(values.map(|v| v.as_text().map(str::to_string)).collect())
            }
            ColumnType::Int64 => {
                ColumnData::Int64(values.map(|v| v.as_f64().map(|x| x as i64)).collect())
            }
            ColumnType::Float64 => ColumnData::Float64(values.map(|v| v.as_f64()).collect()),
        };
        names.push(column.name().to_string());
        columns.push(data);
    }
    ColumnarResultSet {
        names,
        columns,
        rows: records.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::{events_result_set, ColumnData, ColumnType, ColumnarResultSet, EventColumns};
    use crate::error::SchemaError;
    use foundation::date::SqlDate;
    use foundation::ids::EventId;
    use query::record::EventRecord;

    fn sample() -> Vec<EventRecord> {
        let mut a = EventRecord::at("a", SqlDate(20250103), 13.4, 52.5);
        a.title = Some("Berlin talks".into());
        a.event_type = Some(1);
        a.actor1_lat = Some(48.8);
        a.actor1_lon = Some(2.3);
        let b = EventRecord::at("b", SqlDate(20250102), -74.0, 40.7);
        vec![a, b]
    }

    #[test]
    fn materializes_rows_from_columns() {
        let records = sample();
        let rs = events_result_set(&records);
        assert_eq!(rs.num_rows(), 2);
        let cols = EventColumns::bind(&rs).unwrap();
        assert_eq!(cols.record(0).as_ref(), Some(&records[0]));
        assert_eq!(cols.record(1).as_ref(), Some(&records[1]));
        assert_eq!(cols.record(2), None);
        assert_eq!(cols.lat[1], Some(40.7));
    }

    #[test]
    fn finds_rows_by_id() {
        let rs = events_result_set(&sample());
        let cols = EventColumns::bind(&rs).unwrap();
        assert_eq!(cols.row_index_of(&EventId::from("b")), Some(1));
        assert_eq!(cols.row_index_of(&EventId::from("z")), None);
        assert_eq!(cols.id_at(0), Some(EventId::from("a")));
    }

    #[test]
    fn bind_reports_missing_and_mistyped_columns() {
        let rs = ColumnarResultSet::new(vec![("id".into(), ColumnData::Utf8(vec![]))]).unwrap();
        assert_eq!(
            EventColumns::bind(&rs).unwrap_err(),
            SchemaError::MissingColumn("date".into())
        );
        let rs = ColumnarResultSet::new(vec![
            ("id".into(), ColumnData::Int64(vec![])),
        ])
        .unwrap();
        assert!(matches!(
            EventColumns::bind(&rs),
            Err(SchemaError::WrongType { expected: ColumnType::Utf8, .. })
        ));
    }

    #[test]
    fn ragged_columns_are_rejected() {
        let err = ColumnarResultSet::new(vec![
            ("a".into(), ColumnData::Int64(vec![Some(1)])),
            ("b".into(), ColumnData::Int64(vec![])),
        ])
        .unwrap_err();
        assert!(matches!(err, SchemaError::LengthMismatch { found: 0, .. }));
    }
}
