use foundation::bounds::LngLat;
use foundation::date::SqlDate;
use foundation::ids::EventId;
use serde::{Deserialize, Serialize};

/// Columns of the `events` relation the browser reads or filters on.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Column {
    Id,
    Date,
    Title,
    Content,
    Author,
    Url,
    Sentiment,
    EventType,
    Lat,
    Lon,
    Country,
    Location,
    Actor1,
    Actor2,
    Goldstein,
    Actor1Lat,
    Actor1Lon,
    Actor1Location,
    Actor2Lat,
    Actor2Lon,
    Actor2Location,
}

/// Projection of every browse query, in result-set order.
pub const EVENT_COLUMNS: [Column; 21] = [
    Column::Id,
    Column::Date,
    Column::Title,
    Column::Content,
    Column::Author,
    Column::Url,
    Column::Sentiment,
    Column::EventType,
    Column::Lat,
    Column::Lon,
    Column::Country,
    Column::Location,
    Column::Actor1,
    Column::Actor2,
    Column::Goldstein,
    Column::Actor1Lat,
    Column::Actor1Lon,
    Column::Actor1Location,
    Column::Actor2Lat,
    Column::Actor2Lon,
    Column::Actor2Location,
];

impl Column {
    pub fn name(self) -> &'static str {
        match self {
            Column::Id => "id",
            Column::Date => "date",
            Column::Title => "title",
            Column::Content => "content",
            Column::Author => "author",
            Column::Url => "url",
            Column::Sentiment => "sentiment",
            Column::EventType => "eventType",
            Column::Lat => "lat",
            Column::Lon => "lon",
            Column::Country => "country",
            Column::Location => "location",
            Column::Actor1 => "actor1",
            Column::Actor2 => "actor2",
            Column::Goldstein => "goldstein",
            Column::Actor1Lat => "actor1_lat",
            Column::Actor1Lon => "actor1_lon",
            Column::Actor1Location => "actor1_location",
            Column::Actor2Lat => "actor2_lat",
            Column::Actor2Lon => "actor2_lon",
            Column::Actor2Location => "actor2_location",
        }
    }
}

/// A column value borrowed from an [`EventRecord`]; `None` is SQL NULL.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum FieldRef<'a> {
    Text(Option<&'a str>),
    Int(Option<i64>),
    Float(Option<f64>),
}

impl<'a> FieldRef<'a> {
    pub fn as_f64(self) -> Option<f64> {
        match self {
            FieldRef::Int(v) => v.map(|v| v as f64),
            FieldRef::Float(v) => v,
            FieldRef::Text(_) => None,
        }
    }

    pub fn as_text(self) -> Option<&'a str> {
        match self {
            FieldRef::Text(v) => v,
            _ => None,
        }
    }
}

/// One materialized row of the `events` relation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: EventId,
    pub date: SqlDate,
    pub title: Option<String>,
    pub content: Option<String>,
    pub author: Option<String>,
    pub url: Option<String>,
    pub sentiment: f64,
    pub event_type: Option<i64>,
    pub lat: f64,
    pub lon: f64,
    pub country: Option<String>,
    pub location: Option<String>,
    pub actor1: Option<String>,
    pub actor2: Option<String>,
    pub goldstein: Option<f64>,
    pub actor1_lat: Option<f64>,
    pub actor1_lon: Option<f64>,
    pub actor1_location: Option<String>,
    pub actor2_lat: Option<f64>,
    pub actor2_lon: Option<f64>,
    pub actor2_location: Option<String>,
}

impl EventRecord {
    /// Record at `lon, lat` with every optional column NULL.
    pub fn at(id: impl Into<EventId>, date: SqlDate, lon: f64, lat: f64) -> Self {
        EventRecord {
            id: id.into(),
            date,
            title: None,
            content: None,
            author: None,
            url: None,
            sentiment: 0.0,
            event_type: None,
            lat,
            lon,
            country: None,
            location: None,
            actor1: None,
            actor2: None,
            goldstein: None,
            actor1_lat: None,
            actor1_lon: None,
            actor1_location: None,
            actor2_lat: None,
            actor2_lon: None,
            actor2_location: None,
        }
    }

    pub fn field(&self, column: Column) -> FieldRef<'_> {
        match column {
            Column::Id => FieldRef::Text(Some(self.id.as_str())),
            Column::Date => FieldRef::Int(Some(i64::from(self.date.get()))),
            Column::Title => FieldRef::Text(self.title.as_deref()),
            Column::Content => FieldRef::Text(self.content.as_deref()),
            Column::Author => FieldRef::Text(self.author.as_deref()),
            Column::Url => FieldRef::Text(self.url.as_deref()),
            Column::Sentiment => FieldRef::Float(Some(self.sentiment)),
            Column::EventType => FieldRef::Int(self.event_type),
            Column::Lat => FieldRef::Float(Some(self.lat)),
            Column::Lon => FieldRef::Float(Some(self.lon)),
            Column::Country => FieldRef::Text(self.country.as_deref()),
            Column::Location => FieldRef::Text(self.location.as_deref()),
            Column::Actor1 => FieldRef::Text(self.actor1.as_deref()),
            Column::Actor2 => FieldRef::Text(self.actor2.as_deref()),
            Column::Goldstein => FieldRef::Float(self.goldstein),
            Column::Actor1Lat => FieldRef::Float(self.actor1_lat),
            Column::Actor1Lon => FieldRef::Float(self.actor1_lon),
            Column::Actor1Location => FieldRef::Text(self.actor1_location.as_deref()),
            Column::Actor2Lat => FieldRef::Float(self.actor2_lat),
            Column::Actor2Lon => FieldRef::Float(self.actor2_lon),
            Column::Actor2Location => FieldRef::Text(self.actor2_location.as_deref()),
        }
    }

    pub fn position(&self) -> LngLat {
        LngLat::new(self.lon, self.lat)
    }

    pub fn actor1_position(&self) -> Option<LngLat> {
        Some(LngLat::new(self.actor1_lon?, self.actor1_lat?))
    }

    pub fn actor2_position(&self) -> Option<LngLat> {
        Some(LngLat::new(self.actor2_lon?, self.actor2_lat?))
    }
}
