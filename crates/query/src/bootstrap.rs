use std::fmt;

use crate::compiler::SEARCH_INDEX_TABLE;
use crate::keywords::KEYWORD_TABLE;
use crate::sql::quote_literal;

/// Optional engine feature whose absence degrades behavior instead of
/// failing startup.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum OptionalFeature {
    /// The text-search extension itself.
    SearchExtension,
    /// Narrow `(id, title)` table; without it search falls back to substring scans.
    FullTextSearch,
    /// Keyword table; without it there is no autocomplete.
    KeywordIndex,
}

impl fmt::Display for OptionalFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OptionalFeature::SearchExtension => "fts extension",
            OptionalFeature::FullTextSearch => "full-text search index",
            OptionalFeature::KeywordIndex => "keyword index",
        })
    }
}

/// One named startup stage; statements run in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapStep {
    pub name: &'static str,
    pub statements: Vec<String>,
    /// `None` for a required stage: its failure means the engine is unusable.
    pub feature: Option<OptionalFeature>,
}

impl BootstrapStep {
    pub fn is_required(&self) -> bool {
        self.feature.is_none()
    }
}

/// Dataset min/max date probe. Both columns are NULL on an empty relation.
pub const DATE_RANGE_SQL: &str = "SELECT MIN(date) AS min_date, MAX(date) AS max_date FROM events";

/// Startup stages for a parquet dataset at `dataset_path`.
///
/// The `events` view keeps one row per `GLOBALEVENTID`, preferring the
/// highest `quality_score` and then the longest article, and drops rows
/// without an action location or tone.
pub fn bootstrap_plan(dataset_path: &str) -> Vec<BootstrapStep> {
    let source = format!("read_parquet({})", quote_literal(dataset_path));
    vec![
        BootstrapStep {
            name: "fts-extension",
            statements: vec!["INSTALL fts".to_string(), "LOAD fts".to_string()],
            feature: Some(OptionalFeature::SearchExtension),
        },
        BootstrapStep {
            name: "events-view",
            statements: vec![events_view_sql(&source)],
            feature: None,
        },
        BootstrapStep {
            name: "search-index",
            statements: vec![
                format!("DROP TABLE IF EXISTS {SEARCH_INDEX_TABLE}"),
                format!("CREATE TABLE {SEARCH_INDEX_TABLE} AS SELECT id, title FROM events"),
            ],
            feature: Some(OptionalFeature::FullTextSearch),
        },
        BootstrapStep {
            name: "keyword-index",
            statements: vec![
                format!("DROP TABLE IF EXISTS {KEYWORD_TABLE}"),
                keyword_table_sql(&source),
            ],
            feature: Some(OptionalFeature::KeywordIndex),
        },
    ]
}

fn events_view_sql(source: &str) -> String {
    format!(
        "CREATE OR REPLACE VIEW events AS
WITH ranked_events AS (
  SELECT
    CAST(GLOBALEVENTID AS VARCHAR) AS id,
    SQLDATE AS date,
    ArticleTitle AS title,
    ArticleContent AS content,
    ArticleAuthor AS author,
    SOURCEURL AS url,
    AvgTone AS sentiment,
    QuadClass AS eventType,
    ActionGeo_Lat AS lat,
    ActionGeo_Long AS lon,
    ActionGeo_CountryCode AS country,
    ActionGeo_FullName AS location,
    Actor1Name AS actor1,
    Actor2Name AS actor2,
    Actor1Geo_Lat AS actor1_lat,
    Actor1Geo_Long AS actor1_lon,
    Actor1Geo_FullName AS actor1_location,
    Actor2Geo_Lat AS actor2_lat,
    Actor2Geo_Long AS actor2_lon,
    Actor2Geo_FullName AS actor2_location,
    GoldsteinScale AS goldstein,
    Year AS year,
    quality_score,
    ROW_NUMBER() OVER (
      PARTITION BY GLOBALEVENTID
      ORDER BY quality_score DESC NULLS LAST, ArticleContentLength DESC NULLS LAST
    ) AS row_num
  FROM {source}
  WHERE ActionGeo_Lat IS NOT NULL
    AND ActionGeo_Long IS NOT NULL
    AND AvgTone IS NOT NULL
)
SELECT
  id, date, title, content, author, url, sentiment, eventType,
  lat, lon, country, location, actor1, actor2,
  actor1_lat, actor1_lon, actor1_location,
  actor2_lat, actor2_lon, actor2_location,
  goldstein, year, quality_score
FROM ranked_events
WHERE row_num = 1"
    )
}

fn keyword_table_sql(source: &str) -> String {
    let part = |column: &str, kind: &str| {
        format!(
            "SELECT {column} AS term, '{kind}' AS type, COUNT(*) AS frequency FROM {source} \
WHERE {column} IS NOT NULL GROUP BY {column}"
        )
    };
    format!(
        "CREATE TABLE {KEYWORD_TABLE} AS SELECT * FROM (\n{}\nUNION ALL\n{}\nUNION ALL\n{}\n) t ORDER BY frequency DESC",
        part("Actor1Name", "actor"),
        part("ActionGeo_FullName", "location"),
        part("NearestCity", "city"),
    )
}
