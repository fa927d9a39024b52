use crate::sql::{prefix_pattern, LIKE_ESCAPE};

/// Materialized `(term, type, frequency)` relation backing autocomplete.
pub const KEYWORD_TABLE: &str = "search_keywords";

/// Prefix lookup against the keyword table, most frequent first.
pub fn suggestion_sql(prefix: &str, limit: usize) -> String {
    format!(
        "SELECT term, type, frequency FROM {KEYWORD_TABLE} WHERE term ILIKE {} ESCAPE '{LIKE_ESCAPE}' \
ORDER BY frequency DESC LIMIT {limit}",
        prefix_pattern(prefix)
    )
}

#[cfg(test)]
mod tests {
    use super::suggestion_sql;
    use pretty_assertions::assert_eq;

    #[test]
    fn prefix_query_is_ranked_and_capped() {
        assert_eq!(
            suggestion_sql("Ber", 10),
            "SELECT term, type, frequency FROM search_keywords WHERE term ILIKE 'Ber%' ESCAPE '\\' \
ORDER BY frequency DESC LIMIT 10"
        );
    }

    #[test]
    fn prefix_is_escaped() {
        let sql = suggestion_sql("O'_", 10);
        assert!(sql.contains("ILIKE 'O''\\_%'"));
    }
}
