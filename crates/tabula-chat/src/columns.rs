//! Column reference resolution.
//!
//! Resolution chain: exact name, case-insensitive name, then a synonym
//! table mapping common phrasings onto dataset columns ("gender" -> Sex).
//! Extraction scans a query for the first token or bigram that resolves;
//! an explicit-looking reference that resolves to nothing is reported as
//! unresolved so the router can answer with a column-not-found error.

/// Common phrasings for well-known columns. Both directions are listed so
/// either name can appear in the dataset.
const SYNONYMS: [(&str, &str); 14] = [
    ("gender", "sex"),
    ("sex", "gender"),
    ("price", "fare"),
    ("fare", "price"),
    ("cost", "fare"),
    ("class", "pclass"),
    ("pclass", "class"),
    ("port", "embarked"),
    ("embarked", "port"),
    ("embarkation", "embarked"),
    ("survival", "survived"),
    ("survived", "survival"),
    ("ages", "age"),
    ("fares", "fare"),
];

/// Query words that never name a column.
const STOP_WORDS: [&str; 47] = [
    "show", "me", "a", "an", "the", "of", "for", "by", "plot", "chart", "graph", "draw",
    "visualize", "visualise", "distribution", "histogram", "bar", "pie", "heatmap", "please",
    "can", "you", "what", "is", "are", "breakdown", "display", "create", "make", "generate",
    "column", "columns", "values", "data", "and", "with", "in", "dataset", "how", "many",
    "rows", "records", "number", "total", "average", "mean", "count",
];

/// Resolve one reference against the table's column names.
pub fn resolve(names: &[&str], reference: &str) -> Option<String> {
    // Exact match.
    if let Some(name) = names.iter().find(|n| **n == reference) {
        return Some(name.to_string());
    }
    // Case-insensitive match.
    let lower = reference.to_lowercase();
    if let Some(name) = names.iter().find(|n| n.to_lowercase() == lower) {
        return Some(name.to_string());
    }
    // Synonym table, case-insensitive on both sides.
    for (from, to) in SYNONYMS {
        if lower == from {
            if let Some(name) = names.iter().find(|n| n.to_lowercase() == to) {
                return Some(name.to_string());
            }
        }
    }
    None
}

/// Result of scanning a query for a column reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetColumn {
    /// A reference resolved to this column.
    Resolved(String),
    /// Something that looks like a column reference did not resolve.
    Unresolved(String),
    /// The query names no column at all.
    None,
}

/// Find the column a query talks about.
pub fn extract_target(query: &str, names: &[&str]) -> TargetColumn {
    let cleaned: String = query
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { ' ' })
        .collect();
    let tokens: Vec<&str> = cleaned.split_whitespace().collect();

    // Bigrams first so multi-word column names win over their parts.
    for window in tokens.windows(2) {
        let joined = format!("{} {}", window[0], window[1]);
        if let Some(name) = resolve(names, &joined) {
            return TargetColumn::Resolved(name);
        }
        let underscored = format!("{}_{}", window[0], window[1]);
        if let Some(name) = resolve(names, &underscored) {
            return TargetColumn::Resolved(name);
        }
    }
    for token in &tokens {
        if let Some(name) = resolve(names, token) {
            return TargetColumn::Resolved(name);
        }
    }

    // No resolution: the first substantive token is treated as an explicit
    // reference that failed.
    let candidate = tokens
        .iter()
        .find(|t| t.len() > 2 && !STOP_WORDS.contains(&t.to_lowercase().as_str()));
    match candidate {
        Some(token) => TargetColumn::Unresolved(token.to_string()),
        None => TargetColumn::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TITANIC: [&str; 7] = ["Survived", "Pclass", "Sex", "Age", "Fare", "Embarked", "Name"];

    // ---- resolve ----

    #[test]
    fn test_resolve_exact() {
        assert_eq!(resolve(&TITANIC, "Age"), Some("Age".to_string()));
    }

    #[test]
    fn test_resolve_case_insensitive() {
        assert_eq!(resolve(&TITANIC, "age"), Some("Age".to_string()));
        assert_eq!(resolve(&TITANIC, "SEX"), Some("Sex".to_string()));
    }

    #[test]
    fn test_resolve_synonyms() {
        assert_eq!(resolve(&TITANIC, "gender"), Some("Sex".to_string()));
        assert_eq!(resolve(&TITANIC, "price"), Some("Fare".to_string()));
        assert_eq!(resolve(&TITANIC, "class"), Some("Pclass".to_string()));
        assert_eq!(resolve(&TITANIC, "port"), Some("Embarked".to_string()));
        assert_eq!(resolve(&TITANIC, "survival"), Some("Survived".to_string()));
    }

    #[test]
    fn test_resolve_exact_beats_synonym() {
        // A table that actually has a Gender column should get it, not Sex.
        let names = ["Gender", "Sex"];
        assert_eq!(resolve(&names, "gender"), Some("Gender".to_string()));
    }

    #[test]
    fn test_resolve_unknown_is_none() {
        assert_eq!(resolve(&TITANIC, "Zorblatt"), None);
        assert_eq!(resolve(&TITANIC, ""), None);
    }

    // ---- extract_target ----

    #[test]
    fn test_extract_gender_distribution() {
        assert_eq!(
            extract_target("show gender distribution", &TITANIC),
            TargetColumn::Resolved("Sex".to_string())
        );
    }

    #[test]
    fn test_extract_direct_name() {
        assert_eq!(
            extract_target("plot a histogram of Age", &TITANIC),
            TargetColumn::Resolved("Age".to_string())
        );
    }

    #[test]
    fn test_extract_with_punctuation() {
        assert_eq!(
            extract_target("What's the fare, roughly?", &TITANIC),
            TargetColumn::Resolved("Fare".to_string())
        );
    }

    #[test]
    fn test_extract_bigram_column() {
        let names = ["Passenger Class", "Age"];
        assert_eq!(
            extract_target("chart passenger class please", &names),
            TargetColumn::Resolved("Passenger Class".to_string())
        );
    }

    #[test]
    fn test_extract_underscored_column() {
        let names = ["passenger_class"];
        assert_eq!(
            extract_target("chart passenger class", &names),
            TargetColumn::Resolved("passenger_class".to_string())
        );
    }

    #[test]
    fn test_extract_unresolved_reference() {
        assert_eq!(
            extract_target("plot Zorblatt", &TITANIC),
            TargetColumn::Unresolved("Zorblatt".to_string())
        );
    }

    #[test]
    fn test_extract_nothing() {
        assert_eq!(extract_target("show me a chart", &TITANIC), TargetColumn::None);
        assert_eq!(extract_target("", &TITANIC), TargetColumn::None);
    }
}
