//! Text rewrites offered by the floating selection menu.
//!
//! Both operations are pure. Committing a result into an editable region is
//! done with [`replace_first`], which reports a missing target instead of
//! failing.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Clause appended by the "develop" operation.
pub const DEVELOP_CLAUSE: &str =
    ", which further illustrates the key points and provides additional context to enhance understanding";

const DEFAULT_SYNONYMS: [(&str, &str); 7] = [
    ("analyzed", "examined"),
    ("important", "crucial"),
    ("provides", "offers"),
    ("demonstrates", "illustrates"),
    ("comprehensive", "thorough"),
    ("essential", "vital"),
    ("significant", "substantial"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewriteOp {
    Synonym,
    Develop,
}

impl RewriteOp {
    pub fn success_message(&self) -> &'static str {
        match self {
            RewriteOp::Synonym => "Synonym applied!",
            RewriteOp::Develop => "Text developed!",
        }
    }
}

/// Lower-case word → replacement word.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SynonymTable(HashMap<String, String>);

impl Default for SynonymTable {
    fn default() -> Self {
        DEFAULT_SYNONYMS
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }
}

impl FromIterator<(String, String)> for SynonymTable {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        SynonymTable(iter.into_iter().map(|(k, v)| (k.to_lowercase(), v)).collect())
    }
}

impl SynonymTable {
    /// Parses a JSON object of `"word": "replacement"` pairs.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let raw: HashMap<String, String> = serde_json::from_str(json)?;
        Ok(raw.into_iter().collect())
    }

    pub fn lookup(&self, word: &str) -> Option<&str> {
        self.0.get(word).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Lower-cases every whitespace-separated token and swaps known words.
///
/// The original casing is not preserved, even for tokens with no synonym.
pub fn substitute_synonyms(table: &SynonymTable, text: &str) -> String {
    text.split_whitespace()
        .map(|token| {
            let lower = token.to_lowercase();
            match table.lookup(&lower) {
                Some(synonym) => synonym.to_string(),
                None => lower,
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn develop(text: &str) -> String {
    format!("{}{}", text, DEVELOP_CLAUSE)
}

/// Replaces the first occurrence of `target` in `live`.
///
/// Returns `None` when `target` is empty or no longer present.
pub fn replace_first(live: &str, target: &str, replacement: &str) -> Option<String> {
    if target.is_empty() {
        return None;
    }
    let start = live.find(target)?;
    let mut updated = String::with_capacity(live.len() - target.len() + replacement.len());
    updated.push_str(&live[..start]);
    updated.push_str(replacement);
    updated.push_str(&live[start + target.len()..]);
    Some(updated)
}

#[derive(Debug, Clone, Default)]
pub struct RewriteEngine {
    synonyms: SynonymTable,
}

impl RewriteEngine {
    pub fn new(synonyms: SynonymTable) -> Self {
        Self { synonyms }
    }

    pub fn transform(&self, op: RewriteOp, selected: &str) -> String {
        match op {
            RewriteOp::Synonym => substitute_synonyms(&self.synonyms, selected),
            RewriteOp::Develop => develop(selected),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_words_pass_through() {
        let table = SynonymTable::default();
        assert_eq!(substitute_synonyms(&table, "hello world"), "hello world");
    }

    #[test]
    fn known_word_is_replaced() {
        let table = SynonymTable::default();
        assert_eq!(substitute_synonyms(&table, "important"), "crucial");
    }

    #[test]
    fn casing_is_folded_before_lookup() {
        let table = SynonymTable::default();
        assert_eq!(substitute_synonyms(&table, "Important"), "crucial");
        assert_eq!(substitute_synonyms(&table, "Hello World"), "hello world");
        assert_eq!(substitute_synonyms(&table, "This is important"), "this is crucial");
    }

    #[test]
    fn whitespace_collapses_to_single_spaces() {
        let table = SynonymTable::default();
        assert_eq!(
            substitute_synonyms(&table, "essential\n  and\tsignificant"),
            "vital and substantial"
        );
    }

    #[test]
    fn custom_table_keys_are_lower_cased() {
        let table = SynonymTable::from_json(r#"{"Quick": "rapid"}"#).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(substitute_synonyms(&table, "quick fox"), "rapid fox");
    }

    #[test]
    fn develop_is_deterministic() {
        let once = develop("The data");
        assert_eq!(once, develop("The data"));
        assert_eq!(
            once,
            "The data, which further illustrates the key points and provides additional context to enhance understanding"
        );
    }

    #[test]
    fn replace_first_only_touches_first_occurrence() {
        assert_eq!(
            replace_first("a b a", "a", "c").as_deref(),
            Some("c b a")
        );
    }

    #[test]
    fn replace_first_reports_missing_target() {
        assert_eq!(replace_first("abc", "xyz", "q"), None);
        assert_eq!(replace_first("abc", "", "q"), None);
    }

    #[test]
    fn engine_dispatches_by_operation() {
        let engine = RewriteEngine::default();
        assert_eq!(engine.transform(RewriteOp::Synonym, "provides"), "offers");
        assert!(engine.transform(RewriteOp::Develop, "x").starts_with("x, which"));
    }
}
