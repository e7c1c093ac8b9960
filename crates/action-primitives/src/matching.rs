//! Text matching used by role and text queries

use regex::Regex;
use serde::{Deserialize, Serialize};

/// How an intent is compared against accessible names and text content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Case-insensitive substring
    #[default]
    Substring,

    /// Whitespace-normalised, case-sensitive equality
    Exact,

    /// Regular expression applied to the normalised text
    Pattern,
}

/// Compiled matcher for one intent.
#[derive(Debug, Clone)]
pub struct TextMatcher {
    needle: String,
    lowered: String,
    mode: MatchMode,
    regex: Option<Regex>,
}

impl TextMatcher {
    pub fn new(needle: &str, mode: MatchMode) -> Result<Self, regex::Error> {
        let normalized = normalize_whitespace(needle);
        let regex = match mode {
            MatchMode::Pattern => Some(Regex::new(needle)?),
            _ => None,
        };
        Ok(Self {
            lowered: normalized.to_lowercase(),
            needle: normalized,
            mode,
            regex,
        })
    }

    pub fn substring(needle: &str) -> Self {
        let normalized = normalize_whitespace(needle);
        Self {
            lowered: normalized.to_lowercase(),
            needle: normalized,
            mode: MatchMode::Substring,
            regex: None,
        }
    }

    pub fn needle(&self) -> &str {
        &self.needle
    }

    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    pub fn matches(&self, haystack: &str) -> bool {
        let haystack = normalize_whitespace(haystack);
        match self.mode {
            MatchMode::Substring => haystack.to_lowercase().contains(&self.lowered),
            MatchMode::Exact => haystack == self.needle,
            MatchMode::Pattern => self
                .regex
                .as_ref()
                .map(|re| re.is_match(&haystack))
                .unwrap_or(false),
        }
    }
}

/// Collapse runs of whitespace into single spaces and trim both ends.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substring_is_case_insensitive() {
        let matcher = TextMatcher::substring("submit");
        assert!(matcher.matches("Submit Form"));
        assert!(matcher.matches("  RESUBMIT\n now"));
        assert!(!matcher.matches("Send"));
    }

    #[test]
    fn exact_requires_full_text() {
        let matcher = TextMatcher::new(" Delete  Row 3 ", MatchMode::Exact).unwrap();
        assert!(matcher.matches("Delete Row 3"));
        assert!(matcher.matches("\n Delete\tRow 3"));
        assert!(!matcher.matches("delete row 3"));
        assert!(!matcher.matches("Delete Row 30"));
    }

    #[test]
    fn pattern_uses_regex() {
        let matcher = TextMatcher::new(r"^Row \d+$", MatchMode::Pattern).unwrap();
        assert!(matcher.matches("Row 12"));
        assert!(!matcher.matches("Delete Row 12"));
        assert!(TextMatcher::new("(", MatchMode::Pattern).is_err());
    }

    #[test]
    fn whitespace_normalisation() {
        assert_eq!(normalize_whitespace("  a \n b\t c "), "a b c");
        assert_eq!(normalize_whitespace(""), "");
    }
}
