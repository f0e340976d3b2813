//! Search Configuration and Matching
//!
//! Turns raw user input into a match policy and evaluates token names against
//! it. Matching is case-insensitive substring matching over the whole name and
//! over its individual words.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use super::event::TokenEvent;

/// Term substituted when the input yields no usable terms
pub const DEFAULT_FALLBACK_TERM: &str = "vamp";

/// Legacy special-case term; see [`matches_vamp_rule`]
pub const VAMP_TERM: &str = "vamp";

/// Errors from preparing a search. Current parsing never fails; the variant
/// is kept so callers handle the error channel.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    #[error("Failed to process search terms: {0}")]
    InvalidInput(String),
}

/// Active match policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchConfiguration {
    /// Every event matches
    MonitorAll,
    /// Lowercase, trimmed, non-empty terms
    Terms(Vec<String>),
}

impl SearchConfiguration {
    /// Parse raw user input.
    ///
    /// Empty or whitespace-only input selects [`SearchConfiguration::MonitorAll`].
    /// Otherwise the input is split on commas, each term trimmed and
    /// lower-cased, and empty terms dropped. If nothing survives (e.g. `",,"`)
    /// the [`DEFAULT_FALLBACK_TERM`] is used.
    pub fn parse(input: &str) -> Result<Self, SearchError> {
        if input.trim().is_empty() {
            return Ok(SearchConfiguration::MonitorAll);
        }

        let mut terms: Vec<String> = input
            .split(',')
            .map(|term| term.trim().to_lowercase())
            .filter(|term| !term.is_empty())
            .collect();

        if terms.is_empty() {
            terms.push(DEFAULT_FALLBACK_TERM.to_string());
        }

        Ok(SearchConfiguration::Terms(terms))
    }

    pub fn is_monitor_all(&self) -> bool {
        matches!(self, SearchConfiguration::MonitorAll)
    }

    /// Terms in effect (empty for MonitorAll)
    pub fn terms(&self) -> &[String] {
        match self {
            SearchConfiguration::MonitorAll => &[],
            SearchConfiguration::Terms(terms) => terms,
        }
    }
}

impl FromStr for SearchConfiguration {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for SearchConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchConfiguration::MonitorAll => write!(f, "all tokens"),
            SearchConfiguration::Terms(terms) => write!(f, "{}", terms.join(", ")),
        }
    }
}

/// Split a lower-cased name into words on whitespace, `_`, `-` and `.` runs
fn name_words(name: &str) -> impl Iterator<Item = &str> {
    name.split(|c: char| c.is_whitespace() || c == '_' || c == '-' || c == '.')
        .filter(|word| !word.is_empty())
}

/// Match a single term against a lower-cased name (whole name, then words)
fn matches_term(name_lower: &str, term: &str) -> bool {
    let term = term.to_lowercase();
    if term.is_empty() {
        return false;
    }

    if name_lower.contains(&term) {
        return true;
    }

    name_words(name_lower).any(|word| word.contains(&term))
}

/// Legacy rule: a name containing "vamp" matches when the term list holds
/// exactly the term "vamp".
pub fn matches_vamp_rule(name_lower: &str, terms: &[String]) -> bool {
    name_lower.contains(VAMP_TERM) && terms.iter().any(|t| t.to_lowercase() == VAMP_TERM)
}

/// Evaluate an event name against the active policy
pub fn matches_name(name: &str, config: &SearchConfiguration) -> bool {
    let terms = match config {
        SearchConfiguration::MonitorAll => return true,
        SearchConfiguration::Terms(terms) => terms,
    };

    let name_lower = name.to_lowercase();

    if terms.iter().any(|term| matches_term(&name_lower, term)) {
        return true;
    }

    matches_vamp_rule(&name_lower, terms)
}

/// Evaluate an event against the active policy
pub fn matches(event: &TokenEvent, config: &SearchConfiguration) -> bool {
    matches_name(event.name(), config)
}
