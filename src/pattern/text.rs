//! Textual matchers over raw document text.
//!
//! These operate independently of tokenization, which is what attribute-value
//! style edits need: the target is a run of raw characters, not a structural
//! shape.

use crate::pattern::errors::RuleError;
use crate::pattern::Match;
use regex::Regex;
use std::collections::HashMap;

/// A pattern over raw text: either a fixed substring or a compiled regular
/// expression with named capture groups.
#[derive(Debug, Clone)]
pub enum TextPattern {
    Fixed(String),
    Wildcard(Regex),
}

impl TextPattern {
    /// Exact substring match, no metacharacters.
    pub fn fixed(search: impl Into<String>) -> Self {
        TextPattern::Fixed(search.into())
    }

    /// Compile a wildcard-bearing pattern. Named groups `(?P<name>...)`
    /// become captures available to the paired action.
    pub fn wildcard(pattern: &str, rule_id: &str) -> Result<Self, RuleError> {
        if pattern.is_empty() {
            return Err(RuleError::EmptyPattern {
                rule_id: rule_id.to_string(),
            });
        }
        let regex = Regex::new(pattern).map_err(|e| RuleError::InvalidPattern {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })?;
        Ok(TextPattern::Wildcard(regex))
    }

    /// All matches in document order. Matches from a single pattern never
    /// overlap: fixed search resumes past each hit and the regex engine is
    /// non-overlapping by construction.
    pub fn find_all(&self, text: &str) -> Vec<Match> {
        match self {
            TextPattern::Fixed(search) => {
                if search.is_empty() {
                    return Vec::new();
                }
                text.match_indices(search.as_str())
                    .map(|(start, matched)| Match {
                        byte_start: start,
                        byte_end: start + matched.len(),
                        text: matched.to_string(),
                        captures: HashMap::new(),
                        open_event: None,
                    })
                    .collect()
            }
            TextPattern::Wildcard(regex) => {
                let names: Vec<&str> = regex.capture_names().flatten().collect();
                regex
                    .captures_iter(text)
                    .filter_map(|caps| {
                        let whole = caps.get(0)?;
                        // Zero-width matches would produce empty edits that
                        // never converge; drop them.
                        if whole.is_empty() {
                            return None;
                        }
                        let captures = names
                            .iter()
                            .filter_map(|name| {
                                caps.name(name)
                                    .map(|m| (name.to_string(), m.as_str().to_string()))
                            })
                            .collect();
                        Some(Match {
                            byte_start: whole.start(),
                            byte_end: whole.end(),
                            text: whole.as_str().to_string(),
                            captures,
                            open_event: None,
                        })
                    })
                    .collect()
            }
        }
    }
}
