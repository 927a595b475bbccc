//! Pattern matching over document text and structural events.
//!
//! Two matcher kinds share one result type: textual patterns (fixed
//! substring or regex with named captures) over raw text, and shape patterns
//! over consecutive events. Matches come back in document order,
//! non-overlapping, leftmost-first: once a span is accepted, any later
//! candidate overlapping it is skipped, mirroring first-successful-
//! substitution-wins semantics when several repair rules could touch the
//! same region.

pub mod errors;
pub mod shape;
pub mod text;

pub use errors::RuleError;
pub use shape::{ShapePattern, ShapeStep, StepKind};
pub use text::TextPattern;

use crate::scan::StructuralEvent;
use std::collections::HashMap;

/// One accepted match: a byte span plus any captured sub-values the paired
/// action needs.
#[derive(Debug, Clone)]
pub struct Match {
    /// Byte range of the entire match
    pub byte_start: usize,
    pub byte_end: usize,
    /// The matched text
    pub text: String,
    /// Captured sub-values: name -> text
    pub captures: HashMap<String, String>,
    /// Index of the open event the match starts on, when it starts on one.
    /// Unwrap actions use this to locate the pairing close.
    pub open_event: Option<usize>,
}

impl Match {
    pub fn overlaps(&self, other: &Match) -> bool {
        self.byte_start < other.byte_end && other.byte_start < self.byte_end
    }
}

/// A predicate producing match spans, in document order.
#[derive(Debug, Clone)]
pub enum Matcher {
    Text(TextPattern),
    Shape(ShapePattern),
}

impl Matcher {
    /// All non-overlapping matches, leftmost-first.
    pub fn find_matches(&self, text: &str, events: &[StructuralEvent]) -> Vec<Match> {
        let mut raw = match self {
            Matcher::Text(pattern) => pattern.find_all(text),
            Matcher::Shape(pattern) => pattern.find_all(text, events),
        };
        raw.sort_by_key(|m| (m.byte_start, m.byte_end));
        retain_leftmost(raw)
    }
}

/// Keep the leftmost of any overlapping pair. Input must be sorted by start;
/// accepted matches are then disjoint with increasing ends, so a candidate
/// overlaps some accepted match iff it overlaps the last one.
fn retain_leftmost(matches: Vec<Match>) -> Vec<Match> {
    let mut accepted: Vec<Match> = Vec::with_capacity(matches.len());
    for m in matches {
        if accepted.last().map_or(true, |last| !last.overlaps(&m)) {
            accepted.push(m);
        }
    }
    accepted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::tokenize;

    #[test]
    fn nested_shape_matches_keep_outermost() {
        // Both divs satisfy the shape; the inner one overlaps the outer
        // match's span and is skipped.
        let text = "<div><div>x</div></div>";
        let events = tokenize(text);
        let shape = ShapePattern::new(
            vec![ShapeStep::open().tag("div"), ShapeStep::open().tag("div")],
            "t",
        );
        // Only one two-open run exists here, starting at the outer div
        let matcher = Matcher::Shape(shape.unwrap());
        let matches = matcher.find_matches(text, &events);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].byte_start, 0);
    }

    #[test]
    fn overlapping_shape_candidates_resolve_to_the_earliest() {
        let text = "<div><div><div>x";
        let events = tokenize(text);
        let shape = ShapePattern::new(
            vec![ShapeStep::open().tag("div"), ShapeStep::open().tag("div")],
            "t",
        )
        .unwrap();
        let matches = Matcher::Shape(shape).find_matches(text, &events);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].byte_start, 0);
        assert_eq!(matches[0].byte_end, 10);
    }

    #[test]
    fn no_two_matches_share_an_offset() {
        let text = "aaaa";
        let matcher = Matcher::Text(TextPattern::wildcard("aa", "t").unwrap());
        let matches = matcher.find_matches(text, &[]);
        assert_eq!(matches.len(), 2);
        assert!(!matches[0].overlaps(&matches[1]));
    }

    #[test]
    fn leftmost_match_wins_over_longer_later_candidate() {
        let text = "<div><span>x</span></div>";
        let events = tokenize(text);
        let shape =
            ShapePattern::new(vec![ShapeStep::open()], "t").unwrap();
        let matches = Matcher::Shape(shape).find_matches(text, &events);
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].byte_start, 0);
        assert_eq!(matches[1].byte_start, 5);
    }
}
