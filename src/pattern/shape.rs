//! Structural matchers over consecutive events.
//!
//! A shape is a small sequence of steps, each constraining one tag event.
//! Whitespace-only text events between steps are skipped, so formatting
//! between adjacent tags never defeats a match.

use crate::pattern::errors::RuleError;
use crate::pattern::Match;
use crate::scan::{EventKind, StructuralEvent};
use std::collections::HashMap;

/// Which event kind a step accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    Open,
    Close,
    SelfClose,
}

/// One step of a shape: constraints on a single tag event.
#[derive(Debug, Clone, Default)]
pub struct ShapeStep {
    kind: Option<StepKind>,
    /// Accepted tag names; empty accepts any tag
    tags: Vec<String>,
    /// Required attribute substring: (attribute name, substring)
    attr_contains: Option<(String, String)>,
    /// Capture an attribute value: (attribute name, capture name)
    capture_attr: Option<(String, String)>,
}

impl ShapeStep {
    pub fn open() -> Self {
        Self {
            kind: Some(StepKind::Open),
            ..Self::default()
        }
    }

    pub fn close() -> Self {
        Self {
            kind: Some(StepKind::Close),
            ..Self::default()
        }
    }

    pub fn self_close() -> Self {
        Self {
            kind: Some(StepKind::SelfClose),
            ..Self::default()
        }
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags = vec![tag.into()];
        self
    }

    pub fn tag_in(mut self, tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn attr_contains(mut self, attr: impl Into<String>, substring: impl Into<String>) -> Self {
        self.attr_contains = Some((attr.into(), substring.into()));
        self
    }

    pub fn capture_attr(mut self, attr: impl Into<String>, name: impl Into<String>) -> Self {
        self.capture_attr = Some((attr.into(), name.into()));
        self
    }

    pub fn is_open_step(&self) -> bool {
        matches!(self.kind, Some(StepKind::Open))
    }

    fn accepts(&self, event: &StructuralEvent) -> bool {
        let kind_ok = match (&self.kind, &event.kind) {
            (Some(StepKind::Open), EventKind::Open { .. })
            | (Some(StepKind::Close), EventKind::Close { .. })
            | (Some(StepKind::SelfClose), EventKind::SelfClose { .. }) => true,
            (None, EventKind::Text) => false,
            (None, _) => true,
            _ => false,
        };
        if !kind_ok {
            return false;
        }

        if !self.tags.is_empty() {
            match event.tag() {
                Some(tag) if self.tags.iter().any(|t| t == tag) => {}
                _ => return false,
            }
        }

        if let Some((attr, substring)) = &self.attr_contains {
            match event.attr_value(attr) {
                Some(value) if value.contains(substring.as_str()) => {}
                _ => return false,
            }
        }

        true
    }
}

/// A sequence of steps matched against consecutive events.
#[derive(Debug, Clone)]
pub struct ShapePattern {
    steps: Vec<ShapeStep>,
}

impl ShapePattern {
    pub fn new(steps: Vec<ShapeStep>, rule_id: &str) -> Result<Self, RuleError> {
        if steps.is_empty() {
            return Err(RuleError::EmptyShape {
                rule_id: rule_id.to_string(),
            });
        }
        Ok(Self { steps })
    }

    /// Whether the first step selects an open tag (required by unwrap).
    pub fn starts_with_open(&self) -> bool {
        self.steps[0].is_open_step()
    }

    /// All matches in document order. Overlap resolution is the caller's
    /// concern; this returns every position where the shape fits.
    pub fn find_all(&self, text: &str, events: &[StructuralEvent]) -> Vec<Match> {
        let mut matches = Vec::new();
        for start in 0..events.len() {
            if let Some(m) = self.try_match_at(text, events, start) {
                matches.push(m);
            }
        }
        matches
    }

    fn try_match_at(
        &self,
        text: &str,
        events: &[StructuralEvent],
        start: usize,
    ) -> Option<Match> {
        let mut captures = HashMap::new();
        let mut idx = start;
        let mut last_end = 0;

        for (step_no, step) in self.steps.iter().enumerate() {
            // Between steps, skip whitespace-only text; the first step must
            // land exactly on the start event.
            if step_no > 0 {
                while idx < events.len() && events[idx].is_whitespace_text(text) {
                    idx += 1;
                }
            }
            let event = events.get(idx)?;
            if !step.accepts(event) {
                return None;
            }
            if let Some((attr, name)) = &step.capture_attr {
                captures.insert(
                    name.clone(),
                    event.attr_value(attr).unwrap_or_default().to_string(),
                );
            }
            last_end = event.span.end;
            idx += 1;
        }

        let byte_start = events[start].span.start;
        Some(Match {
            byte_start,
            byte_end: last_end,
            text: text[byte_start..last_end].to_string(),
            captures,
            open_event: events[start].is_open().then_some(start),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::tokenize;

    #[test]
    fn single_step_matches_every_open() {
        let text = "<div>a</div><section>b</section>";
        let events = tokenize(text);
        let shape = ShapePattern::new(vec![ShapeStep::open()], "t").unwrap();
        let matches = shape.find_all(text, &events);
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].text, "<div>");
        assert_eq!(matches[1].text, "<section>");
    }

    #[test]
    fn tag_filter_restricts_matches() {
        let text = "<div>a</div><section>b</section>";
        let events = tokenize(text);
        let shape = ShapePattern::new(vec![ShapeStep::open().tag("section")], "t").unwrap();
        let matches = shape.find_all(text, &events);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].text, "<section>");
    }

    #[test]
    fn consecutive_opens_ignoring_whitespace() {
        let text = "<div class=\"relative\">\n    <div class=\"w-16 icon\">x</div></div>";
        let events = tokenize(text);
        let shape = ShapePattern::new(
            vec![
                ShapeStep::open().tag("div").attr_contains("class", "relative"),
                ShapeStep::open().tag("div").attr_contains("class", "w-16"),
            ],
            "t",
        )
        .unwrap();
        let matches = shape.find_all(text, &events);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].byte_start, 0);
        assert!(matches[0].text.ends_with("icon\">"));
        assert_eq!(matches[0].open_event, Some(0));
    }

    #[test]
    fn non_whitespace_text_between_steps_blocks_match() {
        let text = "<div class=\"relative\">content<div class=\"w-16\">x</div></div>";
        let events = tokenize(text);
        let shape = ShapePattern::new(
            vec![
                ShapeStep::open().attr_contains("class", "relative"),
                ShapeStep::open().attr_contains("class", "w-16"),
            ],
            "t",
        )
        .unwrap();
        assert!(shape.find_all(text, &events).is_empty());
    }

    #[test]
    fn tag_set_membership() {
        let text = "<span>a</span><em>b</em><div>c</div>";
        let events = tokenize(text);
        let shape =
            ShapePattern::new(vec![ShapeStep::open().tag_in(["span", "em"])], "t").unwrap();
        assert_eq!(shape.find_all(text, &events).len(), 2);
    }

    #[test]
    fn captures_attribute_value() {
        let text = r#"<div className="bg-red-500/10 blur-2xl" />"#;
        let events = tokenize(text);
        let shape = ShapePattern::new(
            vec![ShapeStep::self_close()
                .attr_contains("className", "blur")
                .capture_attr("className", "classes")],
            "t",
        )
        .unwrap();
        let matches = shape.find_all(text, &events);
        assert_eq!(matches.len(), 1);
        assert_eq!(
            matches[0].captures.get("classes").map(String::as_str),
            Some("bg-red-500/10 blur-2xl")
        );
        assert_eq!(matches[0].open_event, None);
    }

    #[test]
    fn empty_shape_is_rejected() {
        assert!(matches!(
            ShapePattern::new(Vec::new(), "t"),
            Err(RuleError::EmptyShape { .. })
        ));
    }
}
