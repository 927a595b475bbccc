//! Transform pipeline - ordered rewrite rules with balance-guarded rollback
//!
//! This module provides the high-level transformation flow that:
//! - Re-tokenizes the document before each rule
//! - Finds non-overlapping matches and compiles them to span edits
//! - Applies edits right-to-left so offsets stay valid within a rule
//! - Re-verifies balance after each rule and rolls the document back when a
//!   rule would leave it structurally worse
//! - Reports a per-rule outcome plus the terminal balance

use crate::edit::SpanEdit;
use crate::pattern::{Match, Matcher};
use crate::scan::{self, BalanceMode, BalanceReport, StructuralEvent};
use std::collections::HashMap;

/// A document moving through the pipeline. The label is an opaque name
/// supplied by the caller; the core never treats it as a filesystem path.
#[derive(Debug, Clone)]
pub struct Document {
    pub label: String,
    pub text: String,
}

impl Document {
    pub fn new(label: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            text: text.into(),
        }
    }
}

/// What to do with each matched span.
#[derive(Debug, Clone)]
pub enum Action {
    /// Replace the span with a template; `$name` references a capture.
    Replace { template: String },
    /// Delete the span.
    Delete,
    /// The span starts at an open tag: remove that tag and its pairing
    /// close, keeping the inner content.
    Unwrap,
}

/// One targeted edit intent: a matcher paired with an action. Immutable
/// configuration; many documents may share the same rule list.
#[derive(Debug, Clone)]
pub struct Rule {
    pub id: String,
    pub matcher: Matcher,
    pub action: Action,
}

impl Rule {
    pub fn new(id: impl Into<String>, matcher: Matcher, action: Action) -> Self {
        Self {
            id: id.into(),
            matcher,
            action,
        }
    }
}

/// Outcome of one rule against one document.
#[derive(Debug, Clone)]
pub struct RuleOutcome {
    pub rule_index: usize,
    pub rule_id: String,
    /// False when the rule found no matches or was rejected and rolled back
    pub applied: bool,
    pub match_count: usize,
    pub balance_before: i64,
    pub balance_after: i64,
    /// For rejected rules, the offset of the first structural problem the
    /// rule would have introduced
    pub first_failure_offset: Option<usize>,
}

/// Per-document report: ordered rule outcomes plus the terminal balance.
///
/// The terminal balance is always present, even on full success, so a
/// caller can decide whether manual review is needed.
#[derive(Debug, Clone)]
pub struct TransformReport {
    pub outcomes: Vec<RuleOutcome>,
    pub terminal: BalanceReport,
}

impl TransformReport {
    pub fn is_balanced(&self) -> bool {
        self.terminal.is_valid(BalanceMode::Loose)
    }

    /// Count of rules that actually changed the document.
    pub fn applied_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.applied).count()
    }

    /// Count of rules that were rejected and rolled back.
    pub fn rejected_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| !o.applied && o.match_count > 0)
            .count()
    }
}

/// Result of processing one document.
#[derive(Debug, Clone)]
pub struct DocumentOutcome {
    pub label: String,
    pub final_text: String,
    pub report: TransformReport,
}

/// Run the rule list over one document.
///
/// Zero matches for a rule is not an error; a rejected rule rolls the text
/// back and the pipeline continues. A single bad rule never aborts the rest.
pub fn run(document: &Document, rules: &[Rule]) -> (String, TransformReport) {
    let mut current = document.text.clone();
    let mut outcomes = Vec::with_capacity(rules.len());

    for (rule_index, rule) in rules.iter().enumerate() {
        let events = scan::tokenize(&current);
        let before = scan::verify(&events);
        let matches = rule.matcher.find_matches(&current, &events);

        if matches.is_empty() {
            outcomes.push(RuleOutcome {
                rule_index,
                rule_id: rule.id.clone(),
                applied: false,
                match_count: 0,
                balance_before: before.final_depth,
                balance_after: before.final_depth,
                first_failure_offset: None,
            });
            continue;
        }

        let match_count = matches.len();
        let first_match_offset = matches[0].byte_start;
        let edits = build_edits(&current, &events, &matches, &rule.action);

        if edits.is_empty() {
            // Matches existed but none could be compiled to edits (an
            // unwrap whose open has no pairing close).
            outcomes.push(RuleOutcome {
                rule_index,
                rule_id: rule.id.clone(),
                applied: false,
                match_count,
                balance_before: before.final_depth,
                balance_after: before.final_depth,
                first_failure_offset: Some(first_match_offset),
            });
            continue;
        }

        let candidate = match SpanEdit::apply_all(edits, &current) {
            Ok(candidate) => candidate,
            Err(_) => {
                outcomes.push(RuleOutcome {
                    rule_index,
                    rule_id: rule.id.clone(),
                    applied: false,
                    match_count,
                    balance_before: before.final_depth,
                    balance_after: before.final_depth,
                    first_failure_offset: Some(first_match_offset),
                });
                continue;
            }
        };

        let after = scan::verify(&scan::tokenize(&candidate));

        if worsens(&before, &after) {
            // Reject: keep the pre-rule text, record where it went wrong.
            outcomes.push(RuleOutcome {
                rule_index,
                rule_id: rule.id.clone(),
                applied: false,
                match_count,
                balance_before: before.final_depth,
                balance_after: after.final_depth,
                first_failure_offset: after
                    .first_problem_offset()
                    .or(Some(first_match_offset)),
            });
            continue;
        }

        outcomes.push(RuleOutcome {
            rule_index,
            rule_id: rule.id.clone(),
            applied: true,
            match_count,
            balance_before: before.final_depth,
            balance_after: after.final_depth,
            first_failure_offset: None,
        });
        current = candidate;
    }

    let terminal = scan::verify(&scan::tokenize(&current));
    (current, TransformReport { outcomes, terminal })
}

/// Run the rule list over many documents. Documents are independent; the
/// core holds no state across them.
pub fn process(documents: &[Document], rules: &[Rule]) -> Vec<DocumentOutcome> {
    documents
        .iter()
        .map(|document| {
            let (final_text, report) = run(document, rules);
            DocumentOutcome {
                label: document.label.clone(),
                final_text,
                report,
            }
        })
        .collect()
}

/// Did the candidate text get structurally worse than the pre-rule text?
fn worsens(before: &BalanceReport, after: &BalanceReport) -> bool {
    if after.final_depth.abs() > before.final_depth.abs() {
        return true;
    }
    if before.final_depth == 0 && after.final_depth != 0 {
        return true;
    }
    if after.first_negative_offset.is_some() && before.first_negative_offset.is_none() {
        return true;
    }
    after.mismatched.len() > before.mismatched.len()
}

fn build_edits(
    text: &str,
    events: &[StructuralEvent],
    matches: &[Match],
    action: &Action,
) -> Vec<SpanEdit> {
    let mut edits = Vec::with_capacity(matches.len());
    for m in matches {
        match action {
            Action::Replace { template } => {
                edits.push(SpanEdit::new(
                    m.byte_start,
                    m.byte_end,
                    expand_template(template, &m.captures),
                    &m.text,
                ));
            }
            Action::Delete => {
                edits.push(SpanEdit::delete(m.byte_start, m.byte_end, &m.text));
            }
            Action::Unwrap => {
                let Some(open_idx) = resolve_open_event(events, m) else {
                    continue;
                };
                let Some(close_idx) = scan::find_matching_close(events, open_idx) else {
                    continue;
                };
                let open = &events[open_idx];
                let close = &events[close_idx];
                edits.push(SpanEdit::delete(
                    open.span.start,
                    open.span.end,
                    &text[open.span.clone()],
                ));
                edits.push(SpanEdit::delete(
                    close.span.start,
                    close.span.end,
                    &text[close.span.clone()],
                ));
            }
        }
    }
    edits
}

/// Locate the open event an unwrap match designates: either recorded by a
/// shape matcher, or the event starting exactly at the match offset for
/// textual matchers.
fn resolve_open_event(events: &[StructuralEvent], m: &Match) -> Option<usize> {
    if let Some(idx) = m.open_event {
        return Some(idx);
    }
    events
        .iter()
        .position(|e| e.is_open() && e.span.start == m.byte_start)
}

/// Substitute `$name` references in a template with captured values.
///
/// Single left-to-right pass over the template only: captured values are
/// spliced in verbatim and never rescanned, so document content containing
/// `$name` sequences cannot inject other captures. At each `$` the longest
/// capture name wins, so `$scale` never clobbers `$scales`; a `$` followed
/// by no known name stays literal.
fn expand_template(template: &str, captures: &HashMap<String, String>) -> String {
    let mut names: Vec<&String> = captures.keys().collect();
    names.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));

    let mut result = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(pos) = rest.find('$') {
        result.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];
        match names.iter().find(|name| after.starts_with(name.as_str())) {
            Some(name) => {
                result.push_str(&captures[name.as_str()]);
                rest = &after[name.len()..];
            }
            None => {
                result.push('$');
                rest = after;
            }
        }
    }
    result.push_str(rest);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::{ShapePattern, ShapeStep, TextPattern};

    fn replace_rule(id: &str, pattern: &str, template: &str) -> Rule {
        Rule::new(
            id,
            Matcher::Text(TextPattern::wildcard(pattern, id).unwrap()),
            Action::Replace {
                template: template.to_string(),
            },
        )
    }

    #[test]
    fn expand_template_substitutes_captures() {
        let mut captures = HashMap::new();
        captures.insert("scale".to_string(), "red".to_string());
        assert_eq!(
            expand_template("bg-$scale-500", &captures),
            "bg-red-500"
        );
    }

    #[test]
    fn expand_template_prefers_longer_names() {
        let mut captures = HashMap::new();
        captures.insert("s".to_string(), "X".to_string());
        captures.insert("sc".to_string(), "Y".to_string());
        assert_eq!(expand_template("$sc$s", &captures), "YX");
    }

    #[test]
    fn expand_template_inserts_captured_values_verbatim() {
        // A captured value that itself looks like a capture reference must
        // come through literally, not expand to the other capture.
        let mut captures = HashMap::new();
        captures.insert("a".to_string(), "$b".to_string());
        captures.insert("b".to_string(), "SECRET".to_string());
        assert_eq!(expand_template(r#"a="$a""#, &captures), r#"a="$b""#);
    }

    #[test]
    fn expand_template_keeps_unknown_references_literal() {
        let mut captures = HashMap::new();
        captures.insert("scale".to_string(), "red".to_string());
        assert_eq!(
            expand_template("$scale $other $", &captures),
            "red $other $"
        );
    }

    #[test]
    fn document_text_cannot_inject_captures_through_replacement() {
        let doc = Document::new("page", r#"<i a="$b" b="SECRET">x</i>"#);
        let rules = vec![replace_rule(
            "rewrite",
            r#"a="(?P<a>[^"]*)" b="(?P<b>[^"]*)""#,
            r#"a="$a""#,
        )];
        let (text, report) = run(&doc, &rules);
        assert_eq!(text, r#"<i a="$b">x</i>"#);
        assert!(report.outcomes[0].applied);
    }

    #[test]
    fn no_match_is_recorded_not_errored() {
        let doc = Document::new("page", "<div>x</div>");
        let rules = vec![replace_rule("r", "nonexistent", "y")];
        let (text, report) = run(&doc, &rules);
        assert_eq!(text, "<div>x</div>");
        assert_eq!(report.outcomes.len(), 1);
        assert!(!report.outcomes[0].applied);
        assert_eq!(report.outcomes[0].match_count, 0);
        assert!(report.outcomes[0].first_failure_offset.is_none());
        assert!(report.is_balanced());
    }

    #[test]
    fn unbalancing_rule_is_rejected_and_rolled_back() {
        let doc = Document::new("page", "<div><span>x</span></div>");
        // Deleting just the close tag would leave depth 1
        let rules = vec![Rule::new(
            "bad",
            Matcher::Text(TextPattern::fixed("</span>")),
            Action::Delete,
        )];
        let (text, report) = run(&doc, &rules);
        assert_eq!(text, doc.text);
        let outcome = &report.outcomes[0];
        assert!(!outcome.applied);
        assert_eq!(outcome.match_count, 1);
        assert_eq!(outcome.balance_before, 0);
        assert_eq!(outcome.balance_after, 1);
        assert!(outcome.first_failure_offset.is_some());
        assert!(report.is_balanced());
    }

    #[test]
    fn rejected_rule_does_not_abort_later_rules() {
        let doc = Document::new("page", "<div>old</div>");
        let rules = vec![
            Rule::new(
                "bad",
                Matcher::Text(TextPattern::fixed("</div>")),
                Action::Delete,
            ),
            replace_rule("good", "old", "new"),
        ];
        let (text, report) = run(&doc, &rules);
        assert_eq!(text, "<div>new</div>");
        assert!(!report.outcomes[0].applied);
        assert!(report.outcomes[1].applied);
    }

    #[test]
    fn delete_of_balanced_pair_is_accepted() {
        let doc = Document::new("page", "<div><span>x</span></div>");
        let rules = vec![Rule::new(
            "drop",
            Matcher::Text(TextPattern::fixed("<span>x</span>")),
            Action::Delete,
        )];
        let (text, report) = run(&doc, &rules);
        assert_eq!(text, "<div></div>");
        assert!(report.outcomes[0].applied);
    }

    #[test]
    fn unwrap_without_pairing_close_is_recorded_as_failure() {
        let doc = Document::new("page", "<div class=\"relative\"><span>x</span>");
        let rules = vec![Rule::new(
            "unwrap",
            Matcher::Shape(
                ShapePattern::new(
                    vec![ShapeStep::open().attr_contains("class", "relative")],
                    "unwrap",
                )
                .unwrap(),
            ),
            Action::Unwrap,
        )];
        let (text, report) = run(&doc, &rules);
        assert_eq!(text, doc.text);
        let outcome = &report.outcomes[0];
        assert!(!outcome.applied);
        assert_eq!(outcome.match_count, 1);
        assert_eq!(outcome.first_failure_offset, Some(0));
    }

    #[test]
    fn process_handles_documents_independently() {
        let documents = vec![
            Document::new("a", "<div>old</div>"),
            Document::new("b", "<section>old</section>"),
        ];
        let rules = vec![replace_rule("r", "old", "new")];
        let results = process(&documents, &rules);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].final_text, "<div>new</div>");
        assert_eq!(results[1].final_text, "<section>new</section>");
        assert!(results.iter().all(|r| r.report.is_balanced()));
    }

    #[test]
    fn terminal_balance_reported_for_untouched_unbalanced_document() {
        let doc = Document::new("broken", "<div><div>x</div>");
        let (_, report) = run(&doc, &[]);
        assert_eq!(report.terminal.final_depth, 1);
        assert!(!report.is_balanced());
    }
}
