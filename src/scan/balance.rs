//! Tag-balance verification over an event sequence.
//!
//! The scan is diagnostic: it never stops at the first problem. Every
//! mismatch, negative excursion, and unclosed open is collected in one pass
//! so a caller sees all problems at once.

use crate::scan::events::{EventKind, StructuralEvent};

/// How strictly balance is judged.
///
/// `Loose` reproduces count-only verification: a document is valid when
/// opens and closes cancel out, regardless of whether the names line up.
/// `Strict` additionally requires every close to match the tag it pops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BalanceMode {
    #[default]
    Loose,
    Strict,
}

/// A close tag whose name did not match the open it popped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MismatchedClose {
    /// Tag name of the open on top of the stack
    pub expected: String,
    /// Tag name of the close encountered
    pub found: String,
    /// Byte offset of the close tag
    pub offset: usize,
}

/// Result of walking the full event sequence.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BalanceReport {
    /// Net open count at end of input; 0 for a balanced document
    pub final_depth: i64,
    /// Offset of the first close that pushed depth below zero, if any
    pub first_negative_offset: Option<usize>,
    /// Opens still on the stack at end of input, with their offsets
    pub unclosed: Vec<(String, usize)>,
    /// Closes whose names did not match the popped open
    pub mismatched: Vec<MismatchedClose>,
}

impl BalanceReport {
    /// Whether the document is structurally valid under the given mode.
    ///
    /// Validity always requires final depth zero and no negative-depth
    /// excursion at any prefix; strict mode additionally requires that no
    /// mismatched close occurred.
    pub fn is_valid(&self, mode: BalanceMode) -> bool {
        let balanced = self.final_depth == 0 && self.first_negative_offset.is_none();
        match mode {
            BalanceMode::Loose => balanced,
            BalanceMode::Strict => balanced && self.mismatched.is_empty(),
        }
    }

    /// Offset of the first recorded structural problem, if any.
    pub fn first_problem_offset(&self) -> Option<usize> {
        let candidates = [
            self.first_negative_offset,
            self.mismatched.first().map(|m| m.offset),
            self.unclosed.first().map(|(_, offset)| *offset),
        ];
        candidates.into_iter().flatten().min()
    }
}

/// Walk the event sequence, tracking depth and the open-element stack.
pub fn verify(events: &[StructuralEvent]) -> BalanceReport {
    let mut report = BalanceReport::default();
    let mut stack: Vec<(String, usize)> = Vec::new();

    for event in events {
        match &event.kind {
            EventKind::Open { tag, .. } => {
                report.final_depth += 1;
                stack.push((tag.clone(), event.span.start));
            }
            EventKind::Close { tag } => {
                report.final_depth -= 1;
                if report.final_depth < 0 && report.first_negative_offset.is_none() {
                    report.first_negative_offset = Some(event.span.start);
                }
                if let Some((open_tag, _)) = stack.pop() {
                    if &open_tag != tag {
                        report.mismatched.push(MismatchedClose {
                            expected: open_tag,
                            found: tag.clone(),
                            offset: event.span.start,
                        });
                    }
                }
            }
            // Self-closing tags are net zero; text carries no structure.
            EventKind::SelfClose { .. } | EventKind::Text => {}
        }
    }

    report.unclosed = stack;
    report
}

/// Find the index of the close event that structurally pairs with the open
/// event at `open_idx`, by depth counting over the following events.
///
/// Returns `None` if no close brings the depth back to zero, or if the
/// pairing close has a different tag name (removing it would orphan some
/// other open).
pub fn find_matching_close(events: &[StructuralEvent], open_idx: usize) -> Option<usize> {
    let open_tag = match &events.get(open_idx)?.kind {
        EventKind::Open { tag, .. } => tag,
        _ => return None,
    };

    let mut depth: i64 = 1;
    for (offset, event) in events[open_idx + 1..].iter().enumerate() {
        match &event.kind {
            EventKind::Open { .. } => depth += 1,
            EventKind::Close { tag } => {
                depth -= 1;
                if depth == 0 {
                    if tag == open_tag {
                        return Some(open_idx + 1 + offset);
                    }
                    return None;
                }
            }
            _ => {}
        }
    }
    None
}
