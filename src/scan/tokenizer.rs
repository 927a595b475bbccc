//! Scanner from raw text to structural events.
//!
//! Total and deterministic: anything that does not scan as a well-formed
//! start/end/self-closing tag (comments, template expressions, stray `<`)
//! falls through to a `Text` event, so downstream stages degrade gracefully
//! instead of erroring.

use crate::scan::events::{Attribute, EventKind, StructuralEvent};
use memchr::memchr;

/// Scan `text` into a sequence of structural events.
///
/// Event spans are half-open byte ranges into `text`; concatenating the
/// slices of all spans in order reproduces the input exactly.
pub fn tokenize(text: &str) -> Vec<StructuralEvent> {
    let bytes = text.as_bytes();
    let mut events = Vec::new();
    let mut text_start = 0;
    let mut pos = 0;

    while pos < bytes.len() {
        let Some(rel) = memchr(b'<', &bytes[pos..]) else {
            break;
        };
        let lt = pos + rel;

        match scan_tag(text, lt) {
            Some((kind, end)) => {
                if lt > text_start {
                    events.push(StructuralEvent::new(EventKind::Text, text_start..lt));
                }
                events.push(StructuralEvent::new(kind, lt..end));
                pos = end;
                text_start = end;
            }
            // Not a tag: leave the '<' inside the running text event.
            None => pos = lt + 1,
        }
    }

    if text_start < bytes.len() {
        events.push(StructuralEvent::new(EventKind::Text, text_start..bytes.len()));
    }

    events
}

#[inline]
fn is_name_start(b: u8) -> bool {
    b.is_ascii_alphabetic()
}

#[inline]
fn is_name_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b == b'.' || b == b':'
}

fn skip_whitespace(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    i
}

fn read_name(bytes: &[u8], start: usize) -> usize {
    let mut i = start;
    if i < bytes.len() && is_name_start(bytes[i]) {
        i += 1;
        while i < bytes.len() && is_name_char(bytes[i]) {
            i += 1;
        }
    }
    i
}

/// Attempt to scan a tag starting at the `<` at byte offset `lt`.
///
/// Returns the event kind and the end offset one past the closing `>`, or
/// `None` if the bytes at `lt` do not form a tag.
fn scan_tag(text: &str, lt: usize) -> Option<(EventKind, usize)> {
    let bytes = text.as_bytes();
    if lt + 1 >= bytes.len() {
        return None;
    }

    if bytes[lt + 1] == b'/' {
        return scan_end_tag(text, lt);
    }

    if !is_name_start(bytes[lt + 1]) {
        return None;
    }

    let name_end = read_name(bytes, lt + 1);
    let tag = text[lt + 1..name_end].to_string();

    let mut attrs: Vec<Attribute> = Vec::new();
    let mut i = name_end;

    loop {
        i = skip_whitespace(bytes, i);
        if i >= bytes.len() {
            // Unterminated tag degrades to text.
            return None;
        }

        match bytes[i] {
            b'>' => {
                return Some((EventKind::Open { tag, attrs }, i + 1));
            }
            b'/' if i + 1 < bytes.len() && bytes[i + 1] == b'>' => {
                return Some((EventKind::SelfClose { tag, attrs }, i + 2));
            }
            _ => {
                let attr_end = read_name(bytes, i);
                if attr_end == i {
                    // Not an attribute name (JSX spread, template syntax).
                    // Skip one byte and keep scanning for the closing '>'.
                    i += 1;
                    continue;
                }
                let name = text[i..attr_end].to_string();
                i = skip_whitespace(bytes, attr_end);

                let value = if i < bytes.len() && bytes[i] == b'=' {
                    i = skip_whitespace(bytes, i + 1);
                    if i < bytes.len() && (bytes[i] == b'"' || bytes[i] == b'\'') {
                        let quote = bytes[i];
                        let value_start = i + 1;
                        // The closing '>' search must not be fooled by '>'
                        // inside a quoted value, so consume to the end quote.
                        let rel = memchr(quote, &bytes[value_start..])?;
                        i = value_start + rel + 1;
                        text[value_start..value_start + rel].to_string()
                    } else {
                        let value_start = i;
                        while i < bytes.len()
                            && !bytes[i].is_ascii_whitespace()
                            && bytes[i] != b'>'
                        {
                            i += 1;
                        }
                        text[value_start..i].to_string()
                    }
                } else {
                    // Bare attribute without a value
                    String::new()
                };

                // Keys are unique, first occurrence wins.
                if !attrs.iter().any(|a| a.name == name) {
                    attrs.push(Attribute { name, value });
                }
            }
        }
    }
}

fn scan_end_tag(text: &str, lt: usize) -> Option<(EventKind, usize)> {
    let bytes = text.as_bytes();
    let name_end = read_name(bytes, lt + 2);
    if name_end == lt + 2 {
        return None;
    }
    let tag = text[lt + 2..name_end].to_string();
    let gt = skip_whitespace(bytes, name_end);
    if gt < bytes.len() && bytes[gt] == b'>' {
        Some((EventKind::Close { tag }, gt + 1))
    } else {
        None
    }
}
