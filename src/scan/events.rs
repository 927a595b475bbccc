use std::ops::Range;

/// A single attribute on a start tag, value captured raw with quotes stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

/// What a structural event is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// A container start tag: `<name attrs>`
    Open { tag: String, attrs: Vec<Attribute> },
    /// A container end tag: `</name>`
    Close { tag: String },
    /// A self-closing leaf: `<name attrs />`
    SelfClose { tag: String, attrs: Vec<Attribute> },
    /// Anything the scanner does not recognize as a tag
    Text,
}

/// One unit of tokenizer output: an event plus its half-open byte span into
/// the document text it was produced from. Events never outlive a single
/// tokenize-transform step and carry no cross-step identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuralEvent {
    pub kind: EventKind,
    pub span: Range<usize>,
}

impl StructuralEvent {
    pub fn new(kind: EventKind, span: Range<usize>) -> Self {
        Self { kind, span }
    }

    /// Tag name for open/close/self-close events.
    pub fn tag(&self) -> Option<&str> {
        match &self.kind {
            EventKind::Open { tag, .. }
            | EventKind::Close { tag }
            | EventKind::SelfClose { tag, .. } => Some(tag),
            EventKind::Text => None,
        }
    }

    /// Attribute list for open/self-close events.
    pub fn attrs(&self) -> &[Attribute] {
        match &self.kind {
            EventKind::Open { attrs, .. } | EventKind::SelfClose { attrs, .. } => attrs,
            _ => &[],
        }
    }

    /// Look up an attribute value by name.
    pub fn attr_value(&self, name: &str) -> Option<&str> {
        self.attrs()
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    pub fn is_open(&self) -> bool {
        matches!(self.kind, EventKind::Open { .. })
    }

    pub fn is_close(&self) -> bool {
        matches!(self.kind, EventKind::Close { .. })
    }

    pub fn is_self_close(&self) -> bool {
        matches!(self.kind, EventKind::SelfClose { .. })
    }

    pub fn is_text(&self) -> bool {
        matches!(self.kind, EventKind::Text)
    }

    /// True for a text event whose source slice is entirely whitespace.
    pub fn is_whitespace_text(&self, source: &str) -> bool {
        self.is_text() && source[self.span.clone()].trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open(tag: &str, attrs: Vec<Attribute>) -> StructuralEvent {
        StructuralEvent::new(
            EventKind::Open {
                tag: tag.to_string(),
                attrs,
            },
            0..1,
        )
    }

    #[test]
    fn attr_lookup() {
        let event = open(
            "div",
            vec![
                Attribute {
                    name: "class".to_string(),
                    value: "card".to_string(),
                },
                Attribute {
                    name: "id".to_string(),
                    value: "main".to_string(),
                },
            ],
        );
        assert_eq!(event.attr_value("class"), Some("card"));
        assert_eq!(event.attr_value("id"), Some("main"));
        assert_eq!(event.attr_value("style"), None);
    }

    #[test]
    fn text_event_has_no_tag() {
        let event = StructuralEvent::new(EventKind::Text, 3..7);
        assert_eq!(event.tag(), None);
        assert!(event.attrs().is_empty());
        assert!(event.is_whitespace_text("abc \n  xyz"));
        assert!(!event.is_whitespace_text("abcdefghij"));
    }
}
