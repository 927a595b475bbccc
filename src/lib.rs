//! Tagmend: structural markup transformation engine
//!
//! A rewrite engine for nested-container markup built on byte-span
//! replacement primitives, with tag-balance verification guarding every
//! transformation.
//!
//! # Architecture
//!
//! All rewrite actions compile down to a single primitive: [`SpanEdit`], a
//! verified byte-span replacement. Intelligence lives in span acquisition
//! (textual and structural matchers over the tokenizer's event stream), not
//! in the application logic.
//!
//! # Safety
//!
//! - All edits verify expected before-text before applying
//! - Balance is re-verified after every rule; a rule that would leave the
//!   document structurally worse is rolled back, and the pipeline continues
//! - The core performs no I/O: text in, text plus report out
//!
//! # Example
//!
//! ```
//! use tagmend::pattern::{Matcher, TextPattern};
//! use tagmend::pipeline::{run, Action, Document, Rule};
//!
//! let doc = Document::new("page", "<div class=\"old\">x</div>");
//! let rules = vec![Rule::new(
//!     "restyle",
//!     Matcher::Text(TextPattern::fixed("class=\"old\"")),
//!     Action::Replace { template: "class=\"new\"".to_string() },
//! )];
//!
//! let (text, report) = run(&doc, &rules);
//! assert_eq!(text, "<div class=\"new\">x</div>");
//! assert!(report.is_balanced());
//! ```

pub mod config;
pub mod edit;
pub mod pattern;
pub mod pipeline;
pub mod scan;

// Re-exports
pub use config::{compile, load_from_path, load_from_str, ConfigError, RuleSet};
pub use edit::{EditError, EditVerification, SpanEdit};
pub use pattern::{Match, Matcher, RuleError, ShapePattern, ShapeStep, TextPattern};
pub use pipeline::{
    process, run, Action, Document, DocumentOutcome, Rule, RuleOutcome, TransformReport,
};
pub use scan::{tokenize, verify, BalanceMode, BalanceReport, StructuralEvent};
