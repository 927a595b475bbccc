use thiserror::Error;

/// Construction-time rule errors. These surface before any document is
/// touched; a rule list containing one of these never reaches the pipeline.
#[derive(Error, Debug)]
pub enum RuleError {
    #[error("invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("empty pattern in rule '{rule_id}'")]
    EmptyPattern { rule_id: String },

    #[error("shape matcher in rule '{rule_id}' has no steps")]
    EmptyShape { rule_id: String },

    #[error("unwrap action in rule '{rule_id}' requires a matcher whose first match is an open tag")]
    UnwrapNeedsOpen { rule_id: String },
}
