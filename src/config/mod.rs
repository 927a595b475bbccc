pub mod compile;
pub mod loader;
pub mod schema;

pub use compile::compile;
pub use loader::{load_from_path, load_from_str, ConfigError};
pub use schema::{
    ActionConfig, MatcherConfig, Metadata, RuleDefinition, RuleSet, StepConfig, StepKindConfig,
    ValidationError, ValidationIssue,
};
