//! Compilation from rule-file definitions to pipeline rules.
//!
//! This is where patterns are actually built, so it is the surface where a
//! malformed regex or an invalid matcher/action combination is caught -
//! always before any document is touched.

use crate::config::schema::{
    ActionConfig, MatcherConfig, RuleDefinition, RuleSet, StepConfig, StepKindConfig,
};
use crate::pattern::{Matcher, RuleError, ShapePattern, ShapeStep, TextPattern};
use crate::pipeline::{Action, Rule};

/// Compile every rule in the set, in order.
pub fn compile(config: &RuleSet) -> Result<Vec<Rule>, RuleError> {
    config.rules.iter().map(compile_rule).collect()
}

fn compile_rule(def: &RuleDefinition) -> Result<Rule, RuleError> {
    let matcher = match &def.matcher {
        MatcherConfig::Text { search } => {
            if search.is_empty() {
                return Err(RuleError::EmptyPattern {
                    rule_id: def.id.clone(),
                });
            }
            Matcher::Text(TextPattern::fixed(search.clone()))
        }
        MatcherConfig::Pattern { pattern } => {
            Matcher::Text(TextPattern::wildcard(pattern, &def.id)?)
        }
        MatcherConfig::Shape { steps } => {
            let steps = steps.iter().map(compile_step).collect();
            Matcher::Shape(ShapePattern::new(steps, &def.id)?)
        }
    };

    let action = match &def.action {
        ActionConfig::Replace { text } => Action::Replace {
            template: text.clone(),
        },
        ActionConfig::Delete => Action::Delete,
        ActionConfig::Unwrap => {
            let starts_with_open =
                matches!(&matcher, Matcher::Shape(shape) if shape.starts_with_open());
            if !starts_with_open {
                return Err(RuleError::UnwrapNeedsOpen {
                    rule_id: def.id.clone(),
                });
            }
            Action::Unwrap
        }
    };

    Ok(Rule::new(def.id.clone(), matcher, action))
}

fn compile_step(cfg: &StepConfig) -> ShapeStep {
    let mut step = match cfg.kind {
        StepKindConfig::Open => ShapeStep::open(),
        StepKindConfig::Close => ShapeStep::close(),
        StepKindConfig::SelfClose => ShapeStep::self_close(),
    };
    if let Some(tag) = &cfg.tag {
        step = step.tag(tag.clone());
    }
    if !cfg.tag_in.is_empty() {
        step = step.tag_in(cfg.tag_in.iter().cloned());
    }
    if let Some(attr) = &cfg.attr {
        if let Some(substring) = &cfg.contains {
            step = step.attr_contains(attr.clone(), substring.clone());
        }
        if let Some(name) = &cfg.capture {
            step = step.capture_attr(attr.clone(), name.clone());
        }
    }
    step
}
