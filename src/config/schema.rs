use serde::Deserialize;
use std::fmt;

/// A rule file: optional metadata plus an ordered list of rewrite rules.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct RuleSet {
    #[serde(default)]
    pub meta: Metadata,
    #[serde(default)]
    pub rules: Vec<RuleDefinition>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Metadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RuleDefinition {
    pub id: String,
    pub matcher: MatcherConfig,
    pub action: ActionConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum MatcherConfig {
    /// Exact substring search over raw text
    Text { search: String },
    /// Regular expression with named capture groups
    Pattern { pattern: String },
    /// Event-shape description over consecutive tags
    Shape { steps: Vec<StepConfig> },
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum StepKindConfig {
    #[default]
    Open,
    Close,
    SelfClose,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct StepConfig {
    #[serde(default)]
    pub kind: StepKindConfig,
    /// Single accepted tag name
    #[serde(default)]
    pub tag: Option<String>,
    /// Accepted tag name set (alternative to `tag`)
    #[serde(default)]
    pub tag_in: Vec<String>,
    /// Attribute to constrain; used with `contains` and/or `capture`
    #[serde(default)]
    pub attr: Option<String>,
    /// Required substring of the attribute value
    #[serde(default)]
    pub contains: Option<String>,
    /// Capture name under which the attribute value is exposed
    #[serde(default)]
    pub capture: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ActionConfig {
    Replace { text: String },
    Delete,
    Unwrap,
}

impl RuleSet {
    /// Collect every configuration issue before any compilation happens.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        if self.rules.is_empty() {
            issues.push(ValidationIssue::EmptyRuleList);
        }

        for rule in &self.rules {
            if rule.id.trim().is_empty() {
                issues.push(ValidationIssue::MissingField {
                    rule_id: None,
                    field: "id",
                });
            }

            match &rule.matcher {
                MatcherConfig::Text { search } => {
                    if search.is_empty() {
                        issues.push(ValidationIssue::MissingField {
                            rule_id: Some(rule.id.clone()),
                            field: "matcher.search",
                        });
                    }
                }
                MatcherConfig::Pattern { pattern } => {
                    if pattern.is_empty() {
                        issues.push(ValidationIssue::MissingField {
                            rule_id: Some(rule.id.clone()),
                            field: "matcher.pattern",
                        });
                    }
                }
                MatcherConfig::Shape { steps } => {
                    if steps.is_empty() {
                        issues.push(ValidationIssue::MissingField {
                            rule_id: Some(rule.id.clone()),
                            field: "matcher.steps",
                        });
                    }
                    for step in steps {
                        if step.tag.is_some() && !step.tag_in.is_empty() {
                            issues.push(ValidationIssue::InvalidCombo {
                                rule_id: Some(rule.id.clone()),
                                message: "step cannot set both tag and tag-in".to_string(),
                            });
                        }
                        if step.contains.is_some() && step.attr.is_none() {
                            issues.push(ValidationIssue::InvalidCombo {
                                rule_id: Some(rule.id.clone()),
                                message: "step with contains requires attr".to_string(),
                            });
                        }
                        if step.capture.is_some() && step.attr.is_none() {
                            issues.push(ValidationIssue::InvalidCombo {
                                rule_id: Some(rule.id.clone()),
                                message: "step with capture requires attr".to_string(),
                            });
                        }
                    }
                }
            }

            match &rule.action {
                ActionConfig::Replace { text } => {
                    if text.is_empty() {
                        issues.push(ValidationIssue::InvalidCombo {
                            rule_id: Some(rule.id.clone()),
                            message: "replace with empty text; use a delete action".to_string(),
                        });
                    }
                }
                ActionConfig::Delete => {}
                ActionConfig::Unwrap => {
                    let first_is_open = matches!(
                        &rule.matcher,
                        MatcherConfig::Shape { steps }
                            if steps.first().is_some_and(|s| s.kind == StepKindConfig::Open)
                    );
                    if !first_is_open {
                        issues.push(ValidationIssue::InvalidCombo {
                            rule_id: Some(rule.id.clone()),
                            message:
                                "unwrap requires a shape matcher whose first step is an open tag"
                                    .to_string(),
                        });
                    }
                }
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone)]
pub enum ValidationIssue {
    EmptyRuleList,
    MissingField {
        rule_id: Option<String>,
        field: &'static str,
    },
    InvalidCombo {
        rule_id: Option<String>,
        message: String,
    },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::EmptyRuleList => write!(f, "rule file contains no rules"),
            ValidationIssue::MissingField { rule_id, field } => match rule_id {
                Some(id) => write!(f, "rule '{id}' missing required field '{field}'"),
                None => write!(f, "rule missing required field '{field}'"),
            },
            ValidationIssue::InvalidCombo { rule_id, message } => match rule_id {
                Some(id) => write!(f, "rule '{id}' has invalid configuration: {message}"),
                None => write!(f, "invalid rule configuration: {message}"),
            },
        }
    }
}
