//! Rule matching.
//!
//! Rules are compiled once per run. A rule matches when every criterion it
//! carries matches; rules are tried in category order, then list order, and
//! the first hit wins.

use regex::{Regex, RegexBuilder};
use tracing::{debug, trace};

use super::types::Category;
use crate::analyzer::ResourceChange;
use crate::config::{Rule, RuleSet};
use crate::error::{ConfigError, Result};

/// A rule with its regex criteria compiled.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    category: Category,
    description: String,
    pattern: Option<Criterion>,
    resource: Option<Criterion>,
    attribute: Option<Criterion>,
    operations: Option<Vec<String>>,
}

/// A compiled regex together with its source text.
#[derive(Debug, Clone)]
struct Criterion {
    source: String,
    regex: Regex,
}

impl Criterion {
    fn compile(source: &str, field: String) -> Result<Self> {
        let regex = RegexBuilder::new(source)
            .case_insensitive(true)
            .build()
            .map_err(|e| ConfigError::InvalidRegex {
                field,
                message: e.to_string(),
            })?;
        Ok(Self {
            source: source.to_string(),
            regex,
        })
    }

    fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

impl CompiledRule {
    /// Compiles a configured rule.
    ///
    /// `field` is the configuration path of the rule, used in error messages.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidRegex` if a criterion does not compile.
    pub fn compile(category: Category, rule: &Rule, field: &str) -> Result<Self> {
        let criterion = |value: &Option<String>, name: &str| {
            value
                .as_deref()
                .map(|source| Criterion::compile(source, format!("{field}.{name}")))
                .transpose()
        };

        Ok(Self {
            category,
            description: rule.description.clone(),
            pattern: criterion(&rule.pattern, "pattern")?,
            resource: criterion(&rule.resource, "resource")?,
            attribute: criterion(&rule.attribute, "attribute")?,
            operations: rule.operation.as_deref().map(parse_operations),
        })
    }

    /// Returns the category this rule assigns.
    #[must_use]
    pub const fn category(&self) -> Category {
        self.category
    }

    /// Returns the reasoning text for a hit.
    #[must_use]
    pub fn reasoning(&self) -> &str {
        if self.description.is_empty() {
            "Rule matched"
        } else {
            &self.description
        }
    }

    /// Returns the audit label: category key, then the resource regex,
    /// `pattern:<p>` and `attr:<a>` when present, joined by `.`.
    #[must_use]
    pub fn audit_label(&self) -> String {
        let mut parts = vec![self.category.key().to_string()];
        if let Some(resource) = &self.resource {
            parts.push(resource.source.clone());
        }
        if let Some(pattern) = &self.pattern {
            parts.push(format!("pattern:{}", pattern.source));
        }
        if let Some(attribute) = &self.attribute {
            parts.push(format!("attr:{}", attribute.source));
        }
        parts.join(".")
    }

    /// Returns true if every present criterion matches the change.
    #[must_use]
    pub fn matches(&self, change: &ResourceChange) -> bool {
        let address = change.address();

        if let Some(pattern) = &self.pattern {
            let text = format!(
                "{address} {} {}",
                change.attributes_changed.join(" "),
                change.diff
            );
            if !pattern.is_match(&text) {
                return false;
            }
        }

        if let Some(resource) = &self.resource
            && !matches_resource(resource, &address, &change.attributes_changed)
        {
            return false;
        }

        if let Some(attribute) = &self.attribute {
            let hit = change
                .attributes_changed
                .iter()
                .any(|attr| attribute.is_match(attr))
                || attribute.is_match(&change.diff);
            if !hit {
                return false;
            }
        }

        if let Some(allowed) = &self.operations {
            let operation = change.operation.as_str();
            if !allowed.iter().any(|op| op == operation) {
                return false;
            }
        }

        true
    }
}

/// Matches `type.name`, retrying with `type.name.attr` for each changed
/// attribute when the pattern has at least two dots.
fn matches_resource(resource: &Criterion, address: &str, attributes: &[String]) -> bool {
    if resource.is_match(address) {
        return true;
    }
    if resource.source.matches('.').count() < 2 {
        return false;
    }
    attributes
        .iter()
        .any(|attr| resource.is_match(&format!("{address}.{attr}")))
}

/// `"delete|modify"` -> `["delete", "modify"]`; a single value is kept as is
/// apart from case.
fn parse_operations(raw: &str) -> Vec<String> {
    if raw.contains('|') {
        raw.split('|').map(|op| op.trim().to_lowercase()).collect()
    } else {
        vec![raw.to_lowercase()]
    }
}

/// Result of a successful rule lookup.
#[derive(Debug, Clone, Copy)]
pub struct RuleMatch<'a> {
    /// Category assigned by the rule.
    pub category: Category,
    /// The matching rule.
    pub rule: &'a CompiledRule,
}

/// Evaluates changes against the full, ordered rule set.
#[derive(Debug, Clone, Default)]
pub struct RuleMatcher {
    rules: Vec<CompiledRule>,
}

impl RuleMatcher {
    /// Compiles every rule of the set, preserving evaluation order.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidRegex` for the first criterion that does
    /// not compile.
    pub fn new(rules: &RuleSet) -> Result<Self> {
        let mut compiled = Vec::with_capacity(rules.len());
        for category in Category::RULE_ORDER {
            for (index, rule) in rules.rules_for(category).iter().enumerate() {
                let field = format!("rules.{}[{index}]", category.key());
                compiled.push(CompiledRule::compile(category, rule, &field)?);
            }
        }
        debug!("Compiled {} classification rules", compiled.len());
        Ok(Self { rules: compiled })
    }

    /// Returns the first matching rule, or `None` if no rule matches.
    #[must_use]
    pub fn classify(&self, change: &ResourceChange) -> Option<RuleMatch<'_>> {
        let hit = self.rules.iter().find(|rule| rule.matches(change))?;
        trace!("{} matched {}", change.address(), hit.audit_label());
        Some(RuleMatch {
            category: hit.category,
            rule: hit,
        })
    }

    /// Returns the number of compiled rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns true if there are no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
