//! Prompt construction for the AI fallback.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::HashMap;

use crate::analyzer::{ResourceChange, truncate_chars};
use crate::config::AiConfig;

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{|\}\}|\{([a-z_]+)\}").expect("valid placeholder regex"));

/// Renders `{name}` placeholders from `values`.
///
/// `{{` and `}}` produce literal braces. Placeholders without a value are
/// kept verbatim.
#[must_use]
pub fn render_template(template: &str, values: &HashMap<&str, String>) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures<'_>| match caps.get(1) {
            Some(name) => values
                .get(name.as_str())
                .cloned()
                .unwrap_or_else(|| caps[0].to_string()),
            None if &caps[0] == "{{" => String::from("{"),
            None => String::from("}"),
        })
        .into_owned()
}

/// Builds the full prompt for one resource change.
///
/// The system prompt comes first, separated from the rendered user prompt by
/// a blank line; an empty system prompt is omitted.
#[must_use]
pub fn build_prompt(change: &ResourceChange, config: &AiConfig) -> String {
    let diff_snippet = truncate_chars(&change.diff, config.effective_max_diff_chars());

    let values = HashMap::from([
        ("resource_type", change.resource_type.clone()),
        ("resource_name", change.name.clone()),
        ("operation", change.operation.to_string()),
        ("attributes", change.attributes_changed.join(", ")),
        ("diff_snippet", diff_snippet.to_string()),
    ]);

    let user_prompt = render_template(&config.user_prompt_template, &values);
    let system_prompt = config.system_prompt.trim();

    if system_prompt.is_empty() {
        user_prompt
    } else {
        format!("{system_prompt}\n\n{user_prompt}")
    }
}
