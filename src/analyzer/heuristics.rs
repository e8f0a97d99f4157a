//! Heuristics that read a unified diff around a resource declaration.
//!
//! All functions work on a window of the diff centred on the position where
//! the resource was found. Positions are byte offsets into the diff; window
//! radii count characters on each side of that position.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

use super::types::Operation;

/// Radius of the window used to infer the operation.
pub const OPERATION_RADIUS: usize = 500;

/// Radius of the window used to collect changed attributes.
pub const ATTRIBUTE_RADIUS: usize = 1000;

/// Radius of the window used for the diff excerpt.
pub const SNIPPET_RADIUS: usize = 150;

/// Maximum number of lines kept in a diff excerpt.
pub const SNIPPET_MAX_LINES: usize = 10;

/// `key = value` on a changed line.
static ASSIGNMENT_ATTR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)[+-]\s*([a-z_][a-z0-9_]*)\s*=").expect("valid assignment regex")
});

/// `key: value` on a changed line.
static MAPPING_ATTR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)[+-]\s*([a-z_][a-z0-9_-]*)\s*:").expect("valid mapping regex")
});

/// Tokens from diff headers that look like attributes but are not.
const NOISE_WORDS: &[&str] = &["diff", "index", "file"];

/// Reads change details out of the diff text around a resource.
pub trait ChangeHeuristics: Send + Sync {
    /// Infers whether the resource is created, modified or deleted.
    fn operation(&self, diff: &str, position: usize) -> Operation;

    /// Collects attribute names appearing on changed lines near the resource.
    fn attributes(&self, diff: &str, position: usize) -> Vec<String>;

    /// Returns a short excerpt of the diff around the resource.
    fn snippet(&self, diff: &str, position: usize) -> String;
}

/// Window-based heuristics over added/removed line markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowHeuristics {
    operation_radius: usize,
    attribute_radius: usize,
    snippet_radius: usize,
    snippet_max_lines: usize,
}

impl Default for WindowHeuristics {
    fn default() -> Self {
        Self::new()
    }
}

impl WindowHeuristics {
    /// Creates heuristics with the standard window sizes.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            operation_radius: OPERATION_RADIUS,
            attribute_radius: ATTRIBUTE_RADIUS,
            snippet_radius: SNIPPET_RADIUS,
            snippet_max_lines: SNIPPET_MAX_LINES,
        }
    }

    /// Sets the attribute window radius.
    #[must_use]
    pub const fn with_attribute_radius(mut self, radius: usize) -> Self {
        self.attribute_radius = radius;
        self
    }
}

impl ChangeHeuristics for WindowHeuristics {
    fn operation(&self, diff: &str, position: usize) -> Operation {
        let context = window(diff, position, self.operation_radius);
        let additions = context.matches("\n+").count();
        let deletions = context.matches("\n-").count();

        if additions > deletions * 2 {
            Operation::Create
        } else if deletions > additions * 2 {
            Operation::Delete
        } else {
            Operation::Modify
        }
    }

    fn attributes(&self, diff: &str, position: usize) -> Vec<String> {
        let context = window(diff, position, self.attribute_radius);

        let names: BTreeSet<String> = [&*ASSIGNMENT_ATTR, &*MAPPING_ATTR]
            .into_iter()
            .flat_map(|re| re.captures_iter(context))
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str())
            .filter(|name| !NOISE_WORDS.contains(name))
            .map(String::from)
            .collect();

        names.into_iter().collect()
    }

    fn snippet(&self, diff: &str, position: usize) -> String {
        window(diff, position, self.snippet_radius)
            .lines()
            .take(self.snippet_max_lines)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Returns up to `radius` characters on each side of the byte offset
/// `position`. Offsets inside a character or past the end are moved back to
/// the nearest character boundary.
#[must_use]
pub fn window(text: &str, position: usize, radius: usize) -> &str {
    let mut anchor = position.min(text.len());
    while !text.is_char_boundary(anchor) {
        anchor -= 1;
    }

    let start = text[..anchor]
        .char_indices()
        .rev()
        .take(radius)
        .last()
        .map_or(anchor, |(idx, _)| idx);
    let end = text[anchor..]
        .char_indices()
        .nth(radius)
        .map_or(text.len(), |(idx, _)| anchor + idx);

    &text[start..end]
}

/// Returns at most `max_chars` characters from the start of `text`.
#[must_use]
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    text.char_indices()
        .nth(max_chars)
        .map_or(text, |(idx, _)| &text[..idx])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_create() {
        let diff = "@@ -0,0 +1,3 @@\n+resource \"aws_s3_bucket\" \"logs\" {\n+  bucket = \"logs\"\n+}\n";
        assert_eq!(WindowHeuristics::new().operation(diff, 20), Operation::Create);
    }

    #[test]
    fn test_operation_delete() {
        let diff = "@@ -1,3 +0,0 @@\n-resource \"aws_s3_bucket\" \"logs\" {\n-  bucket = \"logs\"\n-}\n";
        assert_eq!(WindowHeuristics::new().operation(diff, 20), Operation::Delete);
    }

    #[test]
    fn test_operation_modify_when_balanced() {
        let diff = " resource \"aws_instance\" \"web\" {\n-  instance_type = \"t3.micro\"\n+  instance_type = \"t3.large\"\n }\n";
        assert_eq!(WindowHeuristics::new().operation(diff, 0), Operation::Modify);
        assert_eq!(WindowHeuristics::new().operation("", 0), Operation::Modify);
    }

    #[test]
    fn test_attributes_sorted_and_filtered() {
        let diff = "diff --git a/main.tf b/main.tf\n\
                    index 1234..5678 100644\n\
                    +  tags = {}\n\
                    -  instance_type = \"t3.micro\"\n\
                    +  instance_type = \"t3.large\"\n\
                    +  replicas: 3\n\
                    +  file: x\n";
        let attrs = WindowHeuristics::new().attributes(diff, 0);
        assert_eq!(attrs, vec!["instance_type", "replicas", "tags"]);
    }

    #[test]
    fn test_attributes_ignore_context_lines() {
        let diff = "   bucket = \"logs\"\n+  versioning = true\n";
        let attrs = WindowHeuristics::new().attributes(diff, 0);
        assert_eq!(attrs, vec!["versioning"]);
    }

    #[test]
    fn test_attribute_radius_limits_window() {
        let padding = " ".repeat(200);
        let diff = format!("+  near = 1\n{padding}+  far = 2\n");
        let attrs = WindowHeuristics::new()
            .with_attribute_radius(50)
            .attributes(&diff, 0);
        assert_eq!(attrs, vec!["near"]);
    }

    #[test]
    fn test_snippet_limits_lines() {
        let diff: String = (0..30).map(|i| format!("+l{i}\n")).collect();
        let snippet = WindowHeuristics::new().snippet(&diff, 0);
        assert_eq!(snippet.lines().count(), 10);
        assert!(snippet.starts_with("+l0"));
    }

    #[test]
    fn test_window_respects_char_boundaries() {
        let text = "ééééé";
        assert_eq!(window(text, 3, 2), "ééé");
        assert_eq!(window(text, 0, 100), text);
        assert_eq!(window("abcdef", 100, 2), "ef");
        assert_eq!(window("abcdef", 3, 0), "");
    }

    #[test]
    fn test_window_radius_counts_chars() {
        // each 'é' is two bytes
        let text = "abcd|éééé";
        let pivot = text.find('|').unwrap();
        assert_eq!(window(text, pivot, 4), "abcd|ééé");

        let ascii = "abcd|efgh";
        assert_eq!(window(ascii, 4, 4), "abcd|efg");
    }

    #[test]
    fn test_attribute_radius_counts_multibyte_chars() {
        let padding = "é".repeat(40);
        let diff = format!("+  near = 1\n{padding}+  far = 2\n");
        // 40 chars of padding, 80 bytes
        let attrs = WindowHeuristics::new()
            .with_attribute_radius(60)
            .attributes(&diff, 0);
        assert_eq!(attrs, vec!["far", "near"]);
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("abc", 0), "");
    }
}
