//! `{{path}}` interpolation and dotted-path lookup over form-value snapshots.

use formwright_domain::{FieldValue, FormValues};
use serde_json::Value;

/// Looks up a dotted path in a form-value snapshot. Missing keys, empty
/// segments, and non-object intermediates all yield `None`.
#[must_use]
pub fn value_at_path<'a>(values: &'a FormValues, path: &str) -> Option<&'a FieldValue> {
    let path = path.trim();
    let (first, rest) = match path.split_once('.') {
        Some((first, rest)) => (first, Some(rest)),
        None => (path, None),
    };

    if first.is_empty() {
        return None;
    }

    let root = values.get(first)?;
    match rest {
        Some(rest) => root.at_path(rest),
        None => Some(root),
    }
}

/// Looks up a dotted path in a plain JSON value (response bodies).
#[must_use]
pub fn json_at_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = value;
    for segment in path.split('.') {
        if segment.is_empty() {
            return None;
        }

        current = current.as_object()?.get(segment)?;
    }

    Some(current)
}

/// Replaces every `{{ path }}` occurrence with the stringified value at that
/// path. Missing or null paths substitute an empty string.
#[must_use]
pub fn interpolate(template: &str, values: &FormValues) -> String {
    let mut result = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        let (head, after_head) = rest.split_at(start);
        result.push_str(head);

        let Some(end_relative) = after_head.find("}}") else {
            result.push_str(after_head);
            return result;
        };

        let token = after_head[2..end_relative].trim();
        if let Some(value) = value_at_path(values, token) {
            result.push_str(value.to_display_string().as_str());
        }

        rest = &after_head[end_relative + 2..];
    }

    result.push_str(rest);
    result
}

/// Resolves a body-mapping expression to a typed value.
///
/// An expression that is exactly one anchored `{{ path }}` token returns the
/// raw typed value at that path, so files and numbers survive body mapping.
/// An expression containing `{{` elsewhere falls back to string
/// interpolation. A bare expression that resolves as a path returns that
/// value; anything else is the literal expression string.
#[must_use]
pub fn resolve_expression(expr: &str, values: &FormValues) -> FieldValue {
    if let Some(token) = single_token_name(expr) {
        return value_at_path(values, token)
            .cloned()
            .unwrap_or(FieldValue::Null);
    }

    if expr.contains("{{") {
        return FieldValue::Text(interpolate(expr, values));
    }

    if let Some(value) = value_at_path(values, expr) {
        return value.clone();
    }

    FieldValue::Text(expr.to_owned())
}

fn single_token_name(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    let inner = trimmed.strip_prefix("{{")?.strip_suffix("}}")?;
    let token = inner.trim();
    if token.is_empty() || token.contains("{{") || token.contains("}}") {
        return None;
    }

    Some(token)
}
