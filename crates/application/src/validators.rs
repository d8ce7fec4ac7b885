use std::sync::LazyLock;

use formwright_domain::{AcceptPatterns, FieldSchema, FieldType, FieldValue, normalize_accept};
use regex::Regex;
use serde::Serialize;

// Mirrors the WHATWG-derived email shape browsers validate against.
const EMAIL_PATTERN: &str = "^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$";

static EMAIL_REGEX: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(EMAIL_PATTERN).ok());

/// Error detail attached to a control by one failed validation rule.
///
/// Never thrown; always surfaced as data for the renderer to display.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ValidationIssue {
    /// A required value is absent.
    Required,
    /// Text is shorter than the configured minimum.
    MinLength {
        /// Configured minimum length.
        min: u32,
        /// Actual length.
        actual: u32,
    },
    /// Text is longer than the configured maximum.
    MaxLength {
        /// Configured maximum length.
        max: u32,
        /// Actual length.
        actual: u32,
    },
    /// Numeric value is below the configured minimum.
    Min {
        /// Configured lower bound.
        min: f64,
        /// Actual value.
        actual: f64,
    },
    /// Numeric value is above the configured maximum.
    Max {
        /// Configured upper bound.
        max: f64,
        /// Actual value.
        actual: f64,
    },
    /// Value does not full-match the configured pattern.
    Pattern {
        /// Configured pattern source.
        pattern: String,
    },
    /// Value is not a plausible email address.
    Email,
    /// More files were picked than allowed.
    MaxFiles {
        /// Configured file-count ceiling.
        max: u32,
        /// Actual file count.
        actual: u32,
    },
    /// A picked file exceeds the size ceiling.
    #[serde(rename_all = "camelCase")]
    MaxSizeMb {
        /// Configured ceiling in megabytes.
        max: f64,
        /// Name of the first oversized file.
        file: String,
        /// That file's actual size in bytes.
        actual_bytes: u64,
    },
    /// A picked file matches none of the accept tokens.
    #[serde(rename_all = "camelCase")]
    Accept {
        /// The accept specification.
        accept: String,
        /// Name of the first rejected file.
        file: String,
        /// That file's reported MIME type.
        media_type: String,
    },
}

impl ValidationIssue {
    /// Returns the stable error-kind key the renderer switches on.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::MinLength { .. } => "minlength",
            Self::MaxLength { .. } => "maxlength",
            Self::Min { .. } => "min",
            Self::Max { .. } => "max",
            Self::Pattern { .. } => "pattern",
            Self::Email => "email",
            Self::MaxFiles { .. } => "maxFiles",
            Self::MaxSizeMb { .. } => "maxSizeMB",
            Self::Accept { .. } => "accept",
        }
    }
}

/// What "required" means for the owning field type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequiredKind {
    /// Value must be present and not empty.
    Value,
    /// Checkbox must be strictly true.
    CheckedTrue,
    /// At least one file must be picked.
    FilePresent,
}

/// One composable validation rule over a live control value.
///
/// Rules are pure: checking never mutates anything and never fails. Rules
/// other than `Required` pass absent values through; presence is solely the
/// required rule's concern.
#[derive(Debug, Clone)]
pub enum ValidatorRule {
    /// Presence check, shaped by the field type.
    Required(RequiredKind),
    /// Minimum text length.
    MinLength(u32),
    /// Maximum text length.
    MaxLength(u32),
    /// Numeric lower bound.
    Min(f64),
    /// Numeric upper bound.
    Max(f64),
    /// Full-match regex with its original source.
    Pattern {
        /// Original pattern source for error details.
        source: String,
        /// Compiled anchored regex.
        regex: Regex,
    },
    /// Email format check.
    Email,
    /// File-count ceiling.
    MaxFiles(u32),
    /// Per-file size ceiling in megabytes.
    MaxSizeMb(f64),
    /// File-accept constraint.
    Accept(AcceptPatterns),
}

impl ValidatorRule {
    /// Checks one value, returning the error detail on failure.
    #[must_use]
    pub fn check(&self, value: &FieldValue) -> Option<ValidationIssue> {
        match self {
            Self::Required(kind) => Self::check_required(*kind, value),
            Self::MinLength(min) => {
                let actual = Self::countable_length(value)?;
                (actual < *min).then(|| ValidationIssue::MinLength {
                    min: *min,
                    actual,
                })
            }
            Self::MaxLength(max) => {
                let actual = Self::countable_length(value)?;
                (actual > *max).then(|| ValidationIssue::MaxLength {
                    max: *max,
                    actual,
                })
            }
            Self::Min(min) => {
                let actual = value.as_f64()?;
                (actual < *min).then(|| ValidationIssue::Min {
                    min: *min,
                    actual,
                })
            }
            Self::Max(max) => {
                let actual = value.as_f64()?;
                (actual > *max).then(|| ValidationIssue::Max {
                    max: *max,
                    actual,
                })
            }
            Self::Pattern { source, regex } => {
                let text = match value {
                    FieldValue::Text(text) if !text.is_empty() => text.clone(),
                    FieldValue::Number(number) => number.to_string(),
                    _ => return None,
                };

                (!regex.is_match(text.as_str())).then(|| ValidationIssue::Pattern {
                    pattern: source.clone(),
                })
            }
            Self::Email => match value {
                FieldValue::Text(text) if !text.is_empty() => EMAIL_REGEX
                    .as_ref()
                    .is_some_and(|regex| !regex.is_match(text))
                    .then_some(ValidationIssue::Email),
                _ => None,
            },
            Self::MaxFiles(max) => {
                let actual = value.files().len() as u32;
                (actual > *max).then(|| ValidationIssue::MaxFiles {
                    max: *max,
                    actual,
                })
            }
            Self::MaxSizeMb(max) => {
                let max_bytes = max * 1024.0 * 1024.0;
                value
                    .files()
                    .into_iter()
                    .find(|file| file.size_bytes() as f64 > max_bytes)
                    .map(|file| ValidationIssue::MaxSizeMb {
                        max: *max,
                        file: file.name().to_owned(),
                        actual_bytes: file.size_bytes(),
                    })
            }
            Self::Accept(patterns) => {
                let files = value.files();
                if files.is_empty() || patterns.is_empty() {
                    return None;
                }

                files
                    .into_iter()
                    .find(|file| !patterns.accepts(file))
                    .map(|file| ValidationIssue::Accept {
                        accept: patterns.as_str().to_owned(),
                        file: file.name().to_owned(),
                        media_type: file.media_type().to_owned(),
                    })
            }
        }
    }

    fn check_required(kind: RequiredKind, value: &FieldValue) -> Option<ValidationIssue> {
        let missing = match kind {
            RequiredKind::Value => value.is_empty_like(),
            RequiredKind::CheckedTrue => !matches!(value, FieldValue::Bool(true)),
            RequiredKind::FilePresent => value.files().is_empty(),
        };

        missing.then_some(ValidationIssue::Required)
    }

    fn countable_length(value: &FieldValue) -> Option<u32> {
        match value {
            FieldValue::Text(text) if !text.is_empty() => Some(text.chars().count() as u32),
            FieldValue::Array(items) if !items.is_empty() => Some(items.len() as u32),
            _ => None,
        }
    }
}

/// Builds the ordered validator set for one field schema.
///
/// Building never fails: an invalid pattern degrades to a skipped rule.
#[must_use]
pub fn build_validators(field: &FieldSchema) -> Vec<ValidatorRule> {
    let mut rules = Vec::new();

    if field.is_required() {
        let kind = match field.field_type() {
            FieldType::Checkbox => RequiredKind::CheckedTrue,
            FieldType::File => RequiredKind::FilePresent,
            _ => RequiredKind::Value,
        };
        rules.push(ValidatorRule::Required(kind));
    }

    if let Some(validations) = field.validations() {
        if let Some(min) = validations.min_length() {
            rules.push(ValidatorRule::MinLength(min));
        }
        if let Some(max) = validations.max_length() {
            rules.push(ValidatorRule::MaxLength(max));
        }
        if let Some(min) = validations.min() {
            rules.push(ValidatorRule::Min(min));
        }
        if let Some(max) = validations.max() {
            rules.push(ValidatorRule::Max(max));
        }
        if let Some(pattern) = validations.pattern()
            && let Ok(regex) = Regex::new(format!("^(?:{pattern})$").as_str())
        {
            rules.push(ValidatorRule::Pattern {
                source: pattern.to_owned(),
                regex,
            });
        }
    }

    if field.field_type() == FieldType::Email {
        rules.push(ValidatorRule::Email);
    }

    if field.field_type() == FieldType::File {
        let max_files = match field.max_files() {
            Some(max) => Some(max),
            None if field.multiple() => None,
            None => Some(1),
        };
        if let Some(max) = max_files {
            rules.push(ValidatorRule::MaxFiles(max));
        }

        if let Some(max) = field.max_size_mb() {
            rules.push(ValidatorRule::MaxSizeMb(max));
        }

        if let Some(accept) = field.accept().and_then(normalize_accept) {
            let patterns = AcceptPatterns::parse(accept.as_str());
            if !patterns.is_empty() {
                rules.push(ValidatorRule::Accept(patterns));
            }
        }
    }

    rules
}
