use std::collections::BTreeMap;
use std::sync::Arc;

use formwright_core::{AppResult, NonEmptyString};
use serde_json::{Map, Number, Value};

/// One file selected into a file field.
#[derive(Debug, Clone, PartialEq)]
pub struct FileAttachment {
    name: NonEmptyString,
    media_type: String,
    content: Arc<Vec<u8>>,
}

impl FileAttachment {
    /// Creates a validated file attachment. The media type may be empty when
    /// the picker does not report one.
    pub fn new(
        name: impl Into<String>,
        media_type: impl Into<String>,
        content: impl Into<Vec<u8>>,
    ) -> AppResult<Self> {
        Ok(Self {
            name: NonEmptyString::new(name)?,
            media_type: media_type.into(),
            content: Arc::new(content.into()),
        })
    }

    /// Returns the file name as reported by the picker.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the reported MIME type, possibly empty.
    #[must_use]
    pub fn media_type(&self) -> &str {
        self.media_type.as_str()
    }

    /// Returns the file size in bytes.
    #[must_use]
    pub fn size_bytes(&self) -> u64 {
        self.content.len() as u64
    }

    /// Returns the raw file content.
    #[must_use]
    pub fn content(&self) -> &[u8] {
        self.content.as_slice()
    }
}

/// A live form value: JSON-shaped, extended with a file variant so picked
/// files survive body mapping untouched.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Absent value.
    Null,
    /// Boolean value (checkbox state).
    Bool(bool),
    /// Numeric value.
    Number(Number),
    /// Text value.
    Text(String),
    /// Ordered list value (multi-select, multi-file).
    Array(Vec<FieldValue>),
    /// Nested object value.
    Object(BTreeMap<String, FieldValue>),
    /// Single picked file.
    File(FileAttachment),
}

/// A form-value snapshot: control key to current value, taken at one instant.
pub type FormValues = BTreeMap<String, FieldValue>;

impl FieldValue {
    /// Returns the value at a dotted path below this value, traversing
    /// objects only. Any missing or non-object intermediate yields `None`.
    #[must_use]
    pub fn at_path(&self, path: &str) -> Option<&FieldValue> {
        let mut current = self;
        for segment in path.split('.') {
            if segment.is_empty() {
                return None;
            }

            let FieldValue::Object(map) = current else {
                return None;
            };
            current = map.get(segment)?;
        }

        Some(current)
    }

    /// Returns whether the value counts as absent: null, empty string, or
    /// empty array.
    #[must_use]
    pub fn is_empty_like(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Text(text) => text.is_empty(),
            Self::Array(items) => items.is_empty(),
            _ => false,
        }
    }

    /// Returns a numeric view of the value, parsing numeric strings.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(number) => number.as_f64(),
            Self::Text(text) => text.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    /// Normalizes the value into the file list it carries: a single file
    /// becomes a one-element list, an array contributes its file members,
    /// anything else is empty.
    #[must_use]
    pub fn files(&self) -> Vec<&FileAttachment> {
        match self {
            Self::File(file) => vec![file],
            Self::Array(items) => items
                .iter()
                .filter_map(|item| match item {
                    Self::File(file) => Some(file),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Returns whether a file is present anywhere inside this value.
    #[must_use]
    pub fn contains_file(&self) -> bool {
        match self {
            Self::File(_) => true,
            Self::Array(items) => items.iter().any(FieldValue::contains_file),
            Self::Object(map) => map.values().any(FieldValue::contains_file),
            _ => false,
        }
    }

    /// Renders the value for template substitution. Null renders empty,
    /// files render as their name, composites render as JSON.
    #[must_use]
    pub fn to_display_string(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Bool(flag) => flag.to_string(),
            Self::Number(number) => number.to_string(),
            Self::Text(text) => text.clone(),
            Self::Array(_) | Self::Object(_) => self.to_json().to_string(),
            Self::File(file) => file.name().to_owned(),
        }
    }

    /// Converts to plain JSON. Files degrade to their name string; bodies
    /// that must carry file bytes go through the multipart path instead.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(flag) => Value::Bool(*flag),
            Self::Number(number) => Value::Number(number.clone()),
            Self::Text(text) => Value::String(text.clone()),
            Self::Array(items) => Value::Array(items.iter().map(FieldValue::to_json).collect()),
            Self::Object(map) => {
                let mut object = Map::with_capacity(map.len());
                for (key, value) in map {
                    object.insert(key.clone(), value.to_json());
                }

                Value::Object(object)
            }
            Self::File(file) => Value::String(file.name().to_owned()),
        }
    }

    /// Compares against a plain JSON operand. Numbers compare numerically,
    /// composites compare structurally, files never match.
    #[must_use]
    pub fn equals_json(&self, operand: &Value) -> bool {
        match (self, operand) {
            (Self::Null, Value::Null) => true,
            (Self::Bool(left), Value::Bool(right)) => left == right,
            (Self::Number(left), Value::Number(right)) => {
                match (left.as_f64(), right.as_f64()) {
                    (Some(left), Some(right)) => left == right,
                    _ => false,
                }
            }
            (Self::Text(left), Value::String(right)) => left == right,
            (Self::Array(left), Value::Array(right)) => {
                left.len() == right.len()
                    && left
                        .iter()
                        .zip(right.iter())
                        .all(|(item, other)| item.equals_json(other))
            }
            (Self::Object(left), Value::Object(right)) => {
                left.len() == right.len()
                    && left.iter().all(|(key, value)| {
                        right.get(key).is_some_and(|other| value.equals_json(other))
                    })
            }
            _ => false,
        }
    }
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(flag) => Self::Bool(flag),
            Value::Number(number) => Self::Number(number),
            Value::String(text) => Self::Text(text),
            Value::Array(items) => Self::Array(items.into_iter().map(FieldValue::from).collect()),
            Value::Object(map) => Self::Object(
                map.into_iter()
                    .map(|(key, value)| (key, FieldValue::from(value)))
                    .collect(),
            ),
        }
    }
}

/// Converts a JSON object into a form-value snapshot. Non-object input
/// yields an empty snapshot.
#[must_use]
pub fn form_values_from_json(value: Value) -> FormValues {
    match value {
        Value::Object(map) => map
            .into_iter()
            .map(|(key, value)| (key, FieldValue::from(value)))
            .collect(),
        _ => FormValues::new(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{FieldValue, FileAttachment};

    fn object(pairs: &[(&str, FieldValue)]) -> FieldValue {
        FieldValue::Object(
            pairs
                .iter()
                .map(|(key, value)| ((*key).to_owned(), value.clone()))
                .collect(),
        )
    }

    #[test]
    fn at_path_walks_nested_objects() {
        let value = object(&[(
            "a",
            object(&[("b", FieldValue::Number(serde_json::Number::from(5)))]),
        )]);

        assert_eq!(
            value.at_path("a.b"),
            Some(&FieldValue::Number(serde_json::Number::from(5)))
        );
        assert_eq!(value.at_path("a.c"), None);
        assert_eq!(value.at_path("a..b"), None);
    }

    #[test]
    fn empty_like_covers_null_empty_text_and_empty_array() {
        assert!(FieldValue::Null.is_empty_like());
        assert!(FieldValue::Text(String::new()).is_empty_like());
        assert!(FieldValue::Array(Vec::new()).is_empty_like());
        assert!(!FieldValue::Bool(false).is_empty_like());
        assert!(!FieldValue::Text("0".to_owned()).is_empty_like());
    }

    #[test]
    fn equals_json_compares_numbers_numerically() {
        let value = FieldValue::from(json!(2.0));
        assert!(value.equals_json(&json!(2)));
        assert!(!value.equals_json(&json!(3)));
        assert!(!value.equals_json(&json!("2")));
    }

    #[test]
    fn files_normalizes_single_and_array_values() {
        let file = FileAttachment::new("a.pdf", "application/pdf", Vec::new());
        assert!(file.is_ok());
        let Ok(file) = file else {
            return;
        };

        let single = FieldValue::File(file.clone());
        assert_eq!(single.files().len(), 1);

        let mixed = FieldValue::Array(vec![
            FieldValue::File(file),
            FieldValue::Text("note".to_owned()),
        ]);
        assert_eq!(mixed.files().len(), 1);
        assert!(mixed.contains_file());
        assert!(!FieldValue::Text("a.pdf".to_owned()).contains_file());
    }

    #[test]
    fn display_string_renders_null_as_empty() {
        assert_eq!(FieldValue::Null.to_display_string(), "");
        assert_eq!(FieldValue::Bool(true).to_display_string(), "true");
        assert_eq!(
            FieldValue::from(json!(["a", "b"])).to_display_string(),
            "[\"a\",\"b\"]"
        );
    }
}
