use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Comparison operator for one visibility rule.
///
/// Unrecognized wire values deserialize as [`VisibilityOperator::Unrecognized`]
/// and evaluate with equals semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VisibilityOperator {
    /// Dependency value is strictly `true`.
    Checked,
    /// Dependency value is not strictly `true`.
    Unchecked,
    /// Dependency value equals the comparison operand.
    Equals,
    /// Dependency value differs from the comparison operand.
    NotEquals,
    /// Dependency value is present (not null, empty string, or empty array).
    HasValue,
    /// Dependency value is absent.
    NotHasValue,
    /// Dependency value is a member of the comparison array.
    In,
    /// Dependency value is not a member of the comparison array.
    NotIn,
    /// Catch-all for unknown operators; behaves as equals.
    #[serde(other)]
    Unrecognized,
}

/// Combination mode across a field's visibility rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum VisibilityMode {
    /// Every rule must pass.
    #[default]
    All,
    /// Any passing rule suffices.
    Any,
}

/// One dependency rule over another field's live value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibilityRule {
    depends_on: String,
    operator: VisibilityOperator,
    #[serde(default)]
    value: Option<Value>,
}

impl VisibilityRule {
    /// Creates one visibility rule.
    #[must_use]
    pub fn new(
        depends_on: impl Into<String>,
        operator: VisibilityOperator,
        value: Option<Value>,
    ) -> Self {
        Self {
            depends_on: depends_on.into(),
            operator,
            value,
        }
    }

    /// Returns the field id or name this rule depends on.
    #[must_use]
    pub fn depends_on(&self) -> &str {
        self.depends_on.as_str()
    }

    /// Returns the comparison operator.
    #[must_use]
    pub fn operator(&self) -> VisibilityOperator {
        self.operator
    }

    /// Returns the comparison operand for equals/in style operators.
    #[must_use]
    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }
}

/// Dependency rules deciding one field's visibility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisibilitySchema {
    #[serde(default)]
    mode: VisibilityMode,
    #[serde(default)]
    rules: Vec<VisibilityRule>,
}

impl VisibilitySchema {
    /// Creates a visibility schema from mode and rules.
    #[must_use]
    pub fn new(mode: VisibilityMode, rules: Vec<VisibilityRule>) -> Self {
        Self { mode, rules }
    }

    /// Returns the rule combination mode.
    #[must_use]
    pub fn mode(&self) -> VisibilityMode {
        self.mode
    }

    /// Returns the rule list.
    #[must_use]
    pub fn rules(&self) -> &[VisibilityRule] {
        self.rules.as_slice()
    }
}
