//! Suggestion rules as plain data.
//!
//! A rule is a `(field, comparator, value)` triple. Rules are serializable
//! so they can live in a config file; `ivy-selection` interprets them.

use serde::{Deserialize, Serialize};

/// A single condition on a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// Task attribute to inspect
    pub field: RuleField,

    /// How to compare
    pub comparator: Comparator,

    /// Value to compare against
    pub value: RuleValue,
}

impl Rule {
    /// Create a new rule.
    pub fn new(field: RuleField, comparator: Comparator, value: impl Into<RuleValue>) -> Self {
        Self {
            field,
            comparator,
            value: value.into(),
        }
    }
}

/// Task attributes a rule can look at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleField {
    /// `high` / `medium` / `low`, ordered
    Importance,
    /// `high` / `medium` / `low`, ordered
    Effort,
    /// `@deep` / `@shallow`
    Context,
    /// Minutes
    EstimatedDuration,
    /// Whole days until due (negative when overdue); tasks without a due date never match
    DueInDays,
    /// Any tag
    Tag,
    /// Title text
    Title,
    /// Number of declared dependencies
    DependencyCount,
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparator {
    /// Equal
    Eq,
    /// Not equal
    Ne,
    /// Less than
    Lt,
    /// Less than or equal
    Le,
    /// Greater than
    Gt,
    /// Greater than or equal
    Ge,
    /// Substring (case-insensitive)
    Contains,
    /// Regular expression
    Matches,
}

/// Right-hand side of a rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleValue {
    /// Numeric value
    Number(f64),
    /// Text value
    Text(String),
}

impl From<f64> for RuleValue {
    fn from(v: f64) -> Self {
        RuleValue::Number(v)
    }
}

impl From<u32> for RuleValue {
    fn from(v: u32) -> Self {
        RuleValue::Number(v as f64)
    }
}

impl From<i64> for RuleValue {
    fn from(v: i64) -> Self {
        RuleValue::Number(v as f64)
    }
}

impl From<&str> for RuleValue {
    fn from(v: &str) -> Self {
        RuleValue::Text(v.to_string())
    }
}

impl From<String> for RuleValue {
    fn from(v: String) -> Self {
        RuleValue::Text(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_json_shape() {
        let rule = Rule::new(RuleField::EstimatedDuration, Comparator::Le, 45u32);
        let json = serde_json::to_value(&rule).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"field": "estimated_duration", "comparator": "le", "value": 45.0})
        );

        let parsed: Rule = serde_json::from_str(
            r#"{"field": "tag", "comparator": "eq", "value": "errand"}"#,
        )
        .unwrap();
        assert_eq!(parsed.value, RuleValue::Text("errand".to_string()));
    }
}
