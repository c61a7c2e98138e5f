//! Interpreter for suggestion rules.

use ivy_core::{Comparator, Level, Rule, RuleField, RuleValue, Task, Time, WorkContext};
use regex::RegexBuilder;
use tracing::warn;

use crate::scoring::days_until;

/// Value of a task attribute, ready for comparison.
enum Operand {
    /// Numeric value with its display text (levels compare by rank)
    Number(f64, String),
    Text(String),
    /// Any-of semantics (tags)
    Many(Vec<String>),
    Missing,
}

/// Whether `task` satisfies `rule` at `now`.
///
/// Comparisons between incompatible types, and rules with an invalid
/// regular expression, never match.
pub fn evaluate(rule: &Rule, task: &Task, now: Time) -> bool {
    let operand = extract(rule.field, task, now);
    let expected = normalize(rule.field, &rule.value);

    match operand {
        Operand::Missing => false,
        Operand::Number(actual, label) => match &expected {
            RuleValue::Number(v) => compare_numbers(actual, rule.comparator, *v),
            RuleValue::Text(v) => match rule.comparator {
                Comparator::Contains | Comparator::Matches => text_matches(&label, rule.comparator, v),
                _ => v
                    .parse::<f64>()
                    .ok()
                    .or_else(|| level_rank(v))
                    .map(|rank| compare_numbers(actual, rule.comparator, rank))
                    .unwrap_or(false),
            },
        },
        Operand::Text(actual) => match &expected {
            RuleValue::Text(v) => text_matches(&actual, rule.comparator, v),
            RuleValue::Number(_) => false,
        },
        Operand::Many(values) => match &expected {
            RuleValue::Text(v) => match rule.comparator {
                Comparator::Ne => !values.iter().any(|t| t.eq_ignore_ascii_case(v)),
                _ => values.iter().any(|t| text_matches(t, rule.comparator, v)),
            },
            RuleValue::Number(_) => false,
        },
    }
}

/// Whether `task` satisfies every rule. An empty rule set matches everything.
pub fn all_match(rules: &[Rule], task: &Task, now: Time) -> bool {
    rules.iter().all(|r| evaluate(r, task, now))
}

fn extract(field: RuleField, task: &Task, now: Time) -> Operand {
    match field {
        RuleField::Importance => level_operand(task.importance),
        RuleField::Effort => level_operand(task.effort),
        RuleField::Context => Operand::Text(task.context.as_str().to_string()),
        RuleField::EstimatedDuration => {
            Operand::Number(task.estimated_duration as f64, task.estimated_duration.to_string())
        }
        RuleField::DueInDays => match task.due_date {
            Some(due) => {
                let days = days_until(due, now);
                Operand::Number(days as f64, days.to_string())
            }
            None => Operand::Missing,
        },
        RuleField::Tag => Operand::Many(task.tags.iter().cloned().collect()),
        RuleField::Title => Operand::Text(task.title.clone()),
        RuleField::DependencyCount => {
            let n = task.dependencies.len();
            Operand::Number(n as f64, n.to_string())
        }
    }
}

fn level_operand(level: Option<Level>) -> Operand {
    match level {
        Some(l) => Operand::Number(rank(l), l.as_str().to_string()),
        None => Operand::Missing,
    }
}

fn rank(level: Level) -> f64 {
    match level {
        Level::Low => 1.0,
        Level::Medium => 2.0,
        Level::High => 3.0,
    }
}

fn level_rank(text: &str) -> Option<f64> {
    text.parse::<Level>().ok().map(rank)
}

/// Contexts are written with or without the `@`.
fn normalize(field: RuleField, value: &RuleValue) -> RuleValue {
    match (field, value) {
        (RuleField::Context, RuleValue::Text(v)) => match v.parse::<WorkContext>() {
            Ok(ctx) => RuleValue::Text(ctx.as_str().to_string()),
            Err(_) => value.clone(),
        },
        _ => value.clone(),
    }
}

fn compare_numbers(actual: f64, comparator: Comparator, expected: f64) -> bool {
    match comparator {
        Comparator::Eq => actual == expected,
        Comparator::Ne => actual != expected,
        Comparator::Lt => actual < expected,
        Comparator::Le => actual <= expected,
        Comparator::Gt => actual > expected,
        Comparator::Ge => actual >= expected,
        Comparator::Contains | Comparator::Matches => false,
    }
}

fn text_matches(actual: &str, comparator: Comparator, expected: &str) -> bool {
    match comparator {
        Comparator::Eq => actual.eq_ignore_ascii_case(expected),
        Comparator::Ne => !actual.eq_ignore_ascii_case(expected),
        Comparator::Contains => actual.to_lowercase().contains(&expected.to_lowercase()),
        Comparator::Matches => match RegexBuilder::new(expected).case_insensitive(true).build() {
            Ok(re) => re.is_match(actual),
            Err(e) => {
                warn!("Invalid rule pattern {:?}: {}", expected, e);
                false
            }
        },
        Comparator::Lt | Comparator::Le | Comparator::Gt | Comparator::Ge => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{deep, now, shallow};
    use chrono::Duration;

    #[test]
    fn test_level_rules_compare_by_rank() {
        let task = deep("a").with_importance(Level::Medium);
        let now = now();

        assert!(evaluate(&Rule::new(RuleField::Importance, Comparator::Ge, "medium"), &task, now));
        assert!(evaluate(&Rule::new(RuleField::Importance, Comparator::Lt, "high"), &task, now));
        assert!(!evaluate(&Rule::new(RuleField::Importance, Comparator::Eq, "low"), &task, now));
        assert!(evaluate(&Rule::new(RuleField::Importance, Comparator::Eq, 2.0), &task, now));

        // missing effort never matches
        assert!(!evaluate(&Rule::new(RuleField::Effort, Comparator::Ne, "high"), &task, now));
    }

    #[test]
    fn test_context_accepts_either_spelling() {
        let task = shallow("a");
        let now = now();
        assert!(evaluate(&Rule::new(RuleField::Context, Comparator::Eq, "shallow"), &task, now));
        assert!(evaluate(&Rule::new(RuleField::Context, Comparator::Eq, "@shallow"), &task, now));
        assert!(evaluate(&Rule::new(RuleField::Context, Comparator::Ne, "@deep"), &task, now));
    }

    #[test]
    fn test_numeric_fields() {
        let now = now();
        let task = deep("a")
            .with_duration(45)
            .with_due_date(now + Duration::days(2))
            .depends_on("b");

        assert!(evaluate(&Rule::new(RuleField::EstimatedDuration, Comparator::Le, 45u32), &task, now));
        assert!(!evaluate(&Rule::new(RuleField::EstimatedDuration, Comparator::Lt, 45u32), &task, now));
        assert!(evaluate(&Rule::new(RuleField::DueInDays, Comparator::Le, 3i64), &task, now));
        assert!(evaluate(&Rule::new(RuleField::DependencyCount, Comparator::Eq, 1u32), &task, now));
        assert!(!evaluate(&Rule::new(RuleField::DueInDays, Comparator::Le, 3i64), &deep("undated"), now));
    }

    #[test]
    fn test_text_and_tag_rules() {
        let now = now();
        let task = shallow("a").with_tag("Errand").with_tag("home");
        let titled = Task { title: "Call the bank".to_string(), ..shallow("b") };

        assert!(evaluate(&Rule::new(RuleField::Tag, Comparator::Eq, "errand"), &task, now));
        assert!(!evaluate(&Rule::new(RuleField::Tag, Comparator::Ne, "home"), &task, now));
        assert!(evaluate(&Rule::new(RuleField::Tag, Comparator::Matches, "^ho"), &task, now));
        assert!(evaluate(&Rule::new(RuleField::Title, Comparator::Contains, "BANK"), &titled, now));
        assert!(evaluate(&Rule::new(RuleField::Title, Comparator::Matches, r"^call\b"), &titled, now));
        assert!(!evaluate(&Rule::new(RuleField::Title, Comparator::Gt, "a"), &titled, now));
    }

    #[test]
    fn test_invalid_pattern_and_type_mismatch() {
        let now = now();
        let task = shallow("a");
        assert!(!evaluate(&Rule::new(RuleField::Title, Comparator::Matches, "(unclosed"), &task, now));
        assert!(!evaluate(&Rule::new(RuleField::Title, Comparator::Eq, 3u32), &task, now));
        assert!(!evaluate(&Rule::new(RuleField::EstimatedDuration, Comparator::Eq, "thirty"), &task, now));
    }

    #[test]
    fn test_all_match() {
        let now = now();
        let task = deep("a").with_duration(20);
        let rules = vec![
            Rule::new(RuleField::Context, Comparator::Eq, "deep"),
            Rule::new(RuleField::EstimatedDuration, Comparator::Lt, 30u32),
        ];

        assert!(all_match(&[], &task, now));
        assert!(all_match(&rules, &task, now));
        assert!(!all_match(&rules, &task.clone().with_duration(60), now));
    }
}
