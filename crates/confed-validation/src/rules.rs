//! Validation rules

use crate::format::{parse_number, parses_as};
use crate::{Error, Result};
use confed_schema::{Constraints, Kind};
use regex::Regex;
use rust_decimal::Decimal;
use std::fmt;

/// What a rule inspects on a node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subject<'a> {
    /// A scalar's text value, `None` when unset
    Scalar(Option<&'a str>),
    /// An object, populated or still a placeholder
    Object { materialized: bool },
    /// An array and its element count
    Array { len: usize },
}

/// Name of a rule, reported alongside each violation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleKind {
    Required,
    AllowedValues,
    DeniedValues,
    Format,
    Range,
    Length,
    Pattern,
}

impl RuleKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RuleKind::Required => "required",
            RuleKind::AllowedValues => "allowed-values",
            RuleKind::DeniedValues => "denied-values",
            RuleKind::Format => "format",
            RuleKind::Range => "range",
            RuleKind::Length => "length",
            RuleKind::Pattern => "pattern",
        }
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validation rule result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleResult {
    pub is_valid: bool,
    pub message: Option<String>,
}

impl RuleResult {
    #[must_use]
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            message: None,
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            message: Some(message.into()),
        }
    }
}

/// A failed rule on one node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleViolation {
    pub rule: RuleKind,
    pub message: String,
}

impl fmt::Display for RuleViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.rule)
    }
}

/// Validate that a value is present and not blank
#[must_use]
pub fn validate_required(value: Option<&str>) -> RuleResult {
    match value {
        Some(v) if !v.trim().is_empty() => RuleResult::valid(),
        _ => RuleResult::invalid("Value is required"),
    }
}

/// Validate a value against an allow-list
#[must_use]
pub fn validate_allowed(value: &str, allowed: &[String]) -> RuleResult {
    if allowed.iter().any(|a| a == value) {
        RuleResult::valid()
    } else {
        RuleResult::invalid(format!(
            "Value '{value}' is not one of the allowed values {allowed:?}"
        ))
    }
}

/// Validate a value against a deny-list
#[must_use]
pub fn validate_denied(value: &str, denied: &[String]) -> RuleResult {
    if denied.iter().any(|d| d == value) {
        RuleResult::invalid(format!("Value '{value}' is a denied value"))
    } else {
        RuleResult::valid()
    }
}

/// Validate that a value parses as `kind`
#[must_use]
pub fn validate_format(value: &str, kind: Kind) -> RuleResult {
    if parses_as(kind, value) {
        RuleResult::valid()
    } else {
        RuleResult::invalid(format!("Value '{value}' is not a valid {kind}"))
    }
}

/// Validate a numeric value against inclusive bounds.
///
/// Unparseable values pass; they are reported by the format rule.
#[must_use]
pub fn validate_range(value: &str, min: Option<Decimal>, max: Option<Decimal>) -> RuleResult {
    let Some(number) = parse_number(value) else {
        return RuleResult::valid();
    };

    if let Some(min) = min {
        if number < min {
            return RuleResult::invalid(format!("Value {number} is less than minimum {min}"));
        }
    }

    if let Some(max) = max {
        if number > max {
            return RuleResult::invalid(format!("Value {number} exceeds maximum {max}"));
        }
    }

    RuleResult::valid()
}

/// Validate a length (characters or elements) against inclusive bounds
#[must_use]
pub fn validate_length(len: usize, min: Option<Decimal>, max: Option<Decimal>) -> RuleResult {
    let length = Decimal::from(len);

    if let Some(min) = min {
        if length < min {
            return RuleResult::invalid(format!("Length {len} is less than minimum {min}"));
        }
    }

    if let Some(max) = max {
        if length > max {
            return RuleResult::invalid(format!("Length {len} exceeds maximum {max}"));
        }
    }

    RuleResult::valid()
}

/// Validate that the whole value matches a compiled pattern
#[must_use]
pub fn validate_pattern(value: &str, pattern: &Pattern) -> RuleResult {
    if pattern.regex.is_match(value) {
        RuleResult::valid()
    } else {
        RuleResult::invalid(format!(
            "Value '{value}' does not match pattern '{}'",
            pattern.source
        ))
    }
}

/// A regular expression anchored to match the whole value
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    /// Compile `source` as a full-match pattern
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPattern`] when `source` is not a valid regex.
    pub fn new(source: &str) -> Result<Self> {
        let regex = Regex::new(&format!("^(?:{source})$")).map_err(|e| Error::InvalidPattern {
            pattern: source.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self {
            source: source.to_string(),
            regex,
        })
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }
}

/// A single constraint check
#[derive(Debug, Clone)]
pub enum Rule {
    Required,
    AllowedValues(Vec<String>),
    DeniedValues(Vec<String>),
    Format(Kind),
    Range {
        min: Option<Decimal>,
        max: Option<Decimal>,
    },
    Length {
        min: Option<Decimal>,
        max: Option<Decimal>,
    },
    Pattern(Pattern),
}

impl Rule {
    #[must_use]
    pub fn kind(&self) -> RuleKind {
        match self {
            Rule::Required => RuleKind::Required,
            Rule::AllowedValues(_) => RuleKind::AllowedValues,
            Rule::DeniedValues(_) => RuleKind::DeniedValues,
            Rule::Format(_) => RuleKind::Format,
            Rule::Range { .. } => RuleKind::Range,
            Rule::Length { .. } => RuleKind::Length,
            Rule::Pattern(_) => RuleKind::Pattern,
        }
    }

    /// Check the rule. Unset scalars are only inspected by `Required`.
    #[must_use]
    pub fn check(&self, subject: Subject<'_>) -> RuleResult {
        match (self, subject) {
            (Rule::Required, Subject::Scalar(value)) => validate_required(value),
            (Rule::Required, Subject::Object { materialized }) => {
                if materialized {
                    RuleResult::valid()
                } else {
                    RuleResult::invalid("Object is required")
                }
            }
            (Rule::Required, Subject::Array { len }) => {
                if len > 0 {
                    RuleResult::valid()
                } else {
                    RuleResult::invalid("At least one element is required")
                }
            }
            (Rule::AllowedValues(allowed), Subject::Scalar(Some(value))) => {
                validate_allowed(value, allowed)
            }
            (Rule::DeniedValues(denied), Subject::Scalar(Some(value))) => {
                validate_denied(value, denied)
            }
            (Rule::Format(kind), Subject::Scalar(Some(value))) => validate_format(value, *kind),
            (Rule::Range { min, max }, Subject::Scalar(Some(value))) => {
                validate_range(value, *min, *max)
            }
            (Rule::Length { min, max }, Subject::Scalar(Some(value))) => {
                validate_length(value.chars().count(), *min, *max)
            }
            (Rule::Length { min, max }, Subject::Array { len }) => validate_length(len, *min, *max),
            (Rule::Pattern(pattern), Subject::Scalar(Some(value))) => {
                validate_pattern(value, pattern)
            }
            _ => RuleResult::valid(),
        }
    }
}

/// The ordered rules a node is checked against
#[derive(Debug, Clone)]
pub struct RuleSet {
    kind: Kind,
    rules: Vec<Rule>,
}

impl RuleSet {
    /// A rule set that accepts everything
    #[must_use]
    pub fn empty(kind: Kind) -> Self {
        Self {
            kind,
            rules: Vec::new(),
        }
    }

    /// Build the rules implied by `constraints` on a node of `kind`
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPattern`] when the regular expression does not compile.
    pub fn from_constraints(kind: Kind, constraints: &Constraints) -> Result<Self> {
        let mut rules = Vec::new();

        if constraints.required {
            rules.push(Rule::Required);
        }

        if !kind.is_composite() {
            if !constraints.allowed_values.is_empty() {
                rules.push(Rule::AllowedValues(constraints.allowed_values.clone()));
            }
            if !constraints.denied_values.is_empty() {
                rules.push(Rule::DeniedValues(constraints.denied_values.clone()));
            }
            if kind != Kind::String {
                rules.push(Rule::Format(kind));
            }
        }

        let bounded = constraints.minimum.is_some() || constraints.maximum.is_some();
        match kind {
            Kind::Number if bounded => rules.push(Rule::Range {
                min: constraints.minimum,
                max: constraints.maximum,
            }),
            Kind::String | Kind::Array if bounded => rules.push(Rule::Length {
                min: constraints.minimum,
                max: constraints.maximum,
            }),
            _ => {}
        }

        if kind == Kind::String {
            if let Some(source) = &constraints.regular_expression {
                rules.push(Rule::Pattern(Pattern::new(source)?));
            }
        }

        Ok(Self { kind, rules })
    }

    #[must_use]
    pub fn kind(&self) -> Kind {
        self.kind
    }

    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Evaluate every rule, returning all violations in rule order
    #[must_use]
    pub fn evaluate(&self, subject: Subject<'_>) -> Vec<RuleViolation> {
        let subject = self.normalize(subject);
        self.rules
            .iter()
            .filter_map(|rule| {
                let result = rule.check(subject);
                (!result.is_valid).then(|| RuleViolation {
                    rule: rule.kind(),
                    message: result.message.unwrap_or_default(),
                })
            })
            .collect()
    }

    /// Evaluate rules in order, stopping at the first violation
    #[must_use]
    pub fn first_violation(&self, subject: Subject<'_>) -> Option<RuleViolation> {
        let subject = self.normalize(subject);
        self.rules.iter().find_map(|rule| {
            let result = rule.check(subject);
            (!result.is_valid).then(|| RuleViolation {
                rule: rule.kind(),
                message: result.message.unwrap_or_default(),
            })
        })
    }

    /// Blank text counts as unset for every kind except String
    fn normalize<'a>(&self, subject: Subject<'a>) -> Subject<'a> {
        match subject {
            Subject::Scalar(Some(value)) if self.kind != Kind::String && value.trim().is_empty() => {
                Subject::Scalar(None)
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules(kind: Kind, constraints: Constraints) -> RuleSet {
        RuleSet::from_constraints(kind, &constraints).unwrap()
    }

    #[test]
    fn test_required_field() {
        assert!(validate_required(Some("test")).is_valid);
        assert!(!validate_required(Some("   ")).is_valid);
        assert!(!validate_required(None).is_valid);
    }

    #[test]
    fn test_required_with_allowed_value() {
        let constraints = Constraints {
            required: true,
            allowed_values: vec!["123".to_string()],
            ..Constraints::default()
        };
        let set = rules(Kind::String, constraints);

        let empty = set.evaluate(Subject::Scalar(Some("")));
        assert_eq!(empty[0].rule, RuleKind::Required);
        assert!(set.evaluate(Subject::Scalar(Some("123"))).is_empty());
        assert_eq!(
            set.first_violation(Subject::Scalar(Some("999"))).unwrap().rule,
            RuleKind::AllowedValues
        );
    }

    #[test]
    fn test_denied_values() {
        let constraints = Constraints {
            denied_values: vec!["1".to_string(), "2".to_string()],
            ..Constraints::default()
        };
        let set = rules(Kind::Number, constraints);
        assert_eq!(
            set.first_violation(Subject::Scalar(Some("2"))).unwrap().rule,
            RuleKind::DeniedValues
        );
        assert!(set.first_violation(Subject::Scalar(Some("3"))).is_none());
    }

    #[test]
    fn test_number_format_and_range() {
        let set = rules(
            Kind::Number,
            Constraints::new().bounds(Decimal::ONE, Decimal::from(10)),
        );
        assert!(set.evaluate(Subject::Scalar(Some("5"))).is_empty());
        assert!(set.evaluate(Subject::Scalar(Some("10"))).is_empty());

        let low = set.evaluate(Subject::Scalar(Some("0")));
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].rule, RuleKind::Range);

        let bad = set.evaluate(Subject::Scalar(Some("ten")));
        assert_eq!(bad.len(), 1);
        assert_eq!(bad[0].rule, RuleKind::Format);
    }

    #[test]
    fn test_unset_values_skip_non_required_rules() {
        let set = rules(
            Kind::Number,
            Constraints::new().bounds(Decimal::ONE, Decimal::from(10)),
        );
        assert!(set.evaluate(Subject::Scalar(None)).is_empty());
        assert!(set.evaluate(Subject::Scalar(Some("  "))).is_empty());
    }

    #[test]
    fn test_boolean_and_dates() {
        assert!(
            !rules(Kind::Boolean, Constraints::new())
                .evaluate(Subject::Scalar(Some("maybe")))
                .is_empty()
        );
        assert!(
            rules(Kind::DateOnly, Constraints::new())
                .evaluate(Subject::Scalar(Some("2024-04-02 22:19:02")))
                .is_empty()
        );
        assert!(
            !rules(Kind::TimeOnly, Constraints::new())
                .evaluate(Subject::Scalar(Some("noon")))
                .is_empty()
        );
    }

    #[test]
    fn test_string_length_counts_characters() {
        let set = rules(
            Kind::String,
            Constraints::new().bounds(Decimal::ONE, Decimal::ONE),
        );
        assert!(set.evaluate(Subject::Scalar(Some("é"))).is_empty());
        assert_eq!(
            set.evaluate(Subject::Scalar(Some("")))[0].rule,
            RuleKind::Length
        );
        assert_eq!(
            set.evaluate(Subject::Scalar(Some("ab")))[0].rule,
            RuleKind::Length
        );
    }

    #[test]
    fn test_pattern_matches_whole_value() {
        let constraints = Constraints {
            regular_expression: Some("[0-9]{3}".to_string()),
            ..Constraints::default()
        };
        let set = rules(Kind::String, constraints);
        assert!(set.evaluate(Subject::Scalar(Some("123"))).is_empty());
        assert_eq!(
            set.evaluate(Subject::Scalar(Some("1234")))[0].rule,
            RuleKind::Pattern
        );
    }

    #[test]
    fn test_invalid_pattern() {
        let constraints = Constraints {
            regular_expression: Some("(".to_string()),
            ..Constraints::default()
        };
        assert!(matches!(
            RuleSet::from_constraints(Kind::String, &constraints),
            Err(Error::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_composite_rules() {
        let object = rules(Kind::Object, Constraints::new().required());
        assert_eq!(
            object.evaluate(Subject::Object {
                materialized: false
            })[0]
                .rule,
            RuleKind::Required
        );
        assert!(object.evaluate(Subject::Object { materialized: true }).is_empty());

        let array = rules(
            Kind::Array,
            Constraints::new().bounds(Decimal::ONE, Decimal::from(2)),
        );
        assert!(array.evaluate(Subject::Array { len: 2 }).is_empty());
        assert_eq!(
            array.evaluate(Subject::Array { len: 3 })[0].rule,
            RuleKind::Length
        );
    }

    #[test]
    fn test_length_helper() {
        assert!(validate_length(3, Some(Decimal::from(3)), None).is_valid);
        assert!(!validate_length(2, Some(Decimal::from(3)), None).is_valid);
        assert!(!validate_length(6, None, Some(Decimal::from(5))).is_valid);
    }
}
