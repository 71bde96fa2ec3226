//! Validation reporter

use crate::rules::{RuleKind, RuleViolation};
use std::fmt;

/// A violation located in the tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Path of the offending node, e.g. `Demo2s[0].Int`
    pub path: String,
    pub rule: RuleKind,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(path: impl Into<String>, violation: RuleViolation) -> Self {
        Self {
            path: path.into(),
            rule: violation.rule,
            message: violation.message,
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({})", self.path, self.message, self.rule)
    }
}

/// Issues found by one validation pass, in tree order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }

    #[must_use]
    pub fn first(&self) -> Option<&ValidationIssue> {
        self.issues.first()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.issues.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter()
    }

    pub fn push(&mut self, issue: ValidationIssue) {
        self.issues.push(issue);
    }

    #[must_use]
    pub fn into_issues(self) -> Vec<ValidationIssue> {
        self.issues
    }
}

impl<'a> IntoIterator for &'a ValidationReport {
    type Item = &'a ValidationIssue;
    type IntoIter = std::slice::Iter<'a, ValidationIssue>;

    fn into_iter(self) -> Self::IntoIter {
        self.issues.iter()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

/// Renders reports for people
#[derive(Debug, Clone, Default)]
pub struct ValidationReporter {
    /// Prefix each issue with its position
    numbered: bool,
}

impl ValidationReporter {
    /// Create a new validation reporter
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn numbered(mut self) -> Self {
        self.numbered = true;
        self
    }

    /// A summary line followed by one line per issue
    #[must_use]
    pub fn render(&self, report: &ValidationReport) -> String {
        if report.is_valid() {
            return "valid".to_string();
        }

        let mut out = format!("{} issue(s) found", report.len());
        for (idx, issue) in report.iter().enumerate() {
            out.push('\n');
            if self.numbered {
                out.push_str(&format!("{:>3}. ", idx + 1));
            } else {
                out.push_str("  - ");
            }
            out.push_str(&issue.to_string());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> ValidationReport {
        let mut report = ValidationReport::default();
        report.push(ValidationIssue::new(
            "Name",
            RuleViolation {
                rule: RuleKind::Required,
                message: "Value is required".to_string(),
            },
        ));
        report.push(ValidationIssue::new(
            "Items[1].Count",
            RuleViolation {
                rule: RuleKind::Range,
                message: "Value 11 exceeds maximum 10".to_string(),
            },
        ));
        report
    }

    #[test]
    fn test_issue_display() {
        let report = report();
        assert_eq!(
            report.first().unwrap().to_string(),
            "Name: Value is required (required)"
        );
        assert_eq!(report.to_string().lines().count(), 2);
    }

    #[test]
    fn test_render() {
        let rendered = ValidationReporter::new().render(&report());
        assert!(rendered.starts_with("2 issue(s) found"));
        assert!(rendered.contains("  - Items[1].Count: Value 11 exceeds maximum 10 (range)"));

        let numbered = ValidationReporter::new().numbered().render(&report());
        assert!(numbered.contains("  1. Name"));
    }

    #[test]
    fn test_render_valid() {
        assert_eq!(
            ValidationReporter::new().render(&ValidationReport::default()),
            "valid"
        );
    }
}
