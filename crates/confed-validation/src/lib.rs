#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # confed-validation
//!
//! Validation engine for editable configuration trees.
//!
//! Each node owns a [`RuleSet`] built from its constraints. The engine walks
//! any tree implementing [`ValidationTarget`] and reports violations by node
//! path, either stopping at the first one or collecting all of them.
//!
//! ## Example Usage
//!
//! ```rust
//! use confed_schema::{Constraints, Kind};
//! use confed_validation::{RuleSet, Subject};
//!
//! let rules = RuleSet::from_constraints(Kind::Number, &Constraints::new().required()).unwrap();
//!
//! assert!(rules.evaluate(Subject::Scalar(Some("42"))).is_empty());
//! assert_eq!(rules.evaluate(Subject::Scalar(None)).len(), 1);
//! assert_eq!(rules.evaluate(Subject::Scalar(Some("forty"))).len(), 1);
//! ```

pub mod engine;
pub mod format;
pub mod reporter;
pub mod rules;

// Re-export main types
pub use engine::{
    ValidationConfig, ValidationEngine, ValidationMode, ValidationTarget, child_path,
};
pub use reporter::{ValidationIssue, ValidationReport, ValidationReporter};
pub use rules::{
    Pattern, Rule, RuleKind, RuleResult, RuleSet, RuleViolation, Subject, validate_allowed,
    validate_denied, validate_format, validate_length, validate_pattern, validate_range,
    validate_required,
};

use thiserror::Error;

/// Errors that can occur while building rules or canonicalizing values
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Invalid regular expression '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("Value '{value}' is not a valid {kind}")]
    Format { kind: String, value: String },
}

impl Error {
    /// Build a format error for a value that does not parse as `kind`.
    pub fn format(kind: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Format {
            kind: kind.into(),
            value: value.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Convenience function to validate a tree with default settings
pub fn validate<T: ValidationTarget>(root: &T) -> ValidationReport {
    ValidationEngine::new().validate(root)
}
