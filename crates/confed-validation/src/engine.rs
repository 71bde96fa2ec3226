//! Validation engine

use crate::reporter::{ValidationIssue, ValidationReport};
use crate::rules::{RuleSet, Subject};
use confed_schema::Kind;
use serde::Deserialize;
use tracing::{debug, trace};

/// How far a validation pass goes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ValidationMode {
    /// Stop at the first violation
    FailFast,
    /// Visit every node and collect every violation
    #[default]
    CollectAll,
}

/// Validation configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    pub mode: ValidationMode,
    /// Maximum issues before stopping (0 = unlimited)
    pub max_issues: usize,
}

impl ValidationConfig {
    /// Configuration that stops at the first violation
    #[must_use]
    pub fn fail_fast() -> Self {
        Self {
            mode: ValidationMode::FailFast,
            max_issues: 0,
        }
    }
}

/// A tree the engine can walk.
///
/// Children of an [`Kind::Array`] node are addressed by index, every other
/// child by name. The root's own name is not part of its children's paths.
pub trait ValidationTarget: Sized {
    /// Display name of the node
    fn name(&self) -> &str;

    fn kind(&self) -> Kind;

    /// Rules this node is checked against
    fn rules(&self) -> &RuleSet;

    /// The node's current state as seen by its rules
    fn subject(&self) -> Subject<'_>;

    fn children(&self) -> &[Self];
}

/// Path of the child at `idx`, relative to the root when `parent` is `None`
#[must_use]
pub fn child_path(parent: Option<&str>, parent_kind: Kind, idx: usize, name: &str) -> String {
    match (parent, parent_kind) {
        (Some(path), Kind::Array) => format!("{path}[{idx}]"),
        (None, Kind::Array) => format!("[{idx}]"),
        (Some(path), _) => format!("{path}.{name}"),
        (None, _) => name.to_string(),
    }
}

/// Main validation engine
#[derive(Debug, Clone, Default)]
pub struct ValidationEngine {
    config: ValidationConfig,
}

impl ValidationEngine {
    /// Create a new validation engine
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with specific configuration
    #[must_use]
    pub fn with_config(config: ValidationConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Validate a tree, each node before its children and siblings in order
    pub fn validate<T: ValidationTarget>(&self, root: &T) -> ValidationReport {
        let mut report = ValidationReport::default();
        if self.check(root, root.name(), &mut report) {
            self.validate_children(root, None, &mut report);
        }
        debug!(
            root = root.name(),
            issues = report.len(),
            "validation finished"
        );
        report
    }

    /// Validate a single node without visiting its children
    pub fn validate_node<T: ValidationTarget>(&self, node: &T, path: &str) -> ValidationReport {
        let mut report = ValidationReport::default();
        self.check(node, path, &mut report);
        report
    }

    /// Returns false once the walk should stop
    fn validate_children<T: ValidationTarget>(
        &self,
        node: &T,
        path: Option<&str>,
        report: &mut ValidationReport,
    ) -> bool {
        for (idx, child) in node.children().iter().enumerate() {
            let child_path = child_path(path, node.kind(), idx, child.name());
            trace!(path = %child_path, "validating node");
            if !self.check(child, &child_path, report) {
                return false;
            }
            if !self.validate_children(child, Some(&child_path), report) {
                return false;
            }
        }
        true
    }

    fn check<T: ValidationTarget>(
        &self,
        node: &T,
        path: &str,
        report: &mut ValidationReport,
    ) -> bool {
        match self.config.mode {
            ValidationMode::FailFast => {
                if let Some(violation) = node.rules().first_violation(node.subject()) {
                    report.push(ValidationIssue::new(path, violation));
                    return false;
                }
            }
            ValidationMode::CollectAll => {
                for violation in node.rules().evaluate(node.subject()) {
                    report.push(ValidationIssue::new(path, violation));
                    if self.limit_reached(report) {
                        return false;
                    }
                }
            }
        }
        true
    }

    fn limit_reached(&self, report: &ValidationReport) -> bool {
        self.config.max_issues > 0 && report.len() >= self.config.max_issues
    }
}
