//! Validation results and their fixed textual rendering

use serde::Serialize;
use std::fmt::Write;

use crate::core::types::RoomId;
use crate::model::{ModelStore, Room};

const RULE: &str = "----------------------------------------------------------------";
const ISSUE_RULE: &str = "  ------------------------------------------------------------";

/// One unsatisfied constraint instance
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationIssue {
    pub constraint: String,
    /// Human-readable reference to the offending element
    pub element: String,
    /// Offending room, `None` for model-level constraints
    pub room: Option<RoomId>,
    pub message: String,
}

impl ValidationIssue {
    pub(super) fn for_room(constraint: &str, room: &Room, message: String) -> Self {
        Self {
            constraint: constraint.to_string(),
            element: format!("Room[{}] {}", room.id, room.display_name()),
            room: Some(room.id.clone()),
            message,
        }
    }

    pub(super) fn for_model(constraint: &str, store: &ModelStore, message: String) -> Self {
        Self {
            constraint: constraint.to_string(),
            element: format!("Model[{}]", store.name()),
            room: None,
            message,
        }
    }
}

/// Outcome of one validation run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    source: String,
    issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn new(source: String, issues: Vec<ValidationIssue>) -> Self {
        Self { source, issues }
    }

    /// PASS iff no constraint produced an issue
    pub fn is_pass(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    /// Render the operator-facing report
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}", RULE);
        let _ = writeln!(out, " VALIDATION REPORT ({})", self.source);
        let _ = writeln!(out, "{}", RULE);

        if self.issues.is_empty() {
            let _ = writeln!(out, "✔ Validation PASSED. System is healthy.");
            return out;
        }

        let _ = writeln!(out, "✖ Validation FAILED. Found {} issues:", self.issues.len());
        let _ = writeln!(out);
        for issue in &self.issues {
            let _ = writeln!(out, "  [CONSTRAINT] {}", issue.constraint);
            let _ = writeln!(out, "  [ELEMENT]    {}", issue.element);
            let _ = writeln!(out, "  [MESSAGE]    {}", issue.message);
            let _ = writeln!(out, "{}", ISSUE_RULE);
        }
        out
    }
}
