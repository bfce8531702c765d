//! Validation engine - checks the live model against registered constraints
//!
//! Constraints are evaluated in registration order, and room-scoped
//! constraints visit rooms in id order, so two runs over the same model
//! produce the same issue list. A predicate that errors or panics counts as
//! an unsatisfied instance of that constraint; the run itself never fails.

mod builtin;
mod report;

pub use builtin::{builtin_constraints, threshold_constraint};
pub use report::{ValidationIssue, ValidationReport};

use std::panic::{self, AssertUnwindSafe};

use crate::core::error::Result;
use crate::model::{ModelStore, Room};

type RoomCheck = Box<dyn Fn(&Room) -> Result<bool> + Send + Sync>;
type ModelCheck = Box<dyn Fn(&ModelStore) -> Result<bool> + Send + Sync>;
type RoomMessage = Box<dyn Fn(&Room) -> String + Send + Sync>;
type ModelMessage = Box<dyn Fn(&ModelStore) -> String + Send + Sync>;

/// What a constraint applies to
enum Scope {
    /// Checked once per room
    Room { check: RoomCheck, message: RoomMessage },
    /// Checked once against the whole model
    Model { check: ModelCheck, message: ModelMessage },
}

/// A named predicate over the model plus the message shown when it fails
pub struct Constraint {
    name: String,
    scope: Scope,
}

impl Constraint {
    /// Constraint evaluated for every room
    pub fn per_room<C, M>(name: impl Into<String>, check: C, message: M) -> Self
    where
        C: Fn(&Room) -> Result<bool> + Send + Sync + 'static,
        M: Fn(&Room) -> String + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            scope: Scope::Room {
                check: Box::new(check),
                message: Box::new(message),
            },
        }
    }

    /// Constraint evaluated once for the whole model
    pub fn per_model<C, M>(name: impl Into<String>, check: C, message: M) -> Self
    where
        C: Fn(&ModelStore) -> Result<bool> + Send + Sync + 'static,
        M: Fn(&ModelStore) -> String + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            scope: Scope::Model {
                check: Box::new(check),
                message: Box::new(message),
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn evaluate(&self, store: &ModelStore, issues: &mut Vec<ValidationIssue>) {
        match &self.scope {
            Scope::Room { check, message } => {
                for room in store.rooms() {
                    let failure = failure_message(&self.name, || check(room), || message(room));
                    if let Some(text) = failure {
                        issues.push(ValidationIssue::for_room(&self.name, room, text));
                    }
                }
            }
            Scope::Model { check, message } => {
                let failure = failure_message(&self.name, || check(store), || message(store));
                if let Some(text) = failure {
                    issues.push(ValidationIssue::for_model(&self.name, store, text));
                }
            }
        }
    }
}

impl std::fmt::Debug for Constraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let scope = match self.scope {
            Scope::Room { .. } => "room",
            Scope::Model { .. } => "model",
        };
        f.debug_struct("Constraint")
            .field("name", &self.name)
            .field("scope", &scope)
            .finish()
    }
}

/// Runs one predicate and returns the issue text if it did not hold
fn failure_message(
    name: &str,
    check: impl FnOnce() -> Result<bool>,
    message: impl FnOnce() -> String,
) -> Option<String> {
    match panic::catch_unwind(AssertUnwindSafe(check)) {
        Ok(Ok(true)) => None,
        Ok(Ok(false)) => Some(
            panic::catch_unwind(AssertUnwindSafe(message))
                .unwrap_or_else(|_| format!("{} failed (message could not be rendered)", name)),
        ),
        Ok(Err(e)) => Some(format!("{} could not be evaluated: {}", name, e)),
        Err(payload) => {
            let reason = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            tracing::warn!("Constraint {} panicked: {}", name, reason);
            Some(format!("{} could not be evaluated: {}", name, reason))
        }
    }
}

/// Ordered, immutable-after-startup list of constraints
#[derive(Debug)]
pub struct ConstraintSet {
    source: String,
    constraints: Vec<Constraint>,
}

impl ConstraintSet {
    /// `source` is the name printed in the report header
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            constraints: Vec::new(),
        }
    }

    /// Append a constraint; registration order is report order
    pub fn register(&mut self, constraint: Constraint) -> &mut Self {
        self.constraints.push(constraint);
        self
    }

    pub fn with(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.constraints.iter().map(Constraint::name)
    }

    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    /// Evaluate every constraint against the model
    pub fn validate(&self, store: &ModelStore) -> ValidationReport {
        let mut issues = Vec::new();
        for constraint in &self.constraints {
            constraint.evaluate(store, &mut issues);
        }
        ValidationReport::new(self.source.clone(), issues)
    }
}
