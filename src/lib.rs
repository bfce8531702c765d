//! Office Twin - Digital twin of a smart office HVAC system
//!
//! Replays building telemetry against an in-memory room model, simulates each
//! room's thermal response and HVAC decision, accepts operator overrides and
//! validates the live model against declarative constraints.

pub mod control;
pub mod core;
pub mod engine;
pub mod model;
pub mod physics;
pub mod report;
pub mod telemetry;
pub mod validation;

pub use crate::core::{Directive, HvacState, Result, RoomId, TwinConfig, TwinError};
pub use engine::{Scheduler, SchedulerState, TickOutcome, TwinEngine};
