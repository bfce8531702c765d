//! Twin engine - the single context object that owns all simulation state
//!
//! Holds the model store and telemetry cursor (behind one `RwLock`), the
//! override table, the physics engine and the constraint set. A tick:
//! 1. Claims the IDLE -> TICKING transition (a concurrent fire is dropped)
//! 2. Snapshots the override table
//! 3. Copies the store and current sample under a read lock
//! 4. Runs the physics step on the private copy
//! 5. Publishes the copy, the overrides it ran with and the cursor advance
//!    under a short write lock
//!
//! Readers therefore only ever see whole ticks. A failed tick publishes
//! nothing and leaves the cursor where it was.

pub mod scheduler;

pub use scheduler::Scheduler;

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use crate::control::{OverrideSnapshot, OverrideTable};
use crate::core::config::TwinConfig;
use crate::core::error::{Result, TwinError};
use crate::core::types::Tick;
use crate::model::ModelStore;
use crate::physics::{PhysicsEngine, StepSummary};
use crate::report::{self, ReportView, Snapshot};
use crate::telemetry::{TelemetryCursor, TelemetrySample};
use crate::validation::{builtin_constraints, ConstraintSet, ValidationReport};

/// Scheduler-visible engine state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Ticking,
}

/// Why a tick did nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Model or dataset not loaded yet
    NotInitialized,
    /// Another tick was still running
    AlreadyTicking,
}

/// What a completed tick did
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    /// Tick number (1-based)
    pub tick: Tick,
    /// Dataset index consumed by this tick
    pub step: usize,
    pub date: String,
    /// The cursor wrapped back to the first sample after this tick
    pub restarted: bool,
    pub summary: StepSummary,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    Completed(TickReport),
    Skipped(SkipReason),
    Failed(String),
}

impl TickOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }
}

/// Live simulation state published atomically at the end of each tick
#[derive(Debug, Clone)]
struct SimState {
    store: ModelStore,
    cursor: TelemetryCursor,
    ticks: Tick,
    /// Overrides the last completed tick ran with
    applied: OverrideSnapshot,
}

/// Resets the TICKING flag when a tick ends, including by panic
struct TickGuard<'a>(&'a AtomicBool);

impl Drop for TickGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct TwinEngine {
    config: TwinConfig,
    physics: PhysicsEngine,
    constraints: ConstraintSet,
    overrides: OverrideTable,
    state: RwLock<Option<SimState>>,
    ticking: AtomicBool,
}

impl TwinEngine {
    /// Engine with the default physics and built-in constraints
    ///
    /// Nothing is loaded yet; ticks are no-ops until [`TwinEngine::load`].
    pub fn new(config: TwinConfig) -> Result<Self> {
        config.validate().map_err(TwinError::InvalidConfig)?;
        Ok(Self {
            physics: PhysicsEngine::from_config(&config),
            constraints: builtin_constraints(&config),
            overrides: OverrideTable::new(),
            state: RwLock::new(None),
            ticking: AtomicBool::new(false),
            config,
        })
    }

    /// Replace the physics engine (policy and thermal model)
    pub fn with_physics(mut self, physics: PhysicsEngine) -> Self {
        self.physics = physics;
        self
    }

    /// Replace the constraint set
    pub fn with_constraints(mut self, constraints: ConstraintSet) -> Self {
        self.constraints = constraints;
        self
    }

    /// Install the initial model and dataset
    ///
    /// Fails on an empty dataset; the engine then stays uninitialised.
    /// Refused with [`TwinError::TickInProgress`] while a tick is running,
    /// and holds off ticks until the new state is in place.
    pub fn load(&self, store: ModelStore, samples: Vec<TelemetrySample>) -> Result<()> {
        if samples.is_empty() {
            return Err(TwinError::EmptyDataset);
        }

        if self
            .ticking
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(TwinError::TickInProgress);
        }
        let _guard = TickGuard(&self.ticking);

        tracing::info!(
            "Engine ready: model '{}' with {} rooms, {} telemetry rows",
            store.name(),
            store.len(),
            samples.len()
        );

        let mut state = self.state.write().map_err(|_| TwinError::Poisoned("model state"))?;
        *state = Some(SimState {
            store,
            cursor: TelemetryCursor::new(samples),
            ticks: 0,
            applied: OverrideSnapshot::default(),
        });
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.state.read().map(|s| s.is_some()).unwrap_or(false)
    }

    pub fn config(&self) -> &TwinConfig {
        &self.config
    }

    pub fn overrides(&self) -> &OverrideTable {
        &self.overrides
    }

    pub fn constraints(&self) -> &ConstraintSet {
        &self.constraints
    }

    pub fn scheduler_state(&self) -> SchedulerState {
        if self.ticking.load(Ordering::Acquire) {
            SchedulerState::Ticking
        } else {
            SchedulerState::Idle
        }
    }

    /// Completed ticks since load
    pub fn ticks(&self) -> Tick {
        self.read_state(|s| s.ticks).unwrap_or(0)
    }

    /// Copy of the current model
    pub fn model(&self) -> Result<ModelStore> {
        self.read_state(|s| s.store.clone())
    }

    /// Current dataset index of the cursor
    pub fn cursor_index(&self) -> Result<usize> {
        self.read_state(|s| s.cursor.index())
    }

    /// Run one simulation step
    ///
    /// Never panics and never returns an error: failures are logged and
    /// reported as [`TickOutcome::Failed`].
    pub fn tick(&self) -> TickOutcome {
        if self
            .ticking
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::warn!("Tick dropped: previous tick still running");
            return TickOutcome::Skipped(SkipReason::AlreadyTicking);
        }
        let _guard = TickGuard(&self.ticking);

        match panic::catch_unwind(AssertUnwindSafe(|| self.run_tick())) {
            Ok(Ok(Some(report))) => TickOutcome::Completed(report),
            Ok(Ok(None)) => {
                tracing::warn!("Tick skipped: model or dataset not loaded");
                TickOutcome::Skipped(SkipReason::NotInitialized)
            }
            Ok(Err(e)) => {
                tracing::error!("Error in simulation step: {}", e);
                TickOutcome::Failed(e.to_string())
            }
            Err(payload) => {
                let reason = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                tracing::error!("Simulation step panicked: {}", reason);
                TickOutcome::Failed(reason)
            }
        }
    }

    fn run_tick(&self) -> Result<Option<TickReport>> {
        let overrides = self.overrides.snapshot()?;

        let (mut working, sample, step) = {
            let guard = self.state.read().map_err(|_| TwinError::Poisoned("model state"))?;
            let Some(state) = guard.as_ref() else {
                return Ok(None);
            };
            let sample = state.cursor.current()?.clone();
            (state.store.clone(), sample, state.cursor.index())
        };

        tracing::debug!("Simulating step {} | Date: {}", step, sample.date);
        let summary = self.physics.step(&mut working, &sample, &overrides)?;

        let mut guard = self.state.write().map_err(|_| TwinError::Poisoned("model state"))?;
        let state = guard.as_mut().ok_or(TwinError::NotInitialized)?;
        state.store = working;
        state.applied = overrides;
        let restarted = state.cursor.advance();
        state.ticks += 1;

        for event in &summary.events {
            tracing::debug!("{:?}", event);
        }

        Ok(Some(TickReport {
            tick: state.ticks,
            step,
            date: sample.date,
            restarted,
            summary,
        }))
    }

    fn read_state<T>(&self, f: impl FnOnce(&SimState) -> T) -> Result<T> {
        let guard = self.state.read().map_err(|_| TwinError::Poisoned("model state"))?;
        let state = guard.as_ref().ok_or(TwinError::NotInitialized)?;
        Ok(f(state))
    }

    fn with_view<T>(&self, f: impl FnOnce(&ReportView<'_>) -> T) -> Result<T> {
        self.read_state(|state| {
            let view = ReportView {
                store: &state.store,
                sample: state.cursor.report_sample(),
                step: state.cursor.last_consumed_index().unwrap_or(0),
                ticks: state.ticks,
                overrides: &state.applied,
            };
            f(&view)
        })
    }

    /// Apply a control command (`ON`, `OFF` or `AUTO`) to a room
    pub fn set_override(&self, room: &str, action: &str) -> Result<String> {
        self.overrides.apply_action(room, action)
    }

    /// Text and JSON renderings of the last completed tick
    pub fn snapshot(&self) -> Result<Snapshot> {
        self.with_view(report::snapshot)?
    }

    /// Human-readable status of the last completed tick
    pub fn status(&self) -> String {
        self.with_view(report::render_status)
            .unwrap_or_else(|e| format!("Error retrieving status: {}", e))
    }

    /// Dashboard JSON; `{"error": ...}` on failure
    pub fn dashboard(&self) -> String {
        match self.with_view(report::render_dashboard) {
            Ok(Ok(json)) => json,
            Ok(Err(e)) | Err(e) => report::error_json(&e.to_string()),
        }
    }

    /// Evaluate every constraint against the current model
    pub fn validate(&self) -> Result<ValidationReport> {
        self.read_state(|state| self.constraints.validate(&state.store))
    }

    /// Rendered validation report
    pub fn validation_report(&self) -> String {
        match self.validate() {
            Ok(report) => report.render(),
            Err(e) => format!("Validation Error: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{HvacState, RoomId};
    use crate::model::Room;

    fn samples(n: usize) -> Vec<TelemetrySample> {
        (0..n)
            .map(|i| TelemetrySample {
                date: format!("day-{}", i),
                power_kw: 40.0,
                outdoor_temp_c: 32.0,
                occupancy: 2,
            })
            .collect()
    }

    fn loaded_engine() -> TwinEngine {
        let engine = TwinEngine::new(TwinConfig::default()).unwrap();
        let store = ModelStore::from_rooms(
            "Office",
            vec![
                Room::new("R1", "Meeting Room", 28.0),
                Room::new("R2", "Staff Lounge", 28.0),
            ],
        )
        .unwrap();
        engine.load(store, samples(3)).unwrap();
        engine
    }

    #[test]
    fn test_uninitialized_tick_is_noop() {
        let engine = TwinEngine::new(TwinConfig::default()).unwrap();
        assert_eq!(
            engine.tick(),
            TickOutcome::Skipped(SkipReason::NotInitialized)
        );
        assert_eq!(engine.scheduler_state(), SchedulerState::Idle);
    }

    #[test]
    fn test_uninitialized_queries_do_not_raise() {
        let engine = TwinEngine::new(TwinConfig::default()).unwrap();
        let dashboard: serde_json::Value = serde_json::from_str(&engine.dashboard()).unwrap();
        assert!(dashboard["error"].as_str().unwrap().contains("not initialized"));
        assert!(engine.status().starts_with("Error retrieving status"));
        assert!(engine.validation_report().starts_with("Validation Error"));
    }

    #[test]
    fn test_empty_dataset_rejected() {
        let engine = TwinEngine::new(TwinConfig::default()).unwrap();
        let result = engine.load(ModelStore::new("Office"), Vec::new());
        assert!(matches!(result, Err(TwinError::EmptyDataset)));
        assert!(!engine.is_initialized());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = TwinConfig {
            time_step_hours: 0.0,
            ..TwinConfig::default()
        };
        assert!(matches!(
            TwinEngine::new(config),
            Err(TwinError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_tick_advances_cursor_and_counts() {
        let engine = loaded_engine();

        let TickOutcome::Completed(report) = engine.tick() else {
            panic!("tick should complete");
        };
        assert_eq!(report.tick, 1);
        assert_eq!(report.step, 0);
        assert_eq!(report.date, "day-0");
        assert!(!report.restarted);
        assert_eq!(engine.cursor_index().unwrap(), 1);
        assert_eq!(engine.ticks(), 1);
    }

    #[test]
    fn test_dataset_restart_reported_on_wrap() {
        let engine = loaded_engine();
        let restarts: Vec<bool> = (0..4)
            .map(|_| match engine.tick() {
                TickOutcome::Completed(r) => r.restarted,
                other => panic!("unexpected {:?}", other),
            })
            .collect();
        assert_eq!(restarts, vec![false, false, true, false]);
        assert_eq!(engine.cursor_index().unwrap(), 1);
    }

    #[test]
    fn test_status_reports_last_consumed_sample() {
        let engine = loaded_engine();
        assert!(engine.status().contains("Date: day-0"));
        engine.tick();
        engine.tick();
        assert!(engine.status().contains("Date: day-1"));
    }

    #[test]
    fn test_load_refused_while_ticking() {
        let engine = loaded_engine();
        engine.tick();

        engine.ticking.store(true, Ordering::Release);
        let result = engine.load(ModelStore::new("Replacement"), samples(1));
        assert!(matches!(result, Err(TwinError::TickInProgress)));
        assert_eq!(engine.model().unwrap().name(), "Office");
        assert_eq!(engine.ticks(), 1);

        engine.ticking.store(false, Ordering::Release);
        engine.load(ModelStore::new("Replacement"), samples(1)).unwrap();
        assert_eq!(engine.model().unwrap().name(), "Replacement");
        assert_eq!(engine.scheduler_state(), SchedulerState::Idle);
    }

    #[test]
    fn test_mode_reports_overrides_of_last_tick() {
        let engine = loaded_engine();
        engine.tick();
        let before = engine.dashboard();

        engine.set_override("R1", "OFF").unwrap();
        assert_eq!(engine.dashboard(), before);

        engine.tick();
        let dashboard: serde_json::Value = serde_json::from_str(&engine.dashboard()).unwrap();
        assert_eq!(dashboard["rooms"][0]["mode"], "FORCE_OFF");
        assert_eq!(dashboard["rooms"][0]["hvac"], "OFF");
    }

    #[test]
    fn test_override_written_between_ticks_applies_next_tick() {
        let engine = loaded_engine();
        engine.tick();
        engine.set_override("R1", "OFF").unwrap();
        engine.tick();

        let model = engine.model().unwrap();
        assert_eq!(model.get(&RoomId::from("R1")).unwrap().hvac, HvacState::Off);
        assert_eq!(model.get(&RoomId::from("R2")).unwrap().hvac, HvacState::On);
    }

    struct Exploding;

    impl crate::physics::ThermalModel for Exploding {
        fn temperature_delta(&self, _: &Room, _: &TelemetrySample, _: HvacState, _: f64) -> f64 {
            panic!("thermal model exploded")
        }

        fn power_draw_w(&self, _: HvacState) -> f64 {
            0.0
        }
    }

    #[test]
    fn test_panicking_tick_is_contained() {
        let config = TwinConfig::default();
        let engine = TwinEngine::new(config.clone())
            .unwrap()
            .with_physics(PhysicsEngine::from_config(&config).with_thermal_model(Exploding));
        engine
            .load(
                ModelStore::from_rooms("Office", vec![Room::new("R1", "A", 28.0)]).unwrap(),
                samples(2),
            )
            .unwrap();

        assert!(matches!(engine.tick(), TickOutcome::Failed(reason) if reason.contains("exploded")));
        assert_eq!(engine.scheduler_state(), SchedulerState::Idle);
        assert_eq!(engine.cursor_index().unwrap(), 0);
        assert_eq!(engine.ticks(), 0);
        assert!(engine.model().unwrap().get(&RoomId::from("R1")).unwrap().temperature == 28.0);
    }
}
