//! Physics rule engine - advances every room by one time step
//!
//! For each room, in id order:
//! 1. Resolve the effective directive (override beats automatic policy)
//! 2. Apply the temperature delta from the thermal model
//! 3. Set the unit's draw and accumulate energy
//! 4. Copy the building-wide occupancy onto the room
//!
//! The engine is a pure transformation over a `ModelStore`; it neither owns
//! the store nor moves the telemetry cursor.

pub mod policy;
pub mod thermal;

pub use policy::{ControlPolicy, ThresholdPolicy};
pub use thermal::{LinearThermalModel, ThermalModel};

use crate::control::OverrideSnapshot;
use crate::core::config::TwinConfig;
use crate::core::error::{Result, TwinError};
use crate::core::types::{Directive, HvacState, RoomId};
use crate::model::{ModelStore, Room};
use crate::telemetry::TelemetrySample;

/// Notable changes produced by a step
#[derive(Debug, Clone, PartialEq)]
pub enum PhysicsEvent {
    /// A room's HVAC changed state
    HvacSwitched {
        room: RoomId,
        from: HvacState,
        to: HvacState,
        /// Directive that drove the change (`Auto` means the policy decided)
        directive: Directive,
    },
}

/// Outcome of one physics step
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepSummary {
    pub rooms_updated: usize,
    pub active_hvacs: usize,
    pub overridden: usize,
    pub events: Vec<PhysicsEvent>,
}

/// Per-tick transformation of the model store
pub struct PhysicsEngine {
    policy: Box<dyn ControlPolicy>,
    thermal: Box<dyn ThermalModel>,
    time_step_hours: f64,
}

impl PhysicsEngine {
    /// Default threshold policy and linear thermal model from config
    pub fn from_config(config: &TwinConfig) -> Self {
        Self {
            policy: Box::new(ThresholdPolicy::from_config(config)),
            thermal: Box::new(LinearThermalModel::from_config(config)),
            time_step_hours: config.time_step_hours,
        }
    }

    /// Replace the automatic control policy
    pub fn with_policy(mut self, policy: impl ControlPolicy + 'static) -> Self {
        self.policy = Box::new(policy);
        self
    }

    /// Replace the thermal model
    pub fn with_thermal_model(mut self, thermal: impl ThermalModel + 'static) -> Self {
        self.thermal = Box::new(thermal);
        self
    }

    pub fn policy_name(&self) -> &'static str {
        self.policy.name()
    }

    pub fn time_step_hours(&self) -> f64 {
        self.time_step_hours
    }

    /// Effective state for a room plus the directive it came from
    pub fn resolve_state(
        &self,
        room: &Room,
        sample: &TelemetrySample,
        overrides: &OverrideSnapshot,
    ) -> (HvacState, Directive) {
        let directive = overrides.resolve(&room.id);
        match directive.forced_state() {
            Some(state) => (state, directive),
            None => (self.policy.decide(room, sample), Directive::Auto),
        }
    }

    /// Advance every room in the store by one time step
    ///
    /// Stops at the first room whose update is not finite; rooms before it
    /// keep their new values.
    pub fn step(
        &self,
        store: &mut ModelStore,
        sample: &TelemetrySample,
        overrides: &OverrideSnapshot,
    ) -> Result<StepSummary> {
        let hours = self.time_step_hours;
        let mut summary = StepSummary::default();

        for room in store.rooms_mut() {
            let (state, directive) = self.resolve_state(room, sample, overrides);

            let delta = self.thermal.temperature_delta(room, sample, state, hours);
            let power = self.thermal.power_draw_w(state);
            if !delta.is_finite() || !power.is_finite() {
                return Err(TwinError::Physics {
                    room: room.id.clone(),
                    reason: format!("non-finite update (dT={}, P={})", delta, power),
                });
            }

            if room.hvac != state {
                summary.events.push(PhysicsEvent::HvacSwitched {
                    room: room.id.clone(),
                    from: room.hvac,
                    to: state,
                    directive,
                });
            }

            room.hvac = state;
            room.temperature += delta;
            room.power_w = power;
            room.energy_wh += power * hours;
            room.occupancy = sample.occupancy;
            room.cumulative_occupancy += u64::from(sample.occupancy);

            summary.rooms_updated += 1;
            if state.is_on() {
                summary.active_hvacs += 1;
            }
            if directive != Directive::Auto {
                summary.overridden += 1;
            }
        }

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn office(temps: &[(&str, f64)]) -> ModelStore {
        ModelStore::from_rooms(
            "Office",
            temps.iter().map(|(id, t)| Room::new(*id, *id, *t)),
        )
        .unwrap()
    }

    fn sample(outdoor: f64, occupancy: u32) -> TelemetrySample {
        TelemetrySample {
            date: "2024-06-01 12:00".into(),
            power_kw: 50.0,
            outdoor_temp_c: outdoor,
            occupancy,
        }
    }

    #[test]
    fn test_all_auto_rooms_cool_on_hot_day() {
        let engine = PhysicsEngine::from_config(&TwinConfig::default());
        let mut store = office(&[("R1", 28.0), ("R2", 28.0), ("R3", 28.0)]);

        let summary = engine
            .step(&mut store, &sample(32.0, 4), &OverrideSnapshot::default())
            .unwrap();

        assert_eq!(summary.rooms_updated, 3);
        assert_eq!(summary.active_hvacs, 3);
        for room in store.rooms() {
            assert_eq!(room.hvac, HvacState::On);
            assert!((room.temperature - 27.5).abs() < 1e-9);
            assert_eq!(room.power_w, 1500.0);
            assert!((room.energy_wh - 375.0).abs() < 1e-9);
            assert_eq!(room.occupancy, 4);
            assert_eq!(room.cumulative_occupancy, 4);
        }
    }

    #[test]
    fn test_force_off_beats_policy() {
        let engine = PhysicsEngine::from_config(&TwinConfig::default());
        let mut store = office(&[("R1", 28.0), ("R2", 28.0)]);
        let overrides: OverrideSnapshot =
            [(RoomId::from("R1"), Directive::ForceOff)].into_iter().collect();

        let summary = engine.step(&mut store, &sample(32.0, 4), &overrides).unwrap();

        let r1 = store.get(&RoomId::from("R1")).unwrap();
        assert_eq!(r1.hvac, HvacState::Off);
        assert!(r1.temperature > 28.0);
        assert_eq!(store.get(&RoomId::from("R2")).unwrap().hvac, HvacState::On);
        assert_eq!(summary.overridden, 1);
    }

    #[test]
    fn test_force_on_beats_cool_room() {
        let engine = PhysicsEngine::from_config(&TwinConfig::default());
        let mut store = office(&[("R1", 20.0)]);
        let overrides: OverrideSnapshot =
            [(RoomId::from("R1"), Directive::ForceOn)].into_iter().collect();

        engine.step(&mut store, &sample(15.0, 0), &overrides).unwrap();
        assert_eq!(store.get(&RoomId::from("R1")).unwrap().hvac, HvacState::On);
    }

    #[test]
    fn test_switch_events_recorded() {
        let engine = PhysicsEngine::from_config(&TwinConfig::default());
        let mut store = office(&[("R1", 28.0), ("R2", 24.0)]);

        let summary = engine
            .step(&mut store, &sample(32.0, 0), &OverrideSnapshot::default())
            .unwrap();

        assert_eq!(
            summary.events,
            vec![PhysicsEvent::HvacSwitched {
                room: RoomId::from("R1"),
                from: HvacState::Off,
                to: HvacState::On,
                directive: Directive::Auto,
            }]
        );
    }

    struct AlwaysOn;

    impl ControlPolicy for AlwaysOn {
        fn name(&self) -> &'static str {
            "always-on"
        }

        fn decide(&self, _room: &Room, _sample: &TelemetrySample) -> HvacState {
            HvacState::On
        }
    }

    #[test]
    fn test_policy_is_replaceable() {
        let engine = PhysicsEngine::from_config(&TwinConfig::default()).with_policy(AlwaysOn);
        let mut store = office(&[("R1", 18.0)]);

        engine
            .step(&mut store, &sample(10.0, 0), &OverrideSnapshot::default())
            .unwrap();

        assert_eq!(engine.policy_name(), "always-on");
        assert_eq!(store.get(&RoomId::from("R1")).unwrap().hvac, HvacState::On);
    }

    struct Broken;

    impl ThermalModel for Broken {
        fn temperature_delta(&self, _: &Room, _: &TelemetrySample, _: HvacState, _: f64) -> f64 {
            f64::NAN
        }

        fn power_draw_w(&self, _: HvacState) -> f64 {
            0.0
        }
    }

    #[test]
    fn test_non_finite_update_is_an_error() {
        let engine = PhysicsEngine::from_config(&TwinConfig::default()).with_thermal_model(Broken);
        let mut store = office(&[("R1", 25.0)]);

        let result = engine.step(&mut store, &sample(30.0, 0), &OverrideSnapshot::default());
        assert!(matches!(result, Err(TwinError::Physics { room, .. }) if room.as_str() == "R1"));
        assert_eq!(store.get(&RoomId::from("R1")).unwrap().temperature, 25.0);
    }
}
