//! Automatic HVAC control policies
//!
//! A policy only runs for rooms without a manual override; overrides are
//! resolved before a policy is ever consulted.

use crate::core::config::TwinConfig;
use crate::core::types::HvacState;
use crate::model::Room;
use crate::telemetry::TelemetrySample;

/// Decides the HVAC state of a room left on automatic control
pub trait ControlPolicy: Send + Sync {
    fn name(&self) -> &'static str;

    fn decide(&self, room: &Room, sample: &TelemetrySample) -> HvacState;
}

/// Setpoint + tolerance band policy
///
/// Runs when the room is hotter than the band, or when people are present
/// and the room is outside the band in either direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdPolicy {
    pub setpoint_c: f64,
    pub tolerance_c: f64,
}

impl ThresholdPolicy {
    pub fn new(setpoint_c: f64, tolerance_c: f64) -> Self {
        Self {
            setpoint_c,
            tolerance_c,
        }
    }

    pub fn from_config(config: &TwinConfig) -> Self {
        Self::new(config.comfort_setpoint_c, config.comfort_tolerance_c)
    }
}

impl ControlPolicy for ThresholdPolicy {
    fn name(&self) -> &'static str {
        "threshold"
    }

    fn decide(&self, room: &Room, sample: &TelemetrySample) -> HvacState {
        let deviation = room.temperature - self.setpoint_c;

        if deviation > self.tolerance_c {
            return HvacState::On;
        }
        if sample.occupancy > 0 && deviation.abs() > self.tolerance_c {
            return HvacState::On;
        }
        HvacState::Off
    }
}
