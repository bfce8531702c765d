//! Room thermal and power models

use crate::core::config::TwinConfig;
use crate::core::types::HvacState;
use crate::model::Room;
use crate::telemetry::TelemetrySample;

/// Computes how a room's temperature and draw respond to one step
pub trait ThermalModel: Send + Sync {
    /// Temperature change (°C) over `hours` for the given effective state
    fn temperature_delta(
        &self,
        room: &Room,
        sample: &TelemetrySample,
        state: HvacState,
        hours: f64,
    ) -> f64;

    /// Electrical draw (W) of the room's unit in the given state
    fn power_draw_w(&self, state: HvacState) -> f64;
}

/// Constant-rate cooling with linear drift toward outdoor air
///
/// ON:  dT = -cooling_rate * dt
/// OFF: dT = drift * (T_out - T) * dt
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearThermalModel {
    pub cooling_rate_c_per_hour: f64,
    pub ambient_drift_per_hour: f64,
    pub rated_power_w: f64,
    pub standby_power_w: f64,
}

impl LinearThermalModel {
    pub fn from_config(config: &TwinConfig) -> Self {
        Self {
            cooling_rate_c_per_hour: config.cooling_rate_c_per_hour,
            ambient_drift_per_hour: config.ambient_drift_per_hour,
            rated_power_w: config.hvac_rated_power_w,
            standby_power_w: config.hvac_standby_power_w,
        }
    }
}

impl ThermalModel for LinearThermalModel {
    fn temperature_delta(
        &self,
        room: &Room,
        sample: &TelemetrySample,
        state: HvacState,
        hours: f64,
    ) -> f64 {
        match state {
            HvacState::On => -self.cooling_rate_c_per_hour * hours,
            HvacState::Off => {
                self.ambient_drift_per_hour * (sample.outdoor_temp_c - room.temperature) * hours
            }
        }
    }

    fn power_draw_w(&self, state: HvacState) -> f64 {
        match state {
            HvacState::On => self.rated_power_w,
            HvacState::Off => self.standby_power_w,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hot_day() -> TelemetrySample {
        TelemetrySample {
            date: "2024-06-01 14:00".into(),
            power_kw: 55.0,
            outdoor_temp_c: 32.0,
            occupancy: 5,
        }
    }

    #[test]
    fn test_running_unit_cools_at_fixed_rate() {
        let model = LinearThermalModel::from_config(&TwinConfig::default());
        let room = Room::new("R1", "Meeting Room", 28.0);
        let delta = model.temperature_delta(&room, &hot_day(), HvacState::On, 0.25);
        assert!((delta + 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_idle_unit_drifts_toward_outdoor() {
        let model = LinearThermalModel::from_config(&TwinConfig::default());
        let room = Room::new("R1", "Meeting Room", 28.0);
        let delta = model.temperature_delta(&room, &hot_day(), HvacState::Off, 0.25);
        assert!((delta - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_power_by_state() {
        let model = LinearThermalModel::from_config(&TwinConfig::default());
        assert_eq!(model.power_draw_w(HvacState::On), 1500.0);
        assert_eq!(model.power_draw_w(HvacState::Off), 15.0);
    }
}
