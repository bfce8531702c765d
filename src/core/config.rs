//! Twin configuration with documented constants
//!
//! Every tunable number of the simulation lives here. Values can be
//! overridden from a TOML file; anything missing falls back to the defaults.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::core::error::LoadError;

/// Configuration for the twin engine
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TwinConfig {
    // === COMFORT POLICY ===
    /// Target indoor temperature (°C) for the automatic policy
    pub comfort_setpoint_c: f64,

    /// Half-width of the comfort band around the setpoint (°C)
    ///
    /// Unoccupied rooms only cool once they are hotter than
    /// setpoint + tolerance. Occupied rooms react to leaving the band
    /// in either direction.
    pub comfort_tolerance_c: f64,

    // === TIME ===
    /// Simulated hours that pass per tick
    ///
    /// One dataset row represents 15 minutes, so the default is 0.25.
    pub time_step_hours: f64,

    /// Wall-clock period between scheduled ticks (milliseconds)
    pub tick_period_ms: u64,

    // === THERMAL MODEL ===
    /// Temperature drop per simulated hour while the HVAC runs (°C/h)
    pub cooling_rate_c_per_hour: f64,

    /// Fraction of the indoor/outdoor difference recovered per hour with the HVAC off
    ///
    /// At 0.1 a room 8°C below ambient warms by 0.8°C/h.
    pub ambient_drift_per_hour: f64,

    // === POWER ===
    /// Electrical draw of one running HVAC unit (W)
    pub hvac_rated_power_w: f64,

    /// Electrical draw of an idle HVAC unit (W)
    pub hvac_standby_power_w: f64,

    // === VALIDATION ===
    /// Highest temperature a room may reach before validation fails (°C)
    pub safety_ceiling_c: f64,

    /// Lowest temperature a room may reach before validation fails (°C)
    pub safety_floor_c: f64,

    /// Name printed in the validation report header
    pub validation_source: String,

    /// Extra threshold constraints registered after the built-in set
    pub constraints: Vec<ThresholdRule>,
}

impl Default for TwinConfig {
    fn default() -> Self {
        Self {
            comfort_setpoint_c: 24.0,
            comfort_tolerance_c: 1.0,

            time_step_hours: 0.25,
            tick_period_ms: 5000,

            cooling_rate_c_per_hour: 2.0,
            ambient_drift_per_hour: 0.1,

            hvac_rated_power_w: 1500.0,
            hvac_standby_power_w: 15.0,

            safety_ceiling_c: 35.0,
            safety_floor_c: 10.0,
            validation_source: "smart-office.constraints".to_string(),
            constraints: Vec::new(),
        }
    }
}

impl TwinConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config from TOML text and check it
    pub fn from_toml_str(content: &str) -> Result<Self, LoadError> {
        let config: TwinConfig = toml::from_str(content)?;
        config.validate().map_err(LoadError::InvalidConfig)?;
        Ok(config)
    }

    /// Load a config from a TOML file on disk
    pub fn from_file(path: &Path) -> Result<Self, LoadError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_period_ms)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<(), String> {
        if self.comfort_tolerance_c <= 0.0 {
            return Err(format!(
                "comfort_tolerance_c ({}) must be positive",
                self.comfort_tolerance_c
            ));
        }

        if self.time_step_hours <= 0.0 {
            return Err(format!(
                "time_step_hours ({}) must be positive",
                self.time_step_hours
            ));
        }

        if self.tick_period_ms == 0 {
            return Err("tick_period_ms must be non-zero".into());
        }

        if self.cooling_rate_c_per_hour < 0.0 || self.ambient_drift_per_hour < 0.0 {
            return Err("Thermal rates must not be negative".into());
        }

        if self.hvac_standby_power_w < 0.0 || self.hvac_rated_power_w < self.hvac_standby_power_w {
            return Err(format!(
                "hvac_rated_power_w ({}) must be >= hvac_standby_power_w ({}) >= 0",
                self.hvac_rated_power_w, self.hvac_standby_power_w
            ));
        }

        if self.safety_floor_c >= self.safety_ceiling_c {
            return Err(format!(
                "safety_floor_c ({}) should be < safety_ceiling_c ({})",
                self.safety_floor_c, self.safety_ceiling_c
            ));
        }

        for rule in &self.constraints {
            if rule.name.trim().is_empty() {
                return Err("Threshold constraints need a name".into());
            }
        }

        Ok(())
    }
}

/// Room attribute a threshold constraint inspects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomAttribute {
    Temperature,
    Power,
    Energy,
    Occupancy,
}

impl RoomAttribute {
    pub fn label(self) -> &'static str {
        match self {
            Self::Temperature => "temperature",
            Self::Power => "power",
            Self::Energy => "energy",
            Self::Occupancy => "occupancy",
        }
    }
}

/// Direction of a threshold comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bound {
    AtMost,
    AtLeast,
}

/// A single threshold constraint loaded from TOML
///
/// ```toml
/// [[constraints]]
/// name = "PowerBudget"
/// attribute = "power"
/// bound = "at_most"
/// limit = 2000.0
/// message = "Room {id} draws {value} W, budget is {limit} W"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdRule {
    pub name: String,
    pub attribute: RoomAttribute,
    pub bound: Bound,
    pub limit: f64,
    pub message: String,
}

impl ThresholdRule {
    /// Whether a value satisfies this rule
    pub fn holds(&self, value: f64) -> bool {
        match self.bound {
            Bound::AtMost => value <= self.limit,
            Bound::AtLeast => value >= self.limit,
        }
    }
}
