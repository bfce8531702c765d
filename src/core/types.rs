//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier for a room in the office model
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub String);

impl RoomId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoomId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for RoomId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Simulation tick counter
pub type Tick = u64;

/// Effective state of a room's HVAC unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HvacState {
    On,
    #[default]
    Off,
}

impl HvacState {
    pub fn is_on(self) -> bool {
        matches!(self, Self::On)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::On => "ON",
            Self::Off => "OFF",
        }
    }
}

impl fmt::Display for HvacState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Directive resolved for a room before the physics step runs
///
/// `Auto` is never stored; it is what the override table reports for rooms
/// without an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Directive {
    ForceOn,
    ForceOff,
    #[default]
    Auto,
}

impl Directive {
    /// The state this directive forces, if any
    pub fn forced_state(self) -> Option<HvacState> {
        match self {
            Self::ForceOn => Some(HvacState::On),
            Self::ForceOff => Some(HvacState::Off),
            Self::Auto => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::ForceOn => "FORCE_ON",
            Self::ForceOff => "FORCE_OFF",
            Self::Auto => "AUTO",
        }
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
