//! Model store - the live set of rooms the simulation mutates
//!
//! Rooms are kept in a `BTreeMap` keyed by id so every pass over the model
//! (physics, reporting, validation) sees the same deterministic order.

pub mod loader;

pub use loader::{load_model_from_file, load_model_from_json, ModelDocument};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::error::LoadError;
use crate::core::types::{HvacState, RoomId};

/// A single room of the office
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    #[serde(default)]
    pub name: String,
    /// Indoor temperature (°C)
    pub temperature: f64,
    /// Current electrical draw of the room's HVAC unit (W)
    #[serde(default)]
    pub power_w: f64,
    /// HVAC energy consumed since the simulation started (Wh)
    #[serde(default)]
    pub energy_wh: f64,
    /// Occupants during the most recent tick
    #[serde(default)]
    pub occupancy: u32,
    /// Sum of occupancy over every tick so far
    #[serde(default)]
    pub cumulative_occupancy: u64,
    #[serde(default)]
    pub hvac: HvacState,
}

impl Room {
    pub fn new(id: impl Into<RoomId>, name: impl Into<String>, temperature: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            temperature,
            power_w: 0.0,
            energy_wh: 0.0,
            occupancy: 0,
            cumulative_occupancy: 0,
            hvac: HvacState::Off,
        }
    }

    /// Name to show in reports, falling back to the id
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            self.id.as_str()
        } else {
            &self.name
        }
    }
}

/// The live graph of rooms
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelStore {
    name: String,
    rooms: BTreeMap<RoomId, Room>,
}

impl ModelStore {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rooms: BTreeMap::new(),
        }
    }

    /// Build a store from a list of rooms, rejecting duplicate ids
    pub fn from_rooms(
        name: impl Into<String>,
        rooms: impl IntoIterator<Item = Room>,
    ) -> Result<Self, LoadError> {
        let mut store = Self::new(name);
        for room in rooms {
            if store.rooms.contains_key(&room.id) {
                return Err(LoadError::DuplicateRoom(room.id));
            }
            store.insert(room);
        }
        Ok(store)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Insert or replace a room
    pub fn insert(&mut self, room: Room) -> Option<Room> {
        self.rooms.insert(room.id.clone(), room)
    }

    pub fn get(&self, id: &RoomId) -> Option<&Room> {
        self.rooms.get(id)
    }

    pub fn get_mut(&mut self, id: &RoomId) -> Option<&mut Room> {
        self.rooms.get_mut(id)
    }

    pub fn contains(&self, id: &RoomId) -> bool {
        self.rooms.contains_key(id)
    }

    /// Rooms in id order
    pub fn rooms(&self) -> impl Iterator<Item = &Room> + '_ {
        self.rooms.values()
    }

    pub fn rooms_mut(&mut self) -> impl Iterator<Item = &mut Room> + '_ {
        self.rooms.values_mut()
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    /// Mean indoor temperature, or `None` for an empty model
    pub fn average_temperature(&self) -> Option<f64> {
        if self.rooms.is_empty() {
            return None;
        }
        let sum: f64 = self.rooms.values().map(|r| r.temperature).sum();
        Some(sum / self.rooms.len() as f64)
    }

    pub fn active_hvacs(&self) -> usize {
        self.rooms.values().filter(|r| r.hvac.is_on()).count()
    }

    pub fn total_power_w(&self) -> f64 {
        self.rooms.values().map(|r| r.power_w).sum()
    }
}
