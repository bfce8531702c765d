//! Built-in office constraints and config-driven threshold rules

use std::collections::BTreeMap;

use super::{Constraint, ConstraintSet};
use crate::core::config::{RoomAttribute, ThresholdRule, TwinConfig};
use crate::model::{ModelStore, Room};

/// Standard constraint set followed by any `[[constraints]]` from config
///
/// Order: model not empty, rooms named, names unique, safety ceiling,
/// safety floor, non-negative power/energy, then configured thresholds.
pub fn builtin_constraints(config: &TwinConfig) -> ConstraintSet {
    let ceiling = config.safety_ceiling_c;
    let floor = config.safety_floor_c;

    let mut set = ConstraintSet::new(config.validation_source.clone());

    set.register(Constraint::per_model(
        "ModelHasRooms",
        |store| Ok(!store.is_empty()),
        |store| format!("Model {} contains no rooms", store.name()),
    ))
    .register(Constraint::per_room(
        "RoomHasName",
        |room| Ok(!room.name.trim().is_empty()),
        |room| format!("Room {} has no display name", room.id),
    ))
    .register(Constraint::per_model(
        "UniqueRoomNames",
        |store| Ok(duplicate_names(store).is_empty()),
        |store| format!("Room names used more than once: {}", duplicate_names(store).join(", ")),
    ))
    .register(Constraint::per_room(
        "TemperatureBelowSafetyCeiling",
        move |room| Ok(room.temperature <= ceiling),
        move |room| {
            format!(
                "Room {} is at {:.2}°C, above the safety ceiling of {:.1}°C",
                room.id, room.temperature, ceiling
            )
        },
    ))
    .register(Constraint::per_room(
        "TemperatureAboveSafetyFloor",
        move |room| Ok(room.temperature >= floor),
        move |room| {
            format!(
                "Room {} is at {:.2}°C, below the safety floor of {:.1}°C",
                room.id, room.temperature, floor
            )
        },
    ))
    .register(Constraint::per_room(
        "NonNegativePower",
        |room| Ok(room.power_w >= 0.0 && room.energy_wh >= 0.0),
        |room| {
            format!(
                "Room {} reports negative power ({} W) or energy ({} Wh)",
                room.id, room.power_w, room.energy_wh
            )
        },
    ));

    for rule in &config.constraints {
        set.register(threshold_constraint(rule.clone()));
    }

    set
}

/// Build a per-room constraint from a threshold rule
///
/// The message template may use `{id}`, `{name}`, `{attribute}`, `{value}`
/// and `{limit}`.
pub fn threshold_constraint(rule: ThresholdRule) -> Constraint {
    let check_rule = rule.clone();
    let name = rule.name.clone();

    Constraint::per_room(
        name,
        move |room| Ok(check_rule.holds(attribute_value(room, check_rule.attribute))),
        move |room| render_template(&rule, room),
    )
}

/// Non-empty names carried by more than one room, sorted
fn duplicate_names(store: &ModelStore) -> Vec<String> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for room in store.rooms() {
        let name = room.name.trim();
        if !name.is_empty() {
            *counts.entry(name).or_default() += 1;
        }
    }
    counts
        .into_iter()
        .filter(|(_, n)| *n > 1)
        .map(|(name, _)| name.to_string())
        .collect()
}

fn attribute_value(room: &Room, attribute: RoomAttribute) -> f64 {
    match attribute {
        RoomAttribute::Temperature => room.temperature,
        RoomAttribute::Power => room.power_w,
        RoomAttribute::Energy => room.energy_wh,
        RoomAttribute::Occupancy => f64::from(room.occupancy),
    }
}

fn render_template(rule: &ThresholdRule, room: &Room) -> String {
    let value = attribute_value(room, rule.attribute);
    rule.message
        .replace("{id}", room.id.as_str())
        .replace("{name}", room.display_name())
        .replace("{attribute}", rule.attribute.label())
        .replace("{value}", &format!("{:.2}", value))
        .replace("{limit}", &format!("{:.2}", rule.limit))
}
