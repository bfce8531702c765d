//! Manual HVAC overrides
//!
//! Operators force a room ON or OFF; clearing the entry hands the room back
//! to the automatic policy. The tick never reads the live table directly: it
//! takes an [`OverrideSnapshot`] once at tick start, so a write that lands
//! mid-tick applies from the next tick on.

use ahash::AHashMap;
use std::str::FromStr;
use std::sync::RwLock;

use crate::core::error::{Result, TwinError};
use crate::core::types::{Directive, RoomId};

/// Action string accepted by the control interface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlAction {
    On,
    Off,
    Auto,
}

impl ControlAction {
    pub fn directive(self) -> Directive {
        match self {
            Self::On => Directive::ForceOn,
            Self::Off => Directive::ForceOff,
            Self::Auto => Directive::Auto,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::On => "ON",
            Self::Off => "OFF",
            Self::Auto => "AUTO",
        }
    }
}

impl FromStr for ControlAction {
    type Err = TwinError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ON" => Ok(Self::On),
            "OFF" => Ok(Self::Off),
            "AUTO" => Ok(Self::Auto),
            _ => Err(TwinError::InvalidAction(s.to_string())),
        }
    }
}

/// Room id -> forced directive, shared between control callers and the tick
#[derive(Debug, Default)]
pub struct OverrideTable {
    entries: RwLock<AHashMap<RoomId, Directive>>,
}

impl OverrideTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Force a directive for a room
    ///
    /// `Directive::Auto` clears the entry. Unknown rooms are accepted; the
    /// entry simply never matches until such a room exists.
    pub fn set(&self, room: RoomId, directive: Directive) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| TwinError::Poisoned("override table"))?;
        match directive {
            Directive::Auto => {
                entries.remove(&room);
            }
            forced => {
                entries.insert(room, forced);
            }
        }
        Ok(())
    }

    /// Return a room to automatic control
    pub fn clear(&self, room: &RoomId) -> Result<()> {
        self.entries
            .write()
            .map_err(|_| TwinError::Poisoned("override table"))?
            .remove(room);
        Ok(())
    }

    /// Stored directive for a room, `Auto` when none is set
    pub fn resolve(&self, room: &RoomId) -> Result<Directive> {
        let entries = self
            .entries
            .read()
            .map_err(|_| TwinError::Poisoned("override table"))?;
        Ok(entries.get(room).copied().unwrap_or_default())
    }

    /// Parse a control string and apply it
    ///
    /// Returns the acknowledgement sent back to the caller.
    pub fn apply_action(&self, room: &str, action: &str) -> Result<String> {
        let action: ControlAction = action.parse()?;
        tracing::info!("Command received: set {} to {}", room, action.label());
        self.set(RoomId::from(room), action.directive())?;
        Ok(format!("Command sent: {} -> {}", room, action.label()))
    }

    /// Copy of the table taken at tick start
    pub fn snapshot(&self) -> Result<OverrideSnapshot> {
        let entries = self
            .entries
            .read()
            .map_err(|_| TwinError::Poisoned("override table"))?;
        Ok(OverrideSnapshot {
            entries: entries.clone(),
        })
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Frozen view of the override table for one tick
#[derive(Debug, Clone, Default)]
pub struct OverrideSnapshot {
    entries: AHashMap<RoomId, Directive>,
}

impl OverrideSnapshot {
    pub fn resolve(&self, room: &RoomId) -> Directive {
        self.entries.get(room).copied().unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(RoomId, Directive)> for OverrideSnapshot {
    fn from_iter<I: IntoIterator<Item = (RoomId, Directive)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .filter(|(_, d)| *d != Directive::Auto)
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_room_resolves_auto() {
        let table = OverrideTable::new();
        assert_eq!(table.resolve(&RoomId::from("R1")).unwrap(), Directive::Auto);
    }

    #[test]
    fn test_set_then_clear() {
        let table = OverrideTable::new();
        let r1 = RoomId::from("R1");

        table.set(r1.clone(), Directive::ForceOff).unwrap();
        assert_eq!(table.resolve(&r1).unwrap(), Directive::ForceOff);

        table.clear(&r1).unwrap();
        assert_eq!(table.resolve(&r1).unwrap(), Directive::Auto);
        assert!(table.is_empty());
    }

    #[test]
    fn test_auto_directive_removes_entry() {
        let table = OverrideTable::new();
        let r1 = RoomId::from("R1");
        table.set(r1.clone(), Directive::ForceOn).unwrap();
        table.set(r1.clone(), Directive::Auto).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn test_apply_action_parses_strings() {
        let table = OverrideTable::new();
        let ack = table.apply_action("R2", "on").unwrap();
        assert_eq!(ack, "Command sent: R2 -> ON");
        assert_eq!(table.resolve(&RoomId::from("R2")).unwrap(), Directive::ForceOn);

        table.apply_action("R2", "AUTO").unwrap();
        assert_eq!(table.resolve(&RoomId::from("R2")).unwrap(), Directive::Auto);
    }

    #[test]
    fn test_unknown_action_rejected() {
        let table = OverrideTable::new();
        let result = table.apply_action("R1", "TURBO");
        assert!(matches!(result, Err(TwinError::InvalidAction(a)) if a == "TURBO"));
        assert!(table.is_empty());
    }

    #[test]
    fn test_unknown_room_accepted() {
        let table = OverrideTable::new();
        assert!(table.apply_action("NOT-A-ROOM", "OFF").is_ok());
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_snapshot_is_isolated_from_later_writes() {
        let table = OverrideTable::new();
        let r1 = RoomId::from("R1");
        table.set(r1.clone(), Directive::ForceOff).unwrap();

        let snapshot = table.snapshot().unwrap();
        table.clear(&r1).unwrap();

        assert_eq!(snapshot.resolve(&r1), Directive::ForceOff);
        assert_eq!(table.resolve(&r1).unwrap(), Directive::Auto);
    }
}
