pub mod config;
pub mod error;
pub mod types;

pub use config::{Bound, RoomAttribute, ThresholdRule, TwinConfig};
pub use error::{LoadError, Result, TwinError};
pub use types::{Directive, HvacState, RoomId, Tick};
