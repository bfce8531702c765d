use thiserror::Error;

use crate::core::types::RoomId;

#[derive(Error, Debug)]
pub enum TwinError {
    #[error("Telemetry dataset is empty")]
    EmptyDataset,

    #[error("Engine not initialized: model and dataset must be loaded first")]
    NotInitialized,

    #[error("A tick is in progress")]
    TickInProgress,

    #[error("Invalid control action: {0} (expected ON, OFF or AUTO)")]
    InvalidAction(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Physics step failed for room {room}: {reason}")]
    Physics { room: RoomId, reason: String },

    #[error("Constraint evaluation failed: {0}")]
    Constraint(String),

    #[error("Lock poisoned: {0}")]
    Poisoned(&'static str),

    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TwinError>;

/// Errors raised while loading the model, dataset or configuration at startup
#[derive(Debug, Error)]
pub enum LoadError {
    /// JSON parsing failed
    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),
    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),
    /// A dataset row could not be parsed
    #[error("Dataset line {line}: {reason}")]
    MalformedRow { line: usize, reason: String },
    /// The dataset had a header but no samples
    #[error("Dataset {0} contains no samples")]
    EmptyDataset(String),
    /// Two rooms share the same identifier
    #[error("Duplicate room id in model: {0}")]
    DuplicateRoom(RoomId),
    /// The configuration failed its consistency checks
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    /// File I/O error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
