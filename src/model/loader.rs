//! Load the office model from a JSON document
//!
//! ```json
//! {
//!   "name": "SmartOffice",
//!   "rooms": [
//!     { "id": "R1", "name": "Meeting Room", "temperature": 24.5 }
//!   ]
//! }
//! ```
//!
//! Attributes other than `id` and `temperature` are optional and start at
//! zero / `OFF`.

use serde::Deserialize;
use std::path::Path;

use super::{ModelStore, Room};
use crate::core::error::LoadError;

fn default_model_name() -> String {
    "SmartOffice".to_string()
}

/// On-disk shape of a model file
#[derive(Debug, Deserialize)]
pub struct ModelDocument {
    #[serde(default = "default_model_name")]
    pub name: String,
    pub rooms: Vec<Room>,
}

/// Load a model from a JSON string
pub fn load_model_from_json(json: &str) -> Result<ModelStore, LoadError> {
    let document: ModelDocument = serde_json::from_str(json)?;
    let store = ModelStore::from_rooms(document.name, document.rooms)?;
    tracing::info!("Loaded model '{}' with {} rooms", store.name(), store.len());
    Ok(store)
}

/// Load a model from a JSON file on disk
pub fn load_model_from_file(path: &Path) -> Result<ModelStore, LoadError> {
    let content = std::fs::read_to_string(path)?;
    load_model_from_json(&content)
}
