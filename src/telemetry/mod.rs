//! Historical telemetry and the cyclic cursor that replays it
//!
//! The dataset is loaded once and shared read-only; the cursor only moves an
//! index over it. When the index runs off the end it wraps to 0 and the
//! simulation replays the same sequence.

pub mod dataset;

pub use dataset::{load_dataset_from_file, parse_dataset};

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::core::error::{Result, TwinError};

/// One row of the historical dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySample {
    /// Timestamp label as it appears in the source file
    pub date: String,
    /// Building-wide power consumption reading (kW)
    pub power_kw: f64,
    /// Outdoor air temperature (°C)
    pub outdoor_temp_c: f64,
    /// Building-wide occupancy count
    pub occupancy: u32,
}

/// Cyclic read-only pointer into the dataset
#[derive(Debug, Clone)]
pub struct TelemetryCursor {
    samples: Arc<[TelemetrySample]>,
    index: usize,
    last_consumed: Option<usize>,
    restarts: u64,
}

impl TelemetryCursor {
    pub fn new(samples: impl Into<Arc<[TelemetrySample]>>) -> Self {
        Self {
            samples: samples.into(),
            index: 0,
            last_consumed: None,
            restarts: 0,
        }
    }

    /// Sample the next tick will consume
    pub fn current(&self) -> Result<&TelemetrySample> {
        self.samples.get(self.index).ok_or(TwinError::EmptyDataset)
    }

    /// Move past the current sample
    ///
    /// Returns `true` when the cursor wrapped back to the first sample.
    pub fn advance(&mut self) -> bool {
        if self.samples.is_empty() {
            return false;
        }

        self.last_consumed = Some(self.index);
        self.index += 1;

        if self.index >= self.samples.len() {
            self.index = 0;
            self.restarts += 1;
            tracing::info!(
                "End of dataset after {} samples, restarting simulation (restart #{})",
                self.samples.len(),
                self.restarts
            );
            return true;
        }
        false
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Index of the sample consumed by the most recent tick
    pub fn last_consumed_index(&self) -> Option<usize> {
        self.last_consumed
    }

    /// Sample status reports describe: the last consumed one, or the first
    /// sample before any tick has run
    pub fn report_sample(&self) -> Option<&TelemetrySample> {
        self.samples.get(self.last_consumed.unwrap_or(0))
    }

    /// How many times the dataset has wrapped
    pub fn restarts(&self) -> u64 {
        self.restarts
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
