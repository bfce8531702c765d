//! Status and dashboard projections of the model
//!
//! Both outputs are pure functions of a [`ReportView`]: the current store, the
//! telemetry sample most recently consumed and the override snapshot. The
//! dashboard JSON keeps the field names the browser client polls
//! (`timestamp`, `power.real`, `comfort.avgTemp`, `rooms[].temp`, ...).

use serde::Serialize;
use std::fmt::Write;

use crate::control::OverrideSnapshot;
use crate::core::error::Result;
use crate::core::types::{Directive, HvacState, Tick};
use crate::model::ModelStore;
use crate::telemetry::TelemetrySample;

/// Everything a status or dashboard render reads
#[derive(Debug, Clone, Copy)]
pub struct ReportView<'a> {
    pub store: &'a ModelStore,
    pub sample: Option<&'a TelemetrySample>,
    /// Dataset index of `sample`
    pub step: usize,
    pub ticks: Tick,
    pub overrides: &'a OverrideSnapshot,
}

/// Text and JSON renderings of the same view
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub text: String,
    pub json: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub model: String,
    pub timestamp: Option<String>,
    pub step: usize,
    pub ticks: Tick,
    pub power: PowerSummary,
    pub comfort: ComfortSummary,
    pub weather: WeatherSummary,
    pub occupancy: u32,
    pub rooms: Vec<RoomView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PowerSummary {
    /// Building reading from telemetry (kW)
    pub real: f64,
    /// Sum of simulated HVAC draw (kW)
    pub simulated: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComfortSummary {
    pub avg_temp: Option<f64>,
    pub active_hvacs: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherSummary {
    pub outdoor_temp: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoomView {
    pub id: String,
    pub name: String,
    pub temp: f64,
    pub hvac: HvacState,
    /// Current draw (W)
    pub power: f64,
    pub mode: Directive,
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Project the view into the dashboard structure
pub fn build_dashboard(view: &ReportView<'_>) -> Dashboard {
    let rooms = view
        .store
        .rooms()
        .map(|room| RoomView {
            id: room.id.to_string(),
            name: room.display_name().to_string(),
            temp: round_to(room.temperature, 2),
            hvac: room.hvac,
            power: round_to(room.power_w, 1),
            mode: view.overrides.resolve(&room.id),
        })
        .collect();

    Dashboard {
        model: view.store.name().to_string(),
        timestamp: view.sample.map(|s| s.date.clone()),
        step: view.step,
        ticks: view.ticks,
        power: PowerSummary {
            real: view.sample.map(|s| round_to(s.power_kw, 3)).unwrap_or(0.0),
            simulated: round_to(view.store.total_power_w() / 1000.0, 3),
        },
        comfort: ComfortSummary {
            avg_temp: view.store.average_temperature().map(|t| round_to(t, 2)),
            active_hvacs: view.store.active_hvacs(),
        },
        weather: WeatherSummary {
            outdoor_temp: view.sample.map(|s| s.outdoor_temp_c),
        },
        occupancy: view.sample.map(|s| s.occupancy).unwrap_or(0),
        rooms,
    }
}

/// Dashboard as a JSON string
pub fn render_dashboard(view: &ReportView<'_>) -> Result<String> {
    Ok(serde_json::to_string(&build_dashboard(view))?)
}

/// JSON body returned in place of a dashboard when something went wrong
pub fn error_json(message: &str) -> String {
    serde_json::json!({ "error": message }).to_string()
}

/// Human-readable status block
pub fn render_status(view: &ReportView<'_>) -> String {
    let mut out = String::new();
    let store = view.store;

    let _ = writeln!(out, "=== {} STATUS ===", store.name().to_uppercase());
    match view.sample {
        Some(sample) => {
            let _ = writeln!(
                out,
                "Step {} | Date: {} | Outdoor: {:.1}°C | Building power: {:.2} kW | Occupancy: {}",
                view.step, sample.date, sample.outdoor_temp_c, sample.power_kw, sample.occupancy
            );
        }
        None => {
            let _ = writeln!(out, "Step {} | No telemetry available", view.step);
        }
    }

    let avg = store
        .average_temperature()
        .map(|t| format!("{:.2}°C", t))
        .unwrap_or_else(|| "n/a".to_string());
    let _ = writeln!(
        out,
        "Ticks completed: {} | Active HVACs: {}/{} | Avg temp: {} | HVAC draw: {:.0} W",
        view.ticks,
        store.active_hvacs(),
        store.len(),
        avg,
        store.total_power_w()
    );

    for room in store.rooms() {
        let _ = writeln!(
            out,
            "  {:<4} {:<16} {:>6.2}°C  HVAC {:<3} {:>6.0} W  {:>9.1} Wh  [{}]",
            room.id.as_str(),
            room.display_name(),
            room.temperature,
            room.hvac.label(),
            room.power_w,
            room.energy_wh,
            view.overrides.resolve(&room.id)
        );
    }
    out
}

/// Build both renderings
pub fn snapshot(view: &ReportView<'_>) -> Result<Snapshot> {
    Ok(Snapshot {
        text: render_status(view),
        json: render_dashboard(view)?,
    })
}
