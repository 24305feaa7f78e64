// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Delivery Economics Engine

pub mod core_types;
pub mod types;
pub mod params;
pub mod cost_model;
pub mod validation;
pub mod simulation;
pub mod aggregator;
pub mod performance;
pub mod store;
pub mod error;
pub mod engine;

pub use core_types::{Money, OrderId, RouteId, RunId, TrafficLevel};
pub use engine::DeliveryEngine;
pub use error::EngineError;
pub use params::{CostRates, EngineConfig};
pub use store::{DeliveryStore, InMemoryStore, StoreError};
pub use types::*;

use serde::Serialize;
use wasm_bindgen::prelude::*;

/// Error payload thrown across the JS boundary.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
    status: u16,
}

fn to_js_error(err: EngineError) -> JsValue {
    let body = ErrorBody {
        status: err.status(),
        error: err.to_string(),
    };
    serde_wasm_bindgen::to_value(&body).unwrap_or_else(|_| JsValue::from_str(&body.error))
}

fn bad_input(err: impl std::fmt::Display) -> JsValue {
    to_js_error(EngineError::BadRequest(err.to_string()))
}

// ─── WASM Interface ──────────────────────────────────────────────────────────

#[wasm_bindgen]
impl DeliveryEngine {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        #[cfg(target_arch = "wasm32")]
        std::panic::set_hook(Box::new(console_error_panic_hook::hook));

        DeliveryEngine::default()
    }

    /// Build an engine from a JSON config document.
    pub fn from_config_json(json: &str) -> Result<DeliveryEngine, JsValue> {
        let config = EngineConfig::from_json_str(json).map_err(bad_input)?;
        Ok(DeliveryEngine::with_config(config))
    }

    pub fn load_snapshot(&mut self, snapshot: JsValue) -> Result<JsValue, JsValue> {
        let snapshot: Snapshot = serde_wasm_bindgen::from_value(snapshot).map_err(bad_input)?;
        let report = self.load_snapshot_core(snapshot);
        Ok(serde_wasm_bindgen::to_value(&report).unwrap_or(JsValue::NULL))
    }

    pub fn simulate(&mut self, request: JsValue) -> Result<JsValue, JsValue> {
        let request: SimulateRequest = serde_wasm_bindgen::from_value(request).map_err(bad_input)?;
        let response = self.simulate_core(&request).map_err(to_js_error)?;
        Ok(serde_wasm_bindgen::to_value(&response).unwrap_or(JsValue::NULL))
    }

    pub fn route_performance(&self, run_id: Option<String>) -> Result<JsValue, JsValue> {
        let report = self
            .route_performance_core(run_id.as_deref())
            .map_err(to_js_error)?;
        Ok(serde_wasm_bindgen::to_value(&report).unwrap_or(JsValue::NULL))
    }

    pub fn driver_performance(&self, run_id: Option<String>) -> Result<JsValue, JsValue> {
        let report = self
            .driver_performance_core(run_id.as_deref())
            .map_err(to_js_error)?;
        Ok(serde_wasm_bindgen::to_value(&report).unwrap_or(JsValue::NULL))
    }

    pub fn trend(&self) -> JsValue {
        serde_wasm_bindgen::to_value(&self.trend_core()).unwrap_or(JsValue::NULL)
    }

    pub fn list_runs(&self) -> JsValue {
        serde_wasm_bindgen::to_value(&self.list_runs_core()).unwrap_or(JsValue::NULL)
    }

    pub fn run_count(&self) -> usize {
        self.store().count_runs()
    }
}
