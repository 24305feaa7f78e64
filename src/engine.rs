// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Delivery Economics Engine - Engine Facade
//
// Native side of the boundary operations. `lib.rs` wraps these `*_core`
// methods for the wasm/JS surface; the CLI and the integration tests call
// them directly.

use chrono::{DateTime, Utc};
use tracing::{error, info, info_span, warn};
use wasm_bindgen::prelude::*;

use crate::aggregator;
use crate::core_types::RunId;
use crate::error::EngineError;
use crate::params::EngineConfig;
use crate::performance;
use crate::simulation::OrderSimulator;
use crate::store::{DeliveryStore, InMemoryStore};
use crate::types::{
    DriverPerformanceReport, LoadReport, RoutePerformanceReport, RunSummary, SimulateRequest,
    SimulateResponse, SimulationRun, SkippedRecord, Snapshot, TrendReport,
};
use crate::validation::SimulationParams;

const RUN_ID_FORMAT: &str = "SIM_%Y%m%d_%H%M%S";

#[wasm_bindgen]
pub struct DeliveryEngine {
    store: InMemoryStore,
    config: EngineConfig,
}

impl DeliveryEngine {
    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            store: InMemoryStore::new(),
            config,
        }
    }

    pub fn store(&self) -> &InMemoryStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut InMemoryStore {
        &mut self.store
    }

    // ─── Reference data ──────────────────────────────────────────────────

    /// Load drivers, routes and orders. Existing ids, routes with a negative
    /// distance or zero base time, and orders pointing at an unknown route are
    /// skipped and reported; none of them fails the load.
    pub fn load_snapshot_core(&mut self, snapshot: Snapshot) -> LoadReport {
        let mut report = LoadReport::default();

        for route in snapshot.routes {
            let id = route.route_id.to_string();
            if route.distance_km.is_sign_negative() {
                report.skipped.push(skipped("route", id, "negative distance"));
            } else if route.base_time_min == 0 {
                report.skipped.push(skipped("route", id, "base time must be positive"));
            } else if self.store.insert_route(route) {
                report.routes += 1;
            } else {
                report.skipped.push(skipped("route", id, "already exists"));
            }
        }

        for record in snapshot.drivers {
            let name = record.name.clone();
            if self.store.insert_driver(record.into_driver()) {
                report.drivers += 1;
            } else {
                report.skipped.push(skipped("driver", name, "already exists"));
            }
        }

        for order in snapshot.orders {
            let id = order.order_id.to_string();
            if let Some(route_id) = &order.route_id {
                if self.store.get_route(route_id).is_none() {
                    warn!(order_id = %id, route_id = %route_id, "Order references unknown route, skipping");
                    report
                        .skipped
                        .push(skipped("order", id, &format!("unknown route {route_id}")));
                    continue;
                }
            }
            if self.store.insert_order(order) {
                report.orders += 1;
            } else {
                report.skipped.push(skipped("order", id, "already exists"));
            }
        }

        info!(
            drivers = report.drivers,
            routes = report.routes,
            orders = report.orders,
            skipped = report.skipped.len(),
            "Snapshot loaded"
        );
        report
    }

    // ─── Simulate ────────────────────────────────────────────────────────

    pub fn simulate_core(&mut self, request: &SimulateRequest) -> Result<SimulateResponse, EngineError> {
        self.simulate_at(request, Utc::now())
    }

    /// Run one simulation stamped with `now`.
    ///
    /// Parameters are validated before anything is read. The batch runs in
    /// one store transaction which is rolled back if any step fails.
    pub fn simulate_at(
        &mut self,
        request: &SimulateRequest,
        now: DateTime<Utc>,
    ) -> Result<SimulateResponse, EngineError> {
        let params = SimulationParams::parse(request)?;
        let run_id = self.next_run_id(now);

        let span = info_span!("simulation", run_id = %run_id);
        let _enter = span.enter();
        info!(
            num_drivers = params.num_drivers,
            max_hours_per_day = params.max_hours_per_day,
            start_time = %params.start_time,
            "Starting simulation"
        );

        self.store.begin().map_err(EngineError::simulation_failed)?;
        match self.run_in_transaction(&run_id, now, &params) {
            Ok(run) => {
                self.store.commit().map_err(EngineError::simulation_failed)?;
                info!(
                    total_profit = %run.total_profit,
                    efficiency = %run.efficiency_score,
                    orders = run.total_orders,
                    "Simulation complete"
                );
                Ok(SimulateResponse::from(&run))
            }
            Err(err) => {
                if let Err(rollback_err) = self.store.rollback() {
                    error!(error = %rollback_err, "Rollback failed");
                }
                error!(error = %err, "Simulation failed");
                Err(err)
            }
        }
    }

    fn run_in_transaction(
        &mut self,
        run_id: &RunId,
        now: DateTime<Utc>,
        params: &SimulationParams,
    ) -> Result<SimulationRun, EngineError> {
        let rates = &self.config.rates;
        let batch = OrderSimulator::new(rates)
            .run(&mut self.store, run_id, now, params)
            .map_err(EngineError::simulation_failed)?;
        let persisted = self.store.list_order_outcomes_for_run(run_id);
        let run = aggregator::aggregate_run(run_id.clone(), now, params, &batch, &persisted, rates);
        self.store
            .create_run_record(run)
            .map_err(EngineError::simulation_failed)
    }

    /// `SIM_<timestamp>`, suffixed `_2`, `_3`, ... when runs share a second.
    fn next_run_id(&self, now: DateTime<Utc>) -> RunId {
        let base = now.format(RUN_ID_FORMAT).to_string();
        let mut candidate = RunId::from(base.as_str());
        let mut n = 2;
        while self.store.get_run_by_id(&candidate).is_some() {
            candidate = RunId::from(format!("{base}_{n}"));
            n += 1;
        }
        candidate
    }

    // ─── Breakdowns ──────────────────────────────────────────────────────

    pub fn route_performance_core(&self, run_id: Option<&str>) -> Result<RoutePerformanceReport, EngineError> {
        let run = self.require_run(run_id)?;
        Ok(RoutePerformanceReport {
            route_performance: performance::route_performance(&self.store, &run),
            simulation_run: run,
        })
    }

    pub fn driver_performance_core(&self, run_id: Option<&str>) -> Result<DriverPerformanceReport, EngineError> {
        let run = self.require_run(run_id)?;
        Ok(DriverPerformanceReport {
            driver_performance: performance::driver_performance(&self.store, &run),
            simulation_run: run,
        })
    }

    fn require_run(&self, run_id: Option<&str>) -> Result<SimulationRun, EngineError> {
        // Only an absent or empty id is a bad request; anything else is looked up.
        let id = run_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| EngineError::BadRequest("run_id parameter is required".to_string()))?;
        self.store
            .get_run_by_id(&RunId::from(id))
            .ok_or_else(|| EngineError::NotFound("Simulation run not found".to_string()))
    }

    // ─── History ─────────────────────────────────────────────────────────

    pub fn trend_core(&self) -> TrendReport {
        let trend_data = self
            .store
            .list_runs()
            .iter()
            .take(self.config.trend_window)
            .map(RunSummary::from)
            .collect();
        TrendReport {
            trend_data,
            total_runs: self.store.count_runs(),
        }
    }

    pub fn list_runs_core(&self) -> Vec<SimulationRun> {
        self.store.list_runs()
    }
}

impl Default for DeliveryEngine {
    fn default() -> Self {
        Self::with_config(EngineConfig::default())
    }
}

fn skipped(kind: &str, id: String, reason: &str) -> SkippedRecord {
    SkippedRecord {
        kind: kind.to_string(),
        id,
        reason: reason.to_string(),
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
