// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Delivery Economics Engine - Type Definitions

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core_types::{Money, OrderId, RouteId, RunId, TrafficLevel};

// ─── Route ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub route_id: RouteId,
    pub distance_km: Decimal,
    /// Free text as loaded; see [`TrafficLevel::classify`].
    pub traffic_level: String,
    pub base_time_min: u32,
}

impl Route {
    pub fn traffic(&self) -> TrafficLevel {
        TrafficLevel::classify(&self.traffic_level)
    }
}

// ─── Order ───────────────────────────────────────────────────────────────────

/// Reference data for one order. Runs never mutate it; results are kept in
/// [`OrderOutcome`] records instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: OrderId,
    pub value: Money,
    /// Weak reference: cleared when the route is removed.
    #[serde(default)]
    pub route_id: Option<RouteId>,
}

// ─── Driver ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Driver {
    pub name: String,
    pub current_shift_hours: Decimal,
    pub past_7_day_work_hours: Decimal,
}

/// Driver as it appears in a snapshot: either a precomputed weekly total or
/// the per-day hours log it is summed from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverRecord {
    pub name: String,
    #[serde(default)]
    pub shift_hours: Decimal,
    #[serde(default)]
    pub past_week_hours: Vec<Decimal>,
    #[serde(default)]
    pub past_7_day_work_hours: Option<Decimal>,
}

impl DriverRecord {
    pub fn into_driver(self) -> Driver {
        let weekly = self
            .past_7_day_work_hours
            .unwrap_or_else(|| self.past_week_hours.iter().copied().sum());
        Driver {
            name: self.name,
            current_shift_hours: self.shift_hours,
            past_7_day_work_hours: weekly,
        }
    }
}

// ─── OrderOutcome ────────────────────────────────────────────────────────────

/// Immutable result of pricing one order in one run, keyed by
/// `(order_id, run_id)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderOutcome {
    pub order_id: OrderId,
    pub run_id: RunId,
    /// Route the outcome was computed against. Resolved again at read time,
    /// so a route removed later reads as absent.
    pub route_id: Option<RouteId>,
    pub value: Money,
    pub is_late: bool,
    pub penalty: Money,
    pub bonus: Money,
    pub fuel_cost: Money,
    pub profit: Money,
    pub delivery_timestamp: Option<DateTime<Utc>>,
    /// Timestamp of the run that produced this outcome.
    pub simulation_run_at: DateTime<Utc>,
}

// ─── SimulationRun ───────────────────────────────────────────────────────────

/// Aggregated KPI record for one run. Created once, never updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationRun {
    pub run_id: RunId,
    pub timestamp: DateTime<Utc>,
    pub num_drivers: u32,
    pub start_time: DateTime<Utc>,
    pub max_hours_per_day: u32,
    pub total_profit: Money,
    pub efficiency_score: Decimal,
    pub on_time_deliveries: u32,
    pub late_deliveries: u32,
    pub total_fuel_cost: Money,
    pub total_orders: u32,
    pub avg_delivery_time: Decimal,
    pub high_value_orders: u32,
    /// Snapshot orders skipped because they had no route.
    #[serde(default)]
    pub unrouted_orders: u32,
    /// Orders whose outcome could not be written; their profit is still in
    /// the totals above.
    #[serde(default)]
    pub unsaved_orders: Vec<OrderId>,
}

// ─── Boundary: simulate ──────────────────────────────────────────────────────

/// Raw simulate input. Numeric fields stay untyped until validation so that
/// integer strings are accepted and everything else is reported precisely.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimulateRequest {
    #[serde(default)]
    pub num_drivers: Option<serde_json::Value>,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub max_hours_per_day: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulateResponse {
    pub total_profit: Money,
    pub efficiency_score: Decimal,
    pub on_time_deliveries: u32,
    pub late_deliveries: u32,
    pub fuel_cost_breakdown: Money,
    pub run_id: RunId,
}

impl From<&SimulationRun> for SimulateResponse {
    fn from(run: &SimulationRun) -> Self {
        Self {
            total_profit: run.total_profit,
            efficiency_score: run.efficiency_score,
            on_time_deliveries: run.on_time_deliveries,
            late_deliveries: run.late_deliveries,
            fuel_cost_breakdown: run.total_fuel_cost,
            run_id: run.run_id.clone(),
        }
    }
}

// ─── Boundary: performance breakdowns ────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutePerformance {
    pub route_id: RouteId,
    pub total_orders: u32,
    pub on_time_orders: u32,
    pub late_orders: u32,
    pub efficiency_score: Decimal,
    pub total_profit: Money,
    pub avg_delivery_time: Decimal,
    pub distance_km: Decimal,
    pub traffic_level: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverPerformance {
    pub driver_name: String,
    pub total_orders: u32,
    pub on_time_orders: u32,
    pub late_orders: u32,
    pub efficiency_score: Decimal,
    pub total_profit: Money,
    pub avg_delivery_time: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutePerformanceReport {
    pub route_performance: Vec<RoutePerformance>,
    pub simulation_run: SimulationRun,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverPerformanceReport {
    pub driver_performance: Vec<DriverPerformance>,
    pub simulation_run: SimulationRun,
}

// ─── Boundary: historical trend ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub timestamp: DateTime<Utc>,
    pub run_id: RunId,
    pub total_profit: Money,
    pub efficiency_score: Decimal,
    pub on_time_deliveries: u32,
    pub late_deliveries: u32,
    pub total_fuel_cost: Money,
    pub total_orders: u32,
    pub avg_delivery_time: Decimal,
    pub high_value_orders: u32,
}

impl From<&SimulationRun> for RunSummary {
    fn from(run: &SimulationRun) -> Self {
        Self {
            timestamp: run.timestamp,
            run_id: run.run_id.clone(),
            total_profit: run.total_profit,
            efficiency_score: run.efficiency_score,
            on_time_deliveries: run.on_time_deliveries,
            late_deliveries: run.late_deliveries,
            total_fuel_cost: run.total_fuel_cost,
            total_orders: run.total_orders,
            avg_delivery_time: run.avg_delivery_time,
            high_value_orders: run.high_value_orders,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendReport {
    pub trend_data: Vec<RunSummary>,
    pub total_runs: usize,
}

// ─── Boundary: reference data load ───────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub drivers: Vec<DriverRecord>,
    #[serde(default)]
    pub routes: Vec<Route>,
    #[serde(default)]
    pub orders: Vec<Order>,
}

/// A snapshot entry that was not loaded, and why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedRecord {
    pub kind: String,
    pub id: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoadReport {
    pub drivers: usize,
    pub routes: usize,
    pub orders: usize,
    pub skipped: Vec<SkippedRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn driver_week_is_summed_from_daily_log() {
        let record = DriverRecord {
            name: "Amit".to_string(),
            shift_hours: dec!(6),
            past_week_hours: vec![dec!(6), dec!(8), dec!(7), dec!(7), dec!(7), dec!(6), dec!(10)],
            past_7_day_work_hours: None,
        };
        let driver = record.into_driver();
        assert_eq!(driver.past_7_day_work_hours, dec!(51));
        assert_eq!(driver.current_shift_hours, dec!(6));
    }

    #[test]
    fn explicit_weekly_total_wins() {
        let record = DriverRecord {
            name: "Priya".to_string(),
            shift_hours: dec!(8),
            past_week_hours: vec![dec!(1)],
            past_7_day_work_hours: Some(dec!(40)),
        };
        assert_eq!(record.into_driver().past_7_day_work_hours, dec!(40));
    }

    #[test]
    fn order_without_route_deserializes() {
        let order: Order = serde_json::from_str(r#"{"order_id": "O9", "value": "250"}"#)
            .expect("test: order parses");
        assert!(order.route_id.is_none());
        assert_eq!(order.value, Money(dec!(250)));
    }
}
