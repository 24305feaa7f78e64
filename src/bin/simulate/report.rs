// Run report: console tables plus the JSON written to simulation-results/

use std::path::{Path, PathBuf};

use serde::Serialize;

use delivery_engine::{
    DriverPerformance, LoadReport, RoutePerformance, SimulateResponse, SimulationRun,
};

pub const RESULTS_DIR: &str = "simulation-results";

#[derive(Debug, Serialize)]
pub struct RunReport {
    pub load: LoadReport,
    pub response: SimulateResponse,
    pub simulation_run: SimulationRun,
    pub route_performance: Vec<RoutePerformance>,
    pub driver_performance: Vec<DriverPerformance>,
}

impl RunReport {
    pub fn write_json(&self, dir: &Path) -> std::io::Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(format!("{}.json", self.simulation_run.run_id));
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(&path, json)?;
        Ok(path)
    }
}

pub fn print_summary(report: &RunReport) {
    let run = &report.simulation_run;
    println!("\n  Run {}", run.run_id);
    println!("  {}", "-".repeat(60));
    println!("  Total profit:        {:>12}", report.response.total_profit);
    println!("  Fuel cost:           {:>12}", report.response.fuel_cost_breakdown);
    println!("  Efficiency score:    {:>11}%", report.response.efficiency_score);
    println!("  On time / late:      {:>5} / {:<5}",
        report.response.on_time_deliveries, report.response.late_deliveries);
    println!("  Avg delivery (min):  {:>12}", run.avg_delivery_time);
    println!("  High-value orders:   {:>12}", run.high_value_orders);
    if run.unrouted_orders > 0 {
        println!("  Unrouted (skipped):  {:>12}", run.unrouted_orders);
    }
    if !run.unsaved_orders.is_empty() {
        println!("  Unsaved outcomes:    {:>12}", run.unsaved_orders.len());
    }
}

pub fn print_routes(rows: &[RoutePerformance]) {
    println!("\n  {:<8} {:>7} {:>8} {:>6} {:>7} {:>12} {:>9} {:>9} {:<8}",
        "Route", "Orders", "On time", "Late", "Eff%", "Profit", "Avg min", "Km", "Traffic");
    println!("  {}", "-".repeat(84));
    for r in rows {
        println!("  {:<8} {:>7} {:>8} {:>6} {:>7} {:>12} {:>9} {:>9} {:<8}",
            r.route_id, r.total_orders, r.on_time_orders, r.late_orders,
            r.efficiency_score, r.total_profit, r.avg_delivery_time, r.distance_km, r.traffic_level);
    }
}

pub fn print_drivers(rows: &[DriverPerformance]) {
    println!("\n  {:<12} {:>7} {:>8} {:>6} {:>7} {:>12} {:>9}",
        "Driver", "Orders", "On time", "Late", "Eff%", "Profit", "Avg min");
    println!("  {}", "-".repeat(68));
    for d in rows {
        println!("  {:<12} {:>7} {:>8} {:>6} {:>7} {:>12} {:>9}",
            d.driver_name, d.total_orders, d.on_time_orders, d.late_orders,
            d.efficiency_score, d.total_profit, d.avg_delivery_time);
    }
}
