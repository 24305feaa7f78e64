// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Delivery Economics Engine - Run Aggregator
//
// Folds a finished batch into the run-level KPI record. The zero-safe
// efficiency and mean-duration formulas here are shared with the
// performance breakdowns.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::core_types::RunId;
use crate::params::CostRates;
use crate::simulation::BatchResult;
use crate::types::{OrderOutcome, SimulationRun};
use crate::validation::SimulationParams;

const HUNDRED: Decimal = dec!(100);
const SECONDS_PER_MINUTE: Decimal = dec!(60);

/// Percentage of orders delivered on time; 0 when there are no orders.
pub fn efficiency_score(on_time: u32, total: u32) -> Decimal {
    if total == 0 {
        return Decimal::ZERO;
    }
    Decimal::from(on_time) / Decimal::from(total) * HUNDRED
}

/// Arithmetic mean; 0 for an empty sample.
pub fn mean(samples: &[Decimal]) -> Decimal {
    if samples.is_empty() {
        return Decimal::ZERO;
    }
    samples.iter().sum::<Decimal>() / Decimal::from(samples.len())
}

/// Minutes from `start` to `end`, with fractional minutes kept.
pub fn minutes_between(start: DateTime<Utc>, end: DateTime<Utc>) -> Decimal {
    Decimal::from((end - start).num_seconds()) / SECONDS_PER_MINUTE
}

/// Delivery duration of one outcome, when it has both a route and a
/// delivery timestamp.
pub fn delivery_minutes(outcome: &OrderOutcome, start: DateTime<Utc>) -> Option<Decimal> {
    outcome.route_id.as_ref()?;
    outcome.delivery_timestamp.map(|ts| minutes_between(start, ts))
}

/// Build the run record.
///
/// Counts and money totals come from the batch itself. The high-value count
/// and average delivery time are read from `persisted`, the outcomes that
/// actually landed in the run log, so an unsaved order is missing from those
/// two figures but present in the others.
pub fn aggregate_run(
    run_id: RunId,
    run_at: DateTime<Utc>,
    params: &SimulationParams,
    batch: &BatchResult,
    persisted: &[OrderOutcome],
    rates: &CostRates,
) -> SimulationRun {
    let tagged: Vec<&OrderOutcome> = persisted.iter().filter(|o| o.run_id == run_id).collect();

    let high_value_orders = tagged
        .iter()
        .filter(|o| o.value.0 > rates.high_value_threshold)
        .count() as u32;

    let durations: Vec<Decimal> = tagged
        .iter()
        .filter_map(|o| delivery_minutes(o, params.start_time))
        .collect();

    SimulationRun {
        run_id,
        timestamp: run_at,
        num_drivers: params.num_drivers,
        start_time: params.start_time,
        max_hours_per_day: params.max_hours_per_day,
        total_profit: batch.total_profit.rounded(),
        efficiency_score: efficiency_score(batch.on_time, batch.considered).round_dp(2),
        on_time_deliveries: batch.on_time,
        late_deliveries: batch.late(),
        total_fuel_cost: batch.total_fuel_cost.rounded(),
        total_orders: batch.considered,
        avg_delivery_time: mean(&durations).round_dp(2),
        high_value_orders,
        unrouted_orders: batch.unrouted.len() as u32,
        unsaved_orders: batch.unsaved.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::{Money, OrderId, RouteId};
    use chrono::{Duration, TimeZone};

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 15, 9, 0, 0).unwrap()
    }

    fn params() -> SimulationParams {
        SimulationParams {
            num_drivers: 3,
            start_time: start(),
            max_hours_per_day: 8,
        }
    }

    fn outcome(id: &str, value: Decimal, late: bool, minutes: i64) -> OrderOutcome {
        OrderOutcome {
            order_id: OrderId::from(id),
            run_id: RunId::from("SIM_X"),
            route_id: Some(RouteId::from("R1")),
            value: Money(value),
            is_late: late,
            penalty: Money::zero(),
            bonus: Money::zero(),
            fuel_cost: Money::zero(),
            profit: Money(value),
            delivery_timestamp: Some(start() + Duration::minutes(minutes)),
            simulation_run_at: start(),
        }
    }

    #[test]
    fn efficiency_of_empty_batch_is_zero() {
        assert_eq!(efficiency_score(0, 0), Decimal::ZERO);
        assert_eq!(mean(&[]), Decimal::ZERO);
    }

    #[test]
    fn efficiency_is_percentage() {
        assert_eq!(efficiency_score(3, 4), dec!(75));
        assert_eq!(efficiency_score(1, 3).round_dp(2), dec!(33.33));
    }

    #[test]
    fn minutes_keep_fractions() {
        let end = start() + Duration::seconds(90);
        assert_eq!(minutes_between(start(), end), dec!(1.5));
    }

    #[test]
    fn high_value_count_ignores_lateness() {
        let persisted = vec![
            outcome("O1", dec!(1500), true, 30),
            outcome("O2", dec!(1000), false, 20),
            outcome("O3", dec!(2500), false, 10),
        ];
        let batch = BatchResult {
            on_time: 2,
            considered: 3,
            snapshot_size: 3,
            ..BatchResult::default()
        };
        let run = aggregate_run(
            RunId::from("SIM_X"),
            start(),
            &params(),
            &batch,
            &persisted,
            &CostRates::default(),
        );

        assert_eq!(run.high_value_orders, 2);
        assert_eq!(run.avg_delivery_time, dec!(20));
        assert_eq!(run.efficiency_score, dec!(66.67));
        assert_eq!(run.late_deliveries, 1);
        assert_eq!(run.total_orders, 3);
    }

    #[test]
    fn outcomes_from_other_runs_are_ignored() {
        let mut foreign = outcome("O9", dec!(5000), false, 100);
        foreign.run_id = RunId::from("SIM_OTHER");
        let run = aggregate_run(
            RunId::from("SIM_X"),
            start(),
            &params(),
            &BatchResult::default(),
            &[foreign],
            &CostRates::default(),
        );
        assert_eq!(run.high_value_orders, 0);
        assert_eq!(run.avg_delivery_time, Decimal::ZERO);
        assert_eq!(run.efficiency_score, Decimal::ZERO);
    }

    #[test]
    fn outcome_without_route_has_no_duration() {
        let mut o = outcome("O1", dec!(10), false, 45);
        o.route_id = None;
        assert_eq!(delivery_minutes(&o, start()), None);
    }
}
