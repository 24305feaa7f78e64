// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Delivery Economics Engine - Performance Breakdowns
//
// Regroups the stored outcomes of a past run along one dimension and
// recomputes the run KPIs per group. Route and driver breakdowns share the
// same fold; a `Dimension` only decides the group key and the extra fields
// carried into each row.

use std::collections::HashMap;
use std::hash::Hash;

use num_traits::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::aggregator::{efficiency_score, mean, minutes_between};
use crate::core_types::{Money, RouteId};
use crate::store::DeliveryStore;
use crate::types::{DriverPerformance, OrderOutcome, Route, RoutePerformance, SimulationRun};

// ─── GroupStats ──────────────────────────────────────────────────────────────

/// Per-group accumulator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupStats {
    pub total_orders: u32,
    pub on_time_orders: u32,
    pub late_orders: u32,
    pub total_profit: Money,
    pub delivery_minutes: Vec<Decimal>,
    /// Whole-cent correction applied on top of the rounded profit.
    profit_adjustment: Decimal,
}

const CENT: Decimal = dec!(0.01);

impl GroupStats {
    fn record(&mut self, outcome: &OrderOutcome, minutes: Option<Decimal>) {
        self.total_orders += 1;
        if outcome.is_late {
            self.late_orders += 1;
        } else {
            self.on_time_orders += 1;
        }
        // Saturates rather than panics; totals that large are already
        // rejected when the run is simulated.
        self.total_profit = Money(self.total_profit.0.saturating_add(outcome.profit.0));
        if let Some(m) = minutes {
            self.delivery_minutes.push(m);
        }
    }

    pub fn efficiency_score(&self) -> Decimal {
        efficiency_score(self.on_time_orders, self.total_orders).round_dp(2)
    }

    pub fn avg_delivery_time(&self) -> Decimal {
        mean(&self.delivery_minutes).round_dp(2)
    }

    /// Profit rounded to cents, including any reconciliation correction.
    pub fn rounded_profit(&self) -> Money {
        Money(self.total_profit.0.round_dp(2).saturating_add(self.profit_adjustment))
    }
}

// ─── Dimension ───────────────────────────────────────────────────────────────

/// A grouping axis for [`group_outcomes`].
pub trait Dimension {
    type Key: Eq + Hash + Clone;
    type Extra;
    type Row;

    /// Group key and passthrough data for the outcome at `index` in the
    /// run's outcome list. `None` leaves the outcome out of the breakdown.
    fn classify(
        &self,
        index: usize,
        outcome: &OrderOutcome,
        route: Option<&Route>,
    ) -> Option<(Self::Key, Self::Extra)>;

    fn row(&self, key: Self::Key, extra: Self::Extra, stats: &GroupStats) -> Self::Row;
}

/// Groups by the route an outcome was priced on.
pub struct ByRoute;

impl Dimension for ByRoute {
    type Key = RouteId;
    type Extra = (Decimal, String);
    type Row = RoutePerformance;

    fn classify(
        &self,
        _index: usize,
        _outcome: &OrderOutcome,
        route: Option<&Route>,
    ) -> Option<(RouteId, (Decimal, String))> {
        let route = route?;
        Some((
            route.route_id.clone(),
            (route.distance_km, route.traffic_level.clone()),
        ))
    }

    fn row(&self, key: RouteId, extra: (Decimal, String), stats: &GroupStats) -> RoutePerformance {
        let (distance_km, traffic_level) = extra;
        RoutePerformance {
            route_id: key,
            total_orders: stats.total_orders,
            on_time_orders: stats.on_time_orders,
            late_orders: stats.late_orders,
            efficiency_score: stats.efficiency_score(),
            total_profit: stats.rounded_profit(),
            avg_delivery_time: stats.avg_delivery_time(),
            distance_km,
            traffic_level,
        }
    }
}

/// Groups by a display label derived from the outcome's position:
/// `Driver {(index % num_drivers) + 1}`.
///
/// The label is not an assignment made during the run; it is recomputed
/// the same way on every call.
pub struct ByDriver {
    pub num_drivers: u32,
}

impl ByDriver {
    pub fn label(&self, index: usize) -> String {
        let drivers = self.num_drivers.max(1) as usize;
        format!("Driver {}", (index % drivers) + 1)
    }
}

impl Dimension for ByDriver {
    type Key = String;
    type Extra = ();
    type Row = DriverPerformance;

    fn classify(&self, index: usize, _outcome: &OrderOutcome, _route: Option<&Route>) -> Option<(String, ())> {
        Some((self.label(index), ()))
    }

    fn row(&self, key: String, _extra: (), stats: &GroupStats) -> DriverPerformance {
        DriverPerformance {
            driver_name: key,
            total_orders: stats.total_orders,
            on_time_orders: stats.on_time_orders,
            late_orders: stats.late_orders,
            efficiency_score: stats.efficiency_score(),
            total_profit: stats.rounded_profit(),
            avg_delivery_time: stats.avg_delivery_time(),
        }
    }
}

// ─── Reconciliation ──────────────────────────────────────────────────────────

/// Move rounded group profits by whole cents so that they add up to the
/// rounded total of all groups. Rounding each group on its own can drift a
/// cent per group away from that total.
///
/// Corrections go to the groups whose own rounding pushed them furthest the
/// other way; ties keep group order.
pub fn reconcile_profits(groups: &mut [GroupStats]) {
    let Some(exact) = groups
        .iter()
        .try_fold(Decimal::ZERO, |acc, g| acc.checked_add(g.total_profit.0))
    else {
        return;
    };
    let Some(rounded) = groups
        .iter()
        .try_fold(Decimal::ZERO, |acc, g| acc.checked_add(g.total_profit.0.round_dp(2)))
    else {
        return;
    };
    let Some(cents) = exact
        .round_dp(2)
        .checked_sub(rounded)
        .and_then(|diff| (diff / CENT).to_i64())
    else {
        return;
    };
    if cents == 0 {
        return;
    }

    let mut order: Vec<usize> = (0..groups.len()).collect();
    let remainder = |i: usize| groups[i].total_profit.0 - groups[i].total_profit.0.round_dp(2);
    if cents > 0 {
        order.sort_by(|&a, &b| remainder(b).cmp(&remainder(a)));
    } else {
        order.sort_by(|&a, &b| remainder(a).cmp(&remainder(b)));
    }
    let step = if cents > 0 { CENT } else { -CENT };

    for i in order.into_iter().take(cents.unsigned_abs() as usize) {
        groups[i].profit_adjustment += step;
    }
}

// ─── Grouping ────────────────────────────────────────────────────────────────

/// Fold a run's outcomes into one row per group, in first-seen order.
/// Group profits are reconciled so the rows add up to the rounded total.
///
/// Route references are resolved through `store`; a route removed since the
/// run reads as absent, which drops the outcome's duration sample (and, for
/// [`ByRoute`], the outcome itself).
pub fn group_outcomes<D, S>(
    dimension: &D,
    run: &SimulationRun,
    outcomes: &[OrderOutcome],
    store: &S,
) -> Vec<D::Row>
where
    D: Dimension,
    S: DeliveryStore + ?Sized,
{
    let mut index_of: HashMap<D::Key, usize> = HashMap::new();
    let mut groups: Vec<(D::Key, D::Extra, GroupStats)> = Vec::new();
    let mut route_cache: HashMap<RouteId, Option<Route>> = HashMap::new();

    for (index, outcome) in outcomes.iter().enumerate() {
        let route = outcome.route_id.as_ref().and_then(|id| {
            route_cache
                .entry(id.clone())
                .or_insert_with(|| store.get_route(id))
                .clone()
        });

        let Some((key, extra)) = dimension.classify(index, outcome, route.as_ref()) else {
            continue;
        };

        let minutes = match (&route, outcome.delivery_timestamp) {
            (Some(_), Some(ts)) => Some(minutes_between(run.start_time, ts)),
            _ => None,
        };

        let slot = *index_of.entry(key.clone()).or_insert_with(|| {
            groups.push((key, extra, GroupStats::default()));
            groups.len() - 1
        });
        groups[slot].2.record(outcome, minutes);
    }

    let mut stats: Vec<GroupStats> = groups.iter_mut().map(|g| std::mem::take(&mut g.2)).collect();
    reconcile_profits(&mut stats);

    groups
        .into_iter()
        .zip(stats)
        .map(|((key, extra, _), stats)| dimension.row(key, extra, &stats))
        .collect()
}

pub fn route_performance<S: DeliveryStore + ?Sized>(store: &S, run: &SimulationRun) -> Vec<RoutePerformance> {
    let outcomes = store.list_order_outcomes_for_run(&run.run_id);
    group_outcomes(&ByRoute, run, &outcomes, store)
}

pub fn driver_performance<S: DeliveryStore + ?Sized>(store: &S, run: &SimulationRun) -> Vec<DriverPerformance> {
    let outcomes = store.list_order_outcomes_for_run(&run.run_id);
    let dimension = ByDriver {
        num_drivers: run.num_drivers,
    };
    group_outcomes(&dimension, run, &outcomes, store)
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::{OrderId, RunId};
    use crate::store::InMemoryStore;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 15, 9, 0, 0).unwrap()
    }

    fn run(num_drivers: u32) -> SimulationRun {
        SimulationRun {
            run_id: RunId::from("SIM_P"),
            timestamp: start(),
            num_drivers,
            start_time: start(),
            max_hours_per_day: 8,
            total_profit: Money::zero(),
            efficiency_score: Decimal::ZERO,
            on_time_deliveries: 0,
            late_deliveries: 0,
            total_fuel_cost: Money::zero(),
            total_orders: 0,
            avg_delivery_time: Decimal::ZERO,
            high_value_orders: 0,
            unrouted_orders: 0,
            unsaved_orders: Vec::new(),
        }
    }

    fn outcome(id: &str, route: &str, late: bool, profit: Decimal, minutes: i64) -> OrderOutcome {
        OrderOutcome {
            order_id: OrderId::from(id),
            run_id: RunId::from("SIM_P"),
            route_id: Some(RouteId::from(route)),
            value: Money(profit),
            is_late: late,
            penalty: Money::zero(),
            bonus: Money::zero(),
            fuel_cost: Money::zero(),
            profit: Money(profit),
            delivery_timestamp: Some(start() + Duration::minutes(minutes)),
            simulation_run_at: start(),
        }
    }

    fn store() -> InMemoryStore {
        let mut store = InMemoryStore::new();
        for (id, distance, traffic) in [("R1", dec!(10), "High"), ("R2", dec!(4.5), "Low")] {
            store.insert_route(Route {
                route_id: RouteId::from(id),
                distance_km: distance,
                traffic_level: traffic.to_string(),
                base_time_min: 30,
            });
        }
        store
    }

    fn outcomes() -> Vec<OrderOutcome> {
        vec![
            outcome("O1", "R1", false, dec!(100), 30),
            outcome("O2", "R2", true, dec!(50), 60),
            outcome("O3", "R1", true, dec!(25.5), 45),
            outcome("O4", "R2", false, dec!(10), 20),
            outcome("O5", "R1", false, dec!(-5), 15),
        ]
    }

    #[test]
    fn groups_by_route_in_first_seen_order() {
        let rows = group_outcomes(&ByRoute, &run(2), &outcomes(), &store());

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].route_id, RouteId::from("R1"));
        assert_eq!(rows[0].total_orders, 3);
        assert_eq!(rows[0].on_time_orders, 2);
        assert_eq!(rows[0].late_orders, 1);
        assert_eq!(rows[0].efficiency_score, dec!(66.67));
        assert_eq!(rows[0].total_profit, Money(dec!(120.5)));
        assert_eq!(rows[0].avg_delivery_time, dec!(30));
        assert_eq!(rows[0].distance_km, dec!(10));
        assert_eq!(rows[0].traffic_level, "High");

        assert_eq!(rows[1].route_id, RouteId::from("R2"));
        assert_eq!(rows[1].avg_delivery_time, dec!(40));
    }

    #[test]
    fn driver_labels_cycle_by_position() {
        let rows = group_outcomes(&ByDriver { num_drivers: 2 }, &run(2), &outcomes(), &store());

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].driver_name, "Driver 1");
        // positions 0, 2, 4
        assert_eq!(rows[0].total_orders, 3);
        assert_eq!(rows[0].total_profit, Money(dec!(120.5)));
        assert_eq!(rows[1].driver_name, "Driver 2");
        assert_eq!(rows[1].total_orders, 2);
        assert_eq!(rows[1].late_orders, 1);
    }

    #[test]
    fn more_drivers_than_orders_leaves_no_empty_groups() {
        let rows = group_outcomes(&ByDriver { num_drivers: 10 }, &run(10), &outcomes(), &store());
        assert_eq!(rows.len(), 5);
        assert!(rows.iter().all(|r| r.total_orders == 1));
        assert_eq!(rows[4].driver_name, "Driver 5");
    }

    #[test]
    fn labels_are_reproducible() {
        let dim = ByDriver { num_drivers: 3 };
        let first = group_outcomes(&dim, &run(3), &outcomes(), &store());
        let second = group_outcomes(&dim, &run(3), &outcomes(), &store());
        assert_eq!(first, second);
    }

    #[test]
    fn removed_route_drops_from_route_view_only() {
        let mut store = store();
        store.remove_route(&RouteId::from("R2")).expect("test: remove R2");

        let by_route = group_outcomes(&ByRoute, &run(1), &outcomes(), &store);
        assert_eq!(by_route.len(), 1);
        assert_eq!(by_route[0].route_id, RouteId::from("R1"));

        let by_driver = group_outcomes(&ByDriver { num_drivers: 1 }, &run(1), &outcomes(), &store);
        assert_eq!(by_driver[0].total_orders, 5);
        // Only the three R1 outcomes contribute durations: 30, 45, 15.
        assert_eq!(by_driver[0].avg_delivery_time, dec!(30));
    }

    #[test]
    fn totals_agree_across_dimensions() {
        let outcomes = outcomes();
        let route_rows = group_outcomes(&ByRoute, &run(3), &outcomes, &store());
        let driver_rows = group_outcomes(&ByDriver { num_drivers: 3 }, &run(3), &outcomes, &store());

        let route_profit: Money = route_rows.iter().map(|r| r.total_profit).sum();
        let driver_profit: Money = driver_rows.iter().map(|r| r.total_profit).sum();
        assert_eq!(route_profit, driver_profit);

        let route_orders: u32 = route_rows.iter().map(|r| r.total_orders).sum();
        let driver_orders: u32 = driver_rows.iter().map(|r| r.total_orders).sum();
        assert_eq!(route_orders, 5);
        assert_eq!(driver_orders, 5);
    }

    #[test]
    fn half_cent_profits_still_add_up() {
        // 1000.05 + 10% bonus: 1100.055 each. Rounded alone, both become
        // 1100.06 while the exact total rounds to 2200.11.
        let outcomes = vec![
            outcome("O1", "R1", false, dec!(1100.055), 30),
            outcome("O2", "R2", false, dec!(1100.055), 30),
        ];
        let rows = group_outcomes(&ByRoute, &run(2), &outcomes, &store());

        let total: Money = rows.iter().map(|r| r.total_profit).sum();
        assert_eq!(total, Money(dec!(2200.11)));
        assert_eq!(rows[0].total_profit, Money(dec!(1100.05)));
        assert_eq!(rows[1].total_profit, Money(dec!(1100.06)));

        let drivers = group_outcomes(&ByDriver { num_drivers: 2 }, &run(2), &outcomes, &store());
        let total: Money = drivers.iter().map(|r| r.total_profit).sum();
        assert_eq!(total, Money(dec!(2200.11)));
    }

    #[test]
    fn reconciliation_moves_cents_towards_largest_remainder() {
        let mut groups: Vec<GroupStats> = [dec!(0.004), dec!(0.004), dec!(0.002)]
            .into_iter()
            .map(|p| GroupStats {
                total_profit: Money(p),
                ..GroupStats::default()
            })
            .collect();
        // Each rounds to 0.00, the total 0.010 rounds to 0.01.
        reconcile_profits(&mut groups);
        let rounded: Vec<Money> = groups.iter().map(GroupStats::rounded_profit).collect();
        assert_eq!(rounded, vec![Money(dec!(0.01)), Money(dec!(0)), Money(dec!(0))]);
    }

    #[test]
    fn exact_cents_are_untouched() {
        let rows = group_outcomes(&ByDriver { num_drivers: 2 }, &run(2), &outcomes(), &store());
        assert_eq!(rows[0].total_profit, Money(dec!(120.5)));
        assert_eq!(rows[1].total_profit, Money(dec!(60)));
    }

    #[test]
    fn empty_run_yields_no_rows() {
        assert!(group_outcomes(&ByRoute, &run(2), &[], &store()).is_empty());
        assert!(group_outcomes(&ByDriver { num_drivers: 2 }, &run(2), &[], &store()).is_empty());
    }
}
