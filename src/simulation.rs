// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Delivery Economics Engine - Order Simulator
//
// Walks the order snapshot once, prices every routed order with the cost
// model, appends its outcome to the run log and keeps the running totals.

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use crate::core_types::{Money, OrderId, RunId};
use crate::cost_model::{self, CostError};
use crate::params::CostRates;
use crate::store::DeliveryStore;
use crate::types::{Order, OrderOutcome, Route};
use crate::validation::SimulationParams;

// ─── Errors ──────────────────────────────────────────────────────────────────

/// Failures that abort the whole batch. Outcome write failures are not
/// among them; those are recorded in [`BatchResult::unsaved`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SimulationError {
    #[error("order {order_id}: {source}")]
    Pricing {
        order_id: OrderId,
        #[source]
        source: CostError,
    },

    #[error("run totals overflowed at order {0}")]
    TotalsOverflow(OrderId),
}

// ─── BatchResult ─────────────────────────────────────────────────────────────

/// Running totals and outcomes of one pass over the order snapshot.
#[derive(Debug, Clone, Default)]
pub struct BatchResult {
    /// Every computed outcome, including ones whose write failed.
    pub outcomes: Vec<OrderOutcome>,
    pub total_profit: Money,
    pub total_fuel_cost: Money,
    pub on_time: u32,
    /// Orders that had a route and were priced.
    pub considered: u32,
    /// Size of the snapshot that was read, routed or not.
    pub snapshot_size: usize,
    pub unrouted: Vec<OrderId>,
    pub unsaved: Vec<OrderId>,
    /// Orders whose delivery timestamp came from the fallback offset.
    pub fallback_timestamps: u32,
}

impl BatchResult {
    pub fn late(&self) -> u32 {
        self.considered - self.on_time
    }
}

// ─── OrderSimulator ──────────────────────────────────────────────────────────

pub struct OrderSimulator<'a> {
    rates: &'a CostRates,
}

impl<'a> OrderSimulator<'a> {
    pub fn new(rates: &'a CostRates) -> Self {
        Self { rates }
    }

    /// Price the whole snapshot for one run.
    ///
    /// A failed outcome write is logged and the batch continues; the order's
    /// profit and fuel cost still count towards the totals and its id is
    /// listed in [`BatchResult::unsaved`]. Decimal overflow while pricing
    /// or totalling aborts the batch; the caller rolls back what was written.
    pub fn run<S: DeliveryStore + ?Sized>(
        &self,
        store: &mut S,
        run_id: &RunId,
        run_at: DateTime<Utc>,
        params: &SimulationParams,
    ) -> Result<BatchResult, SimulationError> {
        let snapshot = store.list_orders_with_routes();
        let mut batch = BatchResult {
            snapshot_size: snapshot.len(),
            ..BatchResult::default()
        };

        info!(
            orders = snapshot.len(),
            start_time = %params.start_time,
            "Processing order snapshot"
        );

        for (order, route) in snapshot {
            let Some(route) = route else {
                warn!(order_id = %order.order_id, "Order has no assigned route, skipping");
                batch.unrouted.push(order.order_id);
                continue;
            };

            let outcome = self.price_order(&order, &route, run_id, run_at, params, &mut batch)?;

            match store.save_order_outcome(outcome.clone()) {
                Ok(()) => debug!(order_id = %order.order_id, "Saved order outcome"),
                Err(err) => {
                    error!(order_id = %order.order_id, error = %err, "Failed to save order outcome");
                    batch.unsaved.push(order.order_id.clone());
                }
            }
            batch.outcomes.push(outcome);
        }

        info!(
            considered = batch.considered,
            on_time = batch.on_time,
            unrouted = batch.unrouted.len(),
            unsaved = batch.unsaved.len(),
            "Order snapshot processed"
        );
        Ok(batch)
    }

    fn price_order(
        &self,
        order: &Order,
        route: &Route,
        run_id: &RunId,
        run_at: DateTime<Utc>,
        params: &SimulationParams,
        batch: &mut BatchResult,
    ) -> Result<OrderOutcome, SimulationError> {
        let cost = cost_model::evaluate(order.value, route, params.start_time, self.rates)
            .map_err(|source| SimulationError::Pricing {
                order_id: order.order_id.clone(),
                source,
            })?;
        if cost.used_fallback_timestamp {
            error!(
                order_id = %order.order_id,
                projected_secs = %cost.projected_duration_secs,
                "Could not compute delivery timestamp, using fallback offset"
            );
            batch.fallback_timestamps += 1;
        }

        let totals_overflow = || SimulationError::TotalsOverflow(order.order_id.clone());
        batch.total_fuel_cost = batch
            .total_fuel_cost
            .checked_add(cost.fuel_cost)
            .ok_or_else(totals_overflow)?;
        batch.total_profit = batch
            .total_profit
            .checked_add(cost.profit)
            .ok_or_else(totals_overflow)?;
        batch.considered += 1;
        if !cost.is_late {
            batch.on_time += 1;
        }

        debug!(
            order_id = %order.order_id,
            route_id = %route.route_id,
            late = cost.is_late,
            profit = %cost.profit,
            delivery = %cost.delivery_timestamp,
            "Priced order"
        );

        Ok(OrderOutcome {
            order_id: order.order_id.clone(),
            run_id: run_id.clone(),
            route_id: Some(route.route_id.clone()),
            value: order.value,
            is_late: cost.is_late,
            penalty: cost.penalty,
            bonus: cost.bonus,
            fuel_cost: cost.fuel_cost,
            profit: cost.profit,
            delivery_timestamp: Some(cost.delivery_timestamp),
            simulation_run_at: run_at,
        })
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
