// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Delivery Economics Engine - Data Access
//
// The engine reads reference data and writes run results through the
// `DeliveryStore` trait. `InMemoryStore` is the bundled implementation:
// insertion-ordered, with snapshot-based transactions.

use std::collections::{HashMap, HashSet};

use crate::core_types::{OrderId, RouteId, RunId};
use crate::types::{Driver, Order, OrderOutcome, Route, SimulationRun};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },

    #[error("{kind} {id} already exists")]
    Conflict { kind: &'static str, id: String },

    #[error("write rejected for order {0}")]
    WriteRejected(OrderId),

    #[error("write rejected for run {0}")]
    RunRejected(RunId),

    #[error("no open transaction")]
    NoTransaction,

    #[error("a transaction is already open")]
    TransactionOpen,
}

// ---------------------------------------------------------------------------
// DeliveryStore
// ---------------------------------------------------------------------------

/// Persistence operations the engine depends on.
pub trait DeliveryStore {
    fn get_route(&self, id: &RouteId) -> Option<Route>;
    fn list_routes(&self) -> Vec<Route>;
    fn list_orders(&self) -> Vec<Order>;
    fn list_drivers(&self) -> Vec<Driver>;

    /// Insert a route unless one with the same id exists. Returns whether it
    /// was inserted.
    fn insert_route(&mut self, route: Route) -> bool;
    fn insert_order(&mut self, order: Order) -> bool;
    fn insert_driver(&mut self, driver: Driver) -> bool;

    /// Append one outcome to its run's log.
    fn save_order_outcome(&mut self, outcome: OrderOutcome) -> Result<(), StoreError>;
    /// Outcomes of one run, in the order they were saved.
    fn list_order_outcomes_for_run(&self, run_id: &RunId) -> Vec<OrderOutcome>;
    /// Most recent outcome recorded for an order across all runs.
    fn latest_outcome(&self, order_id: &OrderId) -> Option<OrderOutcome>;

    fn create_run_record(&mut self, run: SimulationRun) -> Result<SimulationRun, StoreError>;
    fn get_run_by_id(&self, id: &RunId) -> Option<SimulationRun>;
    /// All runs, newest first.
    fn list_runs(&self) -> Vec<SimulationRun>;
    fn count_runs(&self) -> usize;

    fn begin(&mut self) -> Result<(), StoreError>;
    fn commit(&mut self) -> Result<(), StoreError>;
    fn rollback(&mut self) -> Result<(), StoreError>;

    /// Order snapshot with each route reference resolved. A dangling
    /// reference resolves to `None`.
    fn list_orders_with_routes(&self) -> Vec<(Order, Option<Route>)> {
        self.list_orders()
            .into_iter()
            .map(|order| {
                let route = order.route_id.as_ref().and_then(|id| self.get_route(id));
                (order, route)
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// InMemoryStore
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
struct StoreState {
    routes: HashMap<RouteId, Route>,
    route_order: Vec<RouteId>,
    orders: Vec<Order>,
    drivers: Vec<Driver>,
    runs: Vec<SimulationRun>,
    outcomes: HashMap<RunId, Vec<OrderOutcome>>,
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: StoreState,
    checkpoint: Option<StoreState>,
    rejected_writes: HashSet<OrderId>,
    reject_runs: bool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later outcome write for `order_id` fail.
    pub fn reject_writes_for(&mut self, order_id: impl Into<OrderId>) {
        self.rejected_writes.insert(order_id.into());
    }

    /// Make every later run record write fail.
    pub fn reject_run_records(&mut self) {
        self.reject_runs = true;
    }

    /// Delete a route. Orders that referenced it keep existing with no route.
    pub fn remove_route(&mut self, id: &RouteId) -> Result<Route, StoreError> {
        let route = self.state.routes.remove(id).ok_or_else(|| StoreError::NotFound {
            kind: "route",
            id: id.to_string(),
        })?;
        self.state.route_order.retain(|r| r != id);
        for order in self.state.orders.iter_mut() {
            if order.route_id.as_ref() == Some(id) {
                order.route_id = None;
            }
        }
        Ok(route)
    }

    pub fn in_transaction(&self) -> bool {
        self.checkpoint.is_some()
    }
}

impl DeliveryStore for InMemoryStore {
    fn get_route(&self, id: &RouteId) -> Option<Route> {
        self.state.routes.get(id).cloned()
    }

    fn list_routes(&self) -> Vec<Route> {
        self.state
            .route_order
            .iter()
            .filter_map(|id| self.state.routes.get(id).cloned())
            .collect()
    }

    fn list_orders(&self) -> Vec<Order> {
        self.state.orders.clone()
    }

    fn list_drivers(&self) -> Vec<Driver> {
        self.state.drivers.clone()
    }

    fn insert_route(&mut self, route: Route) -> bool {
        if self.state.routes.contains_key(&route.route_id) {
            return false;
        }
        self.state.route_order.push(route.route_id.clone());
        self.state.routes.insert(route.route_id.clone(), route);
        true
    }

    fn insert_order(&mut self, order: Order) -> bool {
        if self.state.orders.iter().any(|o| o.order_id == order.order_id) {
            return false;
        }
        self.state.orders.push(order);
        true
    }

    fn insert_driver(&mut self, driver: Driver) -> bool {
        if self.state.drivers.iter().any(|d| d.name == driver.name) {
            return false;
        }
        self.state.drivers.push(driver);
        true
    }

    fn save_order_outcome(&mut self, outcome: OrderOutcome) -> Result<(), StoreError> {
        if self.rejected_writes.contains(&outcome.order_id) {
            return Err(StoreError::WriteRejected(outcome.order_id));
        }
        let log = self.state.outcomes.entry(outcome.run_id.clone()).or_default();
        if log.iter().any(|o| o.order_id == outcome.order_id) {
            return Err(StoreError::Conflict {
                kind: "order outcome",
                id: format!("{}@{}", outcome.order_id, outcome.run_id),
            });
        }
        log.push(outcome);
        Ok(())
    }

    fn list_order_outcomes_for_run(&self, run_id: &RunId) -> Vec<OrderOutcome> {
        self.state.outcomes.get(run_id).cloned().unwrap_or_default()
    }

    fn latest_outcome(&self, order_id: &OrderId) -> Option<OrderOutcome> {
        // Runs are stored oldest first; scan from the newest.
        self.state.runs.iter().rev().find_map(|run| {
            self.state
                .outcomes
                .get(&run.run_id)?
                .iter()
                .find(|o| &o.order_id == order_id)
                .cloned()
        })
    }

    fn create_run_record(&mut self, run: SimulationRun) -> Result<SimulationRun, StoreError> {
        if self.reject_runs {
            return Err(StoreError::RunRejected(run.run_id));
        }
        if self.state.runs.iter().any(|r| r.run_id == run.run_id) {
            return Err(StoreError::Conflict {
                kind: "simulation run",
                id: run.run_id.to_string(),
            });
        }
        self.state.runs.push(run.clone());
        Ok(run)
    }

    fn get_run_by_id(&self, id: &RunId) -> Option<SimulationRun> {
        self.state.runs.iter().find(|r| &r.run_id == id).cloned()
    }

    fn list_runs(&self) -> Vec<SimulationRun> {
        let mut runs: Vec<(usize, SimulationRun)> =
            self.state.runs.iter().cloned().enumerate().collect();
        // Newest timestamp first; creation order breaks ties.
        runs.sort_by(|(ia, a), (ib, b)| b.timestamp.cmp(&a.timestamp).then(ib.cmp(ia)));
        runs.into_iter().map(|(_, run)| run).collect()
    }

    fn count_runs(&self) -> usize {
        self.state.runs.len()
    }

    fn begin(&mut self) -> Result<(), StoreError> {
        if self.checkpoint.is_some() {
            return Err(StoreError::TransactionOpen);
        }
        self.checkpoint = Some(self.state.clone());
        Ok(())
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        self.checkpoint.take().map(|_| ()).ok_or(StoreError::NoTransaction)
    }

    fn rollback(&mut self) -> Result<(), StoreError> {
        let saved = self.checkpoint.take().ok_or(StoreError::NoTransaction)?;
        self.state = saved;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
