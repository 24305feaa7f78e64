// Synthetic fleet generator, seedable for reproducible runs

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rust_decimal::Decimal;

use delivery_engine::{DriverRecord, Money, Order, OrderId, Route, RouteId, Snapshot};

const TRAFFIC_LEVELS: [&str; 3] = ["Low", "Medium", "High"];

/// Distance in tenths of a kilometre (2.0 to 40.0 km).
const DISTANCE_TENTHS: (i64, i64) = (20, 400);
const BASE_TIME_MIN: (u32, u32) = (10, 90);
/// Order value in cents (100.00 to 3000.00).
const VALUE_CENTS: (i64, i64) = (10_000, 300_000);

pub struct ScenarioShape {
    pub orders: usize,
    pub routes: usize,
    pub drivers: usize,
    pub seed: u64,
}

pub fn generate(shape: &ScenarioShape) -> Snapshot {
    let mut rng = ChaCha8Rng::seed_from_u64(shape.seed);

    let routes: Vec<Route> = (0..shape.routes.max(1))
        .map(|i| Route {
            route_id: RouteId::from(format!("R{}", i + 1)),
            distance_km: Decimal::new(rng.gen_range(DISTANCE_TENTHS.0..=DISTANCE_TENTHS.1), 1),
            traffic_level: TRAFFIC_LEVELS[rng.gen_range(0..TRAFFIC_LEVELS.len())].to_string(),
            base_time_min: rng.gen_range(BASE_TIME_MIN.0..=BASE_TIME_MIN.1),
        })
        .collect();

    let orders = (0..shape.orders)
        .map(|i| Order {
            order_id: OrderId::from(format!("O{}", i + 1)),
            value: Money(Decimal::new(rng.gen_range(VALUE_CENTS.0..=VALUE_CENTS.1), 2)),
            route_id: Some(routes[rng.gen_range(0..routes.len())].route_id.clone()),
        })
        .collect();

    let drivers = (0..shape.drivers)
        .map(|i| DriverRecord {
            name: format!("Driver {}", i + 1),
            shift_hours: Decimal::from(rng.gen_range(4..=10)),
            past_week_hours: (0..7).map(|_| Decimal::from(rng.gen_range(4..=10))).collect(),
            past_7_day_work_hours: None,
        })
        .collect();

    Snapshot { drivers, routes, orders }
}
