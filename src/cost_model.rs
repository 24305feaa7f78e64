// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Delivery Economics Engine - Cost Model
//
// Pure pricing of a single delivery: fuel, lateness, penalty, bonus and
// profit, given the order value, its route and the run start time.

use chrono::{DateTime, Duration, Utc};
use num_traits::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::core_types::{Money, TrafficLevel};
use crate::params::CostRates;
use crate::types::Route;

const SECONDS_PER_MINUTE: Decimal = dec!(60);

/// A cost quantity fell outside the decimal range.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CostError {
    #[error("arithmetic overflow computing {0}")]
    Overflow(&'static str),
}

fn overflow(quantity: &'static str) -> impl FnOnce() -> CostError {
    move || CostError::Overflow(quantity)
}

/// Everything the cost model derives for one order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub fuel_cost: Money,
    pub projected_duration_secs: Decimal,
    pub is_late: bool,
    pub penalty: Money,
    pub bonus: Money,
    pub profit: Money,
    pub delivery_timestamp: DateTime<Utc>,
    /// Set when the projected timestamp could not be computed and the
    /// fallback offset was used instead.
    pub used_fallback_timestamp: bool,
}

/// Fuel cost = distance × (base rate, plus the surcharge on high traffic).
pub fn fuel_cost(distance_km: Decimal, traffic: TrafficLevel, rates: &CostRates) -> Result<Money, CostError> {
    let mut per_km = rates.base_fuel_rate;
    if traffic.is_high() {
        per_km = per_km
            .checked_add(rates.high_traffic_surcharge)
            .ok_or_else(overflow("fuel rate"))?;
    }
    distance_km
        .checked_mul(per_km)
        .map(Money)
        .ok_or_else(overflow("fuel cost"))
}

/// Transit-time multiplier. Low and unrecognised traffic do not inflate.
pub fn traffic_multiplier(traffic: TrafficLevel, rates: &CostRates) -> Decimal {
    match traffic {
        TrafficLevel::High => rates.high_traffic_multiplier,
        TrafficLevel::Medium => rates.medium_traffic_multiplier,
        TrafficLevel::Low | TrafficLevel::Unrecognized => Decimal::ONE,
    }
}

pub fn base_duration_secs(base_time_min: u32) -> Decimal {
    Decimal::from(base_time_min) * SECONDS_PER_MINUTE
}

pub fn projected_duration_secs(
    base_time_min: u32,
    traffic: TrafficLevel,
    rates: &CostRates,
) -> Result<Decimal, CostError> {
    base_duration_secs(base_time_min)
        .checked_mul(traffic_multiplier(traffic, rates))
        .ok_or_else(overflow("projected duration"))
}

/// Late iff the projected time strictly exceeds base time plus the grace window.
pub fn is_late(projected_secs: Decimal, base_time_min: u32, rates: &CostRates) -> Result<bool, CostError> {
    let deadline = base_duration_secs(base_time_min)
        .checked_add(rates.grace_window_secs)
        .ok_or_else(overflow("lateness deadline"))?;
    Ok(projected_secs > deadline)
}

pub fn penalty(late: bool, rates: &CostRates) -> Money {
    if late {
        Money(rates.late_penalty)
    } else {
        Money::zero()
    }
}

/// Bonus applies only to on-time orders strictly above the high-value threshold.
pub fn bonus(value: Money, late: bool, rates: &CostRates) -> Result<Money, CostError> {
    if late || value.0 <= rates.high_value_threshold {
        return Ok(Money::zero());
    }
    value
        .0
        .checked_mul(rates.bonus_rate)
        .map(Money)
        .ok_or_else(overflow("bonus"))
}

/// Profit is not clamped and may be negative.
pub fn profit(value: Money, bonus: Money, penalty: Money, fuel_cost: Money) -> Result<Money, CostError> {
    value
        .checked_add(bonus)
        .and_then(|m| m.checked_sub(penalty))
        .and_then(|m| m.checked_sub(fuel_cost))
        .ok_or_else(overflow("profit"))
}

/// `start + floor(projected minutes)`, or `None` if it cannot be represented.
pub fn projected_timestamp(start: DateTime<Utc>, projected_secs: Decimal) -> Option<DateTime<Utc>> {
    let minutes = (projected_secs / SECONDS_PER_MINUTE).floor().to_i64()?;
    let offset = Duration::try_minutes(minutes)?;
    start.checked_add_signed(offset)
}

/// Projected timestamp, falling back to `start + fallback_delivery_minutes`.
///
/// The second element reports whether the fallback was taken.
pub fn delivery_timestamp(
    start: DateTime<Utc>,
    projected_secs: Decimal,
    rates: &CostRates,
) -> (DateTime<Utc>, bool) {
    if let Some(ts) = projected_timestamp(start, projected_secs) {
        return (ts, false);
    }
    let fallback = Duration::try_minutes(rates.fallback_delivery_minutes)
        .and_then(|offset| start.checked_add_signed(offset))
        .unwrap_or(start);
    (fallback, true)
}

/// Price one order against its route.
///
/// Fails only when a money or duration quantity overflows the decimal range;
/// an unrepresentable delivery timestamp takes the fallback instead.
pub fn evaluate(
    value: Money,
    route: &Route,
    start: DateTime<Utc>,
    rates: &CostRates,
) -> Result<CostBreakdown, CostError> {
    let traffic = route.traffic();
    let fuel_cost = fuel_cost(route.distance_km, traffic, rates)?;
    let projected = projected_duration_secs(route.base_time_min, traffic, rates)?;
    let late = is_late(projected, route.base_time_min, rates)?;
    let penalty = penalty(late, rates);
    let bonus = bonus(value, late, rates)?;
    let profit = profit(value, bonus, penalty, fuel_cost)?;
    let (delivery_timestamp, used_fallback_timestamp) = delivery_timestamp(start, projected, rates);

    Ok(CostBreakdown {
        fuel_cost,
        projected_duration_secs: projected,
        is_late: late,
        penalty,
        bonus,
        profit,
        delivery_timestamp,
        used_fallback_timestamp,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
