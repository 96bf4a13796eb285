//! Pricing and heuristic delivery-time estimation.
//!
//! The tour is a greedy nearest-neighbor walk, not an exact optimum:
//! starting at the starting merchant, repeatedly visit the closest
//! unvisited merchant (ties go to the one appearing earliest in the cart),
//! then ride to the user. O(n²) in the number of distinct merchants, which
//! is what keeps large carts tractable; an exact search would be O(n!).
//!
//! A cart with a single merchant is charged the round trip
//! `2 x distance(user, start)` even though only the merchant-to-user leg is
//! ridden. That is the reference behavior and callers depend on it; do not
//! fold it into the general case.

use pronto_core::{Coordinate, geo};

use super::cart::{Stop, ValidatedCart};

/// Average delivery speed: 40 km/h expressed in km per minute.
pub const DELIVERY_SPEED_KM_PER_MIN: f64 = 40.0 / 60.0;

/// The outcome of estimating a validated cart.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteEstimate {
    /// Σ unit price x quantity over every cart line.
    pub total_price: i64,
    /// Tour length divided by the delivery speed, rounded down.
    pub total_minutes: i64,
    /// The heuristic tour length in kilometers.
    pub total_distance_km: f64,
}

/// Price a validated cart and estimate its delivery time.
///
/// Deterministic for a fixed cart and catalog.
#[must_use]
pub fn estimate(cart: &ValidatedCart) -> RouteEstimate {
    let total_price = cart
        .lines
        .iter()
        .map(|line| line.unit_price * i64::from(line.quantity))
        .sum();

    let total_distance_km = tour_distance_km(cart.user_location, &cart.start, &cart.stops);
    #[allow(clippy::cast_possible_truncation)] // floored km/speed is far below i64::MAX
    let total_minutes = (total_distance_km / DELIVERY_SPEED_KM_PER_MIN).floor() as i64;

    RouteEstimate {
        total_price,
        total_minutes,
        total_distance_km,
    }
}

/// Greedy nearest-neighbor tour length in kilometers.
///
/// `stops` must not contain the starting merchant; its order is the
/// tie-break order.
fn tour_distance_km(user: Coordinate, start: &Stop, stops: &[Stop]) -> f64 {
    if stops.is_empty() {
        // Single-merchant round trip
        return 2.0 * geo::distance_km(user, start.location);
    }

    let mut remaining: Vec<&Stop> = stops.iter().collect();
    let mut position = start.location;
    let mut total = 0.0;

    while !remaining.is_empty() {
        // min_by keeps the first of equally-near stops, preserving cart order
        let Some((index, distance)) = remaining
            .iter()
            .enumerate()
            .map(|(i, stop)| (i, geo::distance_km(position, stop.location)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
        else {
            break;
        };

        total += distance;
        position = remaining.remove(index).location;
    }

    total + geo::distance_km(position, user)
}
