//! Haversine distance and geohash bucketing.
//!
//! The geohash here is the classic locality-preserving encoding: each
//! character subdivides the coordinate plane into a finer 32-cell grid, so
//! nearby points tend to share a long common prefix. Pronto uses truncated
//! hashes purely as coarse bucket keys for proximity queries - membership in
//! a bucket says "same grid cell", not "within radius". Two points can be
//! meters apart yet hash into different cells across a grid boundary; bucket
//! queries do not scan neighboring cells, so such points are missed. Exact
//! ranking within a bucket is done with [`distance_km`].

use crate::types::Coordinate;

/// Mean Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Number of characters in a full-precision geohash.
pub const GEOHASH_LEN: usize = 12;

/// Geohash base-32 alphabet (no a, i, l, o).
const ALPHABET: &[u8; 32] = b"0123456789bcdefghjkmnpqrstuvwxyz";

/// Great-circle distance between two coordinates in kilometers.
///
/// Haversine formula over a sphere of radius [`EARTH_RADIUS_KM`]. Symmetric,
/// and zero (up to floating-point noise) exactly when the points coincide.
#[must_use]
pub fn distance_km(a: Coordinate, b: Coordinate) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_long = (b.long - a.long).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_long / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * c
}

/// Encode a coordinate as a [`GEOHASH_LEN`]-character geohash.
///
/// Interleaves longitude and latitude bisection bits (longitude first), five
/// bits per output character.
#[must_use]
pub fn encode(c: Coordinate) -> String {
    let (mut lat_min, mut lat_max) = (-90.0_f64, 90.0_f64);
    let (mut long_min, mut long_max) = (-180.0_f64, 180.0_f64);

    let mut hash = String::with_capacity(GEOHASH_LEN);
    let mut bits: usize = 0;
    let mut bit_count = 0;
    let mut even_bit = true; // longitude first

    while hash.len() < GEOHASH_LEN {
        if even_bit {
            let mid = long_min.midpoint(long_max);
            if c.long >= mid {
                bits = (bits << 1) | 1;
                long_min = mid;
            } else {
                bits <<= 1;
                long_max = mid;
            }
        } else {
            let mid = lat_min.midpoint(lat_max);
            if c.lat >= mid {
                bits = (bits << 1) | 1;
                lat_min = mid;
            } else {
                bits <<= 1;
                lat_max = mid;
            }
        }
        even_bit = !even_bit;

        bit_count += 1;
        if bit_count == 5 {
            hash.push(char::from(ALPHABET[bits]));
            bits = 0;
            bit_count = 0;
        }
    }

    hash
}

/// Truncate a geohash to its bucket prefix.
///
/// A shorter prefix widens the bucket (more candidates to distance-filter);
/// a longer one narrows it and raises the odds of missing merchants whose
/// hash falls in a neighboring cell.
#[must_use]
pub fn bucket_key(hash: &str, len: usize) -> &str {
    let end = hash
        .char_indices()
        .nth(len)
        .map_or(hash.len(), |(i, _)| i);
    hash.get(..end).unwrap_or(hash)
}
