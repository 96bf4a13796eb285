//! Geographic coordinate type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Coordinate`].
#[derive(thiserror::Error, Debug, Clone)]
pub enum CoordinateError {
    /// The input is not two comma-separated fields.
    #[error("coordinate must be two comma-separated numbers")]
    Malformed,
    /// A field did not parse as a floating-point number.
    #[error("coordinate component is not a number")]
    NotANumber,
}

/// A latitude/longitude pair in degrees.
///
/// Immutable value type; the wire names are `lat` and `long` to match the
/// public API contract. The query-string form is `"<lat>,<long>"`.
///
/// ## Examples
///
/// ```
/// use pronto_core::Coordinate;
///
/// let c = Coordinate::parse("-6.175, 106.827").unwrap();
/// assert!((c.lat - -6.175).abs() < f64::EPSILON);
///
/// assert!(Coordinate::parse("-6.175").is_err());         // one field
/// assert!(Coordinate::parse("a,b").is_err());            // not numbers
/// assert!(Coordinate::parse("1.0,2.0,3.0").is_err());    // three fields
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub long: f64,
}

impl Coordinate {
    /// Create a coordinate from latitude and longitude in degrees.
    #[must_use]
    pub const fn new(lat: f64, long: f64) -> Self {
        Self { lat, long }
    }

    /// Parse the `"<lat>,<long>"` query-string form.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinateError::Malformed`] unless the input is exactly two
    /// comma-separated fields, and [`CoordinateError::NotANumber`] if either
    /// field is not a floating-point number.
    pub fn parse(s: &str) -> Result<Self, CoordinateError> {
        let mut fields = s.split(',');
        let (Some(lat), Some(long), None) = (fields.next(), fields.next(), fields.next()) else {
            return Err(CoordinateError::Malformed);
        };

        let lat: f64 = lat
            .trim()
            .parse()
            .map_err(|_| CoordinateError::NotANumber)?;
        let long: f64 = long
            .trim()
            .parse()
            .map_err(|_| CoordinateError::NotANumber)?;

        Ok(Self { lat, long })
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lat, self.long)
    }
}

impl std::str::FromStr for Coordinate {
    type Err = CoordinateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
