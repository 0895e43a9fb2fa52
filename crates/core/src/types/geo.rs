//! Geographic points and great-circle distance.

use serde::{Deserialize, Serialize};

/// Sphere radius in metres used for distance calculations.
pub const EARTH_RADIUS_METERS: f64 = 6_378_100.0;

/// Errors that can occur when constructing a [`GeoPoint`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq)]
pub enum GeoError {
    /// Longitude is not a finite number in `[-180, 180]`.
    #[error("longitude must be between -180 and 180 (got {0})")]
    Longitude(f64),
    /// Latitude is not a finite number in `[-90, 90]`.
    #[error("latitude must be between -90 and 90 (got {0})")]
    Latitude(f64),
}

/// A point on the globe, longitude first.
///
/// Deserialization goes through [`GeoPoint::new`], so out-of-range input is
/// rejected.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawGeoPoint")]
pub struct GeoPoint {
    lng: f64,
    lat: f64,
}

#[derive(Deserialize)]
struct RawGeoPoint {
    lng: f64,
    lat: f64,
}

impl TryFrom<RawGeoPoint> for GeoPoint {
    type Error = GeoError;

    fn try_from(raw: RawGeoPoint) -> Result<Self, Self::Error> {
        Self::new(raw.lng, raw.lat)
    }
}

impl GeoPoint {
    /// Create a point after range-checking both coordinates.
    ///
    /// # Errors
    ///
    /// Returns `GeoError` if either coordinate is out of range or not finite.
    pub fn new(lng: f64, lat: f64) -> Result<Self, GeoError> {
        if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
            return Err(GeoError::Longitude(lng));
        }
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(GeoError::Latitude(lat));
        }
        Ok(Self { lng, lat })
    }

    /// Longitude in degrees.
    #[must_use]
    pub const fn lng(&self) -> f64 {
        self.lng
    }

    /// Latitude in degrees.
    #[must_use]
    pub const fn lat(&self) -> f64 {
        self.lat
    }

    /// Great-circle (haversine) distance to `other` in metres.
    #[must_use]
    pub fn distance_to(&self, other: &Self) -> f64 {
        let (lat1, lat2) = (self.lat.to_radians(), other.lat.to_radians());
        let d_lat = lat2 - lat1;
        let d_lng = (other.lng - self.lng).to_radians();

        let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_METERS * a.sqrt().min(1.0).asin()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_out_of_range() {
        assert_eq!(GeoPoint::new(181.0, 0.0), Err(GeoError::Longitude(181.0)));
        assert_eq!(GeoPoint::new(0.0, -90.5), Err(GeoError::Latitude(-90.5)));
        assert!(GeoPoint::new(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn test_distance_to_self_is_zero() {
        let p = GeoPoint::new(-79.38, 43.65).unwrap();
        assert!(p.distance_to(&p).abs() < 1e-6);
    }

    #[test]
    fn test_distance_one_degree_latitude() {
        let a = GeoPoint::new(0.0, 0.0).unwrap();
        let b = GeoPoint::new(0.0, 1.0).unwrap();
        let expected = EARTH_RADIUS_METERS * 1.0_f64.to_radians();
        assert!((a.distance_to(&b) - expected).abs() < 1.0);
    }

    #[test]
    fn test_distance_is_symmetric() {
        let toronto = GeoPoint::new(-79.3832, 43.6532).unwrap();
        let hamilton = GeoPoint::new(-79.8711, 43.2557).unwrap();
        let d = toronto.distance_to(&hamilton);
        assert!((d - hamilton.distance_to(&toronto)).abs() < 1e-6);
        assert!(d > 55_000.0 && d < 65_000.0);
    }

    #[test]
    fn test_deserialize_checks_range() {
        let p: GeoPoint = serde_json::from_str(r#"{"lng":-79.38,"lat":43.65}"#).unwrap();
        assert_eq!(p, GeoPoint::new(-79.38, 43.65).unwrap());

        let err = serde_json::from_str::<GeoPoint>(r#"{"lng":0.0,"lat":91.0}"#).unwrap_err();
        assert!(err.to_string().contains("latitude"));
    }
}
