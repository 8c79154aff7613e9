use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A latitude/longitude pair used to bias the location-aware search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCoordinate")]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

#[derive(Deserialize)]
struct RawCoordinate {
    latitude: f64,
    longitude: f64,
}

impl TryFrom<RawCoordinate> for Coordinate {
    type Error = Error;

    fn try_from(raw: RawCoordinate) -> Result<Self> {
        Coordinate::new(raw.latitude, raw.longitude)
    }
}

impl Coordinate {
    /// Build a coordinate, rejecting values outside the WGS84 range.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(Error::location_unavailable(format!(
                "latitude out of range: {}",
                latitude
            )));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(Error::location_unavailable(format!(
                "longitude out of range: {}",
                longitude
            )));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_out_of_range() {
        assert!(Coordinate::new(91.0, 0.0).is_err());
        assert!(Coordinate::new(0.0, -180.5).is_err());
        assert!(Coordinate::new(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn test_deserialize_checks_range() {
        let c: Coordinate =
            serde_json::from_str(r#"{"latitude": 35.0, "longitude": 139.0}"#).unwrap();
        assert_eq!(c, Coordinate::new(35.0, 139.0).unwrap());

        let err = serde_json::from_str::<Coordinate>(r#"{"latitude": 123.0, "longitude": 0.0}"#)
            .unwrap_err();
        assert!(err.to_string().contains("latitude out of range"));
    }

    #[test]
    fn test_accepts_bounds() {
        let c = Coordinate::new(-90.0, 180.0).unwrap();
        assert_eq!(c.latitude(), -90.0);
        assert_eq!(c.longitude(), 180.0);
    }
}
