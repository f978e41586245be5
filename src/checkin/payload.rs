//! Inbound check-in payload and its validation.

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::models::GeoPoint;

/// A coordinate as clients send it: a JSON number or a numeric string
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Coordinate {
    Number(f64),
    Text(String),
}

impl Coordinate {
    fn parse(&self, field: &str) -> Result<f64> {
        let value = match self {
            Coordinate::Number(n) => *n,
            Coordinate::Text(s) => s.trim().parse::<f64>().map_err(|_| {
                Error::Validation(format!("{} must be a number, got '{}'", field, s))
            })?,
        };
        if !value.is_finite() {
            return Err(Error::Validation(format!("{} must be finite", field)));
        }
        Ok(value)
    }
}

impl From<f64> for Coordinate {
    fn from(n: f64) -> Self {
        Coordinate::Number(n)
    }
}

/// `{latitude, longitude, accuracy?}` as posted by the client
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LocationPayload {
    #[serde(default)]
    pub latitude: Option<Coordinate>,
    #[serde(default)]
    pub longitude: Option<Coordinate>,
    /// Reported accuracy radius in meters
    #[serde(default)]
    pub accuracy: Option<Coordinate>,
}

/// Payload that passed validation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidatedLocation {
    pub point: GeoPoint,
    pub accuracy: Option<f64>,
}

impl LocationPayload {
    pub fn new(latitude: f64, longitude: f64, accuracy: Option<f64>) -> Self {
        Self {
            latitude: Some(latitude.into()),
            longitude: Some(longitude.into()),
            accuracy: accuracy.map(Coordinate::from),
        }
    }

    pub fn validate(&self) -> Result<ValidatedLocation> {
        let lat = self
            .latitude
            .as_ref()
            .ok_or_else(|| Error::Validation("latitude is required".to_string()))?
            .parse("latitude")?;
        let lon = self
            .longitude
            .as_ref()
            .ok_or_else(|| Error::Validation("longitude is required".to_string()))?
            .parse("longitude")?;

        let point = GeoPoint::new(lat, lon)?;

        let accuracy = match &self.accuracy {
            Some(raw) => {
                let accuracy = raw.parse("accuracy")?;
                if accuracy < 0.0 {
                    return Err(Error::Validation(format!(
                        "accuracy must not be negative, got {}",
                        accuracy
                    )));
                }
                Some(accuracy)
            }
            None => None,
        };

        Ok(ValidatedLocation { point, accuracy })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> LocationPayload {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_numbers_and_strings() {
        let numeric = parse(r#"{"latitude": 40.5, "longitude": -73.25, "accuracy": 8}"#)
            .validate()
            .unwrap();
        assert_eq!(numeric.point, GeoPoint { lat: 40.5, lon: -73.25 });
        assert_eq!(numeric.accuracy, Some(8.0));

        let text = parse(r#"{"latitude": " 40.5", "longitude": "-73.25"}"#)
            .validate()
            .unwrap();
        assert_eq!(text.point, numeric.point);
        assert_eq!(text.accuracy, None);
    }

    #[test]
    fn test_missing_latitude() {
        let err = parse(r#"{"longitude": 10.0}"#).validate().unwrap_err();
        assert!(matches!(err, Error::Validation(ref m) if m.contains("latitude")));
    }

    #[test]
    fn test_null_longitude_is_missing() {
        let err = parse(r#"{"latitude": 1.0, "longitude": null}"#)
            .validate()
            .unwrap_err();
        assert!(matches!(err, Error::Validation(ref m) if m.contains("longitude")));
    }

    #[test]
    fn test_unparseable_and_out_of_range() {
        assert!(parse(r#"{"latitude": "abc", "longitude": 1}"#)
            .validate()
            .is_err());
        assert!(parse(r#"{"latitude": 91, "longitude": 1}"#).validate().is_err());
        assert!(parse(r#"{"latitude": "NaN", "longitude": 1}"#)
            .validate()
            .is_err());
        assert!(parse(r#"{"latitude": 1, "longitude": "inf"}"#)
            .validate()
            .is_err());
    }

    #[test]
    fn test_negative_accuracy() {
        let payload = LocationPayload::new(1.0, 1.0, Some(-3.0));
        assert!(payload.validate().is_err());
    }
}
