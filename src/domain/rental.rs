// Rental domain model
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use super::error::{TrackingError, TrackingResult};

/// Lifecycle state of a rental. Transitions are decided by the backend;
/// the console only observes them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RentalStatus {
    Upcoming,
    Ongoing,
    Completed,
    Canceled,
    Other(String),
}

impl RentalStatus {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "upcoming" => Self::Upcoming,
            "ongoing" => Self::Ongoing,
            "completed" => Self::Completed,
            "canceled" | "cancelled" => Self::Canceled,
            _ => Self::Other(raw.trim().to_string()),
        }
    }

    /// Directory ordering: Ongoing first, then Upcoming, then Completed.
    /// Everything else sorts last.
    pub fn priority(&self) -> u8 {
        match self {
            Self::Ongoing => 1,
            Self::Upcoming => 2,
            Self::Completed => 3,
            Self::Canceled | Self::Other(_) => 4,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Upcoming => "upcoming",
            Self::Ongoing => "ongoing",
            Self::Completed => "completed",
            Self::Canceled => "canceled",
            Self::Other(raw) => raw,
        }
    }
}

impl fmt::Display for RentalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for RentalStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for RentalStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RentalRecord {
    #[serde(alias = "rentalId", deserialize_with = "string_or_number")]
    pub rental_id: String,
    #[serde(alias = "renterName", default)]
    pub renter_name: String,
    #[serde(alias = "vehicleDescriptor", default)]
    pub vehicle_descriptor: String,
    #[serde(alias = "pickupDate", deserialize_with = "flexible_datetime")]
    pub pickup_date: NaiveDateTime,
    #[serde(alias = "dropoffDate", deserialize_with = "flexible_datetime")]
    pub dropoff_date: NaiveDateTime,
    #[serde(alias = "rent_status")]
    pub status: RentalStatus,
}

/// Booking request sent to `POST /rentals`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRental {
    pub renter_name: String,
    pub vehicle_descriptor: String,
    #[serde(deserialize_with = "flexible_datetime")]
    pub pickup_date: NaiveDateTime,
    #[serde(deserialize_with = "flexible_datetime")]
    pub dropoff_date: NaiveDateTime,
}

impl NewRental {
    pub fn validate(&self) -> TrackingResult<()> {
        if self.renter_name.trim().is_empty() {
            return Err(TrackingError::Validation("renter name is required".into()));
        }
        if self.vehicle_descriptor.trim().is_empty() {
            return Err(TrackingError::Validation("vehicle is required".into()));
        }
        if self.dropoff_date < self.pickup_date {
            return Err(TrackingError::Validation(
                "dropoff date must not precede pickup date".into(),
            ));
        }
        Ok(())
    }
}

/// Parse the date shapes the backend has been seen to emit:
/// RFC 3339, naive `YYYY-MM-DDTHH:MM:SS[.f]` and bare `YYYY-MM-DD`.
pub fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(dt);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn flexible_datetime<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse_datetime(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("unrecognised date: {}", raw)))
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse_is_case_insensitive() {
        assert_eq!(RentalStatus::parse("Ongoing"), RentalStatus::Ongoing);
        assert_eq!(RentalStatus::parse(" UPCOMING "), RentalStatus::Upcoming);
        assert_eq!(RentalStatus::parse("cancelled"), RentalStatus::Canceled);
        assert_eq!(
            RentalStatus::parse("on-hold"),
            RentalStatus::Other("on-hold".to_string())
        );
    }

    #[test]
    fn test_record_from_backend_json() {
        let json = r#"{
            "rental_id": 7,
            "renter_name": "Ana Cruz",
            "vehicle_descriptor": "Toyota Vios ABC-123",
            "pickup_date": "2024-11-20T08:30:00",
            "dropoff_date": "2024-11-22",
            "rent_status": "completed"
        }"#;

        let record: RentalRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.rental_id, "7");
        assert_eq!(record.status, RentalStatus::Completed);
        assert_eq!(
            record.dropoff_date,
            NaiveDate::from_ymd_opt(2024, 11, 22).unwrap().and_hms_opt(0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_parse_datetime_rfc3339() {
        let parsed = parse_datetime("2024-11-20T08:30:00Z").unwrap();
        assert_eq!(parsed.to_string(), "2024-11-20 08:30:00");
        assert!(parse_datetime("tomorrow").is_none());
    }

    #[test]
    fn test_new_rental_validation() {
        let pickup = parse_datetime("2024-11-20").unwrap();
        let mut booking = NewRental {
            renter_name: "Ana Cruz".into(),
            vehicle_descriptor: "Toyota Vios".into(),
            pickup_date: pickup,
            dropoff_date: parse_datetime("2024-11-22").unwrap(),
        };
        assert!(booking.validate().is_ok());

        booking.renter_name = "  ".into();
        assert!(matches!(booking.validate(), Err(TrackingError::Validation(_))));

        booking.renter_name = "Ana Cruz".into();
        booking.dropoff_date = parse_datetime("2024-11-19").unwrap();
        assert!(matches!(booking.validate(), Err(TrackingError::Validation(_))));
    }
}
