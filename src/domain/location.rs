// Realtime location and trip summary models
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationSample {
    pub longitude: f64,
    pub latitude: f64,
    #[serde(default)]
    pub speed: f64,
    #[serde(alias = "cumulativeFuel", default)]
    pub cumulative_fuel: f64,
    #[serde(alias = "cumulativeDistance", default)]
    pub cumulative_distance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripSummary {
    #[serde(alias = "totalDistance")]
    pub total_distance: f64,
    #[serde(alias = "totalFuel")]
    pub total_fuel: f64,
}

/// Map camera position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub longitude: f64,
    pub latitude: f64,
    pub zoom: f64,
}

impl Viewport {
    pub fn new(longitude: f64, latitude: f64, zoom: f64) -> Self {
        Self {
            longitude,
            latitude,
            zoom,
        }
    }

    /// Center on a sample, keeping the given zoom.
    pub fn following(sample: &LocationSample, zoom: f64) -> Self {
        Self::new(sample.longitude, sample.latitude, zoom)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        // Fleet depot, Quezon City
        Self::new(121.11472431559307, 14.648879098920109, 15.0)
    }
}
