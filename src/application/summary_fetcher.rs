// Trip summary fetcher - one-shot aggregate for completed rentals
use crate::application::rental_repository::{bounded, RentalRepository};
use crate::domain::error::{TrackingError, TrackingResult};
use crate::domain::location::TripSummary;
use std::sync::Arc;
use std::time::Duration;

pub const NO_SUMMARY_MESSAGE: &str = "No summary available";
pub const SUMMARY_FAILED_MESSAGE: &str = "Could not load the trip summary. Select the rental again to retry.";

#[derive(Clone)]
pub struct TripSummaryFetcher {
    repository: Arc<dyn RentalRepository>,
    fetch_timeout: Duration,
}

impl TripSummaryFetcher {
    pub fn new(repository: Arc<dyn RentalRepository>, fetch_timeout: Duration) -> Self {
        Self {
            repository,
            fetch_timeout,
        }
    }

    /// Single attempt, no retry.
    pub async fn fetch_once(&self, rental_id: &str) -> TrackingResult<TripSummary> {
        let result = bounded(self.fetch_timeout, self.repository.trip_summary(rental_id)).await;
        if let Err(e) = &result {
            tracing::warn!("Trip summary for rental {} unavailable: {}", rental_id, e);
        }
        result
    }
}

/// User-facing text for a failed summary fetch.
pub fn describe_failure(error: &TrackingError) -> &'static str {
    match error {
        TrackingError::NotFound(_) => NO_SUMMARY_MESSAGE,
        _ => SUMMARY_FAILED_MESSAGE,
    }
}
