// Booking service - creates rentals and refreshes the directory
use crate::application::rental_repository::{bounded, RentalRepository};
use crate::application::tracking_service::TrackingService;
use crate::domain::error::TrackingResult;
use crate::domain::rental::{NewRental, RentalRecord};
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct BookingService {
    repository: Arc<dyn RentalRepository>,
    tracking: TrackingService,
    fetch_timeout: Duration,
}

impl BookingService {
    pub fn new(repository: Arc<dyn RentalRepository>, tracking: TrackingService, fetch_timeout: Duration) -> Self {
        Self {
            repository,
            tracking,
            fetch_timeout,
        }
    }

    pub async fn create(&self, rental: NewRental) -> TrackingResult<RentalRecord> {
        rental.validate()?;

        let created = bounded(self.fetch_timeout, self.repository.create_rental(&rental)).await?;
        tracing::info!(
            "Booked rental {} for {} ({})",
            created.rental_id,
            created.renter_name,
            created.vehicle_descriptor
        );

        // The booking stands even if the list can't be reloaded right now
        if let Err(e) = self.tracking.refresh().await {
            tracing::warn!("Directory refresh after booking failed: {}", e);
        }

        Ok(created)
    }
}
