// Repository trait for the fleet backend
use crate::domain::error::{TrackingError, TrackingResult};
use crate::domain::location::{LocationSample, TripSummary};
use crate::domain::rental::{NewRental, RentalRecord};
use crate::domain::session::{AdminDetails, AuthUser, Credentials};
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;

#[async_trait]
pub trait RentalRepository: Send + Sync {
    /// List all rentals known to the backend, in backend order
    async fn list_rentals(&self) -> TrackingResult<Vec<RentalRecord>>;

    /// Latest telemetry for an ongoing rental; `NotFound` until the vehicle reports
    async fn realtime_location(&self, rental_id: &str) -> TrackingResult<LocationSample>;

    /// Aggregate distance and fuel for a completed rental
    async fn trip_summary(&self, rental_id: &str) -> TrackingResult<TripSummary>;

    async fn create_rental(&self, rental: &NewRental) -> TrackingResult<RentalRecord>;

    async fn login(&self, credentials: &Credentials) -> TrackingResult<AuthUser>;

    async fn admin_details(&self, user_id: &str) -> TrackingResult<AdminDetails>;

    /// Bearer token attached to subsequent requests
    fn set_token(&self, _token: Option<String>) {}
}

/// Run a backend call under a deadline. Elapsed deadlines become `Timeout`.
pub async fn bounded<T, F>(limit: Duration, call: F) -> TrackingResult<T>
where
    F: Future<Output = TrackingResult<T>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(TrackingError::Timeout(limit.as_millis() as u64)),
    }
}
