// Application state for HTTP handlers
use crate::application::booking_service::BookingService;
use crate::application::session_service::SessionService;
use crate::application::tracking_service::TrackingService;

#[derive(Clone)]
pub struct AppState {
    pub tracking: TrackingService,
    pub bookings: BookingService,
    pub sessions: SessionService,
}
