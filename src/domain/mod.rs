// Domain layer - Rental, telemetry and session models
pub mod error;
pub mod location;
pub mod rental;
pub mod session;
