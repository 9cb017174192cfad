// Application layer - Use cases for the tracking console
pub mod booking_service;
pub mod directory;
pub mod location_poller;
pub mod rental_repository;
pub mod selection;
pub mod session_service;
pub mod summary_fetcher;
pub mod tracking_service;
