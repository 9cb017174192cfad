// Presentation layer - HTTP surface and view composition
pub mod app_state;
pub mod handlers;
pub mod view_composer;
