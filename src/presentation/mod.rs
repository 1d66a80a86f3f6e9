// Presentation layer - HTTP surface and per-session views
pub mod app_state;
pub mod handlers;
pub mod sessions;
