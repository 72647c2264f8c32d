// Presentation layer - HTTP routes, handlers and pages
pub mod app_state;
pub mod error;
pub mod handlers;
pub mod pages;
pub mod router;
