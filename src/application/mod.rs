// Application layer - Use cases on top of the irrigation API port
pub mod irrigation_api;
pub mod report_service;
pub mod session_service;

#[cfg(test)]
pub mod testing;
