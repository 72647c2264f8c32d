// Infrastructure layer - External dependencies and adapters
pub mod config;
pub mod export;
pub mod http_response;
pub mod icc_pro_client;
