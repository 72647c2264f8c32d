// Domain layer - Report shapes and the pure transformations behind them
pub mod credentials;
pub mod historical;
pub mod report;
pub mod row_set;
pub mod timestamp;
