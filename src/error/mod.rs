mod app;
mod collector;
mod data;
mod monitor;
mod sink;
mod validation;

#[cfg(test)]
mod test_support;

pub use app::{AppError, AppResult};
pub use collector::CollectorError;
pub use data::DataError;
pub use monitor::MonitorError;
pub use sink::SinkError;
pub use validation::ValidationError;
