//! Metrics collection and the status endpoint.

mod collector;
mod server;

pub use collector::MetricsCollector;
pub use server::StatusServer;
