// Common types and utilities shared across Fleetlink services

pub mod config;
pub mod error;
pub mod metrics;
pub mod types;

pub use config::{GatewayConfig, IngestConfig};
pub use error::*;
pub use metrics::MetricsCollector;
pub use types::*;
