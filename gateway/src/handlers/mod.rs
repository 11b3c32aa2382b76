// HTTP handlers for the upload gateway
pub mod fixes;
pub mod health;
pub mod metrics;
pub mod upload;
