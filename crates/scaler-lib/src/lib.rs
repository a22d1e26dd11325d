//! Scaler library for metric-driven autoscaling
//!
//! This crate provides the core functionality for:
//! - Building and validating Azure Monitor metric queries
//! - Reducing a metrics response to the latest aggregation value
//! - Rounding that value into an integer scaling signal
//! - Monitoring API and credential collaborators
//! - Health checks and observability

pub mod azure;
pub mod error;
pub mod extract;
pub mod health;
pub mod models;
pub mod observability;
pub mod query;
pub mod response;
pub mod scaler;
pub mod signal;


pub use error::{QueryClientError, Result, ScalerError};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::{NoopEvents, ScalerEvents, ScalerMetrics, StructuredLogger};
pub use scaler::{MetricScaler, SignalReport};
