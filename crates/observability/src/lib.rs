//! Observability infrastructure for OpenIndex
//!
//! This crate provides:
//! - Structured logging via tracing
//! - A Prometheus exporter bootstrap for the engine's metrics
//!
//! # Quick Start
//!
//! ```ignore
//! use observability::{init_logging, LogFormat};
//!
//! init_logging("openindex", LogFormat::Pretty)?;
//!
//! // Optional: expose /metrics for the counters the engine records
//! observability::metrics::init_metrics(9100)?;
//! ```

pub mod logging;
pub mod metrics;

pub use logging::{init_logging, LogFormat};
pub use metrics::init_metrics;
