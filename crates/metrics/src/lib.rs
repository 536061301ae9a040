//! Metrics collection for chatbridge.
//!
//! Endpoint crates record through the `metrics` facade using the metric names
//! re-exported here. Nothing is collected until [`init_metrics`] installs a
//! recorder, which requires the `prometheus` feature.
//!
//! ```rust,ignore
//! use chatbridge_metrics::{counter, endpoint};
//!
//! counter!(endpoint::POSTS_DROPPED_TOTAL, "endpoint" => "bot").increment(1);
//! ```

mod definitions;
mod recorder;

pub use {
    definitions::*,
    recorder::{MetricsError, MetricsHandle, init_metrics},
};

pub use metrics::{counter, gauge};
