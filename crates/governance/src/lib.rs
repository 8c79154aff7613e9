#![deny(unused)]
//! Observability for ShopSeeker.
//!
//! This crate provides:
//! - Log/trace subscriber setup
//! - Analysis metrics and the Prometheus recorder

pub mod metrics;
pub mod tracing_layer;

pub use crate::metrics::{setup_metrics_recorder, track_analysis, track_ingest};
pub use tracing_layer::configure_tracing;
