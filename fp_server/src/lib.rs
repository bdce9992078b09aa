//! HTTP/WebSocket server for the Fermi poker engine.
//!
//! This crate wraps a [`fermi_poker::GameManager`] in an `axum` surface:
//! a versioned REST API for game setup and play, a WebSocket feed that
//! pushes redacted game snapshots on every change, and an optional
//! Prometheus exporter.
//!
//! - [`api`]: Router, handlers, and the WebSocket bridge
//! - [`config`]: Environment-driven server and game configuration
//! - [`metrics`]: Prometheus counters/gauges/histograms

pub mod api;
pub mod config;
pub mod metrics;
