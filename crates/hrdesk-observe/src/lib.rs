//! Observability setup for HRDesk.

pub mod tracing_setup;
