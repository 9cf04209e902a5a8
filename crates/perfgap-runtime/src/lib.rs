//! # perfgap-runtime
//!
//! Configuration and orchestration around `perfgap-core`.
//!
//! The core pipeline is pure. This crate adds what a deployment needs:
//! - A YAML/JSON runtime config (thresholds, direction table, degenerate policy)
//! - Parallel fan-out of per-component computation for large batches
//! - Structured logging of each stage via `tracing`
//! - A timestamped [`RuntimeResult`], fixed by config for reproducible runs

pub mod config;
pub mod orchestrator;

pub use config::{
    standard_directions, ConfigError, DegeneratePolicy, DeterminismConfig, ParallelConfig,
    RuntimeConfig, STANDARD_COMPONENT_TYPES,
};
pub use orchestrator::{ExcludedComponent, RuntimeError, RuntimeOrchestrator, RuntimeResult};
