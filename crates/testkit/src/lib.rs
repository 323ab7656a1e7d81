#![warn(missing_docs)]
//! Deterministic testing surfaces for deposit generation: reference worlds,
//! world fingerprints, chunk-walk worldtests, JSON snapshots and metrics.

mod fixtures;
mod metrics;
mod snapshot;
mod worldtest;

pub use fixtures::*;
pub use metrics::*;
pub use snapshot::*;
pub use worldtest::*;
