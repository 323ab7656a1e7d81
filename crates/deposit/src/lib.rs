//! Deterministic oil deposit generation.
//!
//! For a world seed and a chunk, decides whether a deposit is rooted there and
//! which structures it is made of, then writes those structures into a
//! [`WorldAccess`](oilgen_world::WorldAccess) one chunk at a time. See
//! [`DepositGenerator::populate`] for the entry point a world generator calls.

mod cache;
mod composer;
mod config;
mod generator;
mod placement;
mod rng;
mod scanner;
mod structure;

pub use cache::*;
pub use composer::*;
pub use config::*;
pub use generator::*;
pub use placement::*;
pub use rng::*;
pub use scanner::*;
pub use structure::*;
