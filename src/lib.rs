//! Cost functions for gradient-based quantum control pulse optimization
//!
//! This crate scores proposed control pulses (and, for state-dependent cost
//! variants, the resulting simulated quantum states) against physical and
//! numerical desiderata. Each cost term returns a normalized, weighted scalar
//! penalty together with its gradient, so a gradient-based optimizer can
//! minimize the aggregated objective by adjusting the raw controls.

pub mod costs;
pub mod objective;

// Create a prelude module for convenient imports
pub mod prelude {
    pub use crate::costs::prelude::*;
    pub use crate::objective::CostSet;
}

// Version and crate information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const CRATE_NAME: &str = env!("CARGO_PKG_NAME");
