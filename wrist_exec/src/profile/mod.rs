//! Dual-axis profile synchronisation module
//!
//! Generates a trapezoidal profile for each axis towards a target and slows the faster axis so
//! that both finish at the same time. The [`Synchroniser`] steps the pair once per cycle and
//! decides when the leg is complete.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod dual;
mod sync;
mod trap;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use dual::*;
pub use sync::*;
pub use trap::*;
