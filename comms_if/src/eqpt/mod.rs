//! # Equipment Interface
//!
//! This module defines the interface structures passed between the coordinator and the actuators
//! and sensors of the mechanism.

// -----------------------------------------------------------------------------------------------
// MODULES
// -----------------------------------------------------------------------------------------------

pub mod wristevator;
