//! Helper functions shared by the stages.

/// Angle computations used by the FM discriminator
pub mod math;
