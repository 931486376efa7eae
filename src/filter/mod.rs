//! Stages for filtering samples.
//!
//! The de-emphasis filter is a single-pole recursive low-pass. Its output
//! feeds back into the next sample, so its phase response is not linear,
//! but one pole replaces what would take many FIR taps.
pub mod deemph;

pub use self::deemph::FmDeemph;
