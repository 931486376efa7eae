//! Demodulation stages for software defined radio receivers.
//!
//! Stages are chained by connecting the `Source` of one to the `Sink` of the
//! next. Configuration and sample buffers are pushed downstream
//! synchronously, and buffers are reused in place whenever the upstream
//! stage gives up ownership.

pub mod buffer;
pub mod config;
pub mod demodulation;
pub mod filter;
pub mod logger;
pub mod node;
pub mod prelude;
pub mod sample;
pub mod util;
