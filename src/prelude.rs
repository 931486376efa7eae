//! This module provides an easy single import for those using this crate.

pub use crate::buffer::Buffer;
pub use crate::config::{Config, ConfigError};
pub use crate::demodulation::{AmDemod, FmDemod, UsbDemod};
pub use crate::filter::FmDeemph;
pub use crate::logger::{LogManager, Logger};
pub use crate::node::channel::ChannelSink;
pub use crate::node::{shared, Sink, SinkRef, Source};
pub use crate::sample::{Sample, SampleType, Scalar, ScalarType};
