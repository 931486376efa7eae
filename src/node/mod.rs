//! Provides the contract every stage implements and the plumbing to chain
//! stages together.
//!
//! Data is pushed synchronously: a source calls `process` on each connected
//! sink, which runs to completion (including pushing its own results further
//! downstream) before returning. Configuration travels the same way through
//! `configure`.
//!
//! # Example
//!
//! ```
//! use comms_demod::prelude::*;
//! use num::Complex;
//!
//! let (sink, output) = ChannelSink::<f32>::new();
//! let mut am = AmDemod::<f32>::new();
//! am.connect(shared(sink)).unwrap();
//!
//! am.configure(&Config::of::<Complex<f32>>(48e3, 2, 1)).unwrap();
//! am.process(Buffer::from_slice(&[Complex::new(3.0, 4.0), Complex::new(0.0, 2.0)]), false);
//!
//! let (samples, _) = output.recv().unwrap();
//! assert_eq!(samples, vec![5.0, 2.0]);
//! ```

use crate::buffer::Buffer;
use crate::config::{Config, ConfigError};
use crate::sample::Sample;
use std::cell::RefCell;
use std::rc::Rc;

pub mod channel;

/// Receiving end of a stage connection.
pub trait Sink<T: Sample> {
    /// (Re)configures the sink for the stream described by `config`.
    ///
    /// Descriptors lacking fields the sink needs are ignored. A descriptor
    /// of the wrong sample type is rejected and leaves the sink unchanged.
    fn configure(&mut self, config: &Config) -> Result<(), ConfigError>;

    /// Handles a buffer. If `allow_overwrite` is true, no other holder will
    /// read `buffer` after this call and the sink may write into it.
    fn process(&mut self, buffer: Buffer<T>, allow_overwrite: bool);
}

/// A sink shared between the stage that owns it and its upstream source.
pub type SinkRef<T> = Rc<RefCell<dyn Sink<T>>>;

/// Wraps a sink so it can be connected to a `Source`.
pub fn shared<S>(sink: S) -> Rc<RefCell<S>> {
    Rc::new(RefCell::new(sink))
}

/// The sending half of a stage: holds the downstream sinks and the
/// configuration last propagated to them.
pub struct Source<T: Sample> {
    config: Config,
    sinks: Vec<SinkRef<T>>,
}

impl<T: Sample> Source<T> {
    pub fn new() -> Self {
        Source {
            config: Config::default(),
            sinks: vec![],
        }
    }

    /// Connects a sink. If this source was already configured, the sink is
    /// configured right away.
    pub fn connect(&mut self, sink: SinkRef<T>) -> Result<(), ConfigError> {
        if self.config.has_type() {
            sink.borrow_mut().configure(&self.config)?;
        }
        self.sinks.push(sink);
        Ok(())
    }

    /// Removes a previously connected sink.
    pub fn disconnect(&mut self, sink: &SinkRef<T>) {
        self.sinks.retain(|s| !Rc::ptr_eq(s, sink));
    }

    pub fn num_sinks(&self) -> usize {
        self.sinks.len()
    }

    /// The descriptor last passed to `set_config`.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Stores `config` and forwards it to every sink. Stops at the first
    /// sink that rejects it.
    pub fn set_config(&mut self, config: Config) -> Result<(), ConfigError> {
        self.config = config;
        for sink in &self.sinks {
            sink.borrow_mut().configure(&config)?;
        }
        Ok(())
    }

    /// Pushes `buffer` to every sink. Overwrite permission is only passed
    /// on when there is a single sink, otherwise the sinks would see each
    /// other's writes.
    pub fn send(&self, buffer: Buffer<T>, allow_overwrite: bool) {
        let allow_overwrite = allow_overwrite && self.sinks.len() == 1;
        for sink in &self.sinks {
            sink.borrow_mut().process(buffer.clone(), allow_overwrite);
        }
    }
}

impl<T: Sample> Default for Source<T> {
    fn default() -> Self {
        Self::new()
    }
}
