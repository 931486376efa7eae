//! A terminal sink handing demodulated samples over to another thread.
//!
//! Buffers are reference counted with `Rc` and cannot leave the thread that
//! runs the chain, so the sink copies the valid samples out and sends them
//! through a crossbeam channel, e.g. to an audio playback thread.

use crate::buffer::Buffer;
use crate::config::{check_type, Config, ConfigError};
use crate::node::Sink;
use crate::sample::Sample;
use crossbeam::channel::{self, Receiver, Sender};

/// Forwards a copy of every received buffer, together with the overwrite
/// flag it came with, to a channel.
pub struct ChannelSink<T: Sample> {
    sender: Sender<(Vec<T>, bool)>,
    config: Option<Config>,
}

impl<T: Sample + Send> ChannelSink<T> {
    /// Creates a sink backed by an unbounded channel and returns the
    /// receiving end along with it.
    pub fn new() -> (Self, Receiver<(Vec<T>, bool)>) {
        let (send, recv) = channel::unbounded();
        (ChannelSink::with_sender(send), recv)
    }

    /// Creates a sink pushing into an existing channel.
    pub fn with_sender(sender: Sender<(Vec<T>, bool)>) -> Self {
        ChannelSink {
            sender,
            config: None,
        }
    }

    /// The last configuration this sink accepted.
    pub fn config(&self) -> Option<&Config> {
        self.config.as_ref()
    }
}

impl<T: Sample + Send> Sink<T> for ChannelSink<T> {
    fn configure(&mut self, config: &Config) -> Result<(), ConfigError> {
        if let Some(sample_type) = config.sample_type() {
            check_type::<T>("ChannelSink", sample_type)?;
            self.config = Some(*config);
        }
        Ok(())
    }

    fn process(&mut self, buffer: Buffer<T>, allow_overwrite: bool) {
        // A disconnected receiver just means nobody listens anymore.
        let _ = self.sender.send((buffer.to_vec(), allow_overwrite));
    }
}
