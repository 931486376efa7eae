//! Upper side band demodulation.
//!
//! Approximates SSB recovery by averaging the in-phase and quadrature
//! components of each sample. The sum is taken in the wide type of the
//! scalar so it cannot overflow before halving.

use crate::buffer::{transform, Buffer};
use crate::config::{check_type, rate_label, Config, ConfigError};
use crate::logger::{default_logger, Logger};
use crate::node::{Sink, SinkRef, Source};
use crate::sample::{Sample, Scalar};
use log::Level;
use num::Complex;
use num_traits::One;
use std::rc::Rc;

/// USB demodulator turning `Complex<S>` samples into `S`.
pub struct UsbDemod<S: Scalar> {
    buffer: Option<Buffer<S>>,
    source: Source<S>,
    logger: Rc<dyn Logger>,
}

impl<S: Scalar> UsbDemod<S> {
    pub fn new() -> Self {
        UsbDemod::with_logger(default_logger())
    }

    pub fn with_logger(logger: Rc<dyn Logger>) -> Self {
        UsbDemod {
            buffer: None,
            source: Source::new(),
            logger,
        }
    }

    pub fn connect(&mut self, sink: SinkRef<S>) -> Result<(), ConfigError> {
        self.source.connect(sink)
    }

    pub fn source(&self) -> &Source<S> {
        &self.source
    }

    pub fn is_configured(&self) -> bool {
        self.buffer.is_some()
    }

    /// Demodulates `input` into `output`, which may be a reinterpretation
    /// of the input storage.
    fn demodulate(input: &Buffer<Complex<S>>, output: &Buffer<S>) {
        let two = <S::Wide as One>::one() + <S::Wide as One>::one();
        transform(input, output, 0, |x| S::narrow((x.re.widen() + x.im.widen()) / two));
    }
}

impl<S: Scalar> Default for UsbDemod<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Scalar> Sink<Complex<S>> for UsbDemod<S> {
    fn configure(&mut self, config: &Config) -> Result<(), ConfigError> {
        let (sample_type, buffer_size) = match (config.sample_type(), config.buffer_size()) {
            (Some(t), Some(n)) => (t, n),
            _ => return Ok(()),
        };
        check_type::<Complex<S>>("USBDemod", sample_type)?;

        self.buffer = Some(Buffer::new(buffer_size));

        self.logger.log(
            Level::Debug,
            &format!(
                "Configure USBDemod: input type: {}, output type: {}, sample rate: {}, buffer size: {}",
                <Complex<S> as Sample>::TYPE,
                S::TYPE,
                rate_label(config),
                buffer_size
            ),
        );

        self.source.set_config(Config::new(
            Some(S::TYPE),
            config.sample_rate(),
            Some(buffer_size),
            Some(1),
        ))
    }

    fn process(&mut self, buffer: Buffer<Complex<S>>, allow_overwrite: bool) {
        if allow_overwrite {
            let out = buffer.reinterpret::<S>();
            Self::demodulate(&buffer, &out);
            self.source.send(out.head(buffer.len()), true);
        } else {
            let out = match self.buffer {
                Some(ref b) => b.clone(),
                None => {
                    self.logger
                        .log(Level::Warn, "USBDemod: dropping buffer, stage is not configured");
                    return;
                }
            };
            Self::demodulate(&buffer, &out);
            // The scratch buffer is written again on the next call.
            self.source.send(out.head(buffer.len()), false);
        }
    }
}
