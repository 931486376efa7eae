//! Amplitude demodulation: the output is the magnitude of each I/Q sample.

use crate::buffer::{transform, Buffer};
use crate::config::{check_type, rate_label, Config, ConfigError};
use crate::logger::{default_logger, Logger};
use crate::node::{Sink, SinkRef, Source};
use crate::sample::{Sample, Scalar};
use log::Level;
use num::Complex;
use std::rc::Rc;

/// AM demodulator turning `Complex<S>` samples into `S` magnitudes.
pub struct AmDemod<S: Scalar> {
    buffer: Option<Buffer<S>>,
    source: Source<S>,
    logger: Rc<dyn Logger>,
}

impl<S: Scalar> AmDemod<S> {
    pub fn new() -> Self {
        AmDemod::with_logger(default_logger())
    }

    pub fn with_logger(logger: Rc<dyn Logger>) -> Self {
        AmDemod {
            buffer: None,
            source: Source::new(),
            logger,
        }
    }

    /// Connects a downstream sink to the demodulator output.
    pub fn connect(&mut self, sink: SinkRef<S>) -> Result<(), ConfigError> {
        self.source.connect(sink)
    }

    pub fn source(&self) -> &Source<S> {
        &self.source
    }

    pub fn is_configured(&self) -> bool {
        self.buffer.is_some()
    }
}

impl<S: Scalar> Default for AmDemod<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Scalar> Sink<Complex<S>> for AmDemod<S> {
    fn configure(&mut self, config: &Config) -> Result<(), ConfigError> {
        let (sample_type, buffer_size) = match (config.sample_type(), config.buffer_size()) {
            (Some(t), Some(n)) => (t, n),
            _ => return Ok(()),
        };
        check_type::<Complex<S>>("AMDemod", sample_type)?;

        // Replacing the scratch buffer releases the previous one.
        self.buffer = Some(Buffer::new(buffer_size));

        self.logger.log(
            Level::Debug,
            &format!(
                "Configure AMDemod: input type: {}, output type: {}, sample rate: {}, buffer size: {}",
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
            config.num_buffers(),
        ))
    }

    fn process(&mut self, buffer: Buffer<Complex<S>>, allow_overwrite: bool) {
        let out = if allow_overwrite {
            buffer.reinterpret::<S>()
        } else {
            match self.buffer {
                Some(ref b) => b.clone(),
                None => {
                    self.logger
                        .log(Level::Warn, "AMDemod: dropping buffer, stage is not configured");
                    return;
                }
            }
        };

        transform(&buffer, &out, 0, |x| {
            let (re, im) = (x.re.as_f64(), x.im.as_f64());
            S::from_f64((re * re + im * im).sqrt())
        });

        // Either the caller gave up the input buffer or the scratch buffer
        // is not needed by this stage anymore, so both may be overwritten.
        self.source.send(out.head(buffer.len()), true);
    }
}
