//! FM demodulation by differentiating the phase of successive samples.
//!
//! Only the discriminator lives here. The de-emphasis that broadcast FM
//! needs afterwards is a separate stage, `filter::deemph::FmDeemph`.
//!
//! The phase is halved before differencing, so a full turn of the input
//! phasor between two samples maps to half the output range. The loop over
//! a buffer starts at index 1: output slot 0 is never computed and keeps
//! whatever the target storage held before (the raw bytes of the first
//! input sample when working in place, an earlier result otherwise), and
//! the first input sample does not update the running phase.

use crate::buffer::{transform, Buffer};
use crate::config::{check_type, rate_label, Config, ConfigError};
use crate::logger::{default_logger, Logger};
use crate::node::{Sink, SinkRef, Source};
use crate::sample::{Sample, Scalar};
use crate::util::math::PhaseScalar;
use log::Level;
use num::Complex;
use std::marker::PhantomData;
use std::mem;
use std::rc::Rc;

/// FM discriminator from `Complex<I>` samples to `O` samples.
pub struct FmDemod<I: Scalar, O: PhaseScalar = I> {
    /// Bit shift between input and output scalar widths.
    shift: i32,
    last_value: O,
    can_overwrite: bool,
    buffer: Option<Buffer<O>>,
    source: Source<O>,
    logger: Rc<dyn Logger>,
    _input: PhantomData<fn(I)>,
}

impl<I: Scalar, O: PhaseScalar> FmDemod<I, O> {
    pub fn new() -> Self {
        FmDemod::with_logger(default_logger())
    }

    pub fn with_logger(logger: Rc<dyn Logger>) -> Self {
        let shift = 8 * (mem::size_of::<O>() as i32 - mem::size_of::<I>() as i32);
        FmDemod {
            shift,
            last_value: O::zero(),
            can_overwrite: false,
            buffer: None,
            source: Source::new(),
            logger,
            _input: PhantomData,
        }
    }

    pub fn connect(&mut self, sink: SinkRef<O>) -> Result<(), ConfigError> {
        self.source.connect(sink)
    }

    pub fn source(&self) -> &Source<O> {
        &self.source
    }

    pub fn is_configured(&self) -> bool {
        self.buffer.is_some()
    }

    /// True if an output sample fits into the storage of an input sample,
    /// so that buffers handed over with overwrite permission can be reused.
    pub fn can_overwrite(&self) -> bool {
        self.can_overwrite
    }

    /// Output scale relative to the input, as a power of two.
    pub fn output_shift(&self) -> i32 {
        self.shift
    }

    /// Half the phase of the most recently demodulated sample.
    pub fn last_phase(&self) -> O {
        self.last_value
    }

    fn demodulate(&mut self, input: &Buffer<Complex<I>>, output: &Buffer<O>) {
        let two = O::one() + O::one();
        let last = &mut self.last_value;
        transform(input, output, 1, |x| {
            let phi = O::angle(x.re.as_f64(), x.im.as_f64()) / two;
            let dphi = *last - phi;
            *last = phi;
            dphi
        });
    }
}

impl<I: Scalar, O: PhaseScalar> Default for FmDemod<I, O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: Scalar, O: PhaseScalar> Sink<Complex<I>> for FmDemod<I, O> {
    fn configure(&mut self, config: &Config) -> Result<(), ConfigError> {
        let (sample_type, buffer_size) = match (config.sample_type(), config.buffer_size()) {
            (Some(t), Some(n)) => (t, n),
            _ => return Ok(()),
        };
        check_type::<Complex<I>>("FMDemod", sample_type)?;

        self.buffer = Some(Buffer::new(buffer_size));
        self.last_value = O::zero();
        self.can_overwrite = mem::size_of::<Complex<I>>() >= mem::size_of::<O>();

        self.logger.log(
            Level::Debug,
            &format!(
                "Configured FMDemod node: sample rate: {}, in-type / out-type: {} / {}, in-place: {}, output scale: 2^{}",
                rate_label(config),
                <Complex<I> as Sample>::TYPE,
                O::TYPE,
                self.can_overwrite,
                self.shift
            ),
        );

        self.source.set_config(Config::new(
            Some(O::TYPE),
            config.sample_rate(),
            Some(buffer_size),
            Some(1),
        ))
    }

    fn process(&mut self, buffer: Buffer<Complex<I>>, allow_overwrite: bool) {
        if buffer.is_empty() {
            return;
        }

        if allow_overwrite && self.can_overwrite {
            let out = buffer.reinterpret::<O>();
            self.demodulate(&buffer, &out);
            self.source.send(out.head(buffer.len()), true);
        } else {
            let out = match self.buffer {
                Some(ref b) => b.clone(),
                None => {
                    self.logger
                        .log(Level::Warn, "FMDemod: dropping buffer, stage is not configured");
                    return;
                }
            };
            self.demodulate(&buffer, &out);
            self.source.send(out.head(buffer.len()), false);
        }
    }
}
