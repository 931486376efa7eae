//! De-emphasis of demodulated FM audio.
//!
//! Broadcast FM boosts high audio frequencies before transmission. The
//! receiver undoes this with a single-pole low-pass whose time constant is
//! 75 us in the Americas and 50 us elsewhere. The pole is expressed as an
//! integer divisor `alpha` so the filter also runs on integer samples:
//!
//! `avg += (x - avg) / alpha`
//!
//! For integer samples the division rounds half away from zero,
//! symmetrically for positive and negative steps, so the average does not
//! drift toward zero.

use crate::buffer::{transform, Buffer};
use crate::config::{check_type, Config, ConfigError};
use crate::logger::{default_logger, Logger};
use crate::node::{Sink, SinkRef, Source};
use crate::sample::Scalar;
use log::Level;
use std::rc::Rc;

/// Time constant of the North American broadcast pre-emphasis, in seconds.
pub const TAU_75US: f64 = 75e-6;
/// Time constant used in Europe and most other regions, in seconds.
pub const TAU_50US: f64 = 50e-6;

/// Scalars the de-emphasis filter can run on.
pub trait DeemphScalar: Scalar {
    /// Moves `avg` toward `input` by `1 / alpha` of the difference.
    fn smooth(avg: Self, input: Self, alpha: i32) -> Self;
}

macro_rules! impl_deemph_int {
    ($($t:ty),*) => {
        $(
            impl DeemphScalar for $t {
                #[inline]
                fn smooth(avg: Self, input: Self, alpha: i32) -> Self {
                    let alpha = i64::from(alpha);
                    let diff = input as i64 - avg as i64;
                    let step = if diff > 0 {
                        (diff + alpha / 2) / alpha
                    } else {
                        (diff - alpha / 2) / alpha
                    };
                    // The step never exceeds the difference, so the result
                    // lies between `avg` and `input`.
                    (avg as i64 + step) as $t
                }
            }
        )*
    };
}

macro_rules! impl_deemph_float {
    ($($t:ty),*) => {
        $(
            impl DeemphScalar for $t {
                #[inline]
                fn smooth(avg: Self, input: Self, alpha: i32) -> Self {
                    avg + (input - avg) / alpha as $t
                }
            }
        )*
    };
}

impl_deemph_int!(u8, i8, u16, i16, i32);
impl_deemph_float!(f32, f64);

/// Computes the filter divisor for the given sample rate and time constant.
///
/// # Examples
///
/// ```
/// use comms_demod::filter::deemph::{alpha, TAU_75US};
///
/// assert_eq!(alpha(48_000.0, TAU_75US), 4);
/// assert_eq!(alpha(240_000.0, TAU_75US), 19);
/// ```
pub fn alpha(sample_rate: f64, tau: f64) -> i32 {
    let alpha = (1.0 / (1.0 - (-1.0 / (sample_rate * tau)).exp())).round();
    if alpha.is_finite() && alpha >= 1.0 {
        alpha as i32
    } else {
        1
    }
}

/// FM de-emphasis filter stage. Passes buffers through untouched while
/// disabled.
pub struct FmDeemph<S: DeemphScalar> {
    enabled: bool,
    tau: f64,
    alpha: i32,
    avg: S,
    buffer: Option<Buffer<S>>,
    source: Source<S>,
    logger: Rc<dyn Logger>,
}

impl<S: DeemphScalar> FmDeemph<S> {
    /// An enabled filter with the 75 us time constant.
    pub fn new() -> Self {
        FmDeemph::with_enabled(true)
    }

    pub fn with_enabled(enabled: bool) -> Self {
        FmDeemph {
            enabled,
            tau: TAU_75US,
            alpha: 1,
            avg: S::zero(),
            buffer: None,
            source: Source::new(),
            logger: default_logger(),
        }
    }

    /// Uses `tau` seconds as time constant from the next configuration on.
    pub fn with_time_constant(mut self, tau: f64) -> Self {
        self.tau = tau;
        self
    }

    pub fn with_logger(mut self, logger: Rc<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn connect(&mut self, sink: SinkRef<S>) -> Result<(), ConfigError> {
        self.source.connect(sink)
    }

    pub fn source(&self) -> &Source<S> {
        &self.source
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn enable(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_configured(&self) -> bool {
        self.buffer.is_some()
    }

    pub fn alpha(&self) -> i32 {
        self.alpha
    }

    pub fn average(&self) -> S {
        self.avg
    }

    fn filter(&mut self, input: &Buffer<S>, output: &Buffer<S>) {
        let alpha = self.alpha;
        let avg = &mut self.avg;
        transform(input, output, 0, |x| {
            *avg = S::smooth(*avg, x, alpha);
            *avg
        });
    }
}

impl<S: DeemphScalar> Default for FmDeemph<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: DeemphScalar> Sink<S> for FmDeemph<S> {
    fn configure(&mut self, config: &Config) -> Result<(), ConfigError> {
        let (sample_type, sample_rate, buffer_size) =
            match (config.sample_type(), config.sample_rate(), config.buffer_size()) {
                (Some(t), Some(r), Some(n)) => (t, r, n),
                _ => return Ok(()),
            };
        check_type::<S>("FMDeemph", sample_type)?;

        self.alpha = alpha(sample_rate, self.tau);
        self.avg = S::zero();
        self.buffer = Some(Buffer::new(buffer_size));

        self.logger.log(
            Level::Debug,
            &format!(
                "Configured FMDeemph node: sample rate: {} Hz, type: {}, alpha: {}",
                sample_rate, sample_type, self.alpha
            ),
        );

        self.source.set_config(Config::new(
            Some(sample_type),
            Some(sample_rate),
            Some(buffer_size),
            Some(1),
        ))
    }

    fn process(&mut self, buffer: Buffer<S>, allow_overwrite: bool) {
        if !self.enabled {
            self.source.send(buffer, allow_overwrite);
            return;
        }

        if allow_overwrite {
            self.filter(&buffer, &buffer);
            self.source.send(buffer, true);
        } else {
            let out = match self.buffer {
                Some(ref b) => b.clone(),
                None => {
                    self.logger
                        .log(Level::Warn, "FMDeemph: dropping buffer, stage is not configured");
                    return;
                }
            };
            self.filter(&buffer, &out);
            // The scratch buffer is reused on the next call.
            self.source.send(out.head(buffer.len()), false);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::logger::test::MemoryLogger;
    use crate::node::channel::ChannelSink;
    use crate::node::shared;
    use crate::sample::{SampleType, ScalarType};
    use assert_approx_eq::assert_approx_eq;
    use crossbeam::channel::Receiver;

    // alpha rounds to 2 at this rate.
    const RATE_ALPHA_2: f64 = 19_000.0;

    fn deemph<S: DeemphScalar + Send>(
        sample_rate: f64,
        buffer_size: usize,
    ) -> (FmDeemph<S>, Receiver<(Vec<S>, bool)>) {
        let (sink, recv) = ChannelSink::<S>::new();
        let mut deemph = FmDeemph::<S>::new();
        deemph.connect(shared(sink)).unwrap();
        deemph
            .configure(&Config::of::<S>(sample_rate, buffer_size, 4))
            .unwrap();
        (deemph, recv)
    }

    #[test]
    fn test_alpha() {
        assert_eq!(alpha(RATE_ALPHA_2, TAU_75US), 2);
        assert_eq!(alpha(48_000.0, TAU_75US), 4);
        assert_eq!(alpha(48_000.0, TAU_50US), 3);
        assert_eq!(alpha(240_000.0, TAU_75US), 19);
        assert_eq!(alpha(0.0, TAU_75US), 1);
        assert_eq!(alpha(1.0, TAU_75US), 1);
    }

    #[test]
    fn test_step_integer() {
        let (mut deemph, recv) = deemph::<i16>(RATE_ALPHA_2, 3);
        assert_eq!(deemph.alpha(), 2);
        deemph.process(Buffer::from_slice(&[10i16, 10, 10]), false);
        let (out, allow) = recv.recv().unwrap();
        assert!(!allow);
        assert_eq!(out, vec![5, 8, 9]);
        assert!(out.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(deemph.average(), 9);
    }

    #[test]
    fn test_step_float() {
        let (mut deemph, recv) = deemph::<f32>(RATE_ALPHA_2, 3);
        deemph.process(Buffer::from_slice(&[10.0f32, 10.0, 10.0]), false);
        let (out, _) = recv.recv().unwrap();
        assert_eq!(out, vec![5.0, 7.5, 8.75]);
    }

    #[test]
    fn test_symmetric_rounding() {
        assert_eq!(i16::smooth(0, 10, 4), 3);
        assert_eq!(i16::smooth(0, -10, 4), -3);
        assert_eq!(i16::smooth(0, 1, 4), 0);
        assert_eq!(i16::smooth(0, -1, 4), 0);
        assert_eq!(i16::smooth(0, 2, 4), 1);
        assert_eq!(i16::smooth(0, -2, 4), -1);
        // Full scale steps do not overflow the difference.
        assert_eq!(i16::smooth(i16::min_value(), i16::max_value(), 1), i16::max_value());
        assert_eq!(u8::smooth(255, 0, 2), 127);
    }

    #[test]
    fn test_converges_without_overshoot() {
        for &rate in &[RATE_ALPHA_2, 48_000.0, 240_000.0] {
            let (mut deemph, recv) = deemph::<i16>(rate, 64);
            let mut last = 0;
            for _ in 0..20 {
                deemph.process(Buffer::from_slice(&[1000i16; 64]), true);
                let (out, _) = recv.recv().unwrap();
                for y in out {
                    assert!(y >= last && y <= 1000);
                    last = y;
                }
            }
            assert!(last >= 1000 - deemph.alpha() as i16);

            let mut last = 1000;
            for _ in 0..20 {
                deemph.process(Buffer::from_slice(&[-1000i16; 64]), true);
                for y in recv.recv().unwrap().0 {
                    assert!(y <= last && y >= -1000);
                    last = y;
                }
            }
            assert!(last <= -1000 + deemph.alpha() as i16);
        }
    }

    #[test]
    fn test_in_place() {
        let (mut deemph, recv) = deemph::<f64>(240_000.0, 8);
        let input = Buffer::from_slice(&[1.0f64; 8]);
        deemph.process(input.clone(), true);
        let (out, allow) = recv.recv().unwrap();
        assert!(allow);
        assert_eq!(input.to_vec(), out);
        assert_approx_eq!(out[0], 1.0 / 19.0);
    }

    #[test]
    fn test_disabled_passthrough() {
        let (sink, recv) = ChannelSink::<i16>::new();
        let mut deemph = FmDeemph::<i16>::with_enabled(false);
        deemph.connect(shared(sink)).unwrap();
        assert!(!deemph.is_enabled());

        // Pass-through works even before the first configuration.
        let input = Buffer::from_slice(&[3i16, -7, 11]);
        deemph.process(input.clone(), true);
        deemph.process(input.head(2), false);
        assert_eq!(recv.recv().unwrap(), (vec![3, -7, 11], true));
        assert_eq!(recv.recv().unwrap(), (vec![3, -7], false));
        assert!(!deemph.is_configured());

        deemph.enable(true);
        deemph
            .configure(&Config::of::<i16>(RATE_ALPHA_2, 3, 1))
            .unwrap();
        deemph.process(input.clone(), false);
        assert_eq!(recv.recv().unwrap(), (vec![2, -3, 4], false));
    }

    #[test]
    fn test_reconfigure_resets_average() {
        let (mut deemph, recv) = deemph::<i32>(48_000.0, 4);
        deemph.process(Buffer::from_slice(&[400i32; 4]), false);
        let before = recv.recv().unwrap().0;
        assert!(deemph.average() > 0);

        deemph
            .configure(&Config::of::<i32>(48_000.0, 4, 1))
            .unwrap();
        assert_eq!(deemph.average(), 0);
        deemph.process(Buffer::from_slice(&[400i32; 4]), false);
        assert_eq!(recv.recv().unwrap().0, before);
    }

    #[test]
    fn test_time_constant() {
        let (sink, _recv) = ChannelSink::<f32>::new();
        let mut deemph = FmDeemph::<f32>::new().with_time_constant(TAU_50US);
        deemph.connect(shared(sink)).unwrap();
        deemph
            .configure(&Config::of::<f32>(48_000.0, 16, 1))
            .unwrap();
        assert_eq!(deemph.alpha(), 3);
    }

    #[test]
    fn test_config() {
        let logger = Rc::new(MemoryLogger::default());
        let mut deemph = FmDeemph::<i16>::new().with_logger(logger.clone());

        // The sample rate is required.
        deemph
            .configure(&Config::default().with_type(SampleType::Real(ScalarType::S16)).with_buffer_size(8))
            .unwrap();
        assert!(!deemph.is_configured());

        let err = deemph
            .configure(&Config::of::<f32>(48e3, 8, 1))
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::TypeMismatch {
                stage: "FMDeemph",
                expected: SampleType::Real(ScalarType::S16),
                actual: SampleType::Real(ScalarType::F32),
            }
        );
        assert!(!deemph.is_configured());
        assert_eq!(deemph.alpha(), 1);

        deemph.configure(&Config::of::<i16>(48e3, 8, 2)).unwrap();
        assert_eq!(*deemph.source().config(), Config::of::<i16>(48e3, 8, 1));
        assert!(logger.records.borrow()[0].1.contains("alpha: 4"));
    }

    #[test]
    fn test_mismatch_keeps_average() {
        let (mut deemph, recv) = deemph::<i16>(RATE_ALPHA_2, 3);
        deemph.process(Buffer::from_slice(&[10i16, 10, 10]), false);
        recv.recv().unwrap();
        assert_eq!(deemph.average(), 9);
        let propagated = *deemph.source().config();

        assert!(deemph
            .configure(&Config::of::<f32>(48e3, 8, 1))
            .is_err());
        assert_eq!(deemph.average(), 9);
        assert_eq!(deemph.alpha(), 2);
        assert_eq!(*deemph.source().config(), propagated);

        // Filtering continues from the kept average.
        deemph.process(Buffer::from_slice(&[10i16, 10, 10]), false);
        assert_eq!(recv.recv().unwrap(), (vec![10, 10, 10], false));
    }
}
