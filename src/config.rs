//! Configuration descriptors negotiated along a chain of stages.
//!
//! Every field of a `Config` is optional. A stage that is handed a
//! descriptor lacking a field it needs simply stays unconfigured and waits
//! for a more complete one.

use crate::sample::{Sample, SampleType};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Describes the stream a source emits: sample type, sample rate (Hz),
/// buffer capacity and a hint on the number of buffers in flight.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    sample_type: Option<SampleType>,
    sample_rate: Option<f64>,
    buffer_size: Option<usize>,
    num_buffers: Option<usize>,
}

impl Config {
    pub fn new(
        sample_type: Option<SampleType>,
        sample_rate: Option<f64>,
        buffer_size: Option<usize>,
        num_buffers: Option<usize>,
    ) -> Self {
        Config {
            sample_type,
            sample_rate,
            buffer_size,
            num_buffers,
        }
    }

    /// A fully specified descriptor for samples of type `T`.
    ///
    /// # Examples
    ///
    /// ```
    /// use comms_demod::config::Config;
    /// use num::Complex;
    ///
    /// let cfg = Config::of::<Complex<i16>>(240e3, 1024, 2);
    /// assert!(cfg.has_type() && cfg.has_sample_rate());
    /// assert_eq!(cfg.buffer_size(), Some(1024));
    /// ```
    pub fn of<T: Sample>(sample_rate: f64, buffer_size: usize, num_buffers: usize) -> Self {
        Config::new(
            Some(T::TYPE),
            Some(sample_rate),
            Some(buffer_size),
            Some(num_buffers),
        )
    }

    pub fn with_type(mut self, sample_type: SampleType) -> Self {
        self.sample_type = Some(sample_type);
        self
    }

    pub fn with_sample_rate(mut self, sample_rate: f64) -> Self {
        self.sample_rate = Some(sample_rate);
        self
    }

    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = Some(buffer_size);
        self
    }

    pub fn with_num_buffers(mut self, num_buffers: usize) -> Self {
        self.num_buffers = Some(num_buffers);
        self
    }

    pub fn sample_type(&self) -> Option<SampleType> {
        self.sample_type
    }

    pub fn sample_rate(&self) -> Option<f64> {
        self.sample_rate
    }

    pub fn buffer_size(&self) -> Option<usize> {
        self.buffer_size
    }

    pub fn num_buffers(&self) -> Option<usize> {
        self.num_buffers
    }

    pub fn has_type(&self) -> bool {
        self.sample_type.is_some()
    }

    pub fn has_sample_rate(&self) -> bool {
        self.sample_rate.is_some()
    }

    pub fn has_buffer_size(&self) -> bool {
        self.buffer_size.is_some()
    }

    pub fn has_num_buffers(&self) -> bool {
        self.num_buffers.is_some()
    }
}

/// Errors raised while (re)configuring a stage.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    #[error("Can not configure {stage}: Invalid type {actual}, expected {expected}")]
    TypeMismatch {
        stage: &'static str,
        expected: SampleType,
        actual: SampleType,
    },
}

/// Checks that `actual` is the type `T` a stage was instantiated with.
pub fn check_type<T: Sample>(stage: &'static str, actual: SampleType) -> Result<(), ConfigError> {
    if actual == T::TYPE {
        Ok(())
    } else {
        Err(ConfigError::TypeMismatch {
            stage,
            expected: T::TYPE,
            actual,
        })
    }
}

/// The sample rate of `config` for log lines, or `unset`.
pub(crate) fn rate_label(config: &Config) -> String {
    match config.sample_rate() {
        Some(rate) => format!("{} Hz", rate),
        None => "unset".to_string(),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::sample::ScalarType;
    use num::Complex;

    #[test]
    fn test_presence() {
        let cfg = Config::default();
        assert!(!cfg.has_type());
        assert!(!cfg.has_sample_rate());
        assert!(!cfg.has_buffer_size());
        assert!(!cfg.has_num_buffers());

        let cfg = cfg.with_buffer_size(16).with_num_buffers(4);
        assert!(cfg.has_buffer_size() && cfg.has_num_buffers());
        assert!(!cfg.has_type());
        assert_eq!(cfg.num_buffers(), Some(4));
    }

    #[test]
    fn test_check_type() {
        assert!(check_type::<Complex<f32>>("AMDemod", SampleType::Complex(ScalarType::F32)).is_ok());
        let err = check_type::<Complex<f32>>("AMDemod", SampleType::Real(ScalarType::F32))
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::TypeMismatch {
                stage: "AMDemod",
                expected: SampleType::Complex(ScalarType::F32),
                actual: SampleType::Real(ScalarType::F32),
            }
        );
        assert_eq!(
            err.to_string(),
            "Can not configure AMDemod: Invalid type f32, expected cf32"
        );
    }

    #[test]
    fn test_rate_label() {
        assert_eq!(rate_label(&Config::of::<u8>(48000.0, 4, 1)), "48000 Hz");
        assert_eq!(rate_label(&Config::default().with_buffer_size(4)), "unset");
    }

    #[test]
    fn test_cbor_encoding() {
        let cfg = Config::of::<Complex<u8>>(2.4e6, 16384, 8);
        let bytes = serde_cbor::to_vec(&cfg).unwrap();
        let decoded: Config = serde_cbor::from_slice(&bytes).unwrap();
        assert_eq!(decoded, cfg);

        let partial = Config::default().with_type(SampleType::Real(ScalarType::S16));
        let decoded: Config = serde_cbor::from_slice(&serde_cbor::to_vec(&partial).unwrap()).unwrap();
        assert!(decoded.has_type());
        assert!(!decoded.has_sample_rate());
    }
}
