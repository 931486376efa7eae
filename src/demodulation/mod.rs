//! Stages for demodulating complex baseband samples.
pub mod am;
pub mod fm;
pub mod usb;

pub use self::am::AmDemod;
pub use self::fm::FmDemod;
pub use self::usb::UsbDemod;
