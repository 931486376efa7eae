//! Logging capability handed to stages.
//!
//! Stages never log through a global directly; they hold a `Logger` so tests
//! and embedding applications can capture or redirect the messages.

use log::Level;
use std::rc::Rc;

pub trait Logger {
    fn log(&self, level: Level, message: &str);
}

/// Forwards messages to the `log` facade under the `comms_demod` target.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogManager;

impl LogManager {
    pub fn new() -> Self {
        LogManager
    }
}

impl Logger for LogManager {
    fn log(&self, level: Level, message: &str) {
        log::log!(target: "comms_demod", level, "{}", message);
    }
}

/// The logger stages use unless another one is injected.
pub fn default_logger() -> Rc<dyn Logger> {
    Rc::new(LogManager::new())
}
