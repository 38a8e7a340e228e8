//! `LogPort` that forwards every message to several loggers.

use crate::ports::log_port::{LogLevel, LogPort};

pub struct FanoutLogAdapter<'a> {
    targets: Vec<&'a dyn LogPort>,
}

impl<'a> FanoutLogAdapter<'a> {
    pub fn new(targets: Vec<&'a dyn LogPort>) -> Self {
        Self { targets }
    }
}

impl LogPort for FanoutLogAdapter<'_> {
    fn log(&self, level: LogLevel, message: &str) {
        for target in &self.targets {
            target.log(level, message);
        }
    }
}
