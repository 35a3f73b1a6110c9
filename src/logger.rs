//! The logger a pipeline owns.
//!
//! `tracing` macros need their level at compile time, so the threshold check
//! happens here before the event is built. A disabled line costs one
//! comparison.

use std::fmt;
use std::time::Duration;

use tracing::Level;
use tracing::level_filters::LevelFilter;

use crate::config::PipelineConfig;
use crate::duration::format_duration;

const ORIGIN: &str = "stackable";

/// Emits the pipeline's own events, filtered by its configured level.
#[derive(Debug, Clone, Copy)]
pub struct Logger {
    level: LevelFilter,
}

impl Logger {
    pub fn new(config: PipelineConfig) -> Self {
        Self { level: config.level }
    }

    pub fn level(&self) -> LevelFilter {
        self.level
    }

    pub fn set_level(&mut self, level: LevelFilter) {
        self.level = level;
    }

    pub fn enabled(&self, level: Level) -> bool {
        level <= self.level
    }

    /// The handler chain returned an error.
    pub(crate) fn chain_failed(&self, err: &dyn fmt::Display) {
        if self.enabled(Level::ERROR) {
            tracing::error!(origin = ORIGIN, err = %err, "chain finished with error");
        }
    }

    /// Writing the materialised response to the transport failed.
    pub(crate) fn write_failed(&self, stage: &'static str, err: &dyn fmt::Display) {
        if self.enabled(Level::ERROR) {
            tracing::error!(origin = ORIGIN, stage, err = %err, "failed to write response");
        }
    }

    /// One line per request, once the reply has been written.
    pub(crate) fn handled(&self, method: &http::Method, path: &str, status: u16, elapsed: Duration) {
        if self.enabled(Level::DEBUG) {
            tracing::debug!(
                origin = ORIGIN,
                %method,
                url = path,
                status,
                "handled in {}",
                format_duration(elapsed),
            );
        }
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_filters_more_verbose_levels() {
        let logger = Logger::new(PipelineConfig::with_level(LevelFilter::WARN));

        assert!(logger.enabled(Level::ERROR));
        assert!(logger.enabled(Level::WARN));
        assert!(!logger.enabled(Level::INFO));
        assert!(!logger.enabled(Level::DEBUG));
    }

    #[test]
    fn off_disables_everything() {
        let mut logger = Logger::default();
        logger.set_level(LevelFilter::OFF);

        assert!(!logger.enabled(Level::ERROR));
    }
}
