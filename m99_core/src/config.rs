//! # Driver Configuration
//!
//! Typed form of the device descriptor. Field names on the wire are the
//! descriptor keys; every key is optional and falls back to its default.
//!
//! ## Example
//!
//! ```
//! use m99_core::M99Config;
//!
//! let config = M99Config::from_json(r#"{ "M99_COUNTER_PRELOAD": 10000 }"#).unwrap();
//! assert_eq!(config.counter_preload, 10_000);
//! assert_eq!(config.sram_rw_buf_size, 64);
//! ```

use driver_log::LogLevel;
use hal_m99::registers::offsets;
use hal_m99::MAX_COUNT;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default size of each mailbox ring in bytes
pub const DEFAULT_RING_SIZE: usize = 64;

/// Default reload value in timer ticks
pub const DEFAULT_PRELOAD: u32 = 250_000;

/// Configuration errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Descriptor could not be parsed
    #[error("Failed to parse descriptor: {0}")]
    Parse(String),

    /// Ring size is odd, zero, or both rings do not fit in SRAM
    #[error("Invalid ring size: {0} bytes")]
    RingSize(usize),

    /// Preload outside the 24-bit counter range
    #[error("Counter preload out of range: {0}")]
    Preload(u32),

    /// A retry limit of zero would fail every readout
    #[error("Counter retry limit must be non-zero")]
    RetryLimit,
}

/// Whether signal binding runs with the interrupt masked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BindMasking {
    /// Bind and unbind update the slot table with the interrupt masked
    #[default]
    Masked,
    /// Bind and unbind skip the mask
    ///
    /// Only for measuring interrupt latency; reintroduces the race between
    /// the slot table update and the interrupt handler's read of it.
    UnmaskedForLatencyTest,
}

/// Device descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct M99Config {
    /// Debug level code (0 off, 1 error, 2 warn, 3 info, 4 debug, 5+ trace)
    #[serde(rename = "DEBUG_LEVEL")]
    pub debug_level: u32,

    /// Size of each mailbox ring in bytes
    #[serde(rename = "M99_SRAM_RW_BUF_SIZE")]
    pub sram_rw_buf_size: usize,

    /// Initial reload value
    #[serde(rename = "M99_COUNTER_PRELOAD")]
    pub counter_preload: u32,

    /// Start with jitter mode on
    #[serde(rename = "M99_IRQ_JITTER")]
    pub irq_jitter: bool,

    /// Give up on counter readout after this many retries
    #[serde(rename = "M99_COUNTER_RETRY_LIMIT")]
    pub counter_retry_limit: Option<u32>,

    /// Masking used by signal bind and unbind
    #[serde(rename = "M99_BIND_MASKING")]
    pub bind_masking: BindMasking,
}

impl Default for M99Config {
    fn default() -> Self {
        Self {
            debug_level: 0,
            sram_rw_buf_size: DEFAULT_RING_SIZE,
            counter_preload: DEFAULT_PRELOAD,
            irq_jitter: false,
            counter_retry_limit: None,
            bind_masking: BindMasking::Masked,
        }
    }
}

impl M99Config {
    /// Parses and validates a JSON descriptor
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every value against the hardware limits
    pub fn validate(&self) -> Result<(), ConfigError> {
        let size = self.sram_rw_buf_size;
        if size == 0 || size % 2 != 0 || size * 2 > offsets::SRAM_SIZE {
            return Err(ConfigError::RingSize(size));
        }
        if !(1..=MAX_COUNT).contains(&self.counter_preload) {
            return Err(ConfigError::Preload(self.counter_preload));
        }
        if self.counter_retry_limit == Some(0) {
            return Err(ConfigError::RetryLimit);
        }
        Ok(())
    }

    /// Returns the log threshold for the configured debug level
    pub fn log_level(&self) -> LogLevel {
        log_level_from_code(self.debug_level)
    }
}

/// Maps a debug level code to a log threshold
pub fn log_level_from_code(code: u32) -> LogLevel {
    match code {
        0 => LogLevel::Off,
        1 => LogLevel::Error,
        2 => LogLevel::Warn,
        3 => LogLevel::Info,
        4 => LogLevel::Debug,
        _ => LogLevel::Trace,
    }
}

/// Maps a log threshold back to its debug level code
pub fn log_level_code(level: LogLevel) -> u32 {
    match level {
        LogLevel::Off => 0,
        LogLevel::Error => 1,
        LogLevel::Warn => 2,
        LogLevel::Info => 3,
        LogLevel::Debug => 4,
        LogLevel::Trace => 5,
    }
}
