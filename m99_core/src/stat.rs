//! # Status Code Interface
//!
//! Numeric get/set dispatch onto the typed device operations, for callers
//! that drive the module through status codes.
//!
//! ## Codes
//!
//! | code | name | set | get |
//! |---|---|---|---|
//! | 0x0001 | channel count | - | always 1 |
//! | 0x0002 | interrupt count | reset | count |
//! | 0x0003 | debug level | level | level |
//! | 0x0401 | interrupt enable | 0 / non-zero | - |
//! | 0x0201 | reload value | 1..=0xFFFFFF | value |
//! | 0x0202 | jitter mode | 0 / non-zero | 0 / 1 |
//! | 0x0203 | interrupt count | reset | count |
//! | 0x0204..=0x0207 | bind slot 1-4 | signal | signal or 0 |
//! | 0x0208..=0x020B | unbind slot 1-4 | any | - |
//! | 0x020C | elapsed ticks | - | ticks |
//! | 0x020D | maximum latency | value | value |
//! | 0x020E | last latency | - | value |
//! | 0x1201 | SRAM block | bytes | bytes |
//!
//! Latencies read back as `0xFFFFFFFF` until the first interrupt; setting
//! the maximum to `0xFFFFFFFF` clears it.

use crate::config::log_level_from_code;
use crate::device::LOG_SOURCE;
use crate::error::{DriverError, Result};
use crate::fanout::SlotId;
use crate::latency;
use crate::M99Timer;
use driver_log::{LogEntry, LogLevel};
use hal::{InterruptMask, RegisterAccess};

/// Status code values
pub mod codes {
    /// Number of channels
    pub const CH_NUMBER: u32 = 0x0001;
    /// Interrupt count (low-level alias)
    pub const IRQ_COUNT: u32 = 0x0002;
    /// Debug level
    pub const DEBUG_LEVEL: u32 = 0x0003;
    /// Interrupt generation enable
    pub const IRQ_ENABLE: u32 = 0x0401;

    /// Reload value
    pub const TIMERVAL: u32 = 0x0201;
    /// Jitter mode
    pub const JITTER: u32 = 0x0202;
    /// Interrupt count
    pub const IRQCOUNT: u32 = 0x0203;
    /// Bind slot 1
    pub const SIG_SET_1: u32 = 0x0204;
    /// Bind slot 4
    pub const SIG_SET_4: u32 = 0x0207;
    /// Unbind slot 1
    pub const SIG_CLR_1: u32 = 0x0208;
    /// Unbind slot 4
    pub const SIG_CLR_4: u32 = 0x020B;
    /// Ticks since reload
    pub const GET_TIME: u32 = 0x020C;
    /// Maximum latency
    pub const MAX_IRQ_LAT: u32 = 0x020D;
    /// Last latency
    pub const IRQ_LAT: u32 = 0x020E;

    /// SRAM block transfer
    pub const BLK_SRAM: u32 = 0x1201;
}

/// A decoded single-value status code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatCode {
    /// Number of channels
    ChannelNumber,
    /// Interrupt count
    IrqCount,
    /// Debug level
    DebugLevel,
    /// Interrupt generation enable
    IrqEnable,
    /// Reload value
    TimerVal,
    /// Jitter mode
    Jitter,
    /// Bind a slot
    SignalSet(SlotId),
    /// Unbind a slot
    SignalClear(SlotId),
    /// Ticks since reload
    GetTime,
    /// Maximum latency
    MaxIrqLatency,
    /// Last latency
    IrqLatency,
}

impl StatCode {
    /// Decodes a numeric code
    pub fn from_code(code: u32) -> Result<Self> {
        let decoded = match code {
            codes::CH_NUMBER => Self::ChannelNumber,
            codes::IRQ_COUNT | codes::IRQCOUNT => Self::IrqCount,
            codes::DEBUG_LEVEL => Self::DebugLevel,
            codes::IRQ_ENABLE => Self::IrqEnable,
            codes::TIMERVAL => Self::TimerVal,
            codes::JITTER => Self::Jitter,
            codes::SIG_SET_1..=codes::SIG_SET_4 => {
                Self::SignalSet(SlotId::new((code - codes::SIG_SET_1) as usize)?)
            }
            codes::SIG_CLR_1..=codes::SIG_CLR_4 => {
                Self::SignalClear(SlotId::new((code - codes::SIG_CLR_1) as usize)?)
            }
            codes::GET_TIME => Self::GetTime,
            codes::MAX_IRQ_LAT => Self::MaxIrqLatency,
            codes::IRQ_LAT => Self::IrqLatency,
            _ => return Err(DriverError::UnknownCode(code)),
        };
        Ok(decoded)
    }
}

impl<A: RegisterAccess, M: InterruptMask> M99Timer<A, M> {
    /// Sets a status value
    pub fn set_stat(&self, code: u32, value: u32) -> Result<()> {
        self.record_stat("set_stat", code, Some(value));
        match StatCode::from_code(code)? {
            StatCode::DebugLevel => self.set_debug_level(log_level_from_code(value)),
            StatCode::IrqEnable => self.set_irq_enabled(value != 0),
            StatCode::TimerVal => self.set_reload(value)?,
            StatCode::Jitter => self.set_jitter(value != 0),
            StatCode::IrqCount => self.reset_irq_count(),
            StatCode::MaxIrqLatency => self.set_max_latency(latency::from_wire(value)),
            StatCode::SignalSet(slot) => self.bind_signal(slot, value)?,
            StatCode::SignalClear(slot) => self.unbind_signal(slot)?,
            StatCode::ChannelNumber | StatCode::GetTime | StatCode::IrqLatency => {
                return Err(DriverError::UnknownCode(code))
            }
        }
        Ok(())
    }

    /// Gets a status value
    pub fn get_stat(&self, code: u32) -> Result<u32> {
        self.record_stat("get_stat", code, None);
        let value = match StatCode::from_code(code)? {
            StatCode::ChannelNumber => self.channel_count(),
            StatCode::IrqCount => self.irq_count(),
            StatCode::DebugLevel => self.debug_level(),
            StatCode::TimerVal => self.reload(),
            StatCode::Jitter => u32::from(self.jitter()),
            StatCode::SignalSet(slot) => self.bound_signal(slot),
            StatCode::GetTime => self.elapsed_since_reload()?,
            StatCode::MaxIrqLatency => latency::to_wire(self.max_latency()),
            StatCode::IrqLatency => latency::to_wire(self.last_latency()),
            StatCode::IrqEnable | StatCode::SignalClear(_) => {
                return Err(DriverError::UnknownCode(code))
            }
        };
        Ok(value)
    }

    /// Sets a block status value
    pub fn set_stat_block(&self, code: u32, data: &[u8]) -> Result<()> {
        self.record_stat("set_stat_block", code, None);
        match code {
            codes::BLK_SRAM => self.write_sram(data),
            _ => Err(DriverError::UnknownCode(code)),
        }
    }

    /// Gets a block status value, returning the number of bytes copied
    pub fn get_stat_block(&self, code: u32, buf: &mut [u8]) -> Result<usize> {
        self.record_stat("get_stat_block", code, None);
        match code {
            codes::BLK_SRAM => self.read_sram(buf),
            _ => Err(DriverError::UnknownCode(code)),
        }
    }

    fn record_stat(&self, message: &'static str, code: u32, value: Option<u32>) {
        if !self.log.enabled(LogLevel::Info) {
            return;
        }
        let mut entry = LogEntry::new(LogLevel::Info, LOG_SOURCE, message)
            .with_field("code", format!("0x{code:04X}"));
        if let Some(value) = value {
            entry = entry.with_field("value", value);
        }
        self.log.record(entry);
    }
}
