//! Centralized logging configuration for the emulator.
//!
//! Logging is categorized per component and gated by per-category levels held
//! in atomics, so the hot paths pay a single relaxed load when logging is
//! disabled. Message bodies are closures and are only evaluated when the
//! category/level combination is enabled.
//!
//! Configuration is bootstrapped from the environment:
//!
//! - `RICOH_LOG=<level>` sets the global level
//! - `RICOH_LOG_CPU`, `RICOH_LOG_BUS`, `RICOH_LOG_PPU`, `RICOH_LOG_APU`,
//!   `RICOH_LOG_IRQ` override individual categories
//!
//! # Usage
//!
//! ```rust
//! use ricoh_core::logging::{log, LogCategory, LogLevel};
//!
//! log(LogCategory::Cpu, LogLevel::Debug, || {
//!     format!("BRK at PC={:04X}", 0x1234)
//! });
//! ```

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::OnceLock;

/// Log level for controlling verbosity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    Off = 0,
    Error = 1,
    Warn = 2,
    Info = 3,
    Debug = 4,
    Trace = 5,
}

impl LogLevel {
    /// Parse log level from string (case-insensitive).
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "off" | "0" => Some(LogLevel::Off),
            "error" | "err" | "1" => Some(LogLevel::Error),
            "warn" | "warning" | "2" => Some(LogLevel::Warn),
            "info" | "3" => Some(LogLevel::Info),
            "debug" | "4" => Some(LogLevel::Debug),
            "trace" | "5" => Some(LogLevel::Trace),
            _ => None,
        }
    }

    fn to_u8(self) -> u8 {
        self as u8
    }

    fn from_u8(val: u8) -> Self {
        match val {
            1 => LogLevel::Error,
            2 => LogLevel::Warn,
            3 => LogLevel::Info,
            4 => LogLevel::Debug,
            5 => LogLevel::Trace,
            _ => LogLevel::Off,
        }
    }
}

/// Log category for different emulator components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogCategory {
    /// CPU execution (instruction execution, interrupt servicing)
    Cpu,
    /// Bus/memory access
    Bus,
    /// PPU/graphics (register writes, frame events)
    Ppu,
    /// APU/audio
    Apu,
    /// Interrupts (IRQ, NMI)
    Interrupts,
}

const CATEGORY_COUNT: usize = 5;

fn category_index(category: LogCategory) -> usize {
    match category {
        LogCategory::Cpu => 0,
        LogCategory::Bus => 1,
        LogCategory::Ppu => 2,
        LogCategory::Apu => 3,
        LogCategory::Interrupts => 4,
    }
}

fn category_name(category: LogCategory) -> &'static str {
    match category {
        LogCategory::Cpu => "CPU",
        LogCategory::Bus => "BUS",
        LogCategory::Ppu => "PPU",
        LogCategory::Apu => "APU",
        LogCategory::Interrupts => "IRQ",
    }
}

/// Global logging configuration.
///
/// Category levels default to `Off`; a category falls back to the global
/// level when it has no explicit override.
pub struct LogConfig {
    global_level: AtomicU8,
    category_levels: [AtomicU8; CATEGORY_COUNT],
}

/// Sentinel stored in a category slot meaning "use the global level".
const LEVEL_UNSET: u8 = 0xFF;

impl LogConfig {
    fn new() -> Self {
        Self {
            global_level: AtomicU8::new(LogLevel::Off.to_u8()),
            category_levels: [
                AtomicU8::new(LEVEL_UNSET),
                AtomicU8::new(LEVEL_UNSET),
                AtomicU8::new(LEVEL_UNSET),
                AtomicU8::new(LEVEL_UNSET),
                AtomicU8::new(LEVEL_UNSET),
            ],
        }
    }

    /// Get the global singleton, initializing it from the environment on
    /// first use.
    pub fn global() -> &'static Self {
        static INSTANCE: OnceLock<LogConfig> = OnceLock::new();
        INSTANCE.get_or_init(|| {
            let config = LogConfig::new();
            config.init_from_env();
            config
        })
    }

    fn init_from_env(&self) {
        if let Ok(v) = std::env::var("RICOH_LOG") {
            if let Some(level) = LogLevel::from_str(&v) {
                self.set_global_level(level);
            }
        }
        let vars = [
            ("RICOH_LOG_CPU", LogCategory::Cpu),
            ("RICOH_LOG_BUS", LogCategory::Bus),
            ("RICOH_LOG_PPU", LogCategory::Ppu),
            ("RICOH_LOG_APU", LogCategory::Apu),
            ("RICOH_LOG_IRQ", LogCategory::Interrupts),
        ];
        for (var, cat) in vars {
            if let Ok(v) = std::env::var(var) {
                if let Some(level) = LogLevel::from_str(&v) {
                    self.set_level(cat, level);
                }
            }
        }
    }

    pub fn set_global_level(&self, level: LogLevel) {
        self.global_level.store(level.to_u8(), Ordering::Relaxed);
    }

    pub fn set_level(&self, category: LogCategory, level: LogLevel) {
        self.category_levels[category_index(category)].store(level.to_u8(), Ordering::Relaxed);
    }

    /// Effective level for a category, falling back to the global level.
    pub fn level(&self, category: LogCategory) -> LogLevel {
        let raw = self.category_levels[category_index(category)].load(Ordering::Relaxed);
        if raw == LEVEL_UNSET {
            LogLevel::from_u8(self.global_level.load(Ordering::Relaxed))
        } else {
            LogLevel::from_u8(raw)
        }
    }

    /// Check whether a message at `level` in `category` would be emitted.
    #[inline]
    pub fn should_log(&self, category: LogCategory, level: LogLevel) -> bool {
        level != LogLevel::Off && level <= self.level(category)
    }
}

/// Log a message in the given category at the given level.
///
/// The message closure is only evaluated when the category/level combination
/// is enabled, so callers can format freely.
#[inline]
pub fn log<F>(category: LogCategory, level: LogLevel, message: F)
where
    F: FnOnce() -> String,
{
    let config = LogConfig::global();
    if config.should_log(category, level) {
        eprintln!("[{}] {}", category_name(category), message());
    }
}
