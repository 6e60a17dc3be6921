//! APU timing configuration for different console regions.

/// Console region timing configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimingMode {
    /// NTSC (North America, Japan) - 1.789773 MHz CPU clock
    #[default]
    Ntsc,
    /// PAL (Europe, Australia) - 1.662607 MHz CPU clock
    Pal,
}

impl TimingMode {
    /// CPU clock frequency in Hz for this timing mode.
    pub fn cpu_clock_hz(&self) -> f64 {
        match self {
            TimingMode::Ntsc => 1_789_773.0,
            TimingMode::Pal => 1_662_607.0,
        }
    }

    /// Video frame rate in Hz for this timing mode.
    pub fn frame_rate_hz(&self) -> f64 {
        match self {
            TimingMode::Ntsc => 60.0988,
            TimingMode::Pal => 50.0070,
        }
    }

    pub fn is_pal(&self) -> bool {
        matches!(self, TimingMode::Pal)
    }
}
