//! Non-linear audio mixer for the five 2A03 channels.
//!
//! The hardware sums the channels through two resistor ladders; the
//! canonical approximation is a pair of lookup tables:
//!
//! ```text
//! pulse_out = 95.52 / (8128 / (pulse1 + pulse2) + 100)
//! tnd_out   = 163.67 / (24329 / (3*triangle + 2*noise + dmc) + 100)
//! ```
//!
//! Per-channel mute masks are carried for debugging audio: a muted channel
//! is dropped from the sum without touching channel state.

/// Index range of the triangle/noise/DMC table: 3*15 + 2*15 + 127.
const TND_TABLE_LEN: usize = 203;

#[derive(Debug, Clone)]
pub struct Mixer {
    pulse_table: [f32; 31],
    tnd_table: [f32; TND_TABLE_LEN],
    pulse1_on: bool,
    pulse2_on: bool,
    triangle_on: bool,
    noise_on: bool,
    dmc_on: bool,
}

impl Mixer {
    pub fn new() -> Self {
        let mut pulse_table = [0.0f32; 31];
        for (n, entry) in pulse_table.iter_mut().enumerate().skip(1) {
            *entry = 95.52 / (8128.0 / n as f32 + 100.0);
        }
        let mut tnd_table = [0.0f32; TND_TABLE_LEN];
        for (n, entry) in tnd_table.iter_mut().enumerate().skip(1) {
            *entry = 163.67 / (24329.0 / n as f32 + 100.0);
        }
        Self {
            pulse_table,
            tnd_table,
            pulse1_on: true,
            pulse2_on: true,
            triangle_on: true,
            noise_on: true,
            dmc_on: true,
        }
    }

    /// Mix the five channel levels into a sample in [0.0, 1.0).
    pub fn mix(&self, pulse1: u8, pulse2: u8, triangle: u8, noise: u8, dmc: u8) -> f32 {
        let p1 = if self.pulse1_on { pulse1 } else { 0 } as usize;
        let p2 = if self.pulse2_on { pulse2 } else { 0 } as usize;
        let t = if self.triangle_on { triangle } else { 0 } as usize;
        let n = if self.noise_on { noise } else { 0 } as usize;
        let d = if self.dmc_on { dmc } else { 0 } as usize;
        self.pulse_table[p1 + p2] + self.tnd_table[3 * t + 2 * n + d]
    }

    pub fn set_pulse1_enabled(&mut self, on: bool) {
        self.pulse1_on = on;
    }

    pub fn set_pulse2_enabled(&mut self, on: bool) {
        self.pulse2_on = on;
    }

    pub fn set_triangle_enabled(&mut self, on: bool) {
        self.triangle_on = on;
    }

    pub fn set_noise_enabled(&mut self, on: bool) {
        self.noise_on = on;
    }

    pub fn set_dmc_enabled(&mut self, on: bool) {
        self.dmc_on = on;
    }
}

impl Default for Mixer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silence_mixes_to_zero() {
        let mixer = Mixer::new();
        assert_eq!(mixer.mix(0, 0, 0, 0, 0), 0.0);
    }

    #[test]
    fn output_is_monotonic_in_channel_level() {
        let mixer = Mixer::new();
        let mut last = -1.0f32;
        for level in 0..=15u8 {
            let sample = mixer.mix(level, 0, 0, 0, 0);
            assert!(sample > last);
            last = sample;
        }
    }

    #[test]
    fn full_volume_stays_below_one() {
        let mixer = Mixer::new();
        let sample = mixer.mix(15, 15, 15, 15, 127);
        assert!(sample < 1.0);
    }

    #[test]
    fn mute_mask_drops_channel() {
        let mut mixer = Mixer::new();
        let audible = mixer.mix(15, 0, 0, 0, 0);
        mixer.set_pulse1_enabled(false);
        assert_eq!(mixer.mix(15, 0, 0, 0, 0), 0.0);
        mixer.set_pulse1_enabled(true);
        assert_eq!(mixer.mix(15, 0, 0, 0, 0), audible);
    }

    #[test]
    fn canonical_table_values() {
        let mixer = Mixer::new();
        // pulse_out for sum 30 (both pulses at 15).
        let expected = 95.52 / (8128.0 / 30.0 + 100.0);
        assert!((mixer.mix(15, 15, 0, 0, 0) - expected).abs() < 1e-6);
    }
}
