//! NES APU: register glue, frame sequencing, and sample accumulation.
//!
//! The synthesis units live in `ricoh_core::apu`; this module routes the
//! $4000-$4017 registers onto them, distributes frame counter edges, runs
//! every unit once per CPU cycle, and accumulates mixed samples at a fixed
//! internal rate. The DMC's memory traffic is surfaced to the bus: [`Apu::clock`]
//! returns the address of a needed sample byte and the bus answers with
//! [`Apu::dmc_load`], charging the fetch stall to the CPU.

use ricoh_core::apu::{
    DmcChannel, FrameCounter, Mixer, NoiseChannel, PulseChannel, TimingMode, TriangleChannel,
};

/// Rate the mixer output is latched at; [`Apu::drain_samples`] resamples
/// from here to the host rate.
const INTERNAL_SAMPLE_RATE: f64 = 44_100.0;

#[derive(Debug)]
pub struct Apu {
    pulse1: PulseChannel,
    pulse2: PulseChannel,
    triangle: TriangleChannel,
    noise: NoiseChannel,
    dmc: DmcChannel,
    frame_counter: FrameCounter,
    mixer: Mixer,
    cycles_per_sample: f64,
    sample_clock: f64,
    samples: Vec<f32>,
}

impl Apu {
    pub fn new(timing: TimingMode) -> Self {
        Self {
            pulse1: PulseChannel::new(true),
            pulse2: PulseChannel::new(false),
            triangle: TriangleChannel::new(),
            noise: NoiseChannel::new(timing),
            dmc: DmcChannel::new(timing),
            frame_counter: FrameCounter::new(),
            mixer: Mixer::new(),
            cycles_per_sample: timing.cpu_clock_hz() / INTERNAL_SAMPLE_RATE,
            sample_clock: 0.0,
            samples: Vec::new(),
        }
    }

    /// Reset signal: frame counter reset, channels silenced except the DMC.
    pub fn reset(&mut self) {
        self.pulse1.set_enabled(false);
        self.pulse2.set_enabled(false);
        self.triangle.set_enabled(false);
        self.noise.set_enabled(false);
        self.frame_counter.reset();
        self.sample_clock = 0.0;
        self.samples.clear();
    }

    /// Route a write to $4000-$4017.
    pub fn write_register(&mut self, addr: u16, val: u8) {
        match addr {
            0x4000 => self.pulse1.write_control(val),
            0x4001 => self.pulse1.write_sweep(val),
            0x4002 => self.pulse1.write_timer_lo(val),
            0x4003 => self.pulse1.write_timer_hi(val),
            0x4004 => self.pulse2.write_control(val),
            0x4005 => self.pulse2.write_sweep(val),
            0x4006 => self.pulse2.write_timer_lo(val),
            0x4007 => self.pulse2.write_timer_hi(val),
            0x4008 => self.triangle.write_linear(val),
            0x400A => self.triangle.write_timer_lo(val),
            0x400B => self.triangle.write_timer_hi(val),
            0x400C => self.noise.write_control(val),
            0x400E => self.noise.write_period(val),
            0x400F => self.noise.write_length(val),
            0x4010 => self.dmc.write_flags_rate(val),
            0x4011 => self.dmc.write_direct_load(val),
            0x4012 => self.dmc.write_sample_address(val),
            0x4013 => self.dmc.write_sample_length(val),
            0x4015 => {
                self.pulse1.set_enabled(val & 0x01 != 0);
                self.pulse2.set_enabled(val & 0x02 != 0);
                self.triangle.set_enabled(val & 0x04 != 0);
                self.noise.set_enabled(val & 0x08 != 0);
                self.dmc.set_enabled(val & 0x10 != 0);
                self.dmc.irq_pending = false;
            }
            0x4017 => {
                let (quarter, half) = self.frame_counter.write_control(val);
                if quarter {
                    self.clock_quarter_frame();
                }
                if half {
                    self.clock_half_frame();
                }
            }
            _ => {}
        }
    }

    /// $4015 status read. Clears the frame IRQ flag (but not the DMC's).
    pub fn read_status(&mut self) -> u8 {
        let mut status = 0u8;
        if self.pulse1.is_active() {
            status |= 0x01;
        }
        if self.pulse2.is_active() {
            status |= 0x02;
        }
        if self.triangle.is_active() {
            status |= 0x04;
        }
        if self.noise.is_active() {
            status |= 0x08;
        }
        if self.dmc.bytes_remaining() > 0 {
            status |= 0x10;
        }
        if self.frame_counter.irq_flag() {
            status |= 0x40;
            self.frame_counter.clear_irq();
        }
        if self.dmc.irq_pending {
            status |= 0x80;
        }
        status
    }

    /// Level of the APU's IRQ line (frame counter or DMC).
    pub fn irq_asserted(&self) -> bool {
        self.frame_counter.irq_flag() || self.dmc.irq_pending
    }

    /// Quarter-frame edge: envelopes and the triangle's linear counter.
    fn clock_quarter_frame(&mut self) {
        self.pulse1.clock_quarter_frame();
        self.pulse2.clock_quarter_frame();
        self.triangle.clock_quarter_frame();
        self.noise.clock_quarter_frame();
    }

    /// Half-frame edge: length counters and sweeps.
    fn clock_half_frame(&mut self) {
        self.pulse1.clock_half_frame();
        self.pulse2.clock_half_frame();
        self.triangle.clock_half_frame();
        self.noise.clock_half_frame();
    }

    /// Advance one CPU cycle. Returns the address of a DMC sample byte
    /// when the channel's buffer needs a refill.
    pub fn clock(&mut self) -> Option<u16> {
        let (quarter, half) = self.frame_counter.clock();
        if quarter {
            self.clock_quarter_frame();
        }
        if half {
            self.clock_half_frame();
        }

        self.pulse1.clock();
        self.pulse2.clock();
        self.triangle.clock();
        self.noise.clock();
        self.dmc.clock();

        self.sample_clock += 1.0;
        if self.sample_clock >= self.cycles_per_sample {
            self.sample_clock -= self.cycles_per_sample;
            let sample = self.mixer.mix(
                self.pulse1.output(),
                self.pulse2.output(),
                self.triangle.output(),
                self.noise.output(),
                self.dmc.output(),
            );
            self.samples.push(sample);
        }

        self.dmc.pending_fetch()
    }

    /// Answer a DMC fetch reported by [`Apu::clock`].
    pub fn dmc_load(&mut self, byte: u8) {
        self.dmc.load_sample_byte(byte);
    }

    /// Drain accumulated samples, linearly resampled to `rate_hz`.
    pub fn drain_samples(&mut self, rate_hz: u32) -> Vec<i16> {
        let src = std::mem::take(&mut self.samples);
        if src.is_empty() || rate_hz == 0 {
            return Vec::new();
        }
        let ratio = INTERNAL_SAMPLE_RATE / rate_hz as f64;
        let out_len = (src.len() as f64 / ratio) as usize;
        let mut out = Vec::with_capacity(out_len.max(1));
        for i in 0..out_len {
            let pos = i as f64 * ratio;
            let base = pos as usize;
            let frac = (pos - base as f64) as f32;
            let a = src[base.min(src.len() - 1)];
            let b = src[(base + 1).min(src.len() - 1)];
            let mixed = a + (b - a) * frac;
            out.push((mixed * 32767.0) as i16);
        }
        out
    }

    /// Per-channel mute masks for debugging audio.
    pub fn mixer_mut(&mut self) -> &mut Mixer {
        &mut self.mixer
    }
}
