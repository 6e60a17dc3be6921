//! NES machine: synchronous execution engine around the 6502 core.
//!
//! The engine is a pure state machine driven by the host: one [`NesSystem::step`]
//! services pending interrupts, executes one CPU instruction, then advances
//! the APU by the instruction's cycle count and the PPU by three dots per
//! cycle. [`NesSystem::run_frame`] steps from vblank to vblank and hands
//! back the 256x240 frame buffer.

mod apu;
mod bus;
mod cartridge;
mod controller;
mod mappers;
mod ppu;

pub use apu::Apu;
pub use bus::NesBus;
pub use cartridge::{Cartridge, Mirroring};
pub use controller::{Controllers, Zapper};
pub use mappers::Mapper;
pub use ppu::Ppu;

use ricoh_core::apu::TimingMode;
use ricoh_core::cpu_6502::Cpu6502;
use ricoh_core::logging::{log, LogCategory, LogLevel};
use ricoh_core::types::Frame;
use ricoh_core::System;
use thiserror::Error;

/// Engine errors.
///
/// Load errors are returned to the caller; [`NesError::FatalCpu`] means the
/// deterministic machine hit an illegal opcode and the emulation must stop
/// (state is left intact for post-mortem inspection).
#[derive(Debug, Error)]
pub enum NesError {
    #[error("invalid ROM: {0}")]
    InvalidRom(&'static str),
    #[error("unsupported mapper {0}")]
    UnsupportedMapper(u8),
    #[error("illegal opcode {opcode:#04X} at {pc:#06X}")]
    FatalCpu { opcode: u8, pc: u16 },
}

/// The emulated console: CPU plus the bus that owns everything else.
#[derive(Debug)]
pub struct NesSystem {
    cpu: Cpu6502<NesBus>,
    timing: TimingMode,
}

impl NesSystem {
    /// Create an engine with no cartridge: an empty NROM image, useful as
    /// a placeholder until [`NesSystem::load`] is called.
    pub fn new() -> Self {
        let cart = Cartridge {
            prg_rom: vec![0; 0x4000],
            chr: vec![0; 0x2000],
            chr_is_ram: true,
            mapper: 0,
            mirroring: Mirroring::Horizontal,
            four_screen: false,
            battery: false,
            timing: TimingMode::Ntsc,
        };
        let mapper = Mapper::new(cart).expect("NROM is always supported");
        Self {
            cpu: Cpu6502::new(NesBus::new(mapper, TimingMode::Ntsc)),
            timing: TimingMode::Ntsc,
        }
    }

    /// Load an iNES image, rebuilding the machine around it and asserting
    /// reset.
    pub fn load(&mut self, rom_bytes: &[u8]) -> Result<(), NesError> {
        let cart = Cartridge::from_bytes(rom_bytes)?;
        let timing = cart.timing;
        let mapper = Mapper::new(cart)?;
        self.cpu = Cpu6502::new(NesBus::new(mapper, timing));
        self.timing = timing;
        self.reset();
        Ok(())
    }

    /// Assert the reset line: CPU vectors through $FFFC (7 cycles, during
    /// which the PPU and APU advance), PPU register state clears, APU
    /// channels silence.
    pub fn reset(&mut self) {
        self.cpu.memory.ppu.reset();
        self.cpu.memory.apu.reset();
        self.cpu.reset();
        self.cpu.memory.tick(7);
    }

    /// Run one instruction and advance the rest of the machine; returns
    /// the cycles consumed.
    pub fn step(&mut self) -> Result<u32, NesError> {
        let cycles = self
            .cpu
            .step()
            .map_err(|e| {
                log(LogCategory::Cpu, LogLevel::Error, || {
                    format!("fatal: {e}")
                });
                NesError::FatalCpu {
                    opcode: e.opcode,
                    pc: e.pc,
                }
            })?;
        self.cpu.memory.tick(cycles);
        Ok(cycles)
    }

    /// Run until the PPU completes the current frame (vblank to vblank)
    /// and return the frame buffer.
    pub fn run_frame(&mut self) -> Result<&Frame, NesError> {
        let start = self.cpu.memory.ppu.frame_count();
        while self.cpu.memory.ppu.frame_count() == start {
            self.step()?;
        }
        // Refresh the zapper's light sensor from the finished frame.
        let bus = &mut self.cpu.memory;
        bus.controllers.zapper.update_light(bus.ppu.frame());
        Ok(self.cpu.memory.ppu.frame())
    }

    /// Drain accumulated audio, resampled to the requested rate.
    pub fn audio_samples(&mut self, rate_hz: u32) -> Vec<i16> {
        self.cpu.memory.apu.drain_samples(rate_hz)
    }

    /// 8-bit gamepad state for a port (bit 0 = A .. bit 7 = Right).
    pub fn set_buttons(&mut self, port: usize, mask: u8) {
        self.cpu.memory.controllers.set_buttons(port, mask);
    }

    /// Zapper pointer state in screen coordinates.
    pub fn set_zapper(&mut self, x: u32, y: u32, trigger: bool) {
        let zapper = &mut self.cpu.memory.controllers.zapper;
        zapper.update_aim(x, y);
        zapper.set_trigger(trigger);
    }

    pub fn cpu(&self) -> &Cpu6502<NesBus> {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut Cpu6502<NesBus> {
        &mut self.cpu
    }

    pub fn bus(&self) -> &NesBus {
        &self.cpu.memory
    }

    pub fn bus_mut(&mut self) -> &mut NesBus {
        &mut self.cpu.memory
    }

    /// JSON snapshot of execution state for inspection.
    pub fn debug_snapshot(&self) -> serde_json::Value {
        let bus = &self.cpu.memory;
        let vector = |addr: u16| -> u16 {
            (bus.peek(addr) as u16) | ((bus.peek(addr.wrapping_add(1)) as u16) << 8)
        };
        serde_json::json!({
            "cpu": {
                "pc": self.cpu.pc,
                "a": self.cpu.a,
                "x": self.cpu.x,
                "y": self.cpu.y,
                "sp": self.cpu.sp,
                "status": self.cpu.status,
                "cycles": self.cpu.cycles,
            },
            "ppu": {
                "ctrl": bus.ppu.ctrl(),
                "mask": bus.ppu.mask(),
                "scanline": bus.ppu.scanline(),
                "dot": bus.ppu.dot(),
                "frame": bus.ppu.frame_count(),
                "vram_addr": bus.ppu.vram_addr(),
            },
            "vectors": {
                "nmi": vector(0xFFFA),
                "reset": vector(0xFFFC),
                "irq": vector(0xFFFE),
            },
            "mapper": bus.mapper.mapper_number(),
        })
    }
}

impl Default for NesSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for NesSystem {
    type Error = NesError;

    fn reset(&mut self) {
        NesSystem::reset(self);
    }

    fn step_frame(&mut self) -> Result<Frame, Self::Error> {
        self.run_frame().map(Clone::clone)
    }

    fn debug_state(&self) -> serde_json::Value {
        self.debug_snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cartridge::tests::build_ines;
    use ricoh_core::cpu_6502::Memory6502;

    /// Minimal NROM image whose reset vector points at an infinite loop.
    fn looping_rom() -> Vec<u8> {
        let mut data = build_ines(0, 1, 1, 0);
        // JMP $8000 at $8000.
        data[16] = 0x4C;
        data[17] = 0x00;
        data[18] = 0x80;
        // Reset vector $FFFC -> $8000 (offset of $FFFC within a 16K bank
        // mirrored at $C000: 0x3FFC).
        data[16 + 0x3FFC] = 0x00;
        data[16 + 0x3FFD] = 0x80;
        data
    }

    #[test]
    fn load_rejects_invalid_and_unsupported() {
        let mut nes = NesSystem::new();
        assert!(matches!(nes.load(b"JUNK"), Err(NesError::InvalidRom(_))));
        let data = build_ines(9, 1, 1, 0);
        assert!(matches!(
            nes.load(&data),
            Err(NesError::UnsupportedMapper(9))
        ));
    }

    #[test]
    fn reset_vectors_and_flags() {
        let mut nes = NesSystem::new();
        nes.load(&looping_rom()).unwrap();
        assert_eq!(nes.cpu().pc, 0x8000);
        assert_eq!(nes.cpu().sp, 0xFD);
        assert_ne!(nes.cpu().status & 0x04, 0, "interrupt disable set");
        assert_eq!(nes.cpu().cycles, 7);
    }

    #[test]
    fn run_frame_produces_a_frame() {
        let mut nes = NesSystem::new();
        nes.load(&looping_rom()).unwrap();
        let frame = nes.run_frame().unwrap();
        assert_eq!(frame.width, 256);
        assert_eq!(frame.height, 240);
        assert_eq!(nes.bus().ppu.frame_count(), 1);
        nes.run_frame().unwrap();
        assert_eq!(nes.bus().ppu.frame_count(), 2);
    }

    #[test]
    fn illegal_opcode_surfaces_as_fatal_error() {
        let mut nes = NesSystem::new();
        let mut data = build_ines(0, 1, 1, 0);
        data[16] = 0x02; // jam opcode at $8000
        data[16 + 0x3FFC] = 0x00;
        data[16 + 0x3FFD] = 0x80;
        nes.load(&data).unwrap();
        match nes.step() {
            Err(NesError::FatalCpu { opcode, pc }) => {
                assert_eq!(opcode, 0x02);
                assert_eq!(pc, 0x8000);
            }
            other => panic!("expected FatalCpu, got {other:?}"),
        }
    }

    #[test]
    fn audio_accumulates_over_a_frame() {
        let mut nes = NesSystem::new();
        nes.load(&looping_rom()).unwrap();
        // The first frame out of power is short (the PPU is already part
        // way through it); the second has the full ~735 samples.
        nes.run_frame().unwrap();
        nes.audio_samples(44_100);
        nes.run_frame().unwrap();
        let samples = nes.audio_samples(44_100);
        assert!((720..=750).contains(&samples.len()), "{}", samples.len());
    }

    #[test]
    fn buttons_reach_the_controller_port() {
        let mut nes = NesSystem::new();
        nes.load(&looping_rom()).unwrap();
        nes.set_buttons(0, 0x01);
        let bus = nes.bus_mut();
        bus.write(0x4016, 1);
        bus.write(0x4016, 0);
        assert_eq!(bus.read(0x4016) & 1, 1);
    }

    #[test]
    fn mmc1_bank_swap_through_the_bus() {
        // Five consecutive writes to $8000: reset, then four data bits.
        // After the reset write the control register holds PRG mode 3, so
        // $8000-$BFFF maps PRG bank 0.
        let mut data = build_ines(1, 4, 1, 0);
        for bank in 0..4 {
            data[16 + bank * 0x4000] = 0xB0 + bank as u8;
        }
        // Reset vector in the last bank (fixed at $C000 in mode 3).
        data[16 + 3 * 0x4000 + 0x3FFC] = 0x00;
        data[16 + 3 * 0x4000 + 0x3FFD] = 0x80;
        let mut nes = NesSystem::new();
        nes.load(&data).unwrap();

        let bus = nes.bus_mut();
        for val in [0x80u8, 0x0C, 0x00, 0x01, 0x00] {
            bus.write(0x8000, val);
        }
        assert_eq!(bus.read(0x8000), 0xB0, "$8000 window maps PRG bank 0");
        assert_eq!(bus.read(0xC000), 0xB3, "last bank stays fixed");
    }

    #[test]
    fn debug_snapshot_exposes_vectors() {
        let mut nes = NesSystem::new();
        nes.load(&looping_rom()).unwrap();
        let snap = nes.debug_snapshot();
        assert_eq!(snap["vectors"]["reset"], 0x8000);
        assert_eq!(snap["mapper"], 0);
        assert_eq!(snap["cpu"]["pc"], 0x8000);
    }
}
