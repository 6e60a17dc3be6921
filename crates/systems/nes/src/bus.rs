//! CPU-side memory bus.
//!
//! Single address decoder routing 16-bit CPU addresses to system RAM, PPU
//! registers, APU/IO registers, the controllers, or the mapper. The bus
//! owns every component the CPU can reach and implements [`Memory6502`], so
//! the CPU drives the whole machine through it; `tick` advances the PPU
//! three dots and the APU one cycle per CPU cycle.

use crate::apu::Apu;
use crate::controller::Controllers;
use crate::mappers::Mapper;
use crate::ppu::Ppu;
use ricoh_core::apu::TimingMode;
use ricoh_core::cpu_6502::Memory6502;
use ricoh_core::logging::{log, LogCategory, LogLevel};

/// CPU cycles consumed by a DMC sample fetch.
const DMC_FETCH_STALL: u32 = 4;

#[derive(Debug)]
pub struct NesBus {
    pub ram: [u8; 0x800],
    pub ppu: Ppu,
    pub apu: Apu,
    pub mapper: Mapper,
    pub controllers: Controllers,
    /// Stall cycles accumulated for the CPU (OAM DMA, DMC fetches).
    stall_cycles: u32,
    /// CPU cycles ticked so far; parity decides the OAM DMA stall length.
    cycle_count: u64,
}

impl NesBus {
    pub fn new(mapper: Mapper, timing: TimingMode) -> Self {
        Self {
            ram: [0; 0x800],
            ppu: Ppu::new(),
            apu: Apu::new(timing),
            mapper,
            controllers: Controllers::new(),
            stall_cycles: 0,
            cycle_count: 0,
        }
    }

    /// Advance the rest of the machine after an instruction: one APU cycle
    /// and three PPU dots per CPU cycle.
    pub fn tick(&mut self, cpu_cycles: u32) {
        for _ in 0..cpu_cycles {
            if let Some(addr) = self.apu.clock() {
                // DMC sample DMA reads PRG space directly; it must not
                // re-enter the IO regions.
                let byte = self.mapper.cpu_read(addr);
                self.apu.dmc_load(byte);
                self.stall_cycles += DMC_FETCH_STALL;
            }
            self.ppu.tick(&mut self.mapper);
            self.ppu.tick(&mut self.mapper);
            self.ppu.tick(&mut self.mapper);
            self.cycle_count += 1;
        }
    }

    /// OAM DMA: copy a 256-byte page into OAM, stalling the CPU 513 or 514
    /// cycles depending on cycle parity.
    fn oam_dma(&mut self, page: u8) {
        let base = (page as u16) << 8;
        let mut buf = [0u8; 256];
        for (i, b) in buf.iter_mut().enumerate() {
            *b = self.read(base.wrapping_add(i as u16));
        }
        self.ppu.oam_dma(&buf);
        self.stall_cycles += 513 + (self.cycle_count & 1) as u32;
        log(LogCategory::Bus, LogLevel::Trace, || {
            format!("OAM DMA from page {page:#04X}")
        });
    }

    /// Side-effect-free read for diagnostics.
    pub fn peek(&self, addr: u16) -> u8 {
        match addr {
            0x0000..=0x1FFF => self.ram[(addr & 0x07FF) as usize],
            0x4020..=0xFFFF => self.mapper.cpu_read(addr),
            _ => 0,
        }
    }
}

impl Memory6502 for NesBus {
    fn read(&mut self, addr: u16) -> u8 {
        match addr {
            0x0000..=0x1FFF => self.ram[(addr & 0x07FF) as usize],
            0x2000..=0x3FFF => self.ppu.read_register(addr & 0x07, &self.mapper),
            0x4015 => self.apu.read_status(),
            0x4016 => self.controllers.read(0),
            0x4017 => self.controllers.read(1),
            // $4000-$4014 are write-only; $4018-$401F are the disabled
            // test registers.
            0x4000..=0x401F => 0,
            0x4020..=0xFFFF => self.mapper.cpu_read(addr),
        }
    }

    fn write(&mut self, addr: u16, val: u8) {
        match addr {
            0x0000..=0x1FFF => self.ram[(addr & 0x07FF) as usize] = val,
            0x2000..=0x3FFF => self.ppu.write_register(addr & 0x07, val, &mut self.mapper),
            0x4014 => self.oam_dma(val),
            0x4016 => self.controllers.write_strobe(val),
            0x4000..=0x4013 | 0x4015 | 0x4017 => self.apu.write_register(addr, val),
            0x4018..=0x401F => {}
            0x4020..=0xFFFF => self.mapper.cpu_write(addr, val),
        }
    }

    fn take_nmi(&mut self) -> bool {
        self.ppu.take_nmi_pending()
    }

    fn irq_asserted(&mut self) -> bool {
        self.apu.irq_asserted() || self.mapper.irq_asserted()
    }

    fn take_stall_cycles(&mut self) -> u32 {
        std::mem::take(&mut self.stall_cycles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cartridge::tests::build_ines;
    use crate::cartridge::Cartridge;

    fn bus() -> NesBus {
        let cart = Cartridge::from_bytes(&build_ines(0, 1, 1, 0)).unwrap();
        NesBus::new(Mapper::new(cart).unwrap(), TimingMode::Ntsc)
    }

    #[test]
    fn ram_is_mirrored_every_0x800() {
        let mut bus = bus();
        bus.write(0x0001, 0xAB);
        assert_eq!(bus.read(0x0801), 0xAB);
        assert_eq!(bus.read(0x1001), 0xAB);
        assert_eq!(bus.read(0x1801), 0xAB);
    }

    #[test]
    fn ppu_registers_mirror_every_8_bytes() {
        let mut bus = bus();
        bus.write(0x2006, 0x3F);
        bus.write(0x3FFE, 0x01); // $2006 mirror
        bus.write(0x2007, 0x2A);
        assert_eq!(bus.ppu.vram_addr(), 0x3F02);
    }

    #[test]
    fn oam_dma_copies_page_and_stalls() {
        let mut bus = bus();
        for i in 0..256u16 {
            bus.write(0x0200 + i, i as u8);
        }
        bus.write(0x4014, 0x02);
        assert_eq!(bus.ppu.oam[0x00], 0x00);
        assert_eq!(bus.ppu.oam[0xFF], 0xFF);
        assert_eq!(bus.take_stall_cycles(), 513, "even cycle parity");

        bus.tick(1); // odd parity now
        bus.write(0x4014, 0x02);
        assert_eq!(bus.take_stall_cycles(), 514);
    }

    #[test]
    fn disabled_test_registers_read_zero() {
        let mut bus = bus();
        bus.write(0x4018, 0xFF);
        assert_eq!(bus.read(0x4018), 0);
        assert_eq!(bus.read(0x401F), 0);
    }

    #[test]
    fn controller_strobe_and_read_through_bus() {
        let mut bus = bus();
        bus.controllers.set_buttons(0, 0b0000_0011);
        bus.write(0x4016, 1);
        bus.write(0x4016, 0);
        assert_eq!(bus.read(0x4016) & 1, 1);
        assert_eq!(bus.read(0x4016) & 1, 1);
        assert_eq!(bus.read(0x4016) & 1, 0);
    }

    #[test]
    fn dmc_fetch_stalls_and_reads_prg() {
        let mut bus = bus();
        // Point the DMC at $C000 and enable a 1-byte sample.
        bus.write(0x4012, 0x00);
        bus.write(0x4013, 0x00);
        bus.write(0x4015, 0x10);
        bus.take_stall_cycles();
        bus.tick(1);
        assert_eq!(bus.take_stall_cycles(), DMC_FETCH_STALL);
    }

    #[test]
    fn nmi_latch_travels_from_ppu() {
        let mut bus = bus();
        bus.write(0x2000, 0x80); // NMI enable
        // Run to vblank: the PPU starts with the power-up skew.
        bus.tick(27384);
        assert!(bus.take_nmi(), "NMI latched at vblank start");
        assert!(!bus.take_nmi(), "latch consumed");
    }
}
