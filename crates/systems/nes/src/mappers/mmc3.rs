use crate::cartridge::{Cartridge, Mirroring};

/// MMC3 (Mapper 4/TxROM) - 8 KiB PRG banking, 1/2 KiB CHR banking, and a
/// scanline IRQ counter.
///
/// The hardware clocks the IRQ counter on PPU A12 rising edges; this
/// implementation uses the scanline approximation: the PPU calls
/// [`Mmc3::clock_scanline`] once per visible scanline while rendering is
/// enabled. The counter reloads from the latch when zero or when a reload
/// was requested, otherwise decrements; an enabled counter that decrements
/// to zero asserts the IRQ line until it is disabled via $E000.
#[derive(Debug)]
pub struct Mmc3 {
    prg_rom: Vec<u8>,
    prg_ram: Vec<u8>,
    chr: Vec<u8>,
    chr_is_ram: bool,
    bank_select: u8,
    bank_regs: [u8; 8],
    prg_mode: bool,
    chr_mode: bool,
    prg_banks: [usize; 4], // four 8 KiB banks at $8000/$A000/$C000/$E000
    chr_banks: [usize; 8], // eight 1 KiB banks over $0000-$1FFF
    irq_latch: u8,
    irq_counter: u8,
    irq_reload: bool,
    irq_enabled: bool,
    irq_pending: bool,
    mirroring: Mirroring,
    four_screen: bool,
}

impl Mmc3 {
    pub fn new(cart: Cartridge) -> Self {
        let mut m = Self {
            prg_rom: cart.prg_rom,
            prg_ram: vec![0; 0x2000],
            chr: cart.chr,
            chr_is_ram: cart.chr_is_ram,
            bank_select: 0,
            bank_regs: [0; 8],
            prg_mode: false,
            chr_mode: false,
            prg_banks: [0; 4],
            chr_banks: [0; 8],
            irq_latch: 0,
            irq_counter: 0,
            irq_reload: false,
            irq_enabled: false,
            irq_pending: false,
            mirroring: cart.mirroring,
            four_screen: cart.four_screen,
        };
        m.apply_banks();
        m
    }

    fn prg_bank_count(&self) -> usize {
        std::cmp::max(1, self.prg_rom.len() / 0x2000)
    }

    fn chr_bank_count(&self) -> usize {
        std::cmp::max(1, self.chr.len() / 0x0400)
    }

    fn apply_banks(&mut self) {
        let prg_count = self.prg_bank_count();
        let last = prg_count.saturating_sub(1);
        let second_last = prg_count.saturating_sub(2);
        let bank6 = self.bank_regs[6] as usize % prg_count;
        let bank7 = self.bank_regs[7] as usize % prg_count;

        self.prg_banks = if !self.prg_mode {
            // R6 at $8000, (-2) at $A000, R7 at $C000, (-1) at $E000
            [bank6, second_last, bank7, last]
        } else {
            // (-2) at $8000, R6 at $A000, R7 at $C000, (-1) at $E000
            [second_last, bank6, bank7, last]
        };

        // R0/R1 are 2 KiB registers (even bank + successor), R2-R5 1 KiB.
        let chr_count = self.chr_bank_count();
        let r0 = (self.bank_regs[0] & 0xFE) as usize % chr_count;
        let r1 = (self.bank_regs[1] & 0xFE) as usize % chr_count;
        let r2 = self.bank_regs[2] as usize % chr_count;
        let r3 = self.bank_regs[3] as usize % chr_count;
        let r4 = self.bank_regs[4] as usize % chr_count;
        let r5 = self.bank_regs[5] as usize % chr_count;

        self.chr_banks = if !self.chr_mode {
            [r0, r0 + 1, r1, r1 + 1, r2, r3, r4, r5]
        } else {
            [r2, r3, r4, r5, r0, r0 + 1, r1, r1 + 1]
        };
    }

    pub fn cpu_read(&self, addr: u16) -> u8 {
        match addr {
            0x6000..=0x7FFF => self.prg_ram[(addr - 0x6000) as usize],
            0x8000..=0xFFFF => {
                let window = ((addr - 0x8000) / 0x2000) as usize;
                let idx = self.prg_banks[window] * 0x2000 + (addr as usize & 0x1FFF);
                self.prg_rom.get(idx).copied().unwrap_or(0)
            }
            _ => 0,
        }
    }

    pub fn cpu_write(&mut self, addr: u16, val: u8) {
        match addr {
            0x6000..=0x7FFF => self.prg_ram[(addr - 0x6000) as usize] = val,
            0x8000..=0x9FFF => {
                if addr & 1 == 0 {
                    self.bank_select = val & 0x07;
                    self.prg_mode = val & 0x40 != 0;
                    self.chr_mode = val & 0x80 != 0;
                } else {
                    self.bank_regs[self.bank_select as usize] = val;
                }
                self.apply_banks();
            }
            0xA000..=0xBFFF => {
                if addr & 1 == 0 {
                    if !self.four_screen {
                        self.mirroring = if val & 1 == 0 {
                            Mirroring::Vertical
                        } else {
                            Mirroring::Horizontal
                        };
                    }
                } else {
                    // PRG RAM protect: ignored.
                }
            }
            0xC000..=0xDFFF => {
                if addr & 1 == 0 {
                    self.irq_latch = val;
                } else {
                    // $C001 clears the counter and requests a reload on the
                    // next clock.
                    self.irq_counter = 0;
                    self.irq_reload = true;
                }
            }
            0xE000..=0xFFFF => {
                if addr & 1 == 0 {
                    self.irq_enabled = false;
                    self.irq_pending = false; // disabling acknowledges
                } else {
                    self.irq_enabled = true;
                }
            }
            _ => {}
        }
    }

    fn chr_index(&self, addr: u16) -> usize {
        let window = (addr as usize >> 10) & 7;
        self.chr_banks[window] * 0x0400 + (addr as usize & 0x03FF)
    }

    pub fn ppu_read(&self, addr: u16) -> u8 {
        self.chr.get(self.chr_index(addr)).copied().unwrap_or(0)
    }

    pub fn ppu_write(&mut self, addr: u16, val: u8) {
        if self.chr_is_ram {
            let idx = self.chr_index(addr);
            if let Some(b) = self.chr.get_mut(idx) {
                *b = val;
            }
        }
    }

    /// Clock the IRQ counter (once per rendered scanline).
    pub fn clock_scanline(&mut self) {
        if self.irq_reload || self.irq_counter == 0 {
            self.irq_counter = self.irq_latch;
            self.irq_reload = false;
        } else {
            self.irq_counter -= 1;
            // IRQ fires only when the counter decrements to zero, not when
            // it reloads to zero.
            if self.irq_counter == 0 && self.irq_enabled {
                self.irq_pending = true;
            }
        }
    }

    pub fn irq_asserted(&self) -> bool {
        self.irq_pending
    }

    pub fn mirroring(&self) -> Mirroring {
        if self.four_screen {
            Mirroring::FourScreen
        } else {
            self.mirroring
        }
    }

    pub fn prg_rom(&self) -> &[u8] {
        &self.prg_rom
    }
}
