//! NES cartridge mappers.
//!
//! Each mapper owns the cartridge payload (PRG ROM, PRG RAM, CHR ROM/RAM)
//! and answers the bus's reads and writes in the cartridge address regions.
//! The [`Mapper`] enum dispatches on a tag in the bus hot path; no access
//! allocates.

mod cnrom;
mod mmc1;
mod mmc3;
mod nrom;
mod uxrom;

pub use cnrom::Cnrom;
pub use mmc1::Mmc1;
pub use mmc3::Mmc3;
pub use nrom::Nrom;
pub use uxrom::Uxrom;

use crate::cartridge::{Cartridge, Mirroring};
use crate::NesError;

/// Unified mapper enum that dispatches to specific implementations.
#[derive(Debug)]
pub enum Mapper {
    Nrom(Nrom),
    Mmc1(Mmc1),
    Uxrom(Uxrom),
    Cnrom(Cnrom),
    Mmc3(Mmc3),
}

impl Mapper {
    /// Build the mapper for a parsed cartridge.
    pub fn new(cart: Cartridge) -> Result<Self, NesError> {
        match cart.mapper {
            0 => Ok(Mapper::Nrom(Nrom::new(cart))),
            1 => Ok(Mapper::Mmc1(Mmc1::new(cart))),
            2 => Ok(Mapper::Uxrom(Uxrom::new(cart))),
            3 => Ok(Mapper::Cnrom(Cnrom::new(cart))),
            4 => Ok(Mapper::Mmc3(Mmc3::new(cart))),
            n => Err(NesError::UnsupportedMapper(n)),
        }
    }

    /// CPU-side read for $4020-$FFFF.
    pub fn cpu_read(&self, addr: u16) -> u8 {
        match self {
            Mapper::Nrom(m) => m.cpu_read(addr),
            Mapper::Mmc1(m) => m.cpu_read(addr),
            Mapper::Uxrom(m) => m.cpu_read(addr),
            Mapper::Cnrom(m) => m.cpu_read(addr),
            Mapper::Mmc3(m) => m.cpu_read(addr),
        }
    }

    /// CPU-side write for $4020-$FFFF (mapper registers, PRG RAM).
    pub fn cpu_write(&mut self, addr: u16, val: u8) {
        match self {
            Mapper::Nrom(m) => m.cpu_write(addr, val),
            Mapper::Mmc1(m) => m.cpu_write(addr, val),
            Mapper::Uxrom(m) => m.cpu_write(addr, val),
            Mapper::Cnrom(m) => m.cpu_write(addr, val),
            Mapper::Mmc3(m) => m.cpu_write(addr, val),
        }
    }

    /// PPU-side read of the CHR window ($0000-$1FFF).
    pub fn ppu_read(&self, addr: u16) -> u8 {
        match self {
            Mapper::Nrom(m) => m.ppu_read(addr),
            Mapper::Mmc1(m) => m.ppu_read(addr),
            Mapper::Uxrom(m) => m.ppu_read(addr),
            Mapper::Cnrom(m) => m.ppu_read(addr),
            Mapper::Mmc3(m) => m.ppu_read(addr),
        }
    }

    /// PPU-side write of the CHR window (CHR RAM carts).
    pub fn ppu_write(&mut self, addr: u16, val: u8) {
        match self {
            Mapper::Nrom(m) => m.ppu_write(addr, val),
            Mapper::Mmc1(m) => m.ppu_write(addr, val),
            Mapper::Uxrom(m) => m.ppu_write(addr, val),
            Mapper::Cnrom(m) => m.ppu_write(addr, val),
            Mapper::Mmc3(m) => m.ppu_write(addr, val),
        }
    }

    /// Current nametable mirroring arrangement.
    pub fn mirroring(&self) -> Mirroring {
        match self {
            Mapper::Nrom(m) => m.mirroring(),
            Mapper::Mmc1(m) => m.mirroring(),
            Mapper::Uxrom(m) => m.mirroring(),
            Mapper::Cnrom(m) => m.mirroring(),
            Mapper::Mmc3(m) => m.mirroring(),
        }
    }

    /// Scanline clock from the PPU (rendering enabled, dot 260 of each
    /// visible scanline). Only MMC3 listens.
    pub fn clock_scanline(&mut self) {
        if let Mapper::Mmc3(m) = self {
            m.clock_scanline();
        }
    }

    /// Level-sampled mapper IRQ line.
    pub fn irq_asserted(&self) -> bool {
        match self {
            Mapper::Mmc3(m) => m.irq_asserted(),
            _ => false,
        }
    }

    /// Reference to the full PRG ROM (diagnostics).
    pub fn prg_rom(&self) -> &[u8] {
        match self {
            Mapper::Nrom(m) => m.prg_rom(),
            Mapper::Mmc1(m) => m.prg_rom(),
            Mapper::Uxrom(m) => m.prg_rom(),
            Mapper::Cnrom(m) => m.prg_rom(),
            Mapper::Mmc3(m) => m.prg_rom(),
        }
    }

    pub fn mapper_number(&self) -> u8 {
        match self {
            Mapper::Nrom(_) => 0,
            Mapper::Mmc1(_) => 1,
            Mapper::Uxrom(_) => 2,
            Mapper::Cnrom(_) => 3,
            Mapper::Mmc3(_) => 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cartridge::tests::build_ines;

    #[test]
    fn known_mappers_construct() {
        for n in [0u8, 1, 2, 3, 4] {
            let cart = Cartridge::from_bytes(&build_ines(n, 1, 1, 0)).unwrap();
            let mapper = Mapper::new(cart).unwrap();
            assert_eq!(mapper.mapper_number(), n);
        }
    }

    #[test]
    fn unknown_mapper_is_rejected() {
        let cart = Cartridge::from_bytes(&build_ines(7, 1, 1, 0)).unwrap();
        assert!(matches!(
            Mapper::new(cart),
            Err(NesError::UnsupportedMapper(7))
        ));
    }
}
