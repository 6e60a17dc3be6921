//! iNES 1.0 cartridge parsing.

use crate::NesError;
use ricoh_core::apu::TimingMode;
use ricoh_core::logging::{log, LogCategory, LogLevel};

/// Nametable mirroring arrangement exposed by the cartridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mirroring {
    Horizontal,
    Vertical,
    SingleScreenLower,
    SingleScreenUpper,
    FourScreen,
}

/// Parsed iNES image: header fields plus the PRG/CHR payloads.
#[derive(Debug, Clone)]
pub struct Cartridge {
    pub prg_rom: Vec<u8>,
    /// CHR payload: ROM contents, or zero-filled 8 KiB when the cart
    /// carries CHR RAM instead.
    pub chr: Vec<u8>,
    pub chr_is_ram: bool,
    pub mapper: u8,
    pub mirroring: Mirroring,
    pub four_screen: bool,
    pub battery: bool,
    pub timing: TimingMode,
}

const PRG_BANK_SIZE: usize = 16 * 1024;
const CHR_BANK_SIZE: usize = 8 * 1024;
const TRAINER_SIZE: usize = 512;

impl Cartridge {
    /// Parse an iNES 1.0 image from bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self, NesError> {
        if data.len() < 16 {
            return Err(NesError::InvalidRom("truncated header"));
        }
        let mut header = [0u8; 16];
        header.copy_from_slice(&data[0..16]);

        if &header[0..4] != b"NES\x1A" {
            return Err(NesError::InvalidRom("bad magic"));
        }

        // Scrub "DiskDude!" header corruption before reading the high
        // mapper nibble.
        if &header[7..16] == b"DiskDude!" {
            header[7..16].fill(0);
        }

        let prg_size = header[4] as usize * PRG_BANK_SIZE;
        let chr_size = header[5] as usize * CHR_BANK_SIZE;
        let mapper = (header[6] >> 4) | (header[7] & 0xF0);

        // Flags 6: bit 0 mirroring, bit 1 battery, bit 2 trainer,
        // bit 3 four-screen.
        let vertical = header[6] & 0x01 != 0;
        let battery = header[6] & 0x02 != 0;
        let has_trainer = header[6] & 0x04 != 0;
        let four_screen = header[6] & 0x08 != 0;
        let mirroring = if vertical {
            Mirroring::Vertical
        } else {
            Mirroring::Horizontal
        };

        // NES 2.0 marks timing in byte 12; iNES 1.0 has only the unofficial
        // PAL flag in byte 9.
        let is_nes2 = header[7] & 0x0C == 0x08;
        let timing = if is_nes2 {
            match header[12] & 0x03 {
                1 => TimingMode::Pal,
                _ => TimingMode::Ntsc,
            }
        } else if header[9] & 0x01 != 0 {
            TimingMode::Pal
        } else {
            TimingMode::Ntsc
        };

        if prg_size == 0 {
            return Err(NesError::InvalidRom("no PRG ROM"));
        }

        let mut offset = 16;
        if has_trainer {
            offset += TRAINER_SIZE;
        }

        if data.len() < offset + prg_size {
            return Err(NesError::InvalidRom("truncated PRG ROM"));
        }
        let prg_rom = data[offset..offset + prg_size].to_vec();
        offset += prg_size;

        let (chr, chr_is_ram) = if chr_size > 0 {
            if data.len() < offset + chr_size {
                return Err(NesError::InvalidRom("truncated CHR ROM"));
            }
            (data[offset..offset + chr_size].to_vec(), false)
        } else {
            (vec![0u8; CHR_BANK_SIZE], true)
        };

        log(LogCategory::Bus, LogLevel::Info, || {
            format!(
                "loaded cartridge: mapper {} ({} KB PRG, {} KB CHR{}, {:?}, {:?})",
                mapper,
                prg_size / 1024,
                chr.len() / 1024,
                if chr_is_ram { " RAM" } else { "" },
                mirroring,
                timing
            )
        });

        Ok(Self {
            prg_rom,
            chr,
            chr_is_ram,
            mapper,
            mirroring,
            four_screen,
            battery,
            timing,
        })
    }
}
