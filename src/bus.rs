use std::{error, fmt};

// Region sizes per gbdev.gg8.se/wiki/articles/Memory_Map
const ROM_SIZE: usize = 0x8000;
const VRAM_SIZE: usize = 0x2000;
const ERAM_SIZE: usize = 0x2000;
const WRAM_SIZE: usize = 0x2000;
const OAM_SIZE: usize = 0x100;
const IO_SIZE: usize = 0x80;
const HRAM_SIZE: usize = 0x7F;

/// Error produced when a ROM image does not fit the fixed 32KB window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RomError {
    TooLarge { size: usize },
}

impl fmt::Display for RomError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RomError::TooLarge { size } => {
                write!(f, "ROM image is {size} bytes, larger than the 32768 byte window")
            }
        }
    }
}

impl error::Error for RomError {}

/// The 16-bit address space, split into fixed regions.
///
/// Reads outside any mapped region return 0. Writes to ROM or to unmapped
/// space are silently dropped. 0xFFFF is the interrupt-enable byte.
pub struct Bus {
    rom: [u8; ROM_SIZE],
    vram: [u8; VRAM_SIZE],
    eram: [u8; ERAM_SIZE],
    wram: [u8; WRAM_SIZE],
    oam: [u8; OAM_SIZE],
    io: [u8; IO_SIZE],
    hram: [u8; HRAM_SIZE],
    ie: u8,
}

impl Bus {
    pub fn new() -> Self {
        Self {
            rom: [0; ROM_SIZE],
            vram: [0; VRAM_SIZE],
            eram: [0; ERAM_SIZE],
            wram: [0; WRAM_SIZE],
            oam: [0; OAM_SIZE],
            io: [0; IO_SIZE],
            hram: [0; HRAM_SIZE],
            ie: 0,
        }
    }

    /// Copy a ROM image verbatim to 0x0000.
    ///
    /// The whole 32KB window is cleared first, so a short image leaves the
    /// remainder zeroed. Images larger than the window are rejected.
    pub fn load_rom(&mut self, data: &[u8]) -> Result<(), RomError> {
        if data.len() > ROM_SIZE {
            return Err(RomError::TooLarge { size: data.len() });
        }
        self.rom = [0; ROM_SIZE];
        self.rom[..data.len()].copy_from_slice(data);
        log::debug!("loaded {} byte ROM image", data.len());
        Ok(())
    }

    pub fn read_byte(&self, addr: u16) -> u8 {
        match addr {
            0x0000..=0x7FFF => self.rom[addr as usize],
            0x8000..=0x9FFF => self.vram[(addr - 0x8000) as usize],
            0xA000..=0xBFFF => self.eram[(addr - 0xA000) as usize],
            0xC000..=0xDFFF => self.wram[(addr - 0xC000) as usize],
            0xFE00..=0xFEFF => self.oam[(addr - 0xFE00) as usize],
            0xFF00..=0xFF7F => self.io[(addr - 0xFF00) as usize],
            0xFF80..=0xFFFE => self.hram[(addr - 0xFF80) as usize],
            0xFFFF => self.ie,
            _ => 0,
        }
    }

    pub fn write_byte(&mut self, addr: u16, val: u8) {
        match addr {
            // ROM is read-only on the bus; the loader fills it directly.
            0x0000..=0x7FFF => {}
            0x8000..=0x9FFF => self.vram[(addr - 0x8000) as usize] = val,
            0xA000..=0xBFFF => self.eram[(addr - 0xA000) as usize] = val,
            0xC000..=0xDFFF => self.wram[(addr - 0xC000) as usize] = val,
            0xFE00..=0xFEFF => self.oam[(addr - 0xFE00) as usize] = val,
            0xFF00..=0xFF7F => self.io[(addr - 0xFF00) as usize] = val,
            0xFF80..=0xFFFE => self.hram[(addr - 0xFF80) as usize] = val,
            0xFFFF => self.ie = val,
            _ => {}
        }
    }

    /// Read a little-endian word: low byte at `addr`, high byte at `addr + 1`.
    pub fn read_word(&self, addr: u16) -> u16 {
        let lo = self.read_byte(addr) as u16;
        let hi = self.read_byte(addr.wrapping_add(1)) as u16;
        (hi << 8) | lo
    }

    /// Write a little-endian word: low byte at `addr`, high byte at `addr + 1`.
    pub fn write_word(&mut self, addr: u16, val: u16) {
        self.write_byte(addr, val as u8);
        self.write_byte(addr.wrapping_add(1), (val >> 8) as u8);
    }

    /// Clear every region except ROM.
    pub fn reset_ram(&mut self) {
        self.vram = [0; VRAM_SIZE];
        self.eram = [0; ERAM_SIZE];
        self.wram = [0; WRAM_SIZE];
        self.oam = [0; OAM_SIZE];
        self.io = [0; IO_SIZE];
        self.hram = [0; HRAM_SIZE];
        self.ie = 0;
    }
}

impl Default for Bus {
    fn default() -> Self {
        Self::new()
    }
}
