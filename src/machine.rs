use crate::bus::{Bus, RomError};
use crate::cpu::Cpu;
use crate::ppu::Ppu;

// Post-boot I/O values from gbdev.io/pandocs/Power_Up_State.html
const BOOT_LCDC: u8 = 0x91;
const BOOT_BGP: u8 = 0xFC;

const LCDC_ADDR: u16 = 0xFF40;
const BGP_ADDR: u16 = 0xFF47;

/// A complete machine: CPU, bus, and picture unit stepped in lockstep.
pub struct Machine {
    pub cpu: Cpu,
    pub bus: Bus,
    pub ppu: Ppu,
}

impl Machine {
    /// Create a machine in the documented post-boot state with no ROM loaded.
    pub fn new() -> Self {
        let mut bus = Bus::new();
        apply_boot_io(&mut bus);
        Self {
            cpu: Cpu::new(),
            bus,
            ppu: Ppu::new(),
        }
    }

    pub fn load_rom(&mut self, data: &[u8]) -> Result<(), RomError> {
        self.bus.load_rom(data)
    }

    /// Execute one instruction, then advance the picture unit by that
    /// instruction's cycle count. Returns whether a frame completed.
    pub fn step(&mut self) -> bool {
        let cycles = self.cpu.step(&mut self.bus);
        self.ppu.step(cycles, &mut self.bus)
    }

    /// Return to the post-boot state. The loaded ROM survives; every other
    /// memory region is cleared.
    pub fn reset(&mut self) {
        self.cpu = Cpu::new();
        self.ppu = Ppu::new();
        self.bus.reset_ram();
        apply_boot_io(&mut self.bus);
    }
}

fn apply_boot_io(bus: &mut Bus) {
    bus.write_byte(LCDC_ADDR, BOOT_LCDC);
    bus.write_byte(BGP_ADDR, BOOT_BGP);
}

impl Default for Machine {
    fn default() -> Self {
        Self::new()
    }
}
