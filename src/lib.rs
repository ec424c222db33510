//! Instruction- and scanline-granular emulation core for an LR35902-class
//! CPU, its 16-bit memory bus, and a four-mode picture unit producing a
//! 160x144 frame buffer of 2-bit color indices.
//!
//! The crate models the machine itself; display presentation, ROM file I/O,
//! audio, and cartridge bank switching are left to the embedding program.

/// The 16-bit address space and its fixed memory regions.
pub mod bus;
/// LR35902 register file, opcode dispatch, and cycle accounting.
pub mod cpu;
/// CPU flag bit constants and helpers.
pub mod flags;
/// Facade wiring CPU, bus, and PPU into one steppable machine.
pub mod machine;
/// Mode-cycled picture unit and background renderer.
pub mod ppu;

pub use bus::{Bus, RomError};
pub use cpu::Cpu;
pub use machine::Machine;
pub use ppu::{Mode, Ppu, SCREEN_HEIGHT, SCREEN_WIDTH};
