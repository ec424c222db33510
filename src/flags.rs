//! CPU flag bits as documented in gbdev.io/pandocs/The_CPU_Flags.html

/// Zero flag (bit 7).
pub const Z: u8 = 0x80;
/// Subtract flag (bit 6).
pub const N: u8 = 0x40;
/// Half-carry flag (bit 5).
pub const H: u8 = 0x20;
/// Carry flag (bit 4).
pub const C: u8 = 0x10;

/// Only the high nibble of F holds meaningful bits; the low nibble reads zero.
pub const MASK: u8 = 0xF0;

/// Returns whether `flag` is set in `flags`.
#[inline]
pub fn has(flags: u8, flag: u8) -> bool {
    flags & flag != 0
}

/// Returns `flags` with `flag` set or cleared, low nibble forced to zero.
#[inline]
pub fn set(flags: u8, flag: u8, on: bool) -> u8 {
    let flags = flags & MASK;
    if on { flags | flag } else { flags & !flag }
}
