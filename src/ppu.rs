use crate::bus::Bus;

pub const SCREEN_WIDTH: usize = 160;
pub const SCREEN_HEIGHT: usize = 144;

// Mode dwell times, in the same cycle units the CPU step returns.
const OAM_SCAN_CYCLES: u32 = 80;
const VRAM_SCAN_CYCLES: u32 = 172;
const HBLANK_CYCLES: u32 = 204;
const VBLANK_LINE_CYCLES: u32 = 456;

const FIRST_VBLANK_LINE: u8 = 143;
const LAST_VBLANK_LINE: u8 = 153;

// I/O registers per gbdev.io/pandocs/LCDC.html and Scrolling.html
const LCDC_ADDR: u16 = 0xFF40;
const SCY_ADDR: u16 = 0xFF42;
const SCX_ADDR: u16 = 0xFF43;
const LY_ADDR: u16 = 0xFF44;
const BGP_ADDR: u16 = 0xFF47;

const TILE_MAP_LOW: u16 = 0x9800;
const TILE_MAP_HIGH: u16 = 0x9C00;
const TILE_DATA_UNSIGNED: u16 = 0x8000;
const TILE_DATA_SIGNED: u16 = 0x8800;

/// Every tile the 8KB of VRAM can hold.
const TILE_COUNT: usize = 512;

/// The four repeating phases of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    HBlank,
    VBlank,
    OamScan,
    VramScan,
}

/// LCDC register bits, decoded by name.
#[derive(Debug, Clone, Copy)]
pub struct LcdControl {
    pub bg_enable: bool,
    pub obj_enable: bool,
    pub obj_size: bool,
    pub bg_map_high: bool,
    pub data_unsigned: bool,
    pub window_enable: bool,
    pub window_map_high: bool,
    pub display_enable: bool,
}

impl LcdControl {
    pub fn from_byte(val: u8) -> Self {
        Self {
            bg_enable: val & 0x01 != 0,
            obj_enable: val & 0x02 != 0,
            obj_size: val & 0x04 != 0,
            bg_map_high: val & 0x08 != 0,
            data_unsigned: val & 0x10 != 0,
            window_enable: val & 0x20 != 0,
            window_map_high: val & 0x40 != 0,
            display_enable: val & 0x80 != 0,
        }
    }
}

/// Mode-cycled picture unit.
///
/// Advances through OAM scan, VRAM scan, and HBlank per visible line, then
/// ten lines of VBlank. The frame buffer holds raw 2-bit color indices;
/// [`shade`] maps them through a palette byte.
pub struct Ppu {
    mode: Mode,
    mode_clock: u32,
    line: u8,
    framebuffer: [u8; SCREEN_WIDTH * SCREEN_HEIGHT],
    frame_ready: bool,
    frame_counter: u64,
}

impl Ppu {
    pub fn new() -> Self {
        Self {
            mode: Mode::OamScan,
            mode_clock: 0,
            line: 0,
            framebuffer: [0; SCREEN_WIDTH * SCREEN_HEIGHT],
            frame_ready: false,
            frame_counter: 0,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn mode_clock(&self) -> u32 {
        self.mode_clock
    }

    pub fn line(&self) -> u8 {
        self.line
    }

    pub fn frame_ready(&self) -> bool {
        self.frame_ready
    }

    pub fn clear_frame_flag(&mut self) {
        self.frame_ready = false;
    }

    pub fn framebuffer(&self) -> &[u8; SCREEN_WIDTH * SCREEN_HEIGHT] {
        &self.framebuffer
    }

    /// Completed frame count since power-on.
    pub fn frames(&self) -> u64 {
        self.frame_counter
    }

    /// Advance the mode machine by one instruction's cycle count.
    ///
    /// At most one mode transition fires per call; the mode clock resets to
    /// zero on each transition. Returns whether this call completed a frame.
    pub fn step(&mut self, cycles: u32, bus: &mut Bus) -> bool {
        self.mode_clock += cycles;
        let mut frame_done = false;
        match self.mode {
            Mode::OamScan => {
                if self.mode_clock >= OAM_SCAN_CYCLES {
                    self.mode_clock = 0;
                    self.mode = Mode::VramScan;
                }
            }
            Mode::VramScan => {
                if self.mode_clock >= VRAM_SCAN_CYCLES {
                    self.mode_clock = 0;
                    self.mode = Mode::HBlank;
                    self.render_scanline(bus);
                }
            }
            Mode::HBlank => {
                if self.mode_clock >= HBLANK_CYCLES {
                    self.mode_clock = 0;
                    self.line += 1;
                    bus.write_byte(LY_ADDR, self.line);
                    if self.line == FIRST_VBLANK_LINE {
                        self.mode = Mode::VBlank;
                        self.frame_ready = true;
                        self.frame_counter += 1;
                        frame_done = true;
                        #[cfg(feature = "ppu-trace")]
                        eprintln!("[PPU] frame {} complete", self.frame_counter);
                    } else {
                        self.mode = Mode::OamScan;
                    }
                }
            }
            Mode::VBlank => {
                if self.mode_clock >= VBLANK_LINE_CYCLES {
                    self.mode_clock = 0;
                    self.line += 1;
                    if self.line > LAST_VBLANK_LINE {
                        self.line = 0;
                        self.mode = Mode::OamScan;
                    }
                    bus.write_byte(LY_ADDR, self.line);
                }
            }
        }
        frame_done
    }

    /// Render the background pixels of the current line into the frame
    /// buffer. A no-op while the display is disabled or during VBlank.
    fn render_scanline(&mut self, bus: &Bus) {
        let lcdc = LcdControl::from_byte(bus.read_byte(LCDC_ADDR));
        if !lcdc.display_enable || self.line as usize >= SCREEN_HEIGHT {
            return;
        }

        let scy = bus.read_byte(SCY_ADDR);
        let scx = bus.read_byte(SCX_ADDR);
        let map_base = if lcdc.bg_map_high { TILE_MAP_HIGH } else { TILE_MAP_LOW };

        // The background wraps at 256 pixels in both axes.
        let bg_y = self.line.wrapping_add(scy);
        let tile_row = (bg_y / 8) as u16;
        let pixel_row = (bg_y % 8) as u16;

        for px in 0..SCREEN_WIDTH {
            let bg_x = (px as u8).wrapping_add(scx);
            let tile_col = (bg_x / 8) as u16;
            let id = bus.read_byte(map_base + tile_row * 32 + tile_col);

            let tile_addr = if lcdc.data_unsigned {
                TILE_DATA_UNSIGNED + id as u16 * 16
            } else {
                // Signed ids index from 0x9000: -128..-1 map below it,
                // 0..127 at and above.
                TILE_DATA_SIGNED + ((id as i8 as i16 + 128) as u16) * 16
            };

            let lo = bus.read_byte(tile_addr + pixel_row * 2);
            let hi = bus.read_byte(tile_addr + pixel_row * 2 + 1);
            let bit = 7 - (bg_x % 8);
            let color = ((hi >> bit) & 1) << 1 | ((lo >> bit) & 1);

            self.framebuffer[self.line as usize * SCREEN_WIDTH + px] = color;
        }

        #[cfg(feature = "ppu-trace")]
        eprintln!("[PPU] rendered line {}", self.line);
    }

    /// Look up `color_id` through the current BGP palette byte.
    pub fn palette_color(&self, bus: &Bus, color_id: u8) -> u8 {
        shade(bus.read_byte(BGP_ADDR), color_id)
    }

    /// Decode every VRAM tile into an 8x8 grid of 2-bit values.
    pub fn tiles(&self, bus: &Bus) -> Vec<[[u8; 8]; 8]> {
        let mut tiles = Vec::with_capacity(TILE_COUNT);
        for index in 0..TILE_COUNT {
            let base = TILE_DATA_UNSIGNED + index as u16 * 16;
            let mut tile = [[0u8; 8]; 8];
            for (row, pixels) in tile.iter_mut().enumerate() {
                let lo = bus.read_byte(base + row as u16 * 2);
                let hi = bus.read_byte(base + row as u16 * 2 + 1);
                for (col, pixel) in pixels.iter_mut().enumerate() {
                    let bit = 7 - col;
                    *pixel = ((hi >> bit) & 1) << 1 | ((lo >> bit) & 1);
                }
            }
            tiles.push(tile);
        }
        tiles
    }
}

/// Map a 2-bit color index through a packed palette byte.
///
/// Each index selects a 2-bit field: index 0 in bits 0-1 up to index 3 in
/// bits 6-7.
pub fn shade(palette: u8, color_id: u8) -> u8 {
    (palette >> (color_id * 2)) & 0x03
}

impl Default for Ppu {
    fn default() -> Self {
        Self::new()
    }
}
