//! Pixel format conversion
//!
//! The panel is driven in RGB565. UI code tends to hand colors around as
//! 24-bit RGB words, so the conversion lives here, close to the wire.

/// Bytes per RGB565 pixel on the panel bus
pub const BYTES_PER_PIXEL: usize = 2;

/// Convert a 24-bit `0x00RRGGBB` color to RGB565 by truncation
///
/// The low bits of each channel are dropped, not rounded: red and blue keep
/// their top 5 bits, green its top 6.
pub const fn rgb888_to_rgb565(rgb: u32) -> u16 {
    let r = ((rgb >> 19) & 0x1F) as u16;
    let g = ((rgb >> 10) & 0x3F) as u16;
    let b = ((rgb >> 3) & 0x1F) as u16;
    (r << 11) | (g << 5) | b
}
