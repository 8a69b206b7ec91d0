//! Panel-space rectangles
//!
//! Coordinates are inclusive on both axes, matching the panel's column and
//! page address registers: a one-pixel area has `x1 == x2` and `y1 == y2`.

/// Inclusive rectangle in panel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Area {
    /// Left column
    pub x1: u16,
    /// Right column (inclusive)
    pub x2: u16,
    /// Top row
    pub y1: u16,
    /// Bottom row (inclusive)
    pub y2: u16,
}

impl Area {
    pub const fn new(x1: u16, x2: u16, y1: u16, y2: u16) -> Self {
        Self { x1, x2, y1, y2 }
    }

    /// Area spanning a full `width` x `height` panel
    pub const fn full(width: u16, height: u16) -> Self {
        Self::new(0, width - 1, 0, height - 1)
    }

    /// Width in pixels, zero if the rectangle is degenerate
    pub const fn width(&self) -> u32 {
        if self.x2 < self.x1 {
            0
        } else {
            self.x2 as u32 - self.x1 as u32 + 1
        }
    }

    /// Height in pixels, zero if the rectangle is degenerate
    pub const fn height(&self) -> u32 {
        if self.y2 < self.y1 {
            0
        } else {
            self.y2 as u32 - self.y1 as u32 + 1
        }
    }

    /// Total pixel count
    pub const fn pixels(&self) -> u32 {
        self.width() * self.height()
    }

    pub const fn is_empty(&self) -> bool {
        self.x2 < self.x1 || self.y2 < self.y1
    }

    /// Clip to an active panel of `width` x `height` pixels
    ///
    /// Returns `None` when the rectangle is degenerate or lies entirely
    /// off-panel. Coordinates are unsigned, so only the right and bottom
    /// edges can need trimming.
    pub fn clipped(&self, width: u16, height: u16) -> Option<Area> {
        if self.is_empty() || self.x1 >= width || self.y1 >= height {
            return None;
        }
        Some(Area {
            x1: self.x1,
            x2: self.x2.min(width - 1),
            y1: self.y1,
            y2: self.y2.min(height - 1),
        })
    }

    /// Whole rectangle inside an active panel of `width` x `height` pixels
    pub const fn fits(&self, width: u16, height: u16) -> bool {
        !self.is_empty() && self.x2 < width && self.y2 < height
    }
}
