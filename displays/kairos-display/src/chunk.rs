//! Rect fill chunking
//!
//! A fill larger than one transfer buffer is cut into row-major runs of at
//! most one buffer's worth of pixels. Runs walk the target rectangle the
//! same way the panel's write pointer walks its addressing window, so a run
//! may cross row boundaries and a boundary may fall mid-row where capacity
//! ran out; the next run resumes at the very next pixel. Taken together the
//! runs cover the target exactly, no gaps and no overlaps.

use crate::area::Area;
use crate::color::BYTES_PER_PIXEL;

/// One burst-sized run of a larger fill
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Chunk {
    /// Bounding sub-rectangle of the rows this run touches
    pub area: Area,
    /// Index of the run's first pixel, row-major within the target
    pub offset_px: u32,
    /// Pixels in this run
    pub len_px: u32,
}

impl Chunk {
    pub const fn len_bytes(&self) -> u32 {
        self.len_px * BYTES_PER_PIXEL as u32
    }
}

/// Iterator cutting a target rectangle into runs
///
/// Created by [`chunks`].
pub struct Chunks {
    target: Area,
    capacity_px: u32,
    total_px: u32,
    done_px: u32,
}

/// Cut `target` into row-major runs of at most `capacity_px` pixels
///
/// An empty target yields no runs.
///
/// # Panics
///
/// If `capacity_px` is zero.
pub fn chunks(target: Area, capacity_px: u32) -> Chunks {
    assert!(capacity_px > 0, "chunk capacity must be non-zero");
    Chunks {
        target,
        capacity_px,
        total_px: target.pixels(),
        done_px: 0,
    }
}

impl Iterator for Chunks {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        if self.done_px >= self.total_px {
            return None;
        }
        let len = (self.total_px - self.done_px).min(self.capacity_px);
        let width = self.target.width();
        let first = self.done_px;
        let last = first + len - 1;
        let first_row = (first / width) as u16;
        let last_row = (last / width) as u16;
        let area = if first_row == last_row {
            Area::new(
                self.target.x1 + (first % width) as u16,
                self.target.x1 + (last % width) as u16,
                self.target.y1 + first_row,
                self.target.y1 + first_row,
            )
        } else {
            Area::new(
                self.target.x1,
                self.target.x2,
                self.target.y1 + first_row,
                self.target.y1 + last_row,
            )
        };
        self.done_px += len;
        Some(Chunk {
            area,
            offset_px: first,
            len_px: len,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.total_px - self.done_px;
        let n = left.div_ceil(self.capacity_px) as usize;
        (n, Some(n))
    }
}

impl ExactSizeIterator for Chunks {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_fill_is_one_chunk() {
        let target = Area::new(10, 19, 20, 24);
        let mut it = chunks(target, 5120);
        let c = it.next().unwrap();
        assert_eq!(c.area, target);
        assert_eq!(c.offset_px, 0);
        assert_eq!(c.len_px, 50);
        assert_eq!(c.len_bytes(), 100);
        assert!(it.next().is_none());
    }

    #[test]
    fn test_empty_target_yields_nothing() {
        assert_eq!(chunks(Area::new(10, 5, 0, 0), 64).count(), 0);
    }

    #[test]
    fn test_boundary_at_row_end() {
        // 10x4 target, capacity of exactly two rows
        let target = Area::new(0, 9, 0, 3);
        let got: std::vec::Vec<Chunk> = chunks(target, 20).collect();
        assert_eq!(got.len(), 2);
        assert_eq!(got[0].area, Area::new(0, 9, 0, 1));
        assert_eq!(got[0].len_px, 20);
        assert_eq!(got[1].area, Area::new(0, 9, 2, 3));
        assert_eq!(got[1].offset_px, 20);
        assert_eq!(got[1].len_px, 20);
    }

    #[test]
    fn test_boundary_mid_row() {
        // 10x4 = 40 px, capacity 15: runs end mid-row and resume there
        let target = Area::new(0, 9, 0, 3);
        let got: std::vec::Vec<Chunk> = chunks(target, 15).collect();
        assert_eq!(got.len(), 3);
        // 15 px: row 0 and the first 5 px of row 1
        assert_eq!(got[0].area, Area::new(0, 9, 0, 1));
        // resumes at row 1 col 5, runs to the end of row 2
        assert_eq!(got[1].offset_px, 15);
        assert_eq!(got[1].len_px, 15);
        assert_eq!(got[1].area, Area::new(0, 9, 1, 2));
        // remainder: row 3 alone
        assert_eq!(got[2].offset_px, 30);
        assert_eq!(got[2].len_px, 10);
        assert_eq!(got[2].area, Area::new(0, 9, 3, 3));
    }

    #[test]
    fn test_single_row_splits_by_columns() {
        let target = Area::new(0, 99, 7, 7);
        let got: std::vec::Vec<Chunk> = chunks(target, 30).collect();
        assert_eq!(got.len(), 4);
        assert_eq!(got[0].area, Area::new(0, 29, 7, 7));
        assert_eq!(got[1].area, Area::new(30, 59, 7, 7));
        assert_eq!(got[2].area, Area::new(60, 89, 7, 7));
        assert_eq!(got[3].area, Area::new(90, 99, 7, 7));
        assert_eq!(got[3].len_px, 10);
    }

    #[test]
    fn test_offset_target_keeps_panel_coords() {
        let target = Area::new(100, 109, 200, 203);
        let got: std::vec::Vec<Chunk> = chunks(target, 15).collect();
        assert_eq!(got[1].area, Area::new(100, 109, 201, 202));
    }

    #[test]
    fn test_full_screen_chunk_count() {
        // 240x320 at 5120 px per buffer: fifteen maximal runs
        let target = Area::new(0, 239, 0, 319);
        let got: std::vec::Vec<Chunk> = chunks(target, 5120).collect();
        assert_eq!(got.len(), 15);
        assert!(got.iter().all(|c| c.len_px == 5120));
        assert_eq!(got.iter().map(|c| c.len_px).sum::<u32>(), 240 * 320);
        assert_eq!(got.last().unwrap().offset_px + 5120, 240 * 320);
    }

    #[test]
    fn test_size_hint_matches() {
        let target = Area::new(0, 239, 0, 319);
        let it = chunks(target, 5120);
        assert_eq!(it.len(), 15);
        let it = chunks(Area::new(0, 9, 0, 3), 15);
        assert_eq!(it.len(), 3);
    }

    #[test]
    fn test_runs_partition_the_target() {
        let target = Area::new(3, 41, 5, 27);
        let total = target.pixels();
        let mut next_expected = 0u32;
        for c in chunks(target, 129) {
            assert_eq!(c.offset_px, next_expected);
            assert!(c.len_px > 0 && c.len_px <= 129);
            // bounding area stays inside the target
            assert!(c.area.x1 >= target.x1 && c.area.x2 <= target.x2);
            assert!(c.area.y1 >= target.y1 && c.area.y2 <= target.y2);
            next_expected += c.len_px;
        }
        assert_eq!(next_expected, total);
    }
}
