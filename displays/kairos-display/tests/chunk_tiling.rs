//! Property-based tests for run chunking.
//! The runs of any target rectangle must cover it exactly, whatever the
//! rectangle and whatever the buffer capacity.

use kairos_display::chunk::chunks;
use kairos_display::Area;

proptest::proptest! {
    /// Runs partition the target: contiguous offsets, capacity respected,
    /// pixel counts summing to the whole rectangle.
    #[test]
    fn runs_partition_any_target(
        x1 in 0u16..240,
        w in 1u32..=240,
        y1 in 0u16..320,
        h in 1u32..=320,
        capacity in 1u32..=6000,
    ) {
        let target = Area::new(x1, x1 + (w - 1) as u16, y1, y1 + (h - 1) as u16);
        let mut next_offset = 0u32;
        for run in chunks(target, capacity) {
            assert_eq!(run.offset_px, next_offset, "runs must be contiguous");
            assert!(run.len_px > 0 && run.len_px <= capacity);
            next_offset += run.len_px;
        }
        assert_eq!(next_offset, target.pixels(), "runs must cover every pixel once");
    }

    /// Every run's bounding area stays inside the target and is wide enough
    /// to hold the run's pixels.
    #[test]
    fn run_areas_stay_inside_target(
        x1 in 0u16..240,
        w in 1u32..=240,
        y1 in 0u16..320,
        h in 1u32..=320,
        capacity in 1u32..=6000,
    ) {
        let target = Area::new(x1, x1 + (w - 1) as u16, y1, y1 + (h - 1) as u16);
        for run in chunks(target, capacity) {
            assert!(run.area.x1 >= target.x1 && run.area.x2 <= target.x2);
            assert!(run.area.y1 >= target.y1 && run.area.y2 <= target.y2);
            assert!(run.area.pixels() >= run.len_px,
                "bounding area {:?} too small for {} px", run.area, run.len_px);
        }
    }

    /// The reported length matches the number of runs actually produced.
    #[test]
    fn run_count_matches_len(
        w in 1u32..=240,
        h in 1u32..=320,
        capacity in 1u32..=6000,
    ) {
        let target = Area::new(0, (w - 1) as u16, 0, (h - 1) as u16);
        let it = chunks(target, capacity);
        let reported = it.len();
        assert_eq!(reported, it.count());
        assert_eq!(reported as u32, target.pixels().div_ceil(capacity));
    }
}
