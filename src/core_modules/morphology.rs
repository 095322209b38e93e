// THEORY:
// The `MorphologyFilter` cleans the classifier's raw mask before objects are
// extracted. It applies a 3x3 erosion followed by a 3x3 dilation (an "opening"):
//
// - Erosion keeps a pixel only if its whole 3x3 neighborhood is set. Isolated
//   pixels and speckles smaller than the neighborhood vanish.
// - Dilation sets a pixel if anything in its 3x3 neighborhood is set, growing the
//   survivors back to roughly their original outline.
//
// The combinators are plain bitwise AND / OR over the stored bytes, so the filter
// works for 0/1 masks and 0/255 masks alike without knowing which one it has.
//
// Pixels within `border_margin` of the frame edge are never written and never
// used as neighborhood centers, which keeps every 3x3 read in bounds. Callers that
// reuse a destination plane across ticks get the border ring it already had.

use crate::core_modules::frame::ImagePlane;

#[derive(Debug, Clone, Copy)]
pub struct MorphologyFilter {
    border_margin: u32,
}

impl MorphologyFilter {
    /// `border_margin` is raised to 1 if smaller; a 3x3 read needs one pixel of slack.
    pub fn new(border_margin: u32) -> Self {
        Self {
            border_margin: border_margin.max(1),
        }
    }

    pub fn border_margin(&self) -> u32 {
        self.border_margin
    }

    /// 3x3 AND of `source` into the interior of `dest`.
    pub fn erode(&self, source: &ImagePlane, dest: &mut ImagePlane) {
        self.apply(source, dest, |acc, v| acc & v);
    }

    /// 3x3 OR of `source` into the interior of `dest`.
    pub fn dilate(&self, source: &ImagePlane, dest: &mut ImagePlane) {
        self.apply(source, dest, |acc, v| acc | v);
    }

    /// Erode `source` into `scratch`, then dilate `scratch` into `dest`.
    pub fn open(&self, source: &ImagePlane, scratch: &mut ImagePlane, dest: &mut ImagePlane) {
        self.erode(source, scratch);
        self.dilate(scratch, dest);
    }

    fn apply(&self, source: &ImagePlane, dest: &mut ImagePlane, combine: impl Fn(u8, u8) -> u8) {
        debug_assert_eq!(source.shape(), dest.shape());
        debug_assert_eq!(source.channels(), 1);

        let width = source.width() as usize;
        let height = source.height() as usize;
        let margin = self.border_margin as usize;
        if width <= 2 * margin || height <= 2 * margin {
            return;
        }

        let src = source.data();
        let out = dest.data_mut();
        for r in margin..height - margin {
            let above = &src[(r - 1) * width..r * width];
            let row = &src[r * width..(r + 1) * width];
            let below = &src[(r + 1) * width..(r + 2) * width];
            for c in margin..width - margin {
                let mut acc = row[c];
                for line in [above, row, below] {
                    acc = combine(acc, line[c - 1]);
                    acc = combine(acc, line[c]);
                    acc = combine(acc, line[c + 1]);
                }
                out[r * width + c] = acc;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask_with(width: u32, height: u32, on: u8, points: &[(u32, u32)]) -> ImagePlane {
        let mut mask = ImagePlane::mask(width, height);
        for &(row, col) in points {
            mask.set(row, col, on);
        }
        mask
    }

    fn square(width: u32, height: u32, on: u8, top: u32, left: u32, size: u32) -> ImagePlane {
        let mut points = Vec::new();
        for row in top..top + size {
            for col in left..left + size {
                points.push((row, col));
            }
        }
        mask_with(width, height, on, &points)
    }

    #[test]
    fn isolated_pixel_is_removed_by_opening() {
        let filter = MorphologyFilter::new(2);
        let source = mask_with(12, 12, 255, &[(6, 6)]);
        let mut eroded = ImagePlane::mask(12, 12);
        let mut opened = ImagePlane::mask(12, 12);

        filter.erode(&source, &mut eroded);
        assert_eq!(eroded.count_nonzero(), 0);

        filter.dilate(&eroded, &mut opened);
        assert_eq!(opened.count_nonzero(), 0);
    }

    #[test]
    fn erosion_shrinks_and_dilation_restores_a_square() {
        let filter = MorphologyFilter::new(2);
        let source = square(16, 16, 255, 5, 5, 5);
        let mut eroded = ImagePlane::mask(16, 16);
        let mut opened = ImagePlane::mask(16, 16);

        filter.erode(&source, &mut eroded);
        assert_eq!(eroded, square(16, 16, 255, 6, 6, 3));

        filter.dilate(&eroded, &mut opened);
        assert_eq!(opened, source);
    }

    #[test]
    fn opening_is_idempotent_on_its_output() {
        let filter = MorphologyFilter::new(2);
        let mut source = square(20, 20, 255, 4, 4, 6);
        // A speckle and a one-pixel-wide spur that the first pass removes.
        source.set(15, 15, 255);
        for col in 10..14 {
            source.set(6, col, 255);
        }

        let mut scratch = ImagePlane::mask(20, 20);
        let mut once = ImagePlane::mask(20, 20);
        filter.open(&source, &mut scratch, &mut once);

        let mut twice = ImagePlane::mask(20, 20);
        filter.open(&once, &mut scratch, &mut twice);
        assert_eq!(once, twice);
        assert_eq!(once, square(20, 20, 255, 4, 4, 6));
    }

    #[test]
    fn works_on_zero_one_masks() {
        let filter = MorphologyFilter::new(2);
        let source = square(12, 12, 1, 3, 3, 4);
        let mut scratch = ImagePlane::mask(12, 12);
        let mut opened = ImagePlane::mask(12, 12);
        filter.open(&source, &mut scratch, &mut opened);
        assert!(opened.data().iter().all(|&v| v <= 1));
        assert_eq!(opened, source);
    }

    #[test]
    fn border_ring_is_never_written() {
        let filter = MorphologyFilter::new(2);
        let source = ImagePlane::mask(10, 10);
        let mut dest = ImagePlane::mask(10, 10);
        dest.data_mut().fill(9);

        filter.erode(&source, &mut dest);
        for row in 0..10 {
            for col in 0..10 {
                let interior = (2..8).contains(&row) && (2..8).contains(&col);
                let expected = if interior { 0 } else { 9 };
                assert_eq!(dest.get(row, col), expected, "pixel ({row}, {col})");
            }
        }
    }

    #[test]
    fn foreground_in_the_border_is_ignored_as_a_center() {
        let filter = MorphologyFilter::new(2);
        let source = square(10, 10, 255, 0, 0, 3);
        let mut eroded = ImagePlane::mask(10, 10);
        filter.erode(&source, &mut eroded);
        // (1, 1) would survive a full-frame erosion but lies in the border ring.
        assert_eq!(eroded.count_nonzero(), 0);
    }

    #[test]
    fn margin_is_at_least_one() {
        assert_eq!(MorphologyFilter::new(0).border_margin(), 1);
        assert_eq!(MorphologyFilter::new(3).border_margin(), 3);
    }
}
