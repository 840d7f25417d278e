// THEORY:
// The `DifferenceMask` is the first analysis layer. It turns two images into a
// single grid of booleans: `true` wherever the pixels at the same position are
// further apart than the tolerance allows.
//
// Key architectural principles:
// 1.  **Margin Exclusion**: A border of `margin` pixels on every side is never
//     compared and never set. Lossy encoders smear the edges of an image, and the
//     rectangles drawn downstream are offset by the same margin, so the value is
//     carried on the mask for the extractor to reuse.
// 2.  **Precondition, Not Recovery**: Mismatched dimensions abort the build before
//     any pixel is read. There is no partial mask.
// 3.  **Embarrassingly Parallel**: Every position is independent of every other,
//     so `build_parallel` hands each row to rayon as its own work item. The
//     result is identical to `build`.

pub mod difference_mask {
    use crate::core_modules::pixel::pixel::PixelBuffer;
    use crate::core_modules::pixel_metric::pixel_metric::{Distance, PixelMetric};
    use crate::error::DiffError;
    use rayon::prelude::*;
    use std::ops::Range;

    /// Threshold a distance must exceed to be flagged. Negative values flag every
    /// scanned position.
    pub type Tolerance = i64;

    #[inline]
    fn exceeds(distance: Distance, tolerance: Tolerance) -> bool {
        Tolerance::from(distance) > tolerance
    }

    /// A width × height grid flagging the positions where two images disagree.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct DifferenceMask {
        width: u32,
        height: u32,
        margin: u32,
        /// Row-major: index `y * width + x`.
        cells: Vec<bool>,
    }

    impl DifferenceMask {
        /// A mask with nothing flagged.
        pub fn empty(width: u32, height: u32, margin: u32) -> Self {
            Self {
                width,
                height,
                margin,
                cells: vec![false; width as usize * height as usize],
            }
        }

        /// A mask flagging every scanned position for which `flagged(x, y)` holds.
        /// The margin stays clear whatever `flagged` returns there.
        pub fn from_fn(
            width: u32,
            height: u32,
            margin: u32,
            mut flagged: impl FnMut(u32, u32) -> bool,
        ) -> Self {
            let mut mask = Self::empty(width, height, margin);
            for x in mask.scan_columns() {
                for y in mask.scan_rows() {
                    if flagged(x, y) {
                        let index = mask.index(x, y);
                        mask.cells[index] = true;
                    }
                }
            }
            mask
        }

        /// Compares `first` and `second` position by position on the calling thread.
        pub fn build<A, B>(
            first: &A,
            second: &B,
            metric: PixelMetric,
            tolerance: Tolerance,
            margin: u32,
        ) -> Result<Self, DiffError>
        where
            A: PixelBuffer + ?Sized,
            B: PixelBuffer + ?Sized,
        {
            let (width, height) = ensure_same_dimensions(first, second)?;
            let mut mask = Self::empty(width, height, margin);

            for x in mask.scan_columns() {
                for y in mask.scan_rows() {
                    let distance = metric.distance(&first.pixel(x, y), &second.pixel(x, y));
                    if exceeds(distance, tolerance) {
                        let index = mask.index(x, y);
                        mask.cells[index] = true;
                    }
                }
            }

            Ok(mask)
        }

        /// Same as [`DifferenceMask::build`], with one row per rayon work item.
        pub fn build_parallel<A, B>(
            first: &A,
            second: &B,
            metric: PixelMetric,
            tolerance: Tolerance,
            margin: u32,
        ) -> Result<Self, DiffError>
        where
            A: PixelBuffer + Sync + ?Sized,
            B: PixelBuffer + Sync + ?Sized,
        {
            let (width, height) = ensure_same_dimensions(first, second)?;
            let mut mask = Self::empty(width, height, margin);

            let columns = mask.scan_columns();
            let rows = mask.scan_rows();
            if columns.is_empty() || rows.is_empty() {
                return Ok(mask);
            }

            let row_len = width as usize;
            mask.cells
                .par_chunks_mut(row_len)
                .enumerate()
                .filter(|(y, _)| rows.contains(&(*y as u32)))
                .for_each(|(y, row)| {
                    let y = y as u32;
                    for x in columns.clone() {
                        let distance = metric.distance(&first.pixel(x, y), &second.pixel(x, y));
                        row[x as usize] = exceeds(distance, tolerance);
                    }
                });

            Ok(mask)
        }

        pub fn width(&self) -> u32 {
            self.width
        }

        pub fn height(&self) -> u32 {
            self.height
        }

        pub fn margin(&self) -> u32 {
            self.margin
        }

        /// Whether `(x, y)` was flagged. Out-of-range positions read as `false`.
        #[inline]
        pub fn get(&self, x: u32, y: u32) -> bool {
            x < self.width && y < self.height && self.cells[self.index(x, y)]
        }

        /// Number of flagged positions.
        pub fn count(&self) -> usize {
            self.cells.iter().filter(|cell| **cell).count()
        }

        /// The `x` values that are compared, i.e. everything but the margin.
        pub fn scan_columns(&self) -> Range<u32> {
            self.margin..self.width.saturating_sub(self.margin)
        }

        /// The `y` values that are compared, i.e. everything but the margin.
        pub fn scan_rows(&self) -> Range<u32> {
            self.margin..self.height.saturating_sub(self.margin)
        }

        #[inline]
        pub(crate) fn index(&self, x: u32, y: u32) -> usize {
            y as usize * self.width as usize + x as usize
        }
    }

    /// Returns the shared `(width, height)` or a `DimensionMismatch`.
    pub fn ensure_same_dimensions<A, B>(first: &A, second: &B) -> Result<(u32, u32), DiffError>
    where
        A: PixelBuffer + ?Sized,
        B: PixelBuffer + ?Sized,
    {
        let left = first.dimensions();
        let right = second.dimensions();
        if left != right {
            return Err(DiffError::DimensionMismatch { left, right });
        }
        Ok(left)
    }
}

#[cfg(test)]
mod tests {
    use super::difference_mask::*;
    use crate::core_modules::pixel::pixel::{Pixel, RgbaFrame};
    use crate::core_modules::pixel_metric::pixel_metric::PixelMetric;
    use crate::error::DiffError;
    use proptest::prelude::*;

    const GRAY: Pixel = Pixel {
        red: 128,
        green: 128,
        blue: 128,
        alpha: 255,
    };

    fn frame_with(width: u32, height: u32, changed: &[(u32, u32)], pixel: Pixel) -> RgbaFrame {
        let mut frame = RgbaFrame::filled(width, height, GRAY);
        for &(x, y) in changed {
            frame.set_pixel(x, y, pixel);
        }
        frame
    }

    #[test]
    fn identical_buffers_produce_empty_mask() {
        let a = RgbaFrame::filled(30, 20, GRAY);
        let mask = DifferenceMask::build(&a, &a.clone(), PixelMetric::Rgb, 0, 5).unwrap();

        assert_eq!(mask.count(), 0);
        assert_eq!((mask.width(), mask.height()), (30, 20));
    }

    #[test]
    fn mismatched_dimensions_fail() {
        let a = RgbaFrame::filled(10, 10, GRAY);
        let b = RgbaFrame::filled(10, 12, GRAY);
        let result = DifferenceMask::build(&a, &b, PixelMetric::Rgb, 8, 5);

        assert!(matches!(
            result,
            Err(DiffError::DimensionMismatch {
                left: (10, 10),
                right: (10, 12)
            })
        ));
        assert!(DifferenceMask::build_parallel(&a, &b, PixelMetric::Rgb, 8, 5).is_err());
    }

    #[test]
    fn margin_is_never_flagged() {
        let mut border = Vec::new();
        for x in 0..20 {
            for y in 0..20 {
                if x < 5 || x >= 15 || y < 5 || y >= 15 {
                    border.push((x, y));
                }
            }
        }
        let a = RgbaFrame::filled(20, 20, GRAY);
        let b = frame_with(20, 20, &border, Pixel::new(0, 0, 0, 0));

        let mask = DifferenceMask::build(&a, &b, PixelMetric::Argb, 0, 5).unwrap();
        assert_eq!(mask.count(), 0);
        assert_eq!(mask.margin(), 5);
    }

    #[test]
    fn first_and_last_scanned_positions_are_compared() {
        let a = RgbaFrame::filled(20, 20, GRAY);
        let b = frame_with(
            20,
            20,
            &[(5, 5), (14, 14), (4, 10), (15, 10)],
            Pixel::rgb(0, 0, 0),
        );

        let mask = DifferenceMask::build(&a, &b, PixelMetric::Rgb, 8, 5).unwrap();
        assert!(mask.get(5, 5));
        assert!(mask.get(14, 14));
        assert!(!mask.get(4, 10));
        assert!(!mask.get(15, 10));
        assert_eq!(mask.count(), 2);
    }

    #[test]
    fn tolerance_is_strict() {
        // Rgb distance of exactly 8
        let a = RgbaFrame::filled(12, 12, GRAY);
        let b = frame_with(12, 12, &[(6, 6)], Pixel::rgb(136, 136, 136));

        let at_limit = DifferenceMask::build(&a, &b, PixelMetric::Rgb, 8, 5).unwrap();
        let below_limit = DifferenceMask::build(&a, &b, PixelMetric::Rgb, 7, 5).unwrap();
        assert!(!at_limit.get(6, 6));
        assert!(below_limit.get(6, 6));
    }

    #[test]
    fn negative_tolerance_flags_identical_pixels() {
        let a = RgbaFrame::filled(12, 12, GRAY);

        let mask = DifferenceMask::build(&a, &a.clone(), PixelMetric::Rgb, -1, 5).unwrap();
        assert_eq!(mask.count(), 4);
        let zero = DifferenceMask::build(&a, &a.clone(), PixelMetric::Rgb, 0, 5).unwrap();
        assert_eq!(zero.count(), 0);
    }

    #[test]
    fn image_smaller_than_margin_is_empty() {
        let a = RgbaFrame::filled(8, 8, GRAY);
        let b = RgbaFrame::filled(8, 8, Pixel::rgb(0, 0, 0));

        let mask = DifferenceMask::build(&a, &b, PixelMetric::Rgb, 0, 5).unwrap();
        assert!(mask.scan_columns().is_empty());
        assert_eq!(mask.count(), 0);
        let parallel = DifferenceMask::build_parallel(&a, &b, PixelMetric::Rgb, 0, 5).unwrap();
        assert_eq!(parallel, mask);
    }

    #[test]
    fn zero_margin_compares_everything() {
        let a = RgbaFrame::filled(4, 3, GRAY);
        let b = RgbaFrame::filled(4, 3, Pixel::rgb(0, 0, 0));

        let mask = DifferenceMask::build(&a, &b, PixelMetric::Rgb, 0, 0).unwrap();
        assert_eq!(mask.count(), 12);
    }

    #[test]
    fn from_fn_respects_margin() {
        let mask = DifferenceMask::from_fn(20, 20, 5, |_, _| true);
        assert_eq!(mask.count(), 100);
        assert!(!mask.get(4, 4));
        assert!(mask.get(5, 5));
    }

    #[test]
    fn out_of_range_reads_false() {
        let mask = DifferenceMask::empty(10, 10, 5);
        assert!(!mask.get(10, 0));
        assert!(!mask.get(0, 10));
    }

    proptest! {
        #[test]
        fn parallel_matches_sequential(
            width in 0u32..48,
            height in 0u32..48,
            margin in 0u32..6,
            tolerance in -2i64..40,
            seed in any::<u64>(),
        ) {
            let a = RgbaFrame::filled(width, height, GRAY);
            let mut b = a.clone();
            let mut state = seed | 1;
            for x in 0..width {
                for y in 0..height {
                    // xorshift noise
                    state ^= state << 13;
                    state ^= state >> 7;
                    state ^= state << 17;
                    let v = (state & 0xff) as u8;
                    b.set_pixel(x, y, Pixel::new(v, v / 2, 128, 255));
                }
            }

            let metric = PixelMetric::Rgb;
            let sequential = DifferenceMask::build(&a, &b, metric, tolerance, margin).unwrap();
            let parallel =
                DifferenceMask::build_parallel(&a, &b, metric, tolerance, margin).unwrap();
            prop_assert_eq!(sequential, parallel);
        }
    }
}
