// THEORY:
// The `pixel_metric` module answers one question: how far apart are two pixels
// taken from the same position in two images? The answer is a small non-negative
// integer which the mask builder compares against a tolerance.
//
// Two "lenses" are offered:
// - `Argb`: averages the absolute difference of all four channels, so a change in
//   transparency alone can flag a pixel.
// - `Rgb`: averages the color channels only, ignoring alpha.
//
// Both use truncating integer division. The set of metrics is closed, so it is an
// enum matched at the call site rather than a table of function pointers.

pub mod pixel_metric {
    use crate::core_modules::pixel::pixel::Pixel;
    use serde::{Deserialize, Serialize};

    pub type Distance = u32;

    /// Selects which channels contribute to the distance between two pixels.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum PixelMetric {
        /// `(|ΔA| + |ΔR| + |ΔG| + |ΔB|) / 4`
        Argb,
        /// `(|ΔR| + |ΔG| + |ΔB|) / 3`
        #[default]
        Rgb,
    }

    impl PixelMetric {
        #[inline]
        pub fn distance(self, first: &Pixel, second: &Pixel) -> Distance {
            let color = channel_delta(first.red, second.red)
                + channel_delta(first.green, second.green)
                + channel_delta(first.blue, second.blue);
            match self {
                PixelMetric::Argb => (color + channel_delta(first.alpha, second.alpha)) / 4,
                PixelMetric::Rgb => color / 3,
            }
        }
    }

    #[inline]
    fn channel_delta(a: u8, b: u8) -> Distance {
        a.abs_diff(b) as Distance
    }
}

#[cfg(test)]
mod tests {
    use super::pixel_metric::*;
    use crate::core_modules::pixel::pixel::Pixel;
    use proptest::prelude::*;

    #[test]
    fn rgb_ignores_alpha() {
        let a = Pixel::new(10, 10, 10, 0);
        let b = Pixel::new(10, 10, 10, 255);
        assert_eq!(PixelMetric::Rgb.distance(&a, &b), 0);
        assert_eq!(PixelMetric::Argb.distance(&a, &b), 63);
    }

    #[test]
    fn division_truncates() {
        // |ΔR| + |ΔG| + |ΔB| = 5, 5 / 3 = 1
        let a = Pixel::rgb(0, 0, 0);
        let b = Pixel::rgb(2, 2, 1);
        assert_eq!(PixelMetric::Rgb.distance(&a, &b), 1);
        // 5 / 4 = 1
        assert_eq!(PixelMetric::Argb.distance(&a, &b), 1);
    }

    #[test]
    fn maximal_difference() {
        let black = Pixel::new(0, 0, 0, 0);
        let white = Pixel::new(255, 255, 255, 255);
        assert_eq!(PixelMetric::Rgb.distance(&black, &white), 255);
        assert_eq!(PixelMetric::Argb.distance(&black, &white), 255);
    }

    #[test]
    fn default_is_rgb() {
        assert_eq!(PixelMetric::default(), PixelMetric::Rgb);
    }

    fn any_pixel() -> impl Strategy<Value = Pixel> {
        any::<[u8; 4]>().prop_map(|[r, g, b, a]| Pixel::new(r, g, b, a))
    }

    fn any_metric() -> impl Strategy<Value = PixelMetric> {
        prop_oneof![Just(PixelMetric::Argb), Just(PixelMetric::Rgb)]
    }

    proptest! {
        #[test]
        fn distance_to_self_is_zero(p in any_pixel(), metric in any_metric()) {
            prop_assert_eq!(metric.distance(&p, &p), 0);
        }

        #[test]
        fn distance_is_symmetric(a in any_pixel(), b in any_pixel(), metric in any_metric()) {
            prop_assert_eq!(metric.distance(&a, &b), metric.distance(&b, &a));
        }

        #[test]
        fn distance_never_exceeds_channel_range(
            a in any_pixel(),
            b in any_pixel(),
            metric in any_metric(),
        ) {
            prop_assert!(metric.distance(&a, &b) <= 255);
        }

        #[test]
        fn rgb_matches_formula(a in any_pixel(), b in any_pixel()) {
            let expected = ((a.red as i32 - b.red as i32).abs()
                + (a.green as i32 - b.green as i32).abs()
                + (a.blue as i32 - b.blue as i32).abs()) / 3;
            prop_assert_eq!(PixelMetric::Rgb.distance(&a, &b), expected as u32);
        }

        #[test]
        fn argb_matches_formula(a in any_pixel(), b in any_pixel()) {
            let expected = ((a.alpha as i32 - b.alpha as i32).abs()
                + (a.red as i32 - b.red as i32).abs()
                + (a.green as i32 - b.green as i32).abs()
                + (a.blue as i32 - b.blue as i32).abs()) / 4;
            prop_assert_eq!(PixelMetric::Argb.distance(&a, &b), expected as u32);
        }
    }
}
