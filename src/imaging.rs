// THEORY:
// The `imaging` module is the boundary between the comparison engine and real
// image files. The engine itself only reads `PixelBuffer`s and produces
// `Cluster`s; everything that knows about file formats and drawing lives here.
//
// - Decoded images are `image::RgbaImage`, which is a `PixelBuffer` as-is.
// - Clusters are reported by stroking a padded rectangle around their bounding
//   box, the way a pen of `thickness` pixels would: the stroke is centred on the
//   rectangle's edge and clipped to the image.
// - JPEG cannot carry alpha, so JPEG outputs are flattened to RGB before saving.

use crate::config::OutlineStyle;
use crate::core_modules::cluster::{BoundingBox, Cluster};
use crate::core_modules::pixel::pixel::{Pixel, PixelBuffer};
use crate::error::DiffError;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use std::ops::RangeInclusive;
use std::path::Path;

impl PixelBuffer for RgbaImage {
    fn width(&self) -> u32 {
        RgbaImage::width(self)
    }

    fn height(&self) -> u32 {
        RgbaImage::height(self)
    }

    fn pixel(&self, x: u32, y: u32) -> Pixel {
        let [red, green, blue, alpha] = self.get_pixel(x, y).0;
        Pixel::new(red, green, blue, alpha)
    }
}

/// Decodes any format `image` understands into RGBA8.
pub fn load_rgba(path: impl AsRef<Path>) -> Result<RgbaImage, DiffError> {
    Ok(image::open(path)?.to_rgba8())
}

/// Encodes `image` in the format implied by the file extension.
pub fn save_rgba(path: impl AsRef<Path>, image: &RgbaImage) -> Result<(), DiffError> {
    let path = path.as_ref();
    match ImageFormat::from_path(path)? {
        ImageFormat::Jpeg => DynamicImage::ImageRgba8(image.clone()).to_rgb8().save(path)?,
        _ => image.save(path)?,
    }
    Ok(())
}

/// Strokes the padded rectangle around every cluster.
pub fn annotate(image: &mut RgbaImage, clusters: &[Cluster], style: &OutlineStyle) {
    for cluster in clusters {
        draw_cluster_outline(image, &cluster.bounding_box(), style);
    }
}

/// Strokes a rectangle `style.padding` pixels outside `bounding_box`.
pub fn draw_cluster_outline(
    image: &mut RgbaImage,
    bounding_box: &BoundingBox,
    style: &OutlineStyle,
) {
    if style.thickness == 0 {
        return;
    }

    let padding = i64::from(style.padding);
    let left = i64::from(bounding_box.left) - padding;
    let right = i64::from(bounding_box.right) + padding;
    let top = i64::from(bounding_box.top) - padding;
    let bottom = i64::from(bounding_box.bottom) + padding;

    // pen band around an edge at e: [e - inner, e + outer]
    let inner = i64::from(style.thickness / 2);
    let outer = i64::from(style.thickness) - inner - 1;
    let color = Rgba(style.color);

    let full_width = left - inner..=right + outer;
    let full_height = top - inner..=bottom + outer;

    fill_clipped(image, full_width.clone(), top - inner..=top + outer, color);
    fill_clipped(image, full_width, bottom - inner..=bottom + outer, color);
    fill_clipped(image, left - inner..=left + outer, full_height.clone(), color);
    fill_clipped(image, right - inner..=right + outer, full_height, color);
}

fn fill_clipped(
    image: &mut RgbaImage,
    xs: RangeInclusive<i64>,
    ys: RangeInclusive<i64>,
    color: Rgba<u8>,
) {
    let (width, height) = image.dimensions();
    let Some(xs) = clip(xs, width) else {
        return;
    };
    let Some(ys) = clip(ys, height) else {
        return;
    };

    for y in ys {
        for x in xs.clone() {
            image.put_pixel(x, y, color);
        }
    }
}

fn clip(range: RangeInclusive<i64>, len: u32) -> Option<RangeInclusive<u32>> {
    let start = (*range.start()).max(0);
    let end = (*range.end()).min(i64::from(len) - 1);
    (start <= end).then(|| start as u32..=end as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::cluster::Point;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

    fn style(padding: u32, thickness: u32) -> OutlineStyle {
        OutlineStyle {
            padding,
            thickness,
            color: RED.0,
        }
    }

    fn bbox(left: u32, top: u32, right: u32, bottom: u32) -> BoundingBox {
        BoundingBox {
            top,
            bottom,
            left,
            right,
        }
    }

    #[test]
    fn rgba_image_reads_as_pixel_buffer() {
        let mut image = RgbaImage::from_pixel(3, 2, WHITE);
        image.put_pixel(2, 1, Rgba([1, 2, 3, 4]));

        assert_eq!(PixelBuffer::dimensions(&image), (3, 2));
        assert_eq!(PixelBuffer::pixel(&image, 2, 1), Pixel::new(1, 2, 3, 4));
    }

    #[test]
    fn thin_outline_is_padded_and_hollow() {
        let mut image = RgbaImage::from_pixel(40, 40, WHITE);
        draw_cluster_outline(&mut image, &bbox(10, 10, 20, 20), &style(2, 1));

        for (x, y) in [(8, 8), (22, 8), (8, 22), (22, 22), (15, 8), (8, 15)] {
            assert_eq!(*image.get_pixel(x, y), RED, "({x}, {y})");
        }
        for (x, y) in [(9, 9), (15, 15), (21, 21), (7, 15), (23, 15)] {
            assert_eq!(*image.get_pixel(x, y), WHITE, "({x}, {y})");
        }
        let stroked = image.pixels().filter(|p| **p == RED).count();
        assert_eq!(stroked, 4 * 14);
    }

    #[test]
    fn thick_pen_straddles_the_edge() {
        let mut image = RgbaImage::from_pixel(60, 60, WHITE);
        draw_cluster_outline(&mut image, &bbox(20, 20, 30, 30), &style(5, 5));

        // left edge at x = 15, band 13..=17
        for x in 13..=17 {
            assert_eq!(*image.get_pixel(x, 25), RED, "x = {x}");
        }
        assert_eq!(*image.get_pixel(12, 25), WHITE);
        assert_eq!(*image.get_pixel(18, 25), WHITE);
    }

    #[test]
    fn outline_is_clipped_at_image_edges() {
        let mut image = RgbaImage::from_pixel(20, 20, WHITE);
        draw_cluster_outline(&mut image, &bbox(0, 0, 19, 19), &style(5, 5));
        draw_cluster_outline(&mut image, &bbox(2, 2, 4, 4), &style(5, 5));

        assert!(image.pixels().any(|p| *p == RED));
    }

    #[test]
    fn zero_thickness_draws_nothing() {
        let mut image = RgbaImage::from_pixel(20, 20, WHITE);
        draw_cluster_outline(&mut image, &bbox(8, 8, 10, 10), &style(1, 0));
        assert!(image.pixels().all(|p| *p == WHITE));
    }

    #[test]
    fn annotate_outlines_each_cluster() {
        let mut image = RgbaImage::from_pixel(50, 50, WHITE);
        let clusters = vec![
            Cluster::seal(vec![Point::new(10, 10)]).unwrap(),
            Cluster::seal(vec![Point::new(35, 35)]).unwrap(),
        ];
        annotate(&mut image, &clusters, &style(3, 1));

        assert_eq!(*image.get_pixel(7, 7), RED);
        assert_eq!(*image.get_pixel(32, 32), RED);
        assert_eq!(*image.get_pixel(10, 10), WHITE);
    }

    #[test]
    fn save_and_reload_png() {
        let mut image = RgbaImage::from_pixel(16, 12, WHITE);
        image.put_pixel(3, 4, Rgba([10, 20, 30, 40]));
        let path = std::env::temp_dir().join(format!("diff_vision_{}.png", std::process::id()));

        save_rgba(&path, &image).expect("Error Saving File.");
        let reloaded = load_rgba(&path).expect("Error Loading File.");
        std::fs::remove_file(&path).ok();

        assert_eq!(reloaded, image);
    }

    #[test]
    fn jpeg_output_drops_alpha() {
        let image = RgbaImage::from_pixel(16, 16, Rgba([200, 100, 50, 128]));
        let path = std::env::temp_dir().join(format!("diff_vision_{}.jpg", std::process::id()));

        save_rgba(&path, &image).expect("Error Saving File.");
        let reloaded = load_rgba(&path).expect("Error Loading File.");
        std::fs::remove_file(&path).ok();

        assert_eq!(reloaded.dimensions(), (16, 16));
        assert_eq!(reloaded.get_pixel(0, 0).0[3], 255);
    }

    #[test]
    fn missing_file_is_an_image_error() {
        assert!(matches!(
            load_rgba("/nonexistent/diff_vision.png"),
            Err(DiffError::Image(_))
        ));
    }
}
