//! Visual verification output: detection boxes and labels drawn over the source image

use crate::results::StructuredDetection;
use ab_glyph::FontVec;
use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;

/// Box outline thickness in pixels
const THICKNESS: i32 = 2;
/// Label glyph height in pixels
const LABEL_SCALE: f32 = 16.0;
/// Gap between a label and the top of its box
const LABEL_GAP: i32 = 4;

const GREEN: Rgb<u8> = Rgb([0, 255, 0]);
const YELLOW: Rgb<u8> = Rgb([255, 255, 0]);
const RED: Rgb<u8> = Rgb([255, 0, 0]);

/// Fonts tried, in order, for detection labels
const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/System/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// First readable system font, or `None` when labels cannot be drawn
pub fn load_system_font() -> Option<FontVec> {
    for path in SYSTEM_FONTS {
        if let Ok(font) = std::fs::read(path).map(FontVec::try_from_vec) {
            match font {
                Ok(font) => {
                    tracing::debug!("Label font: {}", path);
                    return Some(font);
                }
                Err(_) => tracing::warn!("Unreadable font file: {}", path),
            }
        }
    }
    tracing::info!("No system font found; annotated images will have boxes only");
    None
}

/// Outline colour for a detection confidence
pub fn confidence_color(confidence: f64) -> Rgb<u8> {
    if confidence > 0.8 {
        GREEN
    } else if confidence > 0.6 {
        YELLOW
    } else {
        RED
    }
}

/// Label drawn above a detection: cleaned text and confidence
pub fn label_text(detection: &StructuredDetection) -> String {
    format!("{} ({:.2})", detection.text, detection.confidence)
}

/// Top-left corner of a label for a box whose top-left is `(x, y)`,
/// kept inside the image
fn label_origin(x: i32, y: i32) -> (i32, i32) {
    let top = y - LABEL_SCALE as i32 - LABEL_GAP;
    (x.max(0), top.max(0))
}

/// Draw every detection's bounding box on an RGB copy of `image`,
/// with a text label above each box when `font` is given.
pub fn annotate(
    image: &DynamicImage,
    detections: &[StructuredDetection],
    font: Option<&FontVec>,
) -> RgbImage {
    let mut canvas = image.to_rgb8();
    let (width, height) = (canvas.width() as i32, canvas.height() as i32);

    for detection in detections {
        let color = confidence_color(detection.confidence);
        let bbox = detection.bbox;
        for inset in 0..THICKNESS {
            let w = bbox.width() - 2 * inset;
            let h = bbox.height() - 2 * inset;
            if w <= 0 || h <= 0 {
                break;
            }
            let rect = Rect::at(bbox.x_min + inset, bbox.y_min + inset).of_size(w as u32, h as u32);
            draw_hollow_rect_mut(&mut canvas, rect, color);
        }

        let Some(font) = font else { continue };
        let (x, y) = label_origin(bbox.x_min, bbox.y_min);
        if x < width && y < height {
            draw_text_mut(&mut canvas, color, x, y, LABEL_SCALE, font, &label_text(detection));
        }
    }

    canvas
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Detection;
    use crate::results::structure;
    use image::GrayImage;

    #[test]
    fn test_color_thresholds() {
        assert_eq!(confidence_color(0.95), GREEN);
        assert_eq!(confidence_color(0.8), YELLOW);
        assert_eq!(confidence_color(0.61), YELLOW);
        assert_eq!(confidence_color(0.6), RED);
    }

    #[test]
    fn test_annotate_draws_box_outline() {
        let image = DynamicImage::ImageLuma8(GrayImage::new(40, 40));
        let output = structure(
            &[Detection::new([[5, 5], [30, 5], [30, 20], [5, 20]], "A1", 0.9)],
            "a.png",
        );

        let canvas = annotate(&image, output.detections(), None);

        assert_eq!(canvas.dimensions(), (40, 40));
        assert_eq!(*canvas.get_pixel(5, 5), GREEN);
        assert_eq!(*canvas.get_pixel(15, 5), GREEN);
        assert_eq!(*canvas.get_pixel(15, 12), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_annotate_ignores_degenerate_and_offscreen_boxes() {
        let image = DynamicImage::ImageLuma8(GrayImage::new(10, 10));
        let output = structure(
            &[
                Detection::new([[3, 3], [3, 3], [3, 3], [3, 3]], "dot", 0.9),
                Detection::new([[50, 50], [80, 50], [80, 70], [50, 70]], "far", 0.9),
            ],
            "a.png",
        );

        let canvas = annotate(&image, output.detections(), None);
        assert!(canvas.pixels().all(|p| *p == Rgb([0, 0, 0])));
    }

    #[test]
    fn test_label_text_and_position() {
        let output = structure(
            &[Detection::new([[10, 40], [90, 40], [90, 60], [10, 60]], "LOT 7!", 0.876)],
            "a.png",
        );

        assert_eq!(label_text(&output.detections()[0]), "LOT 7 (0.88)");
        assert_eq!(label_origin(10, 40), (10, 20));
        assert_eq!(label_origin(-3, 5), (0, 0));
    }

    #[test]
    fn test_annotate_draws_label_above_box() {
        let Some(font) = load_system_font() else {
            return;
        };
        let image = DynamicImage::ImageLuma8(GrayImage::new(160, 80));
        let output = structure(
            &[Detection::new([[10, 40], [150, 40], [150, 70], [10, 70]], "BATCH-7", 0.95)],
            "a.png",
        );

        let plain = annotate(&image, output.detections(), None);
        let labelled = annotate(&image, output.detections(), Some(&font));

        let label_band = |canvas: &RgbImage| {
            (0..canvas.width())
                .flat_map(|x| (0..40).map(move |y| (x, y)))
                .filter(|&(x, y)| *canvas.get_pixel(x, y) != Rgb([0, 0, 0]))
                .count()
        };
        assert_eq!(label_band(&plain), 0);
        assert!(label_band(&labelled) > 0);
        assert_eq!(labelled.get_pixel(10, 40), plain.get_pixel(10, 40));
    }
}
