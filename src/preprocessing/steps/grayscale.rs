use crate::error::OcrError;
use image::{DynamicImage, GrayImage, Luma};

/// Reduce an image to a single luminance channel.
///
/// Three-channel input uses BT.601 luma weights; single-channel input is
/// copied. Any other layout is rejected.
pub fn apply(image: &DynamicImage) -> Result<GrayImage, OcrError> {
    if image.width() == 0 || image.height() == 0 {
        return Err(OcrError::PreprocessingError(format!(
            "empty image ({}x{})",
            image.width(),
            image.height()
        )));
    }

    match image {
        DynamicImage::ImageLuma8(gray) => Ok(gray.clone()),
        DynamicImage::ImageRgb8(rgb) => Ok(GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
            let [r, g, b] = rgb.get_pixel(x, y).0;
            Luma([luma(r, g, b)])
        })),
        other => Err(OcrError::UnsupportedFormat(format!(
            "expected 1 or 3 channels of 8-bit samples, got {:?}",
            other.color()
        ))),
    }
}

fn luma(r: u8, g: u8, b: u8) -> u8 {
    let y = 0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32;
    y.round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, RgbaImage};

    #[test]
    fn test_grayscale_uses_luma_weights() {
        let mut img = RgbImage::new(3, 1);
        img.put_pixel(0, 0, Rgb([255, 0, 0]));
        img.put_pixel(1, 0, Rgb([0, 255, 0]));
        img.put_pixel(2, 0, Rgb([0, 0, 255]));

        let gray = apply(&DynamicImage::ImageRgb8(img)).unwrap();

        assert_eq!(gray.get_pixel(0, 0).0[0], 76);
        assert_eq!(gray.get_pixel(1, 0).0[0], 150);
        assert_eq!(gray.get_pixel(2, 0).0[0], 29);
    }

    #[test]
    fn test_grayscale_copies_single_channel() {
        let img = GrayImage::from_fn(4, 4, |x, y| Luma([(x * 10 + y) as u8]));
        let gray = apply(&DynamicImage::ImageLuma8(img.clone())).unwrap();
        assert_eq!(gray, img);
    }

    #[test]
    fn test_grayscale_preserves_dimensions() {
        let img = RgbImage::new(100, 50);
        let gray = apply(&DynamicImage::ImageRgb8(img)).unwrap();
        assert_eq!(gray.dimensions(), (100, 50));
    }

    #[test]
    fn test_grayscale_rejects_alpha_channel() {
        let img = RgbaImage::new(4, 4);
        let err = apply(&DynamicImage::ImageRgba8(img)).unwrap_err();
        assert!(matches!(err, OcrError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_grayscale_rejects_empty_image() {
        let err = apply(&DynamicImage::ImageLuma8(GrayImage::new(0, 5))).unwrap_err();
        assert!(matches!(err, OcrError::PreprocessingError(_)));
    }
}
