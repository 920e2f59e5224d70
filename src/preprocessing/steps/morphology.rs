use image::{GrayImage, Luma};

/// Morphological closing with a 2x2 rectangular element, one iteration.
///
/// Reconnects stencil strokes broken by chipped paint; the element is small
/// enough not to bridge separate characters.
pub fn apply(image: &GrayImage) -> GrayImage {
    erode_2x2(&dilate_2x2(image))
}

/// Max over the 2x2 window anchored at its bottom-right cell
fn dilate_2x2(img: &GrayImage) -> GrayImage {
    let (width, height) = img.dimensions();
    GrayImage::from_fn(width, height, |x, y| {
        let mut value = img.get_pixel(x, y).0[0];
        if x > 0 {
            value = value.max(img.get_pixel(x - 1, y).0[0]);
        }
        if y > 0 {
            value = value.max(img.get_pixel(x, y - 1).0[0]);
        }
        if x > 0 && y > 0 {
            value = value.max(img.get_pixel(x - 1, y - 1).0[0]);
        }
        Luma([value])
    })
}

/// Min over the reflected window, so that erode(dilate(a)) is a closing
fn erode_2x2(img: &GrayImage) -> GrayImage {
    let (width, height) = img.dimensions();
    GrayImage::from_fn(width, height, |x, y| {
        let mut value = img.get_pixel(x, y).0[0];
        if x + 1 < width {
            value = value.min(img.get_pixel(x + 1, y).0[0]);
        }
        if y + 1 < height {
            value = value.min(img.get_pixel(x, y + 1).0[0]);
        }
        if x + 1 < width && y + 1 < height {
            value = value.min(img.get_pixel(x + 1, y + 1).0[0]);
        }
        Luma([value])
    })
}
