use image::GrayImage;
use imageproc::filter::bilateral_filter;

/// Filter window diameter in pixels
const DIAMETER: u32 = 9;
const SIGMA_COLOR: f32 = 75.0;
const SIGMA_SPACE: f32 = 75.0;

/// Edge-preserving bilateral filter.
/// Suppresses surface noise (rust, dirt) while keeping stroke edges sharp.
/// Borders repeat the nearest edge pixel. `image` must not be empty.
pub fn apply(image: &GrayImage) -> GrayImage {
    bilateral_filter(image, DIAMETER, SIGMA_COLOR, SIGMA_SPACE)
}
