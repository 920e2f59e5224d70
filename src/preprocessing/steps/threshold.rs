use image::{GrayImage, Luma};

/// Adaptive threshold parameters
const BLOCK_SIZE: usize = 11;
/// Constant subtracted from the local mean
const OFFSET: i32 = 2;

/// Gaussian adaptive thresholding.
///
/// Each pixel is compared against the Gaussian-weighted mean of its 11x11
/// neighbourhood minus a small offset, so the threshold follows shadows and
/// uneven lighting across the surface.
pub fn apply(image: &GrayImage) -> GrayImage {
    let mean = gaussian_mean(image, &gaussian_kernel(BLOCK_SIZE));

    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let pixel = image.get_pixel(x, y).0[0] as i32;
        let local = mean.get_pixel(x, y).0[0] as i32;
        if pixel - local > -OFFSET {
            Luma([255u8])
        } else {
            Luma([0u8])
        }
    })
}

/// Normalized Gaussian kernel with sigma derived from its size
fn gaussian_kernel(size: usize) -> Vec<f32> {
    let sigma = 0.3 * ((size as f32 - 1.0) * 0.5 - 1.0) + 0.8;
    let half = (size / 2) as f32;
    let weights: Vec<f32> = (0..size)
        .map(|i| {
            let d = i as f32 - half;
            (-(d * d) / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let total: f32 = weights.iter().sum();
    weights.into_iter().map(|w| w / total).collect()
}

/// Separable Gaussian blur with edge-replicated borders
fn gaussian_mean(image: &GrayImage, kernel: &[f32]) -> GrayImage {
    let (width, height) = image.dimensions();
    let (w, h) = (width as usize, height as usize);
    let half = (kernel.len() / 2) as isize;
    let src = image.as_raw();

    let mut horizontal = vec![0.0f32; w * h];
    for y in 0..h {
        let row = &src[y * w..(y + 1) * w];
        for x in 0..w {
            horizontal[y * w + x] = kernel
                .iter()
                .enumerate()
                .map(|(k, weight)| {
                    let sx = (x as isize + k as isize - half).clamp(0, w as isize - 1) as usize;
                    row[sx] as f32 * weight
                })
                .sum();
        }
    }

    GrayImage::from_fn(width, height, |x, y| {
        let (x, y) = (x as usize, y as usize);
        let value: f32 = kernel
            .iter()
            .enumerate()
            .map(|(k, weight)| {
                let sy = (y as isize + k as isize - half).clamp(0, h as isize - 1) as usize;
                horizontal[sy * w + x] * weight
            })
            .sum();
        Luma([value.round().clamp(0.0, 255.0) as u8])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_binarizes_image() {
        let img = GrayImage::from_fn(50, 50, |x, y| Luma([((x * 5 + y * 3) % 256) as u8]));

        let result = apply(&img);

        for pixel in result.pixels() {
            assert!(
                pixel.0[0] == 0 || pixel.0[0] == 255,
                "Expected binary pixel, got {}",
                pixel.0[0]
            );
        }
    }

    #[test]
    fn test_threshold_handles_text_pattern() {
        // Dark stencil stroke on light paint
        let mut img = GrayImage::from_pixel(50, 20, Luma([240]));
        for x in 10..40 {
            img.put_pixel(x, 10, Luma([20]));
        }

        let result = apply(&img);

        assert_eq!(result.get_pixel(25, 10).0[0], 0);
        assert_eq!(result.get_pixel(25, 3).0[0], 255);
    }

    #[test]
    fn test_threshold_tolerates_uneven_lighting() {
        // Strong left-to-right illumination gradient with a dark stroke in each half
        let mut img = GrayImage::from_fn(80, 20, |x, _| Luma([(60 + x * 2) as u8]));
        for y in 8..12 {
            img.put_pixel(15, y, Luma([10]));
            img.put_pixel(65, y, Luma([120]));
        }

        let result = apply(&img);

        // The bright-side stroke (120) is darker than the dim side's background
        // (~90) only locally; both strokes must still come out as ink.
        assert_eq!(result.get_pixel(15, 10).0[0], 0);
        assert_eq!(result.get_pixel(65, 10).0[0], 0);
        assert_eq!(result.get_pixel(40, 2).0[0], 255);
    }

    #[test]
    fn test_kernel_is_normalized() {
        let kernel = gaussian_kernel(BLOCK_SIZE);
        assert_eq!(kernel.len(), 11);
        assert!((kernel.iter().sum::<f32>() - 1.0).abs() < 1e-5);
    }
}
