use image::{GrayImage, Luma};
use imageproc::geometry::convex_hull;
use imageproc::point::Point;

/// Skew below this many degrees is left alone
const MIN_CORRECTION_DEGREES: f32 = 0.5;
/// Cubic convolution coefficient
const CUBIC_A: f32 = -0.75;

/// Deskew a binary image by rotating its foreground to the horizontal.
///
/// Returns the corrected image and the rotation applied in degrees, or `None`
/// when no rotation was needed (blank input or skew inside the dead zone).
pub fn apply(image: &GrayImage) -> (GrayImage, Option<f32>) {
    let angle = match skew_angle(image) {
        Some(angle) if angle.abs() >= MIN_CORRECTION_DEGREES => angle,
        _ => return (image.clone(), None),
    };

    let rotated = rotate_replicate(image, angle);
    // Resampling introduces intermediate values; keep the output binary
    let binary = GrayImage::from_fn(rotated.width(), rotated.height(), |x, y| {
        Luma([if rotated.get_pixel(x, y).0[0] >= 128 { 255 } else { 0 }])
    });

    (binary, Some(angle))
}

/// Correction angle in degrees for the foreground of `image`,
/// or `None` if it has no foreground pixels.
pub fn skew_angle(image: &GrayImage) -> Option<f32> {
    // Points are (row, col), matching the angle convention below
    let points: Vec<Point<i32>> = image
        .enumerate_pixels()
        .filter(|(_, _, p)| p.0[0] > 0)
        .map(|(x, y, _)| Point::new(y as i32, x as i32))
        .collect();

    if points.is_empty() {
        return None;
    }

    let angle = min_area_angle(&convex_hull(points)) as f32;
    Some(if angle < -45.0 { -(90.0 + angle) } else { -angle })
}

/// Orientation of the longer side of the minimum-area rectangle around
/// `hull`, reported in [-90, 0).
///
/// Rotating calipers over every hull edge, including the closing one.
/// A single point has no orientation and reports -90.
fn min_area_angle(hull: &[Point<i32>]) -> f64 {
    let pts: Vec<(f64, f64)> = hull.iter().map(|p| (p.x as f64, p.y as f64)).collect();
    let n = pts.len();

    // (area, longer-side direction)
    let mut best: Option<(f64, (f64, f64))> = None;
    for i in 0..n {
        let (ox, oy) = pts[i];
        let (ex, ey) = (pts[(i + 1) % n].0 - ox, pts[(i + 1) % n].1 - oy);
        let len = ex.hypot(ey);
        if len < f64::EPSILON {
            continue;
        }
        let (ux, uy) = (ex / len, ey / len);

        let (mut min_u, mut max_u) = (f64::MAX, f64::MIN);
        let (mut min_v, mut max_v) = (f64::MAX, f64::MIN);
        for &(px, py) in &pts {
            let (dx, dy) = (px - ox, py - oy);
            let u = ux * dx + uy * dy;
            let v = -uy * dx + ux * dy;
            min_u = min_u.min(u);
            max_u = max_u.max(u);
            min_v = min_v.min(v);
            max_v = max_v.max(v);
        }

        let (along, across) = (max_u - min_u, max_v - min_v);
        let area = along * across;
        let direction = if along >= across { (ux, uy) } else { (-uy, ux) };
        if best.map_or(true, |(best_area, _)| area < best_area) {
            best = Some((area, direction));
        }
    }

    match best {
        Some((_, (dx, dy))) => {
            let mut angle = dy.atan2(dx).to_degrees() % 90.0;
            if angle >= 0.0 {
                angle -= 90.0;
            }
            angle
        }
        None => -90.0,
    }
}

/// Rotate counter-clockwise by `degrees` about the image centre, keeping the
/// original canvas. Samples outside the frame repeat the nearest edge pixel.
fn rotate_replicate(image: &GrayImage, degrees: f32) -> GrayImage {
    let (width, height) = image.dimensions();
    let (sin, cos) = degrees.to_radians().sin_cos();
    let cx = (width / 2) as f32;
    let cy = (height / 2) as f32;

    GrayImage::from_fn(width, height, |x, y| {
        let dx = x as f32 - cx;
        let dy = y as f32 - cy;
        let sx = cos * dx - sin * dy + cx;
        let sy = sin * dx + cos * dy + cy;
        Luma([sample_bicubic(image, sx, sy)])
    })
}

fn sample_bicubic(image: &GrayImage, x: f32, y: f32) -> u8 {
    let max_x = image.width() as i32 - 1;
    let max_y = image.height() as i32 - 1;
    let x0 = x.floor();
    let y0 = y.floor();
    let wx = cubic_weights(x - x0);
    let wy = cubic_weights(y - y0);

    let mut value = 0.0f32;
    for (j, weight_y) in wy.iter().enumerate() {
        let sy = (y0 as i32 - 1 + j as i32).clamp(0, max_y) as u32;
        let mut row = 0.0f32;
        for (i, weight_x) in wx.iter().enumerate() {
            let sx = (x0 as i32 - 1 + i as i32).clamp(0, max_x) as u32;
            row += image.get_pixel(sx, sy).0[0] as f32 * weight_x;
        }
        value += row * weight_y;
    }

    value.round().clamp(0.0, 255.0) as u8
}

/// Weights for the four taps at offsets -1, 0, 1, 2 from the sample cell
fn cubic_weights(t: f32) -> [f32; 4] {
    let a = CUBIC_A;
    let near = |d: f32| ((a + 2.0) * d - (a + 3.0)) * d * d + 1.0;
    let far = |d: f32| ((a * d - 5.0 * a) * d + 8.0 * a) * d - 4.0 * a;
    [far(t + 1.0), near(t), near(1.0 - t), far(2.0 - t)]
}
