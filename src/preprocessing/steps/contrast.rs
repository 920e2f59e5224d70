use image::{GrayImage, Luma};

/// Tiles per axis
const TILE_GRID: u32 = 8;
/// Maximum amplification of any single histogram bin
const CLIP_LIMIT: f32 = 3.0;
const BINS: usize = 256;

/// Contrast-limited adaptive histogram equalization (CLAHE).
///
/// Recovers local contrast in faded paint without blowing up noise in
/// near-uniform regions.
pub fn apply(image: &GrayImage) -> GrayImage {
    clahe(image, TILE_GRID, CLIP_LIMIT)
}

fn clahe(image: &GrayImage, grid: u32, clip_limit: f32) -> GrayImage {
    let (width, height) = image.dimensions();
    let tiles_x = grid.min(width).max(1);
    let tiles_y = grid.min(height).max(1);
    let tile_w = width.div_ceil(tiles_x);
    let tile_h = height.div_ceil(tiles_y);
    let tile_area = tile_w * tile_h;

    let limit = ((clip_limit * tile_area as f32 / BINS as f32) as u32).max(1);

    let luts: Vec<[u8; BINS]> = (0..tiles_y)
        .flat_map(|ty| (0..tiles_x).map(move |tx| (tx, ty)))
        .map(|(tx, ty)| {
            let mut hist = tile_histogram(image, tx * tile_w, ty * tile_h, tile_w, tile_h);
            clip_histogram(&mut hist, limit);
            equalization_lut(&hist, tile_area)
        })
        .collect();
    let lut = |tx: u32, ty: u32| &luts[(ty * tiles_x + tx) as usize];

    GrayImage::from_fn(width, height, |x, y| {
        let (tx1, tx2, xa) = neighbours(x, tile_w, tiles_x);
        let (ty1, ty2, ya) = neighbours(y, tile_h, tiles_y);
        let v = image.get_pixel(x, y).0[0] as usize;

        let top = lut(tx1, ty1)[v] as f32 * (1.0 - xa) + lut(tx2, ty1)[v] as f32 * xa;
        let bottom = lut(tx1, ty2)[v] as f32 * (1.0 - xa) + lut(tx2, ty2)[v] as f32 * xa;
        let value = top * (1.0 - ya) + bottom * ya;

        Luma([value.round().clamp(0.0, 255.0) as u8])
    })
}

/// Histogram of one tile; samples past the image edge repeat the last row/column
fn tile_histogram(image: &GrayImage, x0: u32, y0: u32, tile_w: u32, tile_h: u32) -> [u32; BINS] {
    let (width, height) = image.dimensions();
    let mut hist = [0u32; BINS];
    for y in y0..y0 + tile_h {
        for x in x0..x0 + tile_w {
            let v = image.get_pixel(x.min(width - 1), y.min(height - 1)).0[0];
            hist[v as usize] += 1;
        }
    }
    hist
}

/// Clip bins at `limit` and spread the excess evenly over the histogram
fn clip_histogram(hist: &mut [u32; BINS], limit: u32) {
    let mut clipped = 0u32;
    for bin in hist.iter_mut() {
        if *bin > limit {
            clipped += *bin - limit;
            *bin = limit;
        }
    }

    let batch = clipped / BINS as u32;
    let mut residual = clipped - batch * BINS as u32;
    for bin in hist.iter_mut() {
        *bin += batch;
    }

    if residual > 0 {
        let step = (BINS as u32 / residual).max(1) as usize;
        for bin in hist.iter_mut().step_by(step) {
            if residual == 0 {
                break;
            }
            *bin += 1;
            residual -= 1;
        }
    }
}

fn equalization_lut(hist: &[u32; BINS], tile_area: u32) -> [u8; BINS] {
    let scale = (BINS - 1) as f32 / tile_area as f32;
    let mut lut = [0u8; BINS];
    let mut sum = 0u32;
    for (entry, &count) in lut.iter_mut().zip(hist.iter()) {
        sum += count;
        *entry = (sum as f32 * scale).round().clamp(0.0, 255.0) as u8;
    }
    lut
}

/// The two tiles whose centres bracket `pos`, and the weight of the second
fn neighbours(pos: u32, tile: u32, tiles: u32) -> (u32, u32, f32) {
    let f = pos as f32 / tile as f32 - 0.5;
    let first = f.floor();
    let weight = f - first;
    let lo = first.max(0.0) as u32;
    let hi = ((first + 1.0).max(0.0) as u32).min(tiles - 1);
    (lo.min(tiles - 1), hi, weight)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clahe_amplifies_faded_strokes() {
        // Faded stencil: strokes at 130 on a 120 background
        let img = GrayImage::from_fn(256, 256, |x, _| {
            if (x / 4) % 2 == 0 {
                Luma([120])
            } else {
                Luma([130])
            }
        });

        let result = apply(&img);

        let background = result.get_pixel(0, 0).0[0] as i32;
        let stroke = result.get_pixel(4, 0).0[0] as i32;
        assert!(
            stroke - background > 10,
            "Expected contrast above 10, got {} vs {}",
            stroke,
            background
        );
    }

    #[test]
    fn test_clahe_preserves_dimensions() {
        let img = GrayImage::from_pixel(37, 19, Luma([90]));
        assert_eq!(apply(&img).dimensions(), (37, 19));
    }

    #[test]
    fn test_clahe_handles_images_smaller_than_grid() {
        let img = GrayImage::from_fn(3, 2, |x, y| Luma([(x * 40 + y * 10) as u8]));
        assert_eq!(apply(&img).dimensions(), (3, 2));
    }

    #[test]
    fn test_clip_histogram_preserves_total() {
        let mut hist = [0u32; BINS];
        hist[10] = 500;
        hist[200] = 20;

        clip_histogram(&mut hist, 12);

        assert_eq!(hist.iter().sum::<u32>(), 520);
        assert!(hist[10] < 500);
    }

    #[test]
    fn test_uniform_image_stays_uniform() {
        let img = GrayImage::from_pixel(32, 32, Luma([128]));
        let result = apply(&img);
        let first = result.get_pixel(0, 0).0[0];
        assert!(result.pixels().all(|p| p.0[0] == first));
    }
}
